//! Text formatting for the task listings.

use chrono::Duration;

/// Formats a duration as `HH:MM`. Negative durations show as `00:00`.
pub fn format_duration(duration: &Duration) -> String {
    let hours = duration.num_hours();
    let mins = duration.num_minutes() % 60;

    format!("{:02}:{:02}", hours.max(0), mins.max(0))
}

/// Formats a number of seconds reported by the API, `-` when unknown.
pub fn format_seconds(seconds: Option<i64>) -> String {
    match seconds {
        Some(seconds) => format_duration(&Duration::seconds(seconds)),
        None => "-".to_string(),
    }
}

/// Cuts `text` to at most `max` characters, marking the cut with `…`.
pub fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let mut cut: String = text.chars().take(max.saturating_sub(1)).collect();
    cut.push('…');
    cut
}
