use super::formatter::{format_duration, format_seconds, truncate};
use super::state::{Id, State, Task};
use chrono::{Local, Utc};
use prettytable::{row, Table};

const TITLE_WIDTH: usize = 48;

pub struct View {}

impl View {
    /// Open tasks, marking the one being worked on and the tracked one.
    pub fn tasks(tasks: &[Task], tracked: Option<&Id>) {
        let mut table = Table::new();

        table.add_row(row!["ID", "TASK", "PROJECT", "WORKED", "ESTIMATE", "STATE", "TRACKED"]);
        for task in tasks {
            let state = if task.is_working_on {
                "working"
            } else if task.on_going {
                "paused"
            } else {
                "queued"
            };
            table.add_row(row![
                task.id,
                truncate(&task.title, TITLE_WIDTH),
                task.project_name.as_deref().unwrap_or("-"),
                format_seconds(task.time_worked),
                format_seconds(task.current_estimate_seconds),
                state,
                if tracked == Some(&task.id) { "*" } else { "" }
            ]);
        }
        table.printstd();
    }

    /// Delivered tasks, most recent first.
    pub fn closed_tasks(tasks: &[Task]) {
        let mut table = Table::new();

        table.add_row(row!["ID", "TASK", "PROJECT", "WORKED", "CLOSED"]);
        for task in tasks {
            table.add_row(row![
                task.id,
                truncate(&task.title, TITLE_WIDTH),
                task.project_name.as_deref().unwrap_or("-"),
                format_seconds(task.time_worked),
                task.close_date.as_deref().unwrap_or("-")
            ]);
        }
        table.printstd();
    }

    pub fn status(state: &State, watcher_pid: Option<u32>) {
        let mut table = Table::new();

        let user = match &state.user {
            Some(user) => user.name.clone().unwrap_or_else(|| user.id.to_string()),
            None => "-".to_string(),
        };
        let working_on = match &state.is_working_on {
            Some(task) => format!("{} ({})", truncate(&task.title, TITLE_WIDTH), task.id),
            None => "-".to_string(),
        };
        let reminder = if state.reminder_enabled {
            format!("every {} min, last at {}", state.reminder_time_in_minutes, state.reminder.with_timezone(&Local).format("%H:%M"))
        } else {
            "off".to_string()
        };
        let since = Utc::now() - state.reminder;

        table.add_row(row!["Authenticated", if state.is_authenticated() { "yes" } else { "no" }]);
        table.add_row(row!["User", user]);
        table.add_row(row!["Working on", working_on]);
        table.add_row(row!["Tracked task", state.tracked_task.as_ref().map(|id| id.to_string()).unwrap_or_else(|| "-".to_string())]);
        table.add_row(row!["Auto pause/resume", if state.auto_pause_resume { "on" } else { "off" }]);
        table.add_row(row!["Machine", state.last_machine_status]);
        table.add_row(row!["Reminder", reminder]);
        table.add_row(row!["Since last alert", format_duration(&since)]);
        table.add_row(row!["Watcher", watcher_pid.map(|pid| format!("running ({})", pid)).unwrap_or_else(|| "stopped".to_string())]);
        table.printstd();
    }
}
