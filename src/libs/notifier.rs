//! Desktop notifications about the task being worked on.
//!
//! Every notification reuses the same id so a newer one replaces the previous
//! one instead of stacking up.

use super::data_storage::APP_NAME;
use super::state::Task;
use std::process::Command;
use tracing::{info, warn};

pub const NOTIFICATION_ID: &str = "runrunit_task_notification";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    /// Work on a task stopped.
    Pause,
    /// Work on a new task started.
    Work,
    Reminder,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertIcon {
    /// Nothing is being worked on.
    Alert,
    /// A task is being worked on.
    AlertActive,
}

impl AlertIcon {
    pub fn file_name(&self) -> &'static str {
        match self {
            AlertIcon::Alert => "icon_128_alert.png",
            AlertIcon::AlertActive => "icon_128_alert_active.png",
        }
    }

    /// Freedesktop icon name used where the bundled images are unavailable.
    pub fn theme_name(&self) -> &'static str {
        match self {
            AlertIcon::Alert => "dialog-warning",
            AlertIcon::AlertActive => "media-playback-start",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub id: String,
    pub kind: NotificationKind,
    pub icon: AlertIcon,
    pub title: String,
    pub message: String,
}

impl Notification {
    fn new(kind: NotificationKind, icon: AlertIcon, title: &str, message: String) -> Self {
        Self {
            id: NOTIFICATION_ID.to_string(),
            kind,
            icon,
            title: title.to_string(),
            message,
        }
    }

    pub fn pause(task: &Task) -> Self {
        Self::new(
            NotificationKind::Pause,
            AlertIcon::Alert,
            "Pause!!!",
            format!("You have stopped working on \"{}\".", task.title),
        )
    }

    pub fn work(task: &Task) -> Self {
        Self::new(
            NotificationKind::Work,
            AlertIcon::AlertActive,
            "Work!!!",
            format!("You are now working on \"{}\".", task.title),
        )
    }

    pub fn reminder(working_on: Option<&Task>) -> Self {
        match working_on {
            Some(task) => Self::new(
                NotificationKind::Reminder,
                AlertIcon::AlertActive,
                "Reminder!!!",
                format!("You are still working on \"{}\".", task.title),
            ),
            None => Self::new(
                NotificationKind::Reminder,
                AlertIcon::Alert,
                "Reminder!!!",
                "You have no tasks currently in progress.".to_string(),
            ),
        }
    }
}

pub trait Notifier: Send + Sync {
    fn notify(&self, notification: &Notification);
}

/// Shows notifications through the desktop's notification service.
#[derive(Debug, Default, Clone)]
pub struct DesktopNotifier;

impl DesktopNotifier {
    pub fn new() -> Self {
        Self
    }

    /// Arguments for `notify-send`. Title and message follow `--` so a leading
    /// dash in either is never read as an option.
    pub fn notify_send_args(notification: &Notification) -> Vec<String> {
        vec![
            "--app-name".to_string(),
            APP_NAME.to_string(),
            "--icon".to_string(),
            notification.icon.theme_name().to_string(),
            "--hint".to_string(),
            format!("string:x-canonical-private-synchronous:{}", notification.id),
            "--".to_string(),
            notification.title.clone(),
            notification.message.clone(),
        ]
    }

    /// Arguments for `osascript`. The script is fixed and reads title, message
    /// and subtitle from `argv`, so notification text never becomes script source.
    pub fn osascript_args(notification: &Notification) -> Vec<String> {
        vec![
            "-e".to_string(),
            "on run argv".to_string(),
            "-e".to_string(),
            "display notification (item 2 of argv) with title (item 1 of argv) subtitle (item 3 of argv)".to_string(),
            "-e".to_string(),
            "end run".to_string(),
            notification.title.clone(),
            notification.message.clone(),
            APP_NAME.to_string(),
        ]
    }

    #[cfg(target_os = "linux")]
    fn command(notification: &Notification) -> Option<Command> {
        let mut command = Command::new("notify-send");
        command.args(Self::notify_send_args(notification));
        Some(command)
    }

    #[cfg(target_os = "macos")]
    fn command(notification: &Notification) -> Option<Command> {
        let mut command = Command::new("osascript");
        command.args(Self::osascript_args(notification));
        Some(command)
    }

    #[cfg(not(any(target_os = "linux", target_os = "macos")))]
    fn command(_notification: &Notification) -> Option<Command> {
        None
    }
}

impl Notifier for DesktopNotifier {
    fn notify(&self, notification: &Notification) {
        info!("{} {}", notification.title, notification.message);

        let Some(mut command) = Self::command(notification) else {
            return;
        };
        if let Err(e) = command.spawn() {
            warn!("failed to show notification '{}': {}", notification.title, e);
        }
    }
}
