//! Text of every [`Message`].

use super::types::Message;
use std::fmt;

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            // === CONFIGURATION MESSAGES ===
            Message::ConfigSaved => "Configuration saved successfully".to_string(),
            Message::ConfigDeleted => "Configuration file deleted".to_string(),
            Message::ConfigNotFound => "No configuration file to delete".to_string(),
            Message::ConfigModuleRunrun => "Runrun.it settings".to_string(),
            Message::ConfigModuleWatch => "Watcher settings".to_string(),

            // === OPTIONS MESSAGES ===
            Message::OptionsHeader => "Runrun.it options".to_string(),
            Message::OptionsSaved => "Options saved".to_string(),
            Message::InvalidReminderInterval(minutes) => {
                format!("Reminder interval must be between 1 and 10080 minutes, got {}", minutes)
            }
            Message::NotAuthenticated => {
                "App key and user token are not set. Run 'runrun-tracker options' to set them.".to_string()
            }
            Message::LoggedOut => "Credentials and synchronized state removed".to_string(),

            // === TASK MESSAGES ===
            Message::OpenTasksHeader => "Open tasks".to_string(),
            Message::ClosedTasksHeader => "Last delivered tasks".to_string(),
            Message::StatusHeader => "Status".to_string(),
            Message::NoTasks => "No tasks.".to_string(),
            Message::TaskPlayed(id) => format!("Started working on task {}", id),
            Message::TaskPaused(id) => format!("Paused task {}", id),
            Message::TaskDelivered(id) => format!("Delivered task {}", id),
            Message::TaskReopened(id) => format!("Reopened task {}", id),
            Message::TaskTracked(id) => format!("Task {} is now paused and resumed with the machine", id),
            Message::TaskUntracked(id) => format!("Task {} is no longer tracked", id),
            Message::TrackingNeedsAutoPauseResume => {
                "Tracking needs auto pause/resume. Run 'runrun-tracker options --auto-pause-resume true' first.".to_string()
            }
            Message::RefreshRequested => "Update requested".to_string(),
            Message::WatcherNotResponding(seconds) => {
                format!("No task list received within {} seconds. Is the watcher running? Start it with 'runrun-tracker watch'.", seconds)
            }

            // === WATCHER MESSAGES ===
            Message::WatcherStarted(pid) => format!("Watcher started with PID: {}", pid),
            Message::WatcherStartingForeground => "Starting watcher in foreground, press Ctrl+C to stop".to_string(),
            Message::WatcherStopped(pid) => format!("Watcher with PID {} stopped", pid),
            Message::WatcherNotRunning => "Watcher is not running".to_string(),
            Message::WatcherStoppingExisting(pid) => format!("Stopping existing watcher with PID: {}", pid),
            Message::WatcherFailedToStopExisting(error) => format!("Failed to stop existing watcher: {}", error),
            Message::WatcherReceivedSigterm => "Received SIGTERM, shutting down".to_string(),
            Message::WatcherReceivedSigint => "Received SIGINT, shutting down".to_string(),
            Message::WatcherReceivedCtrlC => "Received Ctrl+C, shutting down".to_string(),
            Message::WatcherCtrlCListenFailed(error) => format!("Failed to listen for Ctrl+C: {}", error),
            Message::WatcherSignalHandlingNotSupported => "Signal handling is not supported on this platform".to_string(),
            Message::WatcherShuttingDown => "Watcher shutting down".to_string(),
            Message::WatcherError(error) => format!("Watcher error: {}", error),
            Message::DaemonModeNotSupported => "Running the watcher in the background is not supported on this platform".to_string(),
            Message::InvalidPidFileContent => "Invalid PID file content".to_string(),
            Message::FailedToOpenProcess(code) => format!("Failed to open process, error code: {}", code),
            Message::FailedToTerminateProcess(code) => format!("Failed to terminate process, error code: {}", code),
            Message::ProcessTerminationNotSupported => "Process termination is not supported on this platform".to_string(),

            // === PROMPTS ===
            Message::PromptSelectModules => "Select the settings to configure".to_string(),
            Message::PromptBaseUrl => "Runrun.it URL".to_string(),
            Message::PromptPollInterval => "Seconds between task updates".to_string(),
            Message::PromptIdleDetectionInterval => "Seconds without input before the machine is idle".to_string(),
            Message::PromptBusPollInterval => "Milliseconds between checks for changes from other processes".to_string(),
            Message::PromptAppKey => "App key".to_string(),
            Message::PromptUserToken => "User token".to_string(),
            Message::PromptReminderEnabled => "Remind me periodically of what I am working on?".to_string(),
            Message::PromptReminderMinutes => "Minutes between reminders".to_string(),
            Message::PromptAutoPauseResume => "Pause the tracked task when the machine locks and resume it afterwards?".to_string(),
        };
        write!(f, "{}", text)
    }
}
