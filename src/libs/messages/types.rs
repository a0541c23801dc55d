/// Every user-facing message of runrun-tracker.
///
/// Text lives in the `Display` implementation in `display.rs`; variants carry
/// the values interpolated into it.
#[derive(Debug, Clone)]
pub enum Message {
    // === CONFIGURATION MESSAGES ===
    ConfigSaved,
    ConfigDeleted,
    ConfigNotFound,
    ConfigModuleRunrun,
    ConfigModuleWatch,

    // === OPTIONS MESSAGES ===
    OptionsHeader,
    OptionsSaved,
    InvalidReminderInterval(i64),
    NotAuthenticated,
    LoggedOut,

    // === TASK MESSAGES ===
    OpenTasksHeader,
    ClosedTasksHeader,
    StatusHeader,
    NoTasks,
    TaskPlayed(String),
    TaskPaused(String),
    TaskDelivered(String),
    TaskReopened(String),
    TaskTracked(String),
    TaskUntracked(String),
    TrackingNeedsAutoPauseResume,
    RefreshRequested,
    WatcherNotResponding(u64), // seconds waited

    // === WATCHER MESSAGES ===
    WatcherStarted(u32),
    WatcherStartingForeground,
    WatcherStopped(u32),
    WatcherNotRunning,
    WatcherStoppingExisting(String),
    WatcherFailedToStopExisting(String),
    WatcherReceivedSigterm,
    WatcherReceivedSigint,
    WatcherReceivedCtrlC,
    WatcherCtrlCListenFailed(String),
    WatcherSignalHandlingNotSupported,
    WatcherShuttingDown,
    WatcherError(String),
    DaemonModeNotSupported,
    InvalidPidFileContent,
    FailedToOpenProcess(u32),
    FailedToTerminateProcess(u32),
    ProcessTerminationNotSupported,

    // === PROMPTS ===
    PromptSelectModules,
    PromptBaseUrl,
    PromptPollInterval,
    PromptIdleDetectionInterval,
    PromptBusPollInterval,
    PromptAppKey,
    PromptUserToken,
    PromptReminderEnabled,
    PromptReminderMinutes,
    PromptAutoPauseResume,
}
