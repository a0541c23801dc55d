//! Lifecycle of the background watcher process.
//!
//! `runrun-tracker watch` re-executes the binary with `--daemon-run`, detached
//! from the terminal, and records its pid in `runrun-tracker-watch.pid`.
//! `runrun-tracker watch --stop` terminates it through that pid file.

use crate::libs::bus::{Bus, FileBus};
use crate::libs::context::AppContext;
use crate::libs::data_storage::DataStorage;
use crate::libs::indicator::StatusIndicator;
use crate::libs::messages::Message;
use crate::libs::notifier::DesktopNotifier;
use crate::libs::presence::{PresenceConfig, PresenceMonitor};
use crate::libs::reconciler::Reconciler;
use crate::libs::watcher::Watcher;
use crate::{msg_bail_anyhow, msg_error, msg_error_anyhow, msg_info, msg_warning};
use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;

pub const PID_FILE: &str = "runrun-tracker-watch.pid";

/// Runs the watcher until SIGTERM/SIGINT (Ctrl+C on Windows), then removes
/// the pid file.
pub async fn run_with_signal_handling() -> Result<()> {
    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();

    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        let mut sigterm = signal(SignalKind::terminate())?;
        let mut sigint = signal(SignalKind::interrupt())?;
        tokio::spawn(async move {
            tokio::select! {
                _ = sigterm.recv() => msg_info!(Message::WatcherReceivedSigterm),
                _ = sigint.recv() => msg_info!(Message::WatcherReceivedSigint),
            }
            let _ = shutdown_tx.send(());
        });
    }

    #[cfg(windows)]
    {
        tokio::spawn(async move {
            match tokio::signal::ctrl_c().await {
                Ok(()) => msg_info!(Message::WatcherReceivedCtrlC),
                Err(e) => msg_error!(Message::WatcherCtrlCListenFailed(e.to_string())),
            }
            let _ = shutdown_tx.send(());
        });
    }

    #[cfg(not(any(unix, windows)))]
    {
        msg_warning!(Message::WatcherSignalHandlingNotSupported);
    }

    let result = run_watcher(async move {
        let _ = shutdown_rx.await;
        msg_info!(Message::WatcherShuttingDown);
    })
    .await;

    if let Err(e) = &result {
        msg_error!(Message::WatcherError(format!("{:#}", e)));
    }

    // A foreground watcher must not remove the pid file of a detached one.
    if running_pid()? == Some(std::process::id()) {
        let _ = std::fs::remove_file(DataStorage::new().get_path(PID_FILE)?);
    }

    result
}

/// Wires the production capabilities together and runs the event loop.
async fn run_watcher<F>(shutdown: F) -> Result<()>
where
    F: std::future::Future<Output = ()>,
{
    let context = AppContext::open().await?;
    let watch_config = context.config.watch();

    context.backend.watch(watch_config.bus_poll_period());

    let bus = Arc::new(context.bus()?);
    bus.watch(watch_config.bus_poll_period());

    let reconciler = Arc::new(Reconciler::new(
        context.store.clone(),
        Arc::new(context.api()?),
        Arc::new(DesktopNotifier::new()),
        Arc::new(StatusIndicator::open()?),
        bus.clone() as Arc<dyn Bus>,
    ));

    let presence = PresenceMonitor::new(PresenceConfig {
        detection_interval: watch_config.idle_detection_interval,
        ..PresenceConfig::default()
    })
    .spawn();

    Watcher::new(reconciler, bus, watch_config.poll_period()).run(presence, shutdown).await
}

/// Starts a detached watcher, replacing one that is already running.
pub fn spawn() -> Result<()> {
    let pid_path = DataStorage::new().get_path(PID_FILE)?;

    if pid_path.exists() {
        if let Ok(pid_str) = std::fs::read_to_string(&pid_path) {
            msg_info!(Message::WatcherStoppingExisting(pid_str.trim().to_string()));
            if let Err(e) = stop_internal() {
                msg_warning!(Message::WatcherFailedToStopExisting(e.to_string()));
                let _ = std::fs::remove_file(&pid_path);
            }
            std::thread::sleep(Duration::from_millis(1000));
        }
    }

    let current_exe = std::env::current_exe()?;

    #[cfg(unix)]
    {
        use std::os::unix::process::CommandExt;
        let mut command = std::process::Command::new(current_exe);
        command.arg("--daemon-run");
        // Detach from the terminal's session.
        unsafe {
            command.pre_exec(|| {
                nix::unistd::setsid()?;
                Ok(())
            });
        }
        let child = command.spawn()?;
        let pid = child.id();
        std::fs::write(pid_path, pid.to_string())?;
        msg_info!(Message::WatcherStarted(pid));
    }

    #[cfg(windows)]
    {
        use std::os::windows::process::CommandExt;
        const CREATE_NO_WINDOW: u32 = 0x08000000;
        let child = std::process::Command::new(current_exe)
            .arg("--daemon-run")
            .creation_flags(CREATE_NO_WINDOW)
            .spawn()?;
        let pid = child.id();
        std::fs::write(pid_path, pid.to_string())?;
        msg_info!(Message::WatcherStarted(pid));
    }

    #[cfg(not(any(unix, windows)))]
    {
        let _ = current_exe;
        msg_bail_anyhow!(Message::DaemonModeNotSupported);
    }

    Ok(())
}

/// Whether a pid file points at a running watcher.
pub fn running_pid() -> Result<Option<u32>> {
    let pid_path = DataStorage::new().get_path(PID_FILE)?;
    let Ok(pid_str) = std::fs::read_to_string(&pid_path) else {
        return Ok(None);
    };
    Ok(pid_str.trim().parse().ok())
}

pub fn stop() -> Result<()> {
    let pid_path = DataStorage::new().get_path(PID_FILE)?;
    if !pid_path.exists() {
        msg_info!(Message::WatcherNotRunning);
        return Ok(());
    }
    stop_internal()
}

fn stop_internal() -> Result<()> {
    let pid_path = DataStorage::new().get_path(PID_FILE)?;
    if !pid_path.exists() {
        msg_bail_anyhow!(Message::WatcherNotRunning);
    }

    let pid_str = std::fs::read_to_string(&pid_path)?;
    let pid: u32 = pid_str.trim().parse().map_err(|_| msg_error_anyhow!(Message::InvalidPidFileContent))?;

    let killed = kill_process(pid)?;
    std::fs::remove_file(pid_path)?;

    if killed {
        msg_info!(Message::WatcherStopped(pid));
    } else {
        msg_info!(Message::WatcherNotRunning);
    }
    Ok(())
}

#[cfg(windows)]
fn kill_process(pid: u32) -> Result<bool> {
    use winapi::um::errhandlingapi::GetLastError;
    use winapi::um::handleapi::CloseHandle;
    use winapi::um::processthreadsapi::{OpenProcess, TerminateProcess};
    use winapi::um::winnt::PROCESS_TERMINATE;

    unsafe {
        let handle = OpenProcess(PROCESS_TERMINATE, 0, pid);
        if handle.is_null() {
            let error = GetLastError();
            // ERROR_INVALID_PARAMETER: no such process.
            if error == 87 {
                return Ok(false);
            }
            msg_bail_anyhow!(Message::FailedToOpenProcess(error));
        }

        let result = TerminateProcess(handle, 0);
        CloseHandle(handle);

        if result == 0 {
            msg_bail_anyhow!(Message::FailedToTerminateProcess(GetLastError()));
        }
        std::thread::sleep(Duration::from_millis(100));
        Ok(true)
    }
}

#[cfg(unix)]
fn kill_process(pid: u32) -> Result<bool> {
    use std::process::Command;

    let is_alive = || -> Result<bool> { Ok(Command::new("ps").arg("-p").arg(pid.to_string()).output()?.status.success()) };

    if !is_alive()? {
        return Ok(false);
    }

    Command::new("kill").arg("-TERM").arg(pid.to_string()).output()?;
    for _ in 0..10 {
        std::thread::sleep(Duration::from_millis(100));
        if !is_alive()? {
            return Ok(true);
        }
    }

    Command::new("kill").arg("-9").arg(pid.to_string()).output()?;
    std::thread::sleep(Duration::from_millis(100));
    Ok(true)
}

#[cfg(not(any(unix, windows)))]
fn kill_process(_pid: u32) -> Result<bool> {
    msg_bail_anyhow!(Message::ProcessTerminationNotSupported);
}
