use anyhow::Result;
use runrun_tracker::commands::Cli;
use runrun_tracker::libs::daemon;
use tracing_subscriber::EnvFilter;

const DAEMON_RUN_ARG: &str = "--daemon-run";

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenv::dotenv();

    let daemon_run = std::env::args().any(|arg| arg == DAEMON_RUN_ARG);

    // The watcher logs its activity; interactive commands only warnings.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(if daemon_run { "info" } else { "warn" })))
        .init();

    if daemon_run {
        return daemon::run_with_signal_handling().await;
    }

    Cli::menu().await
}
