use crate::libs::daemon;
use crate::libs::messages::Message;
use crate::msg_info;
use anyhow::Result;
use clap::Args;

#[derive(Debug, Args)]
pub struct WatchArgs {
    /// Run in the foreground instead of detaching
    #[arg(long, short)]
    foreground: bool,

    /// Stop the running watcher
    #[arg(long)]
    stop: bool,
}

pub async fn cmd(args: WatchArgs) -> Result<()> {
    if args.stop {
        return daemon::stop();
    }

    if args.foreground {
        msg_info!(Message::WatcherStartingForeground);
        daemon::run_with_signal_handling().await
    } else {
        daemon::spawn()
    }
}
