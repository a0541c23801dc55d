use crate::libs::bus::{Bus, BusMessage};
use crate::libs::context::AppContext;
use crate::libs::messages::Message;
use crate::libs::view::View;
use crate::{msg_print, msg_warning};
use anyhow::Result;
use clap::Args;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast::error::RecvError;

const REPLY_POLL_INTERVAL: Duration = Duration::from_millis(100);

#[derive(Debug, Args)]
pub struct RefreshArgs {
    /// Seconds to wait for the watcher's task list, 0 to return immediately
    #[arg(long, short, default_value_t = 10)]
    wait: u64,
}

/// Asks the running watcher for a reconciliation cycle and prints the task
/// list it broadcasts back.
pub async fn cmd(args: RefreshArgs) -> Result<()> {
    let context = AppContext::open().await?;
    let state = context.store.state();

    let bus = Arc::new(context.bus()?);
    let mut messages = bus.subscribe();
    bus.watch(REPLY_POLL_INTERVAL);
    bus.send(BusMessage::UpdateRequested);

    if args.wait == 0 {
        msg_print!(Message::RefreshRequested);
        return Ok(());
    }

    let reply = tokio::time::timeout(Duration::from_secs(args.wait), async {
        loop {
            match messages.recv().await {
                Ok(BusMessage::TasksUpdated(tasks)) => return Some(tasks),
                Ok(BusMessage::UpdateRequested) | Err(RecvError::Lagged(_)) => continue,
                Err(RecvError::Closed) => return None,
            }
        }
    })
    .await;

    match reply {
        Ok(Some(tasks)) if tasks.is_empty() => msg_print!(Message::NoTasks),
        Ok(Some(tasks)) => {
            msg_print!(Message::OpenTasksHeader, true);
            View::tasks(&tasks, state.tracked_task.as_ref());
        }
        _ => msg_warning!(Message::WatcherNotResponding(args.wait)),
    }
    Ok(())
}
