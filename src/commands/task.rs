//! Remote actions on a single task: play, pause, deliver and reopen.
//!
//! After a successful action an update request is published so a running
//! watcher refreshes the task list right away.

use crate::api::TaskApi;
use crate::libs::bus::{Bus, BusMessage};
use crate::libs::context::AppContext;
use crate::libs::messages::Message;
use crate::libs::state::{Action, Id};
use crate::msg_success;
use anyhow::Result;
use clap::Args;

#[derive(Debug, Args)]
pub struct TaskArgs {
    /// Task id
    id: Id,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskAction {
    Play,
    Pause,
    Deliver,
    Reopen,
}

pub async fn cmd(action: TaskAction, args: TaskArgs) -> Result<()> {
    let context = AppContext::open().await?;
    if context.authenticated().is_none() {
        return Ok(());
    }

    let api = context.api()?;
    run(&context, &api, action, &args.id).await?;

    context.bus()?.send(BusMessage::UpdateRequested);
    Ok(())
}

/// Performs `action` on task `id`. Pausing also stops tracking, so the
/// watcher does not play the task again when the machine wakes up.
pub async fn run(context: &AppContext, api: &dyn TaskApi, action: TaskAction, id: &Id) -> Result<()> {
    match action {
        TaskAction::Play => {
            api.play(id).await?;
            msg_success!(Message::TaskPlayed(id.to_string()));
        }
        TaskAction::Pause => {
            context.store.dispatch(Action::StopTrackingTask).await?;
            api.pause(id).await?;
            msg_success!(Message::TaskPaused(id.to_string()));
        }
        TaskAction::Deliver => {
            api.deliver(id).await?;
            msg_success!(Message::TaskDelivered(id.to_string()));
        }
        TaskAction::Reopen => {
            api.reopen(id).await?;
            msg_success!(Message::TaskReopened(id.to_string()));
        }
    }
    Ok(())
}
