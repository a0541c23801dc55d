use crate::libs::context::AppContext;
use crate::libs::messages::Message;
use crate::libs::state::{Action, Id};
use crate::{msg_success, msg_warning};
use anyhow::Result;
use clap::Args;

#[derive(Debug, Args)]
pub struct TrackArgs {
    /// Task id; tracking the tracked task again stops tracking it
    id: Id,
}

/// Toggles which task is paused and resumed with the machine's lock state.
pub async fn cmd(args: TrackArgs) -> Result<()> {
    let context = AppContext::open().await?;
    let Some(state) = context.authenticated() else {
        return Ok(());
    };

    if !state.auto_pause_resume {
        msg_warning!(Message::TrackingNeedsAutoPauseResume);
        return Ok(());
    }

    context.store.dispatch(Action::ToggleTrackingTask(args.id.clone())).await?;

    match context.store.state().tracked_task {
        Some(id) => msg_success!(Message::TaskTracked(id.to_string())),
        None => msg_success!(Message::TaskUntracked(args.id.to_string())),
    }
    Ok(())
}
