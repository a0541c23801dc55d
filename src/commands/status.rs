use crate::libs::context::AppContext;
use crate::libs::daemon;
use crate::libs::messages::Message;
use crate::libs::view::View;
use crate::msg_print;
use anyhow::Result;

pub async fn cmd() -> Result<()> {
    let context = AppContext::open().await?;
    let state = context.store.state();

    msg_print!(Message::StatusHeader, true);
    View::status(&state, daemon::running_pid()?);
    Ok(())
}
