use crate::libs::context::AppContext;
use crate::libs::messages::Message;
use crate::msg_success;
use anyhow::Result;

/// Forgets credentials, user and tracking state by deleting the State record.
pub async fn cmd() -> Result<()> {
    let context = AppContext::open().await?;
    context.store.remove().await?;

    msg_success!(Message::LoggedOut);
    Ok(())
}
