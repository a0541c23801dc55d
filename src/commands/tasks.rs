use crate::api::{TaskApi, TaskQuery};
use crate::libs::context::AppContext;
use crate::libs::messages::Message;
use crate::libs::view::View;
use crate::msg_print;
use anyhow::Result;

/// Open tasks of the current user, by priority.
pub async fn cmd() -> Result<()> {
    let context = AppContext::open().await?;
    let Some(state) = context.authenticated() else {
        return Ok(());
    };

    let api = context.api()?;
    let user = context.current_user(&api).await?;
    let tasks = api.tasks(&TaskQuery::open_for(&user.id)).await?;

    if tasks.is_empty() {
        msg_print!(Message::NoTasks);
        return Ok(());
    }

    msg_print!(Message::OpenTasksHeader, true);
    View::tasks(&tasks, state.tracked_task.as_ref());
    Ok(())
}

/// Last delivered tasks, most recent first.
pub async fn closed() -> Result<()> {
    let context = AppContext::open().await?;
    if context.authenticated().is_none() {
        return Ok(());
    }

    let tasks = context.api()?.tasks(&TaskQuery::closed()).await?;
    if tasks.is_empty() {
        msg_print!(Message::NoTasks);
        return Ok(());
    }

    msg_print!(Message::ClosedTasksHeader, true);
    View::closed_tasks(&tasks);
    Ok(())
}
