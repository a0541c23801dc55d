//! Credentials and reminder/auto pause options.
//!
//! With any flag only the given options change. Without flags every option
//! is prompted for, defaulting to its current value.

use crate::libs::context::AppContext;
use crate::libs::messages::Message;
use crate::libs::state::{Action, Options};
use crate::{msg_bail_anyhow, msg_print, msg_success};
use anyhow::Result;
use clap::Args;
use dialoguer::{theme::ColorfulTheme, Confirm, Input};

#[derive(Debug, Args)]
pub struct OptionsArgs {
    /// Runrun.it App-Key
    #[arg(long)]
    app_key: Option<String>,

    /// Runrun.it User-Token
    #[arg(long)]
    user_token: Option<String>,

    /// Enable or disable periodic reminders
    #[arg(long)]
    reminder: Option<bool>,

    /// Minutes between two reminders
    #[arg(long)]
    reminder_minutes: Option<i64>,

    /// Pause the tracked task when the machine locks and resume it afterwards
    #[arg(long)]
    auto_pause_resume: Option<bool>,
}

impl OptionsArgs {
    fn is_empty(&self) -> bool {
        self.app_key.is_none()
            && self.user_token.is_none()
            && self.reminder.is_none()
            && self.reminder_minutes.is_none()
            && self.auto_pause_resume.is_none()
    }

    fn apply(self, mut options: Options) -> Options {
        if let Some(app_key) = self.app_key {
            options.appkey = Some(app_key);
        }
        if let Some(user_token) = self.user_token {
            options.usertoken = Some(user_token);
        }
        if let Some(reminder) = self.reminder {
            options.reminder_enabled = reminder;
        }
        if let Some(minutes) = self.reminder_minutes {
            options.reminder_time_in_minutes = minutes;
        }
        if let Some(auto_pause_resume) = self.auto_pause_resume {
            options.auto_pause_resume = auto_pause_resume;
        }
        options
    }
}

pub async fn cmd(args: OptionsArgs) -> Result<()> {
    let context = AppContext::open().await?;
    let current = context.store.state().options();

    let options = if args.is_empty() { prompt(current)? } else { args.apply(current) };
    validate_reminder_minutes(options.reminder_time_in_minutes)?;

    context.store.dispatch(Action::UpdateOptions(options)).await?;

    msg_success!(Message::OptionsSaved);
    Ok(())
}

/// Longest accepted reminder interval: one week.
pub const MAX_REMINDER_MINUTES: i64 = 7 * 24 * 60;

pub fn validate_reminder_minutes(minutes: i64) -> Result<()> {
    if !(1..=MAX_REMINDER_MINUTES).contains(&minutes) {
        msg_bail_anyhow!(Message::InvalidReminderInterval(minutes));
    }
    Ok(())
}

fn prompt(current: Options) -> Result<Options> {
    let theme = ColorfulTheme::default();
    msg_print!(Message::OptionsHeader, true);

    let appkey: String = Input::with_theme(&theme)
        .with_prompt(Message::PromptAppKey.to_string())
        .default(current.appkey.unwrap_or_default())
        .interact_text()?;
    let usertoken: String = Input::with_theme(&theme)
        .with_prompt(Message::PromptUserToken.to_string())
        .default(current.usertoken.unwrap_or_default())
        .interact_text()?;
    let reminder_enabled = Confirm::with_theme(&theme)
        .with_prompt(Message::PromptReminderEnabled.to_string())
        .default(current.reminder_enabled)
        .interact()?;
    let reminder_time_in_minutes = if reminder_enabled {
        Input::with_theme(&theme)
            .with_prompt(Message::PromptReminderMinutes.to_string())
            .default(current.reminder_time_in_minutes)
            .interact_text()?
    } else {
        current.reminder_time_in_minutes
    };
    let auto_pause_resume = Confirm::with_theme(&theme)
        .with_prompt(Message::PromptAutoPauseResume.to_string())
        .default(current.auto_pause_resume)
        .interact()?;

    Ok(Options {
        appkey: Some(appkey).filter(|value| !value.is_empty()),
        usertoken: Some(usertoken).filter(|value| !value.is_empty()),
        reminder_enabled,
        reminder_time_in_minutes,
        auto_pause_resume,
    })
}
