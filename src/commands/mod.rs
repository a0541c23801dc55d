//! Command-line interface of runrun-tracker.
//!
//! Every subcommand lives in its own module exposing a `cmd` function; this
//! module only parses the arguments and dispatches.

pub mod init;
pub mod logout;
pub mod options;
pub mod refresh;
pub mod status;
pub mod task;
pub mod tasks;
pub mod track;
pub mod watch;

use anyhow::Result;
use clap::{Parser, Subcommand};
use task::TaskAction;

#[derive(Debug, Subcommand)]
enum Commands {
    #[command(about = "Configuration initialization")]
    Init(init::InitArgs),
    #[command(about = "Set credentials, reminders and auto pause/resume")]
    Options(options::OptionsArgs),
    #[command(about = "Show the synchronized state")]
    Status,
    #[command(about = "List open tasks")]
    Tasks,
    #[command(about = "List the last delivered tasks")]
    Closed,
    #[command(about = "Start working on a task")]
    Play(task::TaskArgs),
    #[command(about = "Stop working on a task")]
    Pause(task::TaskArgs),
    #[command(about = "Deliver (close) a task")]
    Deliver(task::TaskArgs),
    #[command(about = "Reopen a delivered task")]
    Reopen(task::TaskArgs),
    #[command(about = "Toggle auto pause/resume tracking of a task")]
    Track(track::TrackArgs),
    #[command(about = "Ask the watcher to update the task list now")]
    Refresh(refresh::RefreshArgs),
    #[command(about = "Run the background watcher")]
    Watch(watch::WatchArgs),
    #[command(about = "Forget credentials and synchronized state")]
    Logout,
}

#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
#[command(arg_required_else_help(true))]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,
}

impl Cli {
    pub async fn menu() -> Result<()> {
        let cli = Self::parse();
        match cli.command {
            Commands::Init(args) => init::cmd(args),
            Commands::Options(args) => options::cmd(args).await,
            Commands::Status => status::cmd().await,
            Commands::Tasks => tasks::cmd().await,
            Commands::Closed => tasks::closed().await,
            Commands::Play(args) => task::cmd(TaskAction::Play, args).await,
            Commands::Pause(args) => task::cmd(TaskAction::Pause, args).await,
            Commands::Deliver(args) => task::cmd(TaskAction::Deliver, args).await,
            Commands::Reopen(args) => task::cmd(TaskAction::Reopen, args).await,
            Commands::Track(args) => track::cmd(args).await,
            Commands::Refresh(args) => refresh::cmd(args).await,
            Commands::Watch(args) => watch::cmd(args).await,
            Commands::Logout => logout::cmd().await,
        }
    }
}
