//! Core library modules of runrun-tracker.
//!
//! ## Features
//!
//! - **State**: the State record, its actions and the reducer
//! - **Persistence**: storage backends and the reducer-based store on top of them
//! - **Reconciliation**: the background reconciler and the watcher loop driving it
//! - **Platform**: desktop notifications, status icon, machine presence, inter-process bus
//! - **Infrastructure**: configuration, data directory, messages, watcher daemon
//!
//! ## Usage
//!
//! ```rust,no_run
//! use runrun_tracker::libs::context::AppContext;
//! use runrun_tracker::libs::state::Action;
//!
//! # async fn run() -> anyhow::Result<()> {
//! let context = AppContext::open().await?;
//! context.store.dispatch(Action::StopTrackingTask).await?;
//! # Ok(())
//! # }
//! ```

pub mod app_metadata;
pub mod bus;
pub mod config;
pub mod context;
pub mod daemon;
pub mod data_storage;
pub mod formatter;
pub mod indicator;
pub mod messages;
pub mod notifier;
pub mod presence;
pub mod reconciler;
pub mod state;
pub mod storage;
pub mod store;
pub mod view;
pub mod watcher;
