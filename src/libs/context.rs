//! Shared wiring of a runrun-tracker process.

use super::bus::FileBus;
use super::config::Config;
use super::messages::Message;
use super::reconciler::AppStore;
use super::state::{reducer, Action, State, User};
use super::storage::FileBackend;
use super::store::Store;
use crate::api::{Credentials, Runrun, TaskApi};
use crate::{msg_debug, msg_warning};
use anyhow::Result;
use std::sync::Arc;

/// Storage key of the State record.
pub const STATE_KEY: &str = "options";

pub struct AppContext {
    pub config: Config,
    pub store: Arc<AppStore>,
    pub backend: Arc<FileBackend>,
}

impl AppContext {
    /// Reads the configuration and loads the State record.
    pub async fn open() -> Result<Self> {
        let config = Config::read()?;
        let backend = Arc::new(FileBackend::open()?);
        let store = Arc::new(Store::new(reducer, State::default()));
        store.init(STATE_KEY, backend.clone()).await?;

        Ok(Self { config, store, backend })
    }

    /// API client reading its credentials from the State record.
    pub fn api(&self) -> Result<Runrun> {
        let store = self.store.clone();
        Runrun::new(&self.config.runrun(), move || Credentials::from_state(&store.state()))
    }

    pub fn bus(&self) -> Result<FileBus> {
        FileBus::open()
    }

    /// The current state if credentials are configured. Otherwise tells the
    /// user how to configure them.
    pub fn authenticated(&self) -> Option<State> {
        let state = self.store.state();
        if state.is_authenticated() {
            Some(state)
        } else {
            msg_warning!(Message::NotAuthenticated);
            None
        }
    }

    /// The cached user, or the one the API reports, which is then cached.
    pub async fn current_user(&self, api: &dyn TaskApi) -> Result<User> {
        if let Some(user) = self.store.state().user {
            return Ok(user);
        }

        let user = api.current_user().await?;
        msg_debug!(format!("caching user {}", user.id));
        self.store.dispatch(Action::SetUser(user.clone())).await?;
        Ok(user)
    }
}
