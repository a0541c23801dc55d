//! Client for the Runrun.it task tracker.
//!
//! The rest of the crate talks to the remote service through the [`TaskApi`]
//! trait so the reconciler and commands can run against a fake in tests.
//! [`Runrun`] is the HTTP implementation.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use runrun_tracker::api::{Credentials, Runrun, RunrunConfig, TaskApi, TaskQuery};
//!
//! # async fn run() -> anyhow::Result<()> {
//! let credentials = Credentials::new("app-key", "user-token");
//! let api = Runrun::new(&RunrunConfig::default(), move || Some(credentials.clone()))?;
//! let user = api.current_user().await?;
//! let tasks = api.tasks(&TaskQuery::open_for(&user.id)).await?;
//! # Ok(())
//! # }
//! ```

use crate::libs::state::{Id, State, Task, User};
use async_trait::async_trait;
use thiserror::Error;

pub mod runrun;

pub use runrun::{Runrun, RunrunConfig};

/// Page size used by every task listing.
pub const TASK_PAGE_SIZE: u32 = 10;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("app key and user token are not configured")]
    MissingCredentials,

    #[error("{url} responded with {status}")]
    Status { url: String, status: reqwest::StatusCode },

    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid header value: {0}")]
    InvalidHeader(#[from] reqwest::header::InvalidHeaderValue),
}

pub type ApiResult<T> = std::result::Result<T, ApiError>;

/// Values sent as `App-Key` and `User-Token` on every request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub app_key: String,
    pub user_token: String,
}

impl Credentials {
    pub fn new(app_key: impl Into<String>, user_token: impl Into<String>) -> Self {
        Self {
            app_key: app_key.into(),
            user_token: user_token.into(),
        }
    }

    /// Credentials held by the state record, if both are present.
    pub fn from_state(state: &State) -> Option<Self> {
        match (&state.appkey, &state.usertoken) {
            (Some(app_key), Some(user_token)) if !app_key.is_empty() && !user_token.is_empty() => {
                Some(Self::new(app_key.as_str(), user_token.as_str()))
            }
            _ => None,
        }
    }
}

/// Query string of `GET tasks`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskQuery {
    pub sort: &'static str,
    pub sort_dir: &'static str,
    pub limit: u32,
    pub is_closed: bool,
    pub task_list_user_id: Option<Id>,
}

impl TaskQuery {
    /// Open tasks assigned to `user_id`, by priority.
    pub fn open_for(user_id: &Id) -> Self {
        Self {
            sort: "priority",
            sort_dir: "asc",
            limit: TASK_PAGE_SIZE,
            is_closed: false,
            task_list_user_id: Some(user_id.clone()),
        }
    }

    /// Most recently delivered tasks.
    pub fn closed() -> Self {
        Self {
            sort: "close_date",
            sort_dir: "desc",
            limit: TASK_PAGE_SIZE,
            is_closed: true,
            task_list_user_id: None,
        }
    }

    pub fn to_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![
            ("sort", self.sort.to_string()),
            ("sort_dir", self.sort_dir.to_string()),
            ("limit", self.limit.to_string()),
            ("is_closed", self.is_closed.to_string()),
        ];
        if let Some(user_id) = &self.task_list_user_id {
            pairs.push(("task_list_user_id", user_id.to_string()));
        }
        pairs
    }
}

/// Operations of the remote task tracker.
#[async_trait]
pub trait TaskApi: Send + Sync {
    async fn current_user(&self) -> ApiResult<User>;

    async fn tasks(&self, query: &TaskQuery) -> ApiResult<Vec<Task>>;

    async fn pause(&self, id: &Id) -> ApiResult<()>;

    async fn play(&self, id: &Id) -> ApiResult<()>;

    async fn reopen(&self, id: &Id) -> ApiResult<()>;

    async fn deliver(&self, id: &Id) -> ApiResult<()>;
}
