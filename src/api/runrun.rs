use super::{ApiError, ApiResult, Credentials, TaskApi, TaskQuery};
use crate::libs::app_metadata::{user_agent, APP_METADATA_BASE_URL};
use crate::libs::config::ConfigModule;
use crate::libs::messages::Message;
use crate::libs::state::{Id, Task, User};
use crate::msg_print;
use anyhow::Result;
use async_trait::async_trait;
use dialoguer::{theme::ColorfulTheme, Input};
use reqwest::{
    header::{HeaderMap, HeaderValue},
    Client, RequestBuilder,
};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

const API_PATH: &str = "api/v1.0";
const USER_URL: &str = "users/me";
const TASKS_URL: &str = "tasks";
const APP_KEY_HEADER: &str = "app-key";
const USER_TOKEN_HEADER: &str = "user-token";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

type CredentialSource = Arc<dyn Fn() -> Option<Credentials> + Send + Sync>;

/// HTTP client of the Runrun.it API.
///
/// Credentials are looked up on every request so a client built once keeps
/// working after the user changes them with `runrun-tracker options`.
pub struct Runrun {
    client: Client,
    base_url: String,
    credentials: CredentialSource,
}

impl Runrun {
    pub fn new<F>(config: &RunrunConfig, credentials: F) -> Result<Self>
    where
        F: Fn() -> Option<Credentials> + Send + Sync + 'static,
    {
        let client = Client::builder().user_agent(user_agent()).timeout(REQUEST_TIMEOUT).build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            credentials: Arc::new(credentials),
        })
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}/{}/{}", self.base_url, API_PATH, path)
    }

    fn headers(&self) -> ApiResult<HeaderMap> {
        let credentials = (self.credentials)().ok_or(ApiError::MissingCredentials)?;

        let mut headers = HeaderMap::new();
        headers.insert(APP_KEY_HEADER, HeaderValue::from_str(&credentials.app_key)?);
        headers.insert(USER_TOKEN_HEADER, HeaderValue::from_str(&credentials.user_token)?);
        Ok(headers)
    }

    async fn send(&self, url: String, request: RequestBuilder) -> ApiResult<reqwest::Response> {
        let response = request.headers(self.headers()?).send().await?;
        let status = response.status();
        debug!("{} -> {}", url, status);

        if !status.is_success() {
            return Err(ApiError::Status { url, status });
        }
        Ok(response)
    }

    async fn get<T: DeserializeOwned>(&self, path: &str, query: &[(&str, String)]) -> ApiResult<T> {
        let url = self.url(path);
        let request = self.client.get(&url).query(query);
        Ok(self.send(url, request).await?.json::<T>().await?)
    }

    async fn post(&self, path: &str) -> ApiResult<()> {
        let url = self.url(path);
        let request = self.client.post(&url);
        self.send(url, request).await?;
        Ok(())
    }

    async fn task_action(&self, id: &Id, action: &str) -> ApiResult<()> {
        self.post(&format!("{}/{}/{}", TASKS_URL, id, action)).await
    }
}

#[async_trait]
impl TaskApi for Runrun {
    async fn current_user(&self) -> ApiResult<User> {
        self.get(USER_URL, &[]).await
    }

    async fn tasks(&self, query: &TaskQuery) -> ApiResult<Vec<Task>> {
        self.get(TASKS_URL, &query.to_pairs()).await
    }

    async fn pause(&self, id: &Id) -> ApiResult<()> {
        self.task_action(id, "pause").await
    }

    async fn play(&self, id: &Id) -> ApiResult<()> {
        self.task_action(id, "play").await
    }

    async fn reopen(&self, id: &Id) -> ApiResult<()> {
        self.task_action(id, "reopen").await
    }

    async fn deliver(&self, id: &Id) -> ApiResult<()> {
        self.task_action(id, "deliver").await
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct RunrunConfig {
    /// Root of the Runrun.it installation, without the API path.
    pub base_url: String,
}

impl Default for RunrunConfig {
    fn default() -> Self {
        Self {
            base_url: APP_METADATA_BASE_URL.to_string(),
        }
    }
}

impl RunrunConfig {
    pub fn module() -> ConfigModule {
        ConfigModule {
            key: "runrun".to_string(),
            name: "Runrun.it".to_string(),
        }
    }

    pub fn init(config: &Option<RunrunConfig>) -> Result<Self> {
        let config = config.clone().unwrap_or_default();

        msg_print!(Message::ConfigModuleRunrun);

        Ok(Self {
            base_url: Input::with_theme(&ColorfulTheme::default())
                .with_prompt(Message::PromptBaseUrl.to_string())
                .default(config.base_url)
                .interact_text()?,
        })
    }
}
