#![allow(dead_code)]

use async_trait::async_trait;
use parking_lot::Mutex;
use runrun_tracker::api::{ApiError, ApiResult, TaskApi, TaskQuery};
use runrun_tracker::libs::bus::{Bus, BusMessage, LocalBus};
use runrun_tracker::libs::context::STATE_KEY;
use runrun_tracker::libs::indicator::{Icon, Indicator};
use runrun_tracker::libs::notifier::{Notification, Notifier};
use runrun_tracker::libs::reconciler::{AppStore, Reconciler};
use runrun_tracker::libs::state::{reducer, Id, State, Task, User};
use runrun_tracker::libs::storage::MemoryBackend;
use runrun_tracker::libs::store::Store;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::{broadcast, oneshot, Notify};

pub fn server_error() -> ApiError {
    ApiError::Status {
        url: "http://runrun.test/api/v1.0/tasks".to_string(),
        status: reqwest::StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Scripted stand-in for the Runrun.it API.
pub struct FakeApi {
    pub user: Mutex<Option<User>>,
    /// `None` makes `tasks` fail.
    pub tasks: Mutex<Option<Vec<Task>>>,
    pub fail_actions: Mutex<bool>,
    pub calls: Mutex<Vec<String>>,
    pub queries: Mutex<Vec<TaskQuery>>,
    pub user_calls: AtomicUsize,
    /// Signalled when `tasks` is entered.
    pub entered: Notify,
    /// When set, `tasks` waits for it before answering.
    pub hold: Mutex<Option<oneshot::Receiver<()>>>,
}

impl FakeApi {
    pub fn new(user: User, tasks: Vec<Task>) -> Self {
        Self {
            user: Mutex::new(Some(user)),
            tasks: Mutex::new(Some(tasks)),
            fail_actions: Mutex::new(false),
            calls: Mutex::new(Vec::new()),
            queries: Mutex::new(Vec::new()),
            user_calls: AtomicUsize::new(0),
            entered: Notify::new(),
            hold: Mutex::new(None),
        }
    }

    pub fn set_tasks(&self, tasks: Vec<Task>) {
        *self.tasks.lock() = Some(tasks);
    }

    pub fn fail_tasks(&self) {
        *self.tasks.lock() = None;
    }

    /// Makes the next `tasks` call wait until the returned sender fires.
    pub fn hold_next(&self) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        *self.hold.lock() = Some(rx);
        tx
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }

    fn action(&self, name: &str, id: &Id) -> ApiResult<()> {
        self.calls.lock().push(format!("{} {}", name, id));
        if *self.fail_actions.lock() {
            return Err(server_error());
        }
        Ok(())
    }
}

#[async_trait]
impl TaskApi for FakeApi {
    async fn current_user(&self) -> ApiResult<User> {
        self.user_calls.fetch_add(1, Ordering::SeqCst);
        self.user.lock().clone().ok_or(ApiError::MissingCredentials)
    }

    async fn tasks(&self, query: &TaskQuery) -> ApiResult<Vec<Task>> {
        self.queries.lock().push(query.clone());
        self.entered.notify_one();

        let hold = self.hold.lock().take();
        if let Some(hold) = hold {
            let _ = hold.await;
        }

        self.tasks.lock().clone().ok_or_else(server_error)
    }

    async fn pause(&self, id: &Id) -> ApiResult<()> {
        self.action("pause", id)
    }

    async fn play(&self, id: &Id) -> ApiResult<()> {
        self.action("play", id)
    }

    async fn reopen(&self, id: &Id) -> ApiResult<()> {
        self.action("reopen", id)
    }

    async fn deliver(&self, id: &Id) -> ApiResult<()> {
        self.action("deliver", id)
    }
}

#[derive(Default)]
pub struct RecordingNotifier {
    pub shown: Mutex<Vec<Notification>>,
}

impl RecordingNotifier {
    pub fn shown(&self) -> Vec<Notification> {
        self.shown.lock().clone()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notification: &Notification) {
        self.shown.lock().push(notification.clone());
    }
}

#[derive(Default)]
pub struct RecordingIndicator {
    pub icons: Mutex<Vec<Icon>>,
}

impl RecordingIndicator {
    pub fn last(&self) -> Option<Icon> {
        self.icons.lock().last().copied()
    }
}

impl Indicator for RecordingIndicator {
    fn set_icon(&self, icon: Icon) {
        self.icons.lock().push(icon);
    }
}

pub fn authenticated_state() -> State {
    State {
        appkey: Some("app-key".to_string()),
        usertoken: Some("user-token".to_string()),
        ..State::default()
    }
}

/// A store over `backend`, initialized from whatever it holds.
pub async fn store_over(backend: Arc<MemoryBackend>) -> Arc<AppStore> {
    let store = Arc::new(Store::new(reducer, State::default()));
    store.init(STATE_KEY, backend).await.unwrap();
    store
}

/// Everything a reconciler talks to, with fakes in place of the platform.
pub struct Harness {
    pub backend: Arc<MemoryBackend>,
    pub store: Arc<AppStore>,
    pub api: Arc<FakeApi>,
    pub notifier: Arc<RecordingNotifier>,
    pub indicator: Arc<RecordingIndicator>,
    pub bus: Arc<LocalBus>,
    pub messages: broadcast::Receiver<BusMessage>,
    pub reconciler: Arc<Reconciler>,
}

impl Harness {
    pub async fn new(state: State, api: FakeApi) -> Self {
        let backend = Arc::new(MemoryBackend::default().with_value(STATE_KEY, serde_json::to_value(&state).unwrap()));
        let store = store_over(backend.clone()).await;
        let api = Arc::new(api);
        let notifier = Arc::new(RecordingNotifier::default());
        let indicator = Arc::new(RecordingIndicator::default());
        let bus = Arc::new(LocalBus::new());
        let messages = bus.subscribe();

        let reconciler = Arc::new(Reconciler::new(
            store.clone(),
            api.clone(),
            notifier.clone(),
            indicator.clone(),
            bus.clone(),
        ));

        Self {
            backend,
            store,
            api,
            notifier,
            indicator,
            bus,
            messages,
            reconciler,
        }
    }

    /// Bus messages published since the last call.
    pub fn published(&mut self) -> Vec<BusMessage> {
        let mut published = Vec::new();
        while let Ok(message) = self.messages.try_recv() {
            published.push(message);
        }
        published
    }
}
