//! Reducer-based state container persisted through [`Storage`].
//!
//! Every process builds one `Store` at startup and shares it behind an `Arc`.
//! The in-memory copy changes in exactly two ways, both through the same
//! application path: a local [`Store::dispatch`], or a change written by
//! another process and reported on the storage feed. Either way, listeners
//! registered with [`Store::subscribe`] are called with the full new state in
//! registration order.
//!
//! ```rust,no_run
//! use runrun_tracker::libs::state::{reducer, Action, State};
//! use runrun_tracker::libs::storage::MemoryBackend;
//! use runrun_tracker::libs::store::Store;
//! use std::sync::Arc;
//!
//! # async fn run() -> anyhow::Result<()> {
//! let store = Store::new(reducer, State::default());
//! store.init("options", Arc::new(MemoryBackend::default())).await?;
//! store.dispatch(Action::StopTrackingTask).await?;
//! # Ok(())
//! # }
//! ```

use super::storage::{Storage, StorageBackend, Subscription};
use anyhow::Result;
use parking_lot::{Mutex, RwLock};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use tokio::sync::{watch, OnceCell};
use tracing::debug;

type Listener<S> = Arc<dyn Fn(&S) + Send + Sync>;
type Reducer<S, A> = Arc<dyn Fn(&S, &A) -> S + Send + Sync>;

struct Shared<S> {
    state: RwLock<S>,
    listeners: Mutex<Vec<(u64, Listener<S>)>>,
    next_listener: AtomicU64,
}

impl<S: Clone> Shared<S> {
    /// Replaces the state and runs every listener with it.
    fn apply(&self, state: S) {
        *self.state.write() = state.clone();

        // Snapshot so a listener may unsubscribe itself while being called.
        let listeners: Vec<Listener<S>> = self.listeners.lock().iter().map(|(_, listener)| listener.clone()).collect();
        for listener in listeners {
            listener(&state);
        }
    }
}

/// Handle returned by [`Store::subscribe`].
pub struct Unsubscribe<S> {
    id: u64,
    shared: Weak<Shared<S>>,
}

impl<S> Unsubscribe<S> {
    /// Removes exactly the registration this handle was created for.
    /// Calling it more than once does nothing.
    pub fn unsubscribe(&self) {
        if let Some(shared) = self.shared.upgrade() {
            shared.listeners.lock().retain(|(id, _)| *id != self.id);
        }
    }
}

pub struct Store<S, A> {
    reducer: Reducer<S, A>,
    shared: Arc<Shared<S>>,
    storage: OnceCell<(Storage<S>, Subscription)>,
    initialized: watch::Sender<bool>,
    dispatching: tokio::sync::Mutex<()>,
}

impl<S, A> Store<S, A>
where
    S: Serialize + DeserializeOwned + Clone + Send + Sync + 'static,
    A: Send + Sync + 'static,
{
    /// A store holding `initial_state` in memory only, until [`Store::init`].
    pub fn new<R>(reducer: R, initial_state: S) -> Self
    where
        R: Fn(&S, &A) -> S + Send + Sync + 'static,
    {
        let (initialized, _) = watch::channel(false);
        Self {
            reducer: Arc::new(reducer),
            shared: Arc::new(Shared {
                state: RwLock::new(initial_state),
                listeners: Mutex::new(Vec::new()),
                next_listener: AtomicU64::new(0),
            }),
            storage: OnceCell::new(),
            initialized,
            dispatching: tokio::sync::Mutex::new(()),
        }
    }

    /// Binds the store to `key` of `backend`, using the current in-memory
    /// state as defaults, and loads the persisted record.
    ///
    /// Repeated or concurrent calls share a single initialization; once it
    /// has succeeded, later calls return immediately and ignore their arguments.
    pub async fn init(&self, key: &str, backend: Arc<dyn StorageBackend>) -> Result<()> {
        self.storage
            .get_or_try_init(|| async move {
                let storage = Storage::new(key, self.state(), backend);

                let shared = self.shared.clone();
                let subscription = storage.subscribe(move |state| {
                    debug!("applying state written by another process");
                    shared.apply(state);
                });

                let state = match storage.load().await {
                    Ok(state) => state,
                    Err(e) => {
                        subscription.unsubscribe();
                        return Err(e);
                    }
                };
                self.shared.apply(state);
                self.initialized.send_replace(true);

                Ok((storage, subscription))
            })
            .await?;

        Ok(())
    }

    /// Resolves once [`Store::init`] has loaded the persisted record.
    pub async fn initialization(&self) {
        let mut initialized = self.initialized.subscribe();
        let _ = initialized.wait_for(|ready| *ready).await;
    }

    pub fn is_initialized(&self) -> bool {
        *self.initialized.borrow()
    }

    /// The last state this store observed.
    pub fn state(&self) -> S {
        self.shared.state.read().clone()
    }

    /// Registers `handler` to run after every state transition.
    pub fn subscribe<F>(&self, handler: F) -> Unsubscribe<S>
    where
        F: Fn(&S) + Send + Sync + 'static,
    {
        let id = self.shared.next_listener.fetch_add(1, Ordering::Relaxed);
        self.shared.listeners.lock().push((id, Arc::new(handler)));

        Unsubscribe {
            id,
            shared: Arc::downgrade(&self.shared),
        }
    }

    /// Applies `action` to the latest persisted state, notifies listeners,
    /// then persists the result. Does nothing before [`Store::init`].
    ///
    /// Dispatches of one store are applied in call order. A write made by
    /// another process between the load and the write is overwritten.
    pub async fn dispatch(&self, action: A) -> Result<()> {
        let Some((storage, _)) = self.storage.get() else {
            debug!("dispatch before initialization ignored");
            return Ok(());
        };

        let _order = self.dispatching.lock().await;
        let reducer = self.reducer.clone();
        let shared = self.shared.clone();

        storage
            .update(move |state| {
                let next = reducer(&state, &action);
                shared.apply(next.clone());
                next
            })
            .await?;

        Ok(())
    }

    /// Deletes the persisted record. The in-memory state is kept.
    pub async fn remove(&self) -> Result<()> {
        match self.storage.get() {
            Some((storage, _)) => storage.remove().await,
            None => Ok(()),
        }
    }
}

impl<S, A> Drop for Store<S, A> {
    fn drop(&mut self) {
        if let Some((_, subscription)) = self.storage.get() {
            subscription.unsubscribe();
        }
    }
}
