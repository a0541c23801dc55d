//! Persistent key/value storage for the State record.
//!
//! A [`Storage`] is bound to one key of a [`StorageBackend`] and to a default
//! record. Every backend publishes a change feed; a storage subscription only
//! reacts to new values for its own key in the `sync` area, and never to the
//! writes it made itself.
//!
//! Two backends are provided:
//!
//! - [`MemoryBackend`]: in-process map, shared between several stores to model
//!   several execution contexts.
//! - [`FileBackend`]: one JSON file per key. Writes from this process are
//!   announced immediately; writes from other processes are picked up by a
//!   poll-based watcher started with [`FileBackend::watch`].
//!
//! Writes are last-writer-wins: there is no compare-and-swap between a load
//! and the following write.

use super::data_storage::DataStorage;
use anyhow::Result;
use async_trait::async_trait;
use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Folder of the data directory holding the synced records.
pub const SYNC_DIR: &str = "sync";

const FEED_CAPACITY: usize = 64;

static NEXT_ORIGIN: AtomicU64 = AtomicU64::new(1);

/// Storage area a change was reported for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageArea {
    Sync,
    Local,
}

/// One entry of a backend's change feed.
#[derive(Debug, Clone, PartialEq)]
pub struct StorageChange {
    pub area: StorageArea,
    pub key: String,
    /// `None` when the key was removed.
    pub new_value: Option<Value>,
    /// Storage instance that made the write, `None` for writes observed from
    /// another process.
    pub origin: Option<u64>,
}

#[async_trait]
pub trait StorageBackend: Send + Sync {
    fn area(&self) -> StorageArea;

    async fn get(&self, key: &str) -> Result<Option<Value>>;

    async fn set(&self, key: &str, value: Value, origin: Option<u64>) -> Result<()>;

    async fn remove(&self, key: &str, origin: Option<u64>) -> Result<()>;

    /// A fresh receiver on the backend's change feed.
    fn changes(&self) -> broadcast::Receiver<StorageChange>;
}

/// In-process backend.
pub struct MemoryBackend {
    area: StorageArea,
    values: Mutex<HashMap<String, Value>>,
    feed: broadcast::Sender<StorageChange>,
}

impl MemoryBackend {
    pub fn new(area: StorageArea) -> Self {
        let (feed, _) = broadcast::channel(FEED_CAPACITY);
        Self {
            area,
            values: Mutex::new(HashMap::new()),
            feed,
        }
    }

    /// Seeds a value without announcing it.
    pub fn with_value(self, key: &str, value: Value) -> Self {
        self.values.lock().insert(key.to_string(), value);
        self
    }

    /// Publishes a change on the feed as if another context had made it.
    pub fn emit(&self, change: StorageChange) {
        if change.area == self.area {
            match &change.new_value {
                Some(value) => {
                    self.values.lock().insert(change.key.clone(), value.clone());
                }
                None => {
                    self.values.lock().remove(&change.key);
                }
            }
        }
        let _ = self.feed.send(change);
    }
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new(StorageArea::Sync)
    }
}

#[async_trait]
impl StorageBackend for MemoryBackend {
    fn area(&self) -> StorageArea {
        self.area
    }

    async fn get(&self, key: &str) -> Result<Option<Value>> {
        Ok(self.values.lock().get(key).cloned())
    }

    async fn set(&self, key: &str, value: Value, origin: Option<u64>) -> Result<()> {
        self.values.lock().insert(key.to_string(), value.clone());
        let _ = self.feed.send(StorageChange {
            area: self.area,
            key: key.to_string(),
            new_value: Some(value),
            origin,
        });
        Ok(())
    }

    async fn remove(&self, key: &str, origin: Option<u64>) -> Result<()> {
        self.values.lock().remove(key);
        let _ = self.feed.send(StorageChange {
            area: self.area,
            key: key.to_string(),
            new_value: None,
            origin,
        });
        Ok(())
    }

    fn changes(&self) -> broadcast::Receiver<StorageChange> {
        self.feed.subscribe()
    }
}

/// Backend keeping each key in `<dir>/<key>.json`.
pub struct FileBackend {
    dir: PathBuf,
    area: StorageArea,
    feed: broadcast::Sender<StorageChange>,
    // Last content this process wrote or observed, per key. Held while writing
    // so the watcher never mistakes a half-finished write for a foreign one.
    snapshots: tokio::sync::Mutex<HashMap<String, Option<String>>>,
    watcher: Mutex<Option<JoinHandle<()>>>,
}

impl FileBackend {
    pub fn new(dir: PathBuf) -> Self {
        let (feed, _) = broadcast::channel(FEED_CAPACITY);
        Self {
            dir,
            area: StorageArea::Sync,
            feed,
            snapshots: tokio::sync::Mutex::new(HashMap::new()),
            watcher: Mutex::new(None),
        }
    }

    /// Backend rooted at the `sync` folder of the application data directory.
    pub fn open() -> Result<Self> {
        Ok(Self::new(DataStorage::new().get_dir(SYNC_DIR)?))
    }

    pub fn path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }

    async fn read_raw(&self, key: &str) -> Result<Option<String>> {
        match tokio::fs::read_to_string(self.path(key)).await {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Starts polling the files of every key this backend has touched and
    /// announces content written by other processes.
    pub fn watch(self: &Arc<Self>, interval: Duration) {
        let weak: Weak<Self> = Arc::downgrade(self);
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let Some(backend) = weak.upgrade() else { break };
                if let Err(e) = backend.poll_external_changes().await {
                    warn!("storage watcher failed to read {}: {}", backend.dir.display(), e);
                }
            }
        });

        if let Some(previous) = self.watcher.lock().replace(handle) {
            previous.abort();
        }
    }

    /// Compares the files on disk with the last known content and publishes
    /// every difference. Returns the number of changes found.
    pub async fn poll_external_changes(&self) -> Result<usize> {
        let mut snapshots = self.snapshots.lock().await;
        let keys: Vec<String> = snapshots.keys().cloned().collect();
        let mut found = 0;

        for key in keys {
            let current = self.read_raw(&key).await?;
            if snapshots.get(&key) == Some(&current) {
                continue;
            }

            let new_value = match &current {
                Some(content) => match serde_json::from_str::<Value>(content) {
                    Ok(value) => Some(value),
                    Err(e) => {
                        // Most likely caught mid-write by another process; retry next tick.
                        debug!("skipping unreadable {}: {}", key, e);
                        continue;
                    }
                },
                None => None,
            };

            snapshots.insert(key.clone(), current);
            found += 1;
            let _ = self.feed.send(StorageChange {
                area: self.area,
                key,
                new_value,
                origin: None,
            });
        }

        Ok(found)
    }
}

impl Drop for FileBackend {
    fn drop(&mut self) {
        if let Some(handle) = self.watcher.lock().take() {
            handle.abort();
        }
    }
}

#[async_trait]
impl StorageBackend for FileBackend {
    fn area(&self) -> StorageArea {
        self.area
    }

    async fn get(&self, key: &str) -> Result<Option<Value>> {
        let mut snapshots = self.snapshots.lock().await;
        let content = self.read_raw(key).await?;
        snapshots.insert(key.to_string(), content.clone());

        match content {
            Some(content) => Ok(Some(serde_json::from_str(&content)?)),
            None => Ok(None),
        }
    }

    async fn set(&self, key: &str, value: Value, origin: Option<u64>) -> Result<()> {
        let content = serde_json::to_string_pretty(&value)?;
        let mut snapshots = self.snapshots.lock().await;

        tokio::fs::create_dir_all(&self.dir).await?;
        let path = self.path(key);
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, &content).await?;
        tokio::fs::rename(&tmp, &path).await?;

        snapshots.insert(key.to_string(), Some(content));
        drop(snapshots);

        let _ = self.feed.send(StorageChange {
            area: self.area,
            key: key.to_string(),
            new_value: Some(value),
            origin,
        });
        Ok(())
    }

    async fn remove(&self, key: &str, origin: Option<u64>) -> Result<()> {
        let mut snapshots = self.snapshots.lock().await;
        match tokio::fs::remove_file(self.path(key)).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }
        snapshots.insert(key.to_string(), None);
        drop(snapshots);

        let _ = self.feed.send(StorageChange {
            area: self.area,
            key: key.to_string(),
            new_value: None,
            origin,
        });
        Ok(())
    }

    fn changes(&self) -> broadcast::Receiver<StorageChange> {
        self.feed.subscribe()
    }
}

/// Handle returned by [`Storage::subscribe`].
pub struct Subscription {
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl Subscription {
    fn new(handle: JoinHandle<()>) -> Self {
        Self {
            handle: Mutex::new(Some(handle)),
        }
    }

    /// Stops delivering changes. Calling it again does nothing.
    pub fn unsubscribe(&self) {
        if let Some(handle) = self.handle.lock().take() {
            handle.abort();
        }
    }

    pub fn is_active(&self) -> bool {
        self.handle.lock().is_some()
    }
}

/// Typed view of one record of a backend.
pub struct Storage<T> {
    key: String,
    defaults: T,
    backend: Arc<dyn StorageBackend>,
    origin: u64,
}

impl<T> Storage<T>
where
    T: Serialize + DeserializeOwned + Clone + Send + Sync + 'static,
{
    pub fn new(key: &str, defaults: T, backend: Arc<dyn StorageBackend>) -> Self {
        Self {
            key: key.to_string(),
            defaults,
            backend,
            origin: NEXT_ORIGIN.fetch_add(1, Ordering::Relaxed),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// The stored record merged over the defaults. An empty store yields the defaults.
    pub async fn load(&self) -> Result<T> {
        let stored = self.backend.get(&self.key).await?;
        merge_with_defaults(stored, &self.defaults)
    }

    /// Loads, applies `f`, and persists the result. Returns what was written.
    pub async fn update<F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(T) -> T + Send,
    {
        let current = self.load().await?;
        let next = f(current);
        self.backend.set(&self.key, serde_json::to_value(&next)?, Some(self.origin)).await?;
        Ok(next)
    }

    pub async fn remove(&self) -> Result<()> {
        self.backend.remove(&self.key, Some(self.origin)).await
    }

    /// Calls `f` with every new value another writer stores under this key in
    /// the `sync` area. Removals are not reported.
    pub fn subscribe<F>(&self, f: F) -> Subscription
    where
        F: Fn(T) + Send + Sync + 'static,
    {
        let mut changes = self.backend.changes();
        let key = self.key.clone();
        let origin = self.origin;
        let defaults = self.defaults.clone();

        let handle = tokio::spawn(async move {
            loop {
                let change = match changes.recv().await {
                    Ok(change) => change,
                    Err(RecvError::Lagged(skipped)) => {
                        warn!("storage subscriber for '{}' skipped {} changes", key, skipped);
                        continue;
                    }
                    Err(RecvError::Closed) => break,
                };

                if change.area != StorageArea::Sync || change.key != key || change.origin == Some(origin) {
                    continue;
                }
                let Some(value) = change.new_value else { continue };

                match merge_with_defaults(Some(value), &defaults) {
                    Ok(record) => f(record),
                    Err(e) => warn!("ignoring change of '{}': {}", key, e),
                }
            }
        });

        Subscription::new(handle)
    }
}

/// Overlays the fields of `stored` on the serialized `defaults`.
///
/// Defaults only fill fields missing from the stored object. A stored field
/// that does not fit the record type is replaced by its default; the other
/// stored fields are kept. A stored value that is not an object yields the
/// defaults.
pub fn merge_with_defaults<T>(stored: Option<Value>, defaults: &T) -> Result<T>
where
    T: Serialize + DeserializeOwned + Clone,
{
    let stored = match stored {
        Some(Value::Object(stored)) => stored,
        None => return Ok(defaults.clone()),
        Some(other) => {
            warn!("stored record is not an object ({}), using defaults", other);
            return Ok(defaults.clone());
        }
    };
    let Value::Object(mut merged) = serde_json::to_value(defaults)? else {
        return Ok(defaults.clone());
    };

    let mut overlay = merged.clone();
    overlay.extend(stored.clone());
    if let Ok(record) = serde_json::from_value(Value::Object(overlay)) {
        return Ok(record);
    }

    // Some field is malformed: take the stored fields one at a time.
    for (field, value) in stored {
        let previous = merged.insert(field.clone(), value);
        if serde_json::from_value::<T>(Value::Object(merged.clone())).is_err() {
            warn!("stored field '{}' does not match the expected shape, using its default", field);
            match previous {
                Some(previous) => merged.insert(field, previous),
                None => merged.remove(&field),
            };
        }
    }

    match serde_json::from_value(Value::Object(merged)) {
        Ok(record) => Ok(record),
        Err(e) => {
            warn!("stored record does not match the expected shape: {}", e);
            Ok(defaults.clone())
        }
    }
}
