//! Broadcast channel between the watcher and the command-line processes.
//!
//! Two subjects travel on it: a request to refresh the task list, and the
//! task list the watcher fetched (empty after a failed fetch). Sending never
//! fails from the caller's point of view and nobody acknowledges a message.

use super::data_storage::DataStorage;
use super::state::Task;
use anyhow::Result;
use chrono::Utc;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

pub const BUS_FILE: &str = "bus.json";

const BUS_CAPACITY: usize = 32;

static NEXT_BUS: AtomicU64 = AtomicU64::new(1);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "subject", content = "body")]
pub enum BusMessage {
    #[serde(rename = "taskUpdateRequest")]
    UpdateRequested,
    #[serde(rename = "taskUpdated")]
    TasksUpdated(Vec<Task>),
}

pub trait Bus: Send + Sync {
    /// Fire and forget.
    fn send(&self, message: BusMessage);

    fn subscribe(&self) -> broadcast::Receiver<BusMessage>;
}

/// Bus confined to the current process.
#[derive(Clone)]
pub struct LocalBus {
    sender: broadcast::Sender<BusMessage>,
}

impl LocalBus {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(BUS_CAPACITY);
        Self { sender }
    }
}

impl Default for LocalBus {
    fn default() -> Self {
        Self::new()
    }
}

impl Bus for LocalBus {
    fn send(&self, message: BusMessage) {
        // No receiver is not an error for a broadcast.
        let _ = self.sender.send(message);
    }

    fn subscribe(&self) -> broadcast::Receiver<BusMessage> {
        self.sender.subscribe()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Envelope {
    seq: i64,
    origin: String,
    message: BusMessage,
}

/// Bus shared between processes through a single file.
///
/// The last message sent by any process is kept in the file together with a
/// sequence stamp. [`FileBus::watch`] polls the file and forwards messages
/// written by other processes to local subscribers.
pub struct FileBus {
    path: PathBuf,
    origin: String,
    local: LocalBus,
    last_seq: Mutex<i64>,
    watcher: Mutex<Option<JoinHandle<()>>>,
}

impl FileBus {
    pub fn new(path: PathBuf) -> Self {
        let origin = format!("{}-{}", std::process::id(), NEXT_BUS.fetch_add(1, Ordering::Relaxed));
        let bus = Self {
            path,
            origin,
            local: LocalBus::new(),
            last_seq: Mutex::new(0),
            watcher: Mutex::new(None),
        };

        // Whatever is already in the file was meant for someone else, earlier.
        if let Some(envelope) = bus.read_envelope() {
            *bus.last_seq.lock() = envelope.seq;
        }
        bus
    }

    pub fn open() -> Result<Self> {
        Ok(Self::new(DataStorage::new().get_path(BUS_FILE)?))
    }

    fn read_envelope(&self) -> Option<Envelope> {
        let content = fs::read_to_string(&self.path).ok()?;
        match serde_json::from_str(&content) {
            Ok(envelope) => Some(envelope),
            Err(e) => {
                debug!("unreadable bus file {}: {}", self.path.display(), e);
                None
            }
        }
    }

    fn write_envelope(&self, envelope: &Envelope) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, serde_json::to_string(envelope)?)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    fn next_seq(&self) -> i64 {
        let mut last = self.last_seq.lock();
        let now = Utc::now().timestamp_nanos_opt().unwrap_or(i64::MAX);
        *last = now.max(*last + 1);
        *last
    }

    /// Forwards a message written by another process, if there is a new one.
    pub fn poll(&self) -> Option<BusMessage> {
        let envelope = self.read_envelope()?;
        {
            let mut last = self.last_seq.lock();
            if envelope.seq <= *last {
                return None;
            }
            *last = envelope.seq;
        }
        if envelope.origin == self.origin {
            return None;
        }

        self.local.send(envelope.message.clone());
        Some(envelope.message)
    }

    pub fn watch(self: &Arc<Self>, interval: Duration) {
        let weak: Weak<Self> = Arc::downgrade(self);
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let Some(bus) = weak.upgrade() else { break };
                bus.poll();
            }
        });

        if let Some(previous) = self.watcher.lock().replace(handle) {
            previous.abort();
        }
    }
}

impl Drop for FileBus {
    fn drop(&mut self) {
        if let Some(handle) = self.watcher.lock().take() {
            handle.abort();
        }
    }
}

impl Bus for FileBus {
    fn send(&self, message: BusMessage) {
        let envelope = Envelope {
            seq: self.next_seq(),
            origin: self.origin.clone(),
            message: message.clone(),
        };
        if let Err(e) = self.write_envelope(&envelope) {
            warn!("failed to publish {:?} on {}: {}", envelope.message, self.path.display(), e);
        }
        self.local.send(message);
    }

    fn subscribe(&self) -> broadcast::Receiver<BusMessage> {
        self.local.subscribe()
    }
}
