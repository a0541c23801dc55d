use super::state::IdleState;
use parking_lot::Mutex;
use rdev::{listen, Event, EventType};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::time::{self, Duration, Instant};
use tracing::{debug, warn};

// Defines how the machine's presence is sampled.
#[derive(Debug, Clone)]
pub struct PresenceConfig {
    pub detection_interval: u64, // Seconds without input before the machine counts as idle.
    pub poll_interval: u64,      // Interval in milliseconds between two samples.
}

impl Default for PresenceConfig {
    fn default() -> Self {
        Self {
            detection_interval: 15,
            poll_interval: 1000,
        }
    }
}

type LockProbe = Arc<dyn Fn() -> bool + Send + Sync>;

// Reports active/idle/locked transitions of the machine.
pub struct PresenceMonitor {
    pub config: PresenceConfig,
    pub last_activity: Arc<Mutex<Instant>>, // Time of the last keyboard/mouse input.
    lock_probe: LockProbe,
}

impl PresenceMonitor {
    pub fn new(config: PresenceConfig) -> Self {
        Self {
            config,
            last_activity: Arc::new(Mutex::new(Instant::now())),
            lock_probe: Arc::new(is_session_locked),
        }
    }

    // Replaces the platform check used to tell whether the session is locked.
    pub fn with_lock_probe<F>(mut self, probe: F) -> Self
    where
        F: Fn() -> bool + Send + Sync + 'static,
    {
        self.lock_probe = Arc::new(probe);
        self
    }

    pub fn record_activity(&self) {
        *self.last_activity.lock() = Instant::now();
    }

    // Samples the current presence: locked wins over idle.
    pub fn current_state(&self) -> IdleState {
        if (self.lock_probe)() {
            return IdleState::Locked;
        }
        if self.last_activity.lock().elapsed() >= Duration::from_secs(self.config.detection_interval) {
            IdleState::Idle
        } else {
            IdleState::Active
        }
    }

    // Starts the input listener and the sampling loop. Every change of presence
    // is sent on the returned channel; the machine is assumed active at start.
    pub fn spawn(self) -> mpsc::Receiver<IdleState> {
        let (sender, receiver) = mpsc::channel(16);

        let shared_last_activity = self.last_activity.clone();
        std::thread::spawn(move || loop {
            let last_activity_for_listener = shared_last_activity.clone();
            if let Err(e) = listen(move |event: Event| match event.event_type {
                EventType::KeyPress(_) | EventType::ButtonPress(_) | EventType::MouseMove { .. } | EventType::Wheel { .. } => {
                    *last_activity_for_listener.lock() = Instant::now();
                }
                _ => {}
            }) {
                warn!("failed to listen for input events: {:?}, retrying in 1 second", e);
                std::thread::sleep(std::time::Duration::from_secs(1));
            } else {
                break;
            }
        });

        tokio::spawn(async move {
            let mut reported = IdleState::Active;
            let mut ticker = time::interval(Duration::from_millis(self.config.poll_interval));
            loop {
                ticker.tick().await;
                let state = self.current_state();
                if state == reported {
                    continue;
                }

                debug!("machine presence {:?} -> {:?}", reported, state);
                reported = state;
                if sender.send(state).await.is_err() {
                    break;
                }
            }
        });

        receiver
    }
}

// Asks logind whether the current session is locked.
#[cfg(target_os = "linux")]
pub fn is_session_locked() -> bool {
    use std::process::Command;

    let session = std::env::var("XDG_SESSION_ID").unwrap_or_else(|_| "auto".to_string());
    match Command::new("loginctl").args(["show-session", &session, "--property=LockedHint", "--value"]).output() {
        Ok(output) if output.status.success() => String::from_utf8_lossy(&output.stdout).trim() == "yes",
        _ => false,
    }
}

// Lock detection is only available through logind; elsewhere only idle/active are reported.
#[cfg(not(target_os = "linux"))]
pub fn is_session_locked() -> bool {
    false
}
