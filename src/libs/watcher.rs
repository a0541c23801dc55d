//! Event loop of the background watcher.
//!
//! Drives a [`Reconciler`] from three sources: the periodic timer, messages on
//! the bus and machine presence changes. Each timer tick and bus message is
//! handled on its own task so a slow request never delays the loop; presence
//! changes are handled one after the other, in the order they were observed.

use super::bus::{Bus, BusMessage};
use super::reconciler::Reconciler;
use super::state::IdleState;
use anyhow::Result;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc};
use tokio::time::{self, Instant};
use tracing::{debug, error, info};

pub struct Watcher {
    reconciler: Arc<Reconciler>,
    bus: Arc<dyn Bus>,
    period: Duration,
}

impl Watcher {
    pub fn new(reconciler: Arc<Reconciler>, bus: Arc<dyn Bus>, period: Duration) -> Self {
        Self { reconciler, bus, period }
    }

    /// Runs until `shutdown` resolves. The first tick fires one period after
    /// the start.
    pub async fn run<F>(self, mut presence: mpsc::Receiver<IdleState>, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        let mut ticker = time::interval_at(Instant::now() + self.period, self.period);
        ticker.set_missed_tick_behavior(time::MissedTickBehavior::Skip);
        let mut messages = self.bus.subscribe();

        let reconciler = self.reconciler.clone();
        let presence_worker = tokio::spawn(async move {
            while let Some(idle_state) = presence.recv().await {
                debug!("machine presence changed to {:?}", idle_state);
                if let Err(e) = reconciler.on_machine_status(idle_state).await {
                    error!("failed to handle machine status {:?}: {:#}", idle_state, e);
                }
            }
        });

        info!("watcher started, updating tasks every {:?}", self.period);
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = &mut shutdown => break,
                _ = ticker.tick() => {
                    let reconciler = self.reconciler.clone();
                    tokio::spawn(async move {
                        if let Err(e) = reconciler.on_tick().await {
                            error!("periodic update failed: {:#}", e);
                        }
                    });
                }
                message = messages.recv() => match message {
                    Ok(BusMessage::UpdateRequested) => {
                        let reconciler = self.reconciler.clone();
                        tokio::spawn(async move {
                            if let Err(e) = reconciler.on_message(&BusMessage::UpdateRequested).await {
                                error!("requested update failed: {:#}", e);
                            }
                        });
                    }
                    Ok(BusMessage::TasksUpdated(_)) => {}
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        debug!("bus lagged, {} messages skipped", skipped);
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                },
            }
        }

        presence_worker.abort();
        info!("watcher stopped");
        Ok(())
    }
}
