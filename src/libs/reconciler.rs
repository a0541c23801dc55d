//! Background reconciliation of the remote task list with the local state.
//!
//! One [`Reconciler`] lives in the watcher process. Every cycle fetches the
//! user's open tasks, works out which one is being worked on, raises at most
//! one desktop notification, updates the status icon, stores the result and
//! broadcasts the task list to the other processes.
//!
//! ## Triggers
//!
//! - periodic ticks, ignored while unauthenticated or while the machine is
//!   locked ([`Reconciler::on_tick`])
//! - `UpdateRequested` on the bus ([`Reconciler::on_message`])
//! - machine presence changes when auto pause/resume is on
//!   ([`Reconciler::on_machine_status`])
//!
//! A tick or request arriving while a cycle runs is dropped. A cycle following
//! a successful pause or play waits for the running one instead.

use super::bus::{Bus, BusMessage};
use super::indicator::{Icon, Indicator};
use super::notifier::{Notification, Notifier};
use super::state::{normalize_timestamp, Action, Id, IdleState, MachineStatus, State, Task, User};
use super::store::Store;
use crate::api::{ApiError, TaskApi, TaskQuery};
use chrono::{DateTime, Duration, Utc};
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::{debug, info, warn};

pub type AppStore = Store<State, Action>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    /// The task list was fetched and the state updated.
    Completed,
    /// The remote call failed; an empty task list was broadcast.
    Failed,
    /// Not run: gated off, or another cycle was in flight.
    Skipped,
}

enum CycleError {
    Api(ApiError),
    Storage(anyhow::Error),
}

impl From<ApiError> for CycleError {
    fn from(e: ApiError) -> Self {
        CycleError::Api(e)
    }
}

impl From<anyhow::Error> for CycleError {
    fn from(e: anyhow::Error) -> Self {
        CycleError::Storage(e)
    }
}

/// What the reconciler remembers between cycles.
#[derive(Debug, Clone)]
struct Memory {
    working_on: Option<Task>,
    reminder: DateTime<Utc>,
}

/// Result of comparing a fetched task list with the previous cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct Reconciliation {
    pub working_on: Option<Task>,
    pub stop_tracking: bool,
    pub notification: Option<Notification>,
    pub reminder: DateTime<Utc>,
}

/// Decides what a cycle does with `tasks`. Pure, so it can be reasoned about
/// apart from the I/O around it.
pub fn reconcile(
    tasks: &[Task],
    state: &State,
    previous: Option<&Task>,
    reminder: DateTime<Utc>,
    now: DateTime<Utc>,
) -> Reconciliation {
    let working_on = tasks.iter().find(|task| task.is_working_on).cloned();

    let stop_tracking = match &state.tracked_task {
        Some(tracked) => {
            let listed = tasks.iter().any(|task| &task.id == tracked);
            let other_working = working_on.as_ref().is_some_and(|task| &task.id != tracked);
            !listed || other_working
        }
        None => false,
    };

    // An interval too large to represent is never due.
    let reminder_due = state.reminder_enabled
        && Duration::try_minutes(state.reminder_time_in_minutes).is_some_and(|interval| now - reminder >= interval);
    let notification = match (previous, &working_on) {
        (Some(previous), None) => Some(Notification::pause(previous)),
        (previous, Some(current)) if previous.map(|task| &task.id) != Some(&current.id) => Some(Notification::work(current)),
        _ if reminder_due => Some(Notification::reminder(working_on.as_ref())),
        _ => None,
    };

    Reconciliation {
        reminder: if notification.is_some() { now } else { reminder },
        working_on,
        stop_tracking,
        notification,
    }
}

pub struct Reconciler {
    store: Arc<AppStore>,
    api: Arc<dyn TaskApi>,
    notifier: Arc<dyn Notifier>,
    indicator: Arc<dyn Indicator>,
    bus: Arc<dyn Bus>,
    memory: Mutex<Memory>,
    cycle: tokio::sync::Mutex<()>,
}

impl Reconciler {
    /// Builds a reconciler remembering what `store` last recorded. The store
    /// should be initialized first.
    pub fn new(
        store: Arc<AppStore>,
        api: Arc<dyn TaskApi>,
        notifier: Arc<dyn Notifier>,
        indicator: Arc<dyn Indicator>,
        bus: Arc<dyn Bus>,
    ) -> Self {
        let state = store.state();
        Self {
            memory: Mutex::new(Memory {
                working_on: state.is_working_on,
                reminder: state.reminder,
            }),
            store,
            api,
            notifier,
            indicator,
            bus,
            cycle: tokio::sync::Mutex::new(()),
        }
    }

    pub fn store(&self) -> &Arc<AppStore> {
        &self.store
    }

    /// Periodic trigger.
    pub async fn on_tick(&self) -> anyhow::Result<CycleOutcome> {
        let state = self.store.state();
        if !state.is_authenticated() || state.last_machine_status != MachineStatus::Active {
            debug!("tick skipped (authenticated: {}, machine: {})", state.is_authenticated(), state.last_machine_status);
            return Ok(CycleOutcome::Skipped);
        }
        self.try_update_tasks().await
    }

    pub async fn on_message(&self, message: &BusMessage) -> anyhow::Result<CycleOutcome> {
        match message {
            BusMessage::UpdateRequested => self.try_update_tasks().await,
            BusMessage::TasksUpdated(_) => Ok(CycleOutcome::Skipped),
        }
    }

    /// Reacts to a change of machine presence. With auto pause/resume on and a
    /// tracked task, locking pauses the task and coming back plays it. The
    /// request goes out before the new status is recorded.
    pub async fn on_machine_status(&self, idle_state: IdleState) -> anyhow::Result<CycleOutcome> {
        let status = MachineStatus::from(idle_state);
        let state = self.store.state();

        let requested = match (&state.tracked_task, state.auto_pause_resume && state.last_machine_status != status) {
            (Some(tracked), true) => Some(self.request(tracked, status).await),
            _ => None,
        };

        self.store.dispatch(Action::SetMachineStatus(status)).await?;

        match requested {
            Some(true) => self.update_tasks().await,
            Some(false) => Ok(CycleOutcome::Failed),
            None => Ok(CycleOutcome::Skipped),
        }
    }

    /// Pauses `id` remotely, then reconciles. Nothing changes locally when
    /// the request fails.
    pub async fn pause_task(&self, id: &Id) -> anyhow::Result<CycleOutcome> {
        match self.request(id, MachineStatus::Locked).await {
            true => self.update_tasks().await,
            false => Ok(CycleOutcome::Failed),
        }
    }

    pub async fn resume_task(&self, id: &Id) -> anyhow::Result<CycleOutcome> {
        match self.request(id, MachineStatus::Active).await {
            true => self.update_tasks().await,
            false => Ok(CycleOutcome::Failed),
        }
    }

    /// Pauses (locked) or plays (active) `id`. Returns whether it succeeded.
    async fn request(&self, id: &Id, status: MachineStatus) -> bool {
        let (verb, result) = match status {
            MachineStatus::Locked => {
                info!("machine locked, pausing task {}", id);
                ("pause", self.api.pause(id).await)
            }
            MachineStatus::Active => {
                info!("machine active again, resuming task {}", id);
                ("resume", self.api.play(id).await)
            }
        };

        if let Err(e) = &result {
            warn!("failed to {} task {}: {}", verb, id, e);
        }
        result.is_ok()
    }

    /// Runs a cycle, waiting for one already in flight to finish first.
    pub async fn update_tasks(&self) -> anyhow::Result<CycleOutcome> {
        let _cycle = self.cycle.lock().await;
        self.run_cycle().await
    }

    async fn try_update_tasks(&self) -> anyhow::Result<CycleOutcome> {
        let Ok(_cycle) = self.cycle.try_lock() else {
            debug!("cycle already in flight, trigger dropped");
            return Ok(CycleOutcome::Skipped);
        };
        self.run_cycle().await
    }

    async fn run_cycle(&self) -> anyhow::Result<CycleOutcome> {
        match self.cycle_steps().await {
            Ok(()) => Ok(CycleOutcome::Completed),
            Err(CycleError::Api(e)) => {
                warn!("failed to update tasks: {}", e);
                self.bus.send(BusMessage::TasksUpdated(Vec::new()));
                Ok(CycleOutcome::Failed)
            }
            Err(CycleError::Storage(e)) => {
                self.bus.send(BusMessage::TasksUpdated(Vec::new()));
                Err(e)
            }
        }
    }

    async fn current_user(&self) -> Result<User, CycleError> {
        if let Some(user) = self.store.state().user {
            return Ok(user);
        }

        let user = self.api.current_user().await?;
        self.store.dispatch(Action::SetUser(user.clone())).await?;
        Ok(user)
    }

    async fn cycle_steps(&self) -> Result<(), CycleError> {
        let user = self.current_user().await?;
        let tasks = self.api.tasks(&TaskQuery::open_for(&user.id)).await?;

        let state = self.store.state();
        let memory = self.memory.lock().clone();
        let now = normalize_timestamp(&Utc::now());
        let outcome = reconcile(&tasks, &state, memory.working_on.as_ref(), memory.reminder, now);

        if outcome.stop_tracking {
            debug!("tracked task {:?} is no longer being worked on", state.tracked_task);
            self.store.dispatch(Action::StopTrackingTask).await?;
        }

        if let Some(notification) = &outcome.notification {
            self.notifier.notify(notification);
        }

        self.indicator.set_icon(match outcome.working_on {
            Some(_) => Icon::Active,
            None => Icon::Default,
        });

        self.store.dispatch(Action::SetWorkingOnTask(outcome.working_on.clone())).await?;
        self.store.dispatch(Action::SetReminder(outcome.reminder)).await?;

        *self.memory.lock() = Memory {
            working_on: outcome.working_on,
            reminder: outcome.reminder,
        };

        self.bus.send(BusMessage::TasksUpdated(tasks));
        Ok(())
    }
}
