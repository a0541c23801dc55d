//! The State record shared by every runrun-tracker process, and its reducer.
//!
//! One `State` exists per installation. It is persisted under a single key by
//! the [`Storage`](super::storage::Storage) adapter and only ever changes by
//! dispatching an [`Action`] through [`reducer`].
//!
//! ## Wire format
//!
//! The record is stored as a JSON object whose field names match the ones the
//! Runrun.it browser extension used (`trackedTask`, `is_working_on`,
//! `reminderTimeInMinutes`, ...), so a record written by one process can be
//! read by any other. Actions serialize as `{ "type": ..., "payload": ... }`.
//!
//! ## Usage
//!
//! ```rust
//! use runrun_tracker::libs::state::{reducer, Action, Id, State};
//!
//! let state = State::default();
//! let next = reducer(&state, &Action::ToggleTrackingTask(Id::from(42)));
//! assert_eq!(next.tracked_task, Some(Id::from(42)));
//! ```

use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};
use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

/// Identifier of a Runrun.it task or user.
///
/// The API sends ids as numbers, older records stored them as strings. Two ids
/// are equal when their textual forms are equal, so `42` and `"42"` match.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Id(String);

impl Id {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Id {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for Id {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<i64> for Id {
    fn from(id: i64) -> Self {
        Self(id.to_string())
    }
}

impl FromStr for Id {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.trim().to_string()))
    }
}

impl Serialize for Id {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.0.parse::<i64>() {
            Ok(number) if number.to_string() == self.0 => serializer.serialize_i64(number),
            _ => serializer.serialize_str(&self.0),
        }
    }
}

impl<'de> Deserialize<'de> for Id {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawId {
            Number(i64),
            Text(String),
        }

        Ok(match RawId::deserialize(deserializer)? {
            RawId::Number(number) => Id::from(number),
            RawId::Text(text) => Id::from(text),
        })
    }
}

/// A task as returned by the `tasks` endpoint.
///
/// Only the fields the reconciler and the task listings read are modelled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: Id,
    #[serde(default)]
    pub title: String,
    /// Set by Runrun.it on the single task the user is currently working on.
    #[serde(default)]
    pub is_working_on: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_name: Option<String>,
    /// Seconds already worked on the task.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_worked: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_estimate_seconds: Option<i64>,
    #[serde(default)]
    pub on_going: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub close_date: Option<String>,
}

impl Task {
    pub fn new(id: impl Into<Id>, title: &str) -> Self {
        Self {
            id: id.into(),
            title: title.to_string(),
            is_working_on: false,
            project_name: None,
            time_worked: None,
            current_estimate_seconds: None,
            on_going: false,
            close_date: None,
        }
    }

    pub fn working(mut self) -> Self {
        self.is_working_on = true;
        self
    }
}

/// The Runrun.it user the credentials belong to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: Id,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Remaining profile fields, kept verbatim.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl User {
    pub fn new(id: impl Into<Id>) -> Self {
        Self {
            id: id.into(),
            name: None,
            extra: Map::new(),
        }
    }
}

/// Last known presence of the machine, as persisted in the State record.
///
/// `idle` is never stored: an idle machine still counts as active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MachineStatus {
    #[default]
    #[serde(alias = "idle")]
    Active,
    Locked,
}

/// Presence reported by the idle detector before normalization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IdleState {
    Active,
    Idle,
    Locked,
}

impl From<IdleState> for MachineStatus {
    fn from(state: IdleState) -> Self {
        match state {
            IdleState::Active | IdleState::Idle => MachineStatus::Active,
            IdleState::Locked => MachineStatus::Locked,
        }
    }
}

impl fmt::Display for MachineStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MachineStatus::Active => f.write_str("active"),
            MachineStatus::Locked => f.write_str("locked"),
        }
    }
}

/// User-editable settings carried by `UPDATE_OPTIONS`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Options {
    pub appkey: Option<String>,
    pub usertoken: Option<String>,
    pub reminder_enabled: bool,
    pub reminder_time_in_minutes: i64,
    pub auto_pause_resume: bool,
}

/// The persisted State record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct State {
    #[serde(rename = "reminderEnabled")]
    pub reminder_enabled: bool,
    #[serde(rename = "reminderTimeInMinutes")]
    pub reminder_time_in_minutes: i64,
    #[serde(rename = "lastMachineStatus")]
    pub last_machine_status: MachineStatus,
    /// Task opted into automatic pause/resume on lock/unlock.
    #[serde(rename = "trackedTask")]
    pub tracked_task: Option<Id>,
    #[serde(rename = "autoPauseResume")]
    pub auto_pause_resume: bool,
    /// Task Runrun.it reported as being worked on at the last poll.
    pub is_working_on: Option<Task>,
    /// When the last notification was shown.
    pub reminder: DateTime<Utc>,
    pub user: Option<User>,
    pub appkey: Option<String>,
    pub usertoken: Option<String>,
}

impl Default for State {
    fn default() -> Self {
        Self {
            reminder_enabled: true,
            reminder_time_in_minutes: 30,
            last_machine_status: MachineStatus::Active,
            tracked_task: None,
            auto_pause_resume: false,
            is_working_on: None,
            reminder: normalize_timestamp(&Utc::now()),
            user: None,
            appkey: None,
            usertoken: None,
        }
    }
}

impl State {
    /// Both credentials are present and non-empty.
    pub fn is_authenticated(&self) -> bool {
        let present = |value: &Option<String>| value.as_deref().is_some_and(|v| !v.is_empty());
        present(&self.appkey) && present(&self.usertoken)
    }

    pub fn options(&self) -> Options {
        Options {
            appkey: self.appkey.clone(),
            usertoken: self.usertoken.clone(),
            reminder_enabled: self.reminder_enabled,
            reminder_time_in_minutes: self.reminder_time_in_minutes,
            auto_pause_resume: self.auto_pause_resume,
        }
    }
}

/// Everything that can change the State record.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "payload", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Action {
    StopTrackingTask,
    ToggleTrackingTask(Id),
    SetUser(User),
    SetWorkingOnTask(Option<Task>),
    SetReminder(DateTime<Utc>),
    SetMachineStatus(MachineStatus),
    UpdateOptions(Options),
    /// Any action type this build does not know, whatever its payload;
    /// leaves the state untouched.
    Unknown,
}

#[derive(Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
enum ActionType {
    StopTrackingTask,
    ToggleTrackingTask,
    SetUser,
    SetWorkingOnTask,
    SetReminder,
    SetMachineStatus,
    UpdateOptions,
    #[serde(other)]
    Unknown,
}

impl<'de> Deserialize<'de> for Action {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        struct RawAction {
            #[serde(rename = "type")]
            kind: ActionType,
            #[serde(default)]
            payload: Value,
        }

        fn payload<T: serde::de::DeserializeOwned, E: serde::de::Error>(payload: Value) -> Result<T, E> {
            serde_json::from_value(payload).map_err(E::custom)
        }

        let raw = RawAction::deserialize(deserializer)?;
        Ok(match raw.kind {
            ActionType::StopTrackingTask => Action::StopTrackingTask,
            ActionType::ToggleTrackingTask => Action::ToggleTrackingTask(payload(raw.payload)?),
            ActionType::SetUser => Action::SetUser(payload(raw.payload)?),
            ActionType::SetWorkingOnTask => Action::SetWorkingOnTask(payload(raw.payload)?),
            ActionType::SetReminder => Action::SetReminder(payload(raw.payload)?),
            ActionType::SetMachineStatus => Action::SetMachineStatus(payload(raw.payload)?),
            ActionType::UpdateOptions => Action::UpdateOptions(payload(raw.payload)?),
            ActionType::Unknown => Action::Unknown,
        })
    }
}

/// Truncates a timestamp to millisecond precision, the resolution the record
/// is stored with.
pub fn normalize_timestamp(ts: &DateTime<Utc>) -> DateTime<Utc> {
    ts.trunc_subsecs(3)
}

/// Computes the next state. Pure: no I/O, no clock reads.
pub fn reducer(state: &State, action: &Action) -> State {
    let mut next = state.clone();

    match action {
        Action::StopTrackingTask => next.tracked_task = None,
        Action::ToggleTrackingTask(id) => {
            next.tracked_task = match &state.tracked_task {
                Some(current) if current == id => None,
                _ => Some(id.clone()),
            };
        }
        Action::SetUser(user) => next.user = Some(user.clone()),
        Action::SetWorkingOnTask(task) => next.is_working_on = task.clone(),
        Action::SetReminder(ts) => next.reminder = normalize_timestamp(ts),
        Action::SetMachineStatus(status) => next.last_machine_status = *status,
        Action::UpdateOptions(options) => {
            next.appkey = options.appkey.clone();
            next.usertoken = options.usertoken.clone();
            next.reminder_enabled = options.reminder_enabled;
            next.reminder_time_in_minutes = options.reminder_time_in_minutes;
            next.auto_pause_resume = options.auto_pause_resume;

            if !options.auto_pause_resume {
                next.last_machine_status = MachineStatus::Active;
                next.tracked_task = None;
            }
        }
        Action::Unknown => {}
    }

    next
}
