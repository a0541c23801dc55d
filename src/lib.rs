//! Runrun.it task tracking from the command line.
//!
//! A background watcher keeps the synchronized State record in line with the
//! tasks the user is working on, raises desktop notifications and pauses or
//! resumes the tracked task when the machine is locked or unlocked. Short-lived
//! command invocations read and change the same record.

pub mod api;
pub mod commands;
pub mod libs;
