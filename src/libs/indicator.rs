//! Status icon reflecting whether a task is being worked on.
//!
//! The watcher has no toolbar of its own; it writes the name of the current
//! icon to a file that status bars (waybar, polybar, xbar, ...) can display.

use super::data_storage::DataStorage;
use anyhow::Result;
use parking_lot::Mutex;
use std::fs;
use std::path::PathBuf;
use tracing::{debug, warn};

pub const ICON_FILE: &str = "icon";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Icon {
    Default,
    Active,
}

impl Icon {
    pub fn file_name(&self) -> &'static str {
        match self {
            Icon::Default => "icon_128.png",
            Icon::Active => "icon_128_active.png",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Icon::Default => "default",
            Icon::Active => "active",
        }
    }
}

pub trait Indicator: Send + Sync {
    fn set_icon(&self, icon: Icon);
}

pub struct StatusIndicator {
    path: PathBuf,
    current: Mutex<Option<Icon>>,
}

impl StatusIndicator {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            current: Mutex::new(None),
        }
    }

    pub fn open() -> Result<Self> {
        Ok(Self::new(DataStorage::new().get_path(ICON_FILE)?))
    }

    /// Icon last written by any process, if any.
    pub fn read(&self) -> Option<Icon> {
        match fs::read_to_string(&self.path).ok()?.trim() {
            "active" => Some(Icon::Active),
            "default" => Some(Icon::Default),
            _ => None,
        }
    }
}

impl Indicator for StatusIndicator {
    fn set_icon(&self, icon: Icon) {
        let mut current = self.current.lock();
        if *current == Some(icon) {
            return;
        }

        debug!("status icon -> {}", icon.file_name());
        match fs::write(&self.path, icon.name()) {
            Ok(()) => *current = Some(icon),
            Err(e) => warn!("failed to update status icon at {}: {}", self.path.display(), e),
        }
    }
}
