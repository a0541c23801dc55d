//! Installation settings of runrun-tracker.
//!
//! Stored as pretty-printed JSON in `config.json` of the data directory.
//! Credentials are not part of it: they live in the synchronized State record
//! and are managed with `runrun-tracker options`.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use runrun_tracker::libs::config::Config;
//!
//! # fn run() -> anyhow::Result<()> {
//! let config = Config::read()?;
//! let watch = config.watch.unwrap_or_default();
//! println!("polling every {} seconds", watch.poll_interval);
//! # Ok(())
//! # }
//! ```

use super::data_storage::DataStorage;
use crate::api::RunrunConfig;
use crate::libs::messages::Message;
use crate::msg_print;
use anyhow::Result;
use dialoguer::{theme::ColorfulTheme, Input, MultiSelect};
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::time::Duration;

pub const CONFIG_FILE_NAME: &str = "config.json";

#[derive(Debug, Clone)]
pub struct ConfigModule {
    pub key: String,
    pub name: String,
}

/// Timing of the background watcher.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct WatchConfig {
    /// Seconds between two periodic task updates.
    pub poll_interval: u64,

    /// Seconds without input after which the machine counts as idle.
    pub idle_detection_interval: u64,

    /// Milliseconds between two checks for changes made by other processes.
    pub bus_poll_interval: u64,
}

impl Default for WatchConfig {
    fn default() -> Self {
        WatchConfig {
            poll_interval: 30,
            idle_detection_interval: 15,
            bus_poll_interval: 500,
        }
    }
}

impl WatchConfig {
    pub fn poll_period(&self) -> Duration {
        Duration::from_secs(self.poll_interval.max(1))
    }

    pub fn bus_poll_period(&self) -> Duration {
        Duration::from_millis(self.bus_poll_interval.max(10))
    }

    pub fn module() -> ConfigModule {
        ConfigModule {
            key: "watch".to_string(),
            name: "Watcher".to_string(),
        }
    }

    pub fn init(config: &Option<WatchConfig>) -> Result<Self> {
        let default = config.clone().unwrap_or_default();
        msg_print!(Message::ConfigModuleWatch);

        Ok(Self {
            poll_interval: Input::with_theme(&ColorfulTheme::default())
                .with_prompt(Message::PromptPollInterval.to_string())
                .default(default.poll_interval)
                .interact_text()?,
            idle_detection_interval: Input::with_theme(&ColorfulTheme::default())
                .with_prompt(Message::PromptIdleDetectionInterval.to_string())
                .default(default.idle_detection_interval)
                .interact_text()?,
            bus_poll_interval: Input::with_theme(&ColorfulTheme::default())
                .with_prompt(Message::PromptBusPollInterval.to_string())
                .default(default.bus_poll_interval)
                .interact_text()?,
        })
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct Config {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub runrun: Option<RunrunConfig>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub watch: Option<WatchConfig>,
}

impl Config {
    /// Reads `config.json`, or the defaults when it does not exist yet.
    pub fn read() -> Result<Config> {
        let config_file_path = DataStorage::new().get_path(CONFIG_FILE_NAME)?;
        if !config_file_path.exists() {
            return Ok(Config::default());
        }

        let config_str = fs::read_to_string(config_file_path)?;
        let config: Config = serde_json::from_str(&config_str)?;
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        let config_file_path = DataStorage::new().get_path(CONFIG_FILE_NAME)?;
        let config_file = File::create(config_file_path)?;
        serde_json::to_writer_pretty(&config_file, &self)?;
        Ok(())
    }

    /// Removes `config.json`. Returns whether there was one.
    pub fn delete() -> Result<bool> {
        let config_file_path = DataStorage::new().get_path(CONFIG_FILE_NAME)?;
        if !config_file_path.exists() {
            return Ok(false);
        }
        fs::remove_file(config_file_path)?;
        Ok(true)
    }

    pub fn runrun(&self) -> RunrunConfig {
        self.runrun.clone().unwrap_or_default()
    }

    pub fn watch(&self) -> WatchConfig {
        self.watch.clone().unwrap_or_default()
    }

    /// Interactive wizard over the sections the user selects.
    pub fn init() -> Result<Self> {
        let mut config = Self::read().unwrap_or_default();

        let modules = vec![RunrunConfig::module(), WatchConfig::module()];
        let selected = MultiSelect::with_theme(&ColorfulTheme::default())
            .with_prompt(Message::PromptSelectModules.to_string())
            .items(&modules.iter().map(|module| &module.name).collect::<Vec<_>>())
            .interact()?;

        for &selection in &selected {
            match modules[selection].key.as_str() {
                "runrun" => config.runrun = Some(RunrunConfig::init(&config.runrun)?),
                "watch" => config.watch = Some(WatchConfig::init(&config.watch)?),
                _ => {}
            }
        }

        Ok(config)
    }
}
