use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use serde::{Deserialize, Serialize};

use crate::RaceError;

const CONFIG_FILE_NAME: &str = "config.json";

pub const DEFAULT_SERVER_URL: &str = "http://localhost:8000";
pub const COUNTDOWN_START: u32 = 3;
pub const COUNTDOWN_TICK_MS: u64 = 1000;
pub const POLL_INTERVAL_MS: u64 = 500;
pub const MAX_CONSECUTIVE_POLL_FAILURES: u32 = 5;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    pub server_url: String,
    pub countdown_start: u32,
    pub countdown_tick_ms: u64,
    pub poll_interval_ms: u64,
    pub max_consecutive_poll_failures: u32,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server_url: DEFAULT_SERVER_URL.to_string(),
            countdown_start: COUNTDOWN_START,
            countdown_tick_ms: COUNTDOWN_TICK_MS,
            poll_interval_ms: POLL_INTERVAL_MS,
            max_consecutive_poll_failures: MAX_CONSECUTIVE_POLL_FAILURES,
        }
    }
}

impl AppConfig {
    pub fn countdown_tick(&self) -> Duration {
        Duration::from_millis(self.countdown_tick_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn default_path() -> Result<PathBuf, RaceError> {
        Ok(dirs::config_dir()
            .ok_or(RaceError::NoConfigDir)?
            .join("podrace")
            .join(CONFIG_FILE_NAME))
    }

    /// Loads the config saved in the user's config directory, if there is one.
    pub fn from_local_file() -> Result<Option<Self>, RaceError> {
        let Ok(config_path) = Self::default_path() else {
            return Ok(None);
        };
        if config_path.exists() {
            Self::from_file(&config_path).map(Some)
        } else {
            Ok(None)
        }
    }

    pub fn from_file(path: &Path) -> Result<Self, RaceError> {
        let file =
            std::fs::File::open(path).map_err(|e| RaceError::ConfigIOError { source: e })?;
        serde_json::from_reader(file).map_err(|e| RaceError::ConfigSerializeError { source: e })
    }

    pub fn save(&self) -> Result<(), RaceError> {
        self.save_to(&Self::default_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), RaceError> {
        if let Some(parent) = path.parent() {
            if !parent.exists() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| RaceError::ConfigIOError { source: e })?;
            }
        }

        let file =
            std::fs::File::create(path).map_err(|e| RaceError::ConfigIOError { source: e })?;
        serde_json::to_writer_pretty(file, self)
            .map_err(|e| RaceError::ConfigSerializeError { source: e })
    }
}
