use anyhow::{Context, Result};
use log::warn;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
    sync::{RwLock, RwLockReadGuard, RwLockWriteGuard},
    time::Duration,
};

use crate::timer::{clamp_limit_minutes, TimerConfig, DEFAULT_LIMIT_MINUTES};

pub const SETTINGS_FILE_NAME: &str = "settings.json";
/// Set to `1` to write the timer snapshot on every tick.
pub const DEBUG_ENV_VAR: &str = "BEO_DEBUG";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct UserSettings {
    /// Hourly budget used until the user has a profile.
    pub default_limit_minutes: u32,
    pub tick_interval_ms: u64,
    pub save_every_ticks: u32,
    pub history_capacity: usize,
}

impl Default for UserSettings {
    fn default() -> Self {
        Self {
            default_limit_minutes: DEFAULT_LIMIT_MINUTES,
            tick_interval_ms: 1_000,
            save_every_ticks: 10,
            history_capacity: 100,
        }
    }
}

impl UserSettings {
    pub fn timer_config(&self, debug: bool) -> TimerConfig {
        TimerConfig {
            tick_interval: Duration::from_millis(self.tick_interval_ms.max(1)),
            save_every_ticks: if debug { 1 } else { self.save_every_ticks.max(1) },
        }
    }
}

pub fn debug_enabled() -> bool {
    std::env::var(DEBUG_ENV_VAR).is_ok_and(|value| value == "1")
}

pub struct SettingsStore {
    path: PathBuf,
    data: RwLock<UserSettings>,
}

impl SettingsStore {
    /// Loads `settings.json` from `dir`. Missing or malformed files fall back
    /// to defaults.
    pub fn open(dir: &Path) -> Result<Self> {
        Self::new(dir.join(SETTINGS_FILE_NAME))
    }

    pub fn new(path: PathBuf) -> Result<Self> {
        let data = if path.exists() {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read settings from {}", path.display()))?;
            serde_json::from_str(&contents).unwrap_or_else(|err| {
                warn!("Ignoring malformed settings in {}: {err}", path.display());
                UserSettings::default()
            })
        } else {
            UserSettings::default()
        };

        Ok(Self {
            path,
            data: RwLock::new(data),
        })
    }

    pub fn get(&self) -> UserSettings {
        self.read().clone()
    }

    pub fn default_limit_minutes(&self) -> u32 {
        clamp_limit_minutes(self.read().default_limit_minutes)
    }

    pub fn history_capacity(&self) -> usize {
        self.read().history_capacity.max(1)
    }

    pub fn timer_config(&self) -> TimerConfig {
        self.read().timer_config(debug_enabled())
    }

    pub fn update(&self, settings: UserSettings) -> Result<()> {
        let mut guard = self.write();
        *guard = settings;
        self.persist(&guard)
    }

    pub fn reload(&self) -> Result<()> {
        let contents = fs::read_to_string(&self.path)?;
        let data: UserSettings = serde_json::from_str(&contents)?;
        *self.write() = data;
        Ok(())
    }

    fn persist(&self, data: &UserSettings) -> Result<()> {
        let serialized = serde_json::to_string_pretty(data)?;
        fs::write(&self.path, serialized)
            .with_context(|| format!("Failed to write settings to {}", self.path.display()))
    }

    fn read(&self) -> RwLockReadGuard<'_, UserSettings> {
        self.data.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, UserSettings> {
        self.data.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
