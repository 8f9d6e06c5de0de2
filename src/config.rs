//! Persistent settings stored as JSON on disk.
//!
//! Reading never fails: a missing or corrupt file falls back to defaults
//! (blacklist mode, schedule disabled, empty grids).

use crate::executor::Elevation;
use crate::schedule::{Mode, ScheduleConfig, WeeklySchedule};
use crate::AppError;
use serde::{Deserialize, Deserializer, Serialize};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Settings {
    pub schedule: ScheduleConfig,
    pub blocked_sites: Vec<String>,
    pub elevation: Elevation,
}

/// On-disk shape of `settings.json`.
#[derive(Serialize, Deserialize, Default)]
struct StoredSettings {
    #[serde(default)]
    mode: Mode,
    #[serde(default)]
    schedule_enabled: bool,
    #[serde(default)]
    schedule_data: ScheduleData,
    #[serde(default)]
    blocked_sites: Vec<String>,
    #[serde(default, deserialize_with = "lenient_elevation")]
    elevation: Elevation,
}

/// An unknown helper name must not discard the rest of the document.
fn lenient_elevation<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Elevation, D::Error> {
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(Elevation::deserialize(&value).unwrap_or_else(|e| {
        log::warn!("Ignoring elevation {value}: {e}; using sudo");
        Elevation::default()
    }))
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum ScheduleData {
    PerMode(PerModeGrids),
    /// Older files hold one flat grid; it belongs to the active mode.
    Flat(WeeklySchedule),
}

#[derive(Serialize, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct PerModeGrids {
    #[serde(default)]
    blacklist: WeeklySchedule,
    #[serde(default)]
    whitelist: WeeklySchedule,
}

impl Default for ScheduleData {
    fn default() -> Self {
        Self::PerMode(PerModeGrids::default())
    }
}

impl From<StoredSettings> for Settings {
    fn from(stored: StoredSettings) -> Self {
        let (blacklist, whitelist) = match stored.schedule_data {
            ScheduleData::PerMode(grids) => (grids.blacklist, grids.whitelist),
            ScheduleData::Flat(grid) => match stored.mode {
                Mode::Blacklist => (grid, WeeklySchedule::default()),
                Mode::Whitelist => (WeeklySchedule::default(), grid),
            },
        };
        Settings {
            schedule: ScheduleConfig {
                enabled: stored.schedule_enabled,
                mode: stored.mode,
                blacklist,
                whitelist,
            },
            blocked_sites: stored.blocked_sites,
            elevation: stored.elevation,
        }
    }
}

impl From<&Settings> for StoredSettings {
    fn from(settings: &Settings) -> Self {
        StoredSettings {
            mode: settings.schedule.mode,
            schedule_enabled: settings.schedule.enabled,
            schedule_data: ScheduleData::PerMode(PerModeGrids {
                blacklist: settings.schedule.blacklist.clone(),
                whitelist: settings.schedule.whitelist.clone(),
            }),
            blocked_sites: settings.blocked_sites.clone(),
            elevation: settings.elevation,
        }
    }
}

/// Parse a settings document.
pub fn parse(data: &str) -> Result<Settings, AppError> {
    let stored: StoredSettings = serde_json::from_str(data)
        .map_err(|e| AppError::Config(format!("Invalid settings: {e}")))?;
    Ok(stored.into())
}

/// Load settings from disk, returning defaults if the file is missing or unusable.
pub fn load(path: &Path) -> Settings {
    if !path.exists() {
        log::debug!("No settings at {}, using defaults", path.display());
        return Settings::default();
    }
    match fs::read_to_string(path)
        .map_err(AppError::from)
        .and_then(|data| parse(&data))
    {
        Ok(settings) => settings,
        Err(e) => {
            log::warn!("Cannot load {}: {e}; using defaults", path.display());
            Settings::default()
        }
    }
}

/// Persist settings to disk, creating the parent directory if needed.
pub fn save(path: &Path, settings: &Settings) -> Result<(), AppError> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir)?;
    }
    let data = serde_json::to_string_pretty(&StoredSettings::from(settings))?;
    fs::write(path, data)?;
    Ok(())
}

/// Modification time, used to notice edits made by another process.
pub fn modified(path: &Path) -> Option<std::time::SystemTime> {
    fs::metadata(path).and_then(|m| m.modified()).ok()
}
