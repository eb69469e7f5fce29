//! Process-level settings at ~/.config/medsync/config.toml.
//!
//! Every key can be overridden with a `MEDSYNC_`-prefixed environment
//! variable, e.g. `MEDSYNC_CALENDAR_DIR`.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use crate::clock::{CanonicalClock, SystemClock, parse_anchor, parse_timezone};
use crate::constants::{DEFAULT_ANCHOR_DATE, DEFAULT_TIMEZONE, SYNC_STATE_FILE};
use crate::error::{MedSyncError, MedSyncResult};

static DEFAULT_CALENDAR_DIR: &str = "~/calendar";
static DOMAIN_EXPORT_FILE: &str = "export.json";

fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .map(|dir| dir.join("medsync"))
        .unwrap_or_else(|| PathBuf::from("~/.medsync"))
}

fn default_calendar_dir() -> PathBuf {
    PathBuf::from(DEFAULT_CALENDAR_DIR)
}

fn default_timezone() -> String {
    DEFAULT_TIMEZONE.to_string()
}

fn default_anchor_date() -> String {
    DEFAULT_ANCHOR_DATE.to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Where the sync state lives
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Root of the .ics calendar store
    #[serde(default = "default_calendar_dir")]
    pub calendar_dir: PathBuf,

    /// JSON export of the app's domain rows. Defaults to export.json in data_dir.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain_export: Option<PathBuf>,

    #[serde(default = "default_timezone")]
    pub timezone: String,

    #[serde(default = "default_anchor_date")]
    pub anchor_date: String,
}

impl Settings {
    pub fn config_path() -> MedSyncResult<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| MedSyncError::Config("Could not determine config directory".into()))?
            .join("medsync");

        Ok(config_dir.join("config.toml"))
    }

    pub fn load() -> MedSyncResult<Self> {
        Self::load_from(&Self::config_path()?)
    }

    /// Load from `path`, writing a commented default file first if missing.
    pub fn load_from(path: &Path) -> MedSyncResult<Self> {
        if !path.exists() {
            Self::create_default_config(path)?;
        }

        Config::builder()
            .add_source(File::from(path).required(false))
            .add_source(Environment::with_prefix("MEDSYNC"))
            .build()
            .map_err(|e| MedSyncError::Config(e.to_string()))?
            .try_deserialize()
            .map_err(|e| MedSyncError::Config(e.to_string()))
    }

    /// Create a default config file with all options commented out.
    pub fn create_default_config(path: &Path) -> MedSyncResult<()> {
        let contents = format!(
            "\
# medsync configuration

# Where the sync state is kept:
# data_dir = \"~/.local/share/medsync\"

# Calendar store (one subdirectory per calendar):
# calendar_dir = \"{DEFAULT_CALENDAR_DIR}\"

# JSON export of intakes, visits and prescriptions:
# domain_export = \"~/medsync/export.json\"

# Timezone used to decide what \"today\" is:
# timezone = \"{DEFAULT_TIMEZONE}\"

# Nothing dated before this day is synced:
# anchor_date = \"{DEFAULT_ANCHOR_DATE}\"
"
        );

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                MedSyncError::Config(format!("Could not create config directory: {e}"))
            })?;
        }

        std::fs::write(path, contents)
            .map_err(|e| MedSyncError::Config(format!("Could not write config file: {e}")))?;

        Ok(())
    }

    pub fn data_path(&self) -> PathBuf {
        expand(&self.data_dir)
    }

    pub fn sync_state_path(&self) -> PathBuf {
        self.data_path().join(SYNC_STATE_FILE)
    }

    pub fn calendar_path(&self) -> PathBuf {
        expand(&self.calendar_dir)
    }

    pub fn domain_export_path(&self) -> PathBuf {
        match &self.domain_export {
            Some(path) => expand(path),
            None => self.data_path().join(DOMAIN_EXPORT_FILE),
        }
    }

    pub fn timezone(&self) -> MedSyncResult<Tz> {
        parse_timezone(&self.timezone)
    }

    pub fn anchor(&self) -> MedSyncResult<DateTime<Utc>> {
        parse_anchor(&self.anchor_date)
    }

    pub fn clock(&self) -> MedSyncResult<CanonicalClock> {
        Ok(CanonicalClock::new(SystemClock, self.timezone()?))
    }
}

fn expand(path: &Path) -> PathBuf {
    PathBuf::from(shellexpand::tilde(&path.to_string_lossy()).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_is_created_with_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("medsync/config.toml");

        let settings = Settings::load_from(&path).unwrap();

        assert!(path.exists());
        assert_eq!(settings.timezone, DEFAULT_TIMEZONE);
        assert_eq!(settings.calendar_dir, PathBuf::from(DEFAULT_CALENDAR_DIR));
        assert!(!settings.calendar_path().starts_with("~"));
        assert_eq!(
            settings.domain_export_path(),
            settings.data_path().join("export.json")
        );
    }

    #[test]
    fn test_values_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            format!(
                "data_dir = \"{}\"\ntimezone = \"America/Montreal\"\nanchor_date = \"2025-01-01\"\n",
                dir.path().display()
            ),
        )
        .unwrap();

        let settings = Settings::load_from(&path).unwrap();

        assert_eq!(settings.sync_state_path(), dir.path().join("sync.toml"));
        assert_eq!(settings.timezone().unwrap(), chrono_tz::America::Montreal);
        assert_eq!(
            settings.anchor().unwrap().to_rfc3339(),
            "2025-01-01T00:00:00+00:00"
        );
    }

    #[test]
    fn test_bad_timezone_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "timezone = \"Mars/Olympus\"\n").unwrap();

        let settings = Settings::load_from(&path).unwrap();
        assert!(settings.clock().is_err());
    }
}
