//! The persisted sync state: options, retention policy and id mapping.

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{MedSyncError, MedSyncResult};
use crate::event::EventType;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PeriodUnit {
    Days,
    Weeks,
    Months,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncPeriod {
    pub value: u32,
    pub unit: PeriodUnit,
}

impl SyncPeriod {
    pub fn days(value: u32) -> Self {
        SyncPeriod {
            value,
            unit: PeriodUnit::Days,
        }
    }

    /// Length in days; a month counts as 30 days.
    pub fn in_days(&self) -> i64 {
        let value = i64::from(self.value);
        match self.unit {
            PeriodUnit::Days => value,
            PeriodUnit::Weeks => value * 7,
            PeriodUnit::Months => value * 30,
        }
    }

    /// `None` when the period is too long to represent.
    pub fn duration(&self) -> Option<Duration> {
        Duration::try_days(self.in_days())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HistoryMode {
    KeepHistory,
    DeleteHistory,
}

/// What to do with past events. Without a period, history is unbounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryPolicy {
    pub mode: HistoryMode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub period: Option<SyncPeriod>,
}

impl HistoryPolicy {
    pub fn keeps_history(&self) -> bool {
        self.mode == HistoryMode::KeepHistory
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FutureMode {
    SyncFuture,
    DoNotSync,
}

/// What to do with upcoming events. Without a period, the future is unbounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FuturePolicy {
    pub mode: FutureMode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub period: Option<SyncPeriod>,
}

impl FuturePolicy {
    pub fn syncs_future(&self) -> bool {
        self.mode == FutureMode::SyncFuture
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IntakeSyncOptions {
    pub enabled: bool,
    pub history: HistoryPolicy,
    pub future: FuturePolicy,
}

impl Default for IntakeSyncOptions {
    fn default() -> Self {
        IntakeSyncOptions {
            enabled: true,
            history: HistoryPolicy {
                mode: HistoryMode::DeleteHistory,
                period: Some(SyncPeriod::days(7)),
            },
            future: FuturePolicy {
                mode: FutureMode::SyncFuture,
                period: Some(SyncPeriod::days(7)),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppointmentSyncOptions {
    pub enabled: bool,
    pub sync_doctor_visits: bool,
    pub sync_lab_visits: bool,
    pub sync_pharmacy_visits: bool,
    pub sync_prescription_renewals: bool,
    pub history: HistoryPolicy,
    pub future: FuturePolicy,
}

impl Default for AppointmentSyncOptions {
    fn default() -> Self {
        AppointmentSyncOptions {
            enabled: true,
            sync_doctor_visits: true,
            sync_lab_visits: false,
            sync_pharmacy_visits: true,
            sync_prescription_renewals: false,
            history: HistoryPolicy {
                mode: HistoryMode::DeleteHistory,
                period: Some(SyncPeriod::days(30)),
            },
            future: FuturePolicy {
                mode: FutureMode::SyncFuture,
                period: Some(SyncPeriod::days(90)),
            },
        }
    }
}

/// Everything that must survive a restart.
///
/// Scalars come before tables so the TOML form stays valid.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selected_calendar_id: Option<String>,
    /// Master switch for automatic passes
    pub sync_enabled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_sync_date: Option<DateTime<Utc>>,
    pub intakes: IntakeSyncOptions,
    pub appointments: AppointmentSyncOptions,
    /// domain event id -> native event id
    pub event_mapping: BTreeMap<String, String>,
}

impl SyncConfig {
    pub fn is_category_enabled(&self, category: EventType) -> bool {
        let appointments = &self.appointments;
        match category {
            EventType::Intake => self.intakes.enabled,
            EventType::DoctorVisit => appointments.enabled && appointments.sync_doctor_visits,
            EventType::PharmacyVisit => appointments.enabled && appointments.sync_pharmacy_visits,
            EventType::LabVisit => appointments.enabled && appointments.sync_lab_visits,
            EventType::PrescriptionRenewal => {
                appointments.enabled && appointments.sync_prescription_renewals
            }
        }
    }

    /// Toggle one category. Appointment categories also switch the
    /// appointment group on when enabled.
    pub fn set_category_enabled(&mut self, category: EventType, enabled: bool) {
        let appointments = &mut self.appointments;
        match category {
            EventType::Intake => self.intakes.enabled = enabled,
            EventType::DoctorVisit => appointments.sync_doctor_visits = enabled,
            EventType::PharmacyVisit => appointments.sync_pharmacy_visits = enabled,
            EventType::LabVisit => appointments.sync_lab_visits = enabled,
            EventType::PrescriptionRenewal => appointments.sync_prescription_renewals = enabled,
        }
        if enabled && category != EventType::Intake {
            appointments.enabled = true;
        }
    }

    /// Retention policies that apply to a category.
    pub fn policies_for(&self, category: EventType) -> (&HistoryPolicy, &FuturePolicy) {
        match category {
            EventType::Intake => (&self.intakes.history, &self.intakes.future),
            _ => (&self.appointments.history, &self.appointments.future),
        }
    }

    pub fn to_toml_string(&self) -> MedSyncResult<String> {
        toml::to_string_pretty(self).map_err(|e| MedSyncError::Serialization(e.to_string()))
    }

    /// Parse a stored blob, migrating the older flat layout when found.
    pub fn from_toml_str(content: &str) -> MedSyncResult<Self> {
        let table: toml::Table =
            toml::from_str(content).map_err(|e| MedSyncError::Config(e.to_string()))?;

        if table.contains_key("sync_intakes") {
            tracing::info!("Migrating sync config from the flat layout");
            let legacy: LegacySyncConfig =
                toml::from_str(content).map_err(|e| MedSyncError::Config(e.to_string()))?;
            return Ok(legacy.into());
        }

        toml::from_str(content).map_err(|e| MedSyncError::Config(e.to_string()))
    }
}

/// Flat layout used before per-group retention policies existed.
#[derive(Debug, Deserialize)]
struct LegacySyncConfig {
    selected_calendar_id: Option<String>,
    #[serde(default)]
    sync_enabled: bool,
    #[serde(default = "default_true")]
    sync_intakes: bool,
    #[serde(default = "default_true")]
    sync_doctor_visits: bool,
    #[serde(default = "default_true")]
    sync_pharmacy_visits: bool,
    #[serde(default)]
    sync_prescription_renewals: bool,
    last_sync_date: Option<DateTime<Utc>>,
    #[serde(default)]
    synced_events: BTreeMap<String, String>,
}

fn default_true() -> bool {
    true
}

impl From<LegacySyncConfig> for SyncConfig {
    fn from(legacy: LegacySyncConfig) -> Self {
        let defaults = SyncConfig::default();
        SyncConfig {
            selected_calendar_id: legacy.selected_calendar_id,
            sync_enabled: legacy.sync_enabled,
            last_sync_date: legacy.last_sync_date,
            intakes: IntakeSyncOptions {
                enabled: legacy.sync_intakes,
                ..defaults.intakes
            },
            appointments: AppointmentSyncOptions {
                sync_doctor_visits: legacy.sync_doctor_visits,
                sync_pharmacy_visits: legacy.sync_pharmacy_visits,
                sync_prescription_renewals: legacy.sync_prescription_renewals,
                ..defaults.appointments
            },
            event_mapping: legacy.synced_events,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_toml_roundtrip_keeps_full_mapping() {
        let mut config = SyncConfig {
            selected_calendar_id: Some("medsync".to_string()),
            sync_enabled: true,
            last_sync_date: Some(Utc.with_ymd_and_hms(2025, 11, 5, 10, 0, 0).unwrap()),
            ..Default::default()
        };
        for i in 0..250 {
            config
                .event_mapping
                .insert(format!("intake_{i}"), format!("native-{i}"));
        }
        config.appointments.history = HistoryPolicy {
            mode: HistoryMode::KeepHistory,
            period: Some(SyncPeriod {
                value: 2,
                unit: PeriodUnit::Weeks,
            }),
        };
        config.intakes.future.period = None;

        let content = config.to_toml_string().unwrap();
        let parsed = SyncConfig::from_toml_str(&content).unwrap();

        assert_eq!(parsed.event_mapping.len(), 250);
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_missing_fields_fall_back_to_defaults() {
        let parsed = SyncConfig::from_toml_str("selected_calendar_id = \"perso\"\n").unwrap();

        assert_eq!(parsed.selected_calendar_id.as_deref(), Some("perso"));
        assert!(!parsed.sync_enabled);
        assert_eq!(parsed.intakes, IntakeSyncOptions::default());
        assert!(parsed.event_mapping.is_empty());
    }

    #[test]
    fn test_legacy_layout_is_migrated() {
        let legacy = r#"
selected_calendar_id = "perso"
sync_enabled = true
sync_intakes = false
sync_doctor_visits = true
sync_pharmacy_visits = false
sync_prescription_renewals = false
last_sync_date = "2025-10-20T08:00:00Z"

[synced_events]
intake_1 = "n1"
pharmacy_2 = "n2"
"#;
        let config = SyncConfig::from_toml_str(legacy).unwrap();

        assert_eq!(config.selected_calendar_id.as_deref(), Some("perso"));
        assert!(config.sync_enabled);
        assert!(!config.intakes.enabled);
        assert!(!config.is_category_enabled(EventType::PharmacyVisit));
        assert!(config.is_category_enabled(EventType::DoctorVisit));
        assert_eq!(config.event_mapping.len(), 2);
        assert_eq!(config.event_mapping["pharmacy_2"], "n2");
        assert!(config.last_sync_date.is_some());
    }

    #[test]
    fn test_category_toggles() {
        let mut config = SyncConfig::default();
        assert!(!config.is_category_enabled(EventType::LabVisit));

        config.appointments.enabled = false;
        config.set_category_enabled(EventType::LabVisit, true);
        assert!(config.is_category_enabled(EventType::LabVisit));
        assert!(config.is_category_enabled(EventType::DoctorVisit));

        config.set_category_enabled(EventType::Intake, false);
        assert!(!config.is_category_enabled(EventType::Intake));
    }

    #[test]
    fn test_period_lengths() {
        assert_eq!(SyncPeriod::days(5).in_days(), 5);
        let weeks = SyncPeriod {
            value: 3,
            unit: PeriodUnit::Weeks,
        };
        assert_eq!(weeks.in_days(), 21);
        let months = SyncPeriod {
            value: 2,
            unit: PeriodUnit::Months,
        };
        assert_eq!(months.in_days(), 60);
    }
}
