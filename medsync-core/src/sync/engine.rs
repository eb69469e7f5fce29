//! The sync engine: owns the collaborators and runs passes.

use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use crate::clock::{CanonicalClock, default_anchor};
use crate::config::{ConfigStore, SyncConfig};
use crate::domain::DomainEventProvider;
use crate::error::MedSyncResult;
use crate::event::CalendarEvent;
use crate::loader::DomainEventLoader;
use crate::native::{NativeCalendar, NativeCalendarAdapter, NativeCalendarStore};
use crate::permission::PermissionState;
use crate::sync::{ClearResult, Reconciliation, SyncResult, SyncSummary, reconcile};

pub const ERR_NO_CALENDAR: &str = "Aucun calendrier sélectionné";
pub const ERR_PERMISSION: &str = "Permission calendrier non accordée";
pub const ERR_IN_PROGRESS: &str = "Synchronisation déjà en cours";
pub const ERR_CONFIG_LOAD: &str = "Échec chargement configuration";

pub struct SyncEngine<P, S, C> {
    provider: P,
    adapter: NativeCalendarAdapter<S>,
    config_store: C,
    clock: CanonicalClock,
    anchor: DateTime<Utc>,
    /// Held for the whole of a pass. Option changes wait on it.
    pass_lock: Mutex<()>,
}

impl<P, S, C> SyncEngine<P, S, C>
where
    P: DomainEventProvider,
    S: NativeCalendarStore,
    C: ConfigStore,
{
    pub fn new(provider: P, store: S, config_store: C, clock: CanonicalClock) -> Self {
        SyncEngine {
            provider,
            adapter: NativeCalendarAdapter::new(store),
            config_store,
            clock,
            anchor: default_anchor(),
            pass_lock: Mutex::new(()),
        }
    }

    pub fn with_anchor(mut self, anchor: DateTime<Utc>) -> Self {
        self.anchor = anchor;
        self
    }

    pub fn adapter(&self) -> &NativeCalendarAdapter<S> {
        &self.adapter
    }

    pub fn clock(&self) -> &CanonicalClock {
        &self.clock
    }

    /// Current config, for display. Saved with defaults on first use; a
    /// config that cannot be read shows as defaults.
    pub fn config(&self) -> SyncConfig {
        self.load_config().unwrap_or_else(|e| {
            error!("Could not load sync config, showing defaults: {e}");
            SyncConfig::default()
        })
    }

    /// Stored config, or defaults (saved) on first use. Errors when the
    /// store cannot be read; callers that save must not fall back.
    pub fn load_config(&self) -> MedSyncResult<SyncConfig> {
        if let Some(config) = self.config_store.load()? {
            return Ok(config);
        }

        let config = SyncConfig::default();
        if let Err(e) = self.config_store.save(&config) {
            warn!("Could not save default sync config: {e}");
        }
        Ok(config)
    }

    /// Change options. Waits for an in-flight pass to finish first. Fails,
    /// leaving the store untouched, when the stored config cannot be read.
    pub async fn update_config(
        &self,
        update: impl FnOnce(&mut SyncConfig),
    ) -> MedSyncResult<SyncConfig> {
        let _guard = self.pass_lock.lock().await;

        let mut config = self.load_config()?;
        update(&mut config);
        self.config_store.save(&config)?;

        debug!("Sync config updated");
        Ok(config)
    }

    /// Restore default options. The mapping is kept so synced events can
    /// still be pruned or cleared.
    pub async fn reset_config(&self) -> MedSyncResult<SyncConfig> {
        self.update_config(|config| {
            let event_mapping = std::mem::take(&mut config.event_mapping);
            *config = SyncConfig {
                event_mapping,
                ..Default::default()
            };
        })
        .await
    }

    pub async fn list_calendars(&self) -> Vec<NativeCalendar> {
        self.adapter.list_calendars().await
    }

    pub async fn check_permission(&self) -> PermissionState {
        self.adapter.check_permission().await
    }

    pub async fn request_permission(&self) -> bool {
        self.adapter.request_permission().await
    }

    pub async fn load_events(&self, config: &SyncConfig) -> MedSyncResult<Vec<CalendarEvent>> {
        DomainEventLoader::new(&self.provider, &self.clock, self.anchor)
            .load(config)
            .await
    }

    /// What a pass would do right now.
    pub async fn summary(&self) -> MedSyncResult<SyncSummary> {
        let config = self.load_config()?;
        let events = self.load_events(&config).await?;
        Ok(SyncSummary::build(&events, &config, self.clock.now()))
    }

    /// Run one pass, whether or not automatic sync is enabled.
    ///
    /// Returns early, without touching the calendar, when another pass is
    /// running, no calendar is selected, access is not granted or the
    /// domain events cannot be loaded.
    pub async fn sync(&self) -> SyncResult {
        let Ok(_guard) = self.pass_lock.try_lock() else {
            warn!("Sync requested while a pass is running");
            return SyncResult::failure(ERR_IN_PROGRESS);
        };

        let mut config = match self.load_config() {
            Ok(config) => config,
            Err(e) => {
                error!("Could not load sync config: {e}");
                return SyncResult::failure(format!("{ERR_CONFIG_LOAD}: {e}"));
            }
        };

        let Some(calendar_id) = config.selected_calendar_id.clone() else {
            warn!("No calendar selected");
            return SyncResult::failure(ERR_NO_CALENDAR);
        };

        if !self.adapter.check_permission().await.granted {
            warn!("Calendar permission not granted");
            return SyncResult::failure(ERR_PERMISSION);
        }

        let events = match self.load_events(&config).await {
            Ok(events) => events,
            Err(e) => {
                return SyncResult::failure(format!("Échec chargement des événements: {e}"));
            }
        };

        info!("Syncing {} events to {calendar_id}", events.len());

        let Reconciliation {
            mapping,
            mut result,
        } = reconcile(&self.adapter, &calendar_id, &events, &config.event_mapping).await;

        config.event_mapping = mapping;
        config.last_sync_date = Some(self.clock.now());
        if let Err(e) = self.config_store.save(&config) {
            error!("Could not save sync config: {e}");
            result.push_error(format!("Échec sauvegarde configuration: {e}"));
        }

        info!(
            created = result.events_created,
            updated = result.events_updated,
            deleted = result.events_deleted,
            errors = result.errors.len(),
            "Sync pass finished"
        );
        result
    }

    /// Run a pass only if automatic sync is enabled. An unreadable config
    /// is reported rather than read as "disabled".
    pub async fn sync_if_enabled(&self) -> Option<SyncResult> {
        let enabled = match self.load_config() {
            Ok(config) => config.sync_enabled,
            Err(e) => return Some(SyncResult::failure(format!("{ERR_CONFIG_LOAD}: {e}"))),
        };
        if !enabled {
            debug!("Automatic sync disabled");
            return None;
        }
        Some(self.sync().await)
    }

    /// Delete every synced event and forget the mapping.
    ///
    /// The mapping is emptied even when some deletes fail; those failures
    /// are reported in the result.
    pub async fn clear_synced_events(&self) -> ClearResult {
        let _guard = self.pass_lock.lock().await;

        if !self.adapter.check_permission().await.granted {
            return ClearResult::failure(ERR_PERMISSION);
        }

        let mut config = match self.load_config() {
            Ok(config) => config,
            Err(e) => {
                error!("Could not load sync config: {e}");
                return ClearResult::failure(format!("{ERR_CONFIG_LOAD}: {e}"));
            }
        };
        let mapping = std::mem::take(&mut config.event_mapping);
        info!("Clearing {} synced events", mapping.len());

        let mut deleted_count = 0;
        let mut errors = Vec::new();
        for (event_id, native_id) in &mapping {
            if self.adapter.delete_event(native_id).await {
                deleted_count += 1;
            } else {
                errors.push(format!("Échec suppression: {event_id}"));
            }
        }

        if let Err(e) = self.config_store.save(&config) {
            error!("Could not save sync config: {e}");
            errors.push(format!("Échec sauvegarde configuration: {e}"));
        }

        info!("Cleared {deleted_count}/{} events", mapping.len());
        ClearResult {
            success: errors.is_empty(),
            deleted_count,
            errors,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::{FixedClock, parse_timezone};
    use crate::config::MemoryConfigStore;
    use crate::domain::{DomainRow, IntakeRow, IntakeRowStatus, MemoryProvider};
    use crate::event::EventType;
    use crate::native::{MemoryCalendarStore, NativeEventRequest, StoreCall};
    use crate::permission::ScopeStatus;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 11, 5, 10, 0, 0).unwrap()
    }

    fn clock() -> CanonicalClock {
        CanonicalClock::new(FixedClock(now()), parse_timezone("Europe/Paris").unwrap())
    }

    fn intake(id: &str) -> DomainRow {
        DomainRow::Intake(IntakeRow {
            id: id.to_string(),
            scheduled_time: Utc.with_ymd_and_hms(2025, 11, 6, 8, 0, 0).unwrap(),
            taken_at: None,
            status: IntakeRowStatus::Pending,
            medication_name: Some("Doliprane".to_string()),
            treatment_name: None,
            dosage: None,
        })
    }

    fn selected() -> SyncConfig {
        SyncConfig {
            selected_calendar_id: Some("medsync".to_string()),
            ..Default::default()
        }
    }

    type TestEngine = SyncEngine<MemoryProvider, MemoryCalendarStore, MemoryConfigStore>;

    fn engine(
        provider: MemoryProvider,
        store: MemoryCalendarStore,
        config: SyncConfig,
    ) -> TestEngine {
        let config_store = MemoryConfigStore::with_config(&config).unwrap();
        SyncEngine::new(provider, store, config_store, clock())
    }

    #[tokio::test]
    async fn test_first_use_saves_defaults() {
        let engine = SyncEngine::new(
            MemoryProvider::default(),
            MemoryCalendarStore::new(),
            MemoryConfigStore::new(),
            clock(),
        );

        assert_eq!(engine.config(), SyncConfig::default());
        assert!(engine.config_store.load().unwrap().is_some());
    }

    #[tokio::test]
    async fn test_no_calendar_selected() {
        let engine = engine(
            MemoryProvider::new(vec![intake("a")]),
            MemoryCalendarStore::new(),
            SyncConfig::default(),
        );

        let result = engine.sync().await;

        assert_eq!(result.errors, vec![ERR_NO_CALENDAR]);
        assert!(engine.adapter().store().calls().is_empty());
    }

    #[tokio::test]
    async fn test_load_failure_leaves_calendar_untouched() {
        crate::logging::init_test();
        let mut config = selected();
        config
            .event_mapping
            .insert("pharmacy_1".to_string(), "n1".to_string());
        let provider = MemoryProvider::new(vec![intake("a")]).fail_on(EventType::PharmacyVisit);
        let engine = engine(provider, MemoryCalendarStore::new(), config.clone());

        let result = engine.sync().await;

        assert!(!result.success);
        assert_eq!(result.errors.len(), 1);
        assert!(result.errors[0].starts_with("Échec chargement des événements"));
        assert!(engine.adapter().store().mutations().is_empty());
        assert_eq!(engine.config().event_mapping, config.event_mapping);
    }

    #[tokio::test]
    async fn test_pass_records_last_sync_date() {
        let engine = engine(
            MemoryProvider::new(vec![intake("a")]),
            MemoryCalendarStore::new(),
            selected(),
        );

        let result = engine.sync().await;
        assert!(result.success);
        assert_eq!(result.events_created, 1);

        let config = engine.config();
        assert_eq!(config.last_sync_date, Some(now()));
        assert_eq!(config.event_mapping["intake_a"], "native-1");
    }

    #[tokio::test]
    async fn test_sync_if_enabled_respects_master_flag() {
        let engine = engine(
            MemoryProvider::new(vec![intake("a")]),
            MemoryCalendarStore::new(),
            selected(),
        );
        assert!(engine.sync_if_enabled().await.is_none());

        engine
            .update_config(|config| config.sync_enabled = true)
            .await
            .unwrap();
        let result = engine.sync_if_enabled().await.unwrap();
        assert_eq!(result.events_created, 1);
    }

    #[tokio::test]
    async fn test_reset_keeps_mapping() {
        let mut config = selected();
        config.sync_enabled = true;
        config
            .event_mapping
            .insert("intake_a".to_string(), "n1".to_string());
        let engine = engine(MemoryProvider::default(), MemoryCalendarStore::new(), config);

        let reset = engine.reset_config().await.unwrap();

        assert_eq!(reset.selected_calendar_id, None);
        assert!(!reset.sync_enabled);
        assert_eq!(reset.event_mapping.len(), 1);
    }

    #[tokio::test]
    async fn test_clear_empties_mapping_and_reports_failures() {
        let seed = NativeEventRequest {
            title: "seed".to_string(),
            description: String::new(),
            start: now(),
            end: now(),
            calendar_id: "medsync".to_string(),
            location: None,
            color: None,
            alerts: vec![],
        };
        let store = MemoryCalendarStore::new().with_event("n1", seed);
        let mut config = selected();
        config.event_mapping.insert("intake_a".to_string(), "n1".to_string());
        config.event_mapping.insert("intake_b".to_string(), "gone".to_string());
        let engine = engine(MemoryProvider::default(), store, config);

        let cleared = engine.clear_synced_events().await;

        assert_eq!(cleared.deleted_count, 1);
        assert_eq!(cleared.errors, vec!["Échec suppression: intake_b"]);
        assert!(!cleared.success);
        assert!(engine.config().event_mapping.is_empty());
        assert!(engine.adapter().store().events().is_empty());
    }

    #[tokio::test]
    async fn test_clear_requires_permission() {
        let store =
            MemoryCalendarStore::new().with_permission(ScopeStatus::Denied, ScopeStatus::Denied);
        let mut config = selected();
        config.event_mapping.insert("intake_a".to_string(), "n1".to_string());
        let engine = engine(MemoryProvider::default(), store, config);

        let cleared = engine.clear_synced_events().await;

        assert_eq!(cleared.errors, vec![ERR_PERMISSION]);
        assert!(
            !engine
                .adapter()
                .store()
                .calls()
                .iter()
                .any(|call| matches!(call, StoreCall::Delete(_)))
        );
        assert_eq!(engine.config().event_mapping.len(), 1);
    }

    const UNREADABLE: &str = r#"
selected_calendar_id = "medsync"

[intakes.history]
mode = "keep_history"
period = { value = 2, unit = "month" }

[event_mapping]
intake_a = "n1"
intake_b = "n2"
"#;

    fn unreadable_engine() -> TestEngine {
        crate::logging::init_test();
        SyncEngine::new(
            MemoryProvider::new(vec![intake("a")]),
            MemoryCalendarStore::new(),
            MemoryConfigStore::with_blob(UNREADABLE),
            clock(),
        )
    }

    #[tokio::test]
    async fn test_unreadable_config_is_never_overwritten() {
        let engine = unreadable_engine();

        assert!(
            engine
                .update_config(|config| config.sync_enabled = true)
                .await
                .is_err()
        );
        assert!(engine.reset_config().await.is_err());
        let cleared = engine.clear_synced_events().await;
        assert!(!cleared.success);
        assert!(cleared.errors[0].starts_with(ERR_CONFIG_LOAD));

        // Still the original blob, mapping included
        assert!(engine.config_store.load().is_err());
        assert!(engine.adapter().store().mutations().is_empty());
    }

    #[tokio::test]
    async fn test_unreadable_config_aborts_pass() {
        let engine = unreadable_engine();

        let result = engine.sync().await;

        assert!(!result.success);
        assert_eq!(result.errors.len(), 1);
        assert!(result.errors[0].starts_with(ERR_CONFIG_LOAD));
        assert!(engine.adapter().store().calls().is_empty());
        assert!(engine.config_store.load().is_err());

        let scheduled = engine.sync_if_enabled().await.unwrap();
        assert!(scheduled.errors[0].starts_with(ERR_CONFIG_LOAD));
    }
}
