//! Loads the calendar events a pass should converge to.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use tracing::{debug, error, warn};

use crate::clock::CanonicalClock;
use crate::config::SyncConfig;
use crate::date_range::DateRange;
use crate::domain::DomainEventProvider;
use crate::error::MedSyncResult;
use crate::event::{CalendarEvent, EventType};
use crate::mapper::map_row;

/// Queries the domain provider for every enabled category and maps the
/// rows into calendar events.
///
/// An event is kept when all of these hold:
/// - it starts at or after the anchor, or at or after now;
/// - it falls inside its group's retention window;
/// - it does not start today in the canonical timezone. Today's facts can
///   still change in the app, so they are never synced.
pub struct DomainEventLoader<'a, P> {
    provider: &'a P,
    clock: &'a CanonicalClock,
    anchor: DateTime<Utc>,
}

impl<'a, P: DomainEventProvider> DomainEventLoader<'a, P> {
    pub fn new(provider: &'a P, clock: &'a CanonicalClock, anchor: DateTime<Utc>) -> Self {
        DomainEventLoader {
            provider,
            clock,
            anchor,
        }
    }

    /// Load events for all enabled categories, in category order, then by
    /// start and id. Fails if any enabled category fails to load.
    pub async fn load(&self, config: &SyncConfig) -> MedSyncResult<Vec<CalendarEvent>> {
        let now = self.clock.now();

        let (intakes, doctor, pharmacy, lab, renewals) = tokio::join!(
            self.load_category(EventType::Intake, config, now),
            self.load_category(EventType::DoctorVisit, config, now),
            self.load_category(EventType::PharmacyVisit, config, now),
            self.load_category(EventType::LabVisit, config, now),
            self.load_category(EventType::PrescriptionRenewal, config, now),
        );

        let mut seen = HashSet::new();
        let mut events = Vec::new();
        for batch in [intakes, doctor, pharmacy, lab, renewals] {
            for event in batch? {
                if !seen.insert(event.id.clone()) {
                    warn!("Dropping duplicate event id {}", event.id);
                    continue;
                }
                events.push(event);
            }
        }

        debug!("Loaded {} events", events.len());
        Ok(events)
    }

    async fn load_category(
        &self,
        category: EventType,
        config: &SyncConfig,
        now: DateTime<Utc>,
    ) -> MedSyncResult<Vec<CalendarEvent>> {
        if !config.is_category_enabled(category) {
            return Ok(vec![]);
        }

        let (history, future) = config.policies_for(category);
        let Some(range) = DateRange::from_policies(history, future, now) else {
            debug!("{category}: retention keeps nothing, skipping");
            return Ok(vec![]);
        };

        let rows = self
            .provider
            .fetch(category, self.anchor)
            .await
            .inspect_err(|e| error!("Failed to load {category} rows: {e}"))?;

        let mut events: Vec<CalendarEvent> = rows
            .iter()
            .filter_map(|row| map_row(row, now))
            .filter(|event| self.keeps(event, &range, now))
            .collect();
        events.sort_by(|a, b| (a.start_date, &a.id).cmp(&(b.start_date, &b.id)));

        debug!("{category}: {} rows, {} events kept", rows.len(), events.len());
        Ok(events)
    }

    fn keeps(&self, event: &CalendarEvent, range: &DateRange, now: DateTime<Utc>) -> bool {
        let start = event.start_date;
        (start >= self.anchor || start >= now)
            && range.contains(start)
            && !self.clock.is_today(start)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::{FixedClock, parse_timezone};
    use crate::config::{FutureMode, FuturePolicy, HistoryMode, HistoryPolicy};
    use crate::domain::{
        DoctorVisitRow, DomainRow, IntakeRow, IntakeRowStatus, MemoryProvider, PharmacyVisitRow,
    };
    use chrono::{NaiveDate, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 11, 5, 10, 0, 0).unwrap()
    }

    fn anchor() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 10, 13, 0, 0, 0).unwrap()
    }

    fn clock() -> CanonicalClock {
        CanonicalClock::new(FixedClock(now()), parse_timezone("Europe/Paris").unwrap())
    }

    fn intake(id: &str, scheduled: DateTime<Utc>) -> DomainRow {
        DomainRow::Intake(IntakeRow {
            id: id.to_string(),
            scheduled_time: scheduled,
            taken_at: None,
            status: IntakeRowStatus::Pending,
            medication_name: Some("Doliprane".to_string()),
            treatment_name: None,
            dosage: None,
        })
    }

    fn pharmacy(id: &str, date: NaiveDate) -> DomainRow {
        DomainRow::PharmacyVisit(PharmacyVisitRow {
            id: id.to_string(),
            visit_date: date,
            visit_number: 1,
            pharmacy_name: None,
            pharmacy_address: None,
            treatment_name: None,
        })
    }

    fn ids(events: &[CalendarEvent]) -> Vec<&str> {
        events.iter().map(|e| e.id.as_str()).collect()
    }

    #[tokio::test]
    async fn test_default_config_window() {
        let provider = MemoryProvider::new(vec![
            intake("tomorrow", Utc.with_ymd_and_hms(2025, 11, 6, 8, 0, 0).unwrap()),
            intake("later_today", Utc.with_ymd_and_hms(2025, 11, 5, 18, 0, 0).unwrap()),
            intake("yesterday", Utc.with_ymd_and_hms(2025, 11, 4, 8, 0, 0).unwrap()),
            intake("far", Utc.with_ymd_and_hms(2025, 11, 20, 8, 0, 0).unwrap()),
            pharmacy("p1", NaiveDate::from_ymd_opt(2025, 11, 20).unwrap()),
            DomainRow::DoctorVisit(DoctorVisitRow {
                id: "t1".to_string(),
                treatment_name: "Antibiotiques".to_string(),
                pathology: None,
                end_date: Some(NaiveDate::from_ymd_opt(2025, 11, 5).unwrap()),
                doctor_name: None,
            }),
        ]);
        let clock = clock();
        let loader = DomainEventLoader::new(&provider, &clock, anchor());

        let events = loader.load(&SyncConfig::default()).await.unwrap();

        // Doctor visit lands today and is dropped with the intake of today
        assert_eq!(ids(&events), vec!["intake_tomorrow", "pharmacy_p1"]);
    }

    #[tokio::test]
    async fn test_today_is_excluded_even_with_unbounded_retention() {
        let mut config = SyncConfig::default();
        config.intakes.history = HistoryPolicy {
            mode: HistoryMode::KeepHistory,
            period: None,
        };
        config.intakes.future = FuturePolicy {
            mode: FutureMode::SyncFuture,
            period: None,
        };

        let provider = MemoryProvider::new(vec![
            // 00:30 Nov 5 in Paris
            intake("paris_today", Utc.with_ymd_and_hms(2025, 11, 4, 23, 30, 0).unwrap()),
            // 23:30 Nov 4 in Paris
            intake("paris_yesterday", Utc.with_ymd_and_hms(2025, 11, 4, 22, 30, 0).unwrap()),
            intake("before_anchor", Utc.with_ymd_and_hms(2025, 10, 1, 8, 0, 0).unwrap()),
        ]);
        let clock = clock();
        let loader = DomainEventLoader::new(&provider, &clock, anchor());

        let events = loader.load(&config).await.unwrap();
        assert_eq!(ids(&events), vec!["intake_paris_yesterday"]);
    }

    #[tokio::test]
    async fn test_disabled_categories_are_not_loaded() {
        let mut config = SyncConfig::default();
        config.set_category_enabled(EventType::Intake, false);

        // A failing provider for a disabled category must not matter
        let provider = MemoryProvider::new(vec![pharmacy(
            "p1",
            NaiveDate::from_ymd_opt(2025, 11, 20).unwrap(),
        )])
        .fail_on(EventType::Intake)
        .fail_on(EventType::LabVisit);
        let clock = clock();
        let loader = DomainEventLoader::new(&provider, &clock, anchor());

        let events = loader.load(&config).await.unwrap();
        assert_eq!(ids(&events), vec!["pharmacy_p1"]);
    }

    #[tokio::test]
    async fn test_provider_failure_fails_the_load() {
        let provider = MemoryProvider::new(vec![]).fail_on(EventType::PharmacyVisit);
        let clock = clock();
        let loader = DomainEventLoader::new(&provider, &clock, anchor());

        assert!(loader.load(&SyncConfig::default()).await.is_err());
    }

    #[tokio::test]
    async fn test_sorted_by_start_and_deduplicated() {
        let provider = MemoryProvider::new(vec![
            intake("b", Utc.with_ymd_and_hms(2025, 11, 7, 8, 0, 0).unwrap()),
            intake("a", Utc.with_ymd_and_hms(2025, 11, 7, 8, 0, 0).unwrap()),
            intake("c", Utc.with_ymd_and_hms(2025, 11, 6, 8, 0, 0).unwrap()),
            intake("a", Utc.with_ymd_and_hms(2025, 11, 8, 8, 0, 0).unwrap()),
        ]);
        let clock = clock();
        let loader = DomainEventLoader::new(&provider, &clock, anchor());

        let events = loader.load(&SyncConfig::default()).await.unwrap();
        assert_eq!(ids(&events), vec!["intake_c", "intake_a", "intake_b"]);
        assert_eq!(
            events[1].start_date,
            Utc.with_ymd_and_hms(2025, 11, 7, 8, 0, 0).unwrap()
        );
    }
}
