//! Pre-flight summary shown before a pass.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::SyncConfig;
use crate::event::{CalendarEvent, EventType};
use crate::sync::SyncPlan;

/// Counts describing what a pass would sync. Never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncSummary {
    pub total_events: usize,
    pub intakes_count: usize,
    /// Doctor, pharmacy and lab visits
    pub appointments_count: usize,
    pub renewals_count: usize,
    pub by_category: BTreeMap<EventType, usize>,
    /// Events starting before now
    pub history_count: usize,
    pub future_count: usize,
    pub period_start: Option<DateTime<Utc>>,
    pub period_end: Option<DateTime<Utc>>,
    /// Intake history kept, in days (0 when history is deleted)
    pub history_days: i64,
    /// Intake future synced, in days (0 when not synced)
    pub future_days: i64,
    /// Events already in the calendar, to be recreated
    pub already_synced: usize,
    pub to_create: usize,
    /// Synced events that would be removed
    pub to_delete: usize,
}

impl SyncSummary {
    pub fn build(events: &[CalendarEvent], config: &SyncConfig, now: DateTime<Utc>) -> Self {
        let mut by_category = BTreeMap::new();
        for event in events {
            *by_category.entry(event.event_type).or_insert(0) += 1;
        }
        let count = |category: EventType| by_category.get(&category).copied().unwrap_or(0);

        let intakes_count = count(EventType::Intake);
        let appointments_count = count(EventType::DoctorVisit)
            + count(EventType::PharmacyVisit)
            + count(EventType::LabVisit);
        let renewals_count = count(EventType::PrescriptionRenewal);

        let history_count = events.iter().filter(|e| e.start_date < now).count();

        let intakes = &config.intakes;
        let history_days = match intakes.history.period {
            Some(period) if intakes.history.keeps_history() => period.in_days(),
            _ => 0,
        };
        let future_days = match intakes.future.period {
            Some(period) if intakes.future.syncs_future() => period.in_days(),
            _ => 0,
        };

        let (to_create, already_synced, to_delete) =
            SyncPlan::new(events, &config.event_mapping).counts();

        SyncSummary {
            total_events: events.len(),
            intakes_count,
            appointments_count,
            renewals_count,
            history_count,
            future_count: events.len() - history_count,
            period_start: events.iter().map(|e| e.start_date).min(),
            period_end: events.iter().map(|e| e.start_date).max(),
            history_days,
            future_days,
            already_synced,
            to_create,
            to_delete,
            by_category,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.total_events == 0 && self.to_delete == 0
    }
}
