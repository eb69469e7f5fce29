//! What a pass will do, before it does it.

use std::collections::{BTreeMap, HashSet};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::event::CalendarEvent;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OpKind {
    Create,
    /// Delete the mapped native event, then create it again
    Recreate,
    /// Delete a mapped native event whose domain fact is gone
    Prune,
}

impl fmt::Display for OpKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OpKind::Create => write!(f, "+"),
            OpKind::Recreate => write!(f, "~"),
            OpKind::Prune => write!(f, "-"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SyncOp<'a> {
    Create(&'a CalendarEvent),
    Recreate {
        event: &'a CalendarEvent,
        native_id: &'a str,
    },
    Prune {
        event_id: &'a str,
        native_id: &'a str,
    },
}

impl SyncOp<'_> {
    pub fn kind(&self) -> OpKind {
        match self {
            SyncOp::Create(_) => OpKind::Create,
            SyncOp::Recreate { .. } => OpKind::Recreate,
            SyncOp::Prune { .. } => OpKind::Prune,
        }
    }
}

/// Ordered operations of one pass: creates and recreates in event order,
/// then prunes in mapping key order.
pub struct SyncPlan<'a>(pub Vec<SyncOp<'a>>);

impl<'a> SyncPlan<'a> {
    pub fn new(events: &'a [CalendarEvent], mapping: &'a BTreeMap<String, String>) -> Self {
        let mut ops = Vec::with_capacity(events.len());
        let mut processed = HashSet::with_capacity(events.len());

        for event in events {
            processed.insert(event.id.as_str());
            match mapping.get(&event.id) {
                Some(native_id) => ops.push(SyncOp::Recreate { event, native_id }),
                None => ops.push(SyncOp::Create(event)),
            }
        }

        for (event_id, native_id) in mapping {
            if !processed.contains(event_id.as_str()) {
                ops.push(SyncOp::Prune { event_id, native_id });
            }
        }

        SyncPlan(ops)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// (create, recreate, prune)
    pub fn counts(&self) -> (usize, usize, usize) {
        let mut created = 0;
        let mut recreated = 0;
        let mut pruned = 0;

        for op in &self.0 {
            match op.kind() {
                OpKind::Create => created += 1,
                OpKind::Recreate => recreated += 1,
                OpKind::Prune => pruned += 1,
            }
        }

        (created, recreated, pruned)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{EventMetadata, EventType};
    use chrono::{TimeZone, Utc};

    fn event(id: &str) -> CalendarEvent {
        let start = Utc.with_ymd_and_hms(2025, 11, 6, 8, 0, 0).unwrap();
        CalendarEvent {
            id: id.to_string(),
            title: format!("Event {id}"),
            description: String::new(),
            start_date: start,
            end_date: start + chrono::Duration::minutes(15),
            location: None,
            event_type: EventType::Intake,
            classification: EventType::Intake.classification(),
            color: "#3B82F6".to_string(),
            alerts: vec![15, 5],
            metadata: EventMetadata::default(),
        }
    }

    #[test]
    fn test_plan_orders_prunes_last_by_key() {
        let events = vec![event("intake_b"), event("intake_a")];
        let mapping = BTreeMap::from([
            ("pharmacy_2".to_string(), "n2".to_string()),
            ("intake_a".to_string(), "n0".to_string()),
            ("pharmacy_1".to_string(), "n1".to_string()),
        ]);

        let plan = SyncPlan::new(&events, &mapping);
        let kinds: Vec<_> = plan.0.iter().map(|op| op.kind().to_string()).collect();
        assert_eq!(kinds, vec!["+", "~", "-", "-"]);

        assert_eq!(
            plan.0[2],
            SyncOp::Prune {
                event_id: "pharmacy_1",
                native_id: "n1"
            }
        );
        assert_eq!(plan.counts(), (1, 1, 2));
    }

    #[test]
    fn test_empty_plan() {
        let mapping = BTreeMap::new();
        assert!(SyncPlan::new(&[], &mapping).is_empty());
    }
}
