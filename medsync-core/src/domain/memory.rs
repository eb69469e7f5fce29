//! In-memory provider, for embedding apps that already hold their rows.

use std::collections::HashSet;

use chrono::{DateTime, Utc};

use crate::domain::{DomainEventProvider, DomainRow};
use crate::error::{MedSyncError, MedSyncResult};
use crate::event::EventType;

#[derive(Debug, Clone, Default)]
pub struct MemoryProvider {
    rows: Vec<DomainRow>,
    failing: HashSet<EventType>,
}

impl MemoryProvider {
    pub fn new(rows: Vec<DomainRow>) -> Self {
        MemoryProvider {
            rows,
            failing: HashSet::new(),
        }
    }

    /// Make every fetch of `category` fail.
    pub fn fail_on(mut self, category: EventType) -> Self {
        self.failing.insert(category);
        self
    }
}

impl DomainEventProvider for MemoryProvider {
    async fn fetch(
        &self,
        category: EventType,
        since: DateTime<Utc>,
    ) -> MedSyncResult<Vec<DomainRow>> {
        if self.failing.contains(&category) {
            return Err(MedSyncError::Provider(format!("{category} unavailable")));
        }

        Ok(self
            .rows
            .iter()
            .filter(|row| row.event_type() == category)
            .filter(|row| row.row_date().is_some_and(|date| date >= since))
            .cloned()
            .collect())
    }
}
