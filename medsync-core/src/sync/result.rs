//! Outcomes reported back to the user.

use serde::{Deserialize, Serialize};

/// Outcome of a sync pass. `success` is true iff `errors` is empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncResult {
    pub success: bool,
    pub events_created: usize,
    pub events_updated: usize,
    pub events_deleted: usize,
    pub errors: Vec<String>,
}

impl Default for SyncResult {
    fn default() -> Self {
        SyncResult {
            success: true,
            events_created: 0,
            events_updated: 0,
            events_deleted: 0,
            errors: vec![],
        }
    }
}

impl SyncResult {
    /// A pass that stopped before touching the calendar.
    pub fn failure(message: impl Into<String>) -> Self {
        let mut result = SyncResult::default();
        result.push_error(message);
        result
    }

    pub fn push_error(&mut self, message: impl Into<String>) {
        self.errors.push(message.into());
        self.success = false;
    }

    /// Successful calendar mutations.
    pub fn changes(&self) -> usize {
        self.events_created + self.events_updated + self.events_deleted
    }
}

/// Outcome of removing every synced event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClearResult {
    pub success: bool,
    pub deleted_count: usize,
    pub errors: Vec<String>,
}

impl ClearResult {
    pub fn failure(message: impl Into<String>) -> Self {
        ClearResult {
            success: false,
            deleted_count: 0,
            errors: vec![message.into()],
        }
    }
}
