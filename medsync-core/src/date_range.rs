//! Retention window for a category group.

use chrono::{DateTime, Utc};

use crate::config::{FuturePolicy, HistoryPolicy};

/// Window of event start instants to keep.
/// None values mean unbounded in that direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

impl DateRange {
    /// Build the window around `now` from a group's retention policies.
    ///
    /// Returns `None` when the policies keep neither past nor future events,
    /// in which case the group does not need to be loaded at all. A period
    /// reaching past the representable calendar leaves that side unbounded.
    pub fn from_policies(
        history: &HistoryPolicy,
        future: &FuturePolicy,
        now: DateTime<Utc>,
    ) -> Option<Self> {
        if !history.keeps_history() && !future.syncs_future() {
            return None;
        }

        let from = if history.keeps_history() {
            history
                .period
                .and_then(|p| p.duration())
                .and_then(|d| now.checked_sub_signed(d))
        } else {
            Some(now)
        };

        let to = if future.syncs_future() {
            future
                .period
                .and_then(|p| p.duration())
                .and_then(|d| now.checked_add_signed(d))
        } else {
            Some(now)
        };

        Some(DateRange { from, to })
    }

    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        self.from.is_none_or(|from| instant >= from) && self.to.is_none_or(|to| instant <= to)
    }

    /// Whole days covered on each side of `now`, for display. Unbounded sides
    /// report `None`.
    pub fn days_around(&self, now: DateTime<Utc>) -> (Option<i64>, Option<i64>) {
        (
            self.from.map(|from| (now - from).num_days().max(0)),
            self.to.map(|to| (to - now).num_days().max(0)),
        )
    }
}
