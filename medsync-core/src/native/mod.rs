//! Native calendar access.
//!
//! [`NativeCalendarStore`] is the raw, fallible interface to whatever holds
//! the user's calendars. [`NativeCalendarAdapter`] wraps it so that nothing
//! fails across the boundary: every error is logged and turned into
//! `false`/`None`/an empty list.

mod adapter;
mod ics;
mod ics_dir;
mod memory;

pub use adapter::NativeCalendarAdapter;
pub use ics::generate_ics;
pub use ics_dir::IcsDirectoryStore;
pub use memory::{MemoryCalendarStore, StoreCall};

use std::future::Future;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::MedSyncResult;
use crate::event::CalendarEvent;
use crate::permission::{PermissionScope, ScopeStatus};

/// A calendar the user can pick as sync target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NativeCalendar {
    pub id: String,
    pub name: String,
    pub display_name: String,
    pub is_primary: bool,
    pub allows_modifications: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

/// Parameters of a native create call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NativeEventRequest {
    pub title: String,
    pub description: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub calendar_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default)]
    pub alerts: Vec<i64>,
}

impl NativeEventRequest {
    pub fn for_event(event: &CalendarEvent, calendar_id: &str) -> Self {
        NativeEventRequest {
            title: event.title.clone(),
            description: event.description.clone(),
            start: event.start_date,
            end: event.end_date,
            calendar_id: calendar_id.to_string(),
            location: event.location.clone(),
            color: Some(event.color.clone()),
            alerts: event.alerts.clone(),
        }
    }
}

/// Backing calendar store. Implementations report failures as errors;
/// callers go through [`NativeCalendarAdapter`].
pub trait NativeCalendarStore: Send + Sync {
    fn list_calendars(&self) -> impl Future<Output = MedSyncResult<Vec<NativeCalendar>>> + Send;

    /// Returns the native id of the new event.
    fn create_event(
        &self,
        request: &NativeEventRequest,
    ) -> impl Future<Output = MedSyncResult<String>> + Send;

    /// Unknown ids are an error.
    fn delete_event(&self, native_id: &str) -> impl Future<Output = MedSyncResult<()>> + Send;

    fn check_permission(
        &self,
        scope: PermissionScope,
    ) -> impl Future<Output = MedSyncResult<ScopeStatus>> + Send;

    /// Ask for read and write access at once.
    fn request_full_access(&self) -> impl Future<Output = MedSyncResult<ScopeStatus>> + Send;
}
