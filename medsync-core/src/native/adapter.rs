//! Error-swallowing facade over a native calendar store.

use tracing::{debug, info, warn};

use crate::native::{NativeCalendar, NativeCalendarStore, NativeEventRequest};
use crate::permission::{PermissionScope, PermissionState, ScopeStatus};

pub struct NativeCalendarAdapter<S> {
    store: S,
}

impl<S: NativeCalendarStore> NativeCalendarAdapter<S> {
    pub fn new(store: S) -> Self {
        NativeCalendarAdapter { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub async fn list_calendars(&self) -> Vec<NativeCalendar> {
        match self.store.list_calendars().await {
            Ok(calendars) => {
                debug!("Loaded {} calendars", calendars.len());
                calendars
            }
            Err(e) => {
                warn!("Could not list calendars: {e}");
                vec![]
            }
        }
    }

    pub async fn create_event(&self, request: &NativeEventRequest) -> Option<String> {
        match self.store.create_event(request).await {
            Ok(native_id) => {
                debug!("Native event created: {native_id}");
                Some(native_id)
            }
            Err(e) => {
                warn!("Could not create native event '{}': {e}", request.title);
                None
            }
        }
    }

    /// `false` also covers ids the store no longer knows about.
    pub async fn delete_event(&self, native_id: &str) -> bool {
        match self.store.delete_event(native_id).await {
            Ok(()) => {
                debug!("Native event deleted: {native_id}");
                true
            }
            Err(e) => {
                warn!("Could not delete native event {native_id}: {e}");
                false
            }
        }
    }

    /// Probe both scopes. A failed probe counts as still promptable.
    pub async fn check_permission(&self) -> PermissionState {
        let read = self.probe(PermissionScope::ReadCalendar).await;
        let write = self.probe(PermissionScope::WriteCalendar).await;
        let state = PermissionState::from_scopes(read, write);

        debug!(?read, ?write, granted = state.granted, "Calendar permission status");
        state
    }

    async fn probe(&self, scope: PermissionScope) -> ScopeStatus {
        self.store
            .check_permission(scope)
            .await
            .unwrap_or_else(|e| {
                warn!("Could not check {scope:?} permission: {e}");
                ScopeStatus::Prompt
            })
    }

    pub async fn request_permission(&self) -> bool {
        match self.store.request_full_access().await {
            Ok(status) => {
                info!("Calendar access request: {status:?}");
                status == ScopeStatus::Granted
            }
            Err(e) => {
                warn!("Calendar access request failed: {e}");
                false
            }
        }
    }
}
