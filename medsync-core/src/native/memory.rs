//! In-memory calendar store that records every call made to it.

use std::collections::{BTreeMap, HashSet};
use std::sync::{Mutex, MutexGuard};

use crate::error::{MedSyncError, MedSyncResult};
use crate::native::{NativeCalendar, NativeCalendarStore, NativeEventRequest};
use crate::permission::{PermissionScope, ScopeStatus};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreCall {
    ListCalendars,
    /// Create, by event title
    Create(String),
    /// Delete, by native id
    Delete(String),
    CheckPermission(PermissionScope),
    RequestAccess,
}

impl StoreCall {
    pub fn is_mutation(&self) -> bool {
        matches!(self, StoreCall::Create(_) | StoreCall::Delete(_))
    }
}

struct MemoryState {
    calendars: Vec<NativeCalendar>,
    events: BTreeMap<String, NativeEventRequest>,
    calls: Vec<StoreCall>,
    next_id: u64,
    read: ScopeStatus,
    write: ScopeStatus,
    failing_creates: HashSet<String>,
    failing_deletes: HashSet<String>,
}

pub struct MemoryCalendarStore {
    state: Mutex<MemoryState>,
}

impl Default for MemoryCalendarStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryCalendarStore {
    /// One writable primary calendar (`medsync`), access granted.
    pub fn new() -> Self {
        MemoryCalendarStore {
            state: Mutex::new(MemoryState {
                calendars: vec![NativeCalendar {
                    id: "medsync".to_string(),
                    name: "Medsync".to_string(),
                    display_name: "Medsync".to_string(),
                    is_primary: true,
                    allows_modifications: true,
                    color: None,
                }],
                events: BTreeMap::new(),
                calls: vec![],
                next_id: 1,
                read: ScopeStatus::Granted,
                write: ScopeStatus::Granted,
                failing_creates: HashSet::new(),
                failing_deletes: HashSet::new(),
            }),
        }
    }

    pub fn with_permission(self, read: ScopeStatus, write: ScopeStatus) -> Self {
        {
            let mut state = self.lock_state();
            state.read = read;
            state.write = write;
        }
        self
    }

    /// Seed an existing native event.
    pub fn with_event(self, native_id: &str, request: NativeEventRequest) -> Self {
        self.lock_state()
            .events
            .insert(native_id.to_string(), request);
        self
    }

    /// Creates of events with this title fail.
    pub fn fail_create(self, title: &str) -> Self {
        self.lock_state().failing_creates.insert(title.to_string());
        self
    }

    /// Deletes of this native id fail.
    pub fn fail_delete(self, native_id: &str) -> Self {
        self.lock_state()
            .failing_deletes
            .insert(native_id.to_string());
        self
    }

    pub fn calls(&self) -> Vec<StoreCall> {
        self.lock_state().calls.clone()
    }

    pub fn mutations(&self) -> Vec<StoreCall> {
        self.calls().into_iter().filter(StoreCall::is_mutation).collect()
    }

    pub fn events(&self) -> BTreeMap<String, NativeEventRequest> {
        self.lock_state().events.clone()
    }

    // The lock is never held across an await, and a panic while holding it
    // can only come from a test assertion.
    fn lock_state(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl NativeCalendarStore for MemoryCalendarStore {
    async fn list_calendars(&self) -> MedSyncResult<Vec<NativeCalendar>> {
        let mut state = self.lock_state();
        state.calls.push(StoreCall::ListCalendars);
        Ok(state.calendars.clone())
    }

    async fn create_event(&self, request: &NativeEventRequest) -> MedSyncResult<String> {
        let mut state = self.lock_state();
        state.calls.push(StoreCall::Create(request.title.clone()));

        if state.failing_creates.contains(&request.title) {
            return Err(MedSyncError::Store(format!("create refused: {}", request.title)));
        }
        if !state.calendars.iter().any(|c| c.id == request.calendar_id) {
            return Err(MedSyncError::CalendarNotFound(request.calendar_id.clone()));
        }

        let native_id = format!("native-{}", state.next_id);
        state.next_id += 1;
        state.events.insert(native_id.clone(), request.clone());
        Ok(native_id)
    }

    async fn delete_event(&self, native_id: &str) -> MedSyncResult<()> {
        let mut state = self.lock_state();
        state.calls.push(StoreCall::Delete(native_id.to_string()));

        if state.failing_deletes.contains(native_id) {
            return Err(MedSyncError::Store(format!("delete refused: {native_id}")));
        }

        state
            .events
            .remove(native_id)
            .map(|_| ())
            .ok_or_else(|| MedSyncError::EventNotFound(native_id.to_string()))
    }

    async fn check_permission(&self, scope: PermissionScope) -> MedSyncResult<ScopeStatus> {
        let status = {
            let mut state = self.lock_state();
            state.calls.push(StoreCall::CheckPermission(scope));
            match scope {
                PermissionScope::ReadCalendar => state.read,
                PermissionScope::WriteCalendar => state.write,
            }
        };

        // Let other tasks run, as a real permission probe would
        tokio::task::yield_now().await;
        Ok(status)
    }

    async fn request_full_access(&self) -> MedSyncResult<ScopeStatus> {
        let mut state = self.lock_state();
        state.calls.push(StoreCall::RequestAccess);

        // Only undecided scopes can still be granted
        if state.read == ScopeStatus::Prompt {
            state.read = ScopeStatus::Granted;
        }
        if state.write == ScopeStatus::Prompt {
            state.write = ScopeStatus::Granted;
        }

        Ok(match (state.read, state.write) {
            (ScopeStatus::Granted, ScopeStatus::Granted) => ScopeStatus::Granted,
            _ => ScopeStatus::Denied,
        })
    }
}
