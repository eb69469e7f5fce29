//! Core of medsync: keeps a user calendar in step with medication data.
//!
//! Domain rows (intakes, visits, prescriptions) are mapped to calendar
//! events, and each sync pass drives a native calendar store towards that
//! event set:
//! - `domain` and `mapper` turn rows into [`CalendarEvent`]s
//! - `loader` picks the events a pass should converge to
//! - `sync` plans and applies the pass, and reports on it
//! - `native` and `config` hold the calendar store and persisted state

pub mod clock;
pub mod config;
pub mod constants;
pub mod date_range;
pub mod domain;
pub mod error;
pub mod event;
pub mod loader;
pub mod logging;
pub mod mapper;
pub mod native;
pub mod permission;
pub mod settings;
pub mod sync;

pub use clock::{CanonicalClock, Clock, FixedClock, SystemClock};
pub use crate::config::{ConfigStore, FileConfigStore, MemoryConfigStore, SyncConfig};
pub use domain::{DomainEventProvider, DomainRow, JsonFileProvider, MemoryProvider};
pub use error::{MedSyncError, MedSyncResult};
pub use event::{CalendarEvent, Classification, EventType, IntakeStatus};
pub use native::{
    IcsDirectoryStore, MemoryCalendarStore, NativeCalendar, NativeCalendarAdapter,
    NativeCalendarStore,
};
pub use permission::PermissionState;
pub use settings::Settings;
pub use sync::{ClearResult, SyncEngine, SyncResult, SyncSummary};
