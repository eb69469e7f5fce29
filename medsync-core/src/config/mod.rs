//! Sync configuration and its persistence.

mod store;
mod sync_config;

pub use store::{ConfigStore, FileConfigStore, MemoryConfigStore};
pub use sync_config::{
    AppointmentSyncOptions, FutureMode, FuturePolicy, HistoryMode, HistoryPolicy,
    IntakeSyncOptions, PeriodUnit, SyncConfig, SyncPeriod,
};
