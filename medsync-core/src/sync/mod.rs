//! Reconciliation of the native calendar with the domain events.

mod engine;
mod plan;
mod reconcile;
mod result;
mod summary;

pub use engine::{ERR_CONFIG_LOAD, ERR_IN_PROGRESS, ERR_NO_CALENDAR, ERR_PERMISSION, SyncEngine};
pub use plan::{OpKind, SyncOp, SyncPlan};
pub use reconcile::{Reconciliation, reconcile};
pub use result::{ClearResult, SyncResult};
pub use summary::SyncSummary;
