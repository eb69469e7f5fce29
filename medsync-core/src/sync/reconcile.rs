//! Drive the native calendar towards the loaded event set.

use std::collections::BTreeMap;

use tracing::{info, warn};

use crate::event::CalendarEvent;
use crate::native::{NativeCalendarAdapter, NativeCalendarStore, NativeEventRequest};
use crate::sync::{SyncOp, SyncPlan, SyncResult};

/// New mapping and outcome of one reconciliation.
#[derive(Debug, Clone, PartialEq)]
pub struct Reconciliation {
    pub mapping: BTreeMap<String, String>,
    pub result: SyncResult,
}

/// Apply one pass, sequentially, in plan order.
///
/// - Mapped events are deleted (best effort) then created again. If the
///   create fails, the previous mapping entry is kept.
/// - New events are created.
/// - Mapped events absent from `events` are deleted. A failed delete keeps
///   the entry so the next pass retries it.
///
/// Nothing is rolled back on failure.
pub async fn reconcile<S: NativeCalendarStore>(
    adapter: &NativeCalendarAdapter<S>,
    calendar_id: &str,
    events: &[CalendarEvent],
    mapping: &BTreeMap<String, String>,
) -> Reconciliation {
    let plan = SyncPlan::new(events, mapping);
    let mut new_mapping = mapping.clone();
    let mut result = SyncResult::default();

    for op in &plan.0 {
        match op {
            SyncOp::Create(event) => {
                let request = NativeEventRequest::for_event(event, calendar_id);
                match adapter.create_event(&request).await {
                    Some(native_id) => {
                        info!("{} {} → {native_id}", op.kind(), event.id);
                        new_mapping.insert(event.id.clone(), native_id);
                        result.events_created += 1;
                    }
                    None => result.push_error(format!("Échec création: {}", event.title)),
                }
            }
            SyncOp::Recreate { event, native_id } => {
                if !adapter.delete_event(native_id).await {
                    warn!("Previous native event {native_id} of {} not deleted", event.id);
                }

                let request = NativeEventRequest::for_event(event, calendar_id);
                match adapter.create_event(&request).await {
                    Some(new_id) => {
                        info!("{} {} → {new_id}", op.kind(), event.id);
                        new_mapping.insert(event.id.clone(), new_id);
                        result.events_updated += 1;
                    }
                    None => result.push_error(format!("Échec recréation: {}", event.title)),
                }
            }
            SyncOp::Prune {
                event_id,
                native_id,
            } => {
                if adapter.delete_event(native_id).await {
                    info!("{} {event_id}", op.kind());
                    new_mapping.remove(*event_id);
                    result.events_deleted += 1;
                } else {
                    result.push_error(format!("Échec suppression: {event_id}"));
                }
            }
        }
    }

    Reconciliation {
        mapping: new_mapping,
        result,
    }
}
