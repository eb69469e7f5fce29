//! Shared constants.

/// Timezone used for "now", "today" and lateness thresholds.
pub const DEFAULT_TIMEZONE: &str = "Europe/Paris";

/// Events dated before this day are never synced (unless they are in the future).
pub const DEFAULT_ANCHOR_DATE: &str = "2025-10-13";

/// A pending intake becomes late once this many minutes have passed.
pub const LATE_THRESHOLD_MINUTES: i64 = 30;

/// File holding the persisted `SyncConfig` inside the data directory.
pub const SYNC_STATE_FILE: &str = "sync.toml";
