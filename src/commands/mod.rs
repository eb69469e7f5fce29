pub mod calendars;
pub mod clear;
pub mod config;
pub mod permission;
pub mod summary;
pub mod sync;

use medsync_core::{FileConfigStore, IcsDirectoryStore, JsonFileProvider, SyncEngine};

pub type Engine = SyncEngine<JsonFileProvider, IcsDirectoryStore, FileConfigStore>;
