//! A native calendar store backed by a directory of .ics files.
//!
//! Layout:
//!
//! ```text
//! <root>/
//!   <calendar-slug>/
//!     .calendar.toml
//!     <uuid>.ics
//! ```
//!
//! Native event ids are the UUIDs, unique across calendars.

use std::path::{Path, PathBuf};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{MedSyncError, MedSyncResult};
use crate::native::{NativeCalendar, NativeCalendarStore, NativeEventRequest, generate_ics};
use crate::permission::{PermissionScope, ScopeStatus};

const CALENDAR_META_FILE: &str = ".calendar.toml";
const DEFAULT_CALENDAR_NAME: &str = "Medsync";

/// Metadata stored in each calendar's .calendar.toml
#[derive(Debug, Clone, Serialize, Deserialize)]
struct CalendarMeta {
    name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    color: Option<String>,
    #[serde(default)]
    primary: bool,
    #[serde(default)]
    read_only: bool,
}

pub struct IcsDirectoryStore {
    root: PathBuf,
}

impl IcsDirectoryStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        IcsDirectoryStore { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Create a calendar directory with a slug unique within the store.
    pub async fn create_calendar(
        &self,
        name: &str,
        color: Option<&str>,
        primary: bool,
    ) -> MedSyncResult<NativeCalendar> {
        let id = self.unique_slug_for(name).await?;
        let dir = self.root.join(&id);
        tokio::fs::create_dir_all(&dir).await?;

        let meta = CalendarMeta {
            name: name.to_string(),
            color: color.map(String::from),
            primary,
            read_only: false,
        };
        let content =
            toml::to_string_pretty(&meta).map_err(|e| MedSyncError::Serialization(e.to_string()))?;
        tokio::fs::write(dir.join(CALENDAR_META_FILE), content).await?;

        Ok(to_native_calendar(id, meta))
    }

    /// Tries the base slug, then slug-2, slug-3, etc.
    async fn unique_slug_for(&self, name: &str) -> MedSyncResult<String> {
        let base = match slug::slugify(name) {
            s if s.is_empty() => "calendar".to_string(),
            s => s,
        };

        if !tokio::fs::try_exists(self.root.join(&base)).await? {
            return Ok(base);
        }

        for n in 2..=100 {
            let suffixed = format!("{}-{}", base, n);
            if !tokio::fs::try_exists(self.root.join(&suffixed)).await? {
                return Ok(suffixed);
            }
        }

        Err(MedSyncError::Store(format!(
            "Too many calendar name collisions for '{}'",
            base
        )))
    }

    async fn read_meta(&self, calendar_id: &str) -> MedSyncResult<CalendarMeta> {
        let path = self.root.join(calendar_id).join(CALENDAR_META_FILE);
        let content = tokio::fs::read_to_string(&path)
            .await
            .map_err(|_| MedSyncError::CalendarNotFound(calendar_id.to_string()))?;

        toml::from_str(&content).map_err(|e| MedSyncError::Store(e.to_string()))
    }

    async fn calendar_ids(&self) -> MedSyncResult<Vec<String>> {
        let mut entries = tokio::fs::read_dir(&self.root).await.map_err(|e| {
            MedSyncError::PermissionDenied(format!("{}: {}", self.root.display(), e))
        })?;

        let mut ids = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if !path.join(CALENDAR_META_FILE).exists() {
                continue;
            }
            if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
                ids.push(name.to_string());
            }
        }

        ids.sort();
        Ok(ids)
    }

    async fn scope_status(&self, scope: PermissionScope) -> MedSyncResult<ScopeStatus> {
        let metadata = match tokio::fs::metadata(&self.root).await {
            Ok(m) => m,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(ScopeStatus::Prompt),
            Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
                return Ok(ScopeStatus::Denied);
            }
            Err(e) => return Err(e.into()),
        };

        if !metadata.is_dir() {
            return Ok(ScopeStatus::Denied);
        }

        match scope {
            PermissionScope::WriteCalendar if metadata.permissions().readonly() => {
                Ok(ScopeStatus::Denied)
            }
            _ => Ok(ScopeStatus::Granted),
        }
    }
}

fn to_native_calendar(id: String, meta: CalendarMeta) -> NativeCalendar {
    NativeCalendar {
        id,
        display_name: meta.name.clone(),
        name: meta.name,
        is_primary: meta.primary,
        allows_modifications: !meta.read_only,
        color: meta.color,
    }
}

impl NativeCalendarStore for IcsDirectoryStore {
    async fn list_calendars(&self) -> MedSyncResult<Vec<NativeCalendar>> {
        let mut calendars = Vec::new();
        for id in self.calendar_ids().await? {
            let meta = self.read_meta(&id).await?;
            calendars.push(to_native_calendar(id, meta));
        }
        Ok(calendars)
    }

    async fn create_event(&self, request: &NativeEventRequest) -> MedSyncResult<String> {
        let meta = self.read_meta(&request.calendar_id).await?;
        if meta.read_only {
            return Err(MedSyncError::PermissionDenied(format!(
                "Calendar '{}' is read-only",
                request.calendar_id
            )));
        }

        let native_id = Uuid::new_v4().to_string();
        let ics = generate_ics(&native_id, request, Utc::now());

        let path = self
            .root
            .join(&request.calendar_id)
            .join(format!("{native_id}.ics"));
        tokio::fs::write(&path, ics).await?;

        Ok(native_id)
    }

    async fn delete_event(&self, native_id: &str) -> MedSyncResult<()> {
        // Only UUIDs are ours; this also keeps ids from escaping the root
        if Uuid::parse_str(native_id).is_err() {
            return Err(MedSyncError::EventNotFound(native_id.to_string()));
        }

        let file_name = format!("{native_id}.ics");
        for id in self.calendar_ids().await? {
            let path = self.root.join(&id).join(&file_name);
            if tokio::fs::try_exists(&path).await? {
                tokio::fs::remove_file(&path).await?;
                return Ok(());
            }
        }

        Err(MedSyncError::EventNotFound(native_id.to_string()))
    }

    async fn check_permission(&self, scope: PermissionScope) -> MedSyncResult<ScopeStatus> {
        self.scope_status(scope).await
    }

    /// Creates the store root, plus a default calendar when there is none.
    async fn request_full_access(&self) -> MedSyncResult<ScopeStatus> {
        tokio::fs::create_dir_all(&self.root).await?;

        if self.calendar_ids().await?.is_empty() {
            self.create_calendar(DEFAULT_CALENDAR_NAME, Some("#3B82F6"), true)
                .await?;
        }

        let read = self.scope_status(PermissionScope::ReadCalendar).await?;
        let write = self.scope_status(PermissionScope::WriteCalendar).await?;
        Ok(if read == ScopeStatus::Granted {
            write
        } else {
            read
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn request(calendar_id: &str) -> NativeEventRequest {
        NativeEventRequest {
            title: "RDV Médecin - Antibiotiques".to_string(),
            description: String::new(),
            start: Utc.with_ymd_and_hms(2025, 12, 1, 14, 0, 0).unwrap(),
            end: Utc.with_ymd_and_hms(2025, 12, 1, 15, 0, 0).unwrap(),
            calendar_id: calendar_id.to_string(),
            location: None,
            color: Some("#8B5CF6".to_string()),
            alerts: vec![1440, 60],
        }
    }

    #[tokio::test]
    async fn test_permission_is_promptable_until_requested() {
        let dir = tempfile::tempdir().unwrap();
        let store = IcsDirectoryStore::new(dir.path().join("calendars"));

        let status = store
            .check_permission(PermissionScope::ReadCalendar)
            .await
            .unwrap();
        assert_eq!(status, ScopeStatus::Prompt);

        assert_eq!(
            store.request_full_access().await.unwrap(),
            ScopeStatus::Granted
        );

        let calendars = store.list_calendars().await.unwrap();
        assert_eq!(calendars.len(), 1);
        assert_eq!(calendars[0].id, "medsync");
        assert!(calendars[0].is_primary);
    }

    #[tokio::test]
    async fn test_create_then_delete_event() {
        let dir = tempfile::tempdir().unwrap();
        let store = IcsDirectoryStore::new(dir.path());
        let calendar = store.create_calendar("Santé", None, false).await.unwrap();
        assert_eq!(calendar.id, "sante");

        let native_id = store.create_event(&request(&calendar.id)).await.unwrap();
        let path = dir.path().join("sante").join(format!("{native_id}.ics"));
        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content.matches("BEGIN:VALARM").count(), 2);

        store.delete_event(&native_id).await.unwrap();
        assert!(!path.exists());

        // Second delete: the id is unknown now
        assert!(matches!(
            store.delete_event(&native_id).await,
            Err(MedSyncError::EventNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_delete_rejects_foreign_ids() {
        let dir = tempfile::tempdir().unwrap();
        let store = IcsDirectoryStore::new(dir.path());

        assert!(store.delete_event("../../etc/passwd").await.is_err());
    }

    #[tokio::test]
    async fn test_create_in_unknown_calendar_fails() {
        let dir = tempfile::tempdir().unwrap();
        let store = IcsDirectoryStore::new(dir.path());

        assert!(matches!(
            store.create_event(&request("nope")).await,
            Err(MedSyncError::CalendarNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_slug_collisions_get_suffixes() {
        let dir = tempfile::tempdir().unwrap();
        let store = IcsDirectoryStore::new(dir.path());

        let first = store.create_calendar("Famille", None, false).await.unwrap();
        let second = store.create_calendar("Famille", None, false).await.unwrap();

        assert_eq!(first.id, "famille");
        assert_eq!(second.id, "famille-2");
        assert_eq!(store.list_calendars().await.unwrap().len(), 2);
    }
}
