//! Persistence for `SyncConfig`.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::config::SyncConfig;
use crate::error::{MedSyncError, MedSyncResult};

/// Durable storage for the sync config.
pub trait ConfigStore: Send + Sync {
    /// `None` when nothing has been saved yet.
    fn load(&self) -> MedSyncResult<Option<SyncConfig>>;

    fn save(&self, config: &SyncConfig) -> MedSyncResult<()>;

    fn clear(&self) -> MedSyncResult<()>;
}

/// Stores the config as a TOML file.
pub struct FileConfigStore {
    path: PathBuf,
}

impl FileConfigStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        FileConfigStore { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ConfigStore for FileConfigStore {
    fn load(&self) -> MedSyncResult<Option<SyncConfig>> {
        if !self.path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(&self.path)?;
        SyncConfig::from_toml_str(&content).map(Some)
    }

    fn save(&self, config: &SyncConfig) -> MedSyncResult<()> {
        if let Some(dir) = self.path.parent() {
            std::fs::create_dir_all(dir)?;
        }

        let content = config.to_toml_string()?;

        // Write to a temp file first so a crash never leaves a truncated mapping
        let mut temp = self.path.clone().into_os_string();
        temp.push(".tmp");
        let temp = PathBuf::from(temp);

        std::fs::write(&temp, content)?;
        std::fs::rename(&temp, &self.path)?;
        Ok(())
    }

    fn clear(&self) -> MedSyncResult<()> {
        match std::fs::remove_file(&self.path) {
            Err(e) if e.kind() != std::io::ErrorKind::NotFound => Err(e.into()),
            _ => Ok(()),
        }
    }
}

/// Keeps the serialized blob in memory. Goes through the same TOML
/// encoding as the file store.
#[derive(Default)]
pub struct MemoryConfigStore {
    blob: Mutex<Option<String>>,
}

impl MemoryConfigStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: &SyncConfig) -> MedSyncResult<Self> {
        Ok(MemoryConfigStore {
            blob: Mutex::new(Some(config.to_toml_string()?)),
        })
    }

    /// Start from a raw stored blob, parsed lazily on `load`.
    pub fn with_blob(content: impl Into<String>) -> Self {
        MemoryConfigStore {
            blob: Mutex::new(Some(content.into())),
        }
    }

    fn lock(&self) -> MedSyncResult<std::sync::MutexGuard<'_, Option<String>>> {
        self.blob
            .lock()
            .map_err(|_| MedSyncError::Config("config store lock poisoned".into()))
    }
}

impl ConfigStore for MemoryConfigStore {
    fn load(&self) -> MedSyncResult<Option<SyncConfig>> {
        self.lock()?
            .as_deref()
            .map(SyncConfig::from_toml_str)
            .transpose()
    }

    fn save(&self, config: &SyncConfig) -> MedSyncResult<()> {
        *self.lock()? = Some(config.to_toml_string()?);
        Ok(())
    }

    fn clear(&self) -> MedSyncResult<()> {
        *self.lock()? = None;
        Ok(())
    }
}
