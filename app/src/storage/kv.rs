//! Key-value persistence primitives.
//!
//! One interface, two implementations selected at startup: a file-backed
//! store for device shells and an in-memory store for tests and the web
//! shell. Callers never branch on the platform.

use async_trait::async_trait;
use dashmap::DashMap;
use encore_core::{Error, Result};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Platform-injected key-value persistence.
#[async_trait]
pub trait KeyValueStorage: Send + Sync {
    /// Read the value stored under `key`, if any.
    async fn get(&self, key: &str) -> Result<Option<String>>;
    /// Durably store `value` under `key`.
    async fn set(&self, key: &str, value: &str) -> Result<()>;
    /// Remove `key`. Removing an absent key is a no-op.
    async fn remove(&self, key: &str) -> Result<()>;
}

/// File-backed storage: one file per key under a data directory.
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    /// Open (creating if needed) a storage directory.
    pub async fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| Error::StorageWriteFailed(e.to_string()))?;
        Ok(Self { dir })
    }

    /// The directory this store writes into.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

#[async_trait]
impl KeyValueStorage for FileStorage {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        match tokio::fs::read_to_string(self.path_for(key)).await {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(Error::StorageWriteFailed(e.to_string())),
        }
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        // Write to a sibling temp file and rename so a crash mid-write
        // never leaves a truncated document under the live key.
        let path = self.path_for(key);
        let tmp = self.dir.join(format!("{key}.json.tmp"));
        tokio::fs::write(&tmp, value)
            .await
            .map_err(|e| Error::StorageWriteFailed(e.to_string()))?;
        tokio::fs::rename(&tmp, &path)
            .await
            .map_err(|e| Error::StorageWriteFailed(e.to_string()))
    }

    async fn remove(&self, key: &str) -> Result<()> {
        match tokio::fs::remove_file(self.path_for(key)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(Error::StorageWriteFailed(e.to_string())),
        }
    }
}

/// In-memory storage for tests and shells without a filesystem.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: DashMap<String, String>,
}

impl MemoryStorage {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KeyValueStorage for MemoryStorage {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.get(key).map(|v| v.clone()))
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        self.entries.remove(key);
        Ok(())
    }
}
