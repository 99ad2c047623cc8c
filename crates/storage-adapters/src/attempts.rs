//! `AttemptStore` adapters.
//!
//! `FileAttemptStore` keeps all records in one small JSON document so the
//! failed-login counter survives a restart; `InMemoryAttemptStore` is the
//! server-side store keyed by student id.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use dashmap::DashMap;
use domains::{AttemptRecord, AttemptStore, DomainError, Result};
use tokio::fs;
use tokio::sync::Mutex;
use tracing::warn;

#[derive(Debug, Default)]
pub struct InMemoryAttemptStore {
    records: DashMap<String, AttemptRecord>,
}

impl InMemoryAttemptStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AttemptStore for InMemoryAttemptStore {
    async fn load(&self, key: &str) -> Result<AttemptRecord> {
        Ok(self.records.get(key).map(|r| *r).unwrap_or_default())
    }

    async fn save(&self, key: &str, record: AttemptRecord) -> Result<()> {
        self.records.insert(key.to_string(), record);
        Ok(())
    }
}

pub struct FileAttemptStore {
    path: PathBuf,
    /// Serializes read-modify-write of the document.
    lock: Mutex<()>,
}

impl FileAttemptStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// A missing file is an empty store. A corrupt one is treated the same,
    /// with a warning, rather than locking the user out forever.
    async fn read_all(&self) -> Result<HashMap<String, AttemptRecord>> {
        let bytes = match fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(HashMap::new()),
            Err(e) => {
                let reason = format!("reading {}: {e}", self.path.display());
                return Err(DomainError::internal(reason));
            }
        };
        match serde_json::from_slice(&bytes) {
            Ok(records) => Ok(records),
            Err(e) => {
                let path = self.path.display();
                warn!(%path, error = %e, "discarding unreadable attempt store");
                Ok(HashMap::new())
            }
        }
    }
}

#[async_trait]
impl AttemptStore for FileAttemptStore {
    async fn load(&self, key: &str) -> Result<AttemptRecord> {
        let _guard = self.lock.lock().await;
        Ok(self.read_all().await?.get(key).copied().unwrap_or_default())
    }

    async fn save(&self, key: &str, record: AttemptRecord) -> Result<()> {
        let _guard = self.lock.lock().await;
        let mut records = self.read_all().await?;
        records.insert(key.to_string(), record);

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| DomainError::internal(format!("creating {}: {e}", parent.display())))?;
        }
        let json =
            serde_json::to_vec_pretty(&records).map_err(|e| DomainError::internal(e.to_string()))?;
        fs::write(&self.path, json)
            .await
            .map_err(|e| DomainError::internal(format!("writing {}: {e}", self.path.display())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[tokio::test]
    async fn test_file_store_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state").join("attempts.json");
        let locked = AttemptRecord {
            failed_attempts: 5,
            locked_until: Some(Utc.with_ymd_and_hms(2023, 5, 15, 9, 1, 0).unwrap()),
        };

        FileAttemptStore::new(&path).save("loginAttempts", locked).await.unwrap();

        let reopened = FileAttemptStore::new(&path);
        assert_eq!(reopened.load("loginAttempts").await.unwrap(), locked);
        assert_eq!(reopened.load("someone-else").await.unwrap(), AttemptRecord::default());
    }

    #[tokio::test]
    async fn test_file_store_ignores_corrupt_document() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("attempts.json");
        std::fs::write(&path, b"not json").unwrap();

        let store = FileAttemptStore::new(&path);
        assert_eq!(store.load("loginAttempts").await.unwrap(), AttemptRecord::default());
    }

    #[tokio::test]
    async fn test_memory_store_keys_are_independent() {
        let store = InMemoryAttemptStore::new();
        store
            .save("S1", AttemptRecord { failed_attempts: 2, locked_until: None })
            .await
            .unwrap();
        assert_eq!(store.load("S1").await.unwrap().failed_attempts, 2);
        assert_eq!(store.load("S2").await.unwrap().failed_attempts, 0);
    }
}
