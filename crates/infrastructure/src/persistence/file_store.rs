//! JSON-file option store.
//!
//! The whole document is held in memory and rewritten on every change.
//! Writes go to a sibling temp file that is then renamed over the target,
//! so a crash never leaves a half-written file behind.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use lmsforce_application::ports::{Clock, OptionStore, StoreError};
use serde_json::Value;
use tokio::fs;
use tokio::sync::RwLock;

use super::options_document::{OptionsDocument, SCHEMA_VERSION};
use crate::adapters::SystemClock;
use crate::serialization::{SerializationError, from_json_bytes, to_json_stable_bytes};

impl From<SerializationError> for StoreError {
    fn from(error: SerializationError) -> Self {
        Self::Serialization(error.to_string())
    }
}

/// Option store persisted to a single JSON file.
pub struct JsonFileOptionStore {
    path: PathBuf,
    document: RwLock<OptionsDocument>,
    clock: Arc<dyn Clock>,
}

impl JsonFileOptionStore {
    /// Opens the store at `path`, starting empty if the file does not exist.
    ///
    /// # Errors
    /// Returns an error if the file exists but cannot be read or parsed, or
    /// was written by a newer schema version.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        Self::open_with_clock(path, Arc::new(SystemClock::new())).await
    }

    /// Opens the store with a custom clock.
    ///
    /// # Errors
    /// See [`JsonFileOptionStore::open`].
    pub async fn open_with_clock(
        path: impl Into<PathBuf>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, StoreError> {
        let path = path.into();
        let document = match fs::read(&path).await {
            Ok(bytes) => from_json_bytes::<OptionsDocument>(&bytes)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => OptionsDocument::default(),
            Err(e) => return Err(StoreError::Io(e)),
        };
        if document.schema_version > SCHEMA_VERSION {
            return Err(StoreError::Serialization(format!(
                "unsupported options schema version {} (expected <= {SCHEMA_VERSION})",
                document.schema_version
            )));
        }
        tracing::debug!(path = %path.display(), options = document.options.len(), "Opened option store");
        Ok(Self {
            path,
            document: RwLock::new(document),
            clock,
        })
    }

    /// Path of the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn persist(&self, document: &OptionsDocument) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await?;
        }
        let content = to_json_stable_bytes(document)?;
        let mut temp = self.path.clone().into_os_string();
        temp.push(".tmp");
        let temp = PathBuf::from(temp);
        fs::write(&temp, content).await?;
        fs::rename(&temp, &self.path).await?;
        Ok(())
    }

    /// Applies a change under the write lock and persists the result.
    async fn update<T>(
        &self,
        change: impl FnOnce(&mut OptionsDocument) -> T + Send,
    ) -> Result<T, StoreError> {
        let mut document = self.document.write().await;
        let mut next = document.clone();
        let result = change(&mut next);
        if next != *document {
            self.persist(&next).await?;
            *document = next;
        }
        Ok(result)
    }
}

impl std::fmt::Debug for JsonFileOptionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JsonFileOptionStore")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl OptionStore for JsonFileOptionStore {
    async fn get(&self, key: &str) -> Result<Option<Value>, StoreError> {
        Ok(self.document.read().await.get(key))
    }

    async fn get_many(&self, keys: &[&str]) -> Result<Vec<Option<Value>>, StoreError> {
        let document = self.document.read().await;
        Ok(keys.iter().map(|key| document.get(key)).collect())
    }

    async fn set(&self, key: &str, value: Value) -> Result<(), StoreError> {
        self.update(|doc| doc.set(key, value)).await
    }

    async fn set_many(&self, entries: Vec<(String, Value)>) -> Result<(), StoreError> {
        self.update(|doc| {
            for (key, value) in entries {
                doc.set(key, value);
            }
        })
        .await
    }

    async fn delete(&self, key: &str) -> Result<bool, StoreError> {
        self.update(|doc| doc.delete(key)).await
    }

    async fn delete_many(&self, keys: &[&str]) -> Result<(), StoreError> {
        self.update(|doc| {
            for key in keys {
                doc.delete(key);
            }
        })
        .await
    }

    async fn get_transient(&self, key: &str) -> Result<Option<Value>, StoreError> {
        let now = self.clock.now();
        Ok(self.document.read().await.get_transient(key, now))
    }

    async fn set_transient(
        &self,
        key: &str,
        value: Value,
        ttl: Duration,
    ) -> Result<(), StoreError> {
        let now = self.clock.now();
        self.update(|doc| {
            doc.prune(now);
            doc.set_transient(key, value, now, ttl);
        })
        .await
    }

    async fn delete_transient(&self, key: &str) -> Result<bool, StoreError> {
        let now = self.clock.now();
        self.update(|doc| doc.delete_transient(key, now)).await
    }
}
