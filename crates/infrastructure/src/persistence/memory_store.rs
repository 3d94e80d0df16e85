//! In-memory option store.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use lmsforce_application::ports::{Clock, OptionStore, StoreError};
use serde_json::Value;
use tokio::sync::RwLock;

use super::options_document::OptionsDocument;
use crate::adapters::SystemClock;

/// Thread-safe option store that lives for the life of the process.
pub struct InMemoryOptionStore {
    document: RwLock<OptionsDocument>,
    clock: Arc<dyn Clock>,
}

impl InMemoryOptionStore {
    /// Creates an empty store using the system clock.
    #[must_use]
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock::new()))
    }

    /// Creates an empty store with a custom clock.
    #[must_use]
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            document: RwLock::new(OptionsDocument::default()),
            clock,
        }
    }

    /// Number of stored options, excluding transients.
    pub async fn len(&self) -> usize {
        self.document.read().await.options.len()
    }

    /// Returns true if no options are stored.
    pub async fn is_empty(&self) -> bool {
        self.document.read().await.options.is_empty()
    }
}

impl Default for InMemoryOptionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for InMemoryOptionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryOptionStore").finish_non_exhaustive()
    }
}

#[async_trait]
impl OptionStore for InMemoryOptionStore {
    async fn get(&self, key: &str) -> Result<Option<Value>, StoreError> {
        Ok(self.document.read().await.get(key))
    }

    async fn get_many(&self, keys: &[&str]) -> Result<Vec<Option<Value>>, StoreError> {
        let document = self.document.read().await;
        Ok(keys.iter().map(|key| document.get(key)).collect())
    }

    async fn set(&self, key: &str, value: Value) -> Result<(), StoreError> {
        self.document.write().await.set(key, value);
        Ok(())
    }

    async fn set_many(&self, entries: Vec<(String, Value)>) -> Result<(), StoreError> {
        let mut document = self.document.write().await;
        for (key, value) in entries {
            document.set(key, value);
        }
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<bool, StoreError> {
        Ok(self.document.write().await.delete(key))
    }

    async fn delete_many(&self, keys: &[&str]) -> Result<(), StoreError> {
        let mut document = self.document.write().await;
        for key in keys {
            document.delete(key);
        }
        Ok(())
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
        let mut document = self.document.write().await;
        document.prune(now);
        document.set_transient(key, value, now, ttl);
        Ok(())
    }

    async fn delete_transient(&self, key: &str) -> Result<bool, StoreError> {
        let now = self.clock.now();
        Ok(self.document.write().await.delete_transient(key, now))
    }
}
