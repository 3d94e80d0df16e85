//! Option store port
//!
//! A flat key/value store with two namespaces: durable options and
//! expiring transients. Values are JSON so both scalars and small records
//! can be kept under one key.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

/// Errors that can occur during option store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// A stored value did not have the expected shape.
    #[error("Invalid value for option '{key}': {message}")]
    InvalidValue {
        /// Option key.
        key: String,
        /// What was wrong with it.
        message: String,
    },
}

/// Persistent option storage provided by the host.
#[async_trait]
pub trait OptionStore: Send + Sync {
    /// Reads an option. Returns `None` if it was never set or was deleted.
    async fn get(&self, key: &str) -> Result<Option<Value>, StoreError>;

    /// Reads several options in one consistent snapshot.
    ///
    /// The result has one entry per key, in the same order.
    async fn get_many(&self, keys: &[&str]) -> Result<Vec<Option<Value>>, StoreError>;

    /// Writes an option, replacing any previous value.
    async fn set(&self, key: &str, value: Value) -> Result<(), StoreError>;

    /// Writes several options in one consistent update.
    async fn set_many(&self, entries: Vec<(String, Value)>) -> Result<(), StoreError>;

    /// Deletes an option. Returns true if it existed.
    async fn delete(&self, key: &str) -> Result<bool, StoreError>;

    /// Deletes several options in one consistent update.
    async fn delete_many(&self, keys: &[&str]) -> Result<(), StoreError>;

    /// Reads a transient. Expired transients read as `None`.
    async fn get_transient(&self, key: &str) -> Result<Option<Value>, StoreError>;

    /// Writes a transient that expires after `ttl`.
    async fn set_transient(&self, key: &str, value: Value, ttl: Duration)
    -> Result<(), StoreError>;

    /// Deletes a transient. Returns true if a live value existed.
    async fn delete_transient(&self, key: &str) -> Result<bool, StoreError>;

    /// Writes an option only if it is not already present.
    ///
    /// Returns true if the value was written.
    async fn add(&self, key: &str, value: Value) -> Result<bool, StoreError> {
        if self.get(key).await?.is_some() {
            return Ok(false);
        }
        self.set(key, value).await?;
        Ok(true)
    }
}
