//! In-memory shape of the option store shared by the memory and file adapters.

use std::collections::BTreeMap;
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Current options file schema version.
pub const SCHEMA_VERSION: u32 = 1;

/// A transient value and when it stops being readable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransientEntry {
    /// Stored value.
    pub value: Value,
    /// Expiry instant.
    pub expires_at: DateTime<Utc>,
}

impl TransientEntry {
    fn is_live(&self, now: DateTime<Utc>) -> bool {
        self.expires_at > now
    }
}

/// All options and transients of one installation.
///
/// Serialized as:
/// ```json
/// {
///   "options": { "learndash_salesforce_settings": { "client_id": "..." } },
///   "schema_version": 1,
///   "transients": {
///     "learndash_salesforce_connection_status": {
///       "expires_at": "2026-01-01T12:00:00Z",
///       "value": "connected"
///     }
///   }
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptionsDocument {
    /// File format version.
    pub schema_version: u32,
    /// Durable options.
    #[serde(default)]
    pub options: BTreeMap<String, Value>,
    /// Expiring values.
    #[serde(default)]
    pub transients: BTreeMap<String, TransientEntry>,
}

impl Default for OptionsDocument {
    fn default() -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            options: BTreeMap::new(),
            transients: BTreeMap::new(),
        }
    }
}

impl OptionsDocument {
    /// Reads an option.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<Value> {
        self.options.get(key).cloned()
    }

    /// Writes an option.
    pub fn set(&mut self, key: impl Into<String>, value: Value) {
        self.options.insert(key.into(), value);
    }

    /// Deletes an option, returning true if it existed.
    pub fn delete(&mut self, key: &str) -> bool {
        self.options.remove(key).is_some()
    }

    /// Reads a transient that has not expired at `now`.
    #[must_use]
    pub fn get_transient(&self, key: &str, now: DateTime<Utc>) -> Option<Value> {
        self.transients
            .get(key)
            .filter(|entry| entry.is_live(now))
            .map(|entry| entry.value.clone())
    }

    /// Writes a transient expiring `ttl` after `now`.
    pub fn set_transient(
        &mut self,
        key: impl Into<String>,
        value: Value,
        now: DateTime<Utc>,
        ttl: Duration,
    ) {
        let ttl = TimeDelta::from_std(ttl).unwrap_or(TimeDelta::MAX);
        let expires_at = now.checked_add_signed(ttl).unwrap_or(DateTime::<Utc>::MAX_UTC);
        self.transients
            .insert(key.into(), TransientEntry { value, expires_at });
    }

    /// Deletes a transient, returning true if a live value existed.
    pub fn delete_transient(&mut self, key: &str, now: DateTime<Utc>) -> bool {
        self.transients
            .remove(key)
            .is_some_and(|entry| entry.is_live(now))
    }

    /// Drops expired transients. Returns true if anything was removed.
    pub fn prune(&mut self, now: DateTime<Utc>) -> bool {
        let before = self.transients.len();
        self.transients.retain(|_, entry| entry.is_live(now));
        self.transients.len() != before
    }
}
