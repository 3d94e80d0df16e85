//! Persistent storage for the Salesforce session.
//!
//! The session is two options (access token and instance URL) plus a
//! short-lived connection status flag that the next status read consumes.

use std::sync::Arc;
use std::time::Duration;

use lmsforce_domain::{ConnectionStatus, TokenState};
use serde_json::Value;

use crate::ports::{OptionStore, StoreError};

/// Option key holding the OAuth access token.
pub const ACCESS_TOKEN_KEY: &str = "learndash_salesforce_access_token";
/// Option key holding the Salesforce instance URL.
pub const INSTANCE_URL_KEY: &str = "learndash_salesforce_instance_url";
/// Transient key holding the last connection status change.
pub const CONNECTION_STATUS_KEY: &str = "learndash_salesforce_connection_status";
/// How long a connection status flag stays readable.
pub const CONNECTION_STATUS_TTL: Duration = Duration::from_secs(60 * 60);

/// Token state persisted through an [`OptionStore`].
#[derive(Clone)]
pub struct TokenStore {
    store: Arc<dyn OptionStore>,
}

impl TokenStore {
    /// Creates a token store on top of the given option store.
    #[must_use]
    pub fn new(store: Arc<dyn OptionStore>) -> Self {
        Self { store }
    }

    /// Returns the stored token state.
    ///
    /// Absent if either field is missing or empty.
    ///
    /// # Errors
    /// Returns an error if the option store cannot be read.
    pub async fn get(&self) -> Result<Option<TokenState>, StoreError> {
        let values = self
            .store
            .get_many(&[ACCESS_TOKEN_KEY, INSTANCE_URL_KEY])
            .await?;
        let mut values = values.into_iter().map(|v| match v {
            Some(Value::String(s)) => Some(s),
            _ => None,
        });
        let access_token = values.next().flatten();
        let instance_url = values.next().flatten();
        Ok(TokenState::from_parts(access_token, instance_url))
    }

    /// Returns true if a complete token state is stored.
    ///
    /// # Errors
    /// Returns an error if the option store cannot be read.
    pub async fn is_connected(&self) -> Result<bool, StoreError> {
        Ok(self.get().await?.is_some())
    }

    /// Persists both fields of a token state. Last write wins.
    ///
    /// # Errors
    /// Returns an error if the option store cannot be written.
    pub async fn save(&self, token: &TokenState) -> Result<(), StoreError> {
        self.store
            .set_many(vec![
                (
                    ACCESS_TOKEN_KEY.to_string(),
                    Value::String(token.access_token.clone()),
                ),
                (
                    INSTANCE_URL_KEY.to_string(),
                    Value::String(token.instance_url.clone()),
                ),
            ])
            .await
    }

    /// Removes the token state and records a `disconnected` status.
    ///
    /// Returns whether a token state was present. When nothing was stored
    /// no writes are made.
    ///
    /// # Errors
    /// Returns an error if the option store cannot be read or written.
    pub async fn clear(&self) -> Result<bool, StoreError> {
        if !self.is_connected().await? {
            return Ok(false);
        }
        self.store
            .delete_many(&[ACCESS_TOKEN_KEY, INSTANCE_URL_KEY])
            .await?;
        self.record_status(ConnectionStatus::Disconnected).await?;
        Ok(true)
    }

    /// Records a connection status change for the next status read.
    ///
    /// # Errors
    /// Returns an error if the option store cannot be written.
    pub async fn record_status(&self, status: ConnectionStatus) -> Result<(), StoreError> {
        self.store
            .set_transient(
                CONNECTION_STATUS_KEY,
                Value::String(status.as_str().to_string()),
                CONNECTION_STATUS_TTL,
            )
            .await
    }

    /// Reads and consumes the recorded connection status.
    ///
    /// Unrecognised stored values are discarded.
    ///
    /// # Errors
    /// Returns an error if the option store cannot be read or written.
    pub async fn take_status(&self) -> Result<Option<ConnectionStatus>, StoreError> {
        let Some(value) = self.store.get_transient(CONNECTION_STATUS_KEY).await? else {
            return Ok(None);
        };
        self.store.delete_transient(CONNECTION_STATUS_KEY).await?;
        let status = value.as_str().and_then(|s| match s.parse() {
            Ok(status) => Some(status),
            Err(e) => {
                tracing::warn!(error = %e, "Discarding connection status");
                None
            }
        });
        Ok(status)
    }

    /// Removes every key this store writes, including the status flag.
    ///
    /// # Errors
    /// Returns an error if the option store cannot be written.
    pub async fn purge(&self) -> Result<(), StoreError> {
        self.store
            .delete_many(&[ACCESS_TOKEN_KEY, INSTANCE_URL_KEY])
            .await?;
        self.store.delete_transient(CONNECTION_STATUS_KEY).await?;
        Ok(())
    }
}

impl std::fmt::Debug for TokenStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenStore").finish_non_exhaustive()
    }
}
