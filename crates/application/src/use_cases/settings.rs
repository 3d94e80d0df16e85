//! Salesforce settings use case.

use std::sync::Arc;

use lmsforce_domain::{SalesforceSettings, StatusNotice};

use crate::auth::TokenStore;
use crate::ports::{OptionStore, StoreError};

/// Option key holding the settings record.
pub const SETTINGS_KEY: &str = "learndash_salesforce_settings";

/// Errors that can occur when reading or writing settings.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    /// Settings are read-only while a token state exists.
    #[error("Settings cannot be changed while connected to Salesforce; disconnect first")]
    Locked,

    /// The option store failed.
    #[error("storage error: {0}")]
    Store(#[from] StoreError),
}

/// Loads and saves the connected-app settings.
#[derive(Clone)]
pub struct SettingsService {
    store: Arc<dyn OptionStore>,
    tokens: TokenStore,
}

impl SettingsService {
    /// Creates the service.
    #[must_use]
    pub fn new(store: Arc<dyn OptionStore>, tokens: TokenStore) -> Self {
        Self { store, tokens }
    }

    /// Loads the stored settings, or defaults when none are stored.
    ///
    /// # Errors
    /// Returns an error if the store cannot be read or holds a malformed record.
    pub async fn load(&self) -> Result<SalesforceSettings, StoreError> {
        let Some(value) = self.store.get(SETTINGS_KEY).await? else {
            return Ok(SalesforceSettings::default());
        };
        serde_json::from_value(value).map_err(|e| StoreError::InvalidValue {
            key: SETTINGS_KEY.to_string(),
            message: e.to_string(),
        })
    }

    /// Sanitizes and stores new settings, returning what was stored.
    ///
    /// # Errors
    /// Returns [`SettingsError::Locked`] while connected, or a storage error.
    pub async fn save(
        &self,
        settings: &SalesforceSettings,
    ) -> Result<SalesforceSettings, SettingsError> {
        if self.tokens.is_connected().await? {
            return Err(SettingsError::Locked);
        }
        let clean = settings.sanitized();
        let missing = clean.missing_fields();
        if !missing.is_empty() {
            tracing::warn!(?missing, "Saving Salesforce settings with empty fields");
        }
        self.store.set(SETTINGS_KEY, to_value(&clean)?).await?;
        tracing::info!(client_id = %clean.client_id, login_uri = %clean.effective_login_uri(), "Salesforce settings updated");
        Ok(clean)
    }

    /// Stores settings only if no settings record exists yet.
    ///
    /// Returns true if the record was written.
    ///
    /// # Errors
    /// Returns an error if the store cannot be read or written.
    pub async fn seed(&self, settings: &SalesforceSettings) -> Result<bool, StoreError> {
        let clean = settings.sanitized();
        let written = self.store.add(SETTINGS_KEY, to_value(&clean)?).await?;
        if written {
            tracing::debug!("Seeded Salesforce settings from configuration");
        }
        Ok(written)
    }

    /// Consumes the pending connection status and resolves the notice to show.
    ///
    /// # Errors
    /// Returns an error if the store cannot be read or written.
    pub async fn notice(&self, settings_updated: bool) -> Result<Option<StatusNotice>, StoreError> {
        let status = self.tokens.take_status().await?;
        let connected = self.tokens.is_connected().await?;
        Ok(StatusNotice::resolve(status, connected, settings_updated))
    }

    /// Returns true if the settings are currently read-only.
    ///
    /// # Errors
    /// Returns an error if the store cannot be read.
    pub async fn is_locked(&self) -> Result<bool, StoreError> {
        self.tokens.is_connected().await
    }
}

fn to_value(settings: &SalesforceSettings) -> Result<serde_json::Value, StoreError> {
    serde_json::to_value(settings).map_err(|e| StoreError::Serialization(e.to_string()))
}
