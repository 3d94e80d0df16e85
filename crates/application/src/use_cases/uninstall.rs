//! Uninstall use case.

use std::sync::Arc;

use crate::auth::TokenStore;
use crate::ports::{OptionStore, StoreError};

use super::settings::SETTINGS_KEY;

/// Removes everything the integration has stored.
pub struct Uninstall {
    store: Arc<dyn OptionStore>,
    tokens: TokenStore,
}

impl Uninstall {
    /// Creates the use case.
    #[must_use]
    pub fn new(store: Arc<dyn OptionStore>, tokens: TokenStore) -> Self {
        Self { store, tokens }
    }

    /// Deletes the settings record, the token state and the status flag.
    ///
    /// # Errors
    /// Returns an error if the option store cannot be written.
    pub async fn execute(&self) -> Result<(), StoreError> {
        self.store.delete(SETTINGS_KEY).await?;
        self.tokens.purge().await?;
        tracing::info!("Removed all Salesforce integration data");
        Ok(())
    }
}
