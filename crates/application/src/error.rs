//! Application error types

use thiserror::Error;

use crate::auth::OAuthError;
use crate::ports::StoreError;
use crate::use_cases::SettingsError;

/// Application-level errors.
#[derive(Debug, Error)]
pub enum ApplicationError {
    /// The authorization-code flow failed.
    #[error(transparent)]
    OAuth(#[from] OAuthError),

    /// Settings could not be read or written.
    #[error(transparent)]
    Settings(#[from] SettingsError),

    /// An option store operation failed.
    #[error("storage error: {0}")]
    Storage(#[from] StoreError),
}
