//! lmsforce application layer - use cases and ports
//!
//! This crate defines the application layer with:
//! - Port traits (interfaces for the option store, HTTP, clock and LMS lookups)
//! - The Salesforce `OAuth2` client and token store
//! - The CRM REST client and enrollment sync
//! - Application-level error handling

pub mod auth;
pub mod crm;
pub mod error;
pub mod ports;
pub mod sync;
pub mod use_cases;

#[cfg(test)]
mod test_support;

pub use auth::{
    AuthorizationState, CallbackOutcome, CallbackParams, OAuthClient, OAuthError, TokenStore,
    build_authorize_url,
};
pub use crm::CrmClient;
pub use error::ApplicationError;
pub use ports::{
    Clock, CourseCatalog, DirectoryError, HttpClient, HttpClientError, OptionStore, StoreError,
    UserDirectory,
};
pub use sync::{
    ContactResolution, DispatchReport, EnrollmentDispatcher, EnrollmentSubscriber,
    EnrollmentSync, SkipReason, SyncOutcome,
};
pub use use_cases::{SettingsError, SettingsService, Uninstall};
