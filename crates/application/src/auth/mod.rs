//! Salesforce authentication.
//!
//! This module provides:
//! - Persistent token storage with a one-shot connection status flag
//! - The `OAuth2` authorization-code client
//! - Flow state reporting

mod oauth_client;
mod state;
mod token_store;

pub use oauth_client::{
    CallbackOutcome, CallbackParams, OAuthClient, OAuthError, build_authorize_url,
    strip_query_param,
};
pub use state::AuthorizationState;
pub use token_store::{
    ACCESS_TOKEN_KEY, CONNECTION_STATUS_KEY, CONNECTION_STATUS_TTL, INSTANCE_URL_KEY, TokenStore,
};
