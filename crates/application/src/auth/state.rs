//! Authorization-code flow states.

use lmsforce_domain::{TokenState, token_preview};
use serde::Serialize;

/// Where the installation is in the authorization-code flow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum AuthorizationState {
    /// No token state stored.
    Unauthenticated,
    /// The administrator was sent to the Salesforce consent screen.
    AwaitingCode {
        /// The authorization URL the browser was redirected to.
        auth_url: String,
    },
    /// A token state is stored.
    Connected {
        /// Preview of the access token, never the full value.
        access_token_preview: String,
        /// Salesforce instance serving REST calls.
        instance_url: String,
    },
}

impl AuthorizationState {
    /// Derives the resting state from the stored token state.
    #[must_use]
    pub fn from_token(token: Option<&TokenState>) -> Self {
        token.map_or(Self::Unauthenticated, |t| Self::Connected {
            access_token_preview: token_preview(&t.access_token),
            instance_url: t.instance_url.clone(),
        })
    }

    /// Check if the flow is in progress.
    #[must_use]
    pub const fn is_in_progress(&self) -> bool {
        matches!(self, Self::AwaitingCode { .. })
    }

    /// URL the browser should be sent to, while awaiting a code.
    #[must_use]
    pub fn redirect_url(&self) -> Option<&str> {
        match self {
            Self::AwaitingCode { auth_url } => Some(auth_url),
            _ => None,
        }
    }

    /// Check if a token state is stored.
    #[must_use]
    pub const fn is_connected(&self) -> bool {
        matches!(self, Self::Connected { .. })
    }

    /// Get a user-friendly message.
    #[must_use]
    pub const fn message(&self) -> &str {
        match self {
            Self::Unauthenticated => "Not connected to Salesforce",
            Self::AwaitingCode { .. } => "Waiting for authorization in browser...",
            Self::Connected { .. } => "Connected to Salesforce",
        }
    }
}
