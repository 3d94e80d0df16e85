//! Salesforce session types

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// Credentials obtained from a successful authorization-code exchange.
///
/// There is exactly one of these per installation. Both fields are
/// guaranteed non-empty; use [`TokenState::from_parts`] when reading raw
/// stored values.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenState {
    /// The OAuth access token sent as `Authorization: OAuth <token>`.
    pub access_token: String,
    /// Base URL of the Salesforce instance serving REST calls.
    pub instance_url: String,
}

impl TokenState {
    /// Creates a token state, returning `None` if either field is empty.
    #[must_use]
    pub fn new(access_token: impl Into<String>, instance_url: impl Into<String>) -> Option<Self> {
        let access_token = access_token.into();
        let instance_url = instance_url.into();
        if access_token.is_empty() || instance_url.is_empty() {
            return None;
        }
        Some(Self {
            access_token,
            instance_url,
        })
    }

    /// Builds a token state from two optionally stored values.
    ///
    /// A missing or empty value on either side means "not connected".
    #[must_use]
    pub fn from_parts(access_token: Option<String>, instance_url: Option<String>) -> Option<Self> {
        Self::new(access_token?, instance_url?)
    }

    /// Returns the Authorization header value used by the REST API.
    #[must_use]
    pub fn authorization_header(&self) -> String {
        format!("OAuth {}", self.access_token)
    }

    /// Instance URL without a trailing slash, ready for path concatenation.
    #[must_use]
    pub fn base_url(&self) -> &str {
        self.instance_url.trim_end_matches('/')
    }
}

impl fmt::Debug for TokenState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenState")
            .field("access_token", &token_preview(&self.access_token))
            .field("instance_url", &self.instance_url)
            .finish()
    }
}

/// Connection status flag recorded for the next status read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionStatus {
    /// A token exchange just succeeded.
    Connected,
    /// The stored token state was just removed.
    Disconnected,
}

impl ConnectionStatus {
    /// Stored string form.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Connected => "connected",
            Self::Disconnected => "disconnected",
        }
    }
}

impl fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ConnectionStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "connected" => Ok(Self::Connected),
            "disconnected" => Ok(Self::Disconnected),
            other => Err(DomainError::UnknownConnectionStatus(other.to_string())),
        }
    }
}

/// One-shot notice shown on the next settings/status render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusNotice {
    /// OAuth handshake completed and a token state exists.
    ConnectionEstablished,
    /// The integration was disconnected.
    Disconnected,
    /// Settings were saved.
    SettingsUpdated,
}

impl StatusNotice {
    /// Resolves which notice to show.
    ///
    /// A `connected` flag only counts while a token state actually exists;
    /// otherwise it falls through to the settings-updated notice.
    #[must_use]
    pub const fn resolve(
        status: Option<ConnectionStatus>,
        is_connected: bool,
        settings_updated: bool,
    ) -> Option<Self> {
        match status {
            Some(ConnectionStatus::Connected) if is_connected => Some(Self::ConnectionEstablished),
            Some(ConnectionStatus::Disconnected) => Some(Self::Disconnected),
            _ if settings_updated => Some(Self::SettingsUpdated),
            _ => None,
        }
    }

    /// User-facing message.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::ConnectionEstablished => "Connection established.",
            Self::Disconnected => "Disconnected.",
            Self::SettingsUpdated => "Settings Updated.",
        }
    }
}

/// Short preview of a secret for logs (first 8 chars + ...).
#[must_use]
pub fn token_preview(token: &str) -> String {
    if token.chars().count() > 12 {
        let head: String = token.chars().take(8).collect();
        format!("{head}...")
    } else {
        "****".to_string()
    }
}
