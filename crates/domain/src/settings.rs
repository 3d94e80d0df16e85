//! Salesforce connection settings
//!
//! Settings are the three values an administrator enters (client id,
//! client secret, login URI). `Credentials` adds the callback URI the host
//! application serves and is what the OAuth flow consumes.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Login URI used when none is configured.
pub const DEFAULT_LOGIN_URI: &str = "https://login.salesforce.com";

#[allow(clippy::expect_used)]
static TAGS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]*>?").expect("valid regex"));
#[allow(clippy::expect_used)]
static OCTETS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"%[a-fA-F0-9]{2}").expect("valid regex"));
#[allow(clippy::expect_used)]
static WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\r\n\t ]+").expect("valid regex"));

/// Sanitizes a single settings value as plain text.
///
/// Strips markup, percent-encoded octets and control characters, collapses
/// runs of whitespace (including line breaks) and trims the result.
#[must_use]
pub fn sanitize_text_field(input: &str) -> String {
    let without_tags = TAGS.replace_all(input, "");
    let without_octets = OCTETS.replace_all(&without_tags, "");
    let printable: String = without_octets
        .chars()
        .filter(|c| !c.is_control() || matches!(c, '\r' | '\n' | '\t'))
        .collect();
    WHITESPACE.replace_all(&printable, " ").trim().to_string()
}

/// Administrator-supplied Salesforce connected-app settings.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct SalesforceSettings {
    /// Connected app consumer key.
    #[serde(default)]
    pub client_id: String,
    /// Connected app consumer secret.
    #[serde(default)]
    pub client_secret: String,
    /// Login host, e.g. `https://login.salesforce.com` or a My Domain URL.
    #[serde(default)]
    pub login_uri: String,
}

impl SalesforceSettings {
    /// Creates settings from raw values.
    #[must_use]
    pub fn new(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        login_uri: impl Into<String>,
    ) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            login_uri: login_uri.into(),
        }
    }

    /// Returns a copy with every field sanitized as plain text.
    #[must_use]
    pub fn sanitized(&self) -> Self {
        Self {
            client_id: sanitize_text_field(&self.client_id),
            client_secret: sanitize_text_field(&self.client_secret),
            login_uri: sanitize_text_field(&self.login_uri),
        }
    }

    /// Login URI, falling back to [`DEFAULT_LOGIN_URI`] when blank.
    #[must_use]
    pub fn effective_login_uri(&self) -> &str {
        let trimmed = self.login_uri.trim();
        if trimmed.is_empty() {
            DEFAULT_LOGIN_URI
        } else {
            trimmed
        }
    }

    /// Names of fields that are still empty.
    ///
    /// Empty fields are not rejected; the OAuth calls will fail downstream.
    #[must_use]
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.client_id.trim().is_empty() {
            missing.push("client_id");
        }
        if self.client_secret.trim().is_empty() {
            missing.push("client_secret");
        }
        missing
    }

    /// Combines these settings with the host callback URI.
    #[must_use]
    pub fn credentials(&self, callback_uri: impl Into<String>) -> Credentials {
        Credentials {
            client_id: self.client_id.clone(),
            client_secret: self.client_secret.clone(),
            login_uri: self.effective_login_uri().trim_end_matches('/').to_string(),
            callback_uri: callback_uri.into(),
        }
    }
}

impl std::fmt::Debug for SalesforceSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SalesforceSettings")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("login_uri", &self.login_uri)
            .finish()
    }
}

/// Everything the OAuth flow needs; immutable for the life of a request.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    /// Connected app consumer key.
    pub client_id: String,
    /// Connected app consumer secret.
    pub client_secret: String,
    /// Login host without trailing slash.
    pub login_uri: String,
    /// Absolute URL Salesforce redirects back to after consent.
    pub callback_uri: String,
}

impl Credentials {
    /// `{login_uri}/services/oauth2/authorize`
    #[must_use]
    pub fn authorize_endpoint(&self) -> String {
        format!("{}/services/oauth2/authorize", self.login_uri)
    }

    /// `{login_uri}/services/oauth2/token`
    #[must_use]
    pub fn token_endpoint(&self) -> String {
        format!("{}/services/oauth2/token", self.login_uri)
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("login_uri", &self.login_uri)
            .field("callback_uri", &self.callback_uri)
            .finish()
    }
}
