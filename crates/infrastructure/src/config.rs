//! Application configuration.
//!
//! Values come from an optional TOML file merged with `LMSFORCE__*`
//! environment variables, e.g. `LMSFORCE__SALESFORCE__CLIENT_ID`.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use lmsforce_domain::{DEFAULT_LOGIN_URI, SalesforceSettings};
use serde::Deserialize;

/// Config file read when `LMSFORCE_CONFIG` is not set.
pub const DEFAULT_CONFIG_FILE: &str = "lmsforce.toml";
/// Environment variable overriding the config file path.
pub const CONFIG_PATH_ENV: &str = "LMSFORCE_CONFIG";
/// Prefix of configuration environment variables.
pub const ENV_PREFIX: &str = "LMSFORCE";

/// Errors that can occur while loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The sources could not be read or did not match the expected shape.
    #[error("configuration error: {0}")]
    Load(#[from] ::config::ConfigError),

    /// `server.bind` is not a socket address.
    #[error("invalid bind address '{0}'")]
    InvalidBind(String),
}

/// HTTP listener settings.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Address to listen on, e.g. `127.0.0.1:8080`.
    pub bind: String,
    /// Bearer token required on the admin endpoints. Unset or empty locks
    /// them.
    #[serde(default)]
    pub admin_token: Option<String>,
}

impl ServerConfig {
    /// Configured admin token, ignoring blank values.
    #[must_use]
    pub fn admin_token(&self) -> Option<&str> {
        self.admin_token
            .as_deref()
            .map(str::trim)
            .filter(|token| !token.is_empty())
    }
}

/// Connected-app values used to seed the settings store.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SalesforceConfig {
    /// Connected app consumer key.
    #[serde(default)]
    pub client_id: String,
    /// Connected app consumer secret.
    #[serde(default)]
    pub client_secret: String,
    /// Login host.
    #[serde(default)]
    pub login_uri: String,
    /// Absolute callback URL registered on the connected app.
    pub callback_uri: String,
}

impl SalesforceConfig {
    /// Settings record built from these values.
    #[must_use]
    pub fn settings(&self) -> SalesforceSettings {
        SalesforceSettings::new(&self.client_id, &self.client_secret, &self.login_uri)
    }
}

/// Where options are persisted.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StorageConfig {
    /// JSON options file; in-memory storage when unset.
    #[serde(default)]
    pub options_path: Option<PathBuf>,
}

/// Where LMS users and courses are read from.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DirectoryConfig {
    /// JSON directory export; empty directory when unset.
    #[serde(default)]
    pub path: Option<PathBuf>,
}

/// Outbound HTTP settings.
#[derive(Debug, Clone, Deserialize)]
pub struct HttpConfig {
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
}

impl HttpConfig {
    /// Timeout as a [`Duration`].
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Top-level application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// HTTP listener.
    pub server: ServerConfig,
    /// Salesforce connected app.
    pub salesforce: SalesforceConfig,
    /// Option persistence.
    #[serde(default)]
    pub storage: StorageConfig,
    /// LMS directory.
    #[serde(default)]
    pub directory: DirectoryConfig,
    /// Outbound HTTP.
    pub http: HttpConfig,
}

impl AppConfig {
    /// Loads configuration from `LMSFORCE_CONFIG` (or `lmsforce.toml`) and
    /// the environment.
    ///
    /// # Errors
    /// Returns an error if a source cannot be parsed.
    pub fn load() -> Result<Self, ConfigError> {
        let path = std::env::var_os(CONFIG_PATH_ENV)
            .map_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE), PathBuf::from);
        Self::load_from(&path)
    }

    /// Loads configuration from a specific file (optional) and the environment.
    ///
    /// # Errors
    /// Returns an error if a source cannot be parsed.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let settings = ::config::Config::builder()
            .set_default("server.bind", "127.0.0.1:8080")?
            .set_default("salesforce.login_uri", DEFAULT_LOGIN_URI)?
            .set_default(
                "salesforce.callback_uri",
                "http://127.0.0.1:8080/salesforce/callback?sf=1",
            )?
            .set_default("http.timeout_secs", 30)?
            .add_source(::config::File::from(path).required(false))
            .add_source(
                ::config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__"),
            )
            .build()?;

        let config: Self = settings.try_deserialize()?;
        tracing::debug!(path = %path.display(), bind = %config.server.bind, "Configuration loaded");
        Ok(config)
    }

    /// Parsed listener address.
    ///
    /// # Errors
    /// Returns an error if `server.bind` is not a socket address.
    pub fn bind_addr(&self) -> Result<SocketAddr, ConfigError> {
        self.server
            .bind
            .parse()
            .map_err(|_| ConfigError::InvalidBind(self.server.bind.clone()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    #[test]
    fn test_defaults_without_file() {
        let dir = TempDir::new().unwrap();
        let config = AppConfig::load_from(&dir.path().join("absent.toml")).unwrap();

        assert_eq!(config.http.timeout(), Duration::from_secs(30));
        assert_eq!(config.salesforce.login_uri, DEFAULT_LOGIN_URI);
        assert!(config.storage.options_path.is_none());
        assert_eq!(config.server.admin_token(), None);
        assert!(config.bind_addr().is_ok());
    }

    #[test]
    fn test_file_values() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("lmsforce.toml");
        std::fs::write(
            &path,
            r#"
[server]
bind = "0.0.0.0:9000"
admin_token = " 9f2c-admin "

[salesforce]
client_id = "3MVG9id"
client_secret = "s3cret"
callback_uri = "https://lms.example.com/salesforce/callback?sf=1"

[storage]
options_path = "/var/lib/lmsforce/options.json"

[http]
timeout_secs = 10
"#,
        )
        .unwrap();

        let config = AppConfig::load_from(&path).unwrap();

        assert_eq!(config.bind_addr().unwrap().port(), 9000);
        assert_eq!(config.server.admin_token(), Some("9f2c-admin"));
        assert_eq!(config.salesforce.settings().client_id, "3MVG9id");
        assert_eq!(
            config.storage.options_path,
            Some(PathBuf::from("/var/lib/lmsforce/options.json"))
        );
        assert_eq!(config.http.timeout_secs, 10);
    }

    #[test]
    fn test_invalid_bind() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("lmsforce.toml");
        std::fs::write(&path, "[server]\nbind = \"nowhere\"\nadmin_token = \"  \"\n").unwrap();

        let config = AppConfig::load_from(&path).unwrap();
        assert!(matches!(config.bind_addr(), Err(ConfigError::InvalidBind(_))));
        assert_eq!(config.server.admin_token(), None);
    }
}
