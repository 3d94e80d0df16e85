//! Shared router state and startup wiring.

use std::sync::Arc;

use lmsforce_application::{
    CourseCatalog, DirectoryError, EnrollmentDispatcher, EnrollmentSync, HttpClient,
    HttpClientError, OAuthClient, OptionStore, SettingsService, StoreError, TokenStore,
    Uninstall, UserDirectory,
};
use lmsforce_infrastructure::{
    AppConfig, ConfigError, InMemoryOptionStore, JsonDirectory, JsonFileOptionStore,
    ReqwestHttpClient,
};

/// Errors that can occur while building the application state.
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    /// Configuration could not be loaded.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The option store could not be opened or seeded.
    #[error("option store: {0}")]
    Store(#[from] StoreError),

    /// The LMS directory could not be loaded.
    #[error("directory: {0}")]
    Directory(#[from] DirectoryError),

    /// The HTTP client could not be built.
    #[error("http client: {0}")]
    Http(#[from] HttpClientError),
}

/// Everything the handlers need, built once at startup.
#[derive(Clone)]
pub struct AppState {
    /// Option persistence.
    pub store: Arc<dyn OptionStore>,
    /// Outbound HTTP.
    pub http: Arc<dyn HttpClient>,
    /// Salesforce session storage.
    pub tokens: TokenStore,
    /// Connected-app settings.
    pub settings: SettingsService,
    /// Enrollment event fan-out.
    pub dispatcher: Arc<EnrollmentDispatcher>,
    /// Absolute URL Salesforce redirects back to.
    pub callback_uri: String,
    /// Bearer token for the admin endpoints; `None` locks them.
    pub admin_token: Option<String>,
}

impl AppState {
    /// Wires the services over the given ports and registers the Salesforce
    /// enrollment subscriber.
    #[tracing::instrument(level = "debug", skip_all)]
    pub fn new(
        store: Arc<dyn OptionStore>,
        http: Arc<dyn HttpClient>,
        users: Arc<dyn UserDirectory>,
        courses: Arc<dyn CourseCatalog>,
        callback_uri: impl Into<String>,
    ) -> Self {
        let tokens = TokenStore::new(store.clone());
        let settings = SettingsService::new(store.clone(), tokens.clone());

        let mut dispatcher = EnrollmentDispatcher::new();
        dispatcher.register(Arc::new(EnrollmentSync::new(
            http.clone(),
            tokens.clone(),
            users,
            courses,
        )));

        Self {
            store,
            http,
            tokens,
            settings,
            dispatcher: Arc::new(dispatcher),
            callback_uri: callback_uri.into(),
            admin_token: None,
        }
    }

    /// Sets the bearer token the admin endpoints require.
    #[must_use]
    pub fn with_admin_token(mut self, token: impl Into<String>) -> Self {
        self.admin_token = Some(token.into());
        self
    }

    /// Builds the production state from configuration.
    ///
    /// Configured Salesforce values seed the settings record only when none
    /// exists yet.
    ///
    /// # Errors
    /// Returns an error if any adapter cannot be created.
    pub async fn from_config(config: &AppConfig) -> Result<Self, StartupError> {
        let store: Arc<dyn OptionStore> = match &config.storage.options_path {
            Some(path) => Arc::new(JsonFileOptionStore::open(path).await?),
            None => {
                tracing::warn!("No options_path configured; settings and tokens are kept in memory");
                Arc::new(InMemoryOptionStore::new())
            }
        };
        let directory = match &config.directory.path {
            Some(path) => JsonDirectory::load(path).await?,
            None => {
                tracing::warn!("No directory path configured; every enrollment will be skipped");
                JsonDirectory::default()
            }
        };
        let directory = Arc::new(directory);
        let http = Arc::new(ReqwestHttpClient::new(config.http.timeout())?);

        let mut state = Self::new(
            store,
            http,
            directory.clone(),
            directory,
            config.salesforce.callback_uri.clone(),
        );
        match config.server.admin_token() {
            Some(token) => state = state.with_admin_token(token),
            None => tracing::warn!("No server.admin_token configured; admin endpoints are locked"),
        }

        state.settings.seed(&config.salesforce.settings()).await?;
        let missing = state.settings.load().await?.missing_fields();
        if !missing.is_empty() {
            tracing::warn!(?missing, "Salesforce settings are incomplete; authorization will fail");
        }
        Ok(state)
    }

    /// OAuth client for the currently stored settings.
    ///
    /// # Errors
    /// Returns an error if the settings cannot be read.
    pub async fn oauth_client(&self) -> Result<OAuthClient, StoreError> {
        let settings = self.settings.load().await?;
        Ok(OAuthClient::new(
            settings.credentials(&self.callback_uri),
            self.http.clone(),
            self.tokens.clone(),
        ))
    }

    /// Uninstall use case over this state's store.
    #[must_use]
    pub fn uninstall(&self) -> Uninstall {
        Uninstall::new(self.store.clone(), self.tokens.clone())
    }
}
