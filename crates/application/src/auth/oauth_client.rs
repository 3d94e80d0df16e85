//! Salesforce `OAuth2` authorization-code client.
//!
//! Builds the consent redirect, handles the callback and exchanges the code
//! for an access token and instance URL. Refresh tokens are not used; a
//! revoked session is fixed by reconnecting.

use std::sync::Arc;

use lmsforce_domain::{ConnectionStatus, Credentials, HttpRequest, TokenState, token_preview};
use serde::Deserialize;
use url::form_urlencoded;

use super::state::AuthorizationState;
use super::token_store::TokenStore;
use crate::ports::{HttpClient, StoreError};

/// Content-Type for form-urlencoded data.
const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Errors raised by the authorization-code flow. All of them are fatal for
/// the request that triggered them.
#[derive(Debug, thiserror::Error)]
pub enum OAuthError {
    /// The token endpoint did not answer 200.
    #[error(
        "Error - unable to retrieve access token. URL: {url}, status: {status}, response: {body}, transport error: {transport_error}"
    )]
    TokenRequestFailed {
        /// Token endpoint URL.
        url: String,
        /// HTTP status, 0 when no response was received.
        status: u16,
        /// Raw response body.
        body: String,
        /// Transport error detail, empty when a response was received.
        transport_error: String,
    },

    /// The token response had no usable `access_token`.
    #[error("Error - access token missing from response!")]
    MissingAccessToken,

    /// The token response had no usable `instance_url`.
    #[error("Error - instance URL missing from response!")]
    MissingInstanceUrl,

    /// The token request body could not be encoded.
    #[error("Failed to encode form: {0}")]
    Encoding(String),

    /// The token state could not be persisted.
    #[error("storage error: {0}")]
    Store(#[from] StoreError),
}

/// Token endpoint response fields this client reads.
#[derive(Debug, Default, Deserialize)]
struct TokenResponse {
    #[serde(default)]
    access_token: Option<String>,
    #[serde(default)]
    instance_url: Option<String>,
}

/// Query parameters of the OAuth callback request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct CallbackParams {
    /// Marker identifying the callback as ours.
    #[serde(default)]
    pub sf: Option<String>,
    /// Authorization code issued by Salesforce.
    #[serde(default)]
    pub code: Option<String>,
}

impl CallbackParams {
    /// Returns the authorization code if this is our callback.
    ///
    /// Both `sf` and `code` must be present and non-empty; `"0"` counts as
    /// empty.
    #[must_use]
    pub fn authorization_code(&self) -> Option<&str> {
        fn filled(value: Option<&str>) -> Option<&str> {
            value.filter(|s| !s.is_empty() && *s != "0")
        }
        filled(self.sf.as_deref())?;
        filled(self.code.as_deref())
    }
}

/// Result of handling a callback request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallbackOutcome {
    /// The request did not carry both `sf` and `code`; nothing was done.
    NotOurCallback,
    /// Tokens were stored; the caller should redirect to `redirect_to`.
    Connected {
        /// Current URL with the `code` parameter removed.
        redirect_to: String,
    },
}

/// Builds `{login_uri}/services/oauth2/authorize?response_type=code&client_id=..&redirect_uri=..`.
#[must_use]
pub fn build_authorize_url(credentials: &Credentials) -> String {
    let client_id: String = form_urlencoded::byte_serialize(credentials.client_id.as_bytes()).collect();
    let redirect_uri: String =
        form_urlencoded::byte_serialize(credentials.callback_uri.as_bytes()).collect();
    format!(
        "{}?response_type=code&client_id={client_id}&redirect_uri={redirect_uri}",
        credentials.authorize_endpoint()
    )
}

/// Removes every occurrence of a query parameter from a URL.
///
/// The remaining query segments and any fragment are kept byte-for-byte.
#[must_use]
pub fn strip_query_param(target: &str, name: &str) -> String {
    let (head, fragment) = match target.split_once('#') {
        Some((head, fragment)) => (head, Some(fragment)),
        None => (target, None),
    };
    let Some((base, query)) = head.split_once('?') else {
        return target.to_string();
    };

    let kept: Vec<&str> = query
        .split('&')
        .filter(|segment| !segment.is_empty())
        .filter(|segment| {
            form_urlencoded::parse(segment.as_bytes())
                .next()
                .is_none_or(|(key, _)| key != name)
        })
        .collect();

    let mut stripped = base.to_string();
    if !kept.is_empty() {
        stripped.push('?');
        stripped.push_str(&kept.join("&"));
    }
    if let Some(fragment) = fragment {
        stripped.push('#');
        stripped.push_str(fragment);
    }
    stripped
}

/// Client for the Salesforce authorization-code grant.
pub struct OAuthClient {
    credentials: Credentials,
    http: Arc<dyn HttpClient>,
    tokens: TokenStore,
}

impl OAuthClient {
    /// Creates a client for the given connected-app credentials.
    #[must_use]
    pub fn new(credentials: Credentials, http: Arc<dyn HttpClient>, tokens: TokenStore) -> Self {
        Self {
            credentials,
            http,
            tokens,
        }
    }

    /// Credentials this client was built with.
    #[must_use]
    pub const fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    /// Starts the flow: returns the state holding the consent URL the
    /// caller must redirect to with a 301.
    #[must_use]
    pub fn authorize(&self) -> AuthorizationState {
        if self.credentials.client_id.is_empty() || self.credentials.client_secret.is_empty() {
            tracing::warn!("Salesforce client id or secret is empty; authorization will fail");
        }
        let auth_url = build_authorize_url(&self.credentials);
        tracing::info!(login_uri = %self.credentials.login_uri, "Redirecting to Salesforce consent screen");
        AuthorizationState::AwaitingCode { auth_url }
    }

    /// Current resting state derived from the token store.
    ///
    /// # Errors
    /// Returns an error if the token store cannot be read.
    pub async fn state(&self) -> Result<AuthorizationState, StoreError> {
        let token = self.tokens.get().await?;
        Ok(AuthorizationState::from_token(token.as_ref()))
    }

    /// Handles the OAuth callback request.
    ///
    /// `current_url` is the URL the callback was served on; the returned
    /// redirect is that URL minus `code`, or the configured callback URI
    /// when it is not known.
    ///
    /// # Errors
    /// Returns an error if the exchange fails or the tokens cannot be stored.
    #[tracing::instrument(level = "debug", skip_all)]
    pub async fn handle_callback(
        &self,
        params: &CallbackParams,
        current_url: Option<&str>,
    ) -> Result<CallbackOutcome, OAuthError> {
        let Some(code) = params.authorization_code() else {
            tracing::debug!("Ignoring request without sf and code parameters");
            return Ok(CallbackOutcome::NotOurCallback);
        };

        let token = self.exchange_code(code).await?;
        self.tokens.save(&token).await?;
        self.tokens.record_status(ConnectionStatus::Connected).await?;
        tracing::info!(
            access_token = %token_preview(&token.access_token),
            instance_url = %token.instance_url,
            "Connected to Salesforce"
        );

        let current = current_url.unwrap_or(&self.credentials.callback_uri);
        Ok(CallbackOutcome::Connected {
            redirect_to: strip_query_param(current, "code"),
        })
    }

    /// Exchanges an authorization code for a token state without storing it.
    ///
    /// # Errors
    /// Returns an error on transport failure, any status other than 200, or
    /// a response missing `access_token` or `instance_url`.
    pub async fn exchange_code(&self, code: &str) -> Result<TokenState, OAuthError> {
        let url = self.credentials.token_endpoint();
        let params = [
            ("code", code),
            ("grant_type", "authorization_code"),
            ("client_id", self.credentials.client_id.as_str()),
            ("client_secret", self.credentials.client_secret.as_str()),
            ("redirect_uri", self.credentials.callback_uri.as_str()),
        ];
        let body =
            serde_urlencoded::to_string(params).map_err(|e| OAuthError::Encoding(e.to_string()))?;

        let request = HttpRequest::post(&url)
            .with_header("Content-Type", FORM_CONTENT_TYPE)
            .with_body(body);

        tracing::debug!(%url, "Requesting Salesforce access token");
        let response = match self.http.execute(request).await {
            Ok(response) => response,
            Err(e) => {
                tracing::error!(%url, code = e.code(), error = %e, "Token request failed");
                return Err(OAuthError::TokenRequestFailed {
                    url,
                    status: 0,
                    body: String::new(),
                    transport_error: e.to_string(),
                });
            }
        };

        if response.status != 200 {
            tracing::error!(%url, status = response.status, "Token endpoint rejected the code");
            return Err(OAuthError::TokenRequestFailed {
                url,
                status: response.status,
                body: response.body,
                transport_error: String::new(),
            });
        }

        let parsed: TokenResponse = serde_json::from_str(&response.body).unwrap_or_default();
        let access_token = parsed
            .access_token
            .filter(|t| !t.is_empty())
            .ok_or(OAuthError::MissingAccessToken)?;
        let instance_url = parsed
            .instance_url
            .filter(|u| !u.is_empty())
            .ok_or(OAuthError::MissingInstanceUrl)?;

        TokenState::new(access_token, instance_url).ok_or(OAuthError::MissingAccessToken)
    }

    /// Removes the stored token state.
    ///
    /// Returns whether a connection existed.
    ///
    /// # Errors
    /// Returns an error if the token store cannot be read or written.
    pub async fn disconnect(&self) -> Result<bool, StoreError> {
        let was_connected = self.tokens.clear().await?;
        if was_connected {
            tracing::info!("Disconnected from Salesforce");
        }
        Ok(was_connected)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::auth::token_store::{ACCESS_TOKEN_KEY, CONNECTION_STATUS_KEY, INSTANCE_URL_KEY};
    use crate::ports::HttpClientError;
    use crate::test_support::{MemoryStore, MockHttpClient};
    use lmsforce_domain::{HttpMethod, SalesforceSettings};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    const CALLBACK: &str = "https://lms.example.com/wp-admin/admin.php?page=learndash-salesforce-settings&sf=1";

    fn credentials() -> Credentials {
        SalesforceSettings::new("3MVG9id", "s3cret", "https://login.salesforce.com")
            .credentials(CALLBACK)
    }

    fn client(http: MockHttpClient) -> (OAuthClient, Arc<MemoryStore>, Arc<MockHttpClient>) {
        let store = Arc::new(MemoryStore::new());
        let http = Arc::new(http);
        let client = OAuthClient::new(credentials(), http.clone(), TokenStore::new(store.clone()));
        (client, store, http)
    }

    fn callback(code: &str) -> CallbackParams {
        CallbackParams {
            sf: Some("1".to_string()),
            code: Some(code.to_string()),
        }
    }

    #[test]
    fn test_authorize_url_round_trips_redirect_uri() {
        let url = build_authorize_url(&credentials());
        assert!(url.starts_with(
            "https://login.salesforce.com/services/oauth2/authorize?response_type=code&client_id=3MVG9id&redirect_uri="
        ));

        let parsed = url::Url::parse(&url).unwrap();
        let redirect = parsed
            .query_pairs()
            .find(|(k, _)| k == "redirect_uri")
            .map(|(_, v)| v.into_owned());
        assert_eq!(redirect.as_deref(), Some(CALLBACK));
    }

    #[test]
    fn test_authorize_returns_awaiting_code() {
        let (client, _, _) = client(MockHttpClient::new());
        let state = client.authorize();
        assert!(state.is_in_progress());
        assert!(matches!(state, AuthorizationState::AwaitingCode { auth_url } if auth_url.contains("response_type=code")));
    }

    #[test]
    fn test_callback_params_require_both_markers() {
        assert_eq!(callback("abc").authorization_code(), Some("abc"));
        assert_eq!(CallbackParams::default().authorization_code(), None);
        assert_eq!(
            CallbackParams {
                sf: None,
                code: Some("abc".to_string())
            }
            .authorization_code(),
            None
        );
        assert_eq!(callback("").authorization_code(), None);
        assert_eq!(callback("0").authorization_code(), None);
    }

    #[test]
    fn test_strip_query_param() {
        assert_eq!(
            strip_query_param("https://lms.example.com/cb?page=x&sf=1&code=abc", "code"),
            "https://lms.example.com/cb?page=x&sf=1"
        );
        assert_eq!(
            strip_query_param("/salesforce/callback?sf=1&code=abc", "code"),
            "/salesforce/callback?sf=1"
        );
        assert_eq!(
            strip_query_param("https://lms.example.com/cb?code=abc", "code"),
            "https://lms.example.com/cb"
        );
    }

    #[test]
    fn test_strip_query_param_keeps_other_segments_verbatim() {
        assert_eq!(
            strip_query_param(
                "/salesforce/callback?sf=1&next=a%20b&code=abc&tag=x+y#top",
                "code"
            ),
            "/salesforce/callback?sf=1&next=a%20b&tag=x+y#top"
        );
        assert_eq!(
            strip_query_param("/salesforce/callback?sf=1&c%6Fde=abc", "code"),
            "/salesforce/callback?sf=1"
        );
        assert_eq!(strip_query_param("/salesforce/callback", "code"), "/salesforce/callback");
    }

    #[tokio::test]
    async fn test_callback_success_stores_tokens() {
        let (client, store, http) = client(MockHttpClient::new().respond(
            200,
            r#"{"access_token":"T","instance_url":"https://na1.salesforce.com","token_type":"Bearer"}"#,
        ));

        let outcome = client
            .handle_callback(&callback("abc"), Some("/salesforce/callback?sf=1&code=abc"))
            .await
            .unwrap();

        assert_eq!(
            outcome,
            CallbackOutcome::Connected {
                redirect_to: "/salesforce/callback?sf=1".to_string()
            }
        );
        assert_eq!(store.option(ACCESS_TOKEN_KEY), Some(json!("T")));
        assert_eq!(
            store.option(INSTANCE_URL_KEY),
            Some(json!("https://na1.salesforce.com"))
        );
        assert_eq!(store.transient(CONNECTION_STATUS_KEY), Some(json!("connected")));

        let requests = http.requests();
        assert_eq!(requests.len(), 1);
        let request = &requests[0];
        assert_eq!(request.method, HttpMethod::Post);
        assert_eq!(request.url, "https://login.salesforce.com/services/oauth2/token");
        assert_eq!(request.header("Content-Type"), Some(FORM_CONTENT_TYPE));
        let form: Vec<(String, String)> =
            serde_urlencoded::from_str(request.body.as_deref().unwrap()).unwrap();
        assert_eq!(
            form,
            vec![
                ("code".to_string(), "abc".to_string()),
                ("grant_type".to_string(), "authorization_code".to_string()),
                ("client_id".to_string(), "3MVG9id".to_string()),
                ("client_secret".to_string(), "s3cret".to_string()),
                ("redirect_uri".to_string(), CALLBACK.to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_callback_redirect_falls_back_to_callback_uri() {
        let (client, _, _) = client(MockHttpClient::new().respond(
            200,
            r#"{"access_token":"T","instance_url":"https://na1.salesforce.com"}"#,
        ));
        let outcome = client.handle_callback(&callback("abc"), None).await.unwrap();
        assert_eq!(
            outcome,
            CallbackOutcome::Connected {
                redirect_to: CALLBACK.to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_callback_without_markers_sends_nothing() {
        let (client, store, http) = client(MockHttpClient::new());
        let outcome = client
            .handle_callback(&CallbackParams::default(), None)
            .await
            .unwrap();
        assert_eq!(outcome, CallbackOutcome::NotOurCallback);
        assert!(http.requests().is_empty());
        assert_eq!(store.writes(), 0);
    }

    #[tokio::test]
    async fn test_non_200_is_fatal_with_diagnostics() {
        let (client, store, _) = client(
            MockHttpClient::new().respond(500, r#"{"error":"invalid_grant"}"#),
        );
        let err = client
            .handle_callback(&callback("abc"), None)
            .await
            .unwrap_err();

        match &err {
            OAuthError::TokenRequestFailed { url, status, body, .. } => {
                assert_eq!(url, "https://login.salesforce.com/services/oauth2/token");
                assert_eq!(*status, 500);
                assert_eq!(body, r#"{"error":"invalid_grant"}"#);
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(err.to_string().contains("invalid_grant"));
        assert_eq!(store.writes(), 0);
    }

    #[tokio::test]
    async fn test_transport_failure_is_fatal() {
        let (client, store, _) = client(
            MockHttpClient::new().fail(HttpClientError::ConnectionFailed("reset".to_string())),
        );
        let err = client.exchange_code("abc").await.unwrap_err();
        assert!(matches!(
            err,
            OAuthError::TokenRequestFailed { status: 0, ref transport_error, .. } if transport_error.contains("reset")
        ));
        assert_eq!(store.writes(), 0);
    }

    #[tokio::test]
    async fn test_missing_fields_are_distinct_errors() {
        let (client, store, _) = client(
            MockHttpClient::new()
                .respond(200, r#"{"instance_url":"https://na1.salesforce.com"}"#)
                .respond(200, r#"{"access_token":"T"}"#)
                .respond(200, "<html>not json</html>")
                .respond(200, r#"{"access_token":"","instance_url":"u"}"#),
        );

        let err = client.handle_callback(&callback("a"), None).await.unwrap_err();
        assert_eq!(err.to_string(), "Error - access token missing from response!");

        let err = client.handle_callback(&callback("b"), None).await.unwrap_err();
        assert_eq!(err.to_string(), "Error - instance URL missing from response!");

        let err = client.handle_callback(&callback("c"), None).await.unwrap_err();
        assert!(matches!(err, OAuthError::MissingAccessToken));

        let err = client.handle_callback(&callback("d"), None).await.unwrap_err();
        assert!(matches!(err, OAuthError::MissingAccessToken));

        assert_eq!(store.writes(), 0);
    }

    #[tokio::test]
    async fn test_disconnect() {
        let (client, store, _) = client(MockHttpClient::new());
        assert!(!client.disconnect().await.unwrap());
        assert_eq!(store.writes(), 0);

        TokenStore::new(store.clone())
            .save(&TokenState::new("T", "U").unwrap())
            .await
            .unwrap();
        assert!(client.state().await.unwrap().is_connected());

        assert!(client.disconnect().await.unwrap());
        assert_eq!(store.option(ACCESS_TOKEN_KEY), None);
        assert_eq!(
            store.transient(CONNECTION_STATUS_KEY),
            Some(json!("disconnected"))
        );
        assert_eq!(
            client.state().await.unwrap(),
            AuthorizationState::Unauthenticated
        );
    }
}
