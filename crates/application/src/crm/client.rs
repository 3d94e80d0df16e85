//! Authenticated Salesforce REST client.
//!
//! Every operation is best-effort: failures are logged and reported as
//! `None`, never as errors.

use std::sync::Arc;

use lmsforce_domain::{
    CrmContact, HttpRequest, ObjectType, SObjectProperties, TokenState, token_preview,
};
use serde::Deserialize;
use serde_json::Value;
use url::form_urlencoded;

use crate::auth::TokenStore;
use crate::ports::{HttpClient, StoreError};

/// REST API version used for search.
const SEARCH_API_VERSION: &str = "v37.0";
/// REST API version used for sObject creation.
const SOBJECTS_API_VERSION: &str = "v20.0";
/// Content-Type for JSON bodies.
const JSON_CONTENT_TYPE: &str = "application/json";

#[derive(Debug, Default, Deserialize)]
struct SearchResponse {
    #[serde(rename = "searchRecords", default)]
    search_records: Vec<Value>,
}

#[derive(Debug, Default, Deserialize)]
struct CreateResponse {
    #[serde(default)]
    id: Option<String>,
}

/// REST wrapper bound to the token state read at construction.
pub struct CrmClient {
    http: Arc<dyn HttpClient>,
    session: Option<TokenState>,
}

impl CrmClient {
    /// Creates a client for an explicit session. `None` means not connected.
    #[must_use]
    pub fn new(http: Arc<dyn HttpClient>, session: Option<TokenState>) -> Self {
        Self { http, session }
    }

    /// Creates a client from whatever token state is currently stored.
    ///
    /// # Errors
    /// Returns an error if the token store cannot be read.
    pub async fn from_store(
        http: Arc<dyn HttpClient>,
        tokens: &TokenStore,
    ) -> Result<Self, StoreError> {
        Ok(Self::new(http, tokens.get().await?))
    }

    /// Returns true if the client holds a token state.
    #[must_use]
    pub const fn is_connected(&self) -> bool {
        self.session.is_some()
    }

    fn session(&self, operation: &str) -> Option<&TokenState> {
        if self.session.is_none() {
            tracing::warn!(operation, "Salesforce is not connected; skipping call");
        }
        self.session.as_ref()
    }

    /// Finds the first Contact matching an email address.
    ///
    /// Transport errors, malformed bodies and results without a Contact all
    /// read as `None`.
    #[tracing::instrument(level = "debug", skip_all)]
    pub async fn find_contact(&self, email: &str) -> Option<CrmContact> {
        let session = self.session("find_contact")?;
        let query: String =
            form_urlencoded::byte_serialize(format!("FIND{{{email}}}").as_bytes()).collect();
        let url = format!(
            "{}/services/data/{SEARCH_API_VERSION}/search/?q={query}",
            session.base_url()
        );
        let request =
            HttpRequest::get(url).with_header("Authorization", session.authorization_header());

        let response = match self.http.execute(request).await {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(code = e.code(), error = %e, "Contact search failed");
                return None;
            }
        };

        let parsed: SearchResponse = serde_json::from_str(&response.body).unwrap_or_default();
        let contact = parsed
            .search_records
            .into_iter()
            .filter(CrmContact::is_contact_record)
            .find_map(|record| serde_json::from_value::<CrmContact>(record).ok());

        tracing::debug!(
            status = response.status,
            found = contact.is_some(),
            "Contact search completed"
        );
        contact
    }

    /// Creates an sObject and returns its id.
    ///
    /// Only a 201 response counts as success.
    #[tracing::instrument(level = "debug", skip_all, fields(object_type = %object_type))]
    pub async fn create_object(
        &self,
        object_type: ObjectType,
        properties: SObjectProperties,
    ) -> Option<String> {
        let session = self.session("create_object")?;
        let url = format!(
            "{}/services/data/{SOBJECTS_API_VERSION}/sobjects/{}/",
            session.base_url(),
            object_type.api_name()
        );
        let body = match serde_json::to_string(&properties) {
            Ok(body) => body,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to encode sObject body");
                return None;
            }
        };
        let request = HttpRequest::post(url)
            .with_header("Content-type", JSON_CONTENT_TYPE)
            .with_header("Authorization", session.authorization_header())
            .with_body(body);

        let response = match self.http.execute(request).await {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(code = e.code(), error = %e, "sObject create failed");
                return None;
            }
        };

        if response.status != 201 {
            tracing::warn!(status = response.status, body = %response.body, "sObject create rejected");
            return None;
        }

        let id = serde_json::from_str::<CreateResponse>(&response.body)
            .ok()
            .and_then(|r| r.id)
            .filter(|id| !id.is_empty());
        if id.is_none() {
            tracing::warn!("sObject create response had no id");
        } else {
            tracing::debug!(
                access_token = %token_preview(&session.access_token),
                "sObject created"
            );
        }
        id
    }

    /// Creates an Account.
    pub async fn create_account(&self, properties: SObjectProperties) -> Option<String> {
        self.create_object(ObjectType::Account, properties).await
    }

    /// Creates a Contact.
    pub async fn create_contact(&self, properties: SObjectProperties) -> Option<String> {
        self.create_object(ObjectType::Contact, properties).await
    }

    /// Creates a Contract.
    pub async fn create_contract(&self, properties: SObjectProperties) -> Option<String> {
        self.create_object(ObjectType::Contract, properties).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::ports::HttpClientError;
    use crate::test_support::{MemoryStore, MockHttpClient};
    use lmsforce_domain::HttpMethod;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn connected(http: MockHttpClient) -> (CrmClient, Arc<MockHttpClient>) {
        let http = Arc::new(http);
        let session = TokenState::new("T0K", "https://na1.salesforce.com/");
        (CrmClient::new(http.clone(), session), http)
    }

    fn props(value: Value) -> SObjectProperties {
        match value {
            Value::Object(map) => map,
            other => panic!("not an object: {other}"),
        }
    }

    #[tokio::test]
    async fn test_find_contact_request_shape() {
        let (client, http) = connected(MockHttpClient::new().respond(200, r#"{"searchRecords":[]}"#));

        assert_eq!(client.find_contact("a+b@x.com").await, None);

        let request = &http.requests()[0];
        assert_eq!(request.method, HttpMethod::Get);
        assert_eq!(
            request.url,
            "https://na1.salesforce.com/services/data/v37.0/search/?q=FIND%7Ba%2Bb%40x.com%7D"
        );
        assert_eq!(request.header("Authorization"), Some("OAuth T0K"));
    }

    #[tokio::test]
    async fn test_find_contact_returns_first_contact_record() {
        let body = json!({
            "searchRecords": [
                {"attributes": {"type": "Account"}, "Id": "001A"},
                {"attributes": {"type": "Contact"}, "Id": "003A", "Email": "a@b.com"},
                {"attributes": {"type": "Contact"}, "Id": "003B"}
            ]
        });
        let (client, _) = connected(MockHttpClient::new().respond(200, &body.to_string()));

        let contact = client.find_contact("a@b.com").await.unwrap();
        assert_eq!(contact.id.as_deref(), Some("003A"));
        assert_eq!(contact.email.as_deref(), Some("a@b.com"));
    }

    #[tokio::test]
    async fn test_find_contact_returns_record_without_id() {
        let body = json!({"searchRecords": [{"attributes": {"type": "Contact"}}]});
        let (client, _) = connected(MockHttpClient::new().respond(200, &body.to_string()));

        let contact = client.find_contact("a@b.com").await.unwrap();
        assert_eq!(contact.id, None);
    }

    #[tokio::test]
    async fn test_find_contact_anomalies_read_as_not_found() {
        let (client, _) = connected(
            MockHttpClient::new()
                .respond(200, r#"{"searchRecords":[{"attributes":{"type":"Lead"}}]}"#)
                .respond(200, "")
                .respond(401, r#"[{"errorCode":"INVALID_SESSION_ID"}]"#)
                .fail(HttpClientError::Timeout { timeout_ms: 30_000 }),
        );

        for _ in 0..4 {
            assert_eq!(client.find_contact("a@b.com").await, None);
        }
    }

    #[tokio::test]
    async fn test_create_object_success() {
        let (client, http) = connected(
            MockHttpClient::new().respond(201, r#"{"id":"001xx","success":true,"errors":[]}"#),
        );

        let id = client
            .create_account(props(json!({"Name": "Jane Doe"})))
            .await;
        assert_eq!(id.as_deref(), Some("001xx"));

        let request = &http.requests()[0];
        assert_eq!(request.method, HttpMethod::Post);
        assert_eq!(
            request.url,
            "https://na1.salesforce.com/services/data/v20.0/sobjects/Account/"
        );
        assert_eq!(request.header("Content-type"), Some("application/json"));
        assert_eq!(request.header("Authorization"), Some("OAuth T0K"));
        let body: Value = serde_json::from_str(request.body.as_deref().unwrap()).unwrap();
        assert_eq!(body, json!({"Name": "Jane Doe"}));
    }

    #[tokio::test]
    async fn test_create_object_non_201_is_none() {
        let (client, http) = connected(
            MockHttpClient::new()
                .respond(400, r#"[{"errorCode":"REQUIRED_FIELD_MISSING"}]"#)
                .respond(200, r#"{"id":"003xx"}"#),
        );

        assert_eq!(client.create_contact(SObjectProperties::new()).await, None);
        assert_eq!(client.create_contract(SObjectProperties::new()).await, None);
        assert_eq!(http.requests().len(), 2);
        assert!(http.requests()[1].url.ends_with("/sobjects/Contract/"));
    }

    #[tokio::test]
    async fn test_disconnected_client_sends_nothing() {
        let http = Arc::new(MockHttpClient::new());
        let store = Arc::new(MemoryStore::new());
        let client = CrmClient::from_store(http.clone(), &TokenStore::new(store))
            .await
            .unwrap();

        assert!(!client.is_connected());
        assert_eq!(client.find_contact("a@b.com").await, None);
        assert_eq!(client.create_account(SObjectProperties::new()).await, None);
        assert!(http.requests().is_empty());
    }
}
