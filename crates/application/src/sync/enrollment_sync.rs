//! Enrollment to Salesforce Contact sync.

use std::sync::Arc;

use async_trait::async_trait;
use lmsforce_domain::{
    CourseSnapshot, CrmAccount, CrmContact, EnrollmentEvent, ExecutionContext, SObjectProperties,
    UserProfile,
};
use serde::Serialize;
use serde_json::Value;

use super::dispatcher::EnrollmentSubscriber;
use crate::auth::TokenStore;
use crate::crm::CrmClient;
use crate::ports::{CourseCatalog, HttpClient, UserDirectory};

/// Why an event was not synced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// The event was raised from an administrative screen.
    AdminContext,
    /// Access was revoked; revocations never write to the CRM.
    Removal,
    /// The user id did not resolve to a profile.
    UserNotFound,
}

/// How the learner's Contact was resolved.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ContactResolution {
    /// A Contact with the learner's email already existed; nothing was written.
    Existing {
        /// The matching search record.
        contact: CrmContact,
    },
    /// A new Account was created, then a Contact under it.
    Created {
        /// The new Account.
        account: CrmAccount,
        /// Id of the new Contact, `None` if the Contact create failed.
        contact_id: Option<String>,
    },
}

/// Result of handling one enrollment event.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SyncOutcome {
    /// Nothing was sent to Salesforce.
    Skipped {
        /// Why the event was skipped.
        reason: SkipReason,
    },
    /// The find-or-create chain ran.
    Completed {
        /// LMS user id.
        user_id: u64,
        /// Course details at sync time.
        course: CourseSnapshot,
        /// `None` when the chain aborted (no Contact found and the Account
        /// create failed).
        contact: Option<ContactResolution>,
    },
}

impl SyncOutcome {
    const fn skipped(reason: SkipReason) -> Self {
        Self::Skipped { reason }
    }
}

/// Syncs learners into Salesforce when they are granted course access.
pub struct EnrollmentSync {
    http: Arc<dyn HttpClient>,
    tokens: TokenStore,
    users: Arc<dyn UserDirectory>,
    courses: Arc<dyn CourseCatalog>,
}

impl EnrollmentSync {
    /// Creates the sync handler.
    #[must_use]
    pub fn new(
        http: Arc<dyn HttpClient>,
        tokens: TokenStore,
        users: Arc<dyn UserDirectory>,
        courses: Arc<dyn CourseCatalog>,
    ) -> Self {
        Self {
            http,
            tokens,
            users,
            courses,
        }
    }

    async fn crm_client(&self) -> CrmClient {
        match CrmClient::from_store(self.http.clone(), &self.tokens).await {
            Ok(client) => client,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read token state; treating as disconnected");
                CrmClient::new(self.http.clone(), None)
            }
        }
    }

    async fn course_snapshot(&self, course_id: u64) -> CourseSnapshot {
        match self.courses.find_course(course_id).await {
            Ok(Some(course)) => course.snapshot(),
            Ok(None) => {
                tracing::warn!(course_id, "Course not found; syncing without course details");
                CourseSnapshot::default()
            }
            Err(e) => {
                tracing::warn!(course_id, error = %e, "Course lookup failed");
                CourseSnapshot::default()
            }
        }
    }

    /// Returns the learner's existing Contact, or creates an Account and a
    /// Contact for them.
    ///
    /// `extra` is merged over the generated Contact fields. Returns `None`
    /// if no Contact exists and the Account could not be created.
    pub async fn find_or_create_contact(
        &self,
        crm: &CrmClient,
        user: &UserProfile,
        extra: SObjectProperties,
    ) -> Option<ContactResolution> {
        if let Some(contact) = crm.find_contact(&user.email).await {
            tracing::debug!(user_id = user.id, "Contact already exists");
            return Some(ContactResolution::Existing { contact });
        }

        let mut properties = SObjectProperties::new();
        properties.insert("Name".to_string(), Value::from(user.display_name.as_str()));
        let Some(account_id) = crm.create_account(properties).await else {
            tracing::warn!(user_id = user.id, "Account create failed; Contact not created");
            return None;
        };
        let account = CrmAccount {
            id: account_id,
            name: user.display_name.clone(),
        };

        let mut contact = SObjectProperties::new();
        contact.insert(
            "FirstName".to_string(),
            Value::from(user.first_name_or_display()),
        );
        contact.insert(
            "LastName".to_string(),
            Value::from(user.last_name_or_display()),
        );
        contact.insert("Email".to_string(), Value::from(user.email.as_str()));
        contact.insert("AccountId".to_string(), Value::from(account.id.as_str()));
        contact.extend(extra);

        let contact_id = crm.create_contact(contact).await;
        Some(ContactResolution::Created {
            account,
            contact_id,
        })
    }
}

#[async_trait]
impl EnrollmentSubscriber for EnrollmentSync {
    fn name(&self) -> &'static str {
        "salesforce"
    }

    #[tracing::instrument(
        level = "debug",
        skip_all,
        fields(user_id = event.user_id, course_id = event.course_id)
    )]
    async fn handle(&self, event: &EnrollmentEvent, context: ExecutionContext) -> SyncOutcome {
        if context.is_admin() {
            return SyncOutcome::skipped(SkipReason::AdminContext);
        }
        if event.is_removal {
            tracing::debug!("Access revoked; nothing to sync");
            return SyncOutcome::skipped(SkipReason::Removal);
        }

        let user = match self.users.find_user(event.user_id).await {
            Ok(Some(user)) => user,
            Ok(None) => return SyncOutcome::skipped(SkipReason::UserNotFound),
            Err(e) => {
                tracing::warn!(error = %e, "User lookup failed");
                return SyncOutcome::skipped(SkipReason::UserNotFound);
            }
        };

        let course = self.course_snapshot(event.course_id).await;
        let crm = self.crm_client().await;

        let mut extra = SObjectProperties::new();
        extra.insert("Title".to_string(), Value::from(course.title.as_str()));
        let contact = self.find_or_create_contact(&crm, &user, extra).await;

        tracing::info!(
            course_title = %course.title,
            course_price = course.price,
            resolved = contact.is_some(),
            "Enrollment synced"
        );
        SyncOutcome::Completed {
            user_id: user.id,
            course,
            contact,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic, clippy::float_cmp)]
mod tests {
    use super::*;
    use crate::test_support::{MemoryStore, MockDirectory, MockHttpClient};
    use lmsforce_domain::{Course, TokenState};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn jane() -> UserProfile {
        UserProfile {
            id: 7,
            email: "jane@x.com".to_string(),
            display_name: "Jane D".to_string(),
            first_name: String::new(),
            last_name: "Doe".to_string(),
        }
    }

    fn directory() -> Arc<MockDirectory> {
        Arc::new(MockDirectory {
            users: vec![jane()],
            courses: vec![Course {
                id: 42,
                title: "Intro to Go".to_string(),
                price: "$49.99".to_string(),
            }],
        })
    }

    async fn sync(http: MockHttpClient, connected: bool) -> (EnrollmentSync, Arc<MockHttpClient>) {
        let store = Arc::new(MemoryStore::new());
        let tokens = TokenStore::new(store);
        if connected {
            tokens
                .save(&TokenState::new("T", "https://na1.salesforce.com").unwrap())
                .await
                .unwrap();
        }
        let http = Arc::new(http);
        let dir = directory();
        (
            EnrollmentSync::new(http.clone(), tokens, dir.clone(), dir),
            http,
        )
    }

    fn body(request: &lmsforce_domain::HttpRequest) -> Value {
        serde_json::from_str(request.body.as_deref().unwrap()).unwrap()
    }

    #[tokio::test]
    async fn test_creates_account_then_contact() {
        let (sync, http) = sync(
            MockHttpClient::new()
                .respond(200, r#"{"searchRecords":[]}"#)
                .respond(201, r#"{"id":"001A"}"#)
                .respond(201, r#"{"id":"003C"}"#),
            true,
        )
        .await;

        let outcome = sync
            .handle(&EnrollmentEvent::granted(7, 42), ExecutionContext::Frontend)
            .await;

        let SyncOutcome::Completed { course, contact, .. } = outcome else {
            panic!("expected completed outcome");
        };
        assert_eq!(course.title, "Intro to Go");
        assert_eq!(course.price, 49.99);
        assert_eq!(
            contact,
            Some(ContactResolution::Created {
                account: CrmAccount {
                    id: "001A".to_string(),
                    name: "Jane D".to_string(),
                },
                contact_id: Some("003C".to_string()),
            })
        );

        let requests = http.requests();
        assert_eq!(requests.len(), 3);
        assert!(requests[1].url.ends_with("/sobjects/Account/"));
        assert_eq!(body(&requests[1]), json!({"Name": "Jane D"}));
        assert!(requests[2].url.ends_with("/sobjects/Contact/"));
        assert_eq!(
            body(&requests[2]),
            json!({
                "FirstName": "Jane D",
                "LastName": "Doe",
                "Email": "jane@x.com",
                "AccountId": "001A",
                "Title": "Intro to Go"
            })
        );
    }

    #[tokio::test]
    async fn test_existing_contact_short_circuits() {
        let (sync, http) = sync(
            MockHttpClient::new().respond(
                200,
                r#"{"searchRecords":[{"attributes":{"type":"Contact"},"Id":"003X"}]}"#,
            ),
            true,
        )
        .await;

        let outcome = sync
            .handle(&EnrollmentEvent::granted(7, 42), ExecutionContext::Frontend)
            .await;

        let SyncOutcome::Completed { contact, .. } = outcome else {
            panic!("expected completed outcome");
        };
        assert!(matches!(
            contact,
            Some(ContactResolution::Existing { contact }) if contact.id.as_deref() == Some("003X")
        ));
        assert_eq!(http.requests().len(), 1);
    }

    #[tokio::test]
    async fn test_account_failure_aborts_chain() {
        let (sync, http) = sync(
            MockHttpClient::new()
                .respond(200, r#"{"searchRecords":[]}"#)
                .respond(400, r#"[{"errorCode":"DUPLICATES_DETECTED"}]"#),
            true,
        )
        .await;

        let outcome = sync
            .handle(&EnrollmentEvent::granted(7, 42), ExecutionContext::Frontend)
            .await;

        assert!(matches!(outcome, SyncOutcome::Completed { contact: None, .. }));
        assert_eq!(http.requests().len(), 2);
    }

    #[tokio::test]
    async fn test_skips_without_side_effects() {
        let (sync, http) = sync(MockHttpClient::new(), true).await;

        assert_eq!(
            sync.handle(&EnrollmentEvent::granted(7, 42), ExecutionContext::Admin)
                .await,
            SyncOutcome::skipped(SkipReason::AdminContext)
        );
        assert_eq!(
            sync.handle(&EnrollmentEvent::revoked(7, 42), ExecutionContext::Frontend)
                .await,
            SyncOutcome::skipped(SkipReason::Removal)
        );
        assert_eq!(
            sync.handle(&EnrollmentEvent::granted(99, 42), ExecutionContext::Frontend)
                .await,
            SyncOutcome::skipped(SkipReason::UserNotFound)
        );
        assert!(http.requests().is_empty());
    }

    #[tokio::test]
    async fn test_missing_course_still_syncs() {
        let (sync, http) = sync(
            MockHttpClient::new().respond(
                200,
                r#"{"searchRecords":[{"attributes":{"type":"Contact"},"Id":"003X"}]}"#,
            ),
            true,
        )
        .await;

        let outcome = sync
            .handle(&EnrollmentEvent::granted(7, 404), ExecutionContext::Frontend)
            .await;

        assert!(matches!(
            outcome,
            SyncOutcome::Completed { ref course, .. } if *course == CourseSnapshot::default()
        ));
        assert_eq!(http.requests().len(), 1);
    }

    #[tokio::test]
    async fn test_disconnected_sends_nothing() {
        let (sync, http) = sync(MockHttpClient::new(), false).await;

        let outcome = sync
            .handle(&EnrollmentEvent::granted(7, 42), ExecutionContext::Frontend)
            .await;

        assert!(matches!(outcome, SyncOutcome::Completed { contact: None, .. }));
        assert!(http.requests().is_empty());
    }
}
