//! HTTP handlers.
//!
//! The admin surface mirrors the plugin settings screen: connect, status
//! notice, settings form, disconnect and uninstall. Those handlers take
//! [`AdminAuth`]. The OAuth callback and `/enrollments` stay open: Salesforce
//! redirects the browser to the former and the LMS posts to the latter.

use axum::extract::{Form, OriginalUri, Query, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use lmsforce_application::{
    AuthorizationState, CallbackOutcome, CallbackParams, DispatchReport,
};
use lmsforce_domain::{EnrollmentEvent, SalesforceSettings, StatusNotice, token_preview};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::extract::{AdminAuth, ExecutionContextHeader};
use crate::state::AppState;

/// Routes under `/salesforce` plus the enrollment hook.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/salesforce/authorize", get(authorize))
        .route("/salesforce/callback", get(callback))
        .route("/salesforce/status", get(status))
        .route("/salesforce/settings", get(get_settings).put(put_settings))
        .route("/salesforce/action", post(settings_action))
        .route("/salesforce/disconnect", post(disconnect))
        .route("/salesforce/uninstall", post(uninstall))
        .route("/enrollments", post(enrollment))
}

fn redirect(code: StatusCode, location: String) -> Response {
    (code, [(header::LOCATION, location)]).into_response()
}

/// Connection state plus the one-shot notice, if any.
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    /// True while a token state is stored.
    pub connected: bool,
    /// Resting flow state.
    pub state: AuthorizationState,
    /// Notice to show once.
    pub notice: Option<NoticeView>,
}

/// A resolved status notice.
#[derive(Debug, Serialize)]
pub struct NoticeView {
    /// Machine-readable notice.
    pub code: StatusNotice,
    /// Text to display.
    pub message: &'static str,
}

impl From<StatusNotice> for NoticeView {
    fn from(code: StatusNotice) -> Self {
        Self {
            code,
            message: code.message(),
        }
    }
}

/// Query of the status endpoint.
#[derive(Debug, Default, Deserialize)]
pub struct StatusQuery {
    /// Set after a settings form submit.
    #[serde(default)]
    pub settings_updated: bool,
}

/// Settings as shown to the administrator. The secret is never echoed.
#[derive(Debug, Serialize)]
pub struct SettingsView {
    /// Connected app consumer key.
    pub client_id: String,
    /// Redacted consumer secret.
    pub client_secret: String,
    /// Login URI as stored.
    pub login_uri: String,
    /// Login URI actually used.
    pub effective_login_uri: String,
    /// Callback URL to register on the connected app.
    pub callback_uri: String,
    /// True while connected; settings are read-only then.
    pub locked: bool,
    /// Fields that are still empty.
    pub missing_fields: Vec<&'static str>,
}

impl SettingsView {
    fn new(settings: &SalesforceSettings, callback_uri: &str, locked: bool) -> Self {
        Self {
            client_id: settings.client_id.clone(),
            client_secret: if settings.client_secret.is_empty() {
                String::new()
            } else {
                token_preview(&settings.client_secret)
            },
            login_uri: settings.login_uri.clone(),
            effective_login_uri: settings.effective_login_uri().to_string(),
            callback_uri: callback_uri.to_string(),
            locked,
            missing_fields: settings.missing_fields(),
        }
    }
}

/// Body of the settings form action.
#[derive(Debug, Default, Deserialize)]
pub struct ActionForm {
    /// `true` disconnects; anything else starts authorization.
    #[serde(default)]
    pub disconnect: Option<String>,
}

impl ActionForm {
    fn wants_disconnect(&self) -> bool {
        self.disconnect.as_deref() == Some("true")
    }
}

/// Result of a disconnect.
#[derive(Debug, Serialize)]
pub struct DisconnectResponse {
    /// False if nothing was stored.
    pub disconnected: bool,
}

/// Reports from every enrollment subscriber.
#[derive(Debug, Serialize)]
pub struct EnrollmentResponse {
    /// One entry per subscriber, in registration order.
    pub reports: Vec<DispatchReport>,
}

#[tracing::instrument(level = "info", skip_all)]
async fn authorize(
    _admin: AdminAuth,
    State(state): State<AppState>,
) -> Result<Response, ApiError> {
    let client = state.oauth_client().await?;
    let flow = client.authorize();
    let location = flow.redirect_url().unwrap_or_default().to_string();
    Ok(redirect(StatusCode::MOVED_PERMANENTLY, location))
}

#[tracing::instrument(level = "info", skip_all)]
async fn callback(
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
    Query(params): Query<CallbackParams>,
) -> Result<Response, ApiError> {
    let client = state.oauth_client().await?;
    let current = uri.to_string();
    match client.handle_callback(&params, Some(&current)).await? {
        CallbackOutcome::Connected { redirect_to } => Ok(redirect(StatusCode::FOUND, redirect_to)),
        CallbackOutcome::NotOurCallback => {
            let flow = client.state().await?;
            Ok(Json(StatusResponse {
                connected: flow.is_connected(),
                state: flow,
                notice: None,
            })
            .into_response())
        }
    }
}

#[tracing::instrument(level = "debug", skip_all)]
async fn status(
    _admin: AdminAuth,
    State(state): State<AppState>,
    Query(query): Query<StatusQuery>,
) -> Result<Json<StatusResponse>, ApiError> {
    let notice = state.settings.notice(query.settings_updated).await?;
    let token = state.tokens.get().await?;
    let flow = AuthorizationState::from_token(token.as_ref());
    Ok(Json(StatusResponse {
        connected: flow.is_connected(),
        state: flow,
        notice: notice.map(NoticeView::from),
    }))
}

#[tracing::instrument(level = "debug", skip_all)]
async fn get_settings(
    _admin: AdminAuth,
    State(state): State<AppState>,
) -> Result<Json<SettingsView>, ApiError> {
    let settings = state.settings.load().await?;
    let locked = state.settings.is_locked().await?;
    Ok(Json(SettingsView::new(&settings, &state.callback_uri, locked)))
}

#[tracing::instrument(level = "info", skip_all)]
async fn put_settings(
    _admin: AdminAuth,
    State(state): State<AppState>,
    Json(settings): Json<SalesforceSettings>,
) -> Result<Json<SettingsView>, ApiError> {
    let saved = state.settings.save(&settings).await?;
    Ok(Json(SettingsView::new(&saved, &state.callback_uri, false)))
}

#[tracing::instrument(level = "info", skip_all)]
async fn settings_action(
    _admin: AdminAuth,
    State(state): State<AppState>,
    Form(form): Form<ActionForm>,
) -> Result<Response, ApiError> {
    let client = state.oauth_client().await?;
    if form.wants_disconnect() {
        let disconnected = client.disconnect().await?;
        return Ok(Json(DisconnectResponse { disconnected }).into_response());
    }
    let location = client.authorize().redirect_url().unwrap_or_default().to_string();
    Ok(redirect(StatusCode::MOVED_PERMANENTLY, location))
}

#[tracing::instrument(level = "info", skip_all)]
async fn disconnect(
    _admin: AdminAuth,
    State(state): State<AppState>,
) -> Result<Json<DisconnectResponse>, ApiError> {
    let disconnected = state.oauth_client().await?.disconnect().await?;
    Ok(Json(DisconnectResponse { disconnected }))
}

#[tracing::instrument(level = "info", skip_all)]
async fn uninstall(
    _admin: AdminAuth,
    State(state): State<AppState>,
) -> Result<StatusCode, ApiError> {
    state.uninstall().execute().await?;
    Ok(StatusCode::NO_CONTENT)
}

#[tracing::instrument(level = "info", skip_all)]
async fn enrollment(
    State(state): State<AppState>,
    ExecutionContextHeader(context): ExecutionContextHeader,
    Json(event): Json<EnrollmentEvent>,
) -> (StatusCode, Json<EnrollmentResponse>) {
    tracing::debug!(user_id = event.user_id, course_id = event.course_id, ?context, "Enrollment event received");
    let reports = state.dispatcher.dispatch(&event, context).await;
    (StatusCode::ACCEPTED, Json(EnrollmentResponse { reports }))
}
