//! HTTP error mapping.

use axum::Json;
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use lmsforce_application::{
    ApplicationError, OAuthError, SettingsError, StoreError,
};
use serde::Serialize;

/// JSON body of every error response.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    /// Human-readable message.
    pub error: String,
}

/// Errors returned by handlers.
#[derive(thiserror::Error, Debug)]
pub enum ApiError {
    /// The `x-execution-context` header was not `admin` or `frontend`.
    #[error("invalid x-execution-context header: {0}")]
    InvalidExecutionContext(String),

    /// The admin bearer token was missing or wrong.
    #[error("admin credentials required")]
    Unauthorized,

    /// An application operation failed.
    #[error(transparent)]
    Application(#[from] ApplicationError),
}

impl From<OAuthError> for ApiError {
    fn from(error: OAuthError) -> Self {
        Self::Application(error.into())
    }
}

impl From<SettingsError> for ApiError {
    fn from(error: SettingsError) -> Self {
        Self::Application(error.into())
    }
}

impl From<StoreError> for ApiError {
    fn from(error: StoreError) -> Self {
        Self::Application(error.into())
    }
}

impl ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidExecutionContext(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::Application(err) => match err {
                ApplicationError::Settings(SettingsError::Locked) => StatusCode::CONFLICT,
                ApplicationError::OAuth(_)
                | ApplicationError::Settings(SettingsError::Store(_))
                | ApplicationError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let code = self.status_code();
        if code.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        }
        let body = ErrorBody {
            error: self.to_string(),
        };
        if matches!(self, Self::Unauthorized) {
            return (code, [(header::WWW_AUTHENTICATE, "Bearer")], Json(body)).into_response();
        }
        (code, Json(body)).into_response()
    }
}
