//! Request header extractors.

use crate::error::ApiError;
use crate::state::AppState;
use axum::extract::FromRequestParts;
use axum::http::header;
use axum::http::request::Parts;
use lmsforce_domain::ExecutionContext;
use std::future;
use subtle::ConstantTimeEq;

/// Header naming where an enrollment was triggered.
pub const EXECUTION_CONTEXT_HEADER: &str = "x-execution-context";

/// `x-execution-context: admin | frontend`; absent or empty means frontend.
#[derive(Debug, Copy, Clone)]
pub struct ExecutionContextHeader(pub ExecutionContext);

impl<S> FromRequestParts<S> for ExecutionContextHeader
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    #[tracing::instrument(level = "debug", name = "extract.execution_context", skip_all)]
    fn from_request_parts(
        parts: &mut Parts,
        _state: &S,
    ) -> impl std::future::Future<Output = Result<Self, Self::Rejection>> + Send {
        let res = (|| {
            let Some(raw) = parts.headers.get(EXECUTION_CONTEXT_HEADER) else {
                return Ok(Self(ExecutionContext::default()));
            };
            let raw = raw
                .to_str()
                .map_err(|e| ApiError::InvalidExecutionContext(e.to_string()))?;
            match raw.trim().to_ascii_lowercase().as_str() {
                "admin" => Ok(Self(ExecutionContext::Admin)),
                "" | "frontend" => Ok(Self(ExecutionContext::Frontend)),
                other => Err(ApiError::InvalidExecutionContext(other.to_string())),
            }
        })();
        future::ready(res)
    }
}

/// Proof that the request carried `Authorization: Bearer <admin token>`.
///
/// Every request is rejected while no admin token is configured.
#[derive(Debug, Copy, Clone)]
pub struct AdminAuth;

impl FromRequestParts<AppState> for AdminAuth {
    type Rejection = ApiError;

    #[tracing::instrument(level = "debug", name = "extract.admin_auth", skip_all)]
    fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> impl std::future::Future<Output = Result<Self, Self::Rejection>> + Send {
        let res = (|| {
            let expected = state.admin_token.as_deref().ok_or(ApiError::Unauthorized)?;
            let presented = parts
                .headers
                .get(header::AUTHORIZATION)
                .and_then(|value| value.to_str().ok())
                .and_then(|value| value.strip_prefix("Bearer "))
                .ok_or(ApiError::Unauthorized)?;
            if bool::from(presented.trim().as_bytes().ct_eq(expected.as_bytes())) {
                Ok(Self)
            } else {
                tracing::warn!(path = %parts.uri.path(), "Rejected admin request with a wrong token");
                Err(ApiError::Unauthorized)
            }
        })();
        future::ready(res)
    }
}
