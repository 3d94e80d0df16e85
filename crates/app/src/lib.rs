//! lmsforce HTTP host
//!
//! Serves the Salesforce connection endpoints and receives enrollment events
//! from the LMS.

pub mod error;
pub mod extract;
pub mod routes;
pub mod state;

use std::net::SocketAddr;

use axum::Router;
use tower_http::trace::TraceLayer;

pub use error::ApiError;
pub use state::{AppState, StartupError};

/// Builds the application router.
pub fn router(state: AppState) -> Router {
    routes::routes()
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

/// Binds `addr` and serves the router until the process exits.
///
/// # Errors
/// Returns an error if the listener cannot be bound or the server fails.
pub async fn serve(addr: SocketAddr, state: AppState) -> std::io::Result<()> {
    let app = router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "lmsforce listening");
    axum::serve(listener, app).await
}
