use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use tower_http::trace::TraceLayer;

use crate::errors::AppError;
use crate::AppState;

pub mod commit;
pub mod oauth;
pub mod repositories;

/// Build the relay router. The caller attaches state and outer middleware.
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/healthz", get(|| async { "ok" }))
        .route("/readyz", get(readiness_check))
        // OAuth relay
        .route("/auth/webflow", get(oauth::begin_authorization))
        .route("/callback", get(oauth::webflow_callback))
        .route("/callback/github", get(oauth::github_callback))
        // Repository bindings
        .route("/add-repository", post(repositories::add_repository))
        // Commit forwarding
        .route("/commit", post(commit::commit))
        .layer(TraceLayer::new_for_http())
        .fallback(fallback_404)
}

async fn fallback_404() -> StatusCode {
    StatusCode::NOT_FOUND
}

async fn readiness_check(State(state): State<Arc<AppState>>) -> Result<&'static str, StatusCode> {
    state.store.ping().await.map_err(|e| {
        tracing::warn!("readiness check failed: {:#}", e);
        StatusCode::SERVICE_UNAVAILABLE
    })?;
    Ok("ok")
}

/// `302 Found` to `location`. axum's `Redirect` only offers 303/307/308.
pub(crate) fn found(location: &str) -> Response {
    (StatusCode::FOUND, [(header::LOCATION, location.to_string())]).into_response()
}

/// Unwraps a JSON body. A missing content type, malformed JSON or a field of
/// the wrong type all count as missing fields, like an absent one does.
pub(crate) fn json_body<T>(
    payload: Result<Json<T>, JsonRejection>,
) -> Result<Json<T>, AppError> {
    payload.map_err(|rejection| {
        tracing::debug!(
            status = %rejection.status(),
            "rejected request body: {}",
            rejection.body_text()
        );
        AppError::MissingField
    })
}
