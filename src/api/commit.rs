use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};

use crate::clients::RawBody;
use crate::errors::AppError;
use crate::models::binding::CommitRequest;
use crate::models::token::Platform;
use crate::AppState;

pub const MISSING_PRECONDITIONS_MESSAGE: &str = "Missing tokens or repository information.";

/// POST /commit — copy a Webflow site export into the user's bound GitHub file.
///
/// Both tokens and the binding are checked before any outbound call. The
/// export fetch and the upload are not retried and nothing is rolled back.
pub async fn commit(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<CommitRequest>, JsonRejection>,
) -> Result<Response, AppError> {
    let Json(payload) = super::json_body(payload)?;
    let (user_id, site_id) = payload.validate()?;
    let raw = forward_commit(&state, &user_id, &site_id).await?;

    let mut resp = (StatusCode::OK, raw.body).into_response();
    if let Some(content_type) = raw.content_type {
        resp.headers_mut().insert(header::CONTENT_TYPE, content_type);
    }
    Ok(resp)
}

/// Fetches the export for `site_id` and uploads it to the binding of
/// `user_id`. Returns GitHub's response body untouched.
pub async fn forward_commit(
    state: &AppState,
    user_id: &str,
    site_id: &str,
) -> Result<RawBody, AppError> {
    let webflow_token = state.store.resolve_token(Platform::Webflow, user_id).await?;
    let github_token = state.store.resolve_token(Platform::GitHub, user_id).await?;
    let binding = state.store.get_binding(user_id).await?;

    let (Some(webflow_token), Some(github_token), Some(binding)) =
        (webflow_token, github_token, binding)
    else {
        tracing::warn!(user_id = %user_id, "commit refused: tokens or repository binding missing");
        return Err(AppError::Precondition(MISSING_PRECONDITIONS_MESSAGE.into()));
    };

    let export = state.webflow.export_site(&webflow_token, site_id).await?;
    tracing::info!(
        user_id = %user_id,
        site_id = %site_id,
        bytes = export.body.len(),
        "fetched Webflow export"
    );

    let result = state
        .github
        .put_contents(
            &github_token,
            &binding,
            &state.config.commit_message,
            &export.body,
        )
        .await?;
    tracing::info!(
        user_id = %user_id,
        repository = %binding.repository,
        path = %binding.path,
        branch = %binding.branch,
        "committed Webflow export to GitHub"
    );

    Ok(result)
}
