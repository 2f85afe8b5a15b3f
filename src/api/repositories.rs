use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};

use crate::errors::AppError;
use crate::models::binding::AddRepositoryRequest;
use crate::AppState;

pub const BINDING_SAVED_MESSAGE: &str = "Repository information saved successfully.";

/// POST /add-repository — record where a user's commits go.
pub async fn add_repository(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<AddRepositoryRequest>, JsonRejection>,
) -> Result<&'static str, AppError> {
    let Json(payload) = super::json_body(payload)?;
    let (user_id, binding) = payload.validate()?;

    state.store.put_binding(&user_id, &binding).await?;
    tracing::info!(
        user_id = %user_id,
        repository = %binding.repository,
        path = %binding.path,
        branch = %binding.branch,
        "repository binding saved"
    );

    Ok(BINDING_SAVED_MESSAGE)
}
