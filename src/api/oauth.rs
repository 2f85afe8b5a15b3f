//! Two-leg OAuth relay: Webflow first, then GitHub.
//!
//! `/auth/webflow` opens an [`AuthFlow`] and sends the browser to Webflow.
//! Webflow returns to `/callback`, which stores the Webflow token and sends the
//! browser on to GitHub. GitHub returns to `/callback/github`, which stores the
//! GitHub token and closes the flow. Both providers echo the flow's `state`.
//! A callback without `state` writes the shared token record.

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    response::Response,
};
use chrono::Utc;
use serde::Deserialize;

use super::found;
use crate::errors::AppError;
use crate::models::binding::required;
use crate::models::flow::AuthFlow;
use crate::models::token::{BearerToken, Platform, TokenKey};
use crate::store::Store;
use crate::AppState;

pub const AUTH_COMPLETE_MESSAGE: &str = "Authentication successful! You can now automate commits.";

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BeginParams {
    /// Scopes the resulting tokens to this user. Omitted → shared record.
    pub user_id: Option<String>,
}

/// Query string a provider redirects back with.
#[derive(Debug, Default, Deserialize)]
pub struct CallbackParams {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
    pub error_description: Option<String>,
}

/// GET /auth/webflow — start the first leg.
pub async fn begin_authorization(
    State(state): State<Arc<AppState>>,
    Query(params): Query<BeginParams>,
) -> Result<Response, AppError> {
    let flow = AuthFlow::begin(params.user_id.filter(|u| !u.is_empty()));
    state.store.put_flow(&flow).await?;

    tracing::info!(user_id = ?flow.user_id, "starting Webflow authorization");
    Ok(found(state.webflow.authorize_url(Some(&flow.state)).as_str()))
}

/// GET /callback — finish the Webflow leg and start the GitHub leg.
pub async fn webflow_callback(
    State(state): State<Arc<AppState>>,
    Query(params): Query<CallbackParams>,
) -> Result<Response, AppError> {
    let code = callback_code(Platform::Webflow, &params)?;
    let flow = pending_flow(&state, params.state.as_deref(), Platform::Webflow).await?;

    let token = state.webflow.exchange_code(&code).await?;
    let flow = store_token(state.store.as_ref(), Platform::Webflow, flow, &token).await?;

    let next = state
        .github
        .authorize_url(flow.as_ref().map(|f| f.state.as_str()));
    Ok(found(next.as_str()))
}

/// GET /callback/github — finish the GitHub leg.
pub async fn github_callback(
    State(state): State<Arc<AppState>>,
    Query(params): Query<CallbackParams>,
) -> Result<&'static str, AppError> {
    let code = callback_code(Platform::GitHub, &params)?;
    let flow = pending_flow(&state, params.state.as_deref(), Platform::GitHub).await?;

    let token = state.github.exchange_code(&code).await?;
    store_token(state.store.as_ref(), Platform::GitHub, flow, &token).await?;

    Ok(AUTH_COMPLETE_MESSAGE)
}

fn callback_code(platform: Platform, params: &CallbackParams) -> Result<String, AppError> {
    if let Some(error) = &params.error {
        tracing::warn!(
            %platform,
            error = %error,
            description = params.error_description.as_deref().unwrap_or(""),
            "provider returned an authorization error"
        );
    }
    required(params.code.clone())
}

/// Loads the flow named by `state` and checks it is waiting for `platform`.
/// Runs before the code exchange so a stale or forged state costs no remote call.
async fn pending_flow(
    app: &AppState,
    state: Option<&str>,
    platform: Platform,
) -> Result<Option<AuthFlow>, AppError> {
    let Some(state) = state.filter(|s| !s.is_empty()) else {
        return Ok(None);
    };

    let flow = app
        .store
        .get_flow(state)
        .await?
        .ok_or_else(|| AppError::Precondition("Unknown authorization state.".into()))?;

    if flow.is_expired(app.config.flow_ttl(), Utc::now()) {
        tracing::debug!(created_at = %flow.created_at, "authorization state expired");
        return Err(AppError::Precondition(
            "Authorization state has expired.".into(),
        ));
    }

    if flow.stage.awaiting() != Some(platform) {
        return Err(AppError::Precondition(format!(
            "Authorization flow is not awaiting a {} callback.",
            platform
        )));
    }
    Ok(Some(flow))
}

/// Writes the token for the flow's owner and moves the flow to its next stage.
async fn store_token(
    store: &dyn Store,
    platform: Platform,
    flow: Option<AuthFlow>,
    token: &BearerToken,
) -> Result<Option<AuthFlow>, AppError> {
    let owner = flow.as_ref().and_then(|f| f.user_id.as_deref());
    let key = TokenKey::for_owner(platform, owner);
    store.put_token(&key, token).await?;
    tracing::info!(key = %key.storage_key(), "stored {} token", platform);

    let Some(mut flow) = flow else {
        return Ok(None);
    };
    let stage = flow
        .advance(platform)
        .map_err(|e| AppError::Precondition(e.to_string()))?;
    store.put_flow(&flow).await?;
    tracing::debug!(stage = ?stage, "authorization flow advanced");
    Ok(Some(flow))
}
