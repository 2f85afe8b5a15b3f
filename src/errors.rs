use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    /// Client input incomplete.
    #[error("missing required fields")]
    MissingField,

    /// A stored token, binding or flow the operation depends on is absent.
    #[error("precondition failed: {0}")]
    Precondition(String),

    /// OAuth code exchange failed.
    #[error("token exchange failed: {0}")]
    Exchange(String),

    /// Export fetch or content upload failed.
    #[error("remote call failed: {0}")]
    RemoteCall(String),

    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::MissingField | AppError::Precondition(_) => StatusCode::BAD_REQUEST,
            AppError::Exchange(_) | AppError::RemoteCall(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let msg = match &self {
            AppError::MissingField => "Missing required fields.".to_string(),
            AppError::Precondition(reason) => reason.clone(),
            AppError::Exchange(e) => {
                tracing::error!("OAuth token exchange failed: {}", e);
                "Authorization failed.".to_string()
            }
            AppError::RemoteCall(e) => {
                tracing::error!("Error committing to GitHub: {}", e);
                "Failed to commit code to GitHub.".to_string()
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {:#}", e);
                "Internal server error.".to_string()
            }
        };

        (self.status(), msg).into_response()
    }
}
