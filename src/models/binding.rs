use serde::{Deserialize, Serialize};

use crate::errors::AppError;

/// Where a user's commits land on GitHub.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct RepositoryBinding {
    /// `owner/name`
    pub repository: String,
    /// File path inside the repository.
    pub path: String,
    pub branch: String,
}

/// Body of `POST /add-repository`. Every field is optional at the wire level
/// so a missing field is reported as a 400 rather than a deserialization error.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddRepositoryRequest {
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub repository: Option<String>,
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub branch: Option<String>,
}

impl AddRepositoryRequest {
    /// Splits the request into `(user_id, binding)`. Absent and empty fields
    /// are both missing.
    pub fn validate(self) -> Result<(String, RepositoryBinding), AppError> {
        let user_id = required(self.user_id)?;
        let binding = RepositoryBinding {
            repository: required(self.repository)?,
            path: required(self.path)?,
            branch: required(self.branch)?,
        };
        Ok((user_id, binding))
    }
}

/// Body of `POST /commit`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommitRequest {
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub site_id: Option<String>,
}

impl CommitRequest {
    /// Returns `(user_id, site_id)`.
    pub fn validate(self) -> Result<(String, String), AppError> {
        Ok((required(self.user_id)?, required(self.site_id)?))
    }
}

pub(crate) fn required(field: Option<String>) -> Result<String, AppError> {
    match field {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(AppError::MissingField),
    }
}
