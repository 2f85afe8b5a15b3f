use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::token::Platform;

/// Where a two-leg authorization currently stands.
///
/// `AwaitingWebflow -> AwaitingGithub -> Complete`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "varchar", rename_all = "snake_case")]
pub enum FlowStage {
    AwaitingWebflow,
    AwaitingGithub,
    Complete,
}

impl FlowStage {
    /// The provider whose callback this stage is waiting for.
    pub fn awaiting(&self) -> Option<Platform> {
        match self {
            FlowStage::AwaitingWebflow => Some(Platform::Webflow),
            FlowStage::AwaitingGithub => Some(Platform::GitHub),
            FlowStage::Complete => None,
        }
    }

    fn next(&self) -> FlowStage {
        match self {
            FlowStage::AwaitingWebflow => FlowStage::AwaitingGithub,
            FlowStage::AwaitingGithub | FlowStage::Complete => FlowStage::Complete,
        }
    }
}

/// One browser's pass through the Webflow and GitHub consent screens,
/// keyed by the `state` value both providers echo back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct AuthFlow {
    pub state: String,
    /// User the resulting tokens are scoped to. `None` writes the shared record.
    pub user_id: Option<String>,
    pub stage: FlowStage,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("authorization flow is {stage:?}, not awaiting a {platform} callback")]
pub struct UnexpectedCallback {
    pub stage: FlowStage,
    pub platform: Platform,
}

impl AuthFlow {
    pub fn begin(user_id: Option<String>) -> Self {
        let now = Utc::now();
        Self {
            state: uuid::Uuid::new_v4().simple().to_string(),
            user_id,
            stage: FlowStage::AwaitingWebflow,
            created_at: now,
            updated_at: now,
        }
    }

    /// True once `ttl` has passed since the flow was opened.
    pub fn is_expired(&self, ttl: Duration, now: DateTime<Utc>) -> bool {
        now - self.created_at > ttl
    }

    /// Records that `platform`'s callback completed. Fails without changing
    /// the flow when the flow is not waiting for that provider.
    pub fn advance(&mut self, platform: Platform) -> Result<FlowStage, UnexpectedCallback> {
        if self.stage.awaiting() != Some(platform) {
            return Err(UnexpectedCallback {
                stage: self.stage,
                platform,
            });
        }
        self.stage = self.stage.next();
        self.updated_at = Utc::now();
        Ok(self.stage)
    }
}
