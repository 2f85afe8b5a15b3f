pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::models::binding::RepositoryBinding;
use crate::models::flow::AuthFlow;
use crate::models::token::{BearerToken, Platform, TokenKey};

/// Keyed persistence for tokens, repository bindings and in-progress
/// authorization flows. Every `put_*` overwrites the previous value for its key.
/// Implementations: `PgStore` (Postgres), `MemoryStore` (in-process).
#[async_trait]
pub trait Store: Send + Sync {
    async fn put_token(&self, key: &TokenKey, token: &BearerToken) -> anyhow::Result<()>;

    async fn get_token(&self, key: &TokenKey) -> anyhow::Result<Option<BearerToken>>;

    async fn put_binding(&self, user_id: &str, binding: &RepositoryBinding)
        -> anyhow::Result<()>;

    async fn get_binding(&self, user_id: &str) -> anyhow::Result<Option<RepositoryBinding>>;

    async fn put_flow(&self, flow: &AuthFlow) -> anyhow::Result<()>;

    async fn get_flow(&self, state: &str) -> anyhow::Result<Option<AuthFlow>>;

    /// Drops flows opened before `created_before`. Returns how many went.
    async fn delete_expired_flows(&self, created_before: DateTime<Utc>) -> anyhow::Result<u64>;

    /// Cheap liveness check for `/readyz`.
    async fn ping(&self) -> anyhow::Result<()>;

    /// The token a commit for `user_id` should use: the user-scoped record if
    /// one exists, otherwise the shared record.
    async fn resolve_token(
        &self,
        platform: Platform,
        user_id: &str,
    ) -> anyhow::Result<Option<BearerToken>> {
        if let Some(token) = self.get_token(&TokenKey::for_user(platform, user_id)).await? {
            return Ok(Some(token));
        }
        self.get_token(&TokenKey::shared(platform)).await
    }
}
