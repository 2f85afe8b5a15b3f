use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;

use crate::models::binding::RepositoryBinding;
use crate::models::flow::AuthFlow;
use crate::models::token::{BearerToken, TokenKey};

/// In-process store used when no `DATABASE_URL` is configured, and in tests.
/// Contents are lost on restart.
#[derive(Clone, Default)]
pub struct MemoryStore {
    tokens: Arc<DashMap<String, BearerToken>>,
    bindings: Arc<DashMap<String, RepositoryBinding>>,
    flows: Arc<DashMap<String, AuthFlow>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl super::Store for MemoryStore {
    async fn put_token(&self, key: &TokenKey, token: &BearerToken) -> anyhow::Result<()> {
        self.tokens.insert(key.storage_key(), token.clone());
        Ok(())
    }

    async fn get_token(&self, key: &TokenKey) -> anyhow::Result<Option<BearerToken>> {
        Ok(self
            .tokens
            .get(&key.storage_key())
            .map(|entry| entry.value().clone()))
    }

    async fn put_binding(
        &self,
        user_id: &str,
        binding: &RepositoryBinding,
    ) -> anyhow::Result<()> {
        self.bindings.insert(user_id.to_string(), binding.clone());
        Ok(())
    }

    async fn get_binding(&self, user_id: &str) -> anyhow::Result<Option<RepositoryBinding>> {
        Ok(self.bindings.get(user_id).map(|entry| entry.value().clone()))
    }

    async fn put_flow(&self, flow: &AuthFlow) -> anyhow::Result<()> {
        self.flows.insert(flow.state.clone(), flow.clone());
        Ok(())
    }

    async fn get_flow(&self, state: &str) -> anyhow::Result<Option<AuthFlow>> {
        Ok(self.flows.get(state).map(|entry| entry.value().clone()))
    }

    async fn delete_expired_flows(&self, created_before: DateTime<Utc>) -> anyhow::Result<u64> {
        let before = self.flows.len();
        self.flows.retain(|_, flow| flow.created_at >= created_before);
        Ok(before.saturating_sub(self.flows.len()) as u64)
    }

    async fn ping(&self) -> anyhow::Result<()> {
        Ok(())
    }
}
