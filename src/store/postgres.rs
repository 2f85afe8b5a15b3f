use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::models::binding::RepositoryBinding;
use crate::models::flow::AuthFlow;
use crate::models::token::{BearerToken, TokenKey};

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub async fn connect(database_url: &str) -> anyhow::Result<Self> {
        let pool = PgPool::connect(database_url).await?;
        Ok(Self { pool })
    }

    /// Run pending migrations from the migrations/ directory.
    pub async fn migrate(&self) -> anyhow::Result<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }
}

#[async_trait]
impl super::Store for PgStore {
    // -- Token Operations --

    async fn put_token(&self, key: &TokenKey, token: &BearerToken) -> anyhow::Result<()> {
        sqlx::query(
            r#"INSERT INTO tokens (key, platform, user_id, token)
               VALUES ($1, $2, $3, $4)
               ON CONFLICT (key) DO UPDATE
               SET token = EXCLUDED.token, updated_at = NOW()"#,
        )
        .bind(key.storage_key())
        .bind(key.platform.as_str())
        .bind(key.owner.as_deref())
        .bind(token.expose())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn get_token(&self, key: &TokenKey) -> anyhow::Result<Option<BearerToken>> {
        let token = sqlx::query_scalar::<_, String>("SELECT token FROM tokens WHERE key = $1")
            .bind(key.storage_key())
            .fetch_optional(&self.pool)
            .await?;

        Ok(token.map(BearerToken::new))
    }

    // -- Repository Binding Operations --

    async fn put_binding(
        &self,
        user_id: &str,
        binding: &RepositoryBinding,
    ) -> anyhow::Result<()> {
        sqlx::query(
            r#"INSERT INTO repositories (user_id, repository, path, branch)
               VALUES ($1, $2, $3, $4)
               ON CONFLICT (user_id) DO UPDATE
               SET repository = EXCLUDED.repository,
                   path = EXCLUDED.path,
                   branch = EXCLUDED.branch,
                   updated_at = NOW()"#,
        )
        .bind(user_id)
        .bind(&binding.repository)
        .bind(&binding.path)
        .bind(&binding.branch)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn get_binding(&self, user_id: &str) -> anyhow::Result<Option<RepositoryBinding>> {
        let row = sqlx::query_as::<_, RepositoryBinding>(
            "SELECT repository, path, branch FROM repositories WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    // -- Authorization Flow Operations --

    async fn put_flow(&self, flow: &AuthFlow) -> anyhow::Result<()> {
        sqlx::query(
            r#"INSERT INTO auth_flows (state, user_id, stage, created_at, updated_at)
               VALUES ($1, $2, $3, $4, $5)
               ON CONFLICT (state) DO UPDATE
               SET stage = EXCLUDED.stage, updated_at = EXCLUDED.updated_at"#,
        )
        .bind(&flow.state)
        .bind(flow.user_id.as_deref())
        .bind(flow.stage)
        .bind(flow.created_at)
        .bind(flow.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn get_flow(&self, state: &str) -> anyhow::Result<Option<AuthFlow>> {
        let row = sqlx::query_as::<_, AuthFlow>(
            "SELECT state, user_id, stage, created_at, updated_at FROM auth_flows WHERE state = $1",
        )
        .bind(state)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    async fn delete_expired_flows(&self, created_before: DateTime<Utc>) -> anyhow::Result<u64> {
        let result = sqlx::query("DELETE FROM auth_flows WHERE created_at < $1")
            .bind(created_before)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    async fn ping(&self) -> anyhow::Result<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
