//! Background job: drop authorization flows whose `state` has outlived its TTL.
//!
//! Expired flows are already refused by the callbacks; this only keeps the
//! store from accumulating abandoned consent attempts.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::time;

use crate::store::Store;

/// Spawn the background cleanup task. Call this once at startup.
pub fn spawn(store: Arc<dyn Store>, ttl: chrono::Duration) {
    tokio::spawn(async move {
        let mut interval = time::interval(Duration::from_secs(300));
        loop {
            interval.tick().await;
            if let Err(e) = expire_flows(store.as_ref(), ttl).await {
                tracing::error!("flow cleanup job failed: {}", e);
            }
        }
    });
}

/// Delete flows opened more than `ttl` ago.
pub async fn expire_flows(store: &dyn Store, ttl: chrono::Duration) -> anyhow::Result<u64> {
    let Some(cutoff) = Utc::now().checked_sub_signed(ttl) else {
        return Ok(0);
    };
    let removed = store.delete_expired_flows(cutoff).await?;
    if removed > 0 {
        tracing::info!(rows = removed, "deleted expired authorization flows");
    }
    Ok(removed)
}
