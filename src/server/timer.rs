use super::context::ServerContext;
use chrono::Utc;
use std::sync::Arc;
use tokio::time::{interval_at, Duration, Instant};

/// Delete expired tokens every `secs` seconds. Never returns.
pub async fn start_timer(ctx: Arc<ServerContext>, secs: u64) {
    let period = Duration::from_secs(secs.max(1));
    let mut interval = interval_at(Instant::now() + period, period);
    loop {
        interval.tick().await;
        revoke_expired_tokens(&ctx).await;
    }
}

/// Run one sweep. Returns the count of deleted tokens.
pub async fn revoke_expired_tokens(ctx: &ServerContext) -> usize {
    match ctx.resolver.revoke_expired_tokens(&Utc::now()).await {
        Ok(count) => {
            if count > 0 {
                log::info!(target: "tokenauth::timer", "Removed {} expired tokens.", count);
            }
            count
        }
        Err(e) => {
            log::error!(target: "tokenauth::timer", "Timer task error: {}", e);
            0
        }
    }
}
