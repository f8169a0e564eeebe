use std::time::Duration;

use chrono::Utc;
use tracing::info;

use crate::config::LEVEL_CACHE_EVICTION_INTERVAL_SECS;
use crate::state::AppState;

pub async fn run(state: AppState) {
    let mut interval = tokio::time::interval(Duration::from_secs(LEVEL_CACHE_EVICTION_INTERVAL_SECS));

    loop {
        interval.tick().await;

        let evicted = state.evict_stale_levels(Utc::now());
        if evicted > 0 {
            info!(
                "evicted {evicted} stale level cache entries ({} remaining)",
                state.level_cache.len()
            );
        }
    }
}
