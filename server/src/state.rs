use std::sync::Arc;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use sqlx::PgPool;

use crate::config::{level_cache_ttl_secs, levels_window_days};

/// Pre-serialized level series for one site.
#[derive(Debug, Clone)]
pub struct CachedLevels {
    pub json: Arc<Bytes>,
    pub fetched_at: DateTime<Utc>,
}

impl CachedLevels {
    pub fn is_fresh(&self, now: DateTime<Utc>, ttl_secs: i64) -> bool {
        now.signed_duration_since(self.fetched_at).num_seconds() < ttl_secs
    }
}

#[derive(Clone)]
pub struct AppState {
    /// Absent when the server runs without `DATABASE_URL`; data routes answer 503.
    pub db: Option<PgPool>,
    pub level_cache: Arc<DashMap<String, CachedLevels>>,
    pub levels_window_days: i64,
    pub level_cache_ttl_secs: i64,
}

impl AppState {
    pub fn new(db: Option<PgPool>) -> Self {
        Self {
            db,
            level_cache: Arc::new(DashMap::new()),
            levels_window_days: levels_window_days(),
            level_cache_ttl_secs: level_cache_ttl_secs(),
        }
    }

    /// Drop cache entries older than the TTL. Returns how many were removed.
    pub fn evict_stale_levels(&self, now: DateTime<Utc>) -> usize {
        let before = self.level_cache.len();
        let ttl = self.level_cache_ttl_secs;
        self.level_cache.retain(|_, cached| cached.is_fresh(now, ttl));
        before.saturating_sub(self.level_cache.len())
    }
}
