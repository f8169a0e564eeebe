pub const DEFAULT_SERVER_PORT: u16 = 8080;
pub const DEFAULT_DB_MAX_CONNECTIONS: u32 = 10;
pub const DEFAULT_LEVELS_WINDOW_DAYS: i64 = 7;
pub const DEFAULT_LEVEL_CACHE_TTL_SECS: i64 = 300; // 5 minutes
pub const LEVEL_CACHE_EVICTION_INTERVAL_SECS: u64 = 300;
pub const STATIC_ASSETS_DIR: &str = "client/dist";

pub fn server_port() -> u16 {
    std::env::var("PORT")
        .ok()
        .and_then(|value| value.parse::<u16>().ok())
        .filter(|value| *value > 0)
        .unwrap_or(DEFAULT_SERVER_PORT)
}

pub fn database_url() -> Option<String> {
    std::env::var("DATABASE_URL")
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

pub fn db_max_connections() -> u32 {
    std::env::var("DB_MAX_CONNECTIONS")
        .ok()
        .and_then(|value| value.parse::<u32>().ok())
        .filter(|value| *value > 0)
        .unwrap_or(DEFAULT_DB_MAX_CONNECTIONS)
}

/// How far back the level endpoints look.
pub fn levels_window_days() -> i64 {
    std::env::var("LEVELS_WINDOW_DAYS")
        .ok()
        .and_then(|value| value.parse::<i64>().ok())
        .filter(|value| *value > 0)
        .unwrap_or(DEFAULT_LEVELS_WINDOW_DAYS)
}

pub fn level_cache_ttl_secs() -> i64 {
    std::env::var("LEVEL_CACHE_TTL_SECS")
        .ok()
        .and_then(|value| value.parse::<i64>().ok())
        .filter(|value| *value > 0)
        .unwrap_or(DEFAULT_LEVEL_CACHE_TTL_SECS)
}
