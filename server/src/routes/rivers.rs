use std::sync::Arc;

use axum::Json;
use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::{HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use bytes::Bytes;
use chrono::{DateTime, SecondsFormat, TimeDelta, Utc};
use rivers_shared::{RiverDetail, RiverLevel};
use sqlx::PgPool;
use tracing::{debug, error};

use crate::state::{AppState, CachedLevels};

const MAX_SITE_CODE_LEN: usize = 32;
const LEVELS_CACHE_CONTROL: &str = "public, max-age=60";

type DetailRow = (
    i64,
    String,
    String,
    String,
    String,
    String,
    String,
    Option<f64>,
    Option<f64>,
    Option<String>,
);

type LevelRow = (
    i64,
    String,
    String,
    String,
    String,
    f64,
    DateTime<Utc>,
    Option<DateTime<Utc>>,
);

const LEVEL_COLUMNS: &str =
    "id, site_code, site_name, variable_code, unit_code, value, recorded_at, expire_at";

/// JSON error body shared by the data routes: `{"error": "..."}`.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn database(what: &str, err: impl std::fmt::Display) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: format!("Error while fetching data for {what} | Database Error Message: {err}"),
        }
    }

    fn unavailable(what: &str) -> Self {
        Self {
            status: StatusCode::SERVICE_UNAVAILABLE,
            message: format!("Error while fetching data for {what} | No database configured"),
        }
    }

    fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(serde_json::json!({ "error": self.message })),
        )
            .into_response()
    }
}

pub async fn health(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "database": state.db.is_some(),
        "level_cache_size": state.level_cache.len(),
    }))
}

pub async fn get_river_details(
    State(state): State<AppState>,
) -> Result<Json<Vec<RiverDetail>>, ApiError> {
    const WHAT: &str = "River Details";
    let db = require_db(&state, WHAT)?;

    let rows = sqlx::query_as::<_, DetailRow>(
        "SELECT id, site_name, site_code, gauge_name, gauge_source, american_whitewater_link, \
         local_weather_noaa, low_advised_cfs, high_advised_cfs, comments \
         FROM river_details ORDER BY site_name, id",
    )
    .fetch_all(db)
    .await
    .map_err(|e| {
        error!(error = %e, "river details query failed");
        ApiError::database(WHAT, e)
    })?;

    Ok(Json(rows.into_iter().map(detail_from_row).collect()))
}

/// Every reading inside the window, newest first.
pub async fn get_river_levels(
    State(state): State<AppState>,
) -> Result<Json<Vec<RiverLevel>>, ApiError> {
    const WHAT: &str = "Water Levels";
    let db = require_db(&state, WHAT)?;
    let end = Utc::now();
    let start = end - TimeDelta::days(state.levels_window_days);

    let rows = sqlx::query_as::<_, LevelRow>(&format!(
        "SELECT {LEVEL_COLUMNS} FROM river_levels \
         WHERE recorded_at >= $1 AND recorded_at <= $2 \
         ORDER BY recorded_at DESC, id DESC"
    ))
    .bind(start)
    .bind(end)
    .fetch_all(db)
    .await
    .map_err(|e| {
        error!(error = %e, "river levels query failed");
        ApiError::database(WHAT, e)
    })?;

    Ok(Json(rows.into_iter().map(level_from_row).collect()))
}

/// One site's readings inside the window, oldest first. Served from the
/// per-site cache while the entry is fresh.
pub async fn get_site_levels(
    State(state): State<AppState>,
    Path(raw_site_code): Path<String>,
) -> Result<Response, ApiError> {
    const WHAT: &str = "Water Levels";
    let site_code = normalize_site_code(&raw_site_code)?.to_owned();

    if let Some(cached) = state.level_cache.get(&site_code)
        && cached.is_fresh(Utc::now(), state.level_cache_ttl_secs)
    {
        debug!(site_code = %site_code, "serving levels from cache");
        return Ok(json_bytes_response(Bytes::clone(&cached.json)));
    }

    let db = require_db(&state, WHAT)?;
    let start = Utc::now() - TimeDelta::days(state.levels_window_days);
    let rows = sqlx::query_as::<_, LevelRow>(&format!(
        "SELECT {LEVEL_COLUMNS} FROM river_levels \
         WHERE site_code = $1 AND recorded_at >= $2 \
         ORDER BY recorded_at ASC, id ASC"
    ))
    .bind(&site_code)
    .bind(start)
    .fetch_all(db)
    .await
    .map_err(|e| {
        error!(error = %e, site_code = %site_code, "site levels query failed");
        ApiError::database(WHAT, e)
    })?;

    let levels: Vec<RiverLevel> = rows.into_iter().map(level_from_row).collect();
    let json = serde_json::to_vec(&levels).map_err(|e| {
        error!(error = %e, site_code = %site_code, "failed to serialize site levels");
        ApiError::database(WHAT, e)
    })?;
    let json = Bytes::from(json);

    state.level_cache.insert(
        site_code,
        CachedLevels {
            json: Arc::new(json.clone()),
            fetched_at: Utc::now(),
        },
    );

    Ok(json_bytes_response(json))
}

fn require_db<'a>(state: &'a AppState, what: &str) -> Result<&'a PgPool, ApiError> {
    state.db.as_ref().ok_or_else(|| ApiError::unavailable(what))
}

fn normalize_site_code(raw: &str) -> Result<&str, ApiError> {
    let code = raw.trim();
    if code.is_empty() || code.len() > MAX_SITE_CODE_LEN {
        return Err(ApiError::bad_request("invalid site code"));
    }
    if !code
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ApiError::bad_request("invalid site code"));
    }
    Ok(code)
}

fn detail_from_row(row: DetailRow) -> RiverDetail {
    let (
        id,
        site_name,
        site_code,
        gauge_name,
        gauge_source,
        american_whitewater_link,
        local_weather_noaa,
        low_advised_cfs,
        high_advised_cfs,
        comments,
    ) = row;
    RiverDetail {
        id,
        site_name,
        site_code,
        gauge_name,
        gauge_source,
        american_whitewater_link,
        local_weather_noaa,
        low_advised_cfs,
        high_advised_cfs,
        comments,
    }
}

fn level_from_row(row: LevelRow) -> RiverLevel {
    let (id, site_code, site_name, variable_code, unit_code, value, recorded_at, expire_at) = row;
    RiverLevel {
        id: id.to_string(),
        value,
        variable_code,
        site_code,
        timestamp: recorded_at.to_rfc3339_opts(SecondsFormat::Secs, true),
        unit_code,
        site_name,
        expire_at: expire_at.map(|at| at.to_rfc3339_opts(SecondsFormat::Secs, true)),
    }
}

fn json_bytes_response(body: Bytes) -> Response {
    let mut response = Response::new(Body::from(body));
    let headers = response.headers_mut();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/json"),
    );
    headers.insert(
        header::CACHE_CONTROL,
        HeaderValue::from_static(LEVELS_CACHE_CONTROL),
    );
    response
}
