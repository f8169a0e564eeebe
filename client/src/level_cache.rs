//! Page-lifetime memo of level histories keyed by gauge site code.

use std::cell::RefCell;
use std::collections::HashMap;
use std::sync::Arc;

use rivers_shared::{RiverLevel, sort_levels_ascending};

use crate::api;
use crate::error::ClientError;

thread_local! {
    static LEVELS: RefCell<HashMap<String, Arc<[RiverLevel]>>> = RefCell::new(HashMap::new());
}

pub fn cached(site_code: &str) -> Option<Arc<[RiverLevel]>> {
    LEVELS.with(|levels| levels.borrow().get(site_code).cloned())
}

/// Sort and store a fetched series. The first stored series for a site
/// wins; later stores return the cached one.
pub fn store(site_code: &str, mut levels: Vec<RiverLevel>) -> Arc<[RiverLevel]> {
    sort_levels_ascending(&mut levels);
    LEVELS.with(|cache| {
        Arc::clone(
            cache
                .borrow_mut()
                .entry(site_code.to_string())
                .or_insert_with(|| Arc::from(levels)),
        )
    })
}

/// Cached series, or fetch and cache it. Failures are not cached.
pub async fn load_levels(base_url: &str, site_code: &str) -> Result<Arc<[RiverLevel]>, ClientError> {
    if let Some(levels) = cached(site_code) {
        return Ok(levels);
    }
    let levels = api::fetch_levels(base_url, site_code).await?;
    Ok(store(site_code, levels))
}
