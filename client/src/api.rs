use rivers_shared::{RiverDetail, RiverLevel};
use serde::de::DeserializeOwned;

use crate::error::ClientError;

pub fn river_details_url(base_url: &str) -> String {
    format!("{base_url}/riverdetails")
}

pub fn river_levels_url(base_url: &str, site_code: &str) -> String {
    format!(
        "{base_url}/riverlevels/sitecode/{}",
        encode_path_segment(site_code)
    )
}

/// Encode one URL path segment with the browser's `encodeURIComponent`.
#[cfg(target_arch = "wasm32")]
pub fn encode_path_segment(segment: &str) -> String {
    js_sys::encode_uri_component(segment)
        .as_string()
        .unwrap_or_default()
}

/// Native builds only run unit tests, which use URL-safe identifiers.
#[cfg(not(target_arch = "wasm32"))]
pub fn encode_path_segment(segment: &str) -> String {
    segment.to_string()
}

async fn fetch_json<T: DeserializeOwned>(url: &str) -> Result<T, ClientError> {
    let resp = gloo_net::http::Request::get(url).send().await?;
    if !resp.ok() {
        return Err(ClientError::http_status(resp.status(), url));
    }
    resp.json::<T>()
        .await
        .map_err(|e| ClientError::Network(format!("parse error: {e}")))
}

pub async fn fetch_river_details(base_url: &str) -> Result<Vec<RiverDetail>, ClientError> {
    fetch_json(&river_details_url(base_url)).await
}

pub async fn fetch_levels(base_url: &str, site_code: &str) -> Result<Vec<RiverLevel>, ClientError> {
    fetch_json(&river_levels_url(base_url, site_code)).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_same_origin_and_absolute_urls() {
        assert_eq!(river_details_url(""), "/riverdetails");
        assert_eq!(
            river_levels_url("https://api.example", "03081500"),
            "https://api.example/riverlevels/sitecode/03081500"
        );
    }

    #[test]
    fn url_safe_identifiers_pass_through() {
        assert_eq!(encode_path_segment("site-01_a"), "site-01_a");
        assert_eq!(
            river_levels_url("", "USGS-03081500"),
            "/riverlevels/sitecode/USGS-03081500"
        );
    }
}
