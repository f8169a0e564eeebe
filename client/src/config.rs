use wasm_bindgen::JsValue;

/// Quiet period after the last resort trigger before a sort pass runs.
pub const RESORT_DEBOUNCE_MS: u32 = 300;
/// Settle time between a DOM reorder and the chart rebuild.
pub const REBUILD_DELAY_MS: u32 = 50;
/// Delay before scrolling to the deep-linked card after the first sort.
pub const HASH_SCROLL_DELAY_MS: u32 = 150;

pub const SORT_MODE_STORAGE_KEY: &str = "rivers_sort_mode";

/// Cards narrower than this use the short unit label.
pub const COMPACT_WIDTH_PX: f64 = 500.0;

const BUILD_API_BASE_URL: Option<&str> = option_env!("RIVERS_API_BASE_URL");
const BUILD_USER_API_BASE_URL: Option<&str> = option_env!("RIVERS_USER_API_BASE_URL");

/// Endpoint roots for the two REST services.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiConfig {
    /// Empty means same origin.
    pub api_base_url: String,
    pub user_api_base_url: String,
}

impl ApiConfig {
    /// Values injected by the host page in `window.runtimeConfig` take
    /// precedence over the ones baked in at build time.
    pub fn load() -> Self {
        Self::from_sources(
            runtime_config_value("API_BASE_URL"),
            runtime_config_value("USER_API_BASE_URL"),
            BUILD_API_BASE_URL,
            BUILD_USER_API_BASE_URL,
        )
    }

    pub fn from_sources(
        runtime_api: Option<String>,
        runtime_user_api: Option<String>,
        build_api: Option<&str>,
        build_user_api: Option<&str>,
    ) -> Self {
        let api_base_url = resolve_base_url(runtime_api, build_api, "");
        let user_api_base_url = resolve_base_url(runtime_user_api, build_user_api, &api_base_url);
        Self {
            api_base_url,
            user_api_base_url,
        }
    }
}

/// First non-blank candidate, without a trailing slash.
pub fn resolve_base_url(runtime: Option<String>, build: Option<&str>, fallback: &str) -> String {
    let chosen = runtime
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .or_else(|| build.map(str::trim).filter(|value| !value.is_empty()))
        .unwrap_or(fallback);
    chosen.trim_end_matches('/').to_string()
}

fn runtime_config_value(key: &str) -> Option<String> {
    let window = web_sys::window()?;
    let config = js_sys::Reflect::get(&window, &JsValue::from_str("runtimeConfig")).ok()?;
    if config.is_undefined() || config.is_null() {
        return None;
    }
    js_sys::Reflect::get(&config, &JsValue::from_str(key))
        .ok()?
        .as_string()
}

pub fn is_compact_viewport() -> bool {
    web_sys::window()
        .and_then(|window| window.inner_width().ok())
        .and_then(|width| width.as_f64())
        .is_some_and(|width| width <= COMPACT_WIDTH_PX)
}
