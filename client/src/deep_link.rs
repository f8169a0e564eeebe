//! URL-hash deep links to individual river cards.

use rivers_shared::wrapper_id;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{Element, EventTarget, ScrollBehavior, ScrollIntoViewOptions, ScrollLogicalPosition};

/// Elements inside a card that handle their own clicks.
const CONTROL_TAGS: [&str; 4] = ["a", "button", "textarea", "input"];

fn is_control_tag(tag: &str) -> bool {
    CONTROL_TAGS.iter().any(|control| control.eq_ignore_ascii_case(tag))
}

/// Whether a click landed on (or inside) a link, button or form field.
pub fn is_control_click(target: Option<EventTarget>) -> bool {
    let mut node = target.and_then(|t| t.dyn_into::<Element>().ok());
    while let Some(element) = node {
        if is_control_tag(&element.tag_name()) {
            return true;
        }
        node = element.parent_element();
    }
    false
}

/// Slug named by a location hash such as `#cheat-canyon`.
pub fn slug_from_hash(hash: &str) -> Option<String> {
    let slug = hash.strip_prefix('#').unwrap_or(hash).trim();
    (!slug.is_empty()).then(|| slug.to_string())
}

pub fn current_slug() -> Option<String> {
    let hash = web_sys::window()?.location().hash().ok()?;
    slug_from_hash(&hash)
}

/// Point the URL at a card without adding a history entry.
pub fn replace_hash(slug: &str) {
    let Some(window) = web_sys::window() else {
        return;
    };
    let Ok(history) = window.history() else {
        return;
    };
    let _ = history.replace_state_with_url(&JsValue::NULL, "", Some(&format!("#{slug}")));
}

/// Smooth-scroll the card with this slug to the top of the viewport.
pub fn scroll_to_card(slug: &str) -> bool {
    let Some(document) = web_sys::window().and_then(|w| w.document()) else {
        return false;
    };
    let Some(element) = document
        .get_element_by_id(&wrapper_id(slug))
        .or_else(|| document.get_element_by_id(slug))
    else {
        return false;
    };

    let options = ScrollIntoViewOptions::new();
    options.set_behavior(ScrollBehavior::Smooth);
    options.set_block(ScrollLogicalPosition::Start);
    element.scroll_into_view_with_scroll_into_view_options(&options);
    true
}
