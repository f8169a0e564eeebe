mod api;
mod app;
mod auth;
mod auth_ui;
mod card;
mod card_state;
mod chart;
mod config;
mod debounce;
mod deck;
mod deep_link;
mod error;
mod event_loop;
mod favorite;
mod level_cache;
mod log;
mod notes;
mod orchestrator;
mod ordering;
mod preferences;

use leptos::mount::mount_to;
use std::any::Any;
use std::cell::RefCell;
use wasm_bindgen::JsCast;

thread_local! {
    static APP_MOUNT_HANDLE: RefCell<Option<Box<dyn Any>>> = RefCell::new(None);
}

fn main() {
    console_error_panic_hook::set_once();
    let Some(window) = web_sys::window() else {
        return;
    };
    let Some(document) = window.document() else {
        return;
    };
    let mount_target = document
        .get_element_by_id("app")
        .and_then(|node| node.dyn_into::<web_sys::HtmlElement>().ok())
        .or_else(|| document.body());
    let Some(target) = mount_target else {
        log::error("no mount point for the river dashboard");
        return;
    };

    APP_MOUNT_HANDLE.with(move |slot| {
        // Drop any previous mount first so its effects stop touching the card deck.
        let _old = slot.borrow_mut().take();
        let handle = mount_to(target, app::App);
        *slot.borrow_mut() = Some(Box::new(handle));
    });
}
