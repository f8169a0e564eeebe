use std::collections::HashSet;
use std::rc::Rc;

use gloo_storage::Storage;
use leptos::prelude::*;
use rivers_shared::RiverDetail;
use wasm_bindgen_futures::spawn_local;

use crate::api;
use crate::auth::{AuthService, AuthUser, JsIdentityProvider};
use crate::auth_ui::AuthPanel;
use crate::card::RiverCard;
use crate::config::{ApiConfig, SORT_MODE_STORAGE_KEY};
use crate::deck::LeptosDeck;
use crate::deep_link;
use crate::event_loop::{BrowserEventLoop, EventLoop};
use crate::log;
use crate::orchestrator::SortOrchestrator;
use crate::ordering::SortMode;
use crate::preferences::PreferencesClient;

/// Non-reactive services shared by every component.
pub(crate) struct AppServices {
    pub config: ApiConfig,
    pub auth: AuthService,
    pub prefs: PreferencesClient,
    pub orchestrator: Rc<SortOrchestrator>,
}

#[derive(Clone, Copy)]
pub(crate) struct Services(pub StoredValue<AppServices, LocalStorage>);

/// Reactive mirror of the identity state.
#[derive(Clone, Copy)]
pub(crate) struct AuthView {
    pub user: RwSignal<Option<AuthUser>>,
    pub known: RwSignal<bool>,
}

#[derive(Clone, Copy)]
pub(crate) struct FavoriteIds(pub RwSignal<HashSet<String>>);

#[derive(Debug, Clone, PartialEq)]
enum PageState {
    Loading,
    Ready,
    Failed(String),
}

fn load_sort_mode() -> SortMode {
    gloo_storage::SessionStorage::get::<String>(SORT_MODE_STORAGE_KEY)
        .ok()
        .and_then(|value| SortMode::parse(&value))
        .unwrap_or_default()
}

fn save_sort_mode(mode: SortMode) {
    if let Err(e) = gloo_storage::SessionStorage::set(SORT_MODE_STORAGE_KEY, mode.as_str()) {
        log::warn(&format!("could not persist sort mode: {e}"));
    }
}

/// Refill the favorite set used by the heart buttons.
fn refresh_favorites(prefs: PreferencesClient, signed_in: bool, favorites: RwSignal<HashSet<String>>) {
    if !signed_in {
        favorites.set(HashSet::new());
        return;
    }
    spawn_local(async move {
        match prefs.favorite_ids().await {
            Ok(ids) => favorites.set(ids.into_iter().collect()),
            Err(e) => {
                log::warn(&format!("could not load favorites: {e}"));
                favorites.set(HashSet::new());
            }
        }
    });
}

#[component]
pub fn App() -> impl IntoView {
    let config = ApiConfig::load();
    let auth = AuthService::new(Rc::new(JsIdentityProvider));
    let prefs = PreferencesClient::new(config.user_api_base_url.clone(), Rc::new(auth.clone()));

    let deck = LeptosDeck::new();
    let initial_mode = load_sort_mode();
    let event_loop: Rc<dyn EventLoop> = Rc::new(BrowserEventLoop::new());
    let orchestrator = SortOrchestrator::new(
        Rc::new(deck),
        Rc::new(prefs.clone()),
        event_loop,
        initial_mode,
        deep_link::current_slug(),
    );

    let sort_mode = RwSignal::new(initial_mode);
    let page = RwSignal::new(PageState::Loading);
    let auth_view = AuthView {
        user: RwSignal::new(None),
        known: RwSignal::new(false),
    };
    let favorites = RwSignal::new(HashSet::new());

    let subscription = auth.subscribe({
        let orchestrator = Rc::clone(&orchestrator);
        let prefs = prefs.clone();
        move |user| {
            auth_view.user.set(user.cloned());
            auth_view.known.set(true);
            refresh_favorites(prefs.clone(), user.is_some(), favorites);
            orchestrator.auth_changed(user.is_some());
        }
    });
    let subscription = StoredValue::new_local(Some(subscription));
    on_cleanup(move || {
        if let Some(subscription) = subscription.try_update_value(Option::take).flatten() {
            subscription.unsubscribe();
        }
    });

    let api_base = config.api_base_url.clone();
    let services = StoredValue::new_local(AppServices {
        config,
        auth,
        prefs,
        orchestrator: Rc::clone(&orchestrator),
    });
    provide_context(Services(services));
    provide_context(auth_view);
    provide_context(FavoriteIds(favorites));

    {
        let orchestrator = Rc::clone(&orchestrator);
        spawn_local(async move {
            match api::fetch_river_details(&api_base).await {
                Ok(details) => {
                    let details: Vec<RiverDetail> = details
                        .into_iter()
                        .filter(|detail| !detail.site_name.trim().is_empty())
                        .collect();
                    if details.is_empty() {
                        page.set(PageState::Failed("No river details found.".into()));
                        return;
                    }
                    deck.replace(details);
                    page.set(PageState::Ready);
                    orchestrator.cards_rendered();
                }
                Err(e) => {
                    log::error(&format!("river details failed: {e}"));
                    page.set(PageState::Failed(format!("Failed to load river data: {e}")));
                }
            }
        });
    }

    let on_sort_change = {
        let orchestrator = Rc::clone(&orchestrator);
        move |ev: leptos::ev::Event| {
            let Some(mode) = SortMode::parse(&event_target_value(&ev)) else {
                return;
            };
            sort_mode.set(mode);
            save_sort_mode(mode);
            orchestrator.set_mode(mode);
        }
    };

    view! {
        <header class="page-header">
            <h1>"River Levels"</h1>
            <label class="sort-control">
                "Sort: "
                <select on:change=on_sort_change prop:value=move || sort_mode.get().as_str()>
                    {SortMode::ALL
                        .into_iter()
                        .map(|mode| {
                            view! {
                                <option value=mode.as_str() selected=move || sort_mode.get() == mode>
                                    {mode.label()}
                                </option>
                            }
                        })
                        .collect_view()}
                </select>
            </label>
            <AuthPanel />
        </header>
        <main id="rivers" class="river-list">
            {move || match page.get() {
                PageState::Loading => {
                    view! { <p class="page-status">"Loading rivers..."</p> }.into_any()
                }
                PageState::Failed(message) => {
                    view! { <p class="page-error">{message}</p> }.into_any()
                }
                PageState::Ready => {
                    view! {
                        <For
                            each=move || deck.cards().get()
                            key=|card| card.id.clone()
                            children=move |card| view! { <RiverCard card=card /> }
                        />
                    }
                        .into_any()
                }
            }}
        </main>
    }
}
