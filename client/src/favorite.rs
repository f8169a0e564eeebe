use std::rc::Rc;

use leptos::prelude::*;
use wasm_bindgen_futures::spawn_local;

use crate::app::{AuthView, FavoriteIds, Services};
use crate::log;
use crate::orchestrator::ResortReason;

/// Heart toggle. Signed-out users get a sign-in prompt instead.
#[component]
pub fn FavoriteButton(river_id: String, river_name: String) -> impl IntoView {
    let services = expect_context::<Services>().0;
    let auth_view = expect_context::<AuthView>();
    let favorites = expect_context::<FavoriteIds>().0;
    let river_id = StoredValue::new(river_id);
    let busy = RwSignal::new(false);
    let show_prompt = RwSignal::new(false);
    let error = RwSignal::new(None::<String>);

    Effect::new(move || {
        if auth_view.user.with(Option::is_some) {
            show_prompt.set(false);
        }
    });

    let is_favorite = move || river_id.with_value(|id| favorites.with(|ids| ids.contains(id)));

    let on_click = move |ev: leptos::ev::MouseEvent| {
        ev.stop_propagation();
        if auth_view.user.with_untracked(Option::is_none) {
            show_prompt.update(|open| *open = !*open);
            return;
        }
        if busy.get_untracked() {
            return;
        }

        let adding = !river_id.with_value(|id| favorites.with_untracked(|ids| ids.contains(id)));
        let id = river_id.get_value();
        let (prefs, orchestrator) =
            services.with_value(|s| (s.prefs.clone(), Rc::clone(&s.orchestrator)));
        busy.set(true);
        error.set(None);
        spawn_local(async move {
            let result = if adding {
                prefs.add_favorite(&id).await
            } else {
                prefs.remove_favorite(&id).await
            };
            match result {
                Ok(()) => {
                    favorites.update(|ids| {
                        if adding {
                            ids.insert(id.clone());
                        } else {
                            ids.remove(&id);
                        }
                    });
                    orchestrator.invalidate(ResortReason::FavoritesChanged);
                }
                Err(e) => {
                    log::warn(&format!("favorite toggle for {id} failed: {e}"));
                    error.set(Some("Could not update favorites.".into()));
                }
            }
            busy.set(false);
        });
    };

    let on_prompt_sign_in = move |ev: leptos::ev::MouseEvent| {
        ev.stop_propagation();
        show_prompt.set(false);
        let auth = services.with_value(|s| s.auth.clone());
        spawn_local(async move {
            if let Err(e) = auth.sign_in().await {
                log::warn(&format!("sign-in from favorite prompt failed: {e}"));
            }
        });
    };

    let title = move || {
        if auth_view.user.with(Option::is_none) {
            "Sign in to save favorites".to_string()
        } else if is_favorite() {
            format!("Remove {river_name} from favorites")
        } else {
            format!("Add {river_name} to favorites")
        }
    };

    view! {
        <div class="favorite-wrapper">
            <button
                class="favorite-button"
                class:disabled-look=move || auth_view.user.with(Option::is_none)
                title=title
                aria-pressed=move || is_favorite().to_string()
                on:click=on_click
                disabled=move || busy.get() && auth_view.user.with(Option::is_some)
            >
                {move || if is_favorite() { "\u{2665}" } else { "\u{2661}" }}
            </button>
            <Show when=move || show_prompt.get()>
                <div class="signin-prompt-popup" on:click=|ev| ev.stop_propagation()>
                    <p>"Sign in to save your favorite rivers"</p>
                    <button class="google-signin-button" on:click=on_prompt_sign_in>
                        <span>"Sign in with Google"</span>
                    </button>
                </div>
            </Show>
            {move || error.get().map(|message| view! { <p class="error">{message}</p> })}
        </div>
    }
}
