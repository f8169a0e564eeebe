use leptos::prelude::*;
use wasm_bindgen_futures::spawn_local;

use crate::app::{AuthView, Services};
use crate::log;

/// Header panel: sign-in button, or the signed-in user with a sign-out button.
#[component]
pub fn AuthPanel() -> impl IntoView {
    let services = expect_context::<Services>().0;
    let auth_view = expect_context::<AuthView>();
    let busy = RwSignal::new(false);
    let error = RwSignal::new(None::<String>);

    let on_sign_in = move |_| {
        if busy.get_untracked() {
            return;
        }
        let auth = services.with_value(|s| s.auth.clone());
        busy.set(true);
        error.set(None);
        spawn_local(async move {
            if let Err(e) = auth.sign_in().await {
                log::warn(&format!("sign-in failed: {e}"));
                error.set(Some("Sign-in failed. Please try again.".into()));
            }
            busy.set(false);
        });
    };

    let on_sign_out = move |_| {
        if busy.get_untracked() {
            return;
        }
        let auth = services.with_value(|s| s.auth.clone());
        busy.set(true);
        error.set(None);
        spawn_local(async move {
            if let Err(e) = auth.sign_out().await {
                log::warn(&format!("sign-out failed: {e}"));
                error.set(Some("Sign-out failed. Please try again.".into()));
            }
            busy.set(false);
        });
    };

    view! {
        <div class="auth-container">
            {move || {
                if !auth_view.known.get() {
                    return view! { <span class="loading">"Loading..."</span> }.into_any();
                }
                match auth_view.user.get() {
                    Some(user) => {
                        let name = user.display_name.clone().unwrap_or_else(|| "User".into());
                        let email = user.email.clone().unwrap_or_default();
                        view! {
                            <div class="user-info">
                                {user
                                    .photo_url
                                    .clone()
                                    .map(|src| {
                                        view! { <img class="user-avatar" src=src alt="User avatar" /> }
                                    })}
                                <div>
                                    <div class="user-name">{name}</div>
                                    <div class="user-email">{email}</div>
                                </div>
                            </div>
                            <button
                                class="auth-button sign-out-button"
                                on:click=on_sign_out
                                disabled=move || busy.get()
                            >
                                "Sign out"
                            </button>
                        }
                            .into_any()
                    }
                    None => {
                        view! {
                            <div>"Sign in to save your favorite rivers"</div>
                            <button
                                class="auth-button"
                                on:click=on_sign_in
                                disabled=move || busy.get()
                            >
                                "Sign in with Google"
                            </button>
                        }
                            .into_any()
                    }
                }
            }}
            {move || error.get().map(|message| view! { <div class="error-message">{message}</div> })}
        </div>
    }
}
