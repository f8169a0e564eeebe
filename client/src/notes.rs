use leptos::prelude::*;
use wasm_bindgen_futures::spawn_local;

use crate::app::{AuthView, Services};
use crate::log;

#[derive(Debug, Clone, PartialEq)]
enum NoteStatus {
    Idle,
    Busy,
    Failed(&'static str),
}

/// Per-river private note, shown only to signed-in users.
#[component]
pub fn NotesPanel(river_id: String) -> impl IntoView {
    let services = expect_context::<Services>().0;
    let auth_view = expect_context::<AuthView>();
    let river_id = StoredValue::new(river_id);
    let note = RwSignal::new(None::<String>);
    let draft = RwSignal::new(String::new());
    let editing = RwSignal::new(false);
    let status = RwSignal::new(NoteStatus::Idle);

    // (Re)load whenever the signed-in user changes.
    Effect::new(move |previous_uid: Option<Option<String>>| {
        let uid = auth_view.user.with(|user| user.as_ref().map(|u| u.uid.clone()));
        if previous_uid.as_ref() == Some(&uid) {
            return uid;
        }
        editing.set(false);
        note.set(None);
        status.set(NoteStatus::Idle);
        if uid.is_none() {
            return uid;
        }

        let prefs = services.with_value(|s| s.prefs.clone());
        let id = river_id.get_value();
        status.set(NoteStatus::Busy);
        spawn_local(async move {
            match prefs.get_note(&id).await {
                Ok(found) => {
                    note.set(found.as_ref().and_then(|n| n.text()).map(str::to_string));
                    status.set(NoteStatus::Idle);
                }
                Err(e) => {
                    log::warn(&format!("note for {id} failed to load: {e}"));
                    status.set(NoteStatus::Failed("Could not load your note."));
                }
            }
        });
        uid
    });

    let on_edit = move |ev: leptos::ev::MouseEvent| {
        ev.stop_propagation();
        draft.set(note.get_untracked().unwrap_or_default());
        status.set(NoteStatus::Idle);
        editing.set(true);
    };

    let on_cancel = move |ev: leptos::ev::MouseEvent| {
        ev.stop_propagation();
        editing.set(false);
        status.set(NoteStatus::Idle);
    };

    let on_save = move |ev: leptos::ev::MouseEvent| {
        ev.stop_propagation();
        let text = draft.get_untracked().trim().to_string();
        let prefs = services.with_value(|s| s.prefs.clone());
        let id = river_id.get_value();
        status.set(NoteStatus::Busy);
        spawn_local(async move {
            let result = if text.is_empty() {
                prefs.delete_note(&id).await
            } else {
                prefs.save_note(&id, &text).await
            };
            match result {
                Ok(()) => {
                    note.set((!text.is_empty()).then_some(text));
                    editing.set(false);
                    status.set(NoteStatus::Idle);
                }
                Err(e) => {
                    log::warn(&format!("note for {id} failed to save: {e}"));
                    status.set(NoteStatus::Failed("Failed to save note."));
                }
            }
        });
    };

    view! {
        <Show when=move || auth_view.user.with(Option::is_some)>
            <div class="notes-section" on:click=|ev| ev.stop_propagation()>
                <h3>"My Notes"</h3>
                {move || match status.get() {
                    NoteStatus::Busy => view! { <p>"Loading..."</p> }.into_any(),
                    NoteStatus::Failed(message) => {
                        view! {
                            <p class="error">{message}</p>
                            <button class="edit-btn" on:click=on_edit>"Try again"</button>
                        }
                            .into_any()
                    }
                    NoteStatus::Idle if editing.get() => {
                        view! {
                            <textarea
                                aria-label="River note"
                                prop:value=move || draft.get()
                                on:input=move |ev| draft.set(event_target_value(&ev))
                            ></textarea>
                            <div class="notes-actions">
                                <button class="save-btn" on:click=on_save>"Save"</button>
                                <button class="cancel-btn" on:click=on_cancel>"Cancel"</button>
                            </div>
                        }
                            .into_any()
                    }
                    NoteStatus::Idle => {
                        let has_note = note.with(Option::is_some);
                        view! {
                            <div class="note-display" title="Click to edit note" on:click=on_edit>
                                {move || match note.get() {
                                    Some(text) => text.into_any(),
                                    None => {
                                        view! { <em class="note-empty">"No notes for this river yet."</em> }
                                            .into_any()
                                    }
                                }}
                            </div>
                            <div class="notes-actions">
                                <button class="edit-btn" on:click=on_edit>
                                    {if has_note { "Edit Note" } else { "Add Note" }}
                                </button>
                            </div>
                        }
                            .into_any()
                    }
                }}
            </div>
        </Show>
    }
}
