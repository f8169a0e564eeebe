use std::rc::Rc;

use leptos::prelude::*;
use rivers_shared::annotations::format_flow;
use rivers_shared::text::{TextSegment, linkify};
use rivers_shared::{RiverDetail, wrapper_id};
use wasm_bindgen_futures::spawn_local;

use crate::app::Services;
use crate::card_state::{CardState, LoadPhase};
use crate::chart::{CanvasChart, ChartSlot};
use crate::config::is_compact_viewport;
use crate::deck::DeckCard;
use crate::deep_link;
use crate::favorite::FavoriteButton;
use crate::level_cache;
use crate::log;
use crate::notes::NotesPanel;
use crate::orchestrator::ResortReason;

fn bound_label(value: Option<f64>) -> String {
    value.map_or_else(|| "N/A".to_string(), format_flow)
}

fn comment_view(text: &str) -> impl IntoView + use<> {
    linkify(text)
        .into_iter()
        .map(|segment| match segment {
            TextSegment::Text(run) => run.to_string().into_any(),
            TextSegment::Link(url) => {
                let href = url.to_string();
                let label = href.clone();
                view! { <a href=href target="_blank" rel="noopener">{label}</a> }.into_any()
            }
        })
        .collect_view()
}

fn details_above(detail: &RiverDetail) -> impl IntoView + use<> {
    let range = detail.advised_range();
    let whitewater = (!detail.american_whitewater_link.is_empty())
        .then(|| detail.american_whitewater_link.clone());
    view! {
        <div class="river-details">
            {whitewater
                .map(|href| {
                    view! {
                        <p>
                            <a href=href target="_blank" rel="noopener">"American Whitewater"</a>
                        </p>
                    }
                })}
            {(!range.is_empty())
                .then(|| {
                    view! {
                        <p>
                            <strong>"Advised Flow:"</strong>
                            {format!(" {} - {} CFS", bound_label(range.low), bound_label(range.high))}
                        </p>
                    }
                })}
        </div>
    }
}

fn details_below(detail: &RiverDetail) -> impl IntoView + use<> {
    let comments = detail.comments().map(comment_view);
    let gauge = (!detail.gauge_source.is_empty()).then(|| detail.gauge_source.clone());
    let weather = (!detail.local_weather_noaa.is_empty()).then(|| detail.local_weather_noaa.clone());
    let separator = (gauge.is_some() && weather.is_some()).then_some(" | ");
    let has_links = gauge.is_some() || weather.is_some();

    view! {
        <div class="river-details">
            {comments.map(|body| view! { <p><strong>"Comments: "</strong>{body}</p> })}
            {has_links
                .then(|| {
                    view! {
                        <p>
                            {gauge
                                .map(|href| {
                                    view! {
                                        <strong>"Gauge: "</strong>
                                        <a href=href target="_blank" rel="noopener">"Link"</a>
                                    }
                                })}
                            {separator}
                            {weather
                                .map(|href| {
                                    view! {
                                        <strong>"Weather: "</strong>
                                        <a href=href target="_blank" rel="noopener">"NOAA"</a>
                                    }
                                })}
                        </p>
                    }
                })}
        </div>
    }
}

/// One river: header, flow chart, links and notes. Owns its level fetch and
/// chart instance for as long as it is mounted.
#[component]
pub fn RiverCard(card: DeckCard) -> impl IntoView {
    let services = expect_context::<Services>().0;
    let state = card.state;
    let redraw = card.redraw;

    let site_code = Memo::new(move |_| state.with(|s| s.detail().site_code.clone()));
    Effect::new(move || {
        site_code.track();
        let Some(ticket) = state.try_update(CardState::begin_load).flatten() else {
            return;
        };
        let site = site_code.get_untracked();
        let (api_base, orchestrator) = services
            .with_value(|s| (s.config.api_base_url.clone(), Rc::clone(&s.orchestrator)));
        spawn_local(async move {
            let result = level_cache::load_levels(&api_base, &site).await;
            if let Err(e) = &result {
                log::warn(&format!("levels for {site} failed: {e}"));
            }
            let applied = state
                .try_update(|s| s.finish_load(ticket, result))
                .unwrap_or(false);
            if applied {
                orchestrator.invalidate(ResortReason::CardLoaded);
            }
        });
    });

    let canvas_ref = NodeRef::<leptos::html::Canvas>::new();
    let chart = StoredValue::new_local(None::<ChartSlot<CanvasChart>>);
    Effect::new(move || {
        redraw.track();
        state.track();
        let Some(canvas) = canvas_ref.get() else {
            return;
        };
        request_animation_frame(move || {
            chart.try_update_value(|slot| {
                let slot = slot.get_or_insert_with(|| ChartSlot::new(CanvasChart::new(canvas)));
                let result = state.try_with_untracked(|s| slot.rebuild(s, is_compact_viewport()));
                if let Some(Err(e)) = result {
                    log::warn(&format!("chart render failed: {e}"));
                }
            });
        });
    });

    on_cleanup(move || {
        chart.try_update_value(|slot| {
            if let Some(slot) = slot {
                slot.teardown();
            }
        });
        state.try_update(CardState::detach);
    });

    let (detail, slug) = state.with_untracked(|s| (s.detail().clone(), s.slug()));
    let wrapper = wrapper_id(&slug);
    let title = move || state.with(|s| s.display_name().to_string());

    let on_click = {
        let slug = slug.clone();
        move |ev: web_sys::MouseEvent| {
            if deep_link::is_control_click(ev.target()) {
                return;
            }
            deep_link::replace_hash(&slug);
            deep_link::scroll_to_card(&slug);
        }
    };

    view! {
        <div class="river-card-wrapper" id=wrapper>
            <section class="river-card" id=slug on:click=on_click tabindex="0">
                <div class="card-header">
                    <h2>{title}</h2>
                    <FavoriteButton river_id=card.id.clone() river_name=detail.site_name.clone() />
                </div>
                {details_above(&detail)}
                {move || {
                    state
                        .with(|s| match s.phase() {
                            LoadPhase::Idle | LoadPhase::Loading => {
                                Some(view! { <div class="loading">"Loading data..."</div> }.into_any())
                            }
                            LoadPhase::Error(message) => {
                                Some(
                                    view! { <div class="error">{format!("Error: {message}")}</div> }
                                        .into_any(),
                                )
                            }
                            LoadPhase::Ready | LoadPhase::Empty => None,
                        })
                }}
                <canvas
                    node_ref=canvas_ref
                    class="flow-chart"
                    style:display=move || {
                        if state.with(|s| *s.phase() == LoadPhase::Ready) { "block" } else { "none" }
                    }
                ></canvas>
                {details_below(&detail)}
                <NotesPanel river_id=card.id.clone() />
            </section>
        </div>
    }
}
