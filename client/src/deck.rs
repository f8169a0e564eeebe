use leptos::prelude::*;
use rivers_shared::RiverDetail;

use crate::card_state::CardState;
use crate::deep_link;
use crate::ordering::CardSortInfo;

/// The rendered set of river cards as seen by the sort orchestrator.
pub trait CardDeck {
    /// Sort inputs of every card, in current display order.
    fn snapshot(&self) -> Vec<CardSortInfo>;
    /// Move cards into the given identifier order.
    fn apply_order(&self, order: &[String]);
    /// Ask every card to rebuild its chart.
    fn rebuild_charts(&self);
    /// Scroll the card with this slug into view. Returns whether it exists.
    fn scroll_to_slug(&self, slug: &str) -> bool;
}

#[derive(Clone)]
pub struct DeckCard {
    pub id: String,
    pub state: RwSignal<CardState>,
    pub redraw: RwSignal<u64>,
}

/// Card deck backed by a signal; the view renders it with a keyed `<For>`
/// so a reorder moves existing DOM nodes instead of rebuilding them.
#[derive(Clone, Copy)]
pub struct LeptosDeck {
    cards: RwSignal<Vec<DeckCard>>,
}

impl LeptosDeck {
    pub fn new() -> Self {
        Self {
            cards: RwSignal::new(Vec::new()),
        }
    }

    pub fn cards(&self) -> RwSignal<Vec<DeckCard>> {
        self.cards
    }

    /// Sync the deck with a details list. A river already on the page keeps
    /// its card, loaded levels included, and takes the new metadata.
    pub fn replace(&self, details: Vec<RiverDetail>) {
        let existing = self.cards.get_untracked();
        let cards = details
            .into_iter()
            .map(|detail| {
                let id = detail.identifier();
                match existing.iter().find(|card| card.id == id) {
                    Some(card) => {
                        card.state.update(|state| {
                            state.set_detail(detail);
                        });
                        card.clone()
                    }
                    None => DeckCard {
                        id,
                        state: RwSignal::new(CardState::new(detail)),
                        redraw: RwSignal::new(0),
                    },
                }
            })
            .collect();
        self.cards.set(cards);
    }
}

impl Default for LeptosDeck {
    fn default() -> Self {
        Self::new()
    }
}

impl CardDeck for LeptosDeck {
    fn snapshot(&self) -> Vec<CardSortInfo> {
        self.cards.with_untracked(|cards| {
            cards
                .iter()
                .map(|card| card.state.with_untracked(CardState::sort_info))
                .collect()
        })
    }

    fn apply_order(&self, order: &[String]) {
        self.cards.update(|cards| {
            cards.sort_by_key(|card| {
                order
                    .iter()
                    .position(|id| *id == card.id)
                    .unwrap_or(usize::MAX)
            });
        });
    }

    fn rebuild_charts(&self) {
        self.cards.with_untracked(|cards| {
            for card in cards {
                card.redraw.update(|generation| *generation += 1);
            }
        });
    }

    fn scroll_to_slug(&self, slug: &str) -> bool {
        deep_link::scroll_to_card(slug)
    }
}
