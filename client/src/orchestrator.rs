//! Orders the river cards: favorites pinned first, then by the selected
//! sort mode, re-run after card loads, favorite toggles, auth changes and
//! sort-mode changes.

use std::cell::{Cell, RefCell};
use std::collections::HashSet;
use std::rc::{Rc, Weak};

use futures::future::LocalBoxFuture;

use crate::config::{HASH_SCROLL_DELAY_MS, REBUILD_DELAY_MS, RESORT_DEBOUNCE_MS};
use crate::debounce::Debouncer;
use crate::deck::CardDeck;
use crate::error::ClientError;
use crate::event_loop::EventLoop;
use crate::log;
use crate::ordering::{SortMode, order_changed, sort_cards};

/// Source of the signed-in user's favorite river identifiers.
pub trait FavoritesSource {
    fn favorite_ids(&self) -> LocalBoxFuture<'static, Result<Vec<String>, ClientError>>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResortReason {
    CardLoaded,
    FavoritesChanged,
    AuthChanged,
    SortModeChanged,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassOutcome {
    Reordered,
    Unchanged,
    /// A newer pass started while this one awaited favorites.
    Superseded,
}

pub struct SortOrchestrator {
    deck: Rc<dyn CardDeck>,
    favorites: Rc<dyn FavoritesSource>,
    event_loop: Rc<dyn EventLoop>,
    resort: Debouncer,
    rebuild: Debouncer,
    mode: Cell<SortMode>,
    signed_in: Cell<bool>,
    auth_known: Cell<bool>,
    cards_ready: Cell<bool>,
    initial_started: Cell<bool>,
    initial_sort_applied: Cell<bool>,
    deep_link: RefCell<Option<String>>,
    pass_seq: Cell<u64>,
    weak_self: Weak<SortOrchestrator>,
}

impl SortOrchestrator {
    pub fn new(
        deck: Rc<dyn CardDeck>,
        favorites: Rc<dyn FavoritesSource>,
        event_loop: Rc<dyn EventLoop>,
        mode: SortMode,
        deep_link: Option<String>,
    ) -> Rc<Self> {
        Rc::new_cyclic(|weak_self| Self {
            deck,
            favorites,
            resort: Debouncer::new(Rc::clone(&event_loop), RESORT_DEBOUNCE_MS),
            rebuild: Debouncer::new(Rc::clone(&event_loop), REBUILD_DELAY_MS),
            event_loop,
            mode: Cell::new(mode),
            signed_in: Cell::new(false),
            auth_known: Cell::new(false),
            cards_ready: Cell::new(false),
            initial_started: Cell::new(false),
            initial_sort_applied: Cell::new(false),
            deep_link: RefCell::new(deep_link.filter(|slug| !slug.is_empty())),
            pass_seq: Cell::new(0),
            weak_self: weak_self.clone(),
        })
    }

    pub fn mode(&self) -> SortMode {
        self.mode.get()
    }

    pub fn initial_sort_applied(&self) -> bool {
        self.initial_sort_applied.get()
    }

    /// Every card for the details list is mounted.
    pub fn cards_rendered(&self) {
        self.cards_ready.set(true);
        self.try_start_initial();
    }

    /// Auth state notification. The first one releases the initial-sort
    /// gate; later ones schedule a resort.
    pub fn auth_changed(&self, signed_in: bool) {
        let was_signed_in = self.signed_in.replace(signed_in);
        if !self.auth_known.replace(true) {
            self.try_start_initial();
        } else if was_signed_in != signed_in {
            self.invalidate(ResortReason::AuthChanged);
        }
    }

    /// Schedule a debounced resort. Ignored until the initial pass has
    /// started, since that pass already observes the change.
    pub fn invalidate(&self, reason: ResortReason) {
        if !self.initial_started.get() {
            log::debug(&format!("resort ({reason:?}) dropped before initial sort"));
            return;
        }
        let weak = self.weak_self.clone();
        self.resort.schedule(move || {
            if let Some(this) = weak.upgrade() {
                this.spawn_pass();
            }
        });
    }

    /// Change the sort mode and resort without waiting for the debounce.
    pub fn set_mode(&self, mode: SortMode) {
        if self.mode.replace(mode) == mode {
            return;
        }
        self.invalidate(ResortReason::SortModeChanged);
        self.resort.fire_now();
    }

    fn try_start_initial(&self) {
        if !self.cards_ready.get() || !self.auth_known.get() || self.initial_started.replace(true)
        {
            return;
        }
        self.spawn_pass();
    }

    fn spawn_pass(&self) {
        let Some(this) = self.weak_self.upgrade() else {
            return;
        };
        self.event_loop.spawn_local(Box::pin(async move {
            this.sort_pass().await;
        }));
    }

    /// One full sort pass: read favorites, compute the order, reorder only
    /// when it differs, then rebuild charts and honor the deep link.
    pub async fn sort_pass(self: Rc<Self>) -> PassOutcome {
        let seq = self.pass_seq.get() + 1;
        self.pass_seq.set(seq);

        let favorites: HashSet<String> = if self.signed_in.get() {
            match self.favorites.favorite_ids().await {
                Ok(ids) => ids.into_iter().collect(),
                Err(e) => {
                    log::warn(&format!("favorites unavailable, sorting without pins: {e}"));
                    HashSet::new()
                }
            }
        } else {
            HashSet::new()
        };

        if self.pass_seq.get() != seq {
            return PassOutcome::Superseded;
        }
        let favorites = if self.signed_in.get() {
            favorites
        } else {
            HashSet::new()
        };

        let cards = self.deck.snapshot();
        let pending = cards.iter().filter(|card| !card.load_completed).count();
        if pending > 0 {
            log::debug(&format!("sorting with {pending} card(s) still on their first load"));
        }
        let current: Vec<String> = cards.iter().map(|card| card.id.clone()).collect();
        let next = sort_cards(&cards, &favorites, self.mode.get());

        let outcome = if order_changed(&current, &next) {
            self.deck.apply_order(&next);
            let weak = self.weak_self.clone();
            self.rebuild.schedule(move || {
                if let Some(this) = weak.upgrade() {
                    this.deck.rebuild_charts();
                }
            });
            PassOutcome::Reordered
        } else {
            PassOutcome::Unchanged
        };

        if !self.initial_sort_applied.replace(true) {
            self.schedule_deep_link_scroll();
        }
        outcome
    }

    fn schedule_deep_link_scroll(&self) {
        let Some(slug) = self.deep_link.borrow_mut().take() else {
            return;
        };
        let deck = Rc::clone(&self.deck);
        self.event_loop.set_timeout(
            HASH_SCROLL_DELAY_MS,
            Box::new(move || {
                if !deck.scroll_to_slug(&slug) {
                    log::warn(&format!("deep link target #{slug} not found"));
                }
            }),
        );
    }
}

#[cfg(test)]
mod tests {
    use std::cell::{Cell, RefCell};
    use std::collections::VecDeque;
    use std::rc::Rc;

    use futures::channel::oneshot;
    use futures::future::LocalBoxFuture;
    use rivers_shared::RunnableKey;

    use super::*;
    use crate::event_loop::VirtualEventLoop;
    use crate::ordering::CardSortInfo;

    #[derive(Default)]
    struct FakeDeck {
        cards: RefCell<Vec<CardSortInfo>>,
        reorders: Cell<u32>,
        rebuilds: RefCell<Vec<u64>>,
        scrolls: RefCell<Vec<String>>,
        snapshots: Cell<u32>,
        clock: RefCell<Option<Rc<VirtualEventLoop>>>,
    }

    impl FakeDeck {
        fn with_cards(cards: &[(&str, &str, RunnableKey)]) -> Rc<Self> {
            let deck = FakeDeck::default();
            *deck.cards.borrow_mut() = cards
                .iter()
                .map(|(id, name, key)| CardSortInfo {
                    id: id.to_string(),
                    display_name: name.to_string(),
                    runnable_key: *key,
                    load_completed: *key != RunnableKey::Loading,
                })
                .collect();
            Rc::new(deck)
        }

        fn order(&self) -> Vec<String> {
            self.cards.borrow().iter().map(|c| c.id.clone()).collect()
        }

        fn set_key(&self, id: &str, key: RunnableKey) {
            if let Some(card) = self.cards.borrow_mut().iter_mut().find(|c| c.id == id) {
                card.runnable_key = key;
                card.load_completed = key != RunnableKey::Loading;
            }
        }
    }

    impl CardDeck for FakeDeck {
        fn snapshot(&self) -> Vec<CardSortInfo> {
            self.snapshots.set(self.snapshots.get() + 1);
            self.cards.borrow().clone()
        }

        fn apply_order(&self, order: &[String]) {
            self.reorders.set(self.reorders.get() + 1);
            self.cards
                .borrow_mut()
                .sort_by_key(|card| order.iter().position(|id| *id == card.id));
        }

        fn rebuild_charts(&self) {
            let now = self.clock.borrow().as_ref().map_or(0, |clock| clock.now_ms());
            self.rebuilds.borrow_mut().push(now);
        }

        fn scroll_to_slug(&self, slug: &str) -> bool {
            self.scrolls.borrow_mut().push(slug.to_string());
            true
        }
    }

    #[derive(Default)]
    struct FakeFavorites {
        ids: RefCell<Vec<String>>,
        fail: Cell<bool>,
        calls: Cell<u32>,
        gated: RefCell<VecDeque<oneshot::Receiver<()>>>,
    }

    impl FakeFavorites {
        fn with(ids: &[&str]) -> Rc<Self> {
            let favorites = FakeFavorites::default();
            *favorites.ids.borrow_mut() = ids.iter().map(|id| id.to_string()).collect();
            Rc::new(favorites)
        }

        /// Hold the next fetch open until the returned sender fires.
        fn gate_next(&self) -> oneshot::Sender<()> {
            let (tx, rx) = oneshot::channel();
            self.gated.borrow_mut().push_back(rx);
            tx
        }
    }

    impl FavoritesSource for FakeFavorites {
        fn favorite_ids(&self) -> LocalBoxFuture<'static, Result<Vec<String>, ClientError>> {
            self.calls.set(self.calls.get() + 1);
            let gate = self.gated.borrow_mut().pop_front();
            let result = if self.fail.get() {
                Err(ClientError::Network("HTTP error 500".into()))
            } else {
                Ok(self.ids.borrow().clone())
            };
            Box::pin(async move {
                if let Some(gate) = gate {
                    let _ = gate.await;
                }
                result
            })
        }
    }

    struct Harness {
        clock: Rc<VirtualEventLoop>,
        deck: Rc<FakeDeck>,
        favorites: Rc<FakeFavorites>,
        orchestrator: Rc<SortOrchestrator>,
    }

    fn harness(
        cards: &[(&str, &str, RunnableKey)],
        favorites: &[&str],
        mode: SortMode,
        deep_link: Option<&str>,
    ) -> Harness {
        let clock = Rc::new(VirtualEventLoop::new());
        let deck = FakeDeck::with_cards(cards);
        *deck.clock.borrow_mut() = Some(Rc::clone(&clock));
        let favorites = FakeFavorites::with(favorites);
        let orchestrator = SortOrchestrator::new(
            deck.clone(),
            favorites.clone(),
            clock.clone(),
            mode,
            deep_link.map(str::to_string),
        );
        Harness {
            clock,
            deck,
            favorites,
            orchestrator,
        }
    }

    #[test]
    fn initial_sort_pins_favorites() {
        let h = harness(
            &[
                ("alpha", "Alpha", RunnableKey::Loading),
                ("beta", "Beta", RunnableKey::Loading),
            ],
            &["beta"],
            SortMode::Alphabetical,
            None,
        );
        h.orchestrator.cards_rendered();
        h.orchestrator.auth_changed(true);
        h.clock.run_until_stalled();

        assert_eq!(h.deck.order(), vec!["beta", "alpha"]);
        assert_eq!(h.deck.reorders.get(), 1);
        assert!(h.orchestrator.initial_sort_applied());
    }

    #[test]
    fn initial_sort_waits_for_first_auth_notification() {
        let h = harness(
            &[
                ("alpha", "Alpha", RunnableKey::Loading),
                ("beta", "Beta", RunnableKey::Loading),
            ],
            &["beta"],
            SortMode::Alphabetical,
            None,
        );
        h.orchestrator.cards_rendered();
        // Card loads finishing before auth resolves must not trigger a pass.
        h.orchestrator.invalidate(ResortReason::CardLoaded);
        h.orchestrator.invalidate(ResortReason::CardLoaded);
        h.clock.advance(1_000);
        assert_eq!(h.deck.snapshots.get(), 0);
        assert_eq!(h.favorites.calls.get(), 0);

        h.orchestrator.auth_changed(true);
        h.clock.run_until_stalled();
        assert_eq!(h.deck.snapshots.get(), 1);
        assert_eq!(h.favorites.calls.get(), 1);
        assert_eq!(h.deck.order(), vec!["beta", "alpha"]);

        h.clock.advance(1_000);
        assert_eq!(h.deck.snapshots.get(), 1);
    }

    #[test]
    fn initial_sort_also_waits_for_cards() {
        let h = harness(
            &[("b", "Beta", RunnableKey::NoData), ("a", "Alpha", RunnableKey::NoData)],
            &[],
            SortMode::Alphabetical,
            None,
        );
        h.orchestrator.auth_changed(false);
        h.clock.run_until_stalled();
        assert_eq!(h.deck.snapshots.get(), 0);

        h.orchestrator.cards_rendered();
        h.clock.run_until_stalled();
        assert_eq!(h.deck.order(), vec!["a", "b"]);
        assert_eq!(h.favorites.calls.get(), 0, "signed-out passes skip favorites");
    }

    #[test]
    fn burst_of_card_loads_runs_one_pass_after_quiet_period() {
        let h = harness(
            &[
                ("a", "Alpha", RunnableKey::Loading),
                ("b", "Beta", RunnableKey::Loading),
                ("c", "Charlie", RunnableKey::Loading),
            ],
            &[],
            SortMode::Runnable,
            None,
        );
        h.orchestrator.cards_rendered();
        h.orchestrator.auth_changed(false);
        h.clock.run_until_stalled();
        let after_initial = h.deck.snapshots.get();

        for (id, key) in [
            ("c", RunnableKey::Optimal),
            ("a", RunnableKey::NoData),
            ("b", RunnableKey::OutsideRange),
        ] {
            h.deck.set_key(id, key);
            h.orchestrator.invalidate(ResortReason::CardLoaded);
            h.clock.advance(100);
        }

        // Last trigger was 100ms ago; the pass is due 300ms after it.
        h.clock.advance(199);
        assert_eq!(h.deck.snapshots.get(), after_initial);
        h.clock.advance(1);
        assert_eq!(h.deck.snapshots.get(), after_initial + 1);
        assert_eq!(h.deck.order(), vec!["c", "b", "a"]);

        h.clock.advance(10_000);
        assert_eq!(h.deck.snapshots.get(), after_initial + 1);
    }

    #[test]
    fn unchanged_order_does_not_touch_the_deck() {
        let h = harness(
            &[("a", "Alpha", RunnableKey::Optimal), ("b", "Beta", RunnableKey::Optimal)],
            &[],
            SortMode::Alphabetical,
            None,
        );
        h.orchestrator.cards_rendered();
        h.orchestrator.auth_changed(false);
        h.clock.advance(1_000);
        assert_eq!(h.deck.reorders.get(), 0);
        assert!(h.deck.rebuilds.borrow().is_empty());

        h.orchestrator.invalidate(ResortReason::CardLoaded);
        h.clock.advance(1_000);
        assert_eq!(h.deck.reorders.get(), 0);
        assert!(h.deck.rebuilds.borrow().is_empty());
    }

    #[test]
    fn second_pass_over_sorted_deck_is_a_no_op() {
        let h = harness(
            &[("b", "Beta", RunnableKey::Optimal), ("a", "Alpha", RunnableKey::Optimal)],
            &[],
            SortMode::Alphabetical,
            None,
        );
        h.orchestrator.auth_changed(false);
        let first = futures::executor::block_on(Rc::clone(&h.orchestrator).sort_pass());
        let second = futures::executor::block_on(Rc::clone(&h.orchestrator).sort_pass());
        assert_eq!(first, PassOutcome::Reordered);
        assert_eq!(second, PassOutcome::Unchanged);
        assert_eq!(h.deck.reorders.get(), 1);
    }

    #[test]
    fn favorite_toggle_mid_session_moves_card_to_front() {
        let h = harness(
            &[
                ("a", "Alpha", RunnableKey::Optimal),
                ("b", "Beta", RunnableKey::OutsideRange),
            ],
            &[],
            SortMode::Runnable,
            None,
        );
        h.orchestrator.cards_rendered();
        h.orchestrator.auth_changed(true);
        h.clock.run_until_stalled();
        assert_eq!(h.deck.order(), vec!["a", "b"]);

        h.favorites.ids.borrow_mut().push("b".into());
        h.orchestrator.invalidate(ResortReason::FavoritesChanged);
        h.clock.advance(300);
        assert_eq!(h.deck.order(), vec!["b", "a"]);
    }

    #[test]
    fn favorites_failure_sorts_without_pins() {
        let h = harness(
            &[("b", "Beta", RunnableKey::NoData), ("a", "Alpha", RunnableKey::NoData)],
            &["b"],
            SortMode::Alphabetical,
            None,
        );
        h.favorites.fail.set(true);
        h.orchestrator.cards_rendered();
        h.orchestrator.auth_changed(true);
        h.clock.run_until_stalled();
        assert_eq!(h.deck.order(), vec!["a", "b"]);
        assert!(h.orchestrator.initial_sort_applied());
    }

    #[test]
    fn signing_out_unpins_favorites() {
        let h = harness(
            &[("a", "Alpha", RunnableKey::NoData), ("b", "Beta", RunnableKey::NoData)],
            &["b"],
            SortMode::Alphabetical,
            None,
        );
        h.orchestrator.cards_rendered();
        h.orchestrator.auth_changed(true);
        h.clock.run_until_stalled();
        assert_eq!(h.deck.order(), vec!["b", "a"]);

        h.orchestrator.auth_changed(false);
        h.clock.advance(300);
        assert_eq!(h.deck.order(), vec!["a", "b"]);
    }

    #[test]
    fn charts_rebuild_after_settle_delay() {
        let h = harness(
            &[("b", "Beta", RunnableKey::NoData), ("a", "Alpha", RunnableKey::NoData)],
            &[],
            SortMode::Alphabetical,
            None,
        );
        h.orchestrator.cards_rendered();
        h.orchestrator.auth_changed(false);
        h.clock.run_until_stalled();
        assert_eq!(h.deck.reorders.get(), 1);
        assert!(h.deck.rebuilds.borrow().is_empty());

        h.clock.advance(49);
        assert!(h.deck.rebuilds.borrow().is_empty());
        h.clock.advance(1);
        assert_eq!(*h.deck.rebuilds.borrow(), vec![50]);
    }

    #[test]
    fn deep_link_scrolls_once_after_first_pass() {
        let h = harness(
            &[("a", "Alpha", RunnableKey::NoData), ("b", "Beta", RunnableKey::NoData)],
            &[],
            SortMode::Alphabetical,
            Some("beta"),
        );
        h.orchestrator.cards_rendered();
        h.clock.advance(1_000);
        assert!(h.deck.scrolls.borrow().is_empty(), "no scroll before initial sort");

        h.orchestrator.auth_changed(false);
        h.clock.advance(149);
        assert!(h.deck.scrolls.borrow().is_empty());
        h.clock.advance(1);
        assert_eq!(*h.deck.scrolls.borrow(), vec!["beta".to_string()]);

        h.orchestrator.invalidate(ResortReason::CardLoaded);
        h.orchestrator.set_mode(SortMode::Runnable);
        h.clock.advance(1_000);
        assert_eq!(h.deck.scrolls.borrow().len(), 1);
    }

    #[test]
    fn mode_change_resorts_immediately() {
        let h = harness(
            &[
                ("a", "Alpha", RunnableKey::NoData),
                ("b", "Beta", RunnableKey::Optimal),
            ],
            &[],
            SortMode::Alphabetical,
            None,
        );
        h.orchestrator.cards_rendered();
        h.orchestrator.auth_changed(false);
        h.clock.run_until_stalled();
        assert_eq!(h.deck.order(), vec!["a", "b"]);

        h.orchestrator.set_mode(SortMode::Runnable);
        h.clock.run_until_stalled();
        assert_eq!(h.deck.order(), vec!["b", "a"]);
        assert_eq!(h.orchestrator.mode(), SortMode::Runnable);
    }

    #[test]
    fn slow_favorites_fetch_is_superseded_by_newer_pass() {
        let h = harness(
            &[("a", "Alpha", RunnableKey::NoData), ("b", "Beta", RunnableKey::NoData)],
            &["b"],
            SortMode::Alphabetical,
            None,
        );
        h.orchestrator.auth_changed(true);
        let release_first = h.favorites.gate_next();

        let first = Rc::new(Cell::new(None));
        let first_slot = Rc::clone(&first);
        let orchestrator = Rc::clone(&h.orchestrator);
        h.clock.spawn_local(Box::pin(async move {
            first_slot.set(Some(orchestrator.sort_pass().await));
        }));
        h.clock.run_until_stalled();
        assert_eq!(first.get(), None);

        let second = futures::executor::block_on(Rc::clone(&h.orchestrator).sort_pass());
        assert_eq!(second, PassOutcome::Reordered);

        let _ = release_first.send(());
        h.clock.run_until_stalled();
        assert_eq!(first.get(), Some(PassOutcome::Superseded));
        assert_eq!(h.deck.reorders.get(), 1);
    }
}
