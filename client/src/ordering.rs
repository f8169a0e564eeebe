use std::cmp::Ordering;
use std::collections::HashSet;

use rivers_shared::RunnableKey;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortMode {
    #[default]
    Alphabetical,
    Runnable,
}

impl SortMode {
    pub const ALL: [SortMode; 2] = [SortMode::Alphabetical, SortMode::Runnable];

    pub fn as_str(self) -> &'static str {
        match self {
            SortMode::Alphabetical => "alphabetical",
            SortMode::Runnable => "runnable",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            SortMode::Alphabetical => "A to Z",
            SortMode::Runnable => "Runnable first",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|mode| mode.as_str() == value)
    }
}

/// What the sorter needs to know about one rendered card.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardSortInfo {
    pub id: String,
    pub display_name: String,
    pub runnable_key: RunnableKey,
    /// The card's first fetch has settled; until then its key reads as loading.
    pub load_completed: bool,
}

impl CardSortInfo {
    fn sort_key(&self) -> RunnableKey {
        if self.load_completed {
            self.runnable_key
        } else {
            RunnableKey::Loading
        }
    }
}

/// Locale-aware comparison of two already lowercased names.
#[cfg(target_arch = "wasm32")]
fn compare_names(a: &str, b: &str) -> Ordering {
    js_sys::JsString::from(a)
        .locale_compare(b, &js_sys::Array::new(), &js_sys::Object::new())
        .cmp(&0)
}

/// Native fallback: Latin-1 accents fold onto their base letter, with the
/// accented spelling after the plain one.
#[cfg(not(target_arch = "wasm32"))]
fn compare_names(a: &str, b: &str) -> Ordering {
    let folded = |name: &str| name.chars().map(fold_accent).collect::<String>();
    folded(a).cmp(&folded(b)).then_with(|| a.cmp(b))
}

#[cfg(not(target_arch = "wasm32"))]
fn fold_accent(c: char) -> char {
    match c {
        'à'..='å' => 'a',
        'ç' => 'c',
        'è'..='ë' => 'e',
        'ì'..='ï' => 'i',
        'ñ' => 'n',
        'ò'..='ö' | 'ø' => 'o',
        'ù'..='ü' => 'u',
        'ý' | 'ÿ' => 'y',
        _ => c,
    }
}

/// Desired card order: favorites first, then by mode, then by
/// case-insensitive locale order of names, with the identifier as the final tiebreak.
pub fn sort_cards(cards: &[CardSortInfo], favorites: &HashSet<String>, mode: SortMode) -> Vec<String> {
    let mut keyed: Vec<(bool, RunnableKey, String, &CardSortInfo)> = cards
        .iter()
        .map(|card| {
            (
                !favorites.contains(&card.id),
                card.sort_key(),
                card.display_name.to_lowercase(),
                card,
            )
        })
        .collect();

    keyed.sort_by(|a, b| {
        a.0.cmp(&b.0)
            .then_with(|| match mode {
                SortMode::Runnable => a.1.cmp(&b.1),
                SortMode::Alphabetical => Ordering::Equal,
            })
            .then_with(|| compare_names(&a.2, &b.2))
            .then_with(|| a.3.id.cmp(&b.3.id))
    });

    keyed.into_iter().map(|(_, _, _, card)| card.id.clone()).collect()
}

pub fn order_changed(current: &[String], next: &[String]) -> bool {
    current != next
}

#[cfg(test)]
mod tests {
    use super::*;

    fn card(id: &str, name: &str, key: RunnableKey) -> CardSortInfo {
        CardSortInfo {
            id: id.into(),
            display_name: name.into(),
            runnable_key: key,
            load_completed: true,
        }
    }

    fn favorites(ids: &[&str]) -> HashSet<String> {
        ids.iter().map(|id| id.to_string()).collect()
    }

    #[test]
    fn alphabetical_ignores_case() {
        let cards = vec![
            card("3", "gauley", RunnableKey::Optimal),
            card("1", "Cheat", RunnableKey::NoData),
            card("2", "BIG SANDY", RunnableKey::Loading),
        ];
        assert_eq!(
            sort_cards(&cards, &HashSet::new(), SortMode::Alphabetical),
            vec!["2", "1", "3"]
        );
    }

    #[test]
    fn accented_names_sort_with_their_base_letter() {
        let cards = vec![
            card("z", "Zoar Gap", RunnableKey::NoData),
            card("e", "Éagle Creek", RunnableKey::NoData),
            card("d", "Dry Fork", RunnableKey::NoData),
        ];
        assert_eq!(
            sort_cards(&cards, &HashSet::new(), SortMode::Alphabetical),
            vec!["d", "e", "z"]
        );
    }

    #[test]
    fn card_without_a_settled_first_load_sorts_as_loading() {
        let mut pending = card("p", "Alpha", RunnableKey::Optimal);
        pending.load_completed = false;
        let cards = vec![
            pending,
            card("n", "Beta", RunnableKey::NoAdvisory),
            card("e", "Gamma", RunnableKey::NoData),
        ];
        assert_eq!(
            sort_cards(&cards, &HashSet::new(), SortMode::Runnable),
            vec!["n", "p", "e"]
        );
    }

    #[test]
    fn favorites_are_pinned_in_every_mode() {
        let cards = vec![
            card("a", "Alpha", RunnableKey::Optimal),
            card("b", "Beta", RunnableKey::NoData),
            card("c", "Charlie", RunnableKey::Optimal),
            card("d", "Delta", RunnableKey::OutsideRange),
        ];
        let favs = favorites(&["d", "b"]);
        for mode in SortMode::ALL {
            let order = sort_cards(&cards, &favs, mode);
            let split = order.iter().position(|id| !favs.contains(id)).unwrap_or(order.len());
            assert!(order[..split].iter().all(|id| favs.contains(id)), "{mode:?}: {order:?}");
            assert!(order[split..].iter().all(|id| !favs.contains(id)), "{mode:?}: {order:?}");
        }
    }

    #[test]
    fn runnable_mode_orders_by_key_then_name() {
        let cards = vec![
            card("n", "North Fork", RunnableKey::NoData),
            card("l", "Lower", RunnableKey::Loading),
            card("o2", "Zoar Gap", RunnableKey::Optimal),
            card("o1", "Bull Falls", RunnableKey::Optimal),
            card("x", "Upper", RunnableKey::OutsideRange),
            card("g", "Gorge", RunnableKey::DegenerateRange),
            card("q", "Quiet", RunnableKey::NoAdvisory),
        ];
        assert_eq!(
            sort_cards(&cards, &HashSet::new(), SortMode::Runnable),
            vec!["o1", "o2", "x", "g", "q", "l", "n"]
        );
    }

    #[test]
    fn equal_names_fall_back_to_identifier() {
        let cards = vec![
            card("db-id-9", "Twin Run", RunnableKey::NoData),
            card("db-id-10", "twin run", RunnableKey::NoData),
        ];
        assert_eq!(
            sort_cards(&cards, &HashSet::new(), SortMode::Alphabetical),
            vec!["db-id-10", "db-id-9"]
        );
    }

    #[test]
    fn sorting_sorted_output_is_stable() {
        let cards = vec![
            card("b", "Beta", RunnableKey::Optimal),
            card("a", "Alpha", RunnableKey::OutsideRange),
        ];
        let first = sort_cards(&cards, &favorites(&["a"]), SortMode::Runnable);
        let reordered: Vec<CardSortInfo> = first
            .iter()
            .filter_map(|id| cards.iter().find(|c| &c.id == id).cloned())
            .collect();
        let second = sort_cards(&reordered, &favorites(&["a"]), SortMode::Runnable);
        assert!(!order_changed(&first, &second));
    }

    #[test]
    fn parses_persisted_mode_names() {
        assert_eq!(SortMode::parse("runnable"), Some(SortMode::Runnable));
        assert_eq!(SortMode::parse("alphabetical"), Some(SortMode::Alphabetical));
        assert_eq!(SortMode::parse("favorites"), None);
    }
}
