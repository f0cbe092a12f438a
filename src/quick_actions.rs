//! Canned phrases offered next to the input box
//!
//! Invoking an entry is the same as typing its phrase and pressing enter.

/// A canned phrase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuickAction {
    phrase: &'static str,
}

impl QuickAction {
    const fn new(phrase: &'static str) -> Self {
        Self { phrase }
    }

    /// Text submitted when the action is invoked
    pub fn phrase(&self) -> &'static str {
        self.phrase
    }

    /// Stable identifier: lower case, whitespace runs replaced by `-`
    pub fn slug(&self) -> String {
        self.phrase
            .to_lowercase()
            .split_whitespace()
            .collect::<Vec<_>>()
            .join("-")
    }
}

const CATALOG: [QuickAction; 5] = [
    QuickAction::new("Show menu"),
    QuickAction::new("Vegetarian options"),
    QuickAction::new("Popular pizzas"),
    QuickAction::new("Wings"),
    QuickAction::new("Allergen info"),
];

/// The fixed, ordered set of quick actions
#[derive(Debug)]
pub struct QuickActionCatalog;

impl QuickActionCatalog {
    pub fn entries() -> &'static [QuickAction] {
        &CATALOG
    }

    pub fn get(index: usize) -> Option<QuickAction> {
        CATALOG.get(index).copied()
    }

    /// Look up an entry by its exact phrase
    pub fn find(phrase: &str) -> Option<QuickAction> {
        CATALOG.iter().find(|action| action.phrase == phrase).copied()
    }

    pub fn len() -> usize {
        CATALOG.len()
    }

    /// Entries are inert while a request is in flight
    pub fn is_enabled(pending: bool) -> bool {
        !pending
    }
}
