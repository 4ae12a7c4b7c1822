use std::collections::BTreeSet;

use tracing::info;

use crate::item::{Item, ItemKey};

/// Session-scoped set of keys excluded from future item sets.
#[derive(Debug, Clone, Default)]
pub struct EliminationTracker {
    eliminated: BTreeSet<ItemKey>,
}

impl EliminationTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns false if the key was already eliminated.
    pub fn eliminate(&mut self, key: ItemKey) -> bool {
        let added = self.eliminated.insert(key.clone());
        if added {
            info!(%key, "eliminated");
        }
        added
    }

    /// Puts a key back in play.
    pub fn restore(&mut self, key: &ItemKey) -> bool {
        self.eliminated.remove(key)
    }

    pub fn is_eliminated(&self, key: &ItemKey) -> bool {
        self.eliminated.contains(key)
    }

    pub fn clear(&mut self) {
        self.eliminated.clear();
    }

    pub fn len(&self) -> usize {
        self.eliminated.len()
    }

    pub fn is_empty(&self) -> bool {
        self.eliminated.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &ItemKey> {
        self.eliminated.iter()
    }

    /// Keeps the items that are still in play, preserving order.
    pub fn retain_active(&self, items: Vec<Item>) -> Vec<Item> {
        items
            .into_iter()
            .filter(|item| !self.is_eliminated(&item.key))
            .collect()
    }
}
