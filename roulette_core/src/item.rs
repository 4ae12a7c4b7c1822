use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Stable identity of an item, used for elimination.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ItemKey(String);

impl ItemKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// Key of the synthetic entry with the given 1-based ordinal.
    pub fn demo(ordinal: u32) -> Self {
        Self(format!("demo-{ordinal}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ItemKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DisplayPayload {
    Placeholder { ordinal: u32, hue: f64 },
    Image { url: String },
}

impl DisplayPayload {
    pub fn placeholder(ordinal: u32) -> Self {
        // golden-angle spacing keeps neighbouring hues apart
        let hue = (ordinal as f64 * 137.5) % 360.0;
        DisplayPayload::Placeholder { ordinal, hue }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub key: ItemKey,
    pub payload: DisplayPayload,
}

impl Item {
    pub fn demo(ordinal: u32) -> Self {
        Self {
            key: ItemKey::demo(ordinal),
            payload: DisplayPayload::placeholder(ordinal),
        }
    }

    pub fn image(id: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            key: ItemKey::new(id),
            payload: DisplayPayload::Image { url: url.into() },
        }
    }
}

/// Ordered, non-empty sequence of items with unique keys.
///
/// Insertion order defines the index arithmetic used by the carousel and the
/// resolver, so it is never reordered after construction.
#[derive(Debug, Clone, PartialEq)]
pub struct ItemSet {
    items: Vec<Item>,
}

impl ItemSet {
    pub fn new(items: Vec<Item>) -> Result<Self, CoreError> {
        if items.is_empty() {
            return Err(CoreError::EmptyItemSet);
        }
        let mut seen = HashSet::with_capacity(items.len());
        for item in &items {
            if !seen.insert(&item.key) {
                return Err(CoreError::DuplicateKey(item.key.to_string()));
            }
        }
        Ok(Self { items })
    }

    /// Synthetic set of `count` placeholders keyed `demo-1..=demo-count`.
    pub fn demo(count: u32) -> Result<Self, CoreError> {
        let items: Vec<Item> = (1..=count).map(Item::demo).collect();
        Self::new(items).map_err(|_| CoreError::EmptyDemoSource)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    // never true, kept for clippy's len_without_is_empty
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Item> {
        self.items.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Item> {
        self.items.iter()
    }

    pub fn keys(&self) -> impl Iterator<Item = &ItemKey> {
        self.items.iter().map(|item| &item.key)
    }
}
