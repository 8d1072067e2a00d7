//! Identifier allocation and old-to-new remapping for restored windows.

use crate::model::window::WindowId;
use std::collections::{BTreeMap, BTreeSet};

/// Source of fresh window identifiers.
///
/// The workspace store is the production allocator; decode asks it for one
/// id per restored window.
pub trait IdAllocator {
    fn allocate_id(&mut self) -> WindowId;
}

/// Counter-backed allocator for standalone decoding (tools, tests).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SequentialIds {
    next: WindowId,
}

impl SequentialIds {
    pub fn starting_at(first: WindowId) -> Self {
        Self { next: first }
    }
}

impl Default for SequentialIds {
    fn default() -> Self {
        Self::starting_at(1)
    }
}

impl IdAllocator for SequentialIds {
    fn allocate_id(&mut self) -> WindowId {
        let id = self.next;
        self.next = self.next.saturating_add(1);
        id
    }
}

/// Mapping from identifiers recorded in a document to freshly allocated ones.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IdMapping {
    entries: BTreeMap<WindowId, WindowId>,
}

impl IdMapping {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `old -> new`. The first mapping for an old id wins.
    pub fn insert(&mut self, old: WindowId, new: WindowId) -> bool {
        if self.entries.contains_key(&old) {
            return false;
        }
        self.entries.insert(old, new);
        true
    }

    pub fn get(&self, old: WindowId) -> Option<WindowId> {
        self.entries.get(&old).copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (WindowId, WindowId)> + '_ {
        self.entries.iter().map(|(old, new)| (*old, *new))
    }

    /// True when no two old ids map to the same new id.
    pub fn is_bijective(&self) -> bool {
        let targets: BTreeSet<WindowId> = self.entries.values().copied().collect();
        targets.len() == self.entries.len()
    }

    /// Re-keys an old-id map; entries without a mapping are dropped.
    pub fn remap_keys<V>(&self, values: BTreeMap<WindowId, V>) -> BTreeMap<WindowId, V> {
        values
            .into_iter()
            .filter_map(|(old, value)| self.get(old).map(|new| (new, value)))
            .collect()
    }
}
