//! Priority-based conflict resolution shared by build-time discovery and the
//! registry builder.
//!
//! Candidates are offered in a fixed order. For each key the highest
//! priority wins; on equal priority the candidate offered first is kept.
//! Resolved entries come out in first-seen key order, and a replacement keeps
//! the slot of the entry it replaced.

use std::hash::Hash;

use indexmap::map::Entry;
use indexmap::IndexMap;

/// What happened to an offered candidate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Offer<V> {
    /// First candidate for the key.
    Inserted,
    /// Strictly higher priority; the previous winner is returned.
    Replaced { previous: V },
    /// Strictly lower priority than the current winner; dropped.
    Outranked { winner: V },
    /// Same priority as the current winner, which is kept.
    Tied { winner: V },
}

#[derive(Debug, Clone)]
struct Slot<V> {
    priority: i32,
    value: V,
}

/// Resolves candidates per key by priority.
#[derive(Debug, Clone)]
pub struct PriorityResolver<K, V> {
    slots: IndexMap<K, Slot<V>>,
}

impl<K: Hash + Eq, V: Clone> PriorityResolver<K, V> {
    pub fn new() -> Self {
        Self {
            slots: IndexMap::new(),
        }
    }

    pub fn offer(&mut self, key: K, priority: i32, value: V) -> Offer<V> {
        match self.slots.entry(key) {
            Entry::Vacant(vacant) => {
                vacant.insert(Slot { priority, value });
                Offer::Inserted
            }
            Entry::Occupied(mut occupied) => {
                let slot = occupied.get_mut();
                if slot.priority < priority {
                    let previous = std::mem::replace(&mut slot.value, value);
                    slot.priority = priority;
                    Offer::Replaced { previous }
                } else if slot.priority == priority {
                    Offer::Tied {
                        winner: slot.value.clone(),
                    }
                } else {
                    Offer::Outranked {
                        winner: slot.value.clone(),
                    }
                }
            }
        }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn get(&self, key: &K) -> Option<&V> {
        self.slots.get(key).map(|slot| &slot.value)
    }

    /// Winners in first-seen key order.
    pub fn into_ordered(self) -> Vec<(K, i32, V)> {
        self.slots
            .into_iter()
            .map(|(key, slot)| (key, slot.priority, slot.value))
            .collect()
    }
}

impl<K: Hash + Eq, V: Clone> Default for PriorityResolver<K, V> {
    fn default() -> Self {
        Self::new()
    }
}
