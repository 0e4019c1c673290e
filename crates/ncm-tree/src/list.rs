//! Keyed child collections.

use std::collections::HashMap;
use std::collections::hash_map;

use crate::error::TreeError;
use crate::node::ListEntry;
use crate::path::PathSegment;
use crate::populate::put_node;

/// Children of a list node, keyed by a value derived from path attributes.
///
/// Iteration order is unspecified.
#[derive(Debug, Clone, PartialEq)]
pub struct KeyedList<V: ListEntry> {
    entries: HashMap<V::Key, V>,
}

impl<V: ListEntry> Default for KeyedList<V> {
    fn default() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }
}

impl<V: ListEntry> KeyedList<V> {
    /// Creates an empty list.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Writes `value` below the entry addressed by the first segment.
    ///
    /// The entry is created with [`ListEntry::with_key`] when absent; its key
    /// never changes afterwards. An empty `segments` slice is a no-op.
    pub fn put(&mut self, segments: &[PathSegment], value: &str) -> Result<(), TreeError> {
        let Some((head, rest)) = segments.split_first() else {
            return Ok(());
        };
        let key = V::key_from(head)?;
        let entry = self.entries.entry(key).or_insert_with_key(V::with_key);
        put_node(entry, rest, value)
    }

    /// Entry for `key`.
    #[must_use]
    pub fn get(&self, key: &V::Key) -> Option<&V> {
        self.entries.get(key)
    }

    /// Whether an entry exists for `key`.
    #[must_use]
    pub fn contains_key(&self, key: &V::Key) -> bool {
        self.entries.contains_key(key)
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the list is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in unspecified order.
    pub fn iter(&self) -> hash_map::Iter<'_, V::Key, V> {
        self.entries.iter()
    }

    /// Entries in unspecified order.
    pub fn values(&self) -> hash_map::Values<'_, V::Key, V> {
        self.entries.values()
    }
}

impl<'a, V: ListEntry> IntoIterator for &'a KeyedList<V> {
    type Item = (&'a V::Key, &'a V);
    type IntoIter = hash_map::Iter<'a, V::Key, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
