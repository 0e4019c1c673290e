//! Node capabilities and dispatch scope.

use std::fmt;
use std::hash::Hash;

use crate::changes::Tracked;
use crate::error::TreeError;
use crate::field::Field;
use crate::path::PathSegment;

/// A tree node described by a static table of field descriptors.
///
/// Every node of one tree shares the same `Processor` (usually a `dyn`
/// callback trait) and `Error` so the dispatch engine can recurse through
/// the whole tree with one processor.
pub trait Node: Tracked + Sized + 'static {
    /// Callback target driven by [`process_node`](crate::process_node).
    type Processor: ?Sized;
    /// Error returned by processor callbacks.
    type Error;

    /// Field descriptors in declared order.
    fn fields() -> &'static [Field<Self>];
}

/// A node stored in a [`KeyedList`](crate::KeyedList).
pub trait ListEntry: Node {
    /// Key derived from the list segment's attributes.
    type Key: Clone + Eq + Hash + fmt::Debug + fmt::Display;

    /// Extracts the key from a list segment.
    fn key_from(segment: &PathSegment) -> Result<Self::Key, TreeError>;

    /// Creates an entry for `key`, with defaults for everything else.
    fn with_key(key: &Self::Key) -> Self;
}

/// List keys leading from the top-level entity to the node being visited.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Scope {
    keys: Vec<String>,
}

impl Scope {
    /// Scope of a top-level entity.
    #[must_use]
    pub fn root(key: impl fmt::Display) -> Self {
        Self {
            keys: vec![key.to_string()],
        }
    }

    /// Scope one list level deeper.
    #[must_use]
    pub fn child(&self, key: impl fmt::Display) -> Self {
        let mut keys = self.keys.clone();
        keys.push(key.to_string());
        Self { keys }
    }

    /// Key of the top-level entity, or `""` for an empty scope.
    #[must_use]
    pub fn instance(&self) -> &str {
        self.keys.first().map_or("", String::as_str)
    }

    /// Innermost key, or `""` for an empty scope.
    #[must_use]
    pub fn last(&self) -> &str {
        self.keys.last().map_or("", String::as_str)
    }

    /// Every key, outermost first.
    #[must_use]
    pub fn keys(&self) -> &[String] {
        &self.keys
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.keys.join("/"))
    }
}
