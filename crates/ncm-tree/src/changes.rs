//! Touched-field bookkeeping shared by every tree node.

use std::collections::HashSet;
use std::fmt;

/// The set of field names written on one node during a population pass.
///
/// Only membership is recorded. Descendant nodes keep their own sets.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Changes {
    touched: HashSet<String>,
}

impl Changes {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks `name` as touched. Marking twice has no further effect.
    pub fn set_change(&mut self, name: &str) {
        if !self.touched.contains(name) {
            self.touched.insert(name.to_owned());
        }
    }

    /// Marks every name in `names` as touched.
    pub fn set_changes<'a, I>(&mut self, names: I)
    where
        I: IntoIterator<Item = &'a str>,
    {
        for name in names {
            self.set_change(name);
        }
    }

    /// Whether `name` was touched.
    #[must_use]
    pub fn get_change(&self, name: &str) -> bool {
        self.touched.contains(name)
    }

    /// Whether **all** of `names` were touched. Vacuously true for no names.
    #[must_use]
    pub fn get_changes(&self, names: &[&str]) -> bool {
        names.iter().all(|name| self.get_change(name))
    }

    /// Whether **at least one** of `names` was touched.
    #[must_use]
    pub fn one_of_change(&self, names: &[&str]) -> bool {
        names.iter().any(|name| self.get_change(name))
    }

    /// Whether the touched set is exactly `names`, ignoring order and
    /// repetition.
    #[must_use]
    pub fn compare(&self, names: &[&str]) -> bool {
        let expected: HashSet<&str> = names.iter().copied().collect();
        expected.len() == self.touched.len() && self.get_changes(names)
    }

    /// Number of touched names.
    #[must_use]
    pub fn len(&self) -> usize {
        self.touched.len()
    }

    /// Whether nothing was touched.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.touched.is_empty()
    }

    /// Touched names in sorted order.
    #[must_use]
    pub fn sorted(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.touched.iter().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Forgets every touched name.
    pub fn clear(&mut self) {
        self.touched.clear();
    }
}

impl fmt::Display for Changes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.sorted().join("|"))
    }
}

/// Capability shared by every node of a configuration tree.
///
/// Implementors only expose their [`Changes`]; every query is derived from
/// that single set.
pub trait Tracked {
    /// The node's touched set.
    fn changes(&self) -> &Changes;

    /// Mutable access to the node's touched set.
    fn changes_mut(&mut self) -> &mut Changes;

    /// See [`Changes::set_change`].
    fn set_change(&mut self, name: &str) {
        self.changes_mut().set_change(name);
    }

    /// See [`Changes::get_change`].
    fn get_change(&self, name: &str) -> bool {
        self.changes().get_change(name)
    }

    /// See [`Changes::get_changes`].
    fn get_changes(&self, names: &[&str]) -> bool {
        self.changes().get_changes(names)
    }

    /// See [`Changes::one_of_change`].
    fn one_of_change(&self, names: &[&str]) -> bool {
        self.changes().one_of_change(names)
    }

    /// See [`Changes::compare`].
    fn compare(&self, names: &[&str]) -> bool {
        self.changes().compare(names)
    }
}

/// Implements [`Tracked`] for structs holding their set in a `changes` field.
#[macro_export]
macro_rules! impl_tracked {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl $crate::Tracked for $ty {
                fn changes(&self) -> &$crate::Changes {
                    &self.changes
                }

                fn changes_mut(&mut self) -> &mut $crate::Changes {
                    &mut self.changes
                }
            }
        )+
    };
}
