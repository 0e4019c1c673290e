//! Change-tracked configuration trees.
//!
//! A configuration tree is a set of plain structs, each carrying a
//! [`Changes`] set and a static table of [`Field`] descriptors. The
//! descriptors drive two generic algorithms:
//!
//! - [`put_node`] writes one `(path, value)` event into the tree, creating
//!   keyed list entries on demand and marking every field it writes.
//! - [`process_node`] walks the changed part of a tree and invokes a
//!   processor's callbacks in declared field order, or in the exact reverse
//!   of it when tearing configuration down.
//!
//! Paths use the datastore's `/ns:name[key='value']/child` syntax and are
//! split into [`PathSegment`]s by [`parse_path`].

mod changes;
mod dispatch;
mod error;
mod field;
mod list;
mod node;
mod path;
mod populate;

pub use changes::{Changes, Tracked};
pub use dispatch::{process_list, process_node, run_ordered};
pub use error::{TreeError, ValueError};
pub use field::{Callback, Field, FieldsBuilder, SetFn};
pub use list::KeyedList;
pub use node::{ListEntry, Node, Scope};
pub use path::{PathSegment, parse_path};
pub use populate::put_node;

#[cfg(test)]
mod tests;
