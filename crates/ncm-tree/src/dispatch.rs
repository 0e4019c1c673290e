//! The dispatch engine.

use crate::list::KeyedList;
use crate::node::{ListEntry, Node, Scope};

/// Runs `step` over `items` in order, or in reverse order when `reverse` is
/// set, stopping at the first error.
pub fn run_ordered<'a, T, E, F>(reverse: bool, items: &'a [T], mut step: F) -> Result<(), E>
where
    F: FnMut(&'a T) -> Result<(), E>,
{
    if reverse {
        items.iter().rev().try_for_each(&mut step)
    } else {
        items.iter().try_for_each(&mut step)
    }
}

/// Invokes `processor` for every changed field of `node`.
///
/// Fields are visited in declared order, or in exactly the reverse order when
/// `reverse` is set. Untouched fields are skipped and the walk stops at the
/// first callback error.
pub fn process_node<N: Node>(
    processor: &mut N::Processor,
    reverse: bool,
    scope: &Scope,
    node: &N,
) -> Result<(), N::Error> {
    run_ordered(reverse, N::fields(), |field| {
        field.dispatch(node, processor, reverse, scope)
    })
}

/// Applies [`process_node`] to every entry of `list`, extending `scope` with
/// each entry's key. Entries are visited in unspecified order.
pub fn process_list<V: ListEntry>(
    processor: &mut V::Processor,
    reverse: bool,
    scope: &Scope,
    list: &KeyedList<V>,
) -> Result<(), V::Error> {
    for (key, entry) in list {
        process_node(processor, reverse, &scope.child(key), entry)?;
    }
    Ok(())
}
