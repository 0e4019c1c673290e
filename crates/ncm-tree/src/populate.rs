//! The tree populator.

use crate::node::Node;
use crate::path::PathSegment;
use crate::error::TreeError;

const TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::populate");

/// Writes `value` into `node` at the path described by `segments`.
///
/// The first segment selects a field of `node`: leaves parse `value`,
/// nested containers and keyed lists recurse with the remaining segments.
/// The field is marked touched on `node` once the write below it succeeded.
/// Segments naming no declared field are skipped and left unmarked.
pub fn put_node<N: Node>(
    node: &mut N,
    segments: &[PathSegment],
    value: &str,
) -> Result<(), TreeError> {
    let Some((head, rest)) = segments.split_first() else {
        return Ok(());
    };
    let Some(field) = N::fields().iter().find(|field| field.accepts(head.name())) else {
        tracing::debug!(target: TARGET, segment = %head, "ignoring undeclared segment");
        return Ok(());
    };

    field.put(node, rest, value)?;
    node.set_change(field.name());
    Ok(())
}
