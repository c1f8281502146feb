//! Read-only path resolution.
//!
//! Copyright (c) 2025 Posit, PBC

use crate::node::Node;
use crate::path::{Path, Segment};

/// Walk `path` through `root` and return the addressed node.
///
/// Returns `None` for a missing key, an out-of-range index, or a segment
/// that does not fit the node it is applied to (a key on a sequence, an
/// index on a mapping, anything on a scalar). A node that exists and holds
/// `null` is `Some`.
pub fn resolve<'a>(root: &'a Node, path: &Path) -> Option<&'a Node> {
    path.segments()
        .iter()
        .try_fold(root, |current, segment| step(current, segment))
}

fn step<'a>(node: &'a Node, segment: &Segment) -> Option<&'a Node> {
    match (segment, node) {
        (Segment::Key(key), Node::Mapping(entries)) => entries.get(key),
        (Segment::Index(index), Node::Sequence(items)) => {
            position(*index, items.len()).map(|at| &items[at])
        }
        _ => None,
    }
}

/// Turn a possibly negative index into an in-bounds position.
pub(crate) fn position(index: i64, len: usize) -> Option<usize> {
    let len = len as i64;
    let at = if index < 0 { len + index } else { index };
    if (0..len).contains(&at) {
        Some(at as usize)
    } else {
        None
    }
}
