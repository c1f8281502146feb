//! In-place tree mutation.
//!
//! Copyright (c) 2025 Posit, PBC
//!
//! [`mutate`] walks a path the way [`crate::resolve`] does, but builds
//! missing structure on the way down when asked for `present`:
//!
//! - a missing mapping entry becomes an empty container (a sequence when the
//!   next segment is an index, a mapping otherwise);
//! - an intermediate scalar is overwritten by such a container, so a path
//!   write always wins over a conflicting scalar;
//! - existing mappings and sequences are descended into, never replaced.
//!
//! At the last segment a mapping key is set, and a sequence index is an
//! *insert*, not an overwrite: `lists[2]` on `[10, 20, 30]` with `100` gives
//! `[10, 20, 100, 30]`. `-1` appends, other negative indices insert after the
//! element they name. Every sequence write is skipped when the element the
//! index currently names already equals the value, which keeps repeated runs
//! from growing the sequence.
//!
//! `absent` only removes an entry whose current value equals the given one.
//!
//! Nothing here fails. Paths that cannot apply to the tree (an index on a
//! mapping, an out-of-range intermediate index, an intermediate index into a
//! sequence that would have to be built, anything below a scalar when not
//! creating) leave the tree untouched and report [`Mutation::Unchanged`].

use indexmap::map::Entry;
use tracing::debug;

use crate::ensure::State;
use crate::node::Node;
use crate::path::{Path, Segment};
use crate::resolve::position;

/// What [`mutate`] did to the tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mutation {
    /// The tree is exactly as it was.
    Unchanged,
    /// A mapping entry was created or overwritten.
    Set,
    /// A value was inserted into a sequence at this position.
    Inserted(usize),
    /// A value was pushed onto the end of a sequence.
    Appended,
    /// A mapping entry or sequence element was removed.
    Removed,
}

impl Mutation {
    pub fn is_change(&self) -> bool {
        !matches!(self, Mutation::Unchanged)
    }
}

/// Apply `state` for `value` at `path`, in place.
pub fn mutate(root: &mut Node, path: &Path, value: &Node, state: State) -> Mutation {
    if state == State::Check {
        return Mutation::Unchanged;
    }
    let segments = path.segments();
    let Some((last, parents)) = segments.split_last() else {
        return Mutation::Unchanged;
    };

    if state == State::Present && !can_descend(root, parents) {
        debug!(%path, "intermediate index cannot be reached or built, nothing to do");
        return Mutation::Unchanged;
    }

    let mut current = root;
    for (i, segment) in parents.iter().enumerate() {
        current = match descend(current, segment, &segments[i + 1], state) {
            Some(child) => child,
            None => {
                debug!(%path, %segment, "path does not apply to the tree, nothing to do");
                return Mutation::Unchanged;
            }
        };
    }

    let mutation = match state {
        State::Present => set(current, last, value),
        State::Absent => remove(current, last, value),
        State::Check => Mutation::Unchanged,
    };
    debug!(%path, ?mutation, "mutated");
    mutation
}

/// Step from `node` into the child named by `segment`, creating or replacing
/// it when `state` is `present`.
fn descend<'a>(
    node: &'a mut Node,
    segment: &Segment,
    next: &Segment,
    state: State,
) -> Option<&'a mut Node> {
    let creating = state == State::Present;
    let child = match (segment, node) {
        (Segment::Key(key), Node::Mapping(entries)) => match entries.entry(key.clone()) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) if creating => {
                debug!(key = %key, "creating missing intermediate");
                entry.insert(container_for(next))
            }
            Entry::Vacant(_) => return None,
        },
        (Segment::Index(index), Node::Sequence(items)) => {
            let at = position(*index, items.len())?;
            &mut items[at]
        }
        _ => return None,
    };

    if creating && child.is_scalar() {
        debug!(%segment, "replacing scalar intermediate with a container");
        *child = container_for(next);
    }
    Some(child)
}

/// Dry run of the walk [`descend`] would do for `present`. A step into
/// structure that would be built (or that replaces a scalar) lands on an
/// empty container, where only a key can be followed; an index there, or a
/// type mismatch, fails before anything is touched.
fn can_descend(root: &Node, parents: &[Segment]) -> bool {
    if root.is_scalar() {
        return false;
    }
    let mut current = Some(root);
    for segment in parents {
        current = match (segment, current) {
            (Segment::Key(key), Some(Node::Mapping(entries))) => entries.get(key),
            (Segment::Key(_), None) => None,
            (Segment::Index(index), Some(Node::Sequence(items))) => {
                match position(*index, items.len()) {
                    Some(at) => Some(&items[at]),
                    None => return false,
                }
            }
            _ => return false,
        }
        .filter(|child| child.is_container());
    }
    true
}

/// The empty container that can hold `next`.
fn container_for(next: &Segment) -> Node {
    match next {
        Segment::Key(_) => Node::mapping(),
        Segment::Index(_) => Node::sequence(),
    }
}

fn set(node: &mut Node, segment: &Segment, value: &Node) -> Mutation {
    match (segment, node) {
        (Segment::Key(key), Node::Mapping(entries)) => {
            if entries.get(key) == Some(value) {
                return Mutation::Unchanged;
            }
            // IndexMap::insert keeps the position of an existing key
            entries.insert(key.clone(), value.clone());
            Mutation::Set
        }
        (Segment::Index(index), Node::Sequence(items)) => insert(items, *index, value),
        _ => Mutation::Unchanged,
    }
}

fn insert(items: &mut Vec<Node>, index: i64, value: &Node) -> Mutation {
    if let Some(at) = position(index, items.len()) {
        if items[at] == *value {
            return Mutation::Unchanged;
        }
    }

    if index == -1 {
        items.push(value.clone());
        return Mutation::Appended;
    }

    if index >= 0 {
        let at = index as usize;
        if at < items.len() {
            items.insert(at, value.clone());
            return Mutation::Inserted(at);
        }
        // Past the end: append, unless the last element is already the value.
        if items.last() == Some(value) {
            return Mutation::Unchanged;
        }
        items.push(value.clone());
        return Mutation::Appended;
    }

    // -n inserts after the element it names, counting from the end.
    let at = (items.len() as i64 + index + 1).max(0) as usize;
    // Before the start: insert at the front, unless the first element is
    // already the value.
    if at == 0 && items.first() == Some(value) {
        return Mutation::Unchanged;
    }
    items.insert(at, value.clone());
    Mutation::Inserted(at)
}

fn remove(node: &mut Node, segment: &Segment, value: &Node) -> Mutation {
    match (segment, node) {
        (Segment::Key(key), Node::Mapping(entries)) => {
            if entries.get(key) != Some(value) {
                return Mutation::Unchanged;
            }
            entries.shift_remove(key);
            Mutation::Removed
        }
        (Segment::Index(index), Node::Sequence(items)) => match position(*index, items.len()) {
            Some(at) if items[at] == *value => {
                items.remove(at);
                Mutation::Removed
            }
            _ => Mutation::Unchanged,
        },
        _ => Mutation::Unchanged,
    }
}
