//! Idempotent "ensure state" on an in-memory document.
//!
//! Copyright (c) 2025 Posit, PBC
//!
//! [`ensure`] looks up what is currently at the requested path through the
//! structured query the path renders to, decides whether the requested state
//! already holds, and only then calls the mutator. The returned
//! [`EnsureOutcome`] is the whole report; there is no other channel.

use std::fmt;
use std::str::FromStr;

use tracing::debug;

use crate::error::{Error, Result};
use crate::mutate::{Mutation, mutate};
use crate::node::Node;
use crate::path::Path;
use crate::query;

/// The requested state of the addressed node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    /// The node must equal the value; create or overwrite as needed.
    Present,
    /// A node equal to the value must not be there.
    Absent,
    /// Report the current value, never mutate.
    Check,
}

impl State {
    pub fn as_str(&self) -> &'static str {
        match self {
            State::Present => "present",
            State::Absent => "absent",
            State::Check => "check",
        }
    }

    pub fn requires_value(&self) -> bool {
        matches!(self, State::Present | State::Absent)
    }
}

impl FromStr for State {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "present" => Ok(State::Present),
            "absent" => Ok(State::Absent),
            "check" => Ok(State::Check),
            other => Err(Error::InvalidState(other.to_string())),
        }
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A validated request: a path expression, a state, and the value the state
/// needs.
#[derive(Debug, Clone, PartialEq)]
pub struct EnsureRequest {
    path: String,
    value: Option<Node>,
    state: State,
}

impl EnsureRequest {
    /// Fails with [`Error::MissingValue`] when `present` or `absent` comes
    /// without a value.
    pub fn new(path: impl Into<String>, value: Option<Node>, state: State) -> Result<Self> {
        if state.requires_value() && value.is_none() {
            return Err(Error::MissingValue {
                state: state.as_str(),
            });
        }
        Ok(Self {
            path: path.into(),
            value,
            state,
        })
    }

    /// Like [`EnsureRequest::new`], with the state still a string.
    pub fn parse(path: impl Into<String>, value: Option<Node>, state: &str) -> Result<Self> {
        Self::new(path, value, state.parse()?)
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn value(&self) -> Option<&Node> {
        self.value.as_ref()
    }

    pub fn state(&self) -> State {
        self.state
    }
}

/// The result of [`ensure`].
#[derive(Debug, Clone, PartialEq)]
pub struct EnsureOutcome {
    /// Whether the tree was modified.
    pub changed: bool,
    /// What was at the path before the operation (`None`: nothing was).
    pub matched: Option<Node>,
    /// What the mutator did.
    pub mutation: Mutation,
}

/// The result of [`ensure_tree`]: the tree handed back with the report.
#[derive(Debug, Clone, PartialEq)]
pub struct TreeOutcome {
    pub tree: Node,
    pub outcome: EnsureOutcome,
}

/// Bring `tree` into the requested state.
pub fn ensure(tree: &mut Node, request: &EnsureRequest) -> Result<EnsureOutcome> {
    let path = Path::parse_for(&request.path, tree)?;
    let matched = query::search(&query::to_query(&path), tree)?.cloned();

    let value = match (request.state, request.value.as_ref()) {
        (State::Check, _) => return Ok(unchanged(matched)),
        (_, Some(value)) => value,
        (state, None) => {
            return Err(Error::MissingValue {
                state: state.as_str(),
            });
        }
    };

    let satisfied = match request.state {
        State::Present => matched.as_ref() == Some(value),
        State::Absent => matched.as_ref() != Some(value),
        State::Check => true,
    };
    if satisfied {
        debug!(%path, state = %request.state, "already in the requested state");
        return Ok(unchanged(matched));
    }

    let mutation = mutate(tree, &path, value, request.state);
    Ok(EnsureOutcome {
        changed: mutation.is_change(),
        matched,
        mutation,
    })
}

/// The in-memory variant: take ownership of a tree, apply the request, and
/// hand the tree back. Scalar roots are rejected.
pub fn ensure_tree(mut tree: Node, request: &EnsureRequest) -> Result<TreeOutcome> {
    if tree.is_scalar() {
        return Err(Error::UnsupportedRoot(tree.kind()));
    }
    let outcome = ensure(&mut tree, request)?;
    Ok(TreeOutcome { tree, outcome })
}

fn unchanged(matched: Option<Node>) -> EnsureOutcome {
    EnsureOutcome {
        changed: false,
        matched,
        mutation: Mutation::Unchanged,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map(entries: Vec<(&str, Node)>) -> Node {
        Node::Mapping(
            entries
                .into_iter()
                .map(|(k, v)| (k.to_string(), v))
                .collect(),
        )
    }

    fn ints(items: &[i64]) -> Node {
        Node::Sequence(items.iter().copied().map(Node::from).collect())
    }

    fn sample() -> Node {
        map(vec![
            (
                "config",
                map(vec![("a", Node::from(1)), ("a-b", Node::null())]),
            ),
            ("lists", ints(&[10, 20, 30])),
        ])
    }

    fn request(path: &str, value: Option<Node>, state: State) -> EnsureRequest {
        EnsureRequest::new(path, value, state).unwrap()
    }

    #[test]
    fn test_state_parsing() {
        assert_eq!("present".parse::<State>().unwrap(), State::Present);
        assert_eq!("absent".parse::<State>().unwrap(), State::Absent);
        assert_eq!("check".parse::<State>().unwrap(), State::Check);
        assert!(matches!(
            "Present".parse::<State>(),
            Err(Error::InvalidState(s)) if s == "Present"
        ));
    }

    #[test]
    fn test_value_required_for_present_and_absent() {
        assert!(matches!(
            EnsureRequest::new("a", None, State::Present),
            Err(Error::MissingValue { state: "present" })
        ));
        assert!(matches!(
            EnsureRequest::new("a", None, State::Absent),
            Err(Error::MissingValue { state: "absent" })
        ));
        assert!(EnsureRequest::new("a", None, State::Check).is_ok());
    }

    #[test]
    fn test_invalid_state_is_reported_before_missing_value() {
        assert!(matches!(
            EnsureRequest::parse("a", None, "latest"),
            Err(Error::InvalidState(_))
        ));
    }

    #[test]
    fn test_check_reports_found_null() {
        let mut doc = sample();
        let outcome = ensure(&mut doc, &request("config.a-b", None, State::Check)).unwrap();
        assert!(!outcome.changed);
        assert_eq!(outcome.matched, Some(Node::null()));
        assert_eq!(doc, sample());
    }

    #[test]
    fn test_check_reads_keys_that_need_quoting() {
        let mut doc = map(vec![("2024", map(vec![("a-b", Node::from("hyphen"))]))]);
        let outcome = ensure(&mut doc, &request("2024.a-b", None, State::Check)).unwrap();
        assert_eq!(outcome.matched, Some(Node::from("hyphen")));
    }

    #[test]
    fn test_check_on_sequence_root() {
        let mut doc = ints(&[1, 2, 3]);
        let outcome = ensure(&mut doc, &request("-1", None, State::Check)).unwrap();
        assert_eq!(outcome.matched, Some(Node::from(3)));
        let outcome = ensure(&mut doc, &request("7", None, State::Check)).unwrap();
        assert_eq!(outcome.matched, None);
    }

    #[test]
    fn test_present_nan_settles() {
        let mut doc = map(vec![("ratio", Node::from(0.5))]);
        let req = request("ratio", Some(Node::from_literal(".nan")), State::Present);
        assert!(ensure(&mut doc, &req).unwrap().changed);
        assert!(!ensure(&mut doc, &req).unwrap().changed);
    }

    #[test]
    fn test_check_reports_no_match() {
        let mut doc = sample();
        let outcome = ensure(&mut doc, &request("config.zzz", None, State::Check)).unwrap();
        assert!(!outcome.changed);
        assert_eq!(outcome.matched, None);
    }

    #[test]
    fn test_present_changes_then_settles() {
        let mut doc = sample();
        let req = request("config.c", Some(Node::from("x")), State::Present);

        let first = ensure(&mut doc, &req).unwrap();
        assert!(first.changed);
        assert_eq!(first.matched, None);
        assert_eq!(first.mutation, Mutation::Set);

        let second = ensure(&mut doc, &req).unwrap();
        assert!(!second.changed);
        assert_eq!(second.matched, Some(Node::from("x")));
    }

    #[test]
    fn test_present_on_existing_equal_value_is_unchanged() {
        let mut doc = sample();
        let req = request("config.a", Some(Node::from(1.0)), State::Present);
        let outcome = ensure(&mut doc, &req).unwrap();
        assert!(!outcome.changed);
        assert_eq!(doc, sample());
    }

    #[test]
    fn test_absent_only_when_equal() {
        let mut doc = sample();
        let req = request("config.a", Some(Node::from(5)), State::Absent);
        let outcome = ensure(&mut doc, &req).unwrap();
        assert!(!outcome.changed);
        assert_eq!(doc, sample());

        let req = request("config.a", Some(Node::from(1)), State::Absent);
        let outcome = ensure(&mut doc, &req).unwrap();
        assert!(outcome.changed);
        assert_eq!(outcome.mutation, Mutation::Removed);
        assert!(doc.as_mapping().unwrap()["config"].as_mapping().unwrap().get("a").is_none());
    }

    #[test]
    fn test_absorbed_mutation_reports_unchanged() {
        let mut doc = sample();
        let req = request("config[0]", Some(Node::from(1)), State::Present);
        let outcome = ensure(&mut doc, &req).unwrap();
        assert!(!outcome.changed);
        assert_eq!(outcome.mutation, Mutation::Unchanged);
        assert_eq!(doc, sample());
    }

    #[test]
    fn test_append_sentinel_round() {
        let mut doc = map(vec![("l", Node::from(vec![Node::from("a"), Node::from("b")]))]);
        let req = request("l[-1]", Some(Node::from("c")), State::Present);
        assert!(ensure(&mut doc, &req).unwrap().changed);
        assert!(!ensure(&mut doc, &req).unwrap().changed);
        assert_eq!(
            doc,
            map(vec![(
                "l",
                Node::from(vec![Node::from("a"), Node::from("b"), Node::from("c")])
            )])
        );
    }

    #[test]
    fn test_malformed_path() {
        let mut doc = sample();
        let err = ensure(&mut doc, &request("$$", None, State::Check)).unwrap_err();
        assert!(matches!(err, Error::MalformedPath(_)));
    }

    #[test]
    fn test_ensure_tree_returns_the_tree() {
        let delta = map(vec![("name", Node::from("delta"))]);
        let req = request("person[3]", Some(delta), State::Present);
        let people = map(vec![(
            "person",
            Node::from(vec![Node::from("a"), Node::from("b"), Node::from("c")]),
        )]);
        let result = ensure_tree(people, &req).unwrap();
        assert!(result.outcome.changed);
        assert_eq!(
            result.tree.as_mapping().unwrap()["person"].as_sequence().unwrap()[3],
            map(vec![("name", Node::from("delta"))])
        );
    }

    #[test]
    fn test_ensure_tree_sequence_root() {
        let req = request("-1", Some(Node::from(4)), State::Present);
        let result = ensure_tree(ints(&[1, 2, 3]), &req).unwrap();
        assert_eq!(result.tree, ints(&[1, 2, 3, 4]));
    }

    #[test]
    fn test_ensure_tree_rejects_scalars() {
        let req = request("a", Some(Node::from(1)), State::Present);
        assert!(matches!(
            ensure_tree(Node::from("text"), &req),
            Err(Error::UnsupportedRoot("scalar"))
        ));
    }
}
