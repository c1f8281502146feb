//! Command implementations for the confedit CLI
//!
//! Each command parses its arguments into library types and delegates to
//! confedit-core, then prints a single JSON report on stdout.

pub mod file;
pub mod var;

use anyhow::Result;
use confedit_core::{EnsureRequest, Node, State};
use serde::Serialize;

/// Build a request from raw CLI strings. The state is validated before the
/// value so that a bad state is reported first.
fn request(key: &str, value: Option<&str>, state: &str) -> Result<EnsureRequest> {
    let state: State = state.parse()?;
    let value = value.map(Node::from_literal);
    Ok(EnsureRequest::new(key, value, state)?)
}

/// The matched value is only reported for `check`.
fn reported_value(request: &EnsureRequest, matched: Option<Node>) -> Option<Node> {
    match request.state() {
        State::Check => matched,
        State::Present | State::Absent => None,
    }
}

fn print_report(report: &impl Serialize) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(report)?);
    Ok(())
}
