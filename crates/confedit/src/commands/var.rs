//! `confedit var`

use anyhow::{Context, Result};
use confedit_core::{Format, Node, ensure_tree, load_str};
use serde::Serialize;

use super::{print_report, reported_value, request};

#[derive(Serialize)]
struct VarReport {
    changed: bool,
    value: Option<Node>,
    var: Node,
}

pub fn execute(document: &str, key: &str, value: Option<&str>, state: &str) -> Result<()> {
    let request = request(key, value, state)?;

    // JSON flow documents are valid YAML, so one loader covers both.
    let tree = load_str(document, Format::Yaml).context("failed to parse --var")?;
    let result = ensure_tree(tree, &request)
        .with_context(|| format!("failed to ensure '{}' in --var", key))?;

    print_report(&VarReport {
        changed: result.outcome.changed,
        value: reported_value(&request, result.outcome.matched),
        var: result.tree,
    })
}
