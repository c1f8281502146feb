//! Loading and dumping documents.
//!
//! Copyright (c) 2025 Posit, PBC
//!
//! The format is decided by file extension: `.yaml`/`.yml` or `.json`.
//!
//! YAML is written in block style with 2-space indentation, keys in
//! insertion order, and multi-line strings as literal blocks (`|`) with
//! spaces before line breaks stripped. JSON is pretty-printed with 2-space
//! indentation.

use std::fmt;
use std::fs;
use std::path::Path;

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::info;
use yaml_rust2::{YamlEmitter, YamlLoader};

use crate::error::{Error, Result};
use crate::node::{Node, Scalar};

/// Spaces in front of a line break, or at the very end of the text.
static TRAILING_SPACES: Lazy<Regex> = Lazy::new(|| Regex::new(r" +\n| +$").unwrap());

/// A supported document format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Yaml,
    Json,
}

impl Format {
    /// Pick the format from a file extension.
    pub fn from_path(path: &Path) -> Result<Format> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default();
        match ext {
            "yaml" | "yml" => Ok(Format::Yaml),
            "json" => Ok(Format::Json),
            "" => Err(Error::UnsupportedExtension(String::new())),
            other => Err(Error::UnsupportedExtension(format!(".{}", other))),
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Format::Yaml => f.write_str("YAML"),
            Format::Json => f.write_str("JSON"),
        }
    }
}

/// Read and parse a document, choosing the format by extension.
pub fn load(path: &Path) -> Result<Node> {
    let format = Format::from_path(path)?;
    let content = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
    load_str(&content, format)
}

/// Parse document text. An empty YAML stream is an empty mapping; only the
/// first document of a multi-document stream is read.
pub fn load_str(content: &str, format: Format) -> Result<Node> {
    match format {
        Format::Yaml => {
            let docs = YamlLoader::load_from_str(content).map_err(|e| Error::Format {
                format,
                message: e.to_string(),
            })?;
            match docs.into_iter().next() {
                Some(yaml) => Node::from_yaml(yaml),
                None => Ok(Node::mapping()),
            }
        }
        Format::Json => {
            let value: serde_json::Value =
                serde_json::from_str(content).map_err(|e| Error::Format {
                    format,
                    message: e.to_string(),
                })?;
            Ok(Node::from_json(value))
        }
    }
}

/// Serialize a document. The text always ends with a newline.
pub fn dump_to_string(tree: &Node, format: Format) -> Result<String> {
    match format {
        Format::Yaml => {
            let yaml = strip_trailing_spaces(tree).to_yaml();
            let mut out = String::new();
            let mut emitter = YamlEmitter::new(&mut out);
            emitter.multiline_strings(true);
            emitter.dump(&yaml).map_err(|e| Error::Serialize {
                format,
                message: e.to_string(),
            })?;
            // The emitter opens with a document marker; plain files do not.
            let body = out.strip_prefix("---").map_or(out.as_str(), |rest| {
                rest.trim_start_matches([' ', '\n'])
            });
            Ok(format!("{}\n", body))
        }
        Format::Json => {
            let text = serde_json::to_string_pretty(&tree.to_json()).map_err(|e| {
                Error::Serialize {
                    format,
                    message: e.to_string(),
                }
            })?;
            Ok(format!("{}\n", text))
        }
    }
}

/// Serialize and write a document, returning the number of bytes written.
pub fn dump(tree: &Node, path: &Path, format: Format) -> Result<usize> {
    let text = dump_to_string(tree, format)?;
    fs::write(path, &text).map_err(|e| Error::io(path, e))?;
    info!(path = %path.display(), bytes = text.len(), "wrote {}", format);
    Ok(text.len())
}

/// Copy of the tree with multi-line strings cleaned for literal-block output.
fn strip_trailing_spaces(tree: &Node) -> Node {
    match tree {
        Node::Mapping(entries) => Node::Mapping(
            entries
                .iter()
                .map(|(k, v)| (k.clone(), strip_trailing_spaces(v)))
                .collect(),
        ),
        Node::Sequence(items) => Node::Sequence(items.iter().map(strip_trailing_spaces).collect()),
        Node::Scalar(Scalar::String(s)) if s.contains('\n') => {
            Node::from(TRAILING_SPACES.replace_all(s, "\n").into_owned())
        }
        other => other.clone(),
    }
}
