//! Path-addressed editing of YAML and JSON configuration documents.
//!
//! Copyright (c) 2025 Posit, PBC
//!
//! This crate provides:
//! - A format-neutral document tree ([`Node`])
//! - Dotted/bracketed path expressions ([`Path`]) and their resolution
//! - Idempotent mutation: ensure a value is present, absent, or just check it
//! - Loading and dumping YAML/JSON files, with optional backup
//!
//! ```
//! use confedit_core::{EnsureRequest, Node, State, ensure};
//!
//! let mut doc = Node::mapping();
//! let port = Some(Node::from(8080));
//! let request = EnsureRequest::new("server.port", port, State::Present).unwrap();
//! assert!(ensure(&mut doc, &request).unwrap().changed);
//! assert!(!ensure(&mut doc, &request).unwrap().changed);
//! ```

mod ensure;
mod error;
mod file;
mod mutate;
mod node;
mod path;
mod query;
mod resolve;
mod store;

pub use ensure::{EnsureOutcome, EnsureRequest, State, TreeOutcome, ensure, ensure_tree};
pub use error::{Error, Result};
pub use file::{FileOutcome, FileRequest, check_source, ensure_file};
pub use mutate::{Mutation, mutate};
pub use node::{Node, Scalar};
pub use path::{Path, Segment, sanitize};
pub use query::{Query, search, to_query};
pub use resolve::resolve;
pub use store::{Format, dump, dump_to_string, load, load_str};
