//! Path expressions.
//!
//! Copyright (c) 2025 Posit, PBC
//!
//! A path expression such as `config.person[3]` addresses one node of a
//! document. It is a dot-separated list of tokens; a token is a mapping key,
//! optionally followed by one or more bracketed signed indices:
//!
//! ```text
//! config.person[3]   -> Key("config"), Key("person"), Index(3)
//! lists[-1]          -> Key("lists"), Index(-1)
//! matrix[0][1]       -> Key("matrix"), Index(0), Index(1)
//! ```
//!
//! Parsing is permissive: characters outside `[a-zA-Z0-9_\-.\[\]]` are
//! silently dropped before tokenizing, and a token whose brackets do not hold
//! an integer is kept whole as a key.

use std::fmt;
use std::str::FromStr;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{Error, Result};
use crate::node::Node;

/// `name[idx][idx]...`; group 1 is the (possibly empty) name, group 2 the
/// bracket run.
static INDEXED_TOKEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([^\[\]]*)((?:\[-?[0-9]+\])+)$").unwrap());

static BRACKETED_INDEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"\[(-?[0-9]+)\]").unwrap());

/// One step of a path.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Segment {
    /// Selects a mapping entry.
    Key(String),

    /// Selects a sequence element. Negative values count from the end; when
    /// mutating, `-1` means "append".
    Index(i64),
}

impl Segment {
    pub fn as_key(&self) -> Option<&str> {
        match self {
            Segment::Key(k) => Some(k),
            Segment::Index(_) => None,
        }
    }

    pub fn as_index(&self) -> Option<i64> {
        match self {
            Segment::Index(i) => Some(*i),
            Segment::Key(_) => None,
        }
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Segment::Key(k) => write!(f, "{}", k),
            Segment::Index(i) => write!(f, "[{}]", i),
        }
    }
}

/// A parsed path expression.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Path {
    segments: Vec<Segment>,
}

impl Path {
    /// Build a path directly from segments.
    pub fn from_segments(segments: Vec<Segment>) -> Self {
        Self { segments }
    }

    /// Parse a path expression.
    ///
    /// Fails with [`Error::MalformedPath`] only when nothing addressable is
    /// left after sanitizing (for example an empty string or `"..."`).
    pub fn parse(expr: &str) -> Result<Path> {
        let clean = sanitize(expr);
        let mut segments = Vec::new();
        for token in clean.split('.').filter(|t| !t.is_empty()) {
            push_token(token, &mut segments);
        }
        if segments.is_empty() {
            return Err(Error::MalformedPath(expr.to_string()));
        }
        Ok(Path { segments })
    }

    /// Parse a path expression against a specific document root.
    ///
    /// When the root is a sequence a bare numeric first token (`2`, `-1`)
    /// addresses an element rather than a key.
    pub fn parse_for(expr: &str, root: &Node) -> Result<Path> {
        let mut path = Path::parse(expr)?;
        if root.is_sequence() {
            if let Some(Segment::Key(first)) = path.segments.first() {
                if let Ok(index) = first.parse::<i64>() {
                    path.segments[0] = Segment::Index(index);
                }
            }
        }
        Ok(path)
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }
}

impl FromStr for Path {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Path::parse(s)
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.segments.iter().enumerate() {
            if i > 0 && matches!(segment, Segment::Key(_)) {
                write!(f, ".")?;
            }
            write!(f, "{}", segment)?;
        }
        Ok(())
    }
}

/// Drop every character outside `[a-zA-Z0-9_\-.\[\]]`.
pub fn sanitize(expr: &str) -> String {
    expr.chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.' | '[' | ']'))
        .collect()
}

fn push_token(token: &str, segments: &mut Vec<Segment>) {
    let Some(caps) = INDEXED_TOKEN.captures(token) else {
        segments.push(Segment::Key(token.to_string()));
        return;
    };

    let name = &caps[1];
    let mut indices = Vec::new();
    for index in BRACKETED_INDEX.captures_iter(&caps[2]) {
        match index[1].parse::<i64>() {
            Ok(i) => indices.push(Segment::Index(i)),
            // Does not fit in an i64; treat the whole token as a key.
            Err(_) => {
                segments.push(Segment::Key(token.to_string()));
                return;
            }
        }
    }

    if !name.is_empty() {
        segments.push(Segment::Key(name.to_string()));
    }
    segments.extend(indices);
}
