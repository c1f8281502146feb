//! Structured-query rendering and evaluation.
//!
//! Copyright (c) 2025 Posit, PBC
//!
//! Lookups can be expressed as a JMESPath-style sub-expression:
//!
//! ```text
//! config."a-b".person[3]
//! ```
//!
//! Only identifiers (bare or double-quoted), `.` chaining and bracketed
//! integer indices are supported. A bare identifier must match
//! `[A-Za-z_][A-Za-z0-9_]*`; anything else, most notably keys containing a
//! hyphen which would otherwise read as a subtraction, has to be quoted.
//! [`to_query`] applies that quoting, and evaluating the rendered query
//! gives the same answer as walking the path segment by segment.

use crate::error::{Error, Result};
use crate::node::Node;
use crate::path::{Path, Segment};

/// A parsed query step.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Step {
    Field(String),
    Index(i64),
}

/// A parsed structured query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    steps: Vec<Step>,
}

/// Render a path as a query expression, quoting keys that are not valid bare
/// identifiers.
pub fn to_query(path: &Path) -> String {
    let mut out = String::new();
    for segment in path.segments() {
        match segment {
            Segment::Key(key) => {
                if !out.is_empty() {
                    out.push('.');
                }
                if is_bare_identifier(key) {
                    out.push_str(key);
                } else {
                    out.push_str(&quote(key));
                }
            }
            Segment::Index(i) => {
                out.push('[');
                out.push_str(&i.to_string());
                out.push(']');
            }
        }
    }
    out
}

/// Parse `expression` and evaluate it against `root`.
pub fn search<'a>(expression: &str, root: &'a Node) -> Result<Option<&'a Node>> {
    Ok(Query::parse(expression)?.evaluate(root))
}

fn is_bare_identifier(key: &str) -> bool {
    let mut chars = key.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn quote(key: &str) -> String {
    let mut out = String::with_capacity(key.len() + 2);
    out.push('"');
    for c in key.chars() {
        if c == '"' || c == '\\' {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('"');
    out
}

impl Query {
    pub fn parse(expression: &str) -> Result<Query> {
        let mut parser = QueryParser {
            expression,
            chars: expression.char_indices().peekable(),
        };
        Ok(Query {
            steps: parser.parse()?,
        })
    }

    /// Evaluate against a document. `None` means no match; a present `null`
    /// is `Some`.
    pub fn evaluate<'a>(&self, root: &'a Node) -> Option<&'a Node> {
        self.steps.iter().try_fold(root, |current, step| match (step, current) {
            (Step::Field(name), Node::Mapping(entries)) => entries.get(name),
            (Step::Index(i), Node::Sequence(items)) => {
                let len = items.len() as i64;
                let at = if *i < 0 { len + i } else { *i };
                if (0..len).contains(&at) {
                    items.get(at as usize)
                } else {
                    None
                }
            }
            _ => None,
        })
    }
}

struct QueryParser<'a> {
    expression: &'a str,
    chars: std::iter::Peekable<std::str::CharIndices<'a>>,
}

impl QueryParser<'_> {
    fn parse(&mut self) -> Result<Vec<Step>> {
        let mut steps = Vec::new();
        match self.peek() {
            None => return Err(self.error("empty expression")),
            Some('[') => steps.push(self.index()?),
            Some(_) => steps.push(self.identifier()?),
        }
        while let Some(c) = self.peek() {
            match c {
                '.' => {
                    self.chars.next();
                    steps.push(self.identifier()?);
                }
                '[' => steps.push(self.index()?),
                other => return Err(self.error(&format!("unexpected character '{}'", other))),
            }
        }
        Ok(steps)
    }

    fn identifier(&mut self) -> Result<Step> {
        match self.peek() {
            Some('"') => {
                self.chars.next();
                let mut name = String::new();
                loop {
                    match self.chars.next() {
                        Some((_, '"')) => return Ok(Step::Field(name)),
                        Some((_, '\\')) => match self.chars.next() {
                            Some((_, c)) => name.push(c),
                            None => return Err(self.error("unterminated escape")),
                        },
                        Some((_, c)) => name.push(c),
                        None => return Err(self.error("unterminated quoted identifier")),
                    }
                }
            }
            Some(c) if c.is_ascii_alphabetic() || c == '_' => {
                let mut name = String::new();
                while let Some(c) = self.peek() {
                    if c.is_ascii_alphanumeric() || c == '_' {
                        name.push(c);
                        self.chars.next();
                    } else {
                        break;
                    }
                }
                Ok(Step::Field(name))
            }
            Some(c) => Err(self.error(&format!(
                "'{}' cannot start a bare identifier; quote it",
                c
            ))),
            None => Err(self.error("expected identifier")),
        }
    }

    fn index(&mut self) -> Result<Step> {
        // consume '['
        self.chars.next();
        let mut digits = String::new();
        while let Some(c) = self.peek() {
            if c == ']' {
                break;
            }
            digits.push(c);
            self.chars.next();
        }
        if self.chars.next().is_none() {
            return Err(self.error("unterminated index"));
        }
        digits
            .parse::<i64>()
            .map(Step::Index)
            .map_err(|_| self.error(&format!("invalid index '{}'", digits)))
    }

    fn peek(&mut self) -> Option<char> {
        self.chars.peek().map(|&(_, c)| c)
    }

    fn error(&self, message: &str) -> Error {
        Error::Query {
            expression: self.expression.to_string(),
            message: message.to_string(),
        }
    }
}
