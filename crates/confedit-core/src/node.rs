//! The in-memory document tree.
//!
//! Copyright (c) 2025 Posit, PBC
//!
//! A document is a closed tree of mappings, sequences and scalars. Mappings
//! keep insertion order so that a loaded file dumps back with its keys where
//! they were.

use indexmap::IndexMap;
use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};
use yaml_rust2::{Yaml, YamlLoader};

use crate::error::{Error, Result};
use crate::store::Format;

/// A node of a configuration document.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// Ordered string keys to child nodes; keys are unique.
    Mapping(IndexMap<String, Node>),

    /// Ordered list of child nodes.
    Sequence(Vec<Node>),

    /// A leaf value.
    Scalar(Scalar),
}

/// A leaf value.
#[derive(Debug, Clone)]
pub enum Scalar {
    Null,
    Bool(bool),
    Integer(i64),
    /// An integer above `i64::MAX`.
    Unsigned(u64),
    Float(f64),
    String(String),
}

impl PartialEq for Scalar {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Scalar::Null, Scalar::Null) => true,
            (Scalar::Bool(a), Scalar::Bool(b)) => a == b,
            (Scalar::Integer(a), Scalar::Integer(b)) => a == b,
            (Scalar::Unsigned(a), Scalar::Unsigned(b)) => a == b,
            // A document holding .nan must still compare equal to itself.
            (Scalar::Float(a), Scalar::Float(b)) => a == b || (a.is_nan() && b.is_nan()),
            // 1 and 1.0 describe the same configuration value
            (Scalar::Integer(i), Scalar::Float(f)) | (Scalar::Float(f), Scalar::Integer(i)) => {
                *i as f64 == *f
            }
            (Scalar::Unsigned(u), Scalar::Float(f)) | (Scalar::Float(f), Scalar::Unsigned(u)) => {
                *u as f64 == *f
            }
            (Scalar::String(a), Scalar::String(b)) => a == b,
            _ => false,
        }
    }
}

impl Node {
    pub fn null() -> Self {
        Node::Scalar(Scalar::Null)
    }

    /// An empty mapping.
    pub fn mapping() -> Self {
        Node::Mapping(IndexMap::new())
    }

    /// An empty sequence.
    pub fn sequence() -> Self {
        Node::Sequence(Vec::new())
    }

    pub fn is_mapping(&self) -> bool {
        matches!(self, Node::Mapping(_))
    }

    pub fn is_sequence(&self) -> bool {
        matches!(self, Node::Sequence(_))
    }

    pub fn is_scalar(&self) -> bool {
        matches!(self, Node::Scalar(_))
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Node::Scalar(Scalar::Null))
    }

    /// Mappings and sequences are containers; scalars are not.
    pub fn is_container(&self) -> bool {
        !self.is_scalar()
    }

    pub fn as_mapping(&self) -> Option<&IndexMap<String, Node>> {
        match self {
            Node::Mapping(entries) => Some(entries),
            _ => None,
        }
    }

    pub fn as_sequence(&self) -> Option<&[Node]> {
        match self {
            Node::Sequence(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Node::Scalar(Scalar::String(s)) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Node::Scalar(Scalar::Integer(i)) => Some(*i),
            _ => None,
        }
    }

    /// Short name of the variant, for logs and error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Node::Mapping(_) => "mapping",
            Node::Sequence(_) => "sequence",
            Node::Scalar(_) => "scalar",
        }
    }

    /// Parse a value literal as given on a command line.
    ///
    /// The literal is read as a YAML document, so `30` is an integer,
    /// `[1, 2]` a sequence and `{a: 1}` a mapping. Text that is not valid
    /// YAML is kept verbatim as a string.
    pub fn from_literal(text: &str) -> Node {
        let docs = match YamlLoader::load_from_str(text) {
            Ok(docs) => docs,
            Err(_) => return Node::from(text),
        };
        match docs.into_iter().next() {
            Some(yaml) => Node::from_yaml(yaml).unwrap_or_else(|_| Node::from(text)),
            None => Node::from(text),
        }
    }

    /// Convert a `yaml_rust2` value.
    ///
    /// Scalar mapping keys are stringified; mapping or sequence keys and
    /// unresolved aliases are rejected.
    pub fn from_yaml(yaml: Yaml) -> Result<Node> {
        let node = match yaml {
            Yaml::Null => Node::null(),
            Yaml::Boolean(b) => Node::Scalar(Scalar::Bool(b)),
            Yaml::Integer(i) => Node::Scalar(Scalar::Integer(i)),
            // yaml-rust2 reads integers too large for i64 as reals.
            Yaml::Real(ref text) => match (text.parse::<u64>(), yaml.as_f64()) {
                (Ok(u), _) => Node::Scalar(Scalar::Unsigned(u)),
                (Err(_), Some(f)) => Node::Scalar(Scalar::Float(f)),
                (Err(_), None) => Node::Scalar(Scalar::String(text.clone())),
            },
            Yaml::String(s) => Node::Scalar(Scalar::String(s)),
            Yaml::Array(items) => Node::Sequence(
                items
                    .into_iter()
                    .map(Node::from_yaml)
                    .collect::<Result<Vec<_>>>()?,
            ),
            Yaml::Hash(hash) => {
                let mut entries = IndexMap::with_capacity(hash.len());
                for (key, value) in hash {
                    entries.insert(yaml_key(key)?, Node::from_yaml(value)?);
                }
                Node::Mapping(entries)
            }
            Yaml::Alias(_) | Yaml::BadValue => {
                return Err(Error::Format {
                    format: Format::Yaml,
                    message: "unresolvable alias or bad value".into(),
                });
            }
        };
        Ok(node)
    }

    /// Convert to a `yaml_rust2` value for emitting.
    pub fn to_yaml(&self) -> Yaml {
        match self {
            Node::Mapping(entries) => Yaml::Hash(
                entries
                    .iter()
                    .map(|(k, v)| (Yaml::String(k.clone()), v.to_yaml()))
                    .collect(),
            ),
            Node::Sequence(items) => Yaml::Array(items.iter().map(Node::to_yaml).collect()),
            Node::Scalar(Scalar::Null) => Yaml::Null,
            Node::Scalar(Scalar::Bool(b)) => Yaml::Boolean(*b),
            Node::Scalar(Scalar::Integer(i)) => Yaml::Integer(*i),
            Node::Scalar(Scalar::Unsigned(u)) => Yaml::Real(u.to_string()),
            Node::Scalar(Scalar::Float(f)) => Yaml::Real(yaml_float(*f)),
            Node::Scalar(Scalar::String(s)) => Yaml::String(s.clone()),
        }
    }

    /// Convert a `serde_json` value, keeping object key order.
    pub fn from_json(value: serde_json::Value) -> Node {
        match value {
            serde_json::Value::Null => Node::null(),
            serde_json::Value::Bool(b) => Node::Scalar(Scalar::Bool(b)),
            serde_json::Value::Number(n) => match (n.as_i64(), n.as_u64()) {
                (Some(i), _) => Node::Scalar(Scalar::Integer(i)),
                (None, Some(u)) => Node::Scalar(Scalar::Unsigned(u)),
                (None, None) => Node::Scalar(Scalar::Float(n.as_f64().unwrap_or(f64::NAN))),
            },
            serde_json::Value::String(s) => Node::Scalar(Scalar::String(s)),
            serde_json::Value::Array(items) => {
                Node::Sequence(items.into_iter().map(Node::from_json).collect())
            }
            serde_json::Value::Object(map) => Node::Mapping(
                map.into_iter()
                    .map(|(k, v)| (k, Node::from_json(v)))
                    .collect(),
            ),
        }
    }

    /// Convert to a `serde_json` value. Non-finite floats become `null`.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Node::Mapping(entries) => serde_json::Value::Object(
                entries
                    .iter()
                    .map(|(k, v)| (k.clone(), v.to_json()))
                    .collect(),
            ),
            Node::Sequence(items) => {
                serde_json::Value::Array(items.iter().map(Node::to_json).collect())
            }
            Node::Scalar(Scalar::Null) => serde_json::Value::Null,
            Node::Scalar(Scalar::Bool(b)) => serde_json::Value::Bool(*b),
            Node::Scalar(Scalar::Integer(i)) => serde_json::Value::from(*i),
            Node::Scalar(Scalar::Unsigned(u)) => serde_json::Value::from(*u),
            Node::Scalar(Scalar::Float(f)) => serde_json::Number::from_f64(*f)
                .map_or(serde_json::Value::Null, serde_json::Value::Number),
            Node::Scalar(Scalar::String(s)) => serde_json::Value::String(s.clone()),
        }
    }
}

fn yaml_key(key: Yaml) -> Result<String> {
    match key {
        Yaml::String(s) => Ok(s),
        Yaml::Integer(i) => Ok(i.to_string()),
        Yaml::Real(s) => Ok(s),
        Yaml::Boolean(b) => Ok(b.to_string()),
        Yaml::Null => Ok("null".to_string()),
        other => Err(Error::Format {
            format: Format::Yaml,
            message: format!("unsupported mapping key {:?}", other),
        }),
    }
}

/// Render a float so that it reads back as a float.
fn yaml_float(f: f64) -> String {
    if f.is_nan() {
        ".nan".to_string()
    } else if f.is_infinite() {
        let text = if f > 0.0 { ".inf" } else { "-.inf" };
        text.to_string()
    } else {
        // Debug keeps the fractional part: 1.0, not 1
        format!("{:?}", f)
    }
}

impl Serialize for Node {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Node::Mapping(entries) => {
                let mut map = serializer.serialize_map(Some(entries.len()))?;
                for (k, v) in entries {
                    map.serialize_entry(k, v)?;
                }
                map.end()
            }
            Node::Sequence(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Node::Scalar(Scalar::Null) => serializer.serialize_unit(),
            Node::Scalar(Scalar::Bool(b)) => serializer.serialize_bool(*b),
            Node::Scalar(Scalar::Integer(i)) => serializer.serialize_i64(*i),
            Node::Scalar(Scalar::Unsigned(u)) => serializer.serialize_u64(*u),
            Node::Scalar(Scalar::Float(f)) => serializer.serialize_f64(*f),
            Node::Scalar(Scalar::String(s)) => serializer.serialize_str(s),
        }
    }
}

impl From<Scalar> for Node {
    fn from(scalar: Scalar) -> Self {
        Node::Scalar(scalar)
    }
}

impl From<&str> for Node {
    fn from(s: &str) -> Self {
        Node::Scalar(Scalar::String(s.to_string()))
    }
}

impl From<String> for Node {
    fn from(s: String) -> Self {
        Node::Scalar(Scalar::String(s))
    }
}

impl From<i32> for Node {
    fn from(i: i32) -> Self {
        Node::Scalar(Scalar::Integer(i64::from(i)))
    }
}

impl From<i64> for Node {
    fn from(i: i64) -> Self {
        Node::Scalar(Scalar::Integer(i))
    }
}

impl From<f64> for Node {
    fn from(f: f64) -> Self {
        Node::Scalar(Scalar::Float(f))
    }
}

impl From<bool> for Node {
    fn from(b: bool) -> Self {
        Node::Scalar(Scalar::Bool(b))
    }
}

impl From<Vec<Node>> for Node {
    fn from(items: Vec<Node>) -> Self {
        Node::Sequence(items)
    }
}

impl From<IndexMap<String, Node>> for Node {
    fn from(entries: IndexMap<String, Node>) -> Self {
        Node::Mapping(entries)
    }
}
