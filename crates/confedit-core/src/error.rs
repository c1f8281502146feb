//! Error types for configuration editing.
//!
//! Copyright (c) 2025 Posit, PBC
//!
//! Only malformed input and failed preconditions are errors. Structural
//! surprises inside a document (missing keys, out-of-range indices, a key
//! applied to a sequence) are absorbed by the resolver and the mutator and
//! never show up here.

use std::path::PathBuf;

use thiserror::Error;

use crate::store::Format;

/// Result type alias for confedit-core operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while loading, editing or persisting a document.
#[derive(Debug, Error)]
pub enum Error {
    /// The document could not be parsed in its declared format.
    #[error("{format} document is invalid: {message}")]
    Format { format: Format, message: String },

    /// The file suffix is not one of the supported formats.
    #[error("unsupported file extension '{0}'")]
    UnsupportedExtension(String),

    /// The requested state is not `present`, `absent` or `check`.
    #[error("unsupported state '{0}' (expected present, absent or check)")]
    InvalidState(String),

    /// `present` and `absent` need a value to compare against.
    #[error("state '{state}' requires a value")]
    MissingValue { state: &'static str },

    /// Nothing addressable remained after sanitizing the path expression.
    #[error("malformed path expression '{0}'")]
    MalformedPath(String),

    /// A structured-query expression could not be parsed.
    #[error("invalid query '{expression}': {message}")]
    Query { expression: String, message: String },

    /// In-memory documents must be a mapping or a sequence.
    #[error("document root must be a mapping or a sequence, got {0}")]
    UnsupportedRoot(&'static str),

    #[error("source {} not found", .0.display())]
    SourceNotFound(PathBuf),

    #[error("source {} is not readable", .0.display())]
    SourceNotReadable(PathBuf),

    #[error("source {} is not a regular file", .0.display())]
    SourceNotAFile(PathBuf),

    /// The emitter rejected the tree.
    #[error("failed to serialize {format} document: {message}")]
    Serialize { format: Format, message: String },

    /// Any other I/O failure.
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        assert_eq!(
            Error::InvalidState("latest".into()).to_string(),
            "unsupported state 'latest' (expected present, absent or check)"
        );
        assert_eq!(
            Error::MissingValue { state: "present" }.to_string(),
            "state 'present' requires a value"
        );
        assert_eq!(
            Error::UnsupportedExtension(".toml".into()).to_string(),
            "unsupported file extension '.toml'"
        );
    }

    #[test]
    fn test_format_error_names_the_format() {
        let err = Error::Format {
            format: Format::Json,
            message: "expected value".into(),
        };
        assert_eq!(err.to_string(), "JSON document is invalid: expected value");
    }
}
