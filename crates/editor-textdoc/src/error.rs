//! Error types.
//!
//! Out-of-bounds positions are never reported here: the document clamps them silently.

use std::path::PathBuf;
use thiserror::Error;

/// Reading a document from disk failed.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read '{}': {source}", path.display())]
    /// Filesystem I/O failed.
    Io {
        /// The path that was being read.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

/// Writing a document to disk failed. The in-memory document is left unchanged.
#[derive(Debug, Error)]
pub enum SaveError {
    #[error("failed to write '{}': {source}", path.display())]
    /// Filesystem I/O failed.
    Io {
        /// The path that was being written.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    #[error("document has no file path")]
    /// [`TextDocument::save`](crate::TextDocument::save) was called on an untitled document.
    NoPath,
}

/// A search pattern failed to compile.
#[derive(Debug, Clone, Error)]
pub enum PatternError {
    #[error("invalid regex: {0}")]
    /// The extended regular expression is malformed.
    InvalidRegex(#[from] regex::Error),

    #[error("invalid Lua pattern '{pattern}': {message}")]
    /// The Lua pattern is malformed.
    InvalidLuaPattern {
        /// The pattern source.
        pattern: String,
        /// What is wrong with it.
        message: String,
    },
}

/// Undo history could not be serialized or restored.
#[derive(Debug, Error)]
pub enum UndoHistoryError {
    #[error("JSON error: {0}")]
    /// JSON encoding or decoding failed.
    Json(#[from] serde_json::Error),

    #[error("unknown undo command type '{0}'")]
    /// An entry names a command kind this version does not know.
    UnknownCommand(String),
}

/// A position or range string was not in `line:column` (or `line:column - line:column`) form.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("malformed position or range: '{input}'")]
pub struct ParsePositionError {
    input: String,
}

impl ParsePositionError {
    pub(crate) fn new(input: &str) -> Self {
        Self {
            input: input.to_string(),
        }
    }
}
