//! Read-only access for background workers.
//!
//! A [`DocumentReader`] shares the document's line storage. Each accessor takes the shared read
//! lock for the duration of the call only and copies its result out, so a reader never holds the
//! lock while processing what it read and never observes a line in the middle of an edit.

use crate::line::DocumentLine;
use parking_lot::RwLock;
use std::sync::Arc;

pub(crate) type SharedLines = Arc<RwLock<Vec<DocumentLine>>>;

/// A consistent copy of one line taken under a single lock acquisition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineSnapshot {
    /// Full line text, terminator included.
    pub text: String,
    /// Content hash of `text`.
    pub hash: u64,
    /// Whether `text` is pure ASCII.
    pub is_ascii: bool,
}

/// Cloneable, thread-safe read handle over a [`TextDocument`](crate::TextDocument)'s lines.
///
/// The handle stays valid after the document is dropped; it then keeps reading the last state.
#[derive(Debug, Clone)]
pub struct DocumentReader {
    lines: SharedLines,
}

impl DocumentReader {
    pub(crate) fn new(lines: SharedLines) -> Self {
        Self { lines }
    }

    /// Number of lines.
    pub fn line_count(&self) -> usize {
        self.lines.read().len()
    }

    /// Full text of line `index` (terminator included).
    pub fn line_text(&self, index: usize) -> Option<String> {
        self.with_line(index, |line| line.text().to_string())
    }

    /// Text of line `index` without its terminator.
    pub fn line_text_without_newline(&self, index: usize) -> Option<String> {
        self.with_line(index, |line| line.text_without_newline().to_string())
    }

    /// Content hash of line `index`.
    pub fn line_hash(&self, index: usize) -> Option<u64> {
        self.with_line(index, DocumentLine::hash)
    }

    /// ASCII flag of line `index`.
    pub fn line_is_ascii(&self, index: usize) -> Option<bool> {
        self.with_line(index, DocumentLine::is_ascii)
    }

    /// Text, hash and ASCII flag of line `index`, read atomically.
    pub fn line_snapshot(&self, index: usize) -> Option<LineSnapshot> {
        self.with_line(index, |line| LineSnapshot {
            text: line.text().to_string(),
            hash: line.hash(),
            is_ascii: line.is_ascii(),
        })
    }

    /// Run `f` on line `index` under the read lock.
    ///
    /// `f` must not block or call back into the document: the writer waits while it runs.
    pub fn with_line<R>(&self, index: usize, f: impl FnOnce(&DocumentLine) -> R) -> Option<R> {
        let lines = self.lines.read();
        lines.get(index).map(f)
    }

    /// Whole document text with the final sentinel terminator stripped.
    pub fn text(&self) -> String {
        let lines = self.lines.read();
        let mut text: String = lines.iter().map(DocumentLine::text).collect();
        if text.ends_with('\n') {
            text.pop();
        }
        text
    }
}
