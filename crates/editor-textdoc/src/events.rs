//! Change notifications.
//!
//! Collaborators (highlighters, linters, views) subscribe to a
//! [`TextDocument`](crate::TextDocument) with a closure and receive a [`DocumentEvent`] after
//! each committed change. Events are delivered synchronously on the writer thread, after the
//! line lock has been released, so a callback may read the document through a
//! [`DocumentReader`](crate::DocumentReader).

use crate::range::TextRange;

/// A committed text change.
///
/// `range` is expressed in the coordinates of the document *before* the change; `text` is what
/// now occupies `range.start`. An insert has an empty range, a removal has empty `text`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentContentChange {
    /// Replaced span (pre-change coordinates).
    pub range: TextRange,
    /// Inserted text.
    pub text: String,
}

/// Undo/redo direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UndoRedoKind {
    /// An undo step was applied.
    Undo,
    /// A redo step was applied.
    Redo,
}

/// A document notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentEvent {
    /// Text was inserted or removed.
    TextChanged(DocumentContentChange),
    /// The line at this index changed content and derived state must be recomputed.
    LineInvalidated(usize),
    /// Lines were inserted or removed.
    LineCountChanged {
        /// Line count before the change.
        old: usize,
        /// Line count after the change.
        new: usize,
    },
    /// The primary selection changed.
    SelectionChanged(TextRange),
    /// An undo or redo step finished.
    UndoRedo(UndoRedoKind),
    /// New content was loaded.
    Loaded,
    /// The document was written out.
    Saved,
    /// The document was reset to a single empty line.
    Reset,
}

/// Document event callback function type
pub type DocumentEventCallback = Box<dyn FnMut(&DocumentEvent) + Send>;

#[derive(Default)]
pub(crate) struct Subscribers {
    callbacks: Vec<DocumentEventCallback>,
    /// Events raised while a mutation is in progress
    pending: Vec<DocumentEvent>,
}

impl Subscribers {
    pub(crate) fn subscribe(&mut self, callback: DocumentEventCallback) {
        self.callbacks.push(callback);
    }

    pub(crate) fn len(&self) -> usize {
        self.callbacks.len()
    }

    /// Queue an event; it is delivered by the next [`Subscribers::flush`].
    pub(crate) fn queue(&mut self, event: DocumentEvent) {
        if !self.callbacks.is_empty() {
            self.pending.push(event);
        }
    }

    pub(crate) fn flush(&mut self) {
        if self.pending.is_empty() {
            return;
        }
        let pending = std::mem::take(&mut self.pending);
        for event in &pending {
            for callback in &mut self.callbacks {
                callback(event);
            }
        }
    }
}

impl std::fmt::Debug for Subscribers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscribers")
            .field("callbacks", &self.callbacks.len())
            .field("pending", &self.pending)
            .finish()
    }
}
