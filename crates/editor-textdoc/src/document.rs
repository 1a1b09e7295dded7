//! The text document.
//!
//! [`TextDocument`] owns the line sequence, the primary selection, file metadata and the undo
//! history. All mutation goes through its methods:
//!
//! - positions and ranges are sanitized (clamped) before use, never rejected
//! - inserted text is normalized to LF; the save format is restored on [`TextDocument::to_bytes`]
//! - every committed edit is recorded in the [`UndoStack`] and then announced to subscribers
//!
//! Lines live in an `Arc<RwLock<Vec<DocumentLine>>>` shared with [`DocumentReader`]s. Each public
//! method takes the lock at most once per step and never while holding it, and subscriber
//! callbacks run after the lock has been released.

use crate::config::DocumentConfig;
use crate::error::{LoadError, PatternError, SaveError};
use crate::events::{DocumentContentChange, DocumentEvent, Subscribers, UndoRedoKind};
use crate::line::DocumentLine;
use crate::line_ending::{LineEnding, normalize_to_lf};
use crate::position::{PositionDelta, TextPosition};
use crate::range::TextRange;
use crate::reader::{DocumentReader, SharedLines};
use crate::undo::{UndoCommand, UndoStack};
use parking_lot::{RwLock, RwLockReadGuard};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// A line-oriented, undoable text buffer.
///
/// # Example
///
/// ```rust
/// use editor_textdoc::{TextDocument, TextPosition, TextRange};
///
/// let mut doc = TextDocument::from_text("foo\nbar");
/// doc.remove(TextRange::new(TextPosition::new(0, 1), TextPosition::new(1, 1)));
/// assert_eq!(doc.text(), "far");
///
/// doc.undo();
/// assert_eq!(doc.text(), "foo\nbar");
/// ```
pub struct TextDocument {
    lines: SharedLines,
    selection: TextRange,
    undo_stack: UndoStack,
    config: DocumentConfig,
    path: Option<PathBuf>,
    line_ending: LineEnding,
    has_bom: bool,
    might_be_binary: bool,
    modification_id: u64,
    epoch: Instant,
    subscribers: Subscribers,
    last_search_error: Option<PatternError>,
}

impl TextDocument {
    /// Create an empty document with the default configuration.
    pub fn new() -> Self {
        Self::with_config(DocumentConfig::default())
    }

    /// Create an empty document.
    pub fn with_config(config: DocumentConfig) -> Self {
        Self {
            lines: Arc::new(RwLock::new(vec![DocumentLine::default()])),
            selection: TextRange::default(),
            undo_stack: UndoStack::new(config.max_undo_stack_size, config.merge_timeout()),
            path: None,
            line_ending: config.default_line_ending,
            has_bom: false,
            might_be_binary: false,
            modification_id: 0,
            epoch: Instant::now(),
            subscribers: Subscribers::default(),
            last_search_error: None,
            config,
        }
    }

    /// Create a document holding `text`.
    pub fn from_text(text: &str) -> Self {
        let mut doc = Self::new();
        doc.load_from_bytes(text.as_bytes());
        doc
    }

    /// Open the file at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, LoadError> {
        let mut doc = Self::new();
        doc.load_from_file(path)?;
        Ok(doc)
    }

    // ---- Load / save ----

    /// Replace the content with `bytes`.
    ///
    /// Detects the line ending from the first terminator, strips a UTF-8 BOM, decodes invalid
    /// UTF-8 lossily, resets the selection to `(0, 0)` and clears the undo history.
    pub fn load_from_bytes(&mut self, bytes: &[u8]) {
        let started = Instant::now();
        let (bytes, has_bom) = match bytes.strip_prefix(UTF8_BOM) {
            Some(rest) => (rest, true),
            None => (bytes, false),
        };
        let text = String::from_utf8_lossy(bytes);
        let line_ending =
            LineEnding::detect_in_text(&text).unwrap_or(self.config.default_line_ending);
        let lines = split_lines(&normalize_to_lf(&text));
        let line_count = lines.len();
        let might_be_binary = lines.first().is_some_and(|line| line.text().contains('\0'));

        let old_count = {
            let mut guard = self.lines.write();
            let old_count = guard.len();
            *guard = lines;
            old_count
        };

        self.line_ending = line_ending;
        self.has_bom = has_bom;
        self.might_be_binary = might_be_binary;
        self.selection = TextRange::default();
        self.undo_stack.clear();
        self.modification_id += 1;
        self.subscribers.queue(DocumentEvent::Loaded);
        if old_count != line_count {
            self.subscribers.queue(DocumentEvent::LineCountChanged {
                old: old_count,
                new: line_count,
            });
        }
        self.subscribers.flush();

        tracing::debug!(
            lines = line_count,
            bytes = bytes.len(),
            ?line_ending,
            has_bom,
            elapsed_us = started.elapsed().as_micros() as u64,
            "document loaded"
        );
    }

    /// Load the file at `path` and remember it as the document's path.
    ///
    /// On failure the document is left unchanged.
    pub fn load_from_file(&mut self, path: impl AsRef<Path>) -> Result<(), LoadError> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        self.load_from_bytes(&bytes);
        self.path = Some(path.to_path_buf());
        Ok(())
    }

    /// Serialized content: the remembered line ending and BOM applied, no final sentinel.
    pub fn to_bytes(&self) -> Vec<u8> {
        let text = self.line_ending.apply_to_text(&self.text());
        let mut bytes = Vec::with_capacity(text.len() + UTF8_BOM.len());
        if self.has_bom {
            bytes.extend_from_slice(UTF8_BOM);
        }
        bytes.extend_from_slice(text.as_bytes());
        bytes
    }

    /// Save to the document's path.
    pub fn save(&mut self) -> Result<(), SaveError> {
        let path = self.path.clone().ok_or(SaveError::NoPath)?;
        self.save_as(path)
    }

    /// Save to `path` and make it the document's path.
    ///
    /// Trailing-whitespace trimming and the forced final newline (if configured) are applied as
    /// one undoable edit first. If writing fails, that edit is rolled back and the document,
    /// including its redo history, is left as it was.
    pub fn save_as(&mut self, path: impl AsRef<Path>) -> Result<(), SaveError> {
        let started = Instant::now();
        let path = path.as_ref();
        let redo_stack = self.undo_stack.take_redo_stack();
        let prepared = self.prepare_for_save();
        let bytes = self.to_bytes();

        if let Err(source) = std::fs::write(path, &bytes) {
            if prepared {
                self.undo();
            }
            self.undo_stack.restore_redo_stack(redo_stack);
            tracing::debug!(path = %path.display(), error = %source, "document save failed");
            return Err(SaveError::Io {
                path: path.to_path_buf(),
                source,
            });
        }

        if !prepared {
            self.undo_stack.restore_redo_stack(redo_stack);
        }
        self.path = Some(path.to_path_buf());
        self.undo_stack.mark_clean();
        self.subscribers.queue(DocumentEvent::Saved);
        self.subscribers.flush();
        tracing::debug!(
            path = %path.display(),
            lines = self.line_count(),
            bytes = bytes.len(),
            elapsed_us = started.elapsed().as_micros() as u64,
            "document saved"
        );
        Ok(())
    }

    /// Apply the configured save-time edits; returns `true` if anything changed.
    fn prepare_for_save(&mut self) -> bool {
        let trim = self.config.trim_trailing_whitespace;
        let force_newline = self.config.force_newline_at_end_of_file;
        if !trim && !force_newline {
            return false;
        }

        let before = self.modification_id;
        self.transaction(|doc| {
            if trim {
                let trailing: Vec<TextRange> = {
                    let lines = doc.lines.read();
                    lines
                        .iter()
                        .enumerate()
                        .filter_map(|(index, line)| trailing_whitespace(index, line))
                        .collect()
                };
                for range in trailing.into_iter().rev() {
                    doc.remove(range);
                }
            }
            if force_newline {
                let end = doc.end_of_doc();
                if end.column > 0 {
                    doc.insert(end, "\n");
                }
            }
        });
        self.modification_id != before
    }

    /// Reset to a single empty line, clearing the path, selection and history.
    pub fn reset(&mut self) {
        let old_count = {
            let mut guard = self.lines.write();
            let old_count = guard.len();
            *guard = vec![DocumentLine::default()];
            old_count
        };
        self.path = None;
        self.line_ending = self.config.default_line_ending;
        self.has_bom = false;
        self.might_be_binary = false;
        self.selection = TextRange::default();
        self.undo_stack.clear();
        self.modification_id += 1;
        self.subscribers.queue(DocumentEvent::Reset);
        self.subscribers.flush();
        tracing::debug!(old_lines = old_count, "document reset");
    }

    // ---- Edits ----

    /// Insert `text` at `position` (sanitized) and return the position right after it.
    ///
    /// `"\r\n"` and `'\r'` in `text` are normalized to `'\n'`.
    pub fn insert(&mut self, position: TextPosition, text: &str) -> TextPosition {
        let text = normalize_to_lf(text);
        let position = self.sanitize_position(position);
        if text.is_empty() {
            return position;
        }
        let selection_before = self.selection;
        let end = self.apply_insert(position, &text);
        let now = self.now();
        self.undo_stack
            .record_insert(&text, position, selection_before, now);
        self.subscribers.flush();
        end
    }

    /// Remove `range` (normalized and sanitized) and return its start.
    pub fn remove(&mut self, range: TextRange) -> TextPosition {
        let selection_before = self.selection;
        let (start, removed) = self.apply_remove(range);
        if !removed.is_empty() {
            let now = self.now();
            self.undo_stack.record_remove(
                TextRange::new(start, start.advanced_by(&removed)),
                &removed,
                selection_before,
                now,
            );
        }
        self.subscribers.flush();
        start
    }

    /// Replace `range` with `text` as a single undo step; returns the position after `text`.
    pub fn replace_range(&mut self, range: TextRange, text: &str) -> TextPosition {
        self.transaction(|doc| {
            let start = doc.remove(range);
            doc.insert(start, text)
        })
    }

    /// Run `f` so that every edit it makes forms one undo step.
    pub fn transaction<R>(&mut self, f: impl FnOnce(&mut Self) -> R) -> R {
        let now = self.now();
        self.undo_stack.begin_transaction(self.selection, now);
        let result = f(self);
        self.undo_stack.end_transaction();
        result
    }

    fn apply_insert(&mut self, position: TextPosition, text: &str) -> TextPosition {
        let mut segments: Vec<String> = text.split('\n').map(str::to_string).collect();
        let last = segments.len() - 1;
        for segment in &mut segments[..last] {
            segment.push('\n');
        }

        let (position, old_count, new_count) = {
            let mut lines = self.lines.write();
            let position = sanitize_in(&lines, position);
            let old_count = lines.len();
            let line = &lines[position.line];
            let before = line.substr(0, position.column).to_string();
            let after = line.tail(position.column).to_string();
            segments[0].insert_str(0, &before);
            segments[last].push_str(&after);

            let mut segments = segments.into_iter();
            if let Some(first) = segments.next() {
                lines[position.line].set_text(first);
            }
            let at = position.line + 1;
            lines.splice(at..at, segments.map(DocumentLine::new));
            (position, old_count, lines.len())
        };

        self.modification_id += 1;
        for line in position.line..=position.line + last {
            self.subscribers.queue(DocumentEvent::LineInvalidated(line));
        }
        self.subscribers
            .queue(DocumentEvent::TextChanged(DocumentContentChange {
                range: TextRange::caret(position),
                text: text.to_string(),
            }));
        if old_count != new_count {
            self.subscribers.queue(DocumentEvent::LineCountChanged {
                old: old_count,
                new: new_count,
            });
        }
        self.clamp_selection();

        tracing::trace!(%position, len = text.len(), lines = new_count, "insert");
        position.advanced_by(text)
    }

    fn apply_remove(&mut self, range: TextRange) -> (TextPosition, String) {
        let (range, removed, old_count, new_count) = {
            let mut lines = self.lines.write();
            let range = sanitize_range_in(&lines, range.normalized());
            if !range.has_selection() {
                return (range.start, String::new());
            }
            let old_count = lines.len();
            let removed = range_text_in(&lines, range);
            let (start, end) = (range.start, range.end);
            let joined = format!(
                "{}{}",
                lines[start.line].substr(0, start.column),
                lines[end.line].tail(end.column)
            );
            lines[start.line].set_text(joined);
            if end.line > start.line {
                lines.drain(start.line + 1..=end.line);
            }
            (range, removed, old_count, lines.len())
        };

        self.modification_id += 1;
        self.subscribers
            .queue(DocumentEvent::LineInvalidated(range.start.line));
        self.subscribers
            .queue(DocumentEvent::TextChanged(DocumentContentChange {
                range,
                text: String::new(),
            }));
        if old_count != new_count {
            self.subscribers.queue(DocumentEvent::LineCountChanged {
                old: old_count,
                new: new_count,
            });
        }
        self.clamp_selection();

        tracing::trace!(%range, len = removed.len(), lines = new_count, "remove");
        (range.start, removed)
    }

    // ---- Undo / redo ----

    /// Undo the most recent step. Returns `false` if there is nothing to undo.
    pub fn undo(&mut self) -> bool {
        let Some(group) = self.undo_stack.pop_undo_group() else {
            return false;
        };
        let commands = group.len();
        for command in group {
            match &command {
                UndoCommand::Insert { text, position, .. } => {
                    self.apply_remove(TextRange::new(*position, position.advanced_by(text)));
                }
                UndoCommand::Remove { range, text, .. } => {
                    self.apply_insert(range.start, text);
                }
                UndoCommand::Selection { range, .. } => self.update_selection(*range),
            }
            self.undo_stack.push_redo(command);
        }
        self.subscribers
            .queue(DocumentEvent::UndoRedo(UndoRedoKind::Undo));
        self.subscribers.flush();
        tracing::trace!(commands, "undo");
        true
    }

    /// Redo the most recently undone step. Returns `false` if there is nothing to redo.
    ///
    /// The caret is placed after the last re-applied edit.
    pub fn redo(&mut self) -> bool {
        let Some(group) = self.undo_stack.pop_redo_group() else {
            return false;
        };
        let commands = group.len();
        let mut caret = None;
        for command in group {
            match &command {
                UndoCommand::Insert { text, position, .. } => {
                    caret = Some(self.apply_insert(*position, text));
                }
                UndoCommand::Remove { range, .. } => {
                    caret = Some(self.apply_remove(*range).0);
                }
                UndoCommand::Selection { .. } => {}
            }
            self.undo_stack.push_undo(command);
        }
        if let Some(caret) = caret {
            self.update_selection(TextRange::caret(caret));
        }
        self.subscribers
            .queue(DocumentEvent::UndoRedo(UndoRedoKind::Redo));
        self.subscribers.flush();
        tracing::trace!(commands, "redo");
        true
    }

    /// Can undo
    pub fn has_undo(&self) -> bool {
        self.undo_stack.has_undo()
    }

    /// Can redo
    pub fn has_redo(&self) -> bool {
        self.undo_stack.has_redo()
    }

    /// Stop the next edit from coalescing with the previous one.
    pub fn end_undo_group(&mut self) {
        self.undo_stack.end_group();
    }

    /// The undo history.
    pub fn undo_stack(&self) -> &UndoStack {
        &self.undo_stack
    }

    /// Mutable access to the undo history (limits, persistence).
    pub fn undo_stack_mut(&mut self) -> &mut UndoStack {
        &mut self.undo_stack
    }

    /// Returns `true` if the content differs from the last load/save point in history.
    pub fn is_dirty(&self) -> bool {
        !self.undo_stack.is_clean()
    }

    /// Record the current state as saved.
    pub fn mark_clean(&mut self) {
        self.undo_stack.mark_clean();
    }

    /// Counter bumped by every structural change (edit, undo, redo, load, reset).
    pub fn modification_id(&self) -> u64 {
        self.modification_id
    }

    // ---- Selection ----

    /// The primary selection.
    pub fn selection(&self) -> TextRange {
        self.selection
    }

    /// Set the primary selection (sanitized).
    pub fn set_selection(&mut self, selection: TextRange) {
        self.update_selection(selection);
        self.subscribers.flush();
    }

    /// Returns `true` if the selection is not a caret.
    pub fn has_selection(&self) -> bool {
        self.selection.has_selection()
    }

    /// Text covered by the selection.
    pub fn selected_text(&self) -> String {
        self.text_in_range(self.selection)
    }

    /// Replace the selection with `text` as one undo step and leave a caret after it.
    pub fn replace_selection(&mut self, text: &str) -> TextPosition {
        let end = self.replace_range(self.selection, text);
        self.set_selection(TextRange::caret(end));
        end
    }

    /// Delete the selected text and leave a caret at its start.
    pub fn delete_selection(&mut self) -> TextPosition {
        let start = self.remove(self.selection);
        self.set_selection(TextRange::caret(start));
        start
    }

    /// Select the whole document.
    pub fn select_all(&mut self) {
        self.set_selection(self.doc_range());
    }

    fn update_selection(&mut self, selection: TextRange) {
        let selection = self.sanitize_range(selection);
        if selection != self.selection {
            self.selection = selection;
            self.subscribers
                .queue(DocumentEvent::SelectionChanged(selection));
        }
    }

    fn clamp_selection(&mut self) {
        self.update_selection(self.selection);
    }

    // ---- Queries ----

    /// Number of lines (at least one).
    pub fn line_count(&self) -> usize {
        self.lines.read().len()
    }

    /// Returns `true` if the document holds a single empty line.
    pub fn is_empty(&self) -> bool {
        let lines = self.lines.read();
        lines.len() == 1 && lines[0].len() == 1
    }

    /// Text of line `index` without its terminator.
    pub fn line_text(&self, index: usize) -> Option<String> {
        self.lines
            .read()
            .get(index)
            .map(|line| line.text_without_newline().to_string())
    }

    /// Length of line `index` in characters, terminator excluded.
    pub fn line_len(&self, index: usize) -> Option<usize> {
        self.lines
            .read()
            .get(index)
            .map(|line| line.len().saturating_sub(1))
    }

    /// The whole document text (without the final sentinel terminator).
    pub fn text(&self) -> String {
        self.text_in_range(self.doc_range())
    }

    /// Text covered by `range` (normalized and sanitized).
    pub fn text_in_range(&self, range: TextRange) -> String {
        let lines = self.lines.read();
        let range = sanitize_range_in(&lines, range.normalized());
        range_text_in(&lines, range)
    }

    /// Character at `position` (sanitized); `'\n'` at the end of a line.
    pub fn char_at(&self, position: TextPosition) -> char {
        self.view().char_at(position)
    }

    /// A read handle that background threads can use concurrently with edits.
    pub fn reader(&self) -> DocumentReader {
        DocumentReader::new(Arc::clone(&self.lines))
    }

    /// Current configuration.
    pub fn config(&self) -> &DocumentConfig {
        &self.config
    }

    /// File path, if the document was loaded from or saved to disk.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// File name component of [`TextDocument::path`].
    pub fn filename(&self) -> Option<String> {
        self.path
            .as_deref()
            .and_then(Path::file_name)
            .map(|name| name.to_string_lossy().into_owned())
    }

    /// Line ending used on save.
    pub fn line_ending(&self) -> LineEnding {
        self.line_ending
    }

    /// Change the line ending used on save (the content is unaffected).
    pub fn set_line_ending(&mut self, line_ending: LineEnding) {
        self.line_ending = line_ending;
    }

    /// Returns `true` if the loaded content started with a UTF-8 BOM.
    pub fn has_bom(&self) -> bool {
        self.has_bom
    }

    /// Set whether a UTF-8 BOM is written on save.
    pub fn set_bom(&mut self, has_bom: bool) {
        self.has_bom = has_bom;
    }

    /// Returns `true` if the first loaded line contained a NUL character.
    pub fn might_be_binary(&self) -> bool {
        self.might_be_binary
    }

    /// Register a change callback.
    pub fn subscribe(&mut self, callback: impl FnMut(&DocumentEvent) + Send + 'static) {
        self.subscribers.subscribe(Box::new(callback));
        tracing::trace!(subscribers = self.subscribers.len(), "subscribed");
    }

    // ---- Position arithmetic ----

    /// Clamp `position` to the document: line to `[0, line_count - 1]`, column to
    /// `[0, line_len]`.
    pub fn sanitize_position(&self, position: TextPosition) -> TextPosition {
        sanitize_in(&self.lines.read(), position)
    }

    /// Sanitize both ends of `range`, keeping its direction.
    pub fn sanitize_range(&self, range: TextRange) -> TextRange {
        sanitize_range_in(&self.lines.read(), range)
    }

    /// Returns `true` if `position` is inside the document (sanitizing would not move it).
    pub fn is_valid_position(&self, position: TextPosition) -> bool {
        self.sanitize_position(position) == position
    }

    /// Returns `true` if both ends of `range` are valid positions.
    pub fn is_valid_range(&self, range: TextRange) -> bool {
        self.is_valid_position(range.start) && self.is_valid_position(range.end)
    }

    /// Move `position` by `column_offset` characters, wrapping across line ends.
    pub fn position_offset(&self, position: TextPosition, column_offset: isize) -> TextPosition {
        self.view().offset(position, column_offset)
    }

    /// Move `position` by a line and column delta, then sanitize.
    pub fn position_offset_by(&self, position: TextPosition, delta: PositionDelta) -> TextPosition {
        self.sanitize_position(position.saturating_offset(delta))
    }

    // ---- Navigation ----

    /// The position one character after `position`.
    pub fn next_char(&self, position: TextPosition) -> TextPosition {
        self.position_offset(position, 1)
    }

    /// The position one character before `position`.
    pub fn previous_char(&self, position: TextPosition) -> TextPosition {
        self.position_offset(position, -1)
    }

    /// Scan backwards from `position` to the start of the word (or run of identical separators)
    /// before it.
    ///
    /// With `ignore_first_non_word == false`, a position preceded by a separator is returned
    /// unchanged.
    pub fn previous_word_boundary(
        &self,
        position: TextPosition,
        ignore_first_non_word: bool,
    ) -> TextPosition {
        self.view()
            .previous_word_boundary(position, ignore_first_non_word)
    }

    /// Scan forwards from `position` to the end of the word (or run of identical separators)
    /// at it.
    pub fn next_word_boundary(
        &self,
        position: TextPosition,
        ignore_first_non_word: bool,
    ) -> TextPosition {
        self.view()
            .next_word_boundary(position, ignore_first_non_word)
    }

    /// Start of the word containing `position`.
    pub fn start_of_word(&self, position: TextPosition) -> TextPosition {
        self.view().start_of_word(position)
    }

    /// End of the word containing `position`.
    pub fn end_of_word(&self, position: TextPosition) -> TextPosition {
        self.view().end_of_word(position)
    }

    /// Range of the word at `position` (normalized).
    pub fn word_range_at(&self, position: TextPosition) -> TextRange {
        let view = self.view();
        TextRange::new(
            view.previous_word_boundary(position, false),
            view.next_word_boundary(position, false),
        )
        .normalized()
    }

    /// The word at `position`.
    pub fn word_at(&self, position: TextPosition) -> String {
        self.text_in_range(self.word_range_at(position))
    }

    /// Column 0 of the line.
    pub fn start_of_line(&self, position: TextPosition) -> TextPosition {
        TextPosition::new(self.sanitize_position(position).line, 0)
    }

    /// Last column of the line (just before the terminator).
    pub fn end_of_line(&self, position: TextPosition) -> TextPosition {
        let lines = self.lines.read();
        let position = sanitize_in(&lines, position);
        TextPosition::new(position.line, lines[position.line].len().saturating_sub(1))
    }

    /// First column after the indentation (spaces and tabs) before `position`.
    pub fn start_of_content(&self, position: TextPosition) -> TextPosition {
        let lines = self.lines.read();
        let position = sanitize_in(&lines, position);
        let indent = lines[position.line]
            .text()
            .chars()
            .take(position.column)
            .take_while(|ch| *ch == ' ' || *ch == '\t')
            .count();
        TextPosition::new(position.line, indent)
    }

    /// `(0, 0)`.
    pub fn start_of_doc(&self) -> TextPosition {
        TextPosition::default()
    }

    /// Last column of the last line.
    pub fn end_of_doc(&self) -> TextPosition {
        let lines = self.lines.read();
        end_of_doc_in(&lines)
    }

    /// From [`TextDocument::start_of_doc`] to [`TextDocument::end_of_doc`].
    pub fn doc_range(&self) -> TextRange {
        TextRange::new(self.start_of_doc(), self.end_of_doc())
    }

    // ---- Word characters ----

    /// Returns `true` if `ch` separates words.
    pub fn is_non_word(&self, ch: char) -> bool {
        self.config.non_word_chars.contains(ch)
    }

    /// The current separator set.
    pub fn non_word_chars(&self) -> &str {
        &self.config.non_word_chars
    }

    /// Replace the separator set.
    pub fn set_non_word_chars(&mut self, chars: impl Into<String>) {
        self.config.non_word_chars = chars.into();
    }

    // ---- Crate-internal access for search ----

    pub(crate) fn read_lines(&self) -> RwLockReadGuard<'_, Vec<DocumentLine>> {
        self.lines.read()
    }

    pub(crate) fn last_pattern_error(&self) -> Option<&PatternError> {
        self.last_search_error.as_ref()
    }

    pub(crate) fn set_last_pattern_error(&mut self, error: Option<PatternError>) {
        if let Some(error) = &error {
            tracing::warn!(%error, "search pattern failed to compile");
        }
        self.last_search_error = error;
    }

    fn now(&self) -> Duration {
        self.epoch.elapsed()
    }

    fn view(&self) -> LineView<'_> {
        LineView {
            lines: self.lines.read(),
            non_word: &self.config.non_word_chars,
        }
    }
}

impl Default for TextDocument {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for TextDocument {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TextDocument")
            .field("lines", &self.line_count())
            .field("selection", &self.selection)
            .field("path", &self.path)
            .field("line_ending", &self.line_ending)
            .field("modification_id", &self.modification_id)
            .field("undo_depth", &self.undo_stack.undo_depth())
            .finish()
    }
}

/// Navigation over one read-locked snapshot of the lines.
struct LineView<'a> {
    lines: RwLockReadGuard<'a, Vec<DocumentLine>>,
    non_word: &'a str,
}

impl LineView<'_> {
    fn char_at(&self, position: TextPosition) -> char {
        let position = sanitize_in(&self.lines, position);
        self.lines[position.line]
            .char_at(position.column)
            .unwrap_or('\n')
    }

    fn is_non_word(&self, ch: char) -> bool {
        self.non_word.contains(ch)
    }

    fn offset(&self, position: TextPosition, column_offset: isize) -> TextPosition {
        let lines = &self.lines;
        let position = sanitize_in(lines, position);
        let mut line = position.line;
        let mut column = (position.column as isize).saturating_add(column_offset);
        while line > 0 && column < 0 {
            line -= 1;
            column = column.saturating_add(lines[line].len() as isize).max(0);
        }
        while line + 1 < lines.len() && column > (lines[line].len() as isize - 1).max(0) {
            column = column.saturating_sub(lines[line].len() as isize);
            line += 1;
        }
        sanitize_in(lines, TextPosition::new(line, usize::try_from(column).unwrap_or(0)))
    }

    fn previous_word_boundary(&self, mut position: TextPosition, ignore_first_non_word: bool) -> TextPosition {
        let ch = self.char_at(self.offset(position, -1));
        let in_word = !self.is_non_word(ch);
        if !ignore_first_non_word && !in_word {
            return position;
        }
        loop {
            let current = position;
            position = self.offset(position, -1);
            if current == position {
                break;
            }
            let next = self.char_at(self.offset(position, -1));
            let keep_going = if in_word { !self.is_non_word(next) } else { next == ch };
            if !keep_going {
                break;
            }
        }
        position
    }

    fn next_word_boundary(&self, mut position: TextPosition, ignore_first_non_word: bool) -> TextPosition {
        let ch = self.char_at(position);
        let in_word = !self.is_non_word(ch);
        if !ignore_first_non_word && !in_word {
            return position;
        }
        loop {
            let current = position;
            position = self.offset(position, 1);
            if current == position {
                break;
            }
            let next = self.char_at(position);
            let keep_going = if in_word { !self.is_non_word(next) } else { next == ch };
            if !keep_going {
                break;
            }
        }
        position
    }

    fn start_of_word(&self, mut position: TextPosition) -> TextPosition {
        loop {
            let previous = self.offset(position, -1);
            if previous == position || self.is_non_word(self.char_at(previous)) {
                return position;
            }
            position = previous;
        }
    }

    fn end_of_word(&self, mut position: TextPosition) -> TextPosition {
        loop {
            let next = self.offset(position, 1);
            if next == position || self.is_non_word(self.char_at(position)) {
                return position;
            }
            position = next;
        }
    }
}

fn split_lines(text: &str) -> Vec<DocumentLine> {
    let mut lines: Vec<DocumentLine> = text.split_inclusive('\n').map(DocumentLine::new).collect();
    match lines.last_mut() {
        Some(last) if !last.text().ends_with('\n') => last.append("\n"),
        _ => lines.push(DocumentLine::default()),
    }
    lines
}

fn trailing_whitespace(index: usize, line: &DocumentLine) -> Option<TextRange> {
    let content = line.text_without_newline();
    let trimmed = content.trim_end_matches([' ', '\t']);
    if trimmed.len() == content.len() {
        return None;
    }
    Some(TextRange::new(
        TextPosition::new(index, trimmed.chars().count()),
        TextPosition::new(index, content.chars().count()),
    ))
}

pub(crate) fn sanitize_in(lines: &[DocumentLine], position: TextPosition) -> TextPosition {
    let line = position.line.min(lines.len().saturating_sub(1));
    let max_column = lines.get(line).map_or(0, |l| l.len().saturating_sub(1));
    TextPosition::new(line, position.column.min(max_column))
}

pub(crate) fn sanitize_range_in(lines: &[DocumentLine], range: TextRange) -> TextRange {
    TextRange::new(sanitize_in(lines, range.start), sanitize_in(lines, range.end))
}

pub(crate) fn end_of_doc_in(lines: &[DocumentLine]) -> TextPosition {
    let last = lines.len().saturating_sub(1);
    let column = lines.get(last).map_or(0, |l| l.len().saturating_sub(1));
    TextPosition::new(last, column)
}

/// Text of a normalized, sanitized range.
fn range_text_in(lines: &[DocumentLine], range: TextRange) -> String {
    let (start, end) = (range.start, range.end);
    if start.line == end.line {
        return lines[start.line]
            .substr(start.column, end.column.saturating_sub(start.column))
            .to_string();
    }
    let mut text = lines[start.line].tail(start.column).to_string();
    for line in &lines[start.line + 1..end.line] {
        text.push_str(line.text());
    }
    text.push_str(lines[end.line].substr(0, end.column));
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn pos(line: usize, column: usize) -> TextPosition {
        TextPosition::new(line, column)
    }

    fn stored_lines(doc: &TextDocument) -> Vec<String> {
        doc.read_lines()
            .iter()
            .map(|line| line.text().to_string())
            .collect()
    }

    #[test]
    fn test_lines_carry_a_final_sentinel() {
        assert_eq!(stored_lines(&TextDocument::from_text("abc")), vec!["abc\n"]);
        assert_eq!(stored_lines(&TextDocument::from_text("abc\n")), vec!["abc\n", "\n"]);
        assert_eq!(stored_lines(&TextDocument::new()), vec!["\n"]);
    }

    #[test]
    fn test_multi_line_insert_splits_the_line() {
        let mut doc = TextDocument::from_text("hello world");
        let end = doc.insert(pos(0, 5), ",\nbig\n");
        assert_eq!(end, pos(2, 0));
        assert_eq!(stored_lines(&doc), vec!["hello,\n", "big\n", " world\n"]);
    }

    #[test]
    fn test_multi_line_remove_merges_lines() {
        let mut doc = TextDocument::from_text("foo\nbar\n");
        let start = doc.remove(TextRange::new(pos(1, 1), pos(0, 1)));
        assert_eq!(start, pos(0, 1));
        assert_eq!(stored_lines(&doc), vec!["far\n", "\n"]);
    }

    #[test]
    fn test_position_offset_wraps_across_lines() {
        let doc = TextDocument::from_text("ab\ncd");
        assert_eq!(doc.position_offset(pos(0, 2), 1), pos(1, 0));
        assert_eq!(doc.position_offset(pos(1, 0), -1), pos(0, 2));
        assert_eq!(doc.position_offset(pos(0, 0), -5), pos(0, 0));
        assert_eq!(doc.position_offset(pos(1, 1), 10), pos(1, 2));
        assert_eq!(doc.position_offset_by(pos(0, 1), PositionDelta::new(1, 5)), pos(1, 2));
    }

    #[test]
    fn test_sanitize_clamps_to_last_column() {
        let doc = TextDocument::from_text("abc\nde");
        assert_eq!(doc.sanitize_position(pos(9, 9)), pos(1, 2));
        assert_eq!(doc.sanitize_position(pos(0, 9)), pos(0, 3));
        assert!(doc.is_valid_position(pos(0, 3)));
        assert!(!doc.is_valid_position(pos(0, 4)));
        assert_eq!(doc.end_of_doc(), pos(1, 2));
    }

    #[test]
    fn test_save_trims_and_forces_newline_as_one_step() {
        let config = DocumentConfig {
            trim_trailing_whitespace: true,
            force_newline_at_end_of_file: true,
            ..DocumentConfig::default()
        };
        let mut doc = TextDocument::with_config(config);
        doc.insert(pos(0, 0), "a  \nb\t");
        let depth = doc.undo_stack().undo_depth();
        assert!(doc.prepare_for_save());
        assert_eq!(doc.text(), "a\nb\n");
        assert_eq!(doc.undo_stack().undo_depth(), depth + 1);
        doc.undo();
        assert_eq!(doc.text(), "a  \nb\t");
    }
}
