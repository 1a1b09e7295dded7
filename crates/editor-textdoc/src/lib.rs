#![warn(missing_docs)]
//! Editor TextDoc - Line-Oriented Text Document Core
//!
//! # Overview
//!
//! `editor-textdoc` is the data layer of a text editor: an in-memory, line-oriented buffer with
//! `(line, column)` addressing, undoable edits and multi-dialect search/replace. It does no
//! rendering; views, highlighters and linters consume it through read handles and change
//! notifications.
//!
//! # Core Features
//!
//! - **Lenient Addressing**: out-of-range positions are clamped, never rejected
//! - **Structural Edits**: inserts and removals that split and merge lines consistently
//! - **Undo/Redo**: bounded history with time-based keystroke coalescing and grouped steps
//! - **Search**: literal, extended regex and Lua-pattern matching, whole-word filtering,
//!   replace-all as a single undo step
//! - **Concurrent Readers**: [`DocumentReader`] handles read lines from other threads while
//!   the owner edits
//! - **File Round Trips**: LF/CRLF/CR detection, UTF-8 BOM preservation, save-time cleanup
//!
//! # Architecture Layers
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │  Find / Replace (find)                      │  ← Public API
//! ├─────────────────────────────────────────────┤
//! │  TextDocument (edits, navigation, events)   │  ← Public API
//! ├──────────────────────┬──────────────────────┤
//! │  UndoStack (undo)    │  Matchers (search,   │
//! │                      │  lua_pattern)        │
//! ├──────────────────────┴──────────────────────┤
//! │  Shared lines: RwLock<Vec<DocumentLine>>    │  ← DocumentReader
//! └─────────────────────────────────────────────┘
//! ```
//!
//! # Quick Start
//!
//! ```rust
//! use editor_textdoc::{SearchOptions, TextDocument, TextPosition};
//!
//! let mut doc = TextDocument::new();
//! let end = doc.insert(TextPosition::new(0, 0), "ab ab ab");
//! assert_eq!(end, TextPosition::new(0, 8));
//!
//! assert_eq!(doc.replace_all("ab", "xyz", SearchOptions::default()), 3);
//! assert_eq!(doc.text(), "xyz xyz xyz");
//!
//! doc.undo();
//! assert_eq!(doc.text(), "ab ab ab");
//! ```
//!
//! ## Reading from another thread
//!
//! ```rust
//! use editor_textdoc::{TextDocument, TextPosition};
//!
//! let mut doc = TextDocument::from_text("fn main() {}\n");
//! let reader = doc.reader();
//! let worker = std::thread::spawn(move || reader.line_text(0));
//! doc.insert(TextPosition::new(1, 0), "// done\n");
//! assert!(worker.join().unwrap().is_some());
//! ```
//!
//! # Module Description
//!
//! - [`position`] / [`range`] - addressing value types
//! - [`line`] - a stored line with its cached hash and ASCII flag
//! - [`document`] - the document itself
//! - [`undo`] - undo/redo history
//! - [`search`] / [`lua_pattern`] - matcher back-ends
//! - [`find`] - document-level find and replace
//! - [`events`] - change notifications
//! - [`reader`] - background read handles

pub mod config;
pub mod document;
pub mod error;
pub mod events;
pub mod find;
pub mod line;
pub mod line_ending;
pub mod lua_pattern;
pub mod position;
pub mod range;
pub mod reader;
pub mod search;
pub mod undo;

pub use config::{DEFAULT_NON_WORD_CHARS, DocumentConfig};
pub use document::TextDocument;
pub use error::{LoadError, ParsePositionError, PatternError, SaveError, UndoHistoryError};
pub use events::{DocumentContentChange, DocumentEvent, DocumentEventCallback, UndoRedoKind};
pub use find::SearchState;
pub use line::DocumentLine;
pub use line_ending::LineEnding;
pub use lua_pattern::{LuaCapture, LuaMatch, LuaPattern};
pub use position::{PositionDelta, TextPosition};
pub use range::TextRange;
pub use reader::{DocumentReader, LineSnapshot};
pub use search::{MatchSpan, Matcher, SearchMode, SearchOptions};
pub use undo::{UndoCommand, UndoStack};
