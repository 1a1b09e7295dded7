//! Document configuration.

use crate::line_ending::LineEnding;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Characters that separate words by default.
pub const DEFAULT_NON_WORD_CHARS: &str = " \t\n/\\()\"':,.;<>~!@#$%^&*|+=[]{}`?-";

/// Tunables for a [`TextDocument`](crate::TextDocument).
///
/// Every field has a default, so partial JSON objects deserialize:
///
/// ```rust
/// use editor_textdoc::DocumentConfig;
///
/// let config = DocumentConfig::from_json(r#"{ "merge_timeout_ms": 500 }"#).unwrap();
/// assert_eq!(config.merge_timeout_ms, 500);
/// assert_eq!(config.max_undo_stack_size, 10_000);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DocumentConfig {
    /// Maximum number of commands kept on each of the undo and redo stacks.
    pub max_undo_stack_size: usize,
    /// Consecutive edits closer together than this coalesce into one undo step.
    pub merge_timeout_ms: u64,
    /// Characters treated as word separators by navigation and whole-word search.
    pub non_word_chars: String,
    /// Line ending used for documents that have none (new or single-line documents).
    pub default_line_ending: LineEnding,
    /// Append a final newline on save if the document lacks one.
    pub force_newline_at_end_of_file: bool,
    /// Strip trailing whitespace from every line on save.
    pub trim_trailing_whitespace: bool,
}

impl DocumentConfig {
    /// Parse a configuration from a JSON object.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// The merge timeout as a [`Duration`].
    pub fn merge_timeout(&self) -> Duration {
        Duration::from_millis(self.merge_timeout_ms)
    }
}

impl Default for DocumentConfig {
    fn default() -> Self {
        Self {
            max_undo_stack_size: 10_000,
            merge_timeout_ms: 300,
            non_word_chars: DEFAULT_NON_WORD_CHARS.to_string(),
            default_line_ending: LineEnding::Lf,
            force_newline_at_end_of_file: false,
            trim_trailing_whitespace: false,
        }
    }
}
