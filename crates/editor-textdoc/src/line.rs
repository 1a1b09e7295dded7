//! A single stored document line.
//!
//! Every stored line ends with `'\n'`. For the final line this terminator is a sentinel owned by
//! the document and is not written out on save, so the last addressable column of any line is
//! `len() - 1`.
//!
//! `DocumentLine` itself holds no lock. Lines live inside the document's shared
//! `RwLock<Vec<DocumentLine>>`, so every accessor runs under that lock and the derived caches
//! (`hash`, `is_ascii`) are always refreshed in the same critical section as the text.

use rustc_hash::FxHasher;
use std::hash::Hasher;

/// One line of text plus derived caches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentLine {
    text: String,
    /// Content hash of `text`
    hash: u64,
    /// Fast path flag: whether this is pure ASCII
    is_ascii: bool,
    /// Character count of `text` (including the terminator)
    char_count: usize,
}

impl DocumentLine {
    /// Create a line from its full text (the caller supplies the terminator).
    pub fn new(text: impl Into<String>) -> Self {
        let mut line = Self {
            text: text.into(),
            hash: 0,
            is_ascii: true,
            char_count: 0,
        };
        line.refresh();
        line
    }

    /// Replace the whole text.
    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
        self.refresh();
    }

    /// Append `text` to the end of the line.
    pub fn append(&mut self, text: &str) {
        self.text.push_str(text);
        self.refresh();
    }

    /// Full text, terminator included.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Text without the trailing `'\n'`.
    pub fn text_without_newline(&self) -> &str {
        self.text.strip_suffix('\n').unwrap_or(&self.text)
    }

    /// Up to `len` characters starting at character `pos` (clamped).
    pub fn substr(&self, pos: usize, len: usize) -> &str {
        let start = self.char_to_byte(pos);
        let end = self.char_to_byte(pos.saturating_add(len));
        &self.text[start..end]
    }

    /// Text from character `pos` to the end of the line (terminator included).
    pub fn tail(&self, pos: usize) -> &str {
        &self.text[self.char_to_byte(pos)..]
    }

    /// Length in characters, terminator included.
    pub fn len(&self) -> usize {
        self.char_count
    }

    /// Returns `true` if the line holds no characters at all (not even a terminator).
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Character at column `index`.
    pub fn char_at(&self, index: usize) -> Option<char> {
        if self.is_ascii {
            return self.text.as_bytes().get(index).map(|b| *b as char);
        }
        self.text.chars().nth(index)
    }

    /// Content hash of the current text.
    pub fn hash(&self) -> u64 {
        self.hash
    }

    /// Returns `true` if every character is below 128.
    pub fn is_ascii(&self) -> bool {
        self.is_ascii
    }

    /// Byte offset of character column `column` (clamped to the end).
    pub fn char_to_byte(&self, column: usize) -> usize {
        if self.is_ascii {
            return column.min(self.text.len());
        }
        self.text
            .char_indices()
            .nth(column)
            .map(|(byte, _)| byte)
            .unwrap_or(self.text.len())
    }

    /// Character column of byte offset `byte` (clamped to the end).
    pub fn byte_to_char(&self, byte: usize) -> usize {
        let byte = byte.min(self.text.len());
        if self.is_ascii {
            return byte;
        }
        self.text
            .char_indices()
            .take_while(|(b, _)| *b < byte)
            .count()
    }

    fn refresh(&mut self) {
        self.is_ascii = self.text.is_ascii();
        self.char_count = if self.is_ascii {
            self.text.len()
        } else {
            self.text.chars().count()
        };
        self.hash = content_hash(&self.text);
    }
}

impl Default for DocumentLine {
    fn default() -> Self {
        Self::new("\n")
    }
}

impl std::ops::Index<usize> for DocumentLine {
    type Output = str;

    /// The character at `index` as a string slice.
    fn index(&self, index: usize) -> &str {
        let start = self.char_to_byte(index);
        let end = self.char_to_byte(index + 1);
        &self.text[start..end]
    }
}

pub(crate) fn content_hash(text: &str) -> u64 {
    let mut hasher = FxHasher::default();
    hasher.write(text.as_bytes());
    hasher.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_caches_follow_mutations() {
        let mut line = DocumentLine::new("abc\n");
        assert!(line.is_ascii());
        assert_eq!(line.len(), 4);
        let before = line.hash();

        line.append("é");
        assert!(!line.is_ascii());
        assert_eq!(line.len(), 5);
        assert_ne!(line.hash(), before);
        assert_eq!(line.hash(), content_hash("abc\né"));

        line.set_text("abc\n");
        assert!(line.is_ascii());
        assert_eq!(line.hash(), before);
    }

    #[test]
    fn test_substr_and_indexing_use_char_columns() {
        let line = DocumentLine::new("你好 world\n");
        assert_eq!(line.substr(0, 2), "你好");
        assert_eq!(line.substr(3, 100), "world\n");
        assert_eq!(&line[1], "好");
        assert_eq!(line.char_at(2), Some(' '));
        assert_eq!(line.text_without_newline(), "你好 world");
        assert_eq!(line.tail(3), "world\n");
        assert_eq!(line.byte_to_char(line.char_to_byte(4)), 4);
    }

    #[test]
    fn test_default_line_is_a_lone_terminator() {
        let line = DocumentLine::default();
        assert_eq!(line.text(), "\n");
        assert_eq!(line.len(), 1);
        assert!(!line.is_empty());
        assert_eq!(line.text_without_newline(), "");
    }
}
