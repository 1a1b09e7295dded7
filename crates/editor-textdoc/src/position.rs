//! Logical document positions.
//!
//! A [`TextPosition`] addresses a character inside a [`TextDocument`](crate::TextDocument) as
//! a zero-based `(line, column)` pair, where the column counts Unicode scalar values (not bytes)
//! and never includes the line terminator.
//!
//! Positions are plain values: they are not updated when the document changes. Callers that
//! hold a position across an edit should re-derive it from the position returned by the edit.

use crate::error::ParsePositionError;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// Position coordinates (line and column numbers)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TextPosition {
    /// Zero-based logical line index.
    pub line: usize,
    /// Zero-based column in characters within the logical line.
    pub column: usize,
}

impl TextPosition {
    /// Create a new logical position.
    pub const fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }

    /// Returns the position reached after writing `text` starting at `self`.
    ///
    /// Only `'\n'` is treated as a line break; this is the extent an insert of `text` at `self`
    /// occupies in the document after the insert.
    pub fn advanced_by(self, text: &str) -> Self {
        match text.rfind('\n') {
            None => Self::new(self.line, self.column + text.chars().count()),
            Some(last_newline) => {
                let breaks = text.bytes().filter(|b| *b == b'\n').count();
                let tail = text[last_newline + 1..].chars().count();
                Self::new(self.line + breaks, tail)
            }
        }
    }

    /// Applies a signed delta, saturating at zero on both axes.
    pub fn saturating_offset(self, delta: PositionDelta) -> Self {
        Self::new(
            self.line.saturating_add_signed(delta.line),
            self.column.saturating_add_signed(delta.column),
        )
    }
}

impl Ord for TextPosition {
    fn cmp(&self, other: &Self) -> Ordering {
        self.line
            .cmp(&other.line)
            .then_with(|| self.column.cmp(&other.column))
    }
}

impl PartialOrd for TextPosition {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl From<(usize, usize)> for TextPosition {
    fn from((line, column): (usize, usize)) -> Self {
        Self::new(line, column)
    }
}

impl fmt::Display for TextPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

impl FromStr for TextPosition {
    type Err = ParsePositionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (line, column) = s
            .trim()
            .split_once(':')
            .ok_or_else(|| ParsePositionError::new(s))?;
        let line = line
            .trim()
            .parse()
            .map_err(|_| ParsePositionError::new(s))?;
        let column = column
            .trim()
            .parse()
            .map_err(|_| ParsePositionError::new(s))?;
        Ok(Self::new(line, column))
    }
}

impl TryFrom<String> for TextPosition {
    type Error = ParsePositionError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<TextPosition> for String {
    fn from(value: TextPosition) -> Self {
        value.to_string()
    }
}

/// A signed `(line, column)` displacement used by
/// [`TextDocument::position_offset_by`](crate::TextDocument::position_offset_by).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PositionDelta {
    /// Line displacement.
    pub line: isize,
    /// Column displacement.
    pub column: isize,
}

impl PositionDelta {
    /// Create a new delta.
    pub const fn new(line: isize, column: isize) -> Self {
        Self { line, column }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ordering_is_line_major() {
        assert!(TextPosition::new(0, 5) < TextPosition::new(0, 6));
        assert!(TextPosition::new(0, 99) < TextPosition::new(1, 0));
        assert_eq!(
            TextPosition::new(2, 3).cmp(&TextPosition::new(2, 3)),
            Ordering::Equal
        );
    }

    #[test]
    fn test_advanced_by() {
        let p = TextPosition::new(3, 2);
        assert_eq!(p.advanced_by("abc"), TextPosition::new(3, 5));
        assert_eq!(p.advanced_by("ab\ncd"), TextPosition::new(4, 2));
        assert_eq!(p.advanced_by("\n\n"), TextPosition::new(5, 0));
        assert_eq!(p.advanced_by("你好"), TextPosition::new(3, 4));
    }

    #[test]
    fn test_parse_and_display() {
        let p: TextPosition = " 12:7 ".parse().unwrap();
        assert_eq!(p, TextPosition::new(12, 7));
        assert_eq!(p.to_string(), "12:7");
        assert!("12".parse::<TextPosition>().is_err());
        assert!("a:1".parse::<TextPosition>().is_err());
    }

    #[test]
    fn test_saturating_offset() {
        let p = TextPosition::new(1, 1);
        assert_eq!(
            p.saturating_offset(PositionDelta::new(-5, 3)),
            TextPosition::new(0, 4)
        );
    }
}
