//! Text ranges.
//!
//! A [`TextRange`] is a pair of positions. It is allowed to be reversed (`start > end`), which is
//! how a selection whose anchor sits after the caret is represented.

use crate::error::ParsePositionError;
use crate::position::TextPosition;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A span between two positions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TextRange {
    /// Anchor of the range.
    pub start: TextPosition,
    /// Caret end of the range.
    pub end: TextPosition,
}

impl TextRange {
    /// Create a range from two positions (not reordered).
    pub const fn new(start: TextPosition, end: TextPosition) -> Self {
        Self { start, end }
    }

    /// An empty range (a caret) at `position`.
    pub const fn caret(position: TextPosition) -> Self {
        Self::new(position, position)
    }

    /// Returns `true` if `start != end`.
    pub fn has_selection(&self) -> bool {
        self.start != self.end
    }

    /// Returns `true` if `start > end`.
    pub fn is_reversed(&self) -> bool {
        self.start > self.end
    }

    /// The same range with `start <= end`.
    pub fn normalized(&self) -> Self {
        if self.is_reversed() {
            self.reversed()
        } else {
            *self
        }
    }

    /// The same range with `start` and `end` swapped.
    pub fn reversed(&self) -> Self {
        Self::new(self.end, self.start)
    }

    /// Returns `true` if `position` lies on or between the (normalized) bounds.
    pub fn contains(&self, position: TextPosition) -> bool {
        let range = self.normalized();
        range.start <= position && position <= range.end
    }

    /// Returns `true` if both ends of `other` lie within this range.
    pub fn contains_range(&self, other: &TextRange) -> bool {
        let other = other.normalized();
        self.contains(other.start) && self.contains(other.end)
    }

    /// Returns `true` if the (normalized) ranges share at least one position.
    pub fn intersects(&self, other: &TextRange) -> bool {
        let a = self.normalized();
        let b = other.normalized();
        a.start <= b.end && b.start <= a.end
    }
}

impl From<(TextPosition, TextPosition)> for TextRange {
    fn from((start, end): (TextPosition, TextPosition)) -> Self {
        Self::new(start, end)
    }
}

impl fmt::Display for TextRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}", self.start, self.end)
    }
}

impl FromStr for TextRange {
    type Err = ParsePositionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (start, end) = s.split_once('-').ok_or_else(|| ParsePositionError::new(s))?;
        Ok(Self::new(start.parse()?, end.parse()?))
    }
}

impl TryFrom<String> for TextRange {
    type Error = ParsePositionError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<TextRange> for String {
    fn from(value: TextRange) -> Self {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pos(line: usize, column: usize) -> TextPosition {
        TextPosition::new(line, column)
    }

    #[test]
    fn test_normalized_and_reversed() {
        let r = TextRange::new(pos(2, 1), pos(0, 4));
        assert!(r.is_reversed());
        assert_eq!(r.normalized(), TextRange::new(pos(0, 4), pos(2, 1)));
        assert_eq!(r.normalized().reversed(), r);
    }

    #[test]
    fn test_contains_is_inclusive() {
        let r = TextRange::new(pos(1, 5), pos(3, 2));
        assert!(r.contains(pos(1, 5)));
        assert!(r.contains(pos(2, 100)));
        assert!(r.contains(pos(3, 2)));
        assert!(!r.contains(pos(3, 3)));
        assert!(!r.contains(pos(1, 4)));
        assert!(r.reversed().contains(pos(2, 0)));
        assert!(r.contains_range(&TextRange::new(pos(3, 0), pos(1, 9))));
        assert!(!r.contains_range(&TextRange::new(pos(0, 0), pos(1, 9))));
    }

    #[test]
    fn test_has_selection() {
        assert!(!TextRange::caret(pos(0, 0)).has_selection());
        assert!(TextRange::new(pos(0, 0), pos(0, 1)).has_selection());
    }

    #[test]
    fn test_string_round_trip() {
        let r = TextRange::new(pos(10, 2), pos(3, 0));
        let s = r.to_string();
        assert_eq!(s, "10:2 - 3:0");
        assert_eq!(s.parse::<TextRange>().unwrap(), r);
        assert!("1:2".parse::<TextRange>().is_err());
    }
}
