//! Search back-ends.
//!
//! A [`Matcher`] wraps one of three pattern dialects behind a single interface that reports
//! **byte** offsets into the haystack it was given:
//!
//! - [`SearchMode::Literal`]: plain substring (escaped into a regex when case-insensitive)
//! - [`SearchMode::Regex`]: extended regular expressions via the `regex` crate
//! - [`SearchMode::LuaPattern`]: the dialect in [`crate::lua_pattern`]
//!
//! Document-level search in [`crate::find`] maps these offsets back to
//! [`TextPosition`](crate::TextPosition)s.

use crate::error::PatternError;
use crate::lua_pattern::LuaPattern;
use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};

/// Pattern dialect.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SearchMode {
    /// Plain substring.
    #[default]
    Literal,
    /// Lua pattern.
    LuaPattern,
    /// Extended regular expression.
    Regex,
}

/// Options that control how search is performed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchOptions {
    /// If `true`, performs a case-sensitive search. Lua patterns are always case-sensitive.
    pub case_sensitive: bool,
    /// If `true`, rejects matches whose neighbors are word characters.
    pub whole_word: bool,
    /// Pattern dialect.
    pub mode: SearchMode,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            case_sensitive: true,
            whole_word: false,
            mode: SearchMode::Literal,
        }
    }
}

impl SearchOptions {
    /// Options for `mode` with the other fields at their defaults.
    pub fn with_mode(mode: SearchMode) -> Self {
        Self {
            mode,
            ..Self::default()
        }
    }
}

/// A half-open byte range `[start, end)` reported by a [`Matcher`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchSpan {
    /// Inclusive start byte offset.
    pub start: usize,
    /// Exclusive end byte offset.
    pub end: usize,
}

impl MatchSpan {
    /// Returns the length of the match in bytes.
    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    /// Returns `true` if the match is empty.
    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }
}

/// A compiled pattern.
#[derive(Debug, Clone)]
pub enum Matcher {
    /// Case-sensitive substring.
    Literal(String),
    /// Case-insensitive substring, compiled as an escaped regex.
    FoldedLiteral(Regex),
    /// Extended regular expression.
    Regex(Regex),
    /// Lua pattern.
    Lua(LuaPattern),
}

impl Matcher {
    /// Compile `pattern` for `options.mode`.
    pub fn new(pattern: &str, options: SearchOptions) -> Result<Self, PatternError> {
        Ok(match options.mode {
            SearchMode::Literal if options.case_sensitive => Self::Literal(pattern.to_string()),
            SearchMode::Literal => Self::FoldedLiteral(compile_regex(&regex::escape(pattern), false)?),
            SearchMode::Regex => Self::Regex(compile_regex(pattern, options.case_sensitive)?),
            SearchMode::LuaPattern => Self::Lua(LuaPattern::new(pattern)?),
        })
    }

    /// Returns `true` if this is a literal pattern spanning several lines.
    pub fn is_multiline_literal(&self) -> bool {
        match self {
            Self::Literal(needle) => needle.contains('\n'),
            Self::FoldedLiteral(re) => re.as_str().contains('\n'),
            _ => false,
        }
    }

    /// First match (possibly empty) starting at or after byte `start`.
    pub fn find_at(&self, haystack: &str, start: usize) -> Option<MatchSpan> {
        if start > haystack.len() {
            return None;
        }
        match self {
            Self::Literal(needle) => {
                if needle.is_empty() {
                    return None;
                }
                let offset = haystack.get(start..)?.find(needle.as_str())?;
                Some(MatchSpan {
                    start: start + offset,
                    end: start + offset + needle.len(),
                })
            }
            Self::FoldedLiteral(re) | Self::Regex(re) => re.find_at(haystack, start).map(|m| MatchSpan {
                start: m.start(),
                end: m.end(),
            }),
            Self::Lua(pattern) => pattern.find_at(haystack, start).map(|m| MatchSpan {
                start: m.start,
                end: m.end,
            }),
        }
    }

    /// All non-empty, non-overlapping matches starting at or after byte `start`.
    pub fn matches(&self, haystack: &str, start: usize) -> Vec<MatchSpan> {
        if let Self::Lua(pattern) = self {
            return pattern
                .find_iter(haystack, start)
                .into_iter()
                .map(|m| MatchSpan {
                    start: m.start,
                    end: m.end,
                })
                .collect();
        }

        let mut found = Vec::new();
        let mut at = start;
        while let Some(span) = self.find_at(haystack, at) {
            if span.is_empty() {
                match haystack[span.start..].chars().next() {
                    Some(ch) => at = span.start + ch.len_utf8(),
                    None => break,
                }
                continue;
            }
            at = span.end;
            found.push(span);
        }
        found
    }

    /// The replacement text for `span`, with capture references expanded.
    ///
    /// Regex replacements use `$1`/`${name}`, Lua replacements `%1`. Literal replacements are
    /// used verbatim.
    pub fn expand(&self, haystack: &str, span: MatchSpan, replacement: &str) -> String {
        match self {
            Self::Literal(_) | Self::FoldedLiteral(_) => replacement.to_string(),
            Self::Regex(re) => match re.captures_at(haystack, span.start) {
                Some(caps) if caps.get(0).is_some_and(|m| m.start() == span.start) => {
                    let mut out = String::new();
                    caps.expand(replacement, &mut out);
                    out
                }
                _ => replacement.to_string(),
            },
            Self::Lua(pattern) => match pattern.find_at(haystack, span.start) {
                Some(m) if m.start == span.start => pattern.expand(haystack, &m, replacement),
                _ => replacement.to_string(),
            },
        }
    }
}

fn compile_regex(pattern: &str, case_sensitive: bool) -> Result<Regex, PatternError> {
    Ok(RegexBuilder::new(pattern)
        .case_insensitive(!case_sensitive)
        .multi_line(true)
        .build()?)
}

/// Returns `true` if neither neighbor of `span` in `haystack` is a word character.
pub(crate) fn is_whole_word(haystack: &str, span: MatchSpan, is_non_word: impl Fn(char) -> bool) -> bool {
    if span.is_empty() {
        return false;
    }
    let before = haystack[..span.start].chars().next_back();
    let after = haystack[span.end..].chars().next();
    before.is_none_or(&is_non_word) && after.is_none_or(&is_non_word)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spans(matcher: &Matcher, text: &str) -> Vec<(usize, usize)> {
        matcher
            .matches(text, 0)
            .into_iter()
            .map(|m| (m.start, m.end))
            .collect()
    }

    #[test]
    fn test_literal_matches_do_not_overlap() {
        let matcher = Matcher::new("aa", SearchOptions::default()).unwrap();
        assert_eq!(spans(&matcher, "aaaaa"), vec![(0, 2), (2, 4)]);
        let empty = Matcher::new("", SearchOptions::default()).unwrap();
        assert!(spans(&empty, "abc").is_empty());
    }

    #[test]
    fn test_case_insensitive_literal_is_escaped() {
        let options = SearchOptions {
            case_sensitive: false,
            ..SearchOptions::default()
        };
        let matcher = Matcher::new("A.b", options).unwrap();
        assert_eq!(spans(&matcher, "a.B axb A.B"), vec![(0, 3), (8, 11)]);
    }

    #[test]
    fn test_regex_skips_empty_matches_and_expands_groups() {
        let options = SearchOptions::with_mode(SearchMode::Regex);
        let matcher = Matcher::new(r"(\w+)@(\w+)", options).unwrap();
        let text = "mail bob@example now";
        let found = matcher.matches(text, 0);
        assert_eq!(found, vec![MatchSpan { start: 5, end: 16 }]);
        assert_eq!(matcher.expand(text, found[0], "$2:$1"), "example:bob");

        let star = Matcher::new("x*", options).unwrap();
        assert_eq!(spans(&star, "axxbx"), vec![(1, 3), (4, 5)]);
    }

    #[test]
    fn test_invalid_patterns_report_errors() {
        let regex = Matcher::new("(", SearchOptions::with_mode(SearchMode::Regex));
        assert!(matches!(regex, Err(PatternError::InvalidRegex(_))));
        let lua = Matcher::new("%", SearchOptions::with_mode(SearchMode::LuaPattern));
        assert!(matches!(lua, Err(PatternError::InvalidLuaPattern { .. })));
    }

    #[test]
    fn test_whole_word_uses_neighbors() {
        let non_word = |c: char| !c.is_alphanumeric() && c != '_';
        let text = "cat concat cat_ cat";
        let matcher = Matcher::new("cat", SearchOptions::default()).unwrap();
        let whole: Vec<usize> = matcher
            .matches(text, 0)
            .into_iter()
            .filter(|m| is_whole_word(text, *m, non_word))
            .map(|m| m.start)
            .collect();
        assert_eq!(whole, vec![0, 16]);
    }
}
