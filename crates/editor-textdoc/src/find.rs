//! Document search and replace.
//!
//! Matching runs line by line on the text without its terminator, so anchors (`^`, `$`) bind to
//! line boundaries. A literal pattern containing `'\n'` is matched across lines instead. Results
//! are [`TextRange`]s in character columns.
//!
//! A pattern that fails to compile yields no matches; the error is kept and available from
//! [`TextDocument::last_search_error`] until the next search.

use crate::document::{TextDocument, end_of_doc_in, sanitize_in, sanitize_range_in};
use crate::error::PatternError;
use crate::line::DocumentLine;
use crate::position::TextPosition;
use crate::range::TextRange;
use crate::search::{MatchSpan, Matcher, SearchOptions, is_whole_word};

/// Parameters of an incremental search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchState {
    /// The pattern source.
    pub pattern: String,
    /// Where the search starts (forward) or ends (backward).
    pub from: TextPosition,
    /// Matching options.
    pub options: SearchOptions,
    /// Only report matches fully inside this range.
    pub restrict: Option<TextRange>,
    /// Continue from the other end of the searched region when nothing is found.
    pub wrap: bool,
}

impl SearchState {
    /// A wrapping search for `pattern` from the start of the document.
    pub fn new(pattern: impl Into<String>, options: SearchOptions) -> Self {
        Self {
            pattern: pattern.into(),
            from: TextPosition::default(),
            options,
            restrict: None,
            wrap: true,
        }
    }

    /// Set the start position.
    pub fn from(mut self, from: TextPosition) -> Self {
        self.from = from;
        self
    }

    /// Restrict matches to `range`.
    pub fn restrict(mut self, range: TextRange) -> Self {
        self.restrict = Some(range);
        self
    }

    /// Enable or disable wrap-around.
    pub fn wrap(mut self, wrap: bool) -> Self {
        self.wrap = wrap;
        self
    }
}

/// A match with its byte span inside the line it starts on.
#[derive(Debug, Clone, Copy)]
struct Hit {
    range: TextRange,
    span: MatchSpan,
}

struct Query<'a> {
    matcher: &'a Matcher,
    options: SearchOptions,
    non_word: &'a str,
    /// Newline-separated pieces of a multi-line literal pattern.
    pieces: Option<Vec<String>>,
}

impl Query<'_> {
    fn whole_word_ok(&self, haystack: &str, span: MatchSpan) -> bool {
        !self.options.whole_word || is_whole_word(haystack, span, |c| self.non_word.contains(c))
    }

    /// Matches starting on line `index` that lie inside `region`.
    fn hits_on_line(&self, lines: &[DocumentLine], index: usize, region: TextRange) -> Vec<Hit> {
        if let Some(pieces) = &self.pieces {
            return self
                .multiline_hit(lines, index, pieces)
                .filter(|hit| hit.range.start >= region.start && hit.range.end <= region.end)
                .into_iter()
                .collect();
        }

        let line = &lines[index];
        let haystack = line.text_without_newline();
        let from_column = if index == region.start.line {
            region.start.column
        } else {
            0
        };
        let to_column = if index == region.end.line {
            region.end.column
        } else {
            usize::MAX
        };

        self.matcher
            .matches(haystack, line.char_to_byte(from_column))
            .into_iter()
            .filter(|span| self.whole_word_ok(haystack, *span))
            .map(|span| Hit {
                range: TextRange::new(
                    TextPosition::new(index, line.byte_to_char(span.start)),
                    TextPosition::new(index, line.byte_to_char(span.end)),
                ),
                span,
            })
            .filter(|hit| hit.range.end.column <= to_column)
            .collect()
    }

    fn multiline_hit(&self, lines: &[DocumentLine], index: usize, pieces: &[String]) -> Option<Hit> {
        let last = pieces.len() - 1;
        if index + last >= lines.len() {
            return None;
        }
        let same = |a: &str, b: &str| {
            if self.options.case_sensitive {
                a == b
            } else {
                a.to_lowercase() == b.to_lowercase()
            }
        };

        let first_line = lines[index].text_without_newline();
        let head_len = pieces[0].chars().count();
        let first_len = first_line.chars().count();
        let start_column = first_len.checked_sub(head_len)?;
        let start_byte = lines[index].char_to_byte(start_column);
        if !same(&first_line[start_byte..], &pieces[0]) {
            return None;
        }
        for (offset, piece) in pieces[1..last].iter().enumerate() {
            if !same(lines[index + 1 + offset].text_without_newline(), piece) {
                return None;
            }
        }
        let last_line = &lines[index + last];
        let tail_len = pieces[last].chars().count();
        let end_byte = last_line.char_to_byte(tail_len);
        let last_text = last_line.text_without_newline();
        if last_text.chars().count() < tail_len || !same(&last_text[..end_byte], &pieces[last]) {
            return None;
        }

        if self.options.whole_word {
            let before = first_line[..start_byte].chars().next_back();
            let after = last_text[end_byte..].chars().next();
            let non_word = |c: char| self.non_word.contains(c);
            if !before.is_none_or(non_word) || !after.is_none_or(non_word) {
                return None;
            }
        }

        Some(Hit {
            range: TextRange::new(
                TextPosition::new(index, start_column),
                TextPosition::new(index + last, tail_len),
            ),
            span: MatchSpan {
                start: start_byte,
                end: first_line.len(),
            },
        })
    }

    fn first_forward(&self, lines: &[DocumentLine], region: TextRange) -> Option<Hit> {
        (region.start.line..=region.end.line)
            .find_map(|index| self.hits_on_line(lines, index, region).into_iter().next())
    }

    /// First match at or after `from`; with `wrap`, then the first match anywhere in `region`.
    fn next_hit(
        &self,
        lines: &[DocumentLine],
        region: TextRange,
        from: TextPosition,
        wrap: bool,
    ) -> Option<Hit> {
        self.first_forward(lines, TextRange::new(from, region.end))
            .or_else(|| wrap.then(|| self.first_forward(lines, region)).flatten())
    }

    fn last_backward(&self, lines: &[DocumentLine], region: TextRange) -> Option<Hit> {
        (region.start.line..=region.end.line)
            .rev()
            .find_map(|index| self.hits_on_line(lines, index, region).into_iter().last())
    }

    fn all(&self, lines: &[DocumentLine], region: TextRange) -> Vec<Hit> {
        (region.start.line..=region.end.line)
            .flat_map(|index| self.hits_on_line(lines, index, region))
            .collect()
    }
}

impl TextDocument {
    /// The compile error of the most recent search, if its pattern was invalid.
    pub fn last_search_error(&self) -> Option<&PatternError> {
        self.last_pattern_error()
    }

    /// First match at or after `state.from`, wrapping to the start of the region if enabled.
    pub fn find_next(&mut self, state: &SearchState) -> Option<TextRange> {
        let matcher = self.compile(&state.pattern, state.options)?;
        let lines = self.read_lines();
        let query = self.query(&matcher, state.options, &state.pattern);
        let region = search_region(&lines, state.restrict);
        let from = clamp_into(sanitize_in(&lines, state.from), region);

        query
            .next_hit(&lines, region, from, state.wrap)
            .map(|hit| hit.range)
    }

    /// Last match ending at or before `state.from`, wrapping to the end of the region if enabled.
    pub fn find_previous(&mut self, state: &SearchState) -> Option<TextRange> {
        let matcher = self.compile(&state.pattern, state.options)?;
        let lines = self.read_lines();
        let query = self.query(&matcher, state.options, &state.pattern);
        let region = search_region(&lines, state.restrict);
        let from = clamp_into(sanitize_in(&lines, state.from), region);

        query
            .last_backward(&lines, TextRange::new(region.start, from))
            .or_else(|| {
                // Wrapping covers the whole region, including a match around `from`.
                state
                    .wrap
                    .then(|| query.last_backward(&lines, region))
                    .flatten()
            })
            .map(|hit| hit.range)
    }

    /// All non-overlapping matches in document order.
    pub fn find_all(&mut self, pattern: &str, options: SearchOptions) -> Vec<TextRange> {
        self.find_all_in(pattern, options, None)
    }

    /// All non-overlapping matches fully inside `restrict` (or the whole document).
    pub fn find_all_in(
        &mut self,
        pattern: &str,
        options: SearchOptions,
        restrict: Option<TextRange>,
    ) -> Vec<TextRange> {
        let Some(matcher) = self.compile(pattern, options) else {
            return Vec::new();
        };
        let lines = self.read_lines();
        let query = self.query(&matcher, options, pattern);
        let region = search_region(&lines, restrict);
        query
            .all(&lines, region)
            .into_iter()
            .map(|hit| hit.range)
            .collect()
    }

    /// Replace the next match from `state` with `replacement` (captures expanded).
    ///
    /// Returns the position right after the inserted replacement.
    pub fn replace(&mut self, state: &SearchState, replacement: &str) -> Option<TextPosition> {
        let matcher = self.compile(&state.pattern, state.options)?;
        let (range, text) = {
            let lines = self.read_lines();
            let query = self.query(&matcher, state.options, &state.pattern);
            let region = search_region(&lines, state.restrict);
            let from = clamp_into(sanitize_in(&lines, state.from), region);
            let hit = query.next_hit(&lines, region, from, state.wrap)?;
            (hit.range, expansion(&lines, &query, hit, replacement))
        };
        Some(self.replace_range(range, &text))
    }

    /// Replace every match with `replacement` as one undo step; returns the number replaced.
    ///
    /// Afterwards the selection collapses to a caret at its previous start.
    pub fn replace_all(&mut self, pattern: &str, replacement: &str, options: SearchOptions) -> usize {
        self.replace_all_in(pattern, replacement, options, None)
    }

    /// [`TextDocument::replace_all`] limited to matches fully inside `restrict`.
    pub fn replace_all_in(
        &mut self,
        pattern: &str,
        replacement: &str,
        options: SearchOptions,
        restrict: Option<TextRange>,
    ) -> usize {
        let Some(matcher) = self.compile(pattern, options) else {
            return 0;
        };
        let edits: Vec<(TextRange, String)> = {
            let lines = self.read_lines();
            let query = self.query(&matcher, options, pattern);
            let region = search_region(&lines, restrict);
            query
                .all(&lines, region)
                .into_iter()
                .map(|hit| (hit.range, expansion(&lines, &query, hit, replacement)))
                .collect()
        };
        if edits.is_empty() {
            return 0;
        }

        let started_at = self.selection().start;
        // Back to front, so earlier ranges stay valid.
        self.transaction(|doc| {
            for (range, text) in edits.iter().rev() {
                doc.replace_range(*range, text);
            }
        });
        self.set_selection(TextRange::caret(started_at));
        tracing::debug!(pattern, count = edits.len(), "replace all");
        edits.len()
    }

    fn compile(&mut self, pattern: &str, options: SearchOptions) -> Option<Matcher> {
        match Matcher::new(pattern, options) {
            Ok(matcher) => {
                self.set_last_pattern_error(None);
                (!pattern.is_empty()).then_some(matcher)
            }
            Err(error) => {
                self.set_last_pattern_error(Some(error));
                None
            }
        }
    }

    fn query<'a>(&'a self, matcher: &'a Matcher, options: SearchOptions, pattern: &str) -> Query<'a> {
        Query {
            matcher,
            options,
            non_word: self.non_word_chars(),
            pieces: matcher
                .is_multiline_literal()
                .then(|| pattern.split('\n').map(str::to_string).collect()),
        }
    }
}

fn search_region(lines: &[DocumentLine], restrict: Option<TextRange>) -> TextRange {
    let full = TextRange::new(TextPosition::default(), end_of_doc_in(lines));
    match restrict {
        Some(range) => sanitize_range_in(lines, range.normalized()),
        None => full,
    }
}

fn clamp_into(position: TextPosition, region: TextRange) -> TextPosition {
    position.clamp(region.start, region.end)
}

fn expansion(lines: &[DocumentLine], query: &Query<'_>, hit: Hit, replacement: &str) -> String {
    if query.pieces.is_some() {
        return replacement.to_string();
    }
    let haystack = lines[hit.range.start.line].text_without_newline();
    query.matcher.expand(haystack, hit.span, replacement)
}
