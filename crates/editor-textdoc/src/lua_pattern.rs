//! Lua-style patterns.
//!
//! A lightweight regex-like dialect:
//!
//! - `.` any character, `%a %c %d %g %l %p %s %u %w %x` character classes (upper case negates),
//!   `%` followed by any other character escapes it
//! - `[set]` / `[^set]` with ranges (`a-z`) and classes (`%d`)
//! - quantifiers `*` (greedy), `+` (greedy, at least one), `-` (lazy), `?` (optional)
//! - `^` / `$` anchors at the very start/end of the pattern
//! - `(...)` captures, `()` position captures, `%1`-`%9` back-references
//! - `%bxy` balanced pairs and `%f[set]` frontiers
//!
//! Matching works on characters; the public API takes and returns byte offsets into the haystack.

use crate::error::PatternError;

const MAX_CAPTURES: usize = 32;

/// A compiled Lua pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LuaPattern {
    source: String,
    pattern: Vec<char>,
    anchored: bool,
}

/// One capture of a [`LuaMatch`], in byte offsets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LuaCapture {
    /// A `(...)` capture spanning `start..end`.
    Span(usize, usize),
    /// A `()` position capture.
    Position(usize),
}

/// A successful match, in byte offsets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LuaMatch {
    /// Start of the whole match.
    pub start: usize,
    /// End of the whole match (exclusive).
    pub end: usize,
    /// Captures in pattern order.
    pub captures: Vec<LuaCapture>,
}

impl LuaPattern {
    /// Compile `pattern`, rejecting malformed input.
    pub fn new(pattern: &str) -> Result<Self, PatternError> {
        let chars: Vec<char> = pattern.chars().collect();
        let anchored = chars.first() == Some(&'^');
        validate(&chars, usize::from(anchored)).map_err(|message| {
            PatternError::InvalidLuaPattern {
                pattern: pattern.to_string(),
                message,
            }
        })?;
        Ok(Self {
            source: pattern.to_string(),
            pattern: chars,
            anchored,
        })
    }

    /// The pattern source.
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// First match starting at or after byte `start`.
    ///
    /// A `^`-anchored pattern only matches at the start of `haystack`.
    pub fn find_at(&self, haystack: &str, start: usize) -> Option<LuaMatch> {
        let subject = Subject::new(haystack);
        self.find_in(&subject, subject.char_of(start))
    }

    /// All non-empty, non-overlapping matches starting at or after byte `start`.
    pub fn find_iter(&self, haystack: &str, start: usize) -> Vec<LuaMatch> {
        let subject = Subject::new(haystack);
        let mut at = subject.char_of(start);
        let mut found = Vec::new();
        while at <= subject.chars.len() {
            let Some((s, e, captures)) = self.match_from(&subject, at) else {
                break;
            };
            if e > s {
                found.push(subject.to_match(s, e, &captures));
                at = e;
            } else {
                at = s + 1;
            }
        }
        found
    }

    /// Expand `%0`-`%9` in `replacement` against `m`; `%%` is a literal percent sign.
    ///
    /// `%1` refers to the whole match when the pattern has no captures. Position captures
    /// expand to their one-based character position.
    pub fn expand(&self, haystack: &str, m: &LuaMatch, replacement: &str) -> String {
        let mut out = String::with_capacity(replacement.len());
        let mut chars = replacement.chars();
        while let Some(ch) = chars.next() {
            if ch != '%' {
                out.push(ch);
                continue;
            }
            match chars.next() {
                Some(d @ '0'..='9') => {
                    let index = d as usize - '0' as usize;
                    let capture = if index == 0 || (index == 1 && m.captures.is_empty()) {
                        Some(LuaCapture::Span(m.start, m.end))
                    } else {
                        m.captures.get(index - 1).copied()
                    };
                    match capture {
                        Some(LuaCapture::Span(s, e)) => out.push_str(&haystack[s..e]),
                        Some(LuaCapture::Position(p)) => {
                            let column = haystack[..p].chars().count() + 1;
                            out.push_str(&column.to_string());
                        }
                        None => {}
                    }
                }
                Some(other) => out.push(other),
                None => out.push('%'),
            }
        }
        out
    }

    fn find_in(&self, subject: &Subject, start: usize) -> Option<LuaMatch> {
        let (s, e, captures) = self.match_from(subject, start)?;
        Some(subject.to_match(s, e, &captures))
    }

    fn match_from(&self, subject: &Subject, start: usize) -> Option<(usize, usize, Vec<Capture>)> {
        if self.anchored && start > 0 {
            return None;
        }
        let first = usize::from(self.anchored);
        let mut s = start;
        while s <= subject.chars.len() {
            let mut state = MatchState {
                src: &subject.chars,
                pat: &self.pattern,
                captures: Vec::new(),
            };
            if let Some(e) = state.do_match(s, first) {
                return Some((s, e, state.captures));
            }
            if self.anchored {
                break;
            }
            s += 1;
        }
        None
    }
}

/// Haystack decoded to characters plus a char-to-byte table.
struct Subject {
    chars: Vec<char>,
    offsets: Vec<usize>,
}

impl Subject {
    fn new(text: &str) -> Self {
        let mut chars = Vec::with_capacity(text.len());
        let mut offsets = Vec::with_capacity(text.len() + 1);
        for (byte, ch) in text.char_indices() {
            chars.push(ch);
            offsets.push(byte);
        }
        offsets.push(text.len());
        Self { chars, offsets }
    }

    fn char_of(&self, byte: usize) -> usize {
        self.offsets.partition_point(|b| *b < byte)
    }

    fn byte_of(&self, index: usize) -> usize {
        self.offsets[index.min(self.offsets.len() - 1)]
    }

    fn to_match(&self, start: usize, end: usize, captures: &[Capture]) -> LuaMatch {
        LuaMatch {
            start: self.byte_of(start),
            end: self.byte_of(end),
            captures: captures
                .iter()
                .map(|c| match c.len {
                    CaptureLen::Position => LuaCapture::Position(self.byte_of(c.init)),
                    CaptureLen::Closed(len) => {
                        LuaCapture::Span(self.byte_of(c.init), self.byte_of(c.init + len))
                    }
                    CaptureLen::Open => LuaCapture::Span(self.byte_of(c.init), self.byte_of(c.init)),
                })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum CaptureLen {
    Open,
    Position,
    Closed(usize),
}

#[derive(Debug, Clone, Copy)]
struct Capture {
    init: usize,
    len: CaptureLen,
}

struct MatchState<'a> {
    src: &'a [char],
    pat: &'a [char],
    captures: Vec<Capture>,
}

impl MatchState<'_> {
    fn do_match(&mut self, mut s: usize, mut p: usize) -> Option<usize> {
        loop {
            let Some(&pc) = self.pat.get(p) else {
                return Some(s);
            };
            match pc {
                '(' => {
                    return if self.pat.get(p + 1) == Some(&')') {
                        self.start_capture(s, p + 2, CaptureLen::Position)
                    } else {
                        self.start_capture(s, p + 1, CaptureLen::Open)
                    };
                }
                ')' => return self.end_capture(s, p + 1),
                '$' if p + 1 == self.pat.len() => {
                    return (s == self.src.len()).then_some(s);
                }
                '%' if self.pat.get(p + 1) == Some(&'b') => {
                    s = self.match_balance(s, p + 2)?;
                    p += 4;
                    continue;
                }
                '%' if self.pat.get(p + 1) == Some(&'f') => {
                    p += 2;
                    let ep = class_end(self.pat, p).ok()?;
                    let previous = if s == 0 { '\0' } else { self.src[s - 1] };
                    let current = self.src.get(s).copied().unwrap_or('\0');
                    if !self.match_bracket_class(previous, p, ep - 1)
                        && self.match_bracket_class(current, p, ep - 1)
                    {
                        p = ep;
                        continue;
                    }
                    return None;
                }
                '%' if self.pat.get(p + 1).is_some_and(char::is_ascii_digit) => {
                    s = self.match_back_reference(s, self.pat[p + 1])?;
                    p += 2;
                    continue;
                }
                _ => {}
            }

            let ep = class_end(self.pat, p).ok()?;
            let quantifier = self.pat.get(ep).copied();
            if !self.single_match(s, p, ep) {
                if matches!(quantifier, Some('*' | '?' | '-')) {
                    p = ep + 1;
                    continue;
                }
                return None;
            }
            match quantifier {
                Some('?') => {
                    if let Some(end) = self.do_match(s + 1, ep + 1) {
                        return Some(end);
                    }
                    p = ep + 1;
                }
                Some('+') => return self.max_expand(s + 1, p, ep),
                Some('*') => return self.max_expand(s, p, ep),
                Some('-') => return self.min_expand(s, p, ep),
                _ => {
                    s += 1;
                    p = ep;
                }
            }
        }
    }

    fn single_match(&self, s: usize, p: usize, ep: usize) -> bool {
        let Some(&c) = self.src.get(s) else {
            return false;
        };
        match self.pat[p] {
            '.' => true,
            '%' => match_class(c, self.pat[p + 1]),
            '[' => self.match_bracket_class(c, p, ep - 1),
            literal => literal == c,
        }
    }

    /// `p` is the opening `[`, `ec` the closing `]`.
    fn match_bracket_class(&self, c: char, p: usize, ec: usize) -> bool {
        let mut p = p + 1;
        let mut matched_result = true;
        if self.pat.get(p) == Some(&'^') {
            matched_result = false;
            p += 1;
        }
        while p < ec {
            if self.pat[p] == '%' {
                p += 1;
                if match_class(c, self.pat[p]) {
                    return matched_result;
                }
                p += 1;
            } else if self.pat.get(p + 1) == Some(&'-') && p + 2 < ec {
                if self.pat[p] <= c && c <= self.pat[p + 2] {
                    return matched_result;
                }
                p += 3;
            } else {
                if self.pat[p] == c {
                    return matched_result;
                }
                p += 1;
            }
        }
        !matched_result
    }

    fn max_expand(&mut self, s: usize, p: usize, ep: usize) -> Option<usize> {
        let mut count = 0;
        while self.single_match(s + count, p, ep) {
            count += 1;
        }
        loop {
            if let Some(end) = self.do_match(s + count, ep + 1) {
                return Some(end);
            }
            if count == 0 {
                return None;
            }
            count -= 1;
        }
    }

    fn min_expand(&mut self, mut s: usize, p: usize, ep: usize) -> Option<usize> {
        loop {
            if let Some(end) = self.do_match(s, ep + 1) {
                return Some(end);
            }
            if self.single_match(s, p, ep) {
                s += 1;
            } else {
                return None;
            }
        }
    }

    fn start_capture(&mut self, s: usize, p: usize, len: CaptureLen) -> Option<usize> {
        if self.captures.len() >= MAX_CAPTURES {
            return None;
        }
        self.captures.push(Capture { init: s, len });
        let result = self.do_match(s, p);
        if result.is_none() {
            self.captures.pop();
        }
        result
    }

    fn end_capture(&mut self, s: usize, p: usize) -> Option<usize> {
        let index = self
            .captures
            .iter()
            .rposition(|c| matches!(c.len, CaptureLen::Open))?;
        self.captures[index].len = CaptureLen::Closed(s - self.captures[index].init);
        let result = self.do_match(s, p);
        if result.is_none() {
            self.captures[index].len = CaptureLen::Open;
        }
        result
    }

    fn match_balance(&self, s: usize, p: usize) -> Option<usize> {
        let (open, close) = (*self.pat.get(p)?, *self.pat.get(p + 1)?);
        if self.src.get(s) != Some(&open) {
            return None;
        }
        let mut depth = 1;
        for (i, &c) in self.src.iter().enumerate().skip(s + 1) {
            if c == close {
                depth -= 1;
                if depth == 0 {
                    return Some(i + 1);
                }
            } else if c == open {
                depth += 1;
            }
        }
        None
    }

    fn match_back_reference(&self, s: usize, digit: char) -> Option<usize> {
        let index = (digit as usize).checked_sub('1' as usize)?;
        let capture = self.captures.get(index)?;
        let CaptureLen::Closed(len) = capture.len else {
            return None;
        };
        let wanted = &self.src[capture.init..capture.init + len];
        let end = s + len;
        (end <= self.src.len() && &self.src[s..end] == wanted).then_some(end)
    }
}

fn match_class(c: char, class: char) -> bool {
    let result = match class.to_ascii_lowercase() {
        'a' => c.is_alphabetic(),
        'c' => c.is_control(),
        'd' => c.is_ascii_digit(),
        'g' => !c.is_whitespace() && !c.is_control(),
        'l' => c.is_lowercase(),
        'p' => c.is_ascii_punctuation(),
        's' => c.is_whitespace(),
        'u' => c.is_uppercase(),
        'w' => c.is_alphanumeric(),
        'x' => c.is_ascii_hexdigit(),
        _ => return class == c,
    };
    if class.is_ascii_uppercase() {
        !result
    } else {
        result
    }
}

/// Index just past the single-character class starting at `p`.
fn class_end(pat: &[char], p: usize) -> Result<usize, String> {
    let c = pat[p];
    let mut p = p + 1;
    match c {
        '%' => {
            if p >= pat.len() {
                return Err("malformed pattern (ends with '%')".to_string());
            }
            Ok(p + 1)
        }
        '[' => {
            if pat.get(p) == Some(&'^') {
                p += 1;
            }
            // The first character of a set is literal, so `[]]` is a set holding `]`.
            loop {
                if p >= pat.len() {
                    return Err("malformed pattern (missing ']')".to_string());
                }
                let cc = pat[p];
                p += 1;
                if cc == '%' {
                    p += 1;
                }
                if pat.get(p) == Some(&']') {
                    return Ok(p + 1);
                }
            }
        }
        _ => Ok(p),
    }
}

fn validate(pat: &[char], mut p: usize) -> Result<(), String> {
    let mut open = 0usize;
    let mut total = 0usize;
    while p < pat.len() {
        match pat[p] {
            '(' => {
                total += 1;
                if total > MAX_CAPTURES {
                    return Err("too many captures".to_string());
                }
                if pat.get(p + 1) == Some(&')') {
                    p += 2;
                } else {
                    open += 1;
                    p += 1;
                }
                continue;
            }
            ')' => {
                if open == 0 {
                    return Err("invalid pattern capture".to_string());
                }
                open -= 1;
                p += 1;
                continue;
            }
            '%' => match pat.get(p + 1) {
                None => return Err("malformed pattern (ends with '%')".to_string()),
                Some('b') => {
                    if p + 3 >= pat.len() {
                        return Err("missing arguments to '%b'".to_string());
                    }
                    p += 4;
                    continue;
                }
                Some('f') => {
                    p += 2;
                    if pat.get(p) != Some(&'[') {
                        return Err("missing '[' after '%f' in pattern".to_string());
                    }
                    p = class_end(pat, p)?;
                    continue;
                }
                Some(d) if d.is_ascii_digit() => {
                    let index = *d as usize - '0' as usize;
                    if index == 0 || index > total - open {
                        return Err(format!("invalid capture index %{index}"));
                    }
                    p += 2;
                    continue;
                }
                Some(_) => {}
            },
            _ => {}
        }
        p = class_end(pat, p)?;
        if matches!(pat.get(p), Some('*' | '+' | '-' | '?')) {
            p += 1;
        }
    }
    if open > 0 {
        return Err("unfinished capture".to_string());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn find(pattern: &str, text: &str) -> Option<(usize, usize)> {
        LuaPattern::new(pattern)
            .unwrap()
            .find_at(text, 0)
            .map(|m| (m.start, m.end))
    }

    #[test]
    fn test_classes_and_quantifiers() {
        assert_eq!(find("%d+", "abc 123 def"), Some((4, 7)));
        assert_eq!(find("%a-%d", "abc1"), Some((0, 4)));
        assert_eq!(find("[%w_]+", "  foo_bar!"), Some((2, 9)));
        assert_eq!(find("colou?r", "the color"), Some((4, 9)));
        assert_eq!(find("%S+$", "one two"), Some((4, 7)));
        assert_eq!(find("^two", "one two"), None);
        assert_eq!(find("[^%s]+", "   x"), Some((3, 4)));
        assert_eq!(find("%.", "a.b"), Some((1, 2)));
    }

    #[test]
    fn test_balance_frontier_and_back_reference() {
        assert_eq!(find("%b()", "f(a(b)c) d"), Some((1, 8)));
        assert_eq!(find("%f[%w]%w+", "  hello"), Some((2, 7)));
        assert_eq!(find("(%a)%1", "abccd"), Some((2, 4)));
    }

    #[test]
    fn test_captures_expand() {
        let pattern = LuaPattern::new("(%w+)=(%w+)").unwrap();
        let text = "key=value";
        let m = pattern.find_at(text, 0).unwrap();
        assert_eq!(m.captures, vec![LuaCapture::Span(0, 3), LuaCapture::Span(4, 9)]);
        assert_eq!(pattern.expand(text, &m, "%2=%1 (%0) 100%%"), "value=key (key=value) 100%");

        let position = LuaPattern::new("()ll").unwrap();
        let m = position.find_at("hello", 0).unwrap();
        assert_eq!(position.expand("hello", &m, "%1"), "3");
    }

    #[test]
    fn test_find_iter_uses_char_columns_and_byte_offsets() {
        let pattern = LuaPattern::new("é+").unwrap();
        let text = "aé bééc";
        let spans: Vec<(usize, usize)> = pattern
            .find_iter(text, 0)
            .into_iter()
            .map(|m| (m.start, m.end))
            .collect();
        assert_eq!(spans, vec![(1, 3), (5, 9)]);
        assert!(LuaPattern::new("x*").unwrap().find_iter("abc", 0).is_empty());
    }

    #[test]
    fn test_malformed_patterns_are_rejected() {
        for bad in ["abc%", "[abc", "(abc", "abc)", "%b(", "%fx", "(a)%2"] {
            assert!(
                matches!(LuaPattern::new(bad), Err(PatternError::InvalidLuaPattern { .. })),
                "{bad} should be rejected"
            );
        }
        assert!(LuaPattern::new("[]]").is_ok());
        assert!(LuaPattern::new("(a)%1").is_ok());
    }
}
