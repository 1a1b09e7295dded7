//! Line ending helpers.
//!
//! Documents store text internally with LF (`'\n'`) terminators only. The terminator found in
//! the loaded content is remembered so that saving writes the same style back.

use serde::{Deserialize, Serialize};

/// The newline sequence used when saving a document.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum LineEnding {
    /// Unix-style LF (`'\n'`).
    #[default]
    Lf,
    /// Windows-style CRLF (`"\r\n"`).
    Crlf,
    /// Classic Mac-style CR (`'\r'`).
    Cr,
}

impl LineEnding {
    /// Detect the line ending from the first terminator found in `text`.
    ///
    /// Returns `None` if `text` contains no terminator at all.
    pub fn detect_in_text(text: &str) -> Option<Self> {
        let bytes = text.as_bytes();
        let index = bytes.iter().position(|b| *b == b'\n' || *b == b'\r')?;
        Some(match bytes[index] {
            b'\n' => Self::Lf,
            _ if bytes.get(index + 1) == Some(&b'\n') => Self::Crlf,
            _ => Self::Cr,
        })
    }

    /// The terminator sequence.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Lf => "\n",
            Self::Crlf => "\r\n",
            Self::Cr => "\r",
        }
    }

    /// Convert an LF-normalized text to this line ending for saving.
    pub fn apply_to_text(self, text: &str) -> String {
        match self {
            Self::Lf => text.to_string(),
            other => text.replace('\n', other.as_str()),
        }
    }
}

/// Rewrites every `"\r\n"` and lone `'\r'` to `'\n'`.
pub(crate) fn normalize_to_lf(text: &str) -> std::borrow::Cow<'_, str> {
    if !text.contains('\r') {
        return std::borrow::Cow::Borrowed(text);
    }
    std::borrow::Cow::Owned(text.replace("\r\n", "\n").replace('\r', "\n"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_uses_first_terminator() {
        assert_eq!(LineEnding::detect_in_text("a\r\nb\nc"), Some(LineEnding::Crlf));
        assert_eq!(LineEnding::detect_in_text("a\nb\r\nc"), Some(LineEnding::Lf));
        assert_eq!(LineEnding::detect_in_text("a\rb"), Some(LineEnding::Cr));
        assert_eq!(LineEnding::detect_in_text("abc"), None);
    }

    #[test]
    fn test_normalize_and_apply() {
        assert_eq!(normalize_to_lf("a\r\nb\rc\n"), "a\nb\nc\n");
        assert_eq!(LineEnding::Crlf.apply_to_text("a\nb"), "a\r\nb");
        assert_eq!(LineEnding::Cr.apply_to_text("a\nb"), "a\rb");
    }
}
