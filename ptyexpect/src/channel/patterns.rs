//! Patterns searched for in child output.

use std::fmt;

use memchr::memmem::Finder;
use regex::bytes::Regex;

/// Byte range of a match, relative to the searched slice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchSpan {
    pub start: usize,
    pub end: usize,
}

impl MatchSpan {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Shift the span by `offset` bytes.
    pub fn offset(self, offset: usize) -> Self {
        Self {
            start: self.start + offset,
            end: self.end + offset,
        }
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// Trait for output matching - literal and regex by default, extensible for custom parsers.
pub trait PatternMatcher: Send + Sync {
    /// Returns the first match in `data`, if any.
    fn find_span(&self, data: &[u8]) -> Option<MatchSpan>;

    /// Check if the data matches the pattern.
    fn is_match(&self, data: &[u8]) -> bool {
        self.find_span(data).is_some()
    }
}

impl PatternMatcher for Regex {
    fn find_span(&self, data: &[u8]) -> Option<MatchSpan> {
        self.find(data).map(|m| MatchSpan::new(m.start(), m.end()))
    }
}

/// A pattern to wait for: a literal substring or a regular expression.
///
/// `&str` and `String` convert into literal patterns, so markers such as
/// `"banscii>"` can be passed directly to `expect`.
#[derive(Clone)]
pub enum Pattern {
    /// Exact byte substring.
    Literal {
        text: String,
        finder: Finder<'static>,
    },

    /// Regular expression over raw bytes.
    Regex(Regex),
}

impl Pattern {
    /// Create a literal substring pattern.
    pub fn literal(text: impl Into<String>) -> Self {
        let text = text.into();
        let finder = Finder::new(text.as_bytes()).into_owned();
        Pattern::Literal { text, finder }
    }

    /// Compile a regular expression pattern.
    pub fn regex(pattern: &str) -> Result<Self, regex::Error> {
        Ok(Pattern::Regex(Regex::new(pattern)?))
    }

    /// The pattern source text.
    pub fn as_str(&self) -> &str {
        match self {
            Pattern::Literal { text, .. } => text,
            Pattern::Regex(re) => re.as_str(),
        }
    }

    pub fn is_literal(&self) -> bool {
        matches!(self, Pattern::Literal { .. })
    }
}

impl PatternMatcher for Pattern {
    fn find_span(&self, data: &[u8]) -> Option<MatchSpan> {
        match self {
            Pattern::Literal { text, finder } => finder
                .find(data)
                .map(|start| MatchSpan::new(start, start + text.len())),
            Pattern::Regex(re) => re.find_span(data),
        }
    }
}

impl fmt::Debug for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Pattern::Literal { text, .. } => f.debug_tuple("Literal").field(text).finish(),
            Pattern::Regex(re) => f.debug_tuple("Regex").field(&re.as_str()).finish(),
        }
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Pattern::Literal { text, .. } => write!(f, "{:?}", text),
            Pattern::Regex(re) => write!(f, "/{}/", re.as_str()),
        }
    }
}

impl From<&str> for Pattern {
    fn from(text: &str) -> Self {
        Pattern::literal(text)
    }
}

impl From<String> for Pattern {
    fn from(text: String) -> Self {
        Pattern::literal(text)
    }
}

impl From<Regex> for Pattern {
    fn from(re: Regex) -> Self {
        Pattern::Regex(re)
    }
}

impl From<&Pattern> for Pattern {
    fn from(pattern: &Pattern) -> Self {
        pattern.clone()
    }
}

/// Find the earliest match among `patterns`.
///
/// Ties on start position go to the lower index.
pub fn find_first(patterns: &[Pattern], data: &[u8]) -> Option<(usize, MatchSpan)> {
    patterns
        .iter()
        .enumerate()
        .filter_map(|(i, p)| p.find_span(data).map(|span| (i, span)))
        .min_by_key(|(i, span)| (span.start, *i))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_literal_match() {
        let pattern = Pattern::literal("banscii>");
        assert_eq!(
            pattern.find_span(b"boot ok\nbanscii> "),
            Some(MatchSpan::new(8, 16))
        );
        assert!(!pattern.is_match(b"banscii"));
        assert!(pattern.is_literal());
    }

    #[test]
    fn test_span_len() {
        let span = Pattern::literal("banscii>").find_span(b"boot ok\nbanscii> ").unwrap();
        assert_eq!(span.len(), 8);
        assert!(!span.is_empty());

        let empty = Pattern::regex(r"x*").unwrap().find_span(b"banscii>").unwrap();
        assert!(empty.is_empty());
        assert_eq!(empty.offset(4), MatchSpan::new(4, 4));
    }

    #[test]
    fn test_literal_is_not_regex() {
        let pattern = Pattern::literal("a.c");
        assert!(!pattern.is_match(b"abc"));
        assert!(pattern.is_match(b"xa.cx"));
    }

    #[test]
    fn test_regex_match() {
        let pattern = Pattern::regex(r"QEMU: \w+").unwrap();
        let span = pattern.find_span(b"...QEMU: Terminated\r\n").unwrap();
        assert_eq!(span, MatchSpan::new(3, 19));
        assert!(!pattern.is_literal());
    }

    #[test]
    fn test_invalid_regex() {
        assert!(Pattern::regex(r"(unclosed").is_err());
    }

    #[test]
    fn test_display() {
        assert_eq!(Pattern::literal("x>").to_string(), "\"x>\"");
        assert_eq!(Pattern::regex(r"\d+").unwrap().to_string(), r"/\d+/");
    }

    #[test]
    fn test_find_first_earliest_wins() {
        let patterns = [Pattern::literal("error"), Pattern::literal("login:")];
        let found = find_first(&patterns, b"login: error");
        assert_eq!(found, Some((1, MatchSpan::new(0, 6))));
    }

    #[test]
    fn test_find_first_tie_goes_to_lower_index() {
        let patterns = [
            Pattern::literal("ban"),
            Pattern::literal("banscii>"),
        ];
        let found = find_first(&patterns, b"banscii>");
        assert_eq!(found.map(|(i, _)| i), Some(0));
    }

    #[test]
    fn test_find_first_none() {
        let patterns = [Pattern::literal("nope")];
        assert!(find_first(&patterns, b"banscii>").is_none());
        assert!(find_first(&[], b"banscii>").is_none());
    }
}
