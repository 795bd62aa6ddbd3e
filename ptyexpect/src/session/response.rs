//! Result of a successful expect.

use std::time::Duration;

/// Output consumed by a successful expect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Match {
    /// Output between the previous match cursor and the start of this match.
    pub before: String,

    /// The text the pattern matched.
    pub matched: String,

    /// Absolute buffer offset where the match starts.
    pub start: usize,

    /// Absolute buffer offset where the match ends. The cursor moves here.
    pub end: usize,

    /// Time spent waiting.
    pub elapsed: Duration,
}

impl Match {
    pub fn new(
        before: impl Into<String>,
        matched: impl Into<String>,
        start: usize,
        end: usize,
        elapsed: Duration,
    ) -> Self {
        Self {
            before: before.into(),
            matched: matched.into(),
            start,
            end,
            elapsed,
        }
    }

    /// The lines of the preceding output, skipping empty ones.
    pub fn before_lines(&self) -> impl Iterator<Item = &str> {
        self.before
            .lines()
            .map(|l| l.trim_end_matches('\r'))
            .filter(|l| !l.is_empty())
    }

    /// Check if the preceding output contains a substring.
    pub fn contains(&self, pattern: &str) -> bool {
        self.before.contains(pattern)
    }
}

impl std::fmt::Display for Match {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}", self.before, self.matched)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_before_lines_trims_crlf() {
        let m = Match::new("Hello World\r\n\r\nok\r\n", "banscii>", 0, 0, Duration::ZERO);
        let lines: Vec<_> = m.before_lines().collect();
        assert_eq!(lines, ["Hello World", "ok"]);
        assert!(m.contains("World"));
        assert_eq!(m.to_string(), "Hello World\r\n\r\nok\r\nbanscii>");
    }
}
