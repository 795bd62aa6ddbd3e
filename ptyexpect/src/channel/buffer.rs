//! Append-only output buffer with a forward-only match cursor.
//!
//! Everything the child prints is kept for the life of the session. Each
//! successful expect moves the cursor past its match, so later searches only
//! look at output that no earlier expect has consumed.

use std::borrow::Cow;
use std::time::Duration;

use super::ansi::AnsiStripper;
use super::patterns::{find_first, MatchSpan, Pattern, PatternMatcher};
use crate::session::Match;

/// Buffer for accumulating output and searching it for patterns.
#[derive(Debug)]
pub struct PatternBuffer {
    /// The accumulated output buffer.
    buffer: Vec<u8>,

    /// Offset of the first byte not yet consumed by a match.
    cursor: usize,

    /// Escape stripper, when ANSI stripping is enabled.
    stripper: Option<AnsiStripper>,
}

impl PatternBuffer {
    /// Create an empty buffer.
    ///
    /// With `strip_ansi` set, escape sequences are removed on the way in.
    pub fn new(strip_ansi: bool) -> Self {
        Self {
            buffer: Vec::with_capacity(4096),
            cursor: 0,
            stripper: strip_ansi.then(AnsiStripper::new),
        }
    }

    /// Append newly received output.
    pub fn extend(&mut self, data: &[u8]) {
        match self.stripper.as_mut() {
            Some(stripper) => {
                let cleaned = stripper.strip(data);
                self.buffer.extend_from_slice(&cleaned);
            }
            None => self.buffer.extend_from_slice(data),
        }
    }

    /// Search the unconsumed output for `pattern`.
    ///
    /// The returned span uses absolute buffer offsets.
    pub fn find(&self, pattern: &Pattern) -> Option<MatchSpan> {
        pattern
            .find_span(self.unconsumed())
            .map(|span| span.offset(self.cursor))
    }

    /// Search the unconsumed output for the earliest of several patterns.
    pub fn find_any(&self, patterns: &[Pattern]) -> Option<(usize, MatchSpan)> {
        find_first(patterns, self.unconsumed()).map(|(i, span)| (i, span.offset(self.cursor)))
    }

    /// Consume up to the end of `span` and build the match result.
    ///
    /// `span` must come from [`find`](Self::find) or [`find_any`](Self::find_any)
    /// on this buffer with no intervening consume.
    pub fn consume(&mut self, span: MatchSpan, elapsed: Duration) -> Match {
        debug_assert!(span.start >= self.cursor && span.end <= self.buffer.len());
        let before = lossy(&self.buffer[self.cursor..span.start]);
        let matched = lossy(&self.buffer[span.start..span.end]);
        self.cursor = self.cursor.max(span.end);
        Match::new(before, matched, span.start, span.end, elapsed)
    }

    /// Consume everything received so far.
    pub fn consume_all(&mut self, elapsed: Duration) -> Match {
        let end = self.buffer.len();
        let before = lossy(&self.buffer[self.cursor..]);
        let start = self.cursor;
        self.cursor = end;
        Match::new(before, String::new(), start, end, elapsed)
    }

    /// Output not yet consumed by a match.
    pub fn unconsumed(&self) -> &[u8] {
        &self.buffer[self.cursor..]
    }

    /// Get a reference to the buffer contents.
    pub fn as_slice(&self) -> &[u8] {
        &self.buffer
    }

    /// Get the buffer contents as a string (lossy UTF-8 conversion).
    pub fn as_str_lossy(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.buffer)
    }

    /// Current match cursor.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Get the current buffer length.
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// Check if the buffer is empty.
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }
}

impl Default for PatternBuffer {
    fn default() -> Self {
        Self::new(false)
    }
}

fn lossy(data: &[u8]) -> String {
    String::from_utf8_lossy(data).into_owned()
}
