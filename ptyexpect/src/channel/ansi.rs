//! ANSI escape sequence stripping.
//!
//! Emulator consoles and shells decorate output with colour codes and cursor
//! movement. When enabled, the session feeds output through a `vte` parser
//! and keeps only printable text plus line control, so patterns can be
//! written against what a user would see.
//!
//! The parser is kept across calls; an escape sequence split over two reads
//! is still removed.

use vte::{Parser, Perform};

/// Streaming ANSI escape stripper.
pub struct AnsiStripper {
    parser: Parser,
}

impl AnsiStripper {
    pub fn new() -> Self {
        Self {
            parser: Parser::new(),
        }
    }

    /// Strip escape sequences from `data`, returning the remaining text.
    pub fn strip(&mut self, data: &[u8]) -> Vec<u8> {
        let mut out = Collector {
            out: Vec::with_capacity(data.len()),
        };
        self.parser.advance(&mut out, data);
        out.out
    }
}

impl Default for AnsiStripper {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for AnsiStripper {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnsiStripper").finish_non_exhaustive()
    }
}

struct Collector {
    out: Vec<u8>,
}

impl Perform for Collector {
    fn print(&mut self, c: char) {
        let mut utf8 = [0u8; 4];
        self.out.extend_from_slice(c.encode_utf8(&mut utf8).as_bytes());
    }

    fn execute(&mut self, byte: u8) {
        if matches!(byte, b'\n' | b'\r' | b'\t') {
            self.out.push(byte);
        }
    }
}
