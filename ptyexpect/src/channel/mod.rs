//! Channel layer for pattern matching and PTY operations.
//!
//! This module owns the child process and its terminal, the accumulated
//! output buffer, pattern matching and the output log sink.

mod ansi;
mod buffer;
mod patterns;
mod pty;
mod sink;

pub use ansi::AnsiStripper;
pub use buffer::PatternBuffer;
pub use patterns::{find_first, MatchSpan, Pattern, PatternMatcher};
pub use pty::{PtyChannel, PtyConfig};
pub use sink::LogSink;
