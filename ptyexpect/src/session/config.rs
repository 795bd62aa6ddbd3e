//! Session configuration.

use std::path::PathBuf;
use std::time::Duration;

use crate::channel::PtyConfig;

/// Configuration for an expect session.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Default timeout for `expect_default` and script steps without one.
    pub timeout: Duration,

    /// Appended by `send_line`.
    pub line_terminator: String,

    /// Terminal width.
    pub terminal_width: u16,

    /// Terminal height.
    pub terminal_height: u16,

    /// Remove ANSI escape sequences before matching. The log sink always
    /// receives the raw bytes.
    pub strip_ansi: bool,

    /// Maximum bytes taken from the terminal per read.
    pub read_chunk_size: usize,

    /// Longest single wait for output inside the expect loop.
    pub poll_interval: Duration,

    /// File receiving a verbatim copy of the child's output.
    pub log_path: Option<PathBuf>,

    /// Working directory for the child. Inherited when unset.
    pub cwd: Option<PathBuf>,

    /// Extra environment variables for the child.
    pub env: Vec<(String, String)>,
}

impl SessionConfig {
    pub(crate) fn pty_config(&self) -> PtyConfig {
        PtyConfig {
            terminal_width: self.terminal_width,
            terminal_height: self.terminal_height,
            read_chunk_size: self.read_chunk_size,
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            line_terminator: "\n".to_string(),
            terminal_width: 80,
            terminal_height: 24,
            strip_ansi: false,
            read_chunk_size: 4096,
            poll_interval: Duration::from_millis(10),
            log_path: None,
            cwd: None,
            env: Vec::new(),
        }
    }
}
