//! Error types for ptyexpect.

use std::io;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Main error type for ptyexpect operations.
#[derive(Error, Debug)]
pub enum Error {
    /// The child process could not be launched
    #[error("Spawn error: {0}")]
    Spawn(#[from] SpawnError),

    /// I/O failure on the child's terminal after spawn
    #[error("Channel error: {0}")]
    Channel(#[from] ChannelError),

    /// Session-level errors (timeouts, closed sessions, bad input)
    #[error("Session error: {0}")]
    Session(#[from] SessionError),
}

impl Error {
    /// Whether this error is an expect timeout.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Error::Session(SessionError::Timeout { .. }))
    }

    /// Whether this error was caused by using a terminated session.
    pub fn is_closed(&self) -> bool {
        matches!(self, Error::Session(SessionError::Closed))
    }

    /// Output accumulated before a timeout, if this is a timeout.
    pub fn timeout_buffer(&self) -> Option<&str> {
        match self {
            Error::Session(SessionError::Timeout { buffer, .. }) => Some(buffer),
            _ => None,
        }
    }
}

impl From<regex::Error> for Error {
    fn from(err: regex::Error) -> Self {
        Error::Session(SessionError::InvalidPattern(err))
    }
}

/// Errors raised while launching the child process.
#[derive(Error, Debug)]
pub enum SpawnError {
    /// Failed to allocate a pseudo-terminal
    #[error("Failed to open PTY: {0}")]
    PtyOpenFailed(String),

    /// The command could not be started
    #[error("Failed to spawn '{command}': {message}")]
    CommandFailed { command: String, message: String },

    /// No program was given
    #[error("Empty command")]
    EmptyCommand,

    /// The command string could not be split into words
    #[error("Invalid command line: {0}")]
    InvalidCommand(String),

    /// The log file could not be created
    #[error("Failed to open log file {path:?}: {source}")]
    LogOpenFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The output reader thread could not be started
    #[error("Failed to start reader thread: {0}")]
    ReaderThread(#[source] io::Error),
}

/// I/O errors on the child's terminal or the log sink.
#[derive(Error, Debug)]
pub enum ChannelError {
    /// Writing to the child's input failed
    #[error("Write to child failed: {0}")]
    Write(#[source] io::Error),

    /// Writing to the log sink failed
    #[error("Log write failed: {0}")]
    Log(#[source] io::Error),

    /// Waiting on or signalling the child failed
    #[error("Child process error: {0}")]
    Process(#[source] io::Error),
}

/// Session-level errors.
#[derive(Error, Debug)]
pub enum SessionError {
    /// The pattern did not appear before the deadline
    #[error("Pattern {pattern} not found within {timeout:?}")]
    Timeout {
        timeout: Duration,
        pattern: String,
        /// Everything received from the child so far.
        buffer: String,
    },

    /// The session was already closed
    #[error("Session closed")]
    Closed,

    /// The key has no control-character encoding
    #[error("No control character for key {0:?}")]
    InvalidControlKey(char),

    /// Invalid regex pattern
    #[error("Invalid regex pattern: {0}")]
    InvalidPattern(#[from] regex::Error),

    /// `expect_any` was called with an empty pattern list
    #[error("No patterns to expect")]
    NoPatterns,
}

/// Result type alias using ptyexpect's Error.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_helpers() {
        let err: Error = SessionError::Timeout {
            timeout: Duration::from_secs(1),
            pattern: "\"banscii>\"".into(),
            buffer: "booting...".into(),
        }
        .into();

        assert!(err.is_timeout());
        assert!(!err.is_closed());
        assert_eq!(err.timeout_buffer(), Some("booting..."));
        assert_eq!(
            err.to_string(),
            "Session error: Pattern \"banscii>\" not found within 1s"
        );
    }

    #[test]
    fn test_regex_error_converts() {
        fn compile() -> Result<crate::Pattern> {
            Ok(crate::Pattern::regex(r"banscii>(")?)
        }
        let err = compile().unwrap_err();
        assert!(matches!(err, Error::Session(SessionError::InvalidPattern(_))));
    }

    #[test]
    fn test_closed_helpers() {
        let err: Error = SessionError::Closed.into();
        assert!(err.is_closed());
        assert!(!err.is_timeout());
        assert!(err.timeout_buffer().is_none());
    }
}
