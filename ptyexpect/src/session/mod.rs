//! Expect sessions driving a child process.
//!
//! The session layer provides the main API: spawn a command on a PTY, send
//! it input and block until its output matches a pattern.

mod builder;
pub mod config;
mod control;
mod process;
pub(crate) mod response;
pub mod script;

pub use builder::SessionBuilder;
pub use config::SessionConfig;
pub use control::control_code;
pub use process::{Session, SessionState};
pub use response::Match;
pub use script::{Script, ScriptBuilder, ScriptResult, Step, StepResult};

use std::time::Duration;

use crate::channel::Pattern;
use crate::error::{Result, SessionError};

/// Blocking send/expect operations over an interactive child.
///
/// Implementors supply raw writes and multi-pattern expects; everything
/// else is built on top of those two.
pub trait Expect {
    /// Write bytes to the child with no line terminator.
    fn send_raw(&mut self, data: &[u8]) -> Result<()>;

    /// Block until one of `patterns` matches unconsumed output or `timeout`
    /// elapses.
    ///
    /// Returns the index of the winning pattern with the match. When several
    /// patterns match, the one starting earliest wins.
    fn expect_any(&mut self, patterns: &[Pattern], timeout: Duration) -> Result<(usize, Match)>;

    /// Terminator appended by [`send_line`](Self::send_line).
    fn line_terminator(&self) -> &str;

    /// Timeout used by [`expect_default`](Self::expect_default).
    fn default_timeout(&self) -> Duration;

    /// Write a string with no line terminator.
    fn send(&mut self, text: &str) -> Result<()> {
        self.send_raw(text.as_bytes())
    }

    /// Write `text` followed by the line terminator.
    fn send_line(&mut self, text: &str) -> Result<()> {
        let mut line = String::with_capacity(text.len() + self.line_terminator().len());
        line.push_str(text);
        line.push_str(self.line_terminator());
        self.send_raw(line.as_bytes())
    }

    /// Write the control character for `key`, e.g. `'A'` for Ctrl-A.
    fn send_control(&mut self, key: char) -> Result<()> {
        let code = control_code(key).ok_or(SessionError::InvalidControlKey(key))?;
        self.send_raw(&[code])
    }

    /// Block until `pattern` matches unconsumed output or `timeout` elapses.
    ///
    /// # Example
    ///
    /// ```rust,no_run
    /// use std::time::Duration;
    /// use ptyexpect::{Expect, Session};
    ///
    /// # fn example() -> Result<(), ptyexpect::Error> {
    /// let mut session = Session::spawn("make run")?;
    /// session.expect("banscii>", Duration::from_secs(1))?;
    /// # Ok(())
    /// # }
    /// ```
    fn expect(&mut self, pattern: impl Into<Pattern>, timeout: Duration) -> Result<Match>
    where
        Self: Sized,
    {
        let patterns = [pattern.into()];
        self.expect_any(&patterns, timeout).map(|(_, m)| m)
    }

    /// [`expect`](Self::expect) with the default timeout.
    fn expect_default(&mut self, pattern: impl Into<Pattern>) -> Result<Match>
    where
        Self: Sized,
    {
        let timeout = self.default_timeout();
        self.expect(pattern, timeout)
    }

    /// Run every step of `script` in order, stopping at the first error.
    fn run_script(&mut self, script: &Script) -> Result<ScriptResult>
    where
        Self: Sized,
    {
        script.run(self)
    }
}
