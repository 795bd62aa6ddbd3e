//! Expect session over a spawned child process.

use std::borrow::Cow;
use std::time::{Duration, Instant};

use log::{debug, trace, warn};
use portable_pty::ExitStatus;

use super::builder::SessionBuilder;
use super::config::SessionConfig;
use super::response::Match;
use super::Expect;
use crate::channel::{LogSink, Pattern, PatternBuffer, PtyChannel};
use crate::error::{ChannelError, Error, Result, SessionError};

/// Lifecycle state of a [`Session`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// The child was launched; nothing has been sent or expected yet.
    Spawned,

    /// Input was sent, or an expect is in progress.
    Running,

    /// The last expect matched.
    Matched,

    /// The last expect timed out.
    TimedOut,

    /// Closed. Every further operation fails with [`SessionError::Closed`].
    Terminated,
}

/// A child process on a PTY, driven with blocking send/expect calls.
///
/// The session owns the child, every byte of output it has produced and
/// the log sink. Closing (or dropping) the session kills the child if it is
/// still running and closes the log.
///
/// # Example
///
/// ```rust,no_run
/// use std::time::Duration;
/// use ptyexpect::{Expect, Session};
///
/// # fn example() -> Result<(), ptyexpect::Error> {
/// let mut session = Session::builder("make")
///     .arg("run")
///     .log_file("log.txt")
///     .spawn()?;
///
/// session.expect("banscii>", Duration::from_secs(1))?;
/// session.send_line("Hello World\r")?;
/// session.expect("banscii>", Duration::from_secs(1))?;
/// session.send_control('A')?;
/// session.send("x")?;
/// session.expect("QEMU: Terminated", Duration::from_secs(1))?;
/// session.close()?;
/// # Ok(())
/// # }
/// ```
pub struct Session {
    config: SessionConfig,

    /// Command line, for logs and errors.
    command: String,

    channel: PtyChannel,

    buffer: PatternBuffer,

    log: LogSink,

    state: SessionState,
}

impl Session {
    /// Spawn a command line, split with shell word rules.
    ///
    /// Use [`Session::builder`] to configure the session before spawning.
    pub fn spawn(command: &str) -> Result<Self> {
        SessionBuilder::from_command_line(command)?.spawn()
    }

    /// Start configuring a session for `program`.
    pub fn builder(program: impl Into<String>) -> SessionBuilder {
        SessionBuilder::new(program)
    }

    pub(crate) fn from_parts(
        config: SessionConfig,
        command: String,
        channel: PtyChannel,
        log: LogSink,
    ) -> Self {
        Self {
            buffer: PatternBuffer::new(config.strip_ansi),
            config,
            command,
            channel,
            log,
            state: SessionState::Spawned,
        }
    }

    /// Wait for the child's output stream to end.
    ///
    /// The returned match has everything not yet consumed in `before` and an
    /// empty `matched`; the cursor moves to the end of the buffer.
    pub fn expect_eof(&mut self, timeout: Duration) -> Result<Match> {
        self.ensure_open()?;
        self.state = SessionState::Running;

        let start = Instant::now();
        let deadline = start.checked_add(timeout);
        loop {
            if self.channel.is_eof() {
                let m = self.buffer.consume_all(start.elapsed());
                self.state = SessionState::Matched;
                debug!("{}: EOF after {:?}", self.command, m.elapsed);
                return Ok(m);
            }

            let Some(remaining) = remaining(deadline) else {
                return Err(self.timed_out(timeout, "EOF".to_string()));
            };

            self.poll(remaining)?;
        }
    }

    /// Close the session: kill the child if still running and close the log.
    ///
    /// Calling `close` on a closed session does nothing.
    pub fn close(&mut self) -> Result<()> {
        if self.state == SessionState::Terminated {
            return Ok(());
        }
        self.state = SessionState::Terminated;

        let status = self.channel.terminate();
        let log = self.log.close().map_err(ChannelError::Log);

        match &status {
            Ok(status) => debug!("{}: closed, exit status {:?}", self.command, status),
            Err(e) => warn!("{}: error while closing: {}", self.command, e),
        }

        status?;
        log?;
        Ok(())
    }

    /// Whether the child is still running.
    ///
    /// Always `false` once the session is closed.
    pub fn is_alive(&mut self) -> bool {
        matches!(self.channel.try_wait(), Ok(None))
    }

    /// Exit code of the child, or `None` while it is still running.
    ///
    /// Unlike the send and expect operations this keeps working after
    /// [`close`](Self::close), which reaps the child and records its status.
    pub fn exit_status(&mut self) -> Result<Option<u32>> {
        Ok(self
            .channel
            .try_wait()?
            .map(|status: ExitStatus| status.exit_code()))
    }

    /// Current lifecycle state.
    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_closed(&self) -> bool {
        self.state == SessionState::Terminated
    }

    /// Position up to which output has been consumed by expects.
    pub fn cursor(&self) -> usize {
        self.buffer.cursor()
    }

    /// All output received so far.
    pub fn buffer(&self) -> &PatternBuffer {
        &self.buffer
    }

    /// All output received so far, as text.
    pub fn output(&self) -> Cow<'_, str> {
        self.buffer.as_str_lossy()
    }

    /// Process id of the child.
    pub fn pid(&self) -> Option<u32> {
        self.channel.pid()
    }

    /// The command line this session was spawned with.
    pub fn command(&self) -> &str {
        &self.command
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Total bytes written to the log sink.
    pub fn logged_bytes(&self) -> u64 {
        self.log.bytes_written()
    }

    fn ensure_open(&self) -> Result<()> {
        if self.state == SessionState::Terminated {
            return Err(SessionError::Closed.into());
        }
        Ok(())
    }

    /// Wait once for output, for at most `remaining` (capped by the poll
    /// interval), and record whatever arrives.
    fn poll(&mut self, remaining: Duration) -> Result<()> {
        let wait = remaining.min(self.config.poll_interval);
        if let Some(chunk) = self.channel.read_chunk(wait) {
            trace!("{}: received {} bytes", self.command, chunk.len());
            if let Err(e) = self.log.write(&chunk) {
                return Err(self.fail(ChannelError::Log(e).into()));
            }
            self.buffer.extend(&chunk);
        }
        Ok(())
    }

    fn timed_out(&mut self, timeout: Duration, pattern: String) -> Error {
        self.state = SessionState::TimedOut;
        debug!("{}: timed out after {:?} waiting for {}", self.command, timeout, pattern);
        SessionError::Timeout {
            timeout,
            pattern,
            buffer: self.buffer.as_str_lossy().into_owned(),
        }
        .into()
    }

    /// Channel errors are fatal: tear the session down and hand back `err`.
    fn fail(&mut self, err: Error) -> Error {
        warn!("{}: {}", self.command, err);
        if let Err(close_err) = self.close() {
            debug!("{}: close after failure: {}", self.command, close_err);
        }
        err
    }
}

/// Time left before `deadline`, or `None` once it has passed.
///
/// A timeout too large to represent as an `Instant` has no deadline.
fn remaining(deadline: Option<Instant>) -> Option<Duration> {
    match deadline {
        Some(deadline) => deadline
            .checked_duration_since(Instant::now())
            .filter(|left| !left.is_zero()),
        None => Some(Duration::MAX),
    }
}

impl Expect for Session {
    fn send_raw(&mut self, data: &[u8]) -> Result<()> {
        self.ensure_open()?;
        self.state = SessionState::Running;
        trace!("{}: send {:?}", self.command, String::from_utf8_lossy(data));
        self.channel.write_all(data).map_err(|e| self.fail(e))
    }

    fn expect_any(&mut self, patterns: &[Pattern], timeout: Duration) -> Result<(usize, Match)> {
        self.ensure_open()?;
        if patterns.is_empty() {
            return Err(SessionError::NoPatterns.into());
        }
        self.state = SessionState::Running;

        let start = Instant::now();
        let deadline = start.checked_add(timeout);
        loop {
            if let Some((index, span)) = self.buffer.find_any(patterns) {
                let m = self.buffer.consume(span, start.elapsed());
                self.state = SessionState::Matched;
                debug!(
                    "{}: matched {} after {:?}",
                    self.command, patterns[index], m.elapsed
                );
                return Ok((index, m));
            }

            let Some(remaining) = remaining(deadline) else {
                let pattern = patterns
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join(" | ");
                return Err(self.timed_out(timeout, pattern));
            };

            self.poll(remaining)?;
        }
    }

    fn line_terminator(&self) -> &str {
        &self.config.line_terminator
    }

    fn default_timeout(&self) -> Duration {
        self.config.timeout
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if self.state != SessionState::Terminated {
            debug!("{}: dropped without close, closing", self.command);
            if let Err(e) = self.close() {
                warn!("{}: close on drop failed: {}", self.command, e);
            }
        }
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("command", &self.command)
            .field("state", &self.state)
            .field("cursor", &self.buffer.cursor())
            .field("buffered", &self.buffer.len())
            .field("channel", &self.channel)
            .field("log", &self.log)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remaining_without_deadline_is_unbounded() {
        assert_eq!(remaining(None), Some(Duration::MAX));
        assert!(Instant::now().checked_add(Duration::MAX).is_none());
    }

    #[test]
    fn test_remaining_before_and_after_deadline() {
        let now = Instant::now();
        let left = remaining(Some(now + Duration::from_secs(3600))).unwrap();
        assert!(left > Duration::from_secs(3599));
        assert!(remaining(Some(now)).is_none());
    }
}
