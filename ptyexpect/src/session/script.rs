//! Scripted send/expect sequences.
//!
//! A smoke test is usually a fixed dialogue: wait for a prompt, type
//! something, wait again, send an escape sequence, wait for shutdown. A
//! [`Script`] captures that dialogue as a value that can be built once and
//! run against any [`Expect`] implementation.

use std::time::{Duration, Instant};

use log::{debug, warn};

use super::response::Match;
use super::Expect;
use crate::channel::Pattern;
use crate::error::Result;

/// One step of a script.
#[derive(Debug, Clone)]
pub enum Step {
    /// Send text followed by the session's line terminator.
    SendLine(String),

    /// Send text as-is.
    Send(String),

    /// Send the control character for a key.
    SendControl(char),

    /// Wait for a pattern. `None` uses the session's default timeout.
    Expect {
        pattern: Pattern,
        timeout: Option<Duration>,
    },
}

/// An ordered sequence of steps.
///
/// # Example
///
/// ```rust
/// use std::time::Duration;
/// use ptyexpect::Script;
///
/// let smoke = Script::builder()
///     .expect("banscii>", Duration::from_secs(1))
///     .send_line("Hello World\r")
///     .expect("banscii>", Duration::from_secs(1))
///     .send_control('A')
///     .send("x")
///     .expect("QEMU: Terminated", Duration::from_secs(1))
///     .build();
///
/// assert_eq!(smoke.len(), 6);
/// ```
#[derive(Debug, Clone, Default)]
pub struct Script {
    steps: Vec<Step>,
}

impl Script {
    pub fn new(steps: Vec<Step>) -> Self {
        Self { steps }
    }

    pub fn builder() -> ScriptBuilder {
        ScriptBuilder::default()
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Run every step against `session`, stopping at the first error.
    pub fn run<E: Expect>(&self, session: &mut E) -> Result<ScriptResult> {
        let start = Instant::now();
        let mut results = Vec::new();

        for (index, step) in self.steps.iter().enumerate() {
            let outcome = match step {
                Step::SendLine(text) => session.send_line(text),
                Step::Send(text) => session.send(text),
                Step::SendControl(key) => session.send_control(*key),
                Step::Expect { pattern, timeout } => {
                    let timeout = timeout.unwrap_or_else(|| session.default_timeout());
                    session
                        .expect_any(std::slice::from_ref(pattern), timeout)
                        .map(|(_, m)| {
                            results.push(StepResult {
                                index,
                                pattern: pattern.to_string(),
                                matched: m,
                            });
                        })
                }
            };

            if let Err(e) = outcome {
                warn!("script step {} ({:?}) failed: {}", index, step, e);
                return Err(e);
            }
        }

        let elapsed = start.elapsed();
        debug!("script of {} steps finished in {:?}", self.steps.len(), elapsed);
        Ok(ScriptResult {
            steps: results,
            elapsed,
        })
    }
}

/// Fluent builder for [`Script`].
#[derive(Debug, Default)]
pub struct ScriptBuilder {
    steps: Vec<Step>,
}

impl ScriptBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Send a line.
    pub fn send_line(mut self, text: impl Into<String>) -> Self {
        self.steps.push(Step::SendLine(text.into()));
        self
    }

    /// Send text without a terminator.
    pub fn send(mut self, text: impl Into<String>) -> Self {
        self.steps.push(Step::Send(text.into()));
        self
    }

    /// Send a control character.
    pub fn send_control(mut self, key: char) -> Self {
        self.steps.push(Step::SendControl(key));
        self
    }

    /// Wait for a pattern with an explicit timeout.
    pub fn expect(mut self, pattern: impl Into<Pattern>, timeout: Duration) -> Self {
        self.steps.push(Step::Expect {
            pattern: pattern.into(),
            timeout: Some(timeout),
        });
        self
    }

    /// Wait for a pattern with the session's default timeout.
    pub fn expect_default(mut self, pattern: impl Into<Pattern>) -> Self {
        self.steps.push(Step::Expect {
            pattern: pattern.into(),
            timeout: None,
        });
        self
    }

    pub fn build(self) -> Script {
        Script { steps: self.steps }
    }
}

/// Outcome of a successful script run.
#[derive(Debug, Clone)]
pub struct ScriptResult {
    /// One entry per expect step, in order.
    pub steps: Vec<StepResult>,

    /// Total time for the run.
    pub elapsed: Duration,
}

impl ScriptResult {
    /// The last match of the run.
    pub fn last_match(&self) -> Option<&Match> {
        self.steps.last().map(|s| &s.matched)
    }

    /// All consumed output, concatenated.
    pub fn full_output(&self) -> String {
        self.steps.iter().map(|s| s.matched.to_string()).collect()
    }
}

/// A matched expect step.
#[derive(Debug, Clone)]
pub struct StepResult {
    /// Position of the step in the script.
    pub index: usize,

    /// The pattern, as displayed.
    pub pattern: String,

    pub matched: Match,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::PatternBuffer;
    use crate::error::SessionError;

    /// In-memory child: each line sent produces a canned reply.
    struct Echo {
        buffer: PatternBuffer,
        sent: Vec<u8>,
        reply: &'static [u8],
    }

    impl Echo {
        fn new(banner: &[u8], reply: &'static [u8]) -> Self {
            let mut buffer = PatternBuffer::default();
            buffer.extend(banner);
            Self {
                buffer,
                sent: Vec::new(),
                reply,
            }
        }
    }

    impl Expect for Echo {
        fn send_raw(&mut self, data: &[u8]) -> Result<()> {
            self.sent.extend_from_slice(data);
            self.buffer.extend(data);
            if data.ends_with(b"\n") {
                self.buffer.extend(self.reply);
            }
            Ok(())
        }

        fn expect_any(&mut self, patterns: &[Pattern], timeout: Duration) -> Result<(usize, Match)> {
            match self.buffer.find_any(patterns) {
                Some((i, span)) => Ok((i, self.buffer.consume(span, Duration::ZERO))),
                None => Err(SessionError::Timeout {
                    timeout,
                    pattern: patterns[0].to_string(),
                    buffer: self.buffer.as_str_lossy().into_owned(),
                }
                .into()),
            }
        }

        fn line_terminator(&self) -> &str {
            "\n"
        }

        fn default_timeout(&self) -> Duration {
            Duration::from_secs(30)
        }
    }

    #[test]
    fn test_builder_order() {
        let script = ScriptBuilder::new()
            .expect_default("banscii>")
            .send_line("Hello World")
            .send_control('A')
            .send("x")
            .build();

        assert_eq!(script.len(), 4);
        assert!(matches!(script.steps()[0], Step::Expect { timeout: None, .. }));
        assert!(matches!(&script.steps()[1], Step::SendLine(s) if s == "Hello World"));
        assert!(matches!(script.steps()[2], Step::SendControl('A')));
        assert!(matches!(&script.steps()[3], Step::Send(s) if s == "x"));
    }

    #[test]
    fn test_run_sends_bytes_in_order() {
        let mut child = Echo::new(b"banscii> ", b"   /\\\nbanscii> ");
        let script = Script::builder()
            .expect("banscii>", Duration::from_secs(1))
            .send_line("Hello World\r")
            .expect("banscii>", Duration::from_secs(1))
            .send_control('A')
            .send("x")
            .build();

        let result = child.run_script(&script).unwrap();

        assert_eq!(child.sent, b"Hello World\r\n\x01x");
        assert_eq!(result.steps.len(), 2);
        assert_eq!(result.steps[0].index, 0);
        assert_eq!(result.steps[1].index, 2);
        assert_eq!(result.steps[1].pattern, "\"banscii>\"");
        assert!(result.steps[1].matched.before.contains("Hello World"));
        assert_eq!(result.last_match().unwrap().matched, "banscii>");
    }

    #[test]
    fn test_run_stops_at_timeout() {
        let mut child = Echo::new(b"booting", b"");
        let script = Script::builder()
            .expect("banscii>", Duration::from_millis(10))
            .send_line("never sent")
            .build();

        let err = script.run(&mut child).unwrap_err();
        assert!(err.is_timeout());
        assert_eq!(err.timeout_buffer(), Some("booting"));
        assert!(child.sent.is_empty());
    }

    #[test]
    fn test_invalid_control_key_fails_run() {
        let mut child = Echo::new(b"", b"");
        let script = Script::builder().send_control('1').build();
        let err = script.run(&mut child).unwrap_err();
        assert!(matches!(
            err,
            crate::Error::Session(SessionError::InvalidControlKey('1'))
        ));
    }

    #[test]
    fn test_full_output() {
        let mut child = Echo::new(b"a> b> ", b"");
        let script = Script::builder()
            .expect(">", Duration::from_secs(1))
            .expect(">", Duration::from_secs(1))
            .build();
        let result = script.run(&mut child).unwrap();
        assert_eq!(result.full_output(), "a> b>");
    }
}
