//! Builder for spawning sessions.

use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;

use portable_pty::CommandBuilder;

use super::config::SessionConfig;
use super::process::Session;
use crate::channel::{LogSink, PtyChannel};
use crate::error::{Result, SpawnError};

/// Builder for constructing expect sessions.
///
/// # Example
///
/// ```rust,no_run
/// use std::time::Duration;
/// use ptyexpect::SessionBuilder;
///
/// # fn example() -> Result<(), ptyexpect::Error> {
/// let session = SessionBuilder::new("make")
///     .arg("run")
///     .timeout(Duration::from_secs(5))
///     .log_file("log.txt")
///     .spawn()?;
/// # Ok(())
/// # }
/// ```
pub struct SessionBuilder {
    program: String,
    args: Vec<String>,
    config: SessionConfig,
    log_writer: Option<Box<dyn Write + Send>>,
}

impl SessionBuilder {
    /// Create a builder that will run `program`.
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            config: SessionConfig::default(),
            log_writer: None,
        }
    }

    /// Create a builder from a full command line such as `make run`.
    ///
    /// Words are split with POSIX shell quoting rules; no shell is involved.
    pub fn from_command_line(command: &str) -> Result<Self> {
        let mut words = shell_words::split(command)
            .map_err(|e| SpawnError::InvalidCommand(e.to_string()))?
            .into_iter();
        let program = words.next().ok_or(SpawnError::EmptyCommand)?;
        Ok(Self::new(program).args(words))
    }

    /// Replace the whole configuration.
    pub fn config(mut self, config: SessionConfig) -> Self {
        self.config = config;
        self
    }

    /// Add an argument.
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Add several arguments.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Set the default expect timeout (default: 30s).
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    /// Set the terminator appended by `send_line` (default: `"\n"`).
    pub fn line_terminator(mut self, terminator: impl Into<String>) -> Self {
        self.config.line_terminator = terminator.into();
        self
    }

    /// Set terminal dimensions.
    pub fn terminal_size(mut self, width: u16, height: u16) -> Self {
        self.config.terminal_width = width;
        self.config.terminal_height = height;
        self
    }

    /// Strip ANSI escape sequences before matching.
    pub fn strip_ansi(mut self, strip: bool) -> Self {
        self.config.strip_ansi = strip;
        self
    }

    /// Set the maximum bytes taken from the terminal per read.
    pub fn read_chunk_size(mut self, size: usize) -> Self {
        self.config.read_chunk_size = size;
        self
    }

    /// Set the longest single wait inside the expect loop.
    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.config.poll_interval = interval;
        self
    }

    /// Copy all child output to a file, truncating it first.
    pub fn log_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.log_path = Some(path.into());
        self
    }

    /// Copy all child output to `writer`. Takes precedence over `log_file`.
    pub fn log_writer(mut self, writer: Box<dyn Write + Send>) -> Self {
        self.log_writer = Some(writer);
        self
    }

    /// Run the child in `dir`.
    pub fn cwd(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.cwd = Some(dir.into());
        self
    }

    /// Set an environment variable for the child.
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.config.env.push((key.into(), value.into()));
        self
    }

    /// The command line as it will be logged.
    pub fn command_line(&self) -> String {
        shell_words::join(std::iter::once(&self.program).chain(&self.args))
    }

    /// Launch the child and return the session.
    pub fn spawn(self) -> Result<Session> {
        if self.program.is_empty() {
            return Err(SpawnError::EmptyCommand.into());
        }

        let label = self.command_line();

        let mut command = CommandBuilder::new(&self.program);
        command.args(&self.args);
        // portable-pty falls back to $HOME, not our working directory
        match &self.config.cwd {
            Some(cwd) => command.cwd(cwd),
            None => {
                if let Ok(cwd) = std::env::current_dir() {
                    command.cwd(cwd);
                }
            }
        }
        for (key, value) in &self.config.env {
            command.env(key, value);
        }

        // Open the log before the child so no output is missed
        let log = match (self.log_writer, &self.config.log_path) {
            (Some(writer), _) => LogSink::from_writer(writer),
            (None, Some(path)) => LogSink::create(path)?,
            (None, None) => LogSink::none(),
        };

        let channel = PtyChannel::spawn(command, &label, &self.config.pty_config())?;

        Ok(Session::from_parts(self.config, label, channel, log))
    }
}

impl std::fmt::Debug for SessionBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionBuilder")
            .field("program", &self.program)
            .field("args", &self.args)
            .field("config", &self.config)
            .field("log_writer", &self.log_writer.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_command_line_splits_words() {
        let builder = SessionBuilder::from_command_line("make run").unwrap();
        assert_eq!(builder.program, "make");
        assert_eq!(builder.args, ["run"]);
    }

    #[test]
    fn test_from_command_line_quotes() {
        let builder = SessionBuilder::from_command_line(r#"sh -c 'printf "banscii>"'"#).unwrap();
        assert_eq!(builder.program, "sh");
        assert_eq!(builder.args, ["-c", r#"printf "banscii>""#]);
        assert_eq!(builder.command_line(), r#"sh -c 'printf "banscii>"'"#);
    }

    #[test]
    fn test_from_command_line_empty() {
        let err = SessionBuilder::from_command_line("   ").unwrap_err();
        assert!(matches!(err, crate::Error::Spawn(SpawnError::EmptyCommand)));
    }

    #[test]
    fn test_from_command_line_unbalanced_quote() {
        let err = SessionBuilder::from_command_line("echo 'oops").unwrap_err();
        assert!(matches!(err, crate::Error::Spawn(SpawnError::InvalidCommand(_))));
    }

    #[test]
    fn test_setters() {
        let builder = SessionBuilder::new("qemu-system-aarch64")
            .timeout(Duration::from_secs(1))
            .line_terminator("\r")
            .terminal_size(132, 43)
            .strip_ansi(true)
            .log_file("log.txt")
            .env("TERM", "dumb");

        assert_eq!(builder.config.timeout, Duration::from_secs(1));
        assert_eq!(builder.config.line_terminator, "\r");
        assert_eq!(builder.config.terminal_width, 132);
        assert_eq!(builder.config.terminal_height, 43);
        assert!(builder.config.strip_ansi);
        assert_eq!(builder.config.log_path, Some(PathBuf::from("log.txt")));
        assert_eq!(builder.config.env, [("TERM".to_string(), "dumb".to_string())]);
    }
}
