//! # ptyexpect
//!
//! Blocking expect-style automation for programs running on a pseudo-terminal.
//!
//! ptyexpect spawns a child process on a PTY, lets you type into it and
//! blocks until its output matches a pattern, in the spirit of Tcl's
//! `expect` and Python's pexpect. It was written to smoke-test emulated
//! systems: boot an image under QEMU, wait for the shell prompt, poke it,
//! then shut the emulator down.
//!
//! ## Features
//!
//! - PTY spawning via portable-pty
//! - Literal and regex patterns, searched from a forward-only match cursor
//! - Deadline-based timeouts that report the output seen so far
//! - Verbatim output logging to a file or any writer
//! - Optional ANSI escape stripping before matching
//! - Reusable send/expect scripts
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::time::Duration;
//! use ptyexpect::{Expect, Session};
//!
//! fn main() -> Result<(), ptyexpect::Error> {
//!     let mut session = Session::builder("make")
//!         .arg("run")
//!         .log_file("log.txt")
//!         .spawn()?;
//!
//!     session.expect("banscii>", Duration::from_secs(1))?;
//!     session.send_line("Hello World\r")?;
//!     session.expect("banscii>", Duration::from_secs(1))?;
//!
//!     // Escape sequence
//!     session.send_control('A')?;
//!     session.send("x")?;
//!     session.expect("QEMU: Terminated", Duration::from_secs(1))?;
//!
//!     session.close()?;
//!     Ok(())
//! }
//! ```

pub mod channel;
pub mod error;
pub mod session;

// Re-export main types for convenience
pub use channel::Pattern;
pub use error::{Error, Result};
pub use session::{
    Expect, Match, Script, ScriptBuilder, ScriptResult, Session, SessionBuilder, SessionConfig,
    SessionState, Step, StepResult,
};
