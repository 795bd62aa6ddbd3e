//! PTY channel owning the child process and its terminal.

use std::io::{self, Read, Write};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread;
use std::time::Duration;

use bytes::Bytes;
use log::{debug, trace, warn};
use portable_pty::{
    native_pty_system, Child, ChildKiller, CommandBuilder, ExitStatus, MasterPty, PtySize,
};

use crate::error::{ChannelError, Result, SessionError, SpawnError};

/// Configuration for the pseudo-terminal.
#[derive(Debug, Clone)]
pub struct PtyConfig {
    /// Terminal width.
    pub terminal_width: u16,

    /// Terminal height.
    pub terminal_height: u16,

    /// Maximum bytes taken from the terminal per read.
    pub read_chunk_size: usize,
}

impl PtyConfig {
    fn pty_size(&self) -> PtySize {
        PtySize {
            rows: self.terminal_height,
            cols: self.terminal_width,
            pixel_width: 0,
            pixel_height: 0,
        }
    }
}

impl Default for PtyConfig {
    fn default() -> Self {
        Self {
            terminal_width: 80,
            terminal_height: 24,
            read_chunk_size: 4096,
        }
    }
}

/// What the reader thread hands back to the session.
enum ReadEvent {
    Data(Bytes),
    Eof,
}

/// A child process running on the slave side of a PTY.
///
/// The master's reader blocks, so a dedicated thread drains it and forwards
/// chunks over a channel. The owning session is the only consumer of that
/// channel and the only writer to the child's input.
pub struct PtyChannel {
    /// Kept alive so the terminal stays open until termination.
    master: Option<Box<dyn MasterPty + Send>>,

    /// Child input. `None` once terminated.
    writer: Option<Box<dyn Write + Send>>,

    child: Box<dyn Child + Send + Sync>,

    chunks: Receiver<ReadEvent>,

    /// The reader has seen the end of the output stream.
    eof: bool,

    exit_status: Option<ExitStatus>,
}

impl PtyChannel {
    /// Open a PTY and launch `command` on it.
    ///
    /// `label` names the command in errors and logs.
    pub fn spawn(command: CommandBuilder, label: &str, config: &PtyConfig) -> Result<Self> {
        let pair = native_pty_system()
            .openpty(config.pty_size())
            .map_err(|e| SpawnError::PtyOpenFailed(e.to_string()))?;

        let child = pair
            .slave
            .spawn_command(command)
            .map_err(|e| SpawnError::CommandFailed {
                command: label.to_string(),
                message: e.to_string(),
            })?;

        // Only the child may hold the slave, otherwise the master never sees EOF
        drop(pair.slave);

        let reader = pair
            .master
            .try_clone_reader()
            .map_err(|e| SpawnError::PtyOpenFailed(e.to_string()))?;
        let writer = pair
            .master
            .take_writer()
            .map_err(|e| SpawnError::PtyOpenFailed(e.to_string()))?;

        let (tx, rx) = mpsc::channel();
        let chunk_size = config.read_chunk_size.max(1);
        thread::Builder::new()
            .name("ptyexpect-reader".into())
            .spawn(move || read_loop(reader, tx, chunk_size))
            .map_err(SpawnError::ReaderThread)?;

        debug!("spawned {:?} (pid {:?})", label, child.process_id());

        Ok(Self {
            master: Some(pair.master),
            writer: Some(writer),
            child,
            chunks: rx,
            eof: false,
            exit_status: None,
        })
    }

    /// Wait up to `wait` for the next chunk of output.
    ///
    /// Returns `None` if nothing arrived in time. Once the output stream has
    /// ended this sleeps for `wait` and returns `None`, so callers polling
    /// against a deadline still observe the full window.
    pub fn read_chunk(&mut self, wait: Duration) -> Option<Bytes> {
        if self.eof {
            thread::sleep(wait);
            return None;
        }

        match self.chunks.recv_timeout(wait) {
            Ok(ReadEvent::Data(chunk)) => Some(chunk),
            Ok(ReadEvent::Eof) | Err(RecvTimeoutError::Disconnected) => {
                debug!("child output reached EOF");
                self.eof = true;
                None
            }
            Err(RecvTimeoutError::Timeout) => None,
        }
    }

    /// Write all of `data` to the child's input and flush.
    pub fn write_all(&mut self, data: &[u8]) -> Result<()> {
        let writer = self.writer.as_mut().ok_or(SessionError::Closed)?;
        writer.write_all(data).map_err(ChannelError::Write)?;
        writer.flush().map_err(ChannelError::Write)?;
        trace!("wrote {} bytes to child", data.len());
        Ok(())
    }

    /// Whether the output stream has ended.
    pub fn is_eof(&self) -> bool {
        self.eof
    }

    /// Non-blocking check for child exit.
    pub fn try_wait(&mut self) -> Result<Option<ExitStatus>> {
        if self.exit_status.is_none() {
            self.exit_status = self.child.try_wait().map_err(ChannelError::Process)?;
        }
        Ok(self.exit_status.clone())
    }

    /// Process id of the child, if the platform reports one.
    pub fn pid(&self) -> Option<u32> {
        self.child.process_id()
    }

    /// Kill the child if it is still running, reap it and release the terminal.
    ///
    /// Calling this again after it succeeded returns the same exit status.
    pub fn terminate(&mut self) -> Result<Option<ExitStatus>> {
        self.writer.take();

        if self.exit_status.is_none() {
            match self.child.try_wait() {
                Ok(Some(status)) => self.exit_status = Some(status),
                Ok(None) => {
                    debug!("killing child (pid {:?})", self.pid());
                    if let Err(e) = self.child.kill() {
                        warn!("failed to kill child: {}", e);
                    }
                    let status = self.child.wait().map_err(ChannelError::Process)?;
                    self.exit_status = Some(status);
                }
                Err(e) => {
                    self.master.take();
                    return Err(ChannelError::Process(e).into());
                }
            }
        }

        self.master.take();
        Ok(self.exit_status.clone())
    }

    /// Whether input can still be written.
    pub fn is_open(&self) -> bool {
        self.writer.is_some()
    }
}

impl std::fmt::Debug for PtyChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PtyChannel")
            .field("pid", &self.pid())
            .field("open", &self.is_open())
            .field("eof", &self.eof)
            .field("exit_status", &self.exit_status)
            .finish()
    }
}

fn read_loop(mut reader: Box<dyn Read + Send>, tx: Sender<ReadEvent>, chunk_size: usize) {
    let mut buf = vec![0u8; chunk_size];
    loop {
        match reader.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => {
                trace!("read {} bytes from pty", n);
                if tx.send(ReadEvent::Data(Bytes::copy_from_slice(&buf[..n]))).is_err() {
                    // Session is gone
                    return;
                }
            }
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => {
                // Linux reports EIO once every slave fd is closed
                debug!("pty read ended: {}", e);
                break;
            }
        }
    }
    let _ = tx.send(ReadEvent::Eof);
}
