//! Log sink receiving a verbatim copy of the child's output.

use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use log::debug;

use crate::error::SpawnError;

/// Destination for a raw copy of everything the child prints.
///
/// The sink is acquired when the session spawns and released on close.
/// Every chunk is flushed as it is written, so the log is complete up to
/// the last received byte even if the process under test hangs.
#[derive(Default)]
pub struct LogSink {
    writer: Option<Box<dyn Write + Send>>,
    path: Option<PathBuf>,
    written: u64,
}

impl LogSink {
    /// A sink that discards output.
    pub fn none() -> Self {
        Self::default()
    }

    /// Create (or truncate) a log file at `path`.
    pub fn create(path: impl AsRef<Path>) -> Result<Self, SpawnError> {
        let path = path.as_ref();
        let file = File::create(path).map_err(|source| SpawnError::LogOpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        debug!("logging child output to {:?}", path);
        Ok(Self {
            writer: Some(Box::new(file)),
            path: Some(path.to_path_buf()),
            written: 0,
        })
    }

    /// Log to an arbitrary writer.
    pub fn from_writer(writer: Box<dyn Write + Send>) -> Self {
        Self {
            writer: Some(writer),
            path: None,
            written: 0,
        }
    }

    /// Append `data` and flush.
    pub fn write(&mut self, data: &[u8]) -> io::Result<()> {
        if let Some(writer) = self.writer.as_mut() {
            writer.write_all(data)?;
            writer.flush()?;
            self.written += data.len() as u64;
        }
        Ok(())
    }

    /// Flush and release the underlying writer. Safe to call repeatedly.
    pub fn close(&mut self) -> io::Result<()> {
        match self.writer.take() {
            Some(mut writer) => {
                debug!("closing log sink after {} bytes", self.written);
                writer.flush()
            }
            None => Ok(()),
        }
    }

    pub fn is_open(&self) -> bool {
        self.writer.is_some()
    }

    /// Path of the log file, if logging to a file.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Total bytes written to the sink.
    pub fn bytes_written(&self) -> u64 {
        self.written
    }
}

impl std::fmt::Debug for LogSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LogSink")
            .field("open", &self.is_open())
            .field("path", &self.path)
            .field("written", &self.written)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;

    #[derive(Clone, Default)]
    struct Shared(Arc<Mutex<Vec<u8>>>);

    impl Write for Shared {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_writer_receives_bytes_verbatim() {
        let shared = Shared::default();
        let mut sink = LogSink::from_writer(Box::new(shared.clone()));
        sink.write(b"\x1b[0mbanscii>").unwrap();
        sink.write(b"\x01x").unwrap();

        assert_eq!(&*shared.0.lock().unwrap(), b"\x1b[0mbanscii>\x01x");
        assert_eq!(sink.bytes_written(), 14);
    }

    #[test]
    fn test_close_is_idempotent() {
        let mut sink = LogSink::from_writer(Box::new(Shared::default()));
        assert!(sink.is_open());
        sink.close().unwrap();
        sink.close().unwrap();
        assert!(!sink.is_open());
        // Writes after close are dropped
        sink.write(b"late").unwrap();
        assert_eq!(sink.bytes_written(), 0);
    }

    #[test]
    fn test_create_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("log.txt");
        let mut sink = LogSink::create(&path).unwrap();
        sink.write(b"QEMU: Terminated\n").unwrap();
        sink.close().unwrap();

        assert_eq!(sink.path(), Some(path.as_path()));
        assert_eq!(std::fs::read(&path).unwrap(), b"QEMU: Terminated\n");
    }

    #[test]
    fn test_create_in_missing_dir_fails() {
        let dir = tempfile::tempdir().unwrap();
        let err = LogSink::create(dir.path().join("missing/log.txt")).unwrap_err();
        assert!(matches!(err, SpawnError::LogOpenFailed { .. }));
    }
}
