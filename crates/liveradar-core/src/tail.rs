//! Reading a recording while another process is still appending to it.
//!
//! [`GrowingFile`] wraps any [`Read`] and turns a temporary end-of-data
//! into a short sleep followed by another attempt, so the caller sees an
//! unbounded, gapless byte stream. It has no notion of "done": the only
//! way out of a read is new data or a genuine I/O error.
//!
//! [`wait_for_source`] covers the step before that: the recording may not
//! exist yet, or may exist but still be empty. Each failed attempt is
//! classified by [`classify_open_error`] and handled as the kind's
//! [`Recovery`] says.

use std::fs::File;
use std::io::{self, Read};
use std::path::Path;
use std::thread;
use std::time::Duration;

use tracing::{debug, error, info, warn};

use crate::ingest::{IngestError, IngestErrorKind, Recovery};

/// Lower bound for every busy-poll sleep in this module.
///
/// A zero interval would spin a core at 100% while the recording is idle.
pub const MIN_RETRY_INTERVAL: Duration = Duration::from_micros(100);

/// Default delay between read attempts at a temporary end-of-data.
pub const DEFAULT_READ_RETRY: Duration = Duration::from_millis(1);

/// Clamp an interval to [`MIN_RETRY_INTERVAL`].
pub fn retry_interval(interval: Duration) -> Duration {
    interval.max(MIN_RETRY_INTERVAL)
}

/// A reader over a file that is still being written.
///
/// `read` blocks the calling thread until at least one byte is available.
/// `Ok(0)` is returned only for an empty destination buffer, never as an
/// end-of-stream signal. `Interrupted` and `WouldBlock` are treated like
/// end-of-data and retried; every other error is returned to the caller.
#[derive(Debug)]
pub struct GrowingFile<R> {
    inner: R,
    retry: Duration,
    bytes_read: u64,
}

impl<R: Read> GrowingFile<R> {
    /// Wrap `inner`, sleeping `retry` (at least [`MIN_RETRY_INTERVAL`])
    /// whenever no data is currently available.
    pub fn new(inner: R, retry: Duration) -> Self {
        Self {
            inner,
            retry: retry_interval(retry),
            bytes_read: 0,
        }
    }

    /// Total bytes handed out so far.
    pub const fn bytes_read(&self) -> u64 {
        self.bytes_read
    }

    /// The effective retry interval.
    pub const fn retry(&self) -> Duration {
        self.retry
    }

    /// Unwrap the underlying reader.
    pub fn into_inner(self) -> R {
        self.inner
    }
}

impl<R: Read> Read for GrowingFile<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        loop {
            match self.inner.read(buf) {
                Ok(0) => thread::sleep(self.retry),
                Ok(n) => {
                    self.bytes_read = self.bytes_read.saturating_add(n as u64);
                    return Ok(n);
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => thread::sleep(self.retry),
                Err(e) => return Err(e),
            }
        }
    }
}

/// Classify a failed attempt to open the recording.
///
/// Missing and empty files are the normal "not started yet" state. A
/// path that can never name a readable file is fatal. Anything else,
/// such as a file locked by the writer, is worth a warning and a retry.
pub fn classify_open_error(error: &io::Error) -> IngestErrorKind {
    match error.kind() {
        io::ErrorKind::NotFound | io::ErrorKind::UnexpectedEof => IngestErrorKind::SourceNotReady,
        io::ErrorKind::InvalidInput
        | io::ErrorKind::IsADirectory
        | io::ErrorKind::NotADirectory => IngestErrorKind::FatalIo,
        _ => IngestErrorKind::SourceUnreadable,
    }
}

/// Open `path` if it is a regular file holding at least one byte.
fn open_nonempty(path: &Path) -> io::Result<File> {
    let file = File::open(path)?;
    let meta = file.metadata()?;
    if meta.is_dir() {
        return Err(io::Error::new(
            io::ErrorKind::IsADirectory,
            "recording path is a directory",
        ));
    }
    if meta.len() == 0 {
        return Err(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            "recording is still empty",
        ));
    }
    info!(path = %path.display(), size = meta.len(), "Recording opened");
    Ok(file)
}

/// Block until the recording at `path` exists and holds at least one
/// byte, then return it opened read-only.
///
/// Retryable failures are retried every `interval` forever.
///
/// # Errors
///
/// Returns [`IngestError::Unopenable`] when the path can never be opened
/// as a recording, e.g. because it names a directory.
pub fn wait_for_source(path: &Path, interval: Duration) -> Result<File, IngestError> {
    let interval = retry_interval(interval);
    let mut announced = false;
    loop {
        let source = match open_nonempty(path) {
            Ok(file) => return Ok(file),
            Err(e) => e,
        };
        let kind = classify_open_error(&source);
        match kind.recovery() {
            Recovery::Terminate => {
                error!(path = %path.display(), error = %source, "Recording cannot be opened");
                return Err(IngestError::Unopenable {
                    path: path.to_path_buf(),
                    source,
                });
            }
            Recovery::LogAndRetry => {
                warn!(path = %path.display(), ?kind, error = %source, "Cannot open recording");
            }
            Recovery::RetrySilently | Recovery::Degrade => {
                debug!(path = %path.display(), ?kind, error = %source, "Recording not ready");
            }
        }
        if !announced {
            info!(
                path = %path.display(),
                interval_ms = interval.as_millis(),
                "Waiting for recording to appear"
            );
            announced = true;
        }
        thread::sleep(interval);
    }
}
