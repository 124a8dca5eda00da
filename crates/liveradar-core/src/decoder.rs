//! Frame decoder trait and implementations.
//!
//! A [`FrameDecoder`] pulls one decoded [`GameState`] at a time out of a
//! byte stream. Each call to [`advance`] has one of these outcomes:
//!
//! | Outcome | Meaning |
//! |---------|---------|
//! | `Ok(FrameStatus::Decoded(_))` | A new frame; more may follow |
//! | `Ok(FrameStatus::Partial)` | Bytes arrived, but no frame is complete yet |
//! | `Ok(FrameStatus::Pending)` | No new bytes were available |
//! | `Err(DecodeError)` | Malformed data, or the stream itself failed |
//!
//! Decoders are driven from a single thread, strictly in arrival order.
//! The trait takes `&mut self`, so two callers can never advance the same
//! decoder at once.
//!
//! [`JsonLinesDecoder`] reads newline-delimited JSON `GameState` records
//! and is what the radar uses for recordings. [`ScriptedDecoder`] replays
//! a fixed list of outcomes and is used to exercise the ingestion loop.
//!
//! [`advance`]: FrameDecoder::advance

use std::collections::VecDeque;
use std::io::{self, Read};

use liveradar_types::GameState;

/// Largest record accepted before its newline arrives.
pub const MAX_RECORD_BYTES: usize = 16 * 1024 * 1024;

/// Bytes requested from the reader per call.
const READ_CHUNK: usize = 64 * 1024;

/// Result of a successful [`FrameDecoder::advance`] call.
#[derive(Debug, Clone, PartialEq)]
pub enum FrameStatus {
    /// A complete frame was decoded.
    Decoded(Box<GameState>),
    /// New bytes were buffered but no frame is complete yet. Calling
    /// again right away is expected.
    Partial,
    /// No new bytes were available.
    Pending,
}

/// Errors a decoder can report.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    /// A record was complete but could not be decoded.
    #[error("malformed record at line {line}: {source}")]
    Malformed {
        /// 1-based line number of the record.
        line: u64,
        /// The underlying JSON error.
        source: serde_json::Error,
    },

    /// A record grew past the decoder's limit without terminating.
    #[error("record exceeds {limit} bytes without a line break ({bytes} buffered)")]
    RecordTooLarge {
        /// Bytes that were buffered and discarded.
        bytes: usize,
        /// The configured limit.
        limit: usize,
    },

    /// Reading from the underlying stream failed.
    #[error("stream read failed: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: io::Error,
    },
}

impl DecodeError {
    /// Whether the error describes the data rather than the stream.
    ///
    /// Data errors are recoverable: the writer may still be finishing
    /// the record, and later records can decode fine.
    pub const fn is_data_error(&self) -> bool {
        matches!(self, Self::Malformed { .. } | Self::RecordTooLarge { .. })
    }
}

/// A source of decoded game-state frames.
pub trait FrameDecoder {
    /// Try to decode the next frame.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError`] when a record is malformed or the
    /// underlying stream fails. Callers decide which of these are fatal.
    fn advance(&mut self) -> Result<FrameStatus, DecodeError>;
}

impl<D: FrameDecoder + ?Sized> FrameDecoder for Box<D> {
    fn advance(&mut self) -> Result<FrameStatus, DecodeError> {
        (**self).advance()
    }
}

/// Decodes one JSON [`GameState`] per line.
///
/// Each [`advance`](FrameDecoder::advance) call first serves a complete
/// line that is already buffered. Otherwise it performs exactly one read
/// and returns [`FrameStatus::Partial`] if that still does not complete a
/// line, or [`FrameStatus::Pending`] if the read returned nothing.
///
/// Every buffered byte is scanned for a line break once, however many
/// reads a record is split across.
///
/// Blank lines and `\r\n` endings are accepted. A malformed line is
/// reported once and discarded. A record longer than the limit is
/// reported once as [`DecodeError::RecordTooLarge`], and its remaining
/// bytes are dropped up to the next line break.
#[derive(Debug)]
pub struct JsonLinesDecoder<R> {
    reader: R,
    buffer: Vec<u8>,
    /// Start of the first unconsumed byte in `buffer`.
    start: usize,
    /// Bytes of `buffer` already known to hold no line break.
    scanned: usize,
    /// Dropping the rest of an oversized record.
    skipping: bool,
    limit: usize,
    chunk: Vec<u8>,
    line: u64,
    frames: u64,
}

impl<R: Read> JsonLinesDecoder<R> {
    /// Create a decoder over `reader` with the [`MAX_RECORD_BYTES`] limit.
    pub fn new(reader: R) -> Self {
        Self::with_limit(reader, MAX_RECORD_BYTES)
    }

    /// Create a decoder that rejects records longer than `limit` bytes.
    pub fn with_limit(reader: R, limit: usize) -> Self {
        Self {
            reader,
            buffer: Vec::new(),
            start: 0,
            scanned: 0,
            skipping: false,
            limit,
            chunk: vec![0; READ_CHUNK],
            line: 0,
            frames: 0,
        }
    }

    /// Number of frames decoded so far.
    pub const fn frames_decoded(&self) -> u64 {
        self.frames
    }

    /// Number of bytes of an incomplete record currently held.
    pub fn buffered(&self) -> usize {
        self.buffer.len().saturating_sub(self.start)
    }

    /// Pop the next non-blank complete line, if one is buffered.
    fn take_line(&mut self) -> Option<Vec<u8>> {
        loop {
            let from = self.scanned.max(self.start);
            let Some(end) = self
                .buffer
                .get(from..)
                .and_then(|rest| rest.iter().position(|&b| b == b'\n'))
                .map(|offset| from.saturating_add(offset))
            else {
                self.compact();
                return None;
            };

            let raw = self.buffer.get(self.start..end).unwrap_or_default();
            self.start = end.saturating_add(1);
            self.scanned = self.start;
            self.line = self.line.saturating_add(1);
            if std::mem::take(&mut self.skipping) {
                continue;
            }
            let line = raw.strip_suffix(b"\r").unwrap_or(raw);
            if !line.iter().all(u8::is_ascii_whitespace) {
                return Some(line.to_vec());
            }
        }
    }

    /// Drop consumed bytes once no complete line is left.
    fn compact(&mut self) {
        if self.skipping {
            self.buffer.clear();
        } else {
            self.buffer.drain(..self.start);
        }
        self.start = 0;
        self.scanned = self.buffer.len();
    }

    fn decode(&mut self, line: &[u8]) -> Result<FrameStatus, DecodeError> {
        let state: GameState =
            serde_json::from_slice(line).map_err(|source| DecodeError::Malformed {
                line: self.line,
                source,
            })?;
        self.frames = self.frames.saturating_add(1);
        Ok(FrameStatus::Decoded(Box::new(state)))
    }
}

impl<R: Read> FrameDecoder for JsonLinesDecoder<R> {
    fn advance(&mut self) -> Result<FrameStatus, DecodeError> {
        if let Some(line) = self.take_line() {
            return self.decode(&line);
        }

        let n = loop {
            match self.reader.read(&mut self.chunk) {
                Ok(n) => break n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => return Err(e.into()),
            }
        };
        if n == 0 {
            return Ok(FrameStatus::Pending);
        }
        self.buffer
            .extend_from_slice(self.chunk.get(..n).unwrap_or_default());

        if let Some(line) = self.take_line() {
            return self.decode(&line);
        }
        // After `take_line` the buffer holds exactly the unterminated record.
        if !self.skipping && self.buffer.len() > self.limit {
            let bytes = self.buffer.len();
            self.buffer.clear();
            self.scanned = 0;
            self.skipping = true;
            return Err(DecodeError::RecordTooLarge {
                bytes,
                limit: self.limit,
            });
        }
        Ok(FrameStatus::Partial)
    }
}

/// One scripted outcome of a [`ScriptedDecoder`].
#[derive(Debug)]
pub enum ScriptStep {
    /// Yield this frame.
    Frame(GameState),
    /// Report that bytes arrived without completing a frame.
    Partial,
    /// Report that no new bytes were available.
    Pending,
    /// Report a malformed record.
    Malformed,
    /// Report a fatal stream error with this message.
    Fail(String),
}

/// A decoder that replays a fixed script.
///
/// Once the script is exhausted it fails with
/// [`io::ErrorKind::UnexpectedEof`], which ends an ingestion loop.
#[derive(Debug, Default)]
pub struct ScriptedDecoder {
    steps: VecDeque<ScriptStep>,
    calls: u64,
}

impl ScriptedDecoder {
    /// Create a decoder that replays `steps` in order.
    pub fn new(steps: impl IntoIterator<Item = ScriptStep>) -> Self {
        Self {
            steps: steps.into_iter().collect(),
            calls: 0,
        }
    }

    /// Number of `advance` calls made so far.
    pub const fn calls(&self) -> u64 {
        self.calls
    }
}

impl FrameDecoder for ScriptedDecoder {
    fn advance(&mut self) -> Result<FrameStatus, DecodeError> {
        self.calls = self.calls.saturating_add(1);
        match self.steps.pop_front() {
            Some(ScriptStep::Frame(state)) => Ok(FrameStatus::Decoded(Box::new(state))),
            Some(ScriptStep::Partial) => Ok(FrameStatus::Partial),
            Some(ScriptStep::Pending) => Ok(FrameStatus::Pending),
            Some(ScriptStep::Malformed) => {
                Err(DecodeError::Malformed {
                    line: self.calls,
                    source: serde_json::Error::io(io::Error::from(io::ErrorKind::InvalidData)),
                })
            }
            Some(ScriptStep::Fail(message)) => Err(io::Error::other(message).into()),
            None => Err(io::Error::from(io::ErrorKind::UnexpectedEof).into()),
        }
    }
}
