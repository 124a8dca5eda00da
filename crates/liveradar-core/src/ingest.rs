//! The ingestion loop.
//!
//! One dedicated thread runs `decode -> build -> publish` for the life of
//! the process. The loop has no exit condition and no cancellation: it
//! returns only when the stream fails for a reason other than "no data
//! yet", and process shutdown is the only other way it stops. The
//! publisher keeps serving the last good snapshot afterwards.
//!
//! # Error policy
//!
//! Every failure the pipeline can meet is classified into an
//! [`IngestErrorKind`], and [`IngestErrorKind::recovery`] is the single
//! decision table saying what happens next:
//!
//! | Kind | Recovery |
//! |------|----------|
//! | `SourceNotReady` | retry silently on the source poll interval |
//! | `SourceUnreadable` | log a warning, retry on the source poll interval |
//! | `DecodeStall` | retry silently after the decode backoff |
//! | `DecodeCorruption` | log a warning, retry after the decode backoff |
//! | `LookupMiss` | degrade to a fallback value, keep going |
//! | `FatalIo` | stop the loop |
//!
//! A decoder that buffered new bytes without completing a frame is not
//! stalled: it is advanced again at once, with no backoff.

use std::convert::Infallible;
use std::io;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

use tracing::{debug, error, info, trace, warn};

use crate::decoder::{DecodeError, FrameDecoder, FrameStatus, JsonLinesDecoder};
use crate::maps::MapError;
use crate::projection::MapProjection;
use crate::publisher::SnapshotPublisher;
use crate::snapshot::build_snapshot;
use crate::tail::{self, GrowingFile};

/// Published frames between two progress log lines.
const PROGRESS_LOG_EVERY: u64 = 512;

/// Classification of everything that can interrupt ingestion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IngestErrorKind {
    /// The recording does not exist yet or is still empty.
    SourceNotReady,
    /// The recording exists but cannot be opened right now, for example
    /// because the writer holds it locked.
    SourceUnreadable,
    /// Not enough bytes for a complete frame yet.
    DecodeStall,
    /// A record could not be decoded.
    DecodeCorruption,
    /// Map metadata or a background image is missing.
    LookupMiss,
    /// The source stream failed for a reason other than "no data yet".
    FatalIo,
}

/// What the pipeline does about an [`IngestErrorKind`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Recovery {
    /// Wait and try again without logging.
    RetrySilently,
    /// Log a warning, then wait and try again.
    LogAndRetry,
    /// Substitute a documented fallback value and continue.
    Degrade,
    /// Stop the ingestion loop.
    Terminate,
}

impl IngestErrorKind {
    /// The recovery decision for this kind.
    pub const fn recovery(self) -> Recovery {
        match self {
            Self::SourceNotReady | Self::DecodeStall => Recovery::RetrySilently,
            Self::SourceUnreadable | Self::DecodeCorruption => Recovery::LogAndRetry,
            Self::LookupMiss => Recovery::Degrade,
            Self::FatalIo => Recovery::Terminate,
        }
    }
}

impl DecodeError {
    /// Classify a decoder error.
    pub const fn kind(&self) -> IngestErrorKind {
        match self {
            Self::Malformed { .. } | Self::RecordTooLarge { .. } => {
                IngestErrorKind::DecodeCorruption
            }
            Self::Io { .. } => IngestErrorKind::FatalIo,
        }
    }
}

impl MapError {
    /// Classify a map lookup error. Always [`IngestErrorKind::LookupMiss`].
    pub const fn kind(&self) -> IngestErrorKind {
        match self {
            Self::Io { .. } | Self::Image { .. } => IngestErrorKind::LookupMiss,
        }
    }
}

/// Errors that stop the ingestion loop.
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    /// The recording path can never be opened as a file.
    #[error("cannot open recording {path}: {source}")]
    Unopenable {
        /// The configured recording path.
        path: PathBuf,
        /// The underlying I/O error.
        source: io::Error,
    },

    /// The source stream failed.
    #[error("recording stream failed: {source}")]
    Fatal {
        /// The underlying I/O error.
        source: io::Error,
    },
}

impl IngestError {
    /// Classify this error. Always [`IngestErrorKind::FatalIo`].
    pub const fn kind(&self) -> IngestErrorKind {
        match self {
            Self::Unopenable { .. } | Self::Fatal { .. } => IngestErrorKind::FatalIo,
        }
    }
}

/// Suspension intervals of the pipeline's busy-poll waits.
///
/// Every interval is clamped to [`tail::MIN_RETRY_INTERVAL`] so idle
/// waiting never spins a core.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IngestIntervals {
    /// Between checks for the recording to appear.
    pub source_poll: Duration,
    /// Between read attempts at a temporary end-of-data.
    pub read_retry: Duration,
    /// After a stalled or corrupt decode.
    pub decode_backoff: Duration,
}

impl IngestIntervals {
    /// Build intervals from milliseconds.
    pub fn from_millis(source_poll_ms: u64, read_retry_ms: u64, decode_backoff_ms: u64) -> Self {
        Self {
            source_poll: Duration::from_millis(source_poll_ms),
            read_retry: Duration::from_millis(read_retry_ms),
            decode_backoff: Duration::from_millis(decode_backoff_ms),
        }
    }

    /// Near-zero intervals for tests.
    pub const fn immediate() -> Self {
        Self {
            source_poll: tail::MIN_RETRY_INTERVAL,
            read_retry: tail::MIN_RETRY_INTERVAL,
            decode_backoff: tail::MIN_RETRY_INTERVAL,
        }
    }
}

impl Default for IngestIntervals {
    fn default() -> Self {
        Self {
            source_poll: Duration::from_secs(1),
            read_retry: tail::DEFAULT_READ_RETRY,
            decode_backoff: Duration::from_millis(5),
        }
    }
}

/// Drive `decoder` forever, publishing one snapshot per decoded frame.
///
/// Snapshots carry strictly increasing sequence numbers starting at 1.
/// Stalls and corrupt records are retried after
/// `intervals.decode_backoff`; partial progress is retried immediately.
/// Returns only on a fatal stream error.
pub fn run_ingest<D>(
    decoder: &mut D,
    projection: &MapProjection,
    publisher: &SnapshotPublisher,
    intervals: &IngestIntervals,
) -> Result<Infallible, IngestError>
where
    D: FrameDecoder + ?Sized,
{
    let backoff = tail::retry_interval(intervals.decode_backoff);
    let mut sequence: u64 = 0;
    let mut corrupt: u64 = 0;

    info!(map = projection.map_name(), "Ingestion started");

    loop {
        let kind = match decoder.advance() {
            Ok(FrameStatus::Decoded(state)) => {
                sequence = sequence.saturating_add(1);
                let snapshot = build_snapshot(&state, projection, sequence);
                debug!(
                    sequence,
                    tick = snapshot.tick,
                    players = snapshot.players.len(),
                    bomb = snapshot.bomb.is_some(),
                    "Snapshot published"
                );
                publisher.publish(snapshot);
                if sequence % PROGRESS_LOG_EVERY == 0 {
                    info!(frames = sequence, tick = state.tick, corrupt, "Ingestion progress");
                }
                continue;
            }
            Ok(FrameStatus::Partial) => continue,
            Ok(FrameStatus::Pending) => IngestErrorKind::DecodeStall,
            Err(e) => {
                let kind = e.kind();
                match (kind.recovery(), e) {
                    (Recovery::Terminate, DecodeError::Io { source }) => {
                        error!(error = %source, frames = sequence, "Ingestion stopped");
                        return Err(IngestError::Fatal { source });
                    }
                    (Recovery::Terminate, other) => {
                        error!(error = %other, frames = sequence, "Ingestion stopped");
                        return Err(IngestError::Fatal {
                            source: io::Error::other(other.to_string()),
                        });
                    }
                    (Recovery::LogAndRetry, other) => {
                        corrupt = corrupt.saturating_add(1);
                        warn!(error = %other, frames = sequence, "Skipping undecodable record");
                    }
                    (Recovery::RetrySilently | Recovery::Degrade, _) => {}
                }
                kind
            }
        };
        trace!(?kind, "Decoder idle");
        thread::sleep(backoff);
    }
}

/// Wait for the recording at `path`, then ingest it until a fatal error.
///
/// This is the whole ingestion side of the radar:
/// [`tail::wait_for_source`], a [`GrowingFile`] over the opened file, a
/// [`JsonLinesDecoder`] over that, and [`run_ingest`].
pub fn ingest_recording(
    path: &Path,
    projection: &MapProjection,
    publisher: &SnapshotPublisher,
    intervals: &IngestIntervals,
) -> Result<Infallible, IngestError> {
    let file = tail::wait_for_source(path, intervals.source_poll)?;
    let reader = GrowingFile::new(file, intervals.read_retry);
    let mut decoder = JsonLinesDecoder::new(reader);
    run_ingest(&mut decoder, projection, publisher, intervals)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::fs::OpenOptions;
    use std::io::Write;
    use std::sync::Arc;

    use glam::DVec3;
    use liveradar_types::{Bomb, GameState, Participant, PlayerId, Snapshot, Team};

    use super::*;
    use crate::decoder::{ScriptStep, ScriptedDecoder};
    use crate::projection::{MapTransform, Resolution};

    fn projection() -> MapProjection {
        MapProjection::new("de_test", MapTransform::IDENTITY, Resolution::new(100, 100))
    }

    fn frame(tick: u64, ids: &[i32]) -> GameState {
        GameState {
            tick,
            participants: ids
                .iter()
                .map(|&id| Participant {
                    user_id: PlayerId(id),
                    name: format!("p{id}"),
                    health: 100,
                    team: Team::CounterTerrorists,
                    connected: true,
                    alive: true,
                    position: DVec3::new(10.0, -20.0, 0.0),
                })
                .collect(),
            bomb: Some(Bomb {
                position: DVec3::new(50.0, -50.0, 0.0),
                carrier: None,
            }),
        }
    }

    #[test]
    fn decision_table() {
        assert_eq!(IngestErrorKind::SourceNotReady.recovery(), Recovery::RetrySilently);
        assert_eq!(IngestErrorKind::SourceUnreadable.recovery(), Recovery::LogAndRetry);
        assert_eq!(IngestErrorKind::DecodeStall.recovery(), Recovery::RetrySilently);
        assert_eq!(IngestErrorKind::DecodeCorruption.recovery(), Recovery::LogAndRetry);
        assert_eq!(IngestErrorKind::LookupMiss.recovery(), Recovery::Degrade);
        assert_eq!(IngestErrorKind::FatalIo.recovery(), Recovery::Terminate);
    }

    #[test]
    fn map_errors_degrade() {
        let err = MapError::Io {
            path: PathBuf::from("/radar/de_mirage.png"),
            source: io::Error::from(io::ErrorKind::NotFound),
        };
        assert_eq!(err.kind(), IngestErrorKind::LookupMiss);
        assert_eq!(err.kind().recovery(), Recovery::Degrade);
    }

    #[test]
    fn partial_progress_skips_the_backoff() {
        let mut steps: Vec<ScriptStep> = (0..200).map(|_| ScriptStep::Partial).collect();
        steps.push(ScriptStep::Frame(frame(1, &[1])));
        let mut decoder = ScriptedDecoder::new(steps);
        let publisher = SnapshotPublisher::new();
        let intervals = IngestIntervals {
            decode_backoff: Duration::from_secs(60),
            ..IngestIntervals::immediate()
        };

        let started = std::time::Instant::now();
        let err = run_ingest(&mut decoder, &projection(), &publisher, &intervals).unwrap_err();

        assert!(started.elapsed() < Duration::from_secs(30));
        assert_eq!(err.kind(), IngestErrorKind::FatalIo);
        assert_eq!(decoder.calls(), 202);
        assert_eq!(publisher.read().tick, 1);
    }

    #[cfg(unix)]
    #[test]
    fn unopenable_recording_stops_ingestion() {
        let dir = tempfile::tempdir().unwrap();
        let publisher = SnapshotPublisher::new();
        let err = ingest_recording(
            dir.path(),
            &projection(),
            &publisher,
            &IngestIntervals::immediate(),
        )
        .unwrap_err();
        assert!(matches!(err, IngestError::Unopenable { .. }));
        assert_eq!(err.kind(), IngestErrorKind::FatalIo);
        assert_eq!(publisher.published_count(), 0);
    }

    #[test]
    fn stalls_and_corruption_are_survived() {
        let mut decoder = ScriptedDecoder::new(vec![
            ScriptStep::Pending,
            ScriptStep::Frame(frame(1, &[2, 1])),
            ScriptStep::Malformed,
            ScriptStep::Pending,
            ScriptStep::Frame(frame(2, &[3])),
            ScriptStep::Fail("handle closed".to_owned()),
            ScriptStep::Frame(frame(3, &[4])),
        ]);
        let publisher = SnapshotPublisher::new();

        let err = run_ingest(
            &mut decoder,
            &projection(),
            &publisher,
            &IngestIntervals::immediate(),
        )
        .unwrap_err();

        assert_eq!(err.kind(), IngestErrorKind::FatalIo);
        assert_eq!(decoder.calls(), 6);

        // The last good snapshot stays published.
        let snapshot = publisher.read();
        assert_eq!(snapshot.sequence, 2);
        assert_eq!(snapshot.tick, 2);
        assert_eq!(snapshot.players.len(), 1);
        assert_eq!(publisher.published_count(), 2);
    }

    #[test]
    fn published_snapshots_are_projected() {
        let mut decoder = ScriptedDecoder::new(vec![ScriptStep::Frame(frame(7, &[5, 3]))]);
        let publisher = SnapshotPublisher::new();
        let _ = run_ingest(
            &mut decoder,
            &projection(),
            &publisher,
            &IngestIntervals::immediate(),
        );

        let snapshot = publisher.read();
        let ids: Vec<_> = snapshot.players.iter().map(|p| p.user_id).collect();
        assert_eq!(ids, vec![PlayerId(3), PlayerId(5)]);
        assert!((snapshot.players[0].x - 10.0).abs() < 1e-9);
        assert!((snapshot.players[0].y - 20.0).abs() < 1e-9);
        let bomb = snapshot.bomb.unwrap();
        assert!((bomb.x - 50.0).abs() < 1e-9);
        assert!((bomb.y - 50.0).abs() < 1e-9);
    }

    fn wait_for(publisher: &SnapshotPublisher, sequence: u64) -> Arc<Snapshot> {
        for _ in 0..5_000 {
            let snapshot = publisher.read();
            if snapshot.sequence >= sequence {
                return snapshot;
            }
            thread::sleep(Duration::from_millis(1));
        }
        publisher.read()
    }

    #[test]
    fn ingests_a_recording_written_concurrently() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("match.jsonl");
        let publisher = Arc::new(SnapshotPublisher::new());

        {
            let publisher = Arc::clone(&publisher);
            let path = path.clone();
            // Detached: the loop never returns while the file stays valid.
            thread::spawn(move || {
                let _ = ingest_recording(
                    &path,
                    &projection(),
                    &publisher,
                    &IngestIntervals::immediate(),
                );
            });
        }

        // Nothing exists yet: the initial snapshot is served.
        thread::sleep(Duration::from_millis(5));
        assert_eq!(*publisher.read(), Snapshot::empty());

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .unwrap();
        let first = serde_json::to_string(&frame(1, &[1])).unwrap();
        let second = serde_json::to_string(&frame(2, &[1, 2])).unwrap();

        // The first record arrives in two pieces.
        let (head, tail) = first.split_at(first.len() / 2);
        file.write_all(head.as_bytes()).unwrap();
        file.flush().unwrap();
        thread::sleep(Duration::from_millis(5));
        assert_eq!(publisher.read().sequence, 0);
        writeln!(file, "{tail}").unwrap();
        file.flush().unwrap();

        let snapshot = wait_for(&publisher, 1);
        assert_eq!(snapshot.tick, 1);

        writeln!(file, "garbage").unwrap();
        writeln!(file, "{second}").unwrap();
        file.flush().unwrap();

        let snapshot = wait_for(&publisher, 2);
        assert_eq!(snapshot.tick, 2);
        assert_eq!(snapshot.players.len(), 2);
    }
}
