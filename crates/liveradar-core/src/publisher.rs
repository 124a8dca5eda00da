//! The single slot holding the current snapshot.
//!
//! [`SnapshotPublisher`] is the only state shared between the ingestion
//! thread and the HTTP handlers. It holds:
//!
//! - the current [`Snapshot`], replaced wholesale by [`publish`] and
//!   handed out by [`read`] as an [`Arc`];
//! - the highlighted player, a separate piece of state with its own
//!   version counter.
//!
//! Both sit behind a [`RwLock`] whose critical sections only copy or swap
//! an `Arc`/small value. Readers never block each other, and a reader
//! sees either the old or the new snapshot in full. The previous snapshot
//! is dropped after the write lock is released, so freeing it never
//! delays readers.
//!
//! [`publish`]: SnapshotPublisher::publish
//! [`read`]: SnapshotPublisher::read

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use chrono::Utc;
use liveradar_types::{Highlight, PlayerId, Snapshot};

/// Holder of the current snapshot and highlight.
///
/// Share it as `Arc<SnapshotPublisher>`. Only the ingestion loop should
/// call [`publish`](Self::publish); any number of tasks may
/// [`read`](Self::read).
#[derive(Debug)]
pub struct SnapshotPublisher {
    current: RwLock<Arc<Snapshot>>,
    highlight: RwLock<Highlight>,
    published: AtomicU64,
}

impl SnapshotPublisher {
    /// Create a publisher holding [`Snapshot::empty`].
    pub fn new() -> Self {
        Self {
            current: RwLock::new(Arc::new(Snapshot::empty())),
            highlight: RwLock::new(Highlight::default()),
            published: AtomicU64::new(0),
        }
    }

    /// Replace the current snapshot.
    ///
    /// The snapshot is stamped with the publication time before it
    /// becomes visible, and is never modified afterwards.
    pub fn publish(&self, mut snapshot: Snapshot) {
        snapshot.published_at = Some(Utc::now());
        let next = Arc::new(snapshot);
        let previous = {
            let mut slot = self.current.write().unwrap_or_else(PoisonError::into_inner);
            std::mem::replace(&mut *slot, next)
        };
        self.published.fetch_add(1, Ordering::Release);
        drop(previous);
    }

    /// The current snapshot.
    ///
    /// The returned handle stays valid and unchanged for as long as the
    /// caller holds it, even if newer snapshots are published meanwhile.
    pub fn read(&self) -> Arc<Snapshot> {
        let slot = self.current.read().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&slot)
    }

    /// Number of snapshots published so far.
    pub fn published_count(&self) -> u64 {
        self.published.load(Ordering::Acquire)
    }

    /// The current highlight.
    pub fn highlight(&self) -> Highlight {
        *self.highlight.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Set (or clear, with `None`) the highlighted player.
    ///
    /// Every call bumps the version, including re-selecting the same
    /// player. Returns the new highlight.
    pub fn set_highlight(&self, user_id: Option<PlayerId>) -> Highlight {
        let mut slot = self.highlight.write().unwrap_or_else(PoisonError::into_inner);
        *slot = Highlight {
            user_id,
            version: slot.version.saturating_add(1),
        };
        *slot
    }
}

impl Default for SnapshotPublisher {
    fn default() -> Self {
        Self::new()
    }
}
