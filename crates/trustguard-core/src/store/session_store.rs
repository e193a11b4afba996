// ── Shared session store ──
//
// Single source of truth for the session. Two independent `watch`
// channels: the connection snapshot (written only by the controller's
// worker) and the peer statistics (written only by the poller, cleared
// by the worker).

use std::sync::Arc;

use tokio::sync::watch;
use tracing::trace;

use crate::model::{PeerStatistics, SessionSnapshot};
use crate::stream::{SnapshotStream, StatsStream};

/// Reactive store for the session snapshot and live statistics.
///
/// Writes replace the whole value (last write wins). Readers receive the
/// current value on subscribe, then every subsequent one. Hand out
/// `Arc<SessionStore>` clones; there is no global instance.
pub struct SessionStore {
    snapshot: watch::Sender<Arc<SessionSnapshot>>,
    stats: watch::Sender<Option<Arc<PeerStatistics>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        let (snapshot, _) = watch::channel(Arc::new(SessionSnapshot::default()));
        let (stats, _) = watch::channel(None);
        Self { snapshot, stats }
    }

    // ── Snapshot channel ─────────────────────────────────────────────

    /// Replace the current snapshot.
    pub fn publish(&self, snapshot: SessionSnapshot) {
        trace!(state = %snapshot.state, busy = snapshot.is_busy, "publishing snapshot");
        // `send_replace` updates unconditionally, even with zero receivers.
        self.snapshot.send_replace(Arc::new(snapshot));
    }

    /// The current snapshot (cheap `Arc` clone).
    pub fn snapshot(&self) -> Arc<SessionSnapshot> {
        self.snapshot.borrow().clone()
    }

    pub fn subscribe(&self) -> SnapshotStream {
        SnapshotStream::new(self.snapshot.subscribe())
    }

    // ── Statistics channel ───────────────────────────────────────────

    pub fn publish_stats(&self, stats: PeerStatistics) {
        self.stats.send_replace(Some(Arc::new(stats)));
    }

    /// Mark statistics invalid. Readers see `None`.
    pub fn clear_stats(&self) {
        self.stats.send_if_modified(|current| current.take().is_some());
    }

    pub fn stats(&self) -> Option<Arc<PeerStatistics>> {
        self.stats.borrow().clone()
    }

    pub fn subscribe_stats(&self) -> StatsStream {
        StatsStream::new(self.stats.subscribe())
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}
