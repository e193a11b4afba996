// ── Statistics poller ──
//
// Periodic, cooperatively cancelled sampling of the backend while the
// tunnel is up. Owned by the controller's worker: started on the
// transition to Connected, stopped (cancelled + joined) before any
// transition away from it.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};

use crate::backend::{TunnelBackend, TunnelIdentity, guarded};
use crate::model::PeerStatistics;
use crate::store::SessionStore;

/// Handle to a running poller task.
pub struct PollerHandle {
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl PollerHandle {
    /// Signal cancellation. Takes effect at the next tick boundary; a
    /// sample already in flight finishes but is not published.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Cancel and wait for the task to exit. After this returns the
    /// poller will never write to the store again.
    pub async fn stop(self) {
        self.cancel.cancel();
        if let Err(e) = self.task.await {
            warn!(error = %e, "statistics poller task ended abnormally");
        }
    }
}

/// Spawn a poller sampling `backend` every `period`.
///
/// `cancel` is usually a child of the controller's token so that worker
/// shutdown also stops polling. The first sample is taken immediately.
pub fn start_polling(
    backend: Arc<dyn TunnelBackend>,
    tunnel: TunnelIdentity,
    store: Arc<SessionStore>,
    endpoint: String,
    period: Duration,
    cancel: CancellationToken,
) -> PollerHandle {
    let task = tokio::spawn(poll_task(
        backend,
        tunnel,
        store,
        endpoint,
        period,
        cancel.clone(),
    ));
    PollerHandle { cancel, task }
}

async fn poll_task(
    backend: Arc<dyn TunnelBackend>,
    tunnel: TunnelIdentity,
    store: Arc<SessionStore>,
    endpoint: String,
    period: Duration,
    cancel: CancellationToken,
) {
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    debug!(tunnel = tunnel.name(), ?period, "statistics poller started");

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            _ = interval.tick() => {
                let sampler = Arc::clone(&backend);
                let id = tunnel.clone();
                match guarded("sample", async move { sampler.stats(&id).await }).await {
                    Ok(Some(sample)) => {
                        // Stop may have been requested while sampling.
                        if cancel.is_cancelled() {
                            trace!("discarding sample taken during cancellation");
                            break;
                        }
                        let stats = PeerStatistics::from_sample(sample, &endpoint, Utc::now());
                        store.publish_stats(stats);
                    }
                    Ok(None) => trace!("no peer data yet"),
                    Err(e) => warn!(error = %e, "failed to read tunnel statistics"),
                }
            }
        }
    }

    debug!(tunnel = tunnel.name(), "statistics poller stopped");
}
