// ── Tunnel backend boundary ──
//
// The cryptographic tunnel engine is a black box behind `TunnelBackend`.
// Only the controller (and the poller it owns) ever call into it.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tracing::info;

use crate::model::{PeerStats, TunnelConfiguration};

/// Errors reported by a tunnel backend.
#[derive(Debug, Error)]
pub enum BackendError {
    /// The engine refused the request (bad config, handshake timeout, ...).
    #[error("{0}")]
    Rejected(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The engine or its tooling is not present on this system.
    #[error("backend unavailable: {0}")]
    Unavailable(String),
}

/// Lifecycle of the tunnel as reported by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "UPPERCASE")]
pub enum TunnelState {
    Up,
    Down,
}

type StateListener = Arc<dyn Fn(&str, TunnelState) + Send + Sync>;

/// The identity handed to the engine: a name plus a state-change callback.
#[derive(Clone)]
pub struct TunnelIdentity {
    name: String,
    listener: Option<StateListener>,
}

impl TunnelIdentity {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            listener: None,
        }
    }

    /// Attach a listener notified on every engine-reported state change.
    pub fn with_listener(
        mut self,
        listener: impl Fn(&str, TunnelState) + Send + Sync + 'static,
    ) -> Self {
        self.listener = Some(Arc::new(listener));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Called by backends when the engine reports a new state.
    pub fn on_state_change(&self, state: TunnelState) {
        info!(tunnel = %self.name, %state, "tunnel state changed");
        if let Some(listener) = &self.listener {
            listener(&self.name, state);
        }
    }
}

impl fmt::Debug for TunnelIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TunnelIdentity")
            .field("name", &self.name)
            .field("listener", &self.listener.is_some())
            .finish()
    }
}

/// The tunnel engine.
///
/// Calls may block on I/O for an unbounded time; implementations must not
/// block the async runtime (use `tokio::process` or `spawn_blocking`).
#[async_trait]
pub trait TunnelBackend: Send + Sync {
    /// Bring the tunnel up. Returns a short human-readable label.
    async fn bring_up(
        &self,
        tunnel: &TunnelIdentity,
        config: &TunnelConfiguration,
    ) -> Result<String, BackendError>;

    /// Tear the tunnel down. Returns a short human-readable label.
    async fn bring_down(&self, tunnel: &TunnelIdentity) -> Result<String, BackendError>;

    /// Sample the first peer's counters. `Ok(None)` when no peer data exists yet.
    async fn stats(&self, tunnel: &TunnelIdentity) -> Result<Option<PeerStats>, BackendError>;
}

/// Run a backend call on its own task so a panicking engine surfaces as
/// `Rejected` instead of unwinding through the caller.
pub(crate) async fn guarded<T, F>(operation: &str, call: F) -> Result<T, BackendError>
where
    T: Send + 'static,
    F: Future<Output = Result<T, BackendError>> + Send + 'static,
{
    match tokio::spawn(call).await {
        Ok(result) => result,
        Err(e) => Err(BackendError::Rejected(format!("{operation} aborted: {e}"))),
    }
}

/// Hook for OS-visible "keep alive while connected" indications
/// (foreground service notification, tray icon, ...).
pub trait ForegroundHook: Send + Sync {
    /// Entered `Connected`.
    fn enter(&self, endpoint: Option<&str>);
    /// Left `Connected`.
    fn leave(&self);
}

/// Default hook that does nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoForeground;

impl ForegroundHook for NoForeground {
    fn enter(&self, _endpoint: Option<&str>) {}
    fn leave(&self) {}
}
