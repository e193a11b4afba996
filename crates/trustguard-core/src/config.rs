// ── Runtime session configuration ──
//
// Describes how the worker runs, never touches disk. The CLI builds a
// `SessionSettings` from `trustguard-config` and hands it in.

use std::time::Duration;

pub const DEFAULT_TUNNEL_NAME: &str = "trustguard";
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(1000);

/// Settings for a single session controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSettings {
    /// Name handed to the backend as the tunnel identity.
    pub tunnel_name: String,
    /// Fixed period of the statistics poller.
    pub poll_interval: Duration,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            tunnel_name: DEFAULT_TUNNEL_NAME.into(),
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}
