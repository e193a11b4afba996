// ── Domain model ──
//
// Canonical types shared by the controller, store, and consumers.

mod snapshot;
mod state;
mod stats;
mod tunnel_config;

pub use snapshot::{STATUS_READY, SessionSnapshot};
pub use state::ConnectionState;
pub use stats::{PeerStatistics, PeerStats};
pub use tunnel_config::TunnelConfiguration;
