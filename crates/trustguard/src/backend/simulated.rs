// ── Simulated engine ──
//
// In-process stand-in for a real tunnel: validates the configuration
// shape, pretends to handshake, and reports steadily growing counters.

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::debug;

use trustguard_core::{
    BackendError, PeerStats, TunnelBackend, TunnelConfiguration, TunnelIdentity, TunnelState,
};

const HANDSHAKE_DELAY: Duration = Duration::from_millis(150);
const RX_BYTES_PER_MS: u64 = 37;
const TX_BYTES_PER_MS: u64 = 11;

struct Link {
    since: Instant,
    handshake_epoch_millis: i64,
    peer_id: String,
}

#[derive(Default)]
pub struct SimulatedBackend {
    link: Mutex<Option<Link>>,
}

impl SimulatedBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

fn has_section(config: &TunnelConfiguration, name: &str) -> bool {
    config
        .as_str()
        .lines()
        .any(|l| l.trim().eq_ignore_ascii_case(name))
}

fn first_public_key(config: &TunnelConfiguration) -> Option<String> {
    let mut in_peer = false;
    for line in config.as_str().lines().map(str::trim) {
        if line.starts_with('[') {
            in_peer = line.eq_ignore_ascii_case("[peer]");
        } else if in_peer {
            if let Some((key, value)) = line.split_once('=') {
                if key.trim().eq_ignore_ascii_case("publickey") {
                    return Some(value.trim().to_owned());
                }
            }
        }
    }
    None
}

#[async_trait]
impl TunnelBackend for SimulatedBackend {
    async fn bring_up(
        &self,
        tunnel: &TunnelIdentity,
        config: &TunnelConfiguration,
    ) -> Result<String, BackendError> {
        for section in ["[Interface]", "[Peer]"] {
            if !has_section(config, section) {
                return Err(BackendError::Rejected(format!(
                    "invalid configuration: missing {section} section"
                )));
            }
        }

        tokio::time::sleep(HANDSHAKE_DELAY).await;
        *self.link.lock().await = Some(Link {
            since: Instant::now(),
            handshake_epoch_millis: Utc::now().timestamp_millis(),
            peer_id: first_public_key(config).unwrap_or_else(|| "simulated-peer".into()),
        });
        debug!(tunnel = tunnel.name(), "simulated link established");
        tunnel.on_state_change(TunnelState::Up);
        Ok(TunnelState::Up.to_string())
    }

    async fn bring_down(&self, tunnel: &TunnelIdentity) -> Result<String, BackendError> {
        if self.link.lock().await.take().is_some() {
            tunnel.on_state_change(TunnelState::Down);
        }
        Ok(TunnelState::Down.to_string())
    }

    async fn stats(&self, _tunnel: &TunnelIdentity) -> Result<Option<PeerStats>, BackendError> {
        let guard = self.link.lock().await;
        let Some(link) = guard.as_ref() else {
            return Ok(None);
        };
        let elapsed_ms = u64::try_from(link.since.elapsed().as_millis()).unwrap_or(u64::MAX);
        Ok(Some(PeerStats {
            rx_bytes: elapsed_ms.saturating_mul(RX_BYTES_PER_MS),
            tx_bytes: elapsed_ms.saturating_mul(TX_BYTES_PER_MS),
            latest_handshake_epoch_millis: link.handshake_epoch_millis,
            peer_id: link.peer_id.clone(),
        }))
    }
}
