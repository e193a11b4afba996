// ── Peer statistics ──
//
// `PeerStats` is the raw sample reported by the tunnel backend.
// `PeerStatistics` is what the poller publishes to observers.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::format::{fmt_bytes, fmt_hms};

/// Raw per-peer counters as reported by the tunnel backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeerStats {
    pub rx_bytes: u64,
    pub tx_bytes: u64,
    /// Unix epoch millis of the latest handshake; `0` if none yet.
    pub latest_handshake_epoch_millis: i64,
    /// Backend-specific peer identifier (public key for WireGuard).
    pub peer_id: String,
}

/// Live link statistics for the connected peer.
///
/// Only valid while the session is `Connected`; the store clears it on
/// every transition away from that state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeerStatistics {
    pub rx_bytes: u64,
    pub tx_bytes: u64,
    /// Time since the latest handshake, `None` if no handshake has happened.
    pub last_handshake_ago: Option<Duration>,
    pub endpoint: String,
    pub peer_id: String,
    pub sampled_at: DateTime<Utc>,
}

impl PeerStatistics {
    /// Build statistics from a backend sample taken at `now`.
    ///
    /// A handshake timestamp in the future (clock skew) counts as zero.
    pub fn from_sample(sample: PeerStats, endpoint: &str, now: DateTime<Utc>) -> Self {
        let last_handshake_ago = (sample.latest_handshake_epoch_millis > 0).then(|| {
            let elapsed = now.timestamp_millis() - sample.latest_handshake_epoch_millis;
            Duration::from_millis(u64::try_from(elapsed).unwrap_or(0))
        });

        Self {
            rx_bytes: sample.rx_bytes,
            tx_bytes: sample.tx_bytes,
            last_handshake_ago,
            endpoint: endpoint.to_owned(),
            peer_id: sample.peer_id,
            sampled_at: now,
        }
    }

    pub fn rx_display(&self) -> String {
        fmt_bytes(self.rx_bytes)
    }

    pub fn tx_display(&self) -> String {
        fmt_bytes(self.tx_bytes)
    }

    pub fn handshake_display(&self) -> String {
        fmt_hms(self.last_handshake_ago)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(handshake: i64) -> PeerStats {
        PeerStats {
            rx_bytes: 1536,
            tx_bytes: 1_572_864,
            latest_handshake_epoch_millis: handshake,
            peer_id: "peer".into(),
        }
    }

    #[test]
    fn handshake_one_hour_one_minute_one_second_ago() {
        let now = Utc::now();
        let stats = PeerStatistics::from_sample(
            sample(now.timestamp_millis() - 3_661_000),
            "1.2.3.4:51820",
            now,
        );
        assert_eq!(stats.handshake_display(), "01:01:01");
        assert_eq!(stats.rx_display(), "1.50 KB");
        assert_eq!(stats.tx_display(), "1.50 MB");
        assert_eq!(stats.endpoint, "1.2.3.4:51820");
    }

    #[test]
    fn zero_handshake_means_none() {
        let stats = PeerStatistics::from_sample(sample(0), "", Utc::now());
        assert!(stats.last_handshake_ago.is_none());
        assert_eq!(stats.handshake_display(), "--:--:--");
    }

    #[test]
    fn future_handshake_saturates_to_zero() {
        let now = Utc::now();
        let stats = PeerStatistics::from_sample(sample(now.timestamp_millis() + 5_000), "", now);
        assert_eq!(stats.last_handshake_ago, Some(Duration::ZERO));
    }
}
