// ── Tunnel configuration token ──
//
// The core never interprets the configuration beyond locating the peer
// endpoint for display. Parsing and validation belong to the backend.

use std::fmt;
use std::sync::Arc;

/// Opaque, immutable tunnel configuration text.
///
/// Cheap to clone. `Debug` is redacted because the text carries the
/// interface private key.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct TunnelConfiguration(Arc<str>);

impl TunnelConfiguration {
    pub fn new(text: impl Into<Arc<str>>) -> Self {
        Self(text.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }

    /// `Endpoint` of the first `[Peer]` section, if any.
    pub fn peer_endpoint(&self) -> Option<&str> {
        let mut in_peer = false;
        for line in self.0.lines() {
            let line = line.trim();
            if line.starts_with('[') {
                if in_peer {
                    return None;
                }
                in_peer = line.eq_ignore_ascii_case("[peer]");
                continue;
            }
            if !in_peer {
                continue;
            }
            let Some((key, value)) = line.split_once('=') else {
                continue;
            };
            if key.trim().eq_ignore_ascii_case("endpoint") {
                let value = value.trim();
                return (!value.is_empty()).then_some(value);
            }
        }
        None
    }
}

impl fmt::Debug for TunnelConfiguration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TunnelConfiguration(<{} bytes>)", self.0.len())
    }
}

impl From<String> for TunnelConfiguration {
    fn from(text: String) -> Self {
        Self::new(text)
    }
}

impl From<&str> for TunnelConfiguration {
    fn from(text: &str) -> Self {
        Self::new(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
[Interface]
PrivateKey = cGxhY2Vob2xkZXI=
Address = 10.0.0.2/32

[Peer]
PublicKey = cGVlcg==
Endpoint = vpn.example.net:51820
AllowedIPs = 0.0.0.0/0

[Peer]
Endpoint = second.example.net:51820
";

    #[test]
    fn endpoint_of_first_peer() {
        let cfg = TunnelConfiguration::from(SAMPLE);
        assert_eq!(cfg.peer_endpoint(), Some("vpn.example.net:51820"));
    }

    #[test]
    fn endpoint_absent_without_peer() {
        let cfg = TunnelConfiguration::from("[Interface]\nEndpoint = nope:1\n");
        assert_eq!(cfg.peer_endpoint(), None);
    }

    #[test]
    fn debug_is_redacted() {
        let cfg = TunnelConfiguration::from(SAMPLE);
        let dbg = format!("{cfg:?}");
        assert!(!dbg.contains("PrivateKey"));
    }

    #[test]
    fn whitespace_only_is_empty() {
        assert!(TunnelConfiguration::from("  \n\t").is_empty());
        assert!(!TunnelConfiguration::from(SAMPLE).is_empty());
    }
}
