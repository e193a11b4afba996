// ── Connection state ──

use serde::{Deserialize, Serialize};

/// Connection state observable by consumers.
///
/// Exactly one instance is live per session; only the controller's
/// worker moves it between variants.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, strum::AsRefStr)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connecting,
    Connected,
    Disconnecting,
    Failed(String),
}

impl ConnectionState {
    pub fn is_connected(&self) -> bool {
        matches!(self, Self::Connected)
    }

    /// `Connecting` or `Connected`: a start request would launch a second tunnel.
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Connecting | Self::Connected)
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed(_))
    }

    /// Short label for display (`"connected"`, `"failed"`, ...).
    pub fn label(&self) -> &str {
        self.as_ref()
    }
}

impl std::fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Failed(reason) => write!(f, "failed: {reason}"),
            other => f.write_str(other.label()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn active_states() {
        assert!(ConnectionState::Connecting.is_active());
        assert!(ConnectionState::Connected.is_active());
        assert!(!ConnectionState::Disconnecting.is_active());
        assert!(!ConnectionState::Failed("x".into()).is_active());
    }

    #[test]
    fn labels_and_display() {
        assert_eq!(ConnectionState::Disconnected.label(), "disconnected");
        assert_eq!(ConnectionState::Failed("timeout".into()).label(), "failed");
        assert_eq!(
            ConnectionState::Failed("timeout".into()).to_string(),
            "failed: timeout"
        );
    }
}
