// ── Session snapshot ──
//
// Immutable value published by the controller. Consumers never see a
// partially updated snapshot: every transition builds a new value and
// replaces the previous one wholesale.

use serde::{Deserialize, Serialize};

use super::ConnectionState;

pub const STATUS_READY: &str = "Ready";

/// Point-in-time view of the session, as seen by presentation layers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub state: ConnectionState,
    /// Configuration text currently associated with the session.
    pub config_text: String,
    pub status_message: String,
    /// A transition is in flight; UIs disable their controls.
    pub is_busy: bool,
    pub last_error: Option<String>,
}

impl Default for SessionSnapshot {
    fn default() -> Self {
        Self {
            state: ConnectionState::Disconnected,
            config_text: String::new(),
            status_message: STATUS_READY.into(),
            is_busy: false,
            last_error: None,
        }
    }
}

impl SessionSnapshot {
    pub fn with_state(mut self, state: ConnectionState) -> Self {
        self.state = state;
        self
    }

    pub fn busy(mut self, is_busy: bool) -> Self {
        self.is_busy = is_busy;
        self
    }

    pub fn with_status(mut self, message: impl Into<String>) -> Self {
        self.status_message = message.into();
        self
    }

    pub fn with_error(mut self, error: Option<String>) -> Self {
        self.last_error = error;
        self
    }

    pub fn with_config_text(mut self, text: impl Into<String>) -> Self {
        self.config_text = text.into();
        self
    }

    pub fn has_config(&self) -> bool {
        !self.config_text.trim().is_empty()
    }
}
