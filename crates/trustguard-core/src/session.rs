// ── Session facade ──
//
// What a presentation layer talks to: connect/disconnect buttons, a
// config loader, and the two subscriptions. Connect requests go through
// the consent gate; everything else goes straight to the controller.

use std::sync::Arc;

use tracing::debug;

use crate::consent::{ConsentDecision, ConsentGate, ConsentProvider, GateOutcome, ResumeToken};
use crate::controller::SessionController;
use crate::error::CoreError;
use crate::model::{SessionSnapshot, TunnelConfiguration};
use crate::stream::{SnapshotStream, StatsStream};

/// What [`Session::toggle`] decided to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleAction {
    Connect(GateOutcome),
    Disconnect,
}

/// UI-facing handle over a controller and its consent gate.
#[derive(Clone)]
pub struct Session {
    controller: SessionController,
    gate: Arc<ConsentGate>,
}

impl Session {
    pub fn new(controller: SessionController, consent: Arc<dyn ConsentProvider>) -> Self {
        let gate = Arc::new(ConsentGate::new(consent, controller.clone()));
        Self { controller, gate }
    }

    pub fn controller(&self) -> &SessionController {
        &self.controller
    }

    pub fn gate(&self) -> &ConsentGate {
        &self.gate
    }

    pub fn snapshot(&self) -> Arc<SessionSnapshot> {
        self.controller.snapshot()
    }

    /// Connect with the session's current configuration.
    pub fn request_connect(&self) -> Result<GateOutcome, CoreError> {
        let snapshot = self.controller.snapshot();
        if !snapshot.has_config() {
            return Err(CoreError::precondition(
                "no tunnel configuration loaded; load one first",
            ));
        }
        Ok(self
            .gate
            .ensure(TunnelConfiguration::new(snapshot.config_text.clone())))
    }

    pub fn request_disconnect(&self) {
        self.controller.stop();
    }

    /// Single-button behavior: connect unless connected, otherwise disconnect.
    pub fn toggle(&self) -> Result<ToggleAction, CoreError> {
        if self.controller.snapshot().state.is_connected() {
            debug!("toggle: disconnecting");
            self.request_disconnect();
            Ok(ToggleAction::Disconnect)
        } else {
            debug!("toggle: connecting");
            self.request_connect().map(ToggleAction::Connect)
        }
    }

    pub fn load_config(&self, text: impl Into<String>) {
        self.controller.load_config(text);
    }

    /// Answer a consent prompt that returned [`GateOutcome::Pending`].
    pub fn resume(
        &self,
        token: ResumeToken,
        decision: ConsentDecision,
    ) -> Result<ConsentDecision, CoreError> {
        self.gate.resume(token, decision)
    }

    pub fn subscribe(&self) -> SnapshotStream {
        self.controller.subscribe()
    }

    pub fn subscribe_stats(&self) -> StatsStream {
        self.controller.subscribe_stats()
    }
}
