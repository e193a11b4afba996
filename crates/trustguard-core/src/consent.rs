// ── Consent gate ──
//
// The platform must authorize tunnel creation once before the first
// connect. When consent is missing the request is parked in a pending
// table and resumed later through a single entry point, outside the
// controller's worker so the command queue never blocks on a prompt.

use std::fmt;
use std::sync::Arc;

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use crate::controller::SessionController;
use crate::error::CoreError;
use crate::model::TunnelConfiguration;

/// Identifies one parked connect request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResumeToken(Uuid);

impl ResumeToken {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for ResumeToken {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ResumeToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl From<Uuid> for ResumeToken {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ConsentDecision {
    Granted,
    Denied,
}

/// How a provider answered a prompt request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsentPrompt {
    /// The user answered synchronously (terminal prompt, `--yes`, ...).
    Immediate(ConsentDecision),
    /// The answer arrives later through [`ConsentGate::resume`].
    Deferred,
}

/// Result of [`ConsentGate::ensure`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateOutcome {
    /// Consent held; `start` was submitted.
    Granted,
    /// The user refused; nothing was submitted.
    Denied,
    /// Waiting on the user. Resume with this token.
    Pending(ResumeToken),
}

/// Platform hook for the one-time tunnel authorization.
pub trait ConsentProvider: Send + Sync {
    /// Whether consent has already been granted.
    fn is_granted(&self) -> bool;

    /// Ask the user. `token` must be handed back to
    /// [`ConsentGate::resume`] when the prompt is answered later.
    fn request(&self, token: ResumeToken) -> ConsentPrompt;
}

/// Provider that always reports consent as held.
#[derive(Debug, Default, Clone, Copy)]
pub struct AlwaysGranted;

impl ConsentProvider for AlwaysGranted {
    fn is_granted(&self) -> bool {
        true
    }

    fn request(&self, _token: ResumeToken) -> ConsentPrompt {
        ConsentPrompt::Immediate(ConsentDecision::Granted)
    }
}

/// Gate in front of [`SessionController::start`].
pub struct ConsentGate {
    provider: Arc<dyn ConsentProvider>,
    controller: SessionController,
    pending: DashMap<ResumeToken, TunnelConfiguration>,
}

impl ConsentGate {
    pub fn new(provider: Arc<dyn ConsentProvider>, controller: SessionController) -> Self {
        Self {
            provider,
            controller,
            pending: DashMap::new(),
        }
    }

    /// Start the session if consent is held, otherwise ask for it.
    pub fn ensure(&self, config: TunnelConfiguration) -> GateOutcome {
        if self.provider.is_granted() {
            self.controller.start(config);
            return GateOutcome::Granted;
        }

        let token = ResumeToken::new();
        self.pending.insert(token, config);
        debug!(%token, "consent required, parking connect request");

        match self.provider.request(token) {
            ConsentPrompt::Deferred => GateOutcome::Pending(token),
            ConsentPrompt::Immediate(decision) => match self.resume(token, decision) {
                Ok(ConsentDecision::Granted) => GateOutcome::Granted,
                Ok(ConsentDecision::Denied) => GateOutcome::Denied,
                // Only reachable if the provider resumed the token itself.
                Err(_) => GateOutcome::Pending(token),
            },
        }
    }

    /// Deliver the user's answer for a parked request. A token resumes at
    /// most once.
    pub fn resume(
        &self,
        token: ResumeToken,
        decision: ConsentDecision,
    ) -> Result<ConsentDecision, CoreError> {
        let (_, config) = self
            .pending
            .remove(&token)
            .ok_or(CoreError::UnknownConsentRequest { token })?;

        match decision {
            ConsentDecision::Granted => {
                info!(%token, "consent granted");
                self.controller.start(config);
            }
            ConsentDecision::Denied => info!(%token, "consent denied"),
        }
        Ok(decision)
    }

    /// Drop a parked request without a decision.
    pub fn cancel(&self, token: ResumeToken) -> bool {
        self.pending.remove(&token).is_some()
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }
}
