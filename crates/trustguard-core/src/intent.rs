// ── Process-boundary intents ──
//
// External start/stop requests (service manager, another process, the
// `serve` loop). A START with no action at all is how a supervisor
// restarts a sticky service, so a missing action means START.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::consent::GateOutcome;
use crate::model::TunnelConfiguration;
use crate::session::Session;

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display, strum::EnumString)]
#[strum(serialize_all = "UPPERCASE")]
pub enum ServiceAction {
    Start,
    Stop,
}

/// One request as received on the wire.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceIntent {
    #[serde(default)]
    pub action: Option<String>,
    #[serde(default)]
    pub config: Option<String>,
}

impl ServiceIntent {
    pub fn start(config: impl Into<String>) -> Self {
        Self {
            action: Some(ServiceAction::Start.to_string()),
            config: Some(config.into()),
        }
    }

    pub fn stop() -> Self {
        Self {
            action: Some(ServiceAction::Stop.to_string()),
            config: None,
        }
    }
}

/// What [`handle_intent`] did with a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IntentOutcome {
    Started(GateOutcome),
    Stopped,
    /// Dropped with a logged reason.
    Ignored(String),
}

/// Route one intent to the session.
pub fn handle_intent(session: &Session, intent: ServiceIntent) -> IntentOutcome {
    let action = match intent.action.as_deref() {
        None => ServiceAction::Start,
        Some(raw) => match ServiceAction::from_str(raw) {
            Ok(action) => action,
            Err(_) => {
                warn!(action = raw, "ignoring intent with unknown action");
                return IntentOutcome::Ignored(format!("unknown action {raw:?}"));
            }
        },
    };
    debug!(%action, "handling intent");

    match action {
        ServiceAction::Start => {
            let config = intent
                .config
                .map(TunnelConfiguration::from)
                .filter(|c| !c.is_empty());
            let Some(config) = config else {
                warn!("START intent without a configuration, ignoring");
                return IntentOutcome::Ignored("START without configuration".into());
            };
            IntentOutcome::Started(session.gate().ensure(config))
        }
        ServiceAction::Stop => {
            session.request_disconnect();
            IntentOutcome::Stopped
        }
    }
}
