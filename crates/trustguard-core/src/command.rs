// ── Command API ──
//
// Every mutation of the session flows through a `Command` sent to the
// controller's worker. The worker applies them one at a time, in
// submission order.

use tokio::sync::oneshot;

use crate::error::CoreError;
use crate::model::TunnelConfiguration;

/// A command envelope sent through the command channel.
/// The response channel is optional: fire-and-forget callers omit it.
pub(crate) struct CommandEnvelope {
    pub command: Command,
    pub response_tx: Option<oneshot::Sender<Result<CommandResult, CoreError>>>,
}

/// All operations the session worker understands.
#[derive(Debug, Clone)]
pub enum Command {
    /// Bring the tunnel up with the given configuration.
    Start { config: TunnelConfiguration },
    /// Tear the tunnel down.
    Stop,
    /// Persist a configuration and make it the session's current one.
    LoadConfig { text: String },
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Start { .. } => "start",
            Self::Stop => "stop",
            Self::LoadConfig { .. } => "load-config",
        }
    }
}

/// Result of a command that did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandResult {
    /// The command caused a transition.
    Applied,
    /// The command was a no-op in the current state (e.g. start while connected).
    Ignored,
}
