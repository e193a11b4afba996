//! Terminal implementations of the session's platform hooks.

use std::io::IsTerminal;
use std::path::PathBuf;

use tracing::{info, warn};

use trustguard_config::ConsentRecord;
use trustguard_core::{
    ConsentDecision, ConsentPrompt, ConsentProvider, ForegroundHook, ResumeToken,
};

// ── Consent ─────────────────────────────────────────────────────────

/// Consent backed by a [`ConsentRecord`] in the state directory.
///
/// Missing consent is granted by `--yes`, or by answering a prompt when
/// stdin is a terminal. Otherwise the request is denied. `request` blocks
/// on the terminal, so callers on the runtime go through `spawn_blocking`.
pub struct TerminalConsent {
    state_dir: PathBuf,
    assume_yes: bool,
    interactive: bool,
}

impl TerminalConsent {
    pub fn new(state_dir: PathBuf, assume_yes: bool) -> Self {
        Self {
            state_dir,
            assume_yes,
            interactive: std::io::stdin().is_terminal(),
        }
    }

    /// Never prompt; used when stdin carries data.
    pub fn non_interactive(mut self) -> Self {
        self.interactive = false;
        self
    }

    fn ask(&self) -> bool {
        if self.assume_yes {
            return true;
        }
        if !self.interactive {
            warn!("tunnel consent required but no terminal is attached; pass --yes");
            return false;
        }
        dialoguer::Confirm::new()
            .with_prompt("Allow TrustGuard to create and manage a VPN tunnel on this machine?")
            .default(false)
            .interact()
            .unwrap_or_else(|e| {
                warn!(error = %e, "consent prompt failed");
                false
            })
    }

    fn remember(&self) {
        match ConsentRecord::grant(&self.state_dir) {
            Ok(record) => info!(granted_at = %record.granted_at, "tunnel consent recorded"),
            Err(e) => warn!(error = %e, "could not record tunnel consent"),
        }
    }
}

impl ConsentProvider for TerminalConsent {
    fn is_granted(&self) -> bool {
        ConsentRecord::is_granted(&self.state_dir)
    }

    fn request(&self, _token: ResumeToken) -> ConsentPrompt {
        if self.ask() {
            self.remember();
            ConsentPrompt::Immediate(ConsentDecision::Granted)
        } else {
            ConsentPrompt::Immediate(ConsentDecision::Denied)
        }
    }
}

// ── Foreground ──────────────────────────────────────────────────────

/// A terminal process has no notification area; record the transition
/// in the log.
#[derive(Debug, Default)]
pub struct LogForeground;

impl ForegroundHook for LogForeground {
    fn enter(&self, endpoint: Option<&str>) {
        info!(endpoint = endpoint.unwrap_or("unknown"), "VPN connected");
    }

    fn leave(&self) {
        info!("VPN disconnected");
    }
}
