//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` into user-facing errors with
//! actionable help text.

use miette::Diagnostic;
use thiserror::Error;

use trustguard_config::ConfigError;
use trustguard_core::{CoreError, ErrorKind};

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const CONSENT: i32 = 3;
    pub const BACKEND: i32 = 7;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Session ──────────────────────────────────────────────────────

    #[error("Tunnel consent was not granted")]
    #[diagnostic(
        code(trustguard::consent_denied),
        help(
            "Creating a tunnel requires a one-time authorization.\n\
             Answer the prompt, or pass --yes (-y) in non-interactive contexts."
        )
    )]
    ConsentDenied,

    #[error("No tunnel configuration available")]
    #[diagnostic(
        code(trustguard::no_tunnel_config),
        help(
            "Pass a configuration file: trustguard up wg0.conf\n\
             Or save one first: trustguard load wg0.conf"
        )
    )]
    NoTunnelConfig,

    #[error("Tunnel {operation} failed: {message}")]
    #[diagnostic(
        code(trustguard::backend),
        help(
            "Check that wireguard-tools is installed and that you have permission \
             to manage interfaces."
        )
    )]
    Backend { operation: String, message: String },

    #[error("{reason}")]
    #[diagnostic(code(trustguard::precondition))]
    Precondition { reason: String },

    #[error("Session error: {0}")]
    #[diagnostic(code(trustguard::session))]
    Session(String),

    // ── Validation ───────────────────────────────────────────────────

    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(trustguard::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────

    #[error(transparent)]
    #[diagnostic(
        code(trustguard::config),
        help("Inspect the effective settings with: trustguard config show")
    )]
    Config(#[from] ConfigError),

    // ── IO / Serialization ────────────────────────────────────────────

    #[error("Could not read {path}")]
    #[diagnostic(code(trustguard::read_file))]
    ReadFile {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Invalid JSON: {0}")]
    #[diagnostic(code(trustguard::json))]
    Json(#[from] serde_json::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConsentDenied => exit_code::CONSENT,
            Self::Backend { .. } => exit_code::BACKEND,
            Self::Validation { .. } | Self::NoTunnelConfig | Self::Precondition { .. } => {
                exit_code::USAGE
            }
            _ => exit_code::GENERAL,
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Backend { operation, message } => Self::Backend { operation, message },
            CoreError::PreconditionUnmet { reason } => Self::Precondition { reason },
            other => match other.kind() {
                ErrorKind::PreconditionUnmet => Self::Precondition {
                    reason: other.to_string(),
                },
                ErrorKind::BackendFailure | ErrorKind::Internal => Self::Session(other.to_string()),
            },
        }
    }
}
