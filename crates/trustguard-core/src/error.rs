// ── Core error types ──
//
// User-facing errors from trustguard-core. Backend failures arrive as
// `BackendError` and are translated at the controller boundary; they are
// surfaced to observers through the snapshot, never as panics in the
// worker loop.

use thiserror::Error;

use crate::backend::BackendError;
use crate::consent::ResumeToken;

/// Coarse classification used for logging and exit codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum ErrorKind {
    /// The action was not attempted: missing consent, empty config,
    /// or a configuration change while a session is active.
    PreconditionUnmet,
    /// The tunnel backend reported an error.
    BackendFailure,
    /// Anything else (worker gone, persistence).
    Internal,
}

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Precondition errors ──────────────────────────────────────────
    #[error("Precondition not met: {reason}")]
    PreconditionUnmet { reason: String },

    #[error("Unknown or already resolved consent request: {token}")]
    UnknownConsentRequest { token: ResumeToken },

    // ── Backend errors (wrapped, not exposed raw) ────────────────────
    #[error("Tunnel {operation} failed: {message}")]
    Backend { operation: String, message: String },

    // ── Worker lifecycle ─────────────────────────────────────────────
    #[error("Session worker is not running")]
    WorkerStopped,

    // ── Persistence ──────────────────────────────────────────────────
    #[error("Configuration persistence failed: {message}")]
    Persistence { message: String },
}

impl CoreError {
    pub fn precondition(reason: impl Into<String>) -> Self {
        Self::PreconditionUnmet {
            reason: reason.into(),
        }
    }

    pub(crate) fn backend(operation: &str, err: &BackendError) -> Self {
        Self::Backend {
            operation: operation.into(),
            message: err.to_string(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::PreconditionUnmet { .. } | Self::UnknownConsentRequest { .. } => {
                ErrorKind::PreconditionUnmet
            }
            Self::Backend { .. } => ErrorKind::BackendFailure,
            Self::WorkerStopped | Self::Persistence { .. } => ErrorKind::Internal,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backend_error_message_keeps_detail() {
        let err = CoreError::backend("bring-up", &BackendError::Rejected("timeout".into()));
        assert_eq!(err.kind(), ErrorKind::BackendFailure);
        assert!(err.to_string().contains("timeout"));
        assert!(err.to_string().contains("bring-up"));
    }

    #[test]
    fn precondition_kind() {
        let err = CoreError::precondition("config is empty");
        assert_eq!(err.kind(), ErrorKind::PreconditionUnmet);
        assert_eq!(err.kind().to_string(), "precondition_unmet");
    }

    #[test]
    fn worker_and_persistence_are_internal() {
        let persistence = CoreError::Persistence {
            message: "read-only file system".into(),
        };
        assert_eq!(persistence.kind(), ErrorKind::Internal);
        assert_eq!(CoreError::WorkerStopped.kind(), ErrorKind::Internal);
    }
}
