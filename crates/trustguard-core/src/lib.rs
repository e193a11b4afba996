// trustguard-core: Session control plane for a single encrypted tunnel.
//
// A worker-owned state machine drives an opaque tunnel backend, publishes
// immutable snapshots through a reactive store, and samples peer
// statistics while connected.

pub mod backend;
pub mod command;
pub mod config;
pub mod consent;
pub mod controller;
pub mod error;
pub mod format;
pub mod intent;
pub mod model;
pub mod persistence;
pub mod poller;
pub mod session;
pub mod store;
pub mod stream;

// ── Primary re-exports ──────────────────────────────────────────────
pub use backend::{
    BackendError, ForegroundHook, NoForeground, TunnelBackend, TunnelIdentity, TunnelState,
};
pub use command::{Command, CommandResult};
pub use config::SessionSettings;
pub use consent::{
    AlwaysGranted, ConsentDecision, ConsentGate, ConsentPrompt, ConsentProvider, GateOutcome,
    ResumeToken,
};
pub use controller::{ControllerBuilder, SessionController};
pub use error::{CoreError, ErrorKind};
pub use intent::{IntentOutcome, ServiceAction, ServiceIntent, handle_intent};
pub use persistence::{ConfigStore, MemoryConfigStore};
pub use poller::{PollerHandle, start_polling};
pub use session::{Session, ToggleAction};
pub use store::SessionStore;
pub use stream::{SnapshotStream, StatsStream, StoreStream};

pub use model::{
    ConnectionState, PeerStatistics, PeerStats, STATUS_READY, SessionSnapshot,
    TunnelConfiguration,
};
