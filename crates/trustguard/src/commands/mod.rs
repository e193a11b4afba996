//! Command dispatch: bridges CLI args -> session -> terminal output.

pub mod config_cmd;
pub mod load;
pub mod serve;
pub mod up;

use std::path::Path;
use std::sync::Arc;

use tracing::debug;

use trustguard_config::{FileConfigStore, Settings};
use trustguard_core::{Session, SessionController};

use crate::backend;
use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;
use crate::output;
use crate::platform::{LogForeground, TerminalConsent};

/// Everything a session-bound handler needs.
pub struct SessionContext {
    pub session: Session,
    pub config_store: Arc<FileConfigStore>,
    pub color: bool,
}

impl SessionContext {
    pub fn controller(&self) -> &SessionController {
        self.session.controller()
    }
}

/// Resolve settings with CLI overrides applied.
pub fn resolve_settings(global: &GlobalOpts) -> Result<Settings, CliError> {
    let mut settings = trustguard_config::load_settings()?;
    if let Some(kind) = global.backend {
        settings.backend = kind;
    }
    Ok(settings)
}

/// Wire the engine, persistence and platform hooks into a running session.
///
/// `interactive` is false when stdin carries requests and must never be
/// consumed by a consent prompt.
pub fn build_session(global: &GlobalOpts, interactive: bool) -> Result<SessionContext, CliError> {
    let settings = resolve_settings(global)?;
    let session_settings = settings.to_session_settings()?;
    let state_dir = settings.state_dir();
    debug!(
        backend = %settings.backend,
        state_dir = %state_dir.display(),
        tunnel = %session_settings.tunnel_name,
        "building session"
    );

    let config_store = Arc::new(FileConfigStore::new(&state_dir));
    let controller = SessionController::builder(backend::build(settings.backend, &state_dir))
        .settings(session_settings)
        .foreground(Arc::new(LogForeground))
        .config_store(Arc::clone(&config_store) as Arc<dyn trustguard_core::ConfigStore>)
        .spawn();

    let mut consent = TerminalConsent::new(state_dir, global.yes);
    if !interactive {
        consent = consent.non_interactive();
    }

    Ok(SessionContext {
        session: Session::new(controller, Arc::new(consent)),
        config_store,
        color: output::should_color(global.color),
    })
}

/// Read a tunnel configuration file.
pub fn read_config_file(path: &Path) -> Result<String, CliError> {
    std::fs::read_to_string(path).map_err(|source| CliError::ReadFile {
        path: path.display().to_string(),
        source,
    })
}

/// Dispatch a session-bound command to the appropriate handler.
pub async fn dispatch(cmd: Command, global: &GlobalOpts) -> Result<(), CliError> {
    match cmd {
        Command::Up(args) => up::handle(args, global).await,
        Command::Load(args) => load::handle(args, global).await,
        Command::Serve(args) => serve::handle(args, global).await,
        // Config and Completions are handled before dispatch
        Command::Config(_) | Command::Completions(_) => Ok(()),
    }
}
