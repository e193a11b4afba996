// ── Session controller ──
//
// Owns the tunnel lifecycle. Callers submit commands from any thread;
// a single worker task applies them in order, drives the backend, runs
// the statistics poller, and is the only writer of the session snapshot.

use std::sync::Arc;

use tokio::sync::{Mutex, mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::backend::{ForegroundHook, NoForeground, TunnelBackend, TunnelIdentity, guarded};
use crate::command::{Command, CommandEnvelope, CommandResult};
use crate::config::SessionSettings;
use crate::error::CoreError;
use crate::model::{ConnectionState, PeerStatistics, SessionSnapshot, TunnelConfiguration};
use crate::persistence::ConfigStore;
use crate::poller::{PollerHandle, start_polling};
use crate::store::SessionStore;
use crate::stream::{SnapshotStream, StatsStream};

pub const STATUS_CONNECTING: &str = "Connecting";
pub const STATUS_DISCONNECTING: &str = "Disconnecting";
pub const STATUS_DISCONNECTED: &str = "Disconnected";
pub const STATUS_CONNECTION_FAILED: &str = "Connection failed";
pub const STATUS_CONFIG_LOADED: &str = "Config loaded successfully";
pub const STATUS_CONFIG_EMPTY: &str = "Config is empty";

// ── Builder ──────────────────────────────────────────────────────

/// Assembles a [`SessionController`]. Only the backend is mandatory.
pub struct ControllerBuilder {
    backend: Arc<dyn TunnelBackend>,
    settings: SessionSettings,
    store: Option<Arc<SessionStore>>,
    tunnel: Option<TunnelIdentity>,
    foreground: Arc<dyn ForegroundHook>,
    config_store: Option<Arc<dyn ConfigStore>>,
}

impl ControllerBuilder {
    pub fn settings(mut self, settings: SessionSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Share an existing store instead of creating a fresh one.
    pub fn store(mut self, store: Arc<SessionStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Override the identity handed to the backend (defaults to the
    /// configured tunnel name with no listener).
    pub fn tunnel(mut self, tunnel: TunnelIdentity) -> Self {
        self.tunnel = Some(tunnel);
        self
    }

    pub fn foreground(mut self, hook: Arc<dyn ForegroundHook>) -> Self {
        self.foreground = hook;
        self
    }

    /// Persist loaded configurations and restore the last one on startup.
    pub fn config_store(mut self, store: Arc<dyn ConfigStore>) -> Self {
        self.config_store = Some(store);
        self
    }

    /// Spawn the worker task. Must be called inside a tokio runtime.
    pub fn spawn(self) -> SessionController {
        let store = self.store.unwrap_or_default();
        let tunnel = self
            .tunnel
            .unwrap_or_else(|| TunnelIdentity::new(self.settings.tunnel_name.clone()));
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let cancel = CancellationToken::new();

        let worker = Worker {
            backend: self.backend,
            tunnel,
            settings: self.settings.clone(),
            store: Arc::clone(&store),
            foreground: self.foreground,
            config_store: self.config_store,
            cancel: cancel.clone(),
            active: None,
            poller: None,
        };
        let handle = tokio::spawn(worker.run(command_rx));

        SessionController {
            inner: Arc::new(ControllerInner {
                settings: self.settings,
                store,
                command_tx,
                cancel,
                worker: Mutex::new(Some(handle)),
            }),
        }
    }
}

// ── SessionController ────────────────────────────────────────────

/// Handle to the session worker.
///
/// Cheaply cloneable via `Arc<ControllerInner>`; every clone talks to the
/// same worker and observes the same store.
#[derive(Clone)]
pub struct SessionController {
    inner: Arc<ControllerInner>,
}

struct ControllerInner {
    settings: SessionSettings,
    store: Arc<SessionStore>,
    command_tx: mpsc::UnboundedSender<CommandEnvelope>,
    cancel: CancellationToken,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl SessionController {
    pub fn builder(backend: Arc<dyn TunnelBackend>) -> ControllerBuilder {
        ControllerBuilder {
            backend,
            settings: SessionSettings::default(),
            store: None,
            tunnel: None,
            foreground: Arc::new(NoForeground),
            config_store: None,
        }
    }

    /// Spawn with defaults for everything but the backend.
    pub fn spawn(backend: Arc<dyn TunnelBackend>) -> Self {
        Self::builder(backend).spawn()
    }

    pub fn settings(&self) -> &SessionSettings {
        &self.inner.settings
    }

    pub fn store(&self) -> &Arc<SessionStore> {
        &self.inner.store
    }

    // ── Fire-and-forget commands ─────────────────────────────────

    /// Request a connection. Returns immediately; the outcome is observed
    /// through the snapshot stream.
    pub fn start(&self, config: impl Into<TunnelConfiguration>) {
        self.submit_logged(Command::Start {
            config: config.into(),
        });
    }

    /// Request a disconnect. Returns immediately.
    pub fn stop(&self) {
        self.submit_logged(Command::Stop);
    }

    /// Request that `text` becomes (and is persisted as) the current
    /// configuration. Returns immediately.
    pub fn load_config(&self, text: impl Into<String>) {
        self.submit_logged(Command::LoadConfig { text: text.into() });
    }

    /// Queue a command without waiting for its outcome.
    pub fn submit(&self, command: Command) -> Result<(), CoreError> {
        self.inner
            .command_tx
            .send(CommandEnvelope {
                command,
                response_tx: None,
            })
            .map_err(|_| CoreError::WorkerStopped)
    }

    fn submit_logged(&self, command: Command) {
        let name = command.name();
        if let Err(e) = self.submit(command) {
            warn!(command = name, error = %e, "command dropped");
        }
    }

    // ── Command execution ────────────────────────────────────────

    /// Queue a command and wait for the worker to apply it.
    ///
    /// Commands submitted earlier are applied first, so awaiting this
    /// also waits for them.
    pub async fn execute(&self, command: Command) -> Result<CommandResult, CoreError> {
        let (tx, rx) = oneshot::channel();
        self.inner
            .command_tx
            .send(CommandEnvelope {
                command,
                response_tx: Some(tx),
            })
            .map_err(|_| CoreError::WorkerStopped)?;

        rx.await.map_err(|_| CoreError::WorkerStopped)?
    }

    // ── Lifecycle ────────────────────────────────────────────────

    /// Tear the tunnel down if needed, stop the worker, and join it.
    /// Commands still queued are dropped. Idempotent.
    pub async fn shutdown(&self) {
        self.inner.cancel.cancel();
        let handle = self.inner.worker.lock().await.take();
        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                error!(error = %e, "session worker ended abnormally");
            }
        }
    }

    pub fn is_running(&self) -> bool {
        !self.inner.cancel.is_cancelled() && !self.inner.command_tx.is_closed()
    }

    // ── State observation ────────────────────────────────────────

    pub fn snapshot(&self) -> Arc<SessionSnapshot> {
        self.inner.store.snapshot()
    }

    pub fn stats(&self) -> Option<Arc<PeerStatistics>> {
        self.inner.store.stats()
    }

    pub fn subscribe(&self) -> SnapshotStream {
        self.inner.store.subscribe()
    }

    pub fn subscribe_stats(&self) -> StatsStream {
        self.inner.store.subscribe_stats()
    }
}

// ── Worker ───────────────────────────────────────────────────────

/// State owned exclusively by the worker task.
struct Worker {
    backend: Arc<dyn TunnelBackend>,
    tunnel: TunnelIdentity,
    settings: SessionSettings,
    store: Arc<SessionStore>,
    foreground: Arc<dyn ForegroundHook>,
    config_store: Option<Arc<dyn ConfigStore>>,
    cancel: CancellationToken,
    /// Configuration of the running (or starting) tunnel.
    active: Option<TunnelConfiguration>,
    poller: Option<PollerHandle>,
}

impl Worker {
    async fn run(mut self, mut rx: mpsc::UnboundedReceiver<CommandEnvelope>) {
        debug!(tunnel = self.tunnel.name(), "session worker started");
        self.restore_config().await;

        loop {
            tokio::select! {
                biased;
                () = self.cancel.cancelled() => break,
                envelope = rx.recv() => {
                    let Some(envelope) = envelope else { break };
                    let name = envelope.command.name();
                    let result = self.apply(envelope.command).await;
                    if let Err(e) = &result {
                        debug!(command = name, error = %e, "command not applied");
                    }
                    if let Some(tx) = envelope.response_tx {
                        let _ = tx.send(result);
                    }
                }
            }
        }

        if self.store.snapshot().state != ConnectionState::Disconnected {
            info!("tearing down tunnel on shutdown");
            let _ = self.stop().await;
        }
        debug!(tunnel = self.tunnel.name(), "session worker stopped");
    }

    async fn apply(&mut self, command: Command) -> Result<CommandResult, CoreError> {
        match command {
            Command::Start { config } => self.start(config).await,
            Command::Stop => self.stop().await,
            Command::LoadConfig { text } => self.load_config(text).await,
        }
    }

    fn publish(&self, f: impl FnOnce(SessionSnapshot) -> SessionSnapshot) {
        let current = self.store.snapshot().as_ref().clone();
        self.store.publish(f(current));
    }

    // ── Start ────────────────────────────────────────────────────

    async fn start(&mut self, config: TunnelConfiguration) -> Result<CommandResult, CoreError> {
        if config.is_empty() {
            return Err(CoreError::precondition("tunnel configuration is empty"));
        }

        let state = self.store.snapshot().state.clone();
        if state.is_active() {
            if self.active.as_ref() == Some(&config) {
                debug!(%state, "start ignored: session already active");
                return Ok(CommandResult::Ignored);
            }
            warn!(%state, "start rejected: configuration differs from the active session");
            return Err(CoreError::precondition(
                "a session is already active with a different configuration; disconnect first",
            ));
        }

        info!(tunnel = self.tunnel.name(), "bringing tunnel up");
        self.active = Some(config.clone());
        self.publish(|s| {
            s.with_state(ConnectionState::Connecting)
                .busy(true)
                .with_error(None)
                .with_config_text(config.as_str())
                .with_status(STATUS_CONNECTING)
        });

        let endpoint = config.peer_endpoint().map(str::to_owned);
        let backend = Arc::clone(&self.backend);
        let tunnel = self.tunnel.clone();
        let result = guarded("bring-up", async move {
            backend.bring_up(&tunnel, &config).await
        })
        .await;

        match result {
            Ok(label) => {
                self.publish(|s| {
                    s.with_state(ConnectionState::Connected)
                        .busy(false)
                        .with_status(label)
                });
                self.foreground.enter(endpoint.as_deref());
                self.launch_poller(endpoint.unwrap_or_default()).await;
                info!(tunnel = self.tunnel.name(), "tunnel connected");
                Ok(CommandResult::Applied)
            }
            Err(e) => {
                error!(tunnel = self.tunnel.name(), error = %e, "bring-up failed");
                self.active = None;
                let reason = e.to_string();
                self.publish(|s| {
                    s.with_state(ConnectionState::Failed(reason.clone()))
                        .busy(false)
                        .with_status(STATUS_CONNECTION_FAILED)
                        .with_error(Some(reason))
                });
                Err(CoreError::backend("bring-up", &e))
            }
        }
    }

    async fn launch_poller(&mut self, endpoint: String) {
        if let Some(stale) = self.poller.take() {
            stale.stop().await;
        }
        self.poller = Some(start_polling(
            Arc::clone(&self.backend),
            self.tunnel.clone(),
            Arc::clone(&self.store),
            endpoint,
            self.settings.poll_interval,
            self.cancel.child_token(),
        ));
    }

    // ── Stop ─────────────────────────────────────────────────────

    async fn stop(&mut self) -> Result<CommandResult, CoreError> {
        let state = self.store.snapshot().state.clone();
        if state == ConnectionState::Disconnected {
            debug!("stop ignored: already disconnected");
            return Ok(CommandResult::Ignored);
        }

        info!(tunnel = self.tunnel.name(), %state, "tearing tunnel down");
        if let Some(poller) = &self.poller {
            poller.cancel();
        }
        self.publish(|s| {
            s.with_state(ConnectionState::Disconnecting)
                .busy(true)
                .with_status(STATUS_DISCONNECTING)
        });

        if let Some(poller) = self.poller.take() {
            poller.stop().await;
        }
        self.store.clear_stats();

        let backend = Arc::clone(&self.backend);
        let tunnel = self.tunnel.clone();
        let result = guarded("tear-down", async move { backend.bring_down(&tunnel).await }).await;

        if state.is_connected() {
            self.foreground.leave();
        }
        self.active = None;

        match result {
            Ok(label) => {
                self.publish(|s| {
                    s.with_state(ConnectionState::Disconnected)
                        .busy(false)
                        .with_status(label)
                        .with_error(None)
                });
                info!(tunnel = self.tunnel.name(), "tunnel disconnected");
                Ok(CommandResult::Applied)
            }
            Err(e) => {
                warn!(tunnel = self.tunnel.name(), error = %e, "tear-down failed");
                self.publish(|s| {
                    s.with_state(ConnectionState::Disconnected)
                        .busy(false)
                        .with_status(STATUS_DISCONNECTED)
                        .with_error(Some(e.to_string()))
                });
                Err(CoreError::backend("tear-down", &e))
            }
        }
    }

    // ── Configuration ────────────────────────────────────────────

    async fn load_config(&mut self, text: String) -> Result<CommandResult, CoreError> {
        if text.trim().is_empty() {
            self.publish(|s| s.with_status(STATUS_CONFIG_EMPTY));
            return Ok(CommandResult::Ignored);
        }

        if let Some(store) = &self.config_store {
            if let Err(e) = store.save(&text).await {
                warn!(error = %e, "failed to persist configuration");
                let message = format!("Error: {e}");
                self.publish(|s| s.with_error(Some(message)));
                return Err(e);
            }
        }

        debug!(bytes = text.len(), "configuration loaded");
        self.publish(|s| {
            s.with_config_text(text)
                .with_status(STATUS_CONFIG_LOADED)
                .with_error(None)
        });
        Ok(CommandResult::Applied)
    }

    async fn restore_config(&mut self) {
        let Some(store) = &self.config_store else {
            return;
        };
        match store.load().await {
            Ok(Some(text)) if !text.trim().is_empty() => {
                debug!(bytes = text.len(), "restored persisted configuration");
                self.publish(|s| s.with_config_text(text));
            }
            Ok(_) => debug!("no persisted configuration"),
            Err(e) => warn!(error = %e, "failed to restore persisted configuration"),
        }
    }
}
