//! Shared configuration for the TrustGuard binary.
//!
//! Layered settings (defaults, `config.toml`, `TRUSTGUARD_*` env vars),
//! translation to `trustguard_core::SessionSettings`, on-disk persistence
//! of the tunnel configuration, and the one-time consent record.

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tracing::debug;

use trustguard_core::{ConfigStore, CoreError, SessionSettings};

pub const ENV_PREFIX: &str = "TRUSTGUARD_";
pub const TUNNEL_FILE: &str = "tunnel.conf";
pub const CONSENT_FILE: &str = "consent.toml";

/// Interface names are limited to IFNAMSIZ - 1 bytes.
const MAX_TUNNEL_NAME_LEN: usize = 15;

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── Settings ────────────────────────────────────────────────────────

/// Which tunnel engine drives the session.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Deserialize,
    Serialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum BackendKind {
    /// `wg-quick` / `wg` from wireguard-tools.
    #[default]
    WgQuick,
    /// In-process engine with synthetic traffic, for demos and tests.
    Simulated,
}

/// Top-level TOML settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Settings {
    /// Interface name handed to the engine.
    #[serde(default = "default_tunnel_name")]
    pub tunnel_name: String,

    /// Statistics sampling period.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    #[serde(default)]
    pub backend: BackendKind,

    /// Where the tunnel configuration and consent record live.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state_dir: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            tunnel_name: default_tunnel_name(),
            poll_interval_ms: default_poll_interval_ms(),
            backend: BackendKind::default(),
            state_dir: None,
        }
    }
}

fn default_tunnel_name() -> String {
    trustguard_core::config::DEFAULT_TUNNEL_NAME.into()
}

fn default_poll_interval_ms() -> u64 {
    1000
}

impl Settings {
    /// Resolved state directory: the explicit override, else the platform
    /// data directory.
    pub fn state_dir(&self) -> PathBuf {
        self.state_dir.clone().unwrap_or_else(default_state_dir)
    }

    /// Validate and convert into the core's runtime settings.
    pub fn to_session_settings(&self) -> Result<SessionSettings, ConfigError> {
        validate_tunnel_name(&self.tunnel_name)?;
        if self.poll_interval_ms == 0 {
            return Err(ConfigError::Validation {
                field: "poll_interval_ms".into(),
                reason: "must be greater than zero".into(),
            });
        }
        Ok(SessionSettings {
            tunnel_name: self.tunnel_name.clone(),
            poll_interval: Duration::from_millis(self.poll_interval_ms),
        })
    }
}

fn validate_tunnel_name(name: &str) -> Result<(), ConfigError> {
    let invalid = |reason: &str| ConfigError::Validation {
        field: "tunnel_name".into(),
        reason: reason.into(),
    };
    if name.is_empty() {
        return Err(invalid("must not be empty"));
    }
    if name.len() > MAX_TUNNEL_NAME_LEN {
        return Err(invalid("must be at most 15 characters"));
    }
    if !name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '=' | '+' | '.' | '-'))
    {
        return Err(invalid("may only contain letters, digits, and _=+.-"));
    }
    Ok(())
}

// ── Paths ───────────────────────────────────────────────────────────

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("net", "trustguard", "trustguard")
}

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    project_dirs().map_or_else(
        || home_fallback(".config").join("config.toml"),
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn default_state_dir() -> PathBuf {
    project_dirs().map_or_else(
        || home_fallback(".local/share"),
        |dirs| dirs.data_local_dir().to_path_buf(),
    )
}

fn home_fallback(sub: &str) -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(sub);
    p.push("trustguard");
    p
}

// ── Loading ─────────────────────────────────────────────────────────

/// Load settings from the canonical config file + environment.
pub fn load_settings() -> Result<Settings, ConfigError> {
    load_settings_from(&config_path())
}

/// Load settings from `path` (missing file is fine) + environment.
pub fn load_settings_from(path: &Path) -> Result<Settings, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Settings::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed(ENV_PREFIX));

    let settings: Settings = figment.extract()?;
    debug!(path = %path.display(), backend = %settings.backend, "settings loaded");
    Ok(settings)
}

// ── Saving ──────────────────────────────────────────────────────────

/// Serialize settings to TOML and write to the canonical config path.
pub fn save_settings(settings: &Settings) -> Result<PathBuf, ConfigError> {
    let path = config_path();
    save_settings_to(settings, &path)?;
    Ok(path)
}

pub fn save_settings_to(settings: &Settings, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(settings)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

// ── Tunnel configuration persistence ────────────────────────────────

/// Stores the last loaded tunnel configuration as `tunnel.conf` in the
/// state directory. The file holds a private key, so it is written
/// owner-only on Unix.
#[derive(Debug, Clone)]
pub struct FileConfigStore {
    path: PathBuf,
}

impl FileConfigStore {
    pub fn new(state_dir: impl AsRef<Path>) -> Self {
        Self {
            path: state_dir.as_ref().join(TUNNEL_FILE),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn write(&self, text: &str) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let mut options = tokio::fs::OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        options.mode(0o600);

        let mut file = options.open(&self.path).await?;
        file.write_all(text.as_bytes()).await?;
        file.flush().await?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            tokio::fs::set_permissions(&self.path, std::fs::Permissions::from_mode(0o600)).await?;
        }
        Ok(())
    }
}

fn persistence_error(path: &Path, err: &std::io::Error) -> CoreError {
    CoreError::Persistence {
        message: format!("{}: {err}", path.display()),
    }
}

#[async_trait]
impl ConfigStore for FileConfigStore {
    async fn load(&self) -> Result<Option<String>, CoreError> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(text) => Ok(Some(text)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(persistence_error(&self.path, &e)),
        }
    }

    async fn save(&self, text: &str) -> Result<(), CoreError> {
        self.write(text)
            .await
            .map_err(|e| persistence_error(&self.path, &e))?;
        debug!(path = %self.path.display(), "tunnel configuration saved");
        Ok(())
    }
}

// ── Consent record ──────────────────────────────────────────────────

/// Proof that the user authorized tunnel creation on this machine.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ConsentRecord {
    pub granted_at: DateTime<Utc>,
}

impl ConsentRecord {
    pub fn path(state_dir: &Path) -> PathBuf {
        state_dir.join(CONSENT_FILE)
    }

    /// `Ok(None)` when consent was never granted.
    pub fn load(state_dir: &Path) -> Result<Option<Self>, ConfigError> {
        let path = Self::path(state_dir);
        let text = match std::fs::read_to_string(&path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        toml::from_str(&text)
            .map(Some)
            .map_err(|source| ConfigError::Parse { path, source })
    }

    pub fn is_granted(state_dir: &Path) -> bool {
        matches!(Self::load(state_dir), Ok(Some(_)))
    }

    /// Record consent as of now.
    pub fn grant(state_dir: &Path) -> Result<Self, ConfigError> {
        let record = Self {
            granted_at: Utc::now(),
        };
        std::fs::create_dir_all(state_dir)?;
        std::fs::write(Self::path(state_dir), toml::to_string_pretty(&record)?)?;
        Ok(record)
    }

    /// Forget a previous grant. Returns whether one existed.
    pub fn revoke(state_dir: &Path) -> Result<bool, ConfigError> {
        match std::fs::remove_file(Self::path(state_dir)) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}
