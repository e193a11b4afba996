// ── wg-quick engine ──
//
// Shells out to wireguard-tools: `wg-quick up|down <file>` for the
// lifecycle and `wg show <iface> dump` for counters. The interface name
// is the file stem, so the configuration is rendered as
// `<state_dir>/<tunnel>.conf`.

use std::path::{Path, PathBuf};
use std::process::Output;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, trace};

use trustguard_core::{
    BackendError, PeerStats, TunnelBackend, TunnelConfiguration, TunnelIdentity, TunnelState,
};

const WG_QUICK: &str = "wg-quick";
const WG: &str = "wg";

pub struct WgQuickBackend {
    dir: PathBuf,
}

impl WgQuickBackend {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn conf_path(&self, tunnel: &TunnelIdentity) -> PathBuf {
        self.dir.join(format!("{}.conf", tunnel.name()))
    }

    async fn write_conf(path: &Path, config: &TunnelConfiguration) -> std::io::Result<()> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let mut options = tokio::fs::OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        options.mode(0o600);
        let mut file = options.open(path).await?;
        file.write_all(config.as_str().as_bytes()).await?;
        file.flush().await
    }
}

/// Run a wireguard-tools binary, mapping a missing executable to
/// `Unavailable` and a non-zero exit to `Rejected` with its stderr.
async fn run(program: &str, args: &[&str]) -> Result<Output, BackendError> {
    trace!(program, ?args, "spawning");
    let output = Command::new(program)
        .args(args)
        .kill_on_drop(true)
        .output()
        .await
        .map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => {
                BackendError::Unavailable(format!("{program} not found in PATH"))
            }
            _ => BackendError::Io(e),
        })?;

    if output.status.success() {
        Ok(output)
    } else {
        let stderr = String::from_utf8_lossy(&output.stderr);
        let message = stderr
            .lines()
            .rev()
            .find(|l| !l.trim().is_empty())
            .unwrap_or("exited with an error")
            .trim()
            .to_owned();
        Err(BackendError::Rejected(message))
    }
}

#[async_trait]
impl TunnelBackend for WgQuickBackend {
    async fn bring_up(
        &self,
        tunnel: &TunnelIdentity,
        config: &TunnelConfiguration,
    ) -> Result<String, BackendError> {
        let path = self.conf_path(tunnel);
        Self::write_conf(&path, config).await?;
        debug!(path = %path.display(), "interface configuration written");

        let path_str = path.to_string_lossy().into_owned();
        run(WG_QUICK, &["up", path_str.as_str()]).await?;
        tunnel.on_state_change(TunnelState::Up);
        Ok(TunnelState::Up.to_string())
    }

    async fn bring_down(&self, tunnel: &TunnelIdentity) -> Result<String, BackendError> {
        let path = self.conf_path(tunnel);
        let path_str = path.to_string_lossy().into_owned();
        run(WG_QUICK, &["down", path_str.as_str()]).await?;
        tunnel.on_state_change(TunnelState::Down);
        Ok(TunnelState::Down.to_string())
    }

    async fn stats(&self, tunnel: &TunnelIdentity) -> Result<Option<PeerStats>, BackendError> {
        let output = run(WG, &["show", tunnel.name(), "dump"]).await?;
        parse_dump(&String::from_utf8_lossy(&output.stdout))
    }
}

/// Parse `wg show <iface> dump`.
///
/// The first line describes the interface; each following line is a peer:
/// `public-key preshared-key endpoint allowed-ips latest-handshake
/// transfer-rx transfer-tx persistent-keepalive`, tab separated, with the
/// handshake in epoch seconds (0 = never).
pub fn parse_dump(dump: &str) -> Result<Option<PeerStats>, BackendError> {
    let Some(peer) = dump.lines().skip(1).find(|l| !l.trim().is_empty()) else {
        return Ok(None);
    };

    let fields: Vec<&str> = peer.split('\t').collect();
    let [public_key, _psk, _endpoint, _allowed, handshake, rx, tx, ..] = fields.as_slice() else {
        return Err(BackendError::Rejected(format!(
            "unexpected peer line in wg dump ({} fields)",
            fields.len()
        )));
    };

    let number = |name: &str, raw: &str| {
        raw.parse::<u64>()
            .map_err(|_| BackendError::Rejected(format!("invalid {name} in wg dump: {raw:?}")))
    };
    let handshake_secs = number("latest-handshake", *handshake)?;

    Ok(Some(PeerStats {
        rx_bytes: number("transfer-rx", *rx)?,
        tx_bytes: number("transfer-tx", *tx)?,
        latest_handshake_epoch_millis: i64::try_from(handshake_secs.saturating_mul(1000))
            .unwrap_or(i64::MAX),
        peer_id: (*public_key).to_owned(),
    }))
}
