//! Terminal rendering of session snapshots and statistics.

use std::io::{self, IsTerminal};

use owo_colors::OwoColorize;

use trustguard_core::format::fmt_rx_tx;
use trustguard_core::{ConnectionState, PeerStatistics, SessionSnapshot};

use crate::cli::ColorMode;

/// Determine whether color output should be enabled.
pub fn should_color(mode: ColorMode) -> bool {
    match mode {
        ColorMode::Always => true,
        ColorMode::Never => false,
        ColorMode::Auto => io::stdout().is_terminal() && std::env::var("NO_COLOR").is_err(),
    }
}

fn paint_state(state: &ConnectionState, color: bool) -> String {
    let text = state.to_string();
    if !color {
        return text;
    }
    match state {
        ConnectionState::Connected => text.green().bold().to_string(),
        ConnectionState::Connecting | ConnectionState::Disconnecting => text.yellow().to_string(),
        ConnectionState::Failed(_) => text.red().bold().to_string(),
        ConnectionState::Disconnected => text.dimmed().to_string(),
    }
}

/// One line per snapshot: `[state] status (error)`.
pub fn status_line(snapshot: &SessionSnapshot, color: bool) -> String {
    let mut line = format!(
        "[{}] {}",
        paint_state(&snapshot.state, color),
        snapshot.status_message
    );
    if snapshot.is_busy {
        line.push_str(" ...");
    }
    if let Some(error) = &snapshot.last_error {
        let error = format!("({error})");
        line.push(' ');
        if color {
            line.push_str(&error.red().to_string());
        } else {
            line.push_str(&error);
        }
    }
    line
}

/// `↓ rx  ↑ tx  handshake HH:MM:SS ago  endpoint`.
pub fn stats_line(stats: &PeerStatistics, color: bool) -> String {
    let traffic = fmt_rx_tx(stats.rx_bytes, stats.tx_bytes);
    let endpoint = if stats.endpoint.is_empty() {
        "-"
    } else {
        stats.endpoint.as_str()
    };
    let handshake = stats.handshake_display();
    if color {
        format!(
            "{}  handshake {} ago  {}",
            traffic.cyan(),
            handshake,
            endpoint.dimmed()
        )
    } else {
        format!("{traffic}  handshake {handshake} ago  {endpoint}")
    }
}
