//! Clap derive structures for the `trustguard` CLI.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;

use trustguard_config::BackendKind;

// ── Top-Level CLI ────────────────────────────────────────────────────

/// trustguard -- bring a WireGuard tunnel up and watch it
#[derive(Debug, Parser)]
#[command(
    name = "trustguard",
    version,
    about = "Connect a WireGuard tunnel and monitor its traffic",
    long_about = "Drives a single encrypted tunnel through a consent-gated session.\n\n\
        `up` connects interactively and shows live statistics, `serve` accepts\n\
        newline-delimited JSON start/stop requests on stdin.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Grant tunnel consent without prompting
    #[arg(long, short = 'y', global = true)]
    pub yes: bool,

    /// Tunnel engine (overrides the config file)
    #[arg(long, global = true, value_parser = parse_backend)]
    pub backend: Option<BackendKind>,

    /// Write logs to this file instead of stderr
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// When to use color output
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorMode,
}

fn parse_backend(raw: &str) -> Result<BackendKind, String> {
    raw.parse()
        .map_err(|_| format!("unknown backend '{raw}' (expected 'wg-quick' or 'simulated')"))
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

// ── Commands ─────────────────────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Connect and show live statistics until interrupted
    Up(UpArgs),

    /// Save a tunnel configuration for later `up` runs
    Load(LoadArgs),

    /// Accept START/STOP requests as JSON lines on stdin
    Serve(ServeArgs),

    /// Inspect configuration
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(Debug, Args)]
pub struct UpArgs {
    /// Tunnel configuration file (defaults to the last loaded one)
    pub file: Option<PathBuf>,

    /// Disconnect after this many seconds instead of waiting for Ctrl-C
    #[arg(long, value_name = "SECONDS")]
    pub duration: Option<u64>,
}

#[derive(Debug, Args)]
pub struct LoadArgs {
    /// Tunnel configuration file
    pub file: PathBuf,
}

#[derive(Debug, Args)]
pub struct ServeArgs {
    /// Print every snapshot as a JSON line instead of a status line
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Print the config file path
    Path,
    /// Print the effective settings
    Show,
}

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Target shell
    pub shell: Shell,
}
