//! `trustguard load`: persist a configuration for later sessions.

use trustguard_core::{Command, CommandResult};

use crate::cli::{GlobalOpts, LoadArgs};
use crate::commands::{build_session, read_config_file};
use crate::error::CliError;
use crate::output;

pub async fn handle(args: LoadArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let text = read_config_file(&args.file)?;
    let ctx = build_session(global, false)?;

    let result = ctx.controller().execute(Command::LoadConfig { text }).await;
    let snapshot = ctx.session.snapshot();
    ctx.controller().shutdown().await;

    match result? {
        CommandResult::Applied => {
            println!("{}", snapshot.status_message);
            eprintln!("   saved to {}", ctx.config_store.path().display());
            Ok(())
        }
        CommandResult::Ignored => {
            eprintln!("{}", output::status_line(&snapshot, ctx.color));
            Err(CliError::NoTunnelConfig)
        }
    }
}
