//! `trustguard up`: connect, stream statistics, disconnect on Ctrl-C.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;
use tracing::{debug, info};

use trustguard_core::{
    Command, ConnectionState, GateOutcome, SessionSnapshot, SnapshotStream, TunnelConfiguration,
};

use crate::cli::{GlobalOpts, UpArgs};
use crate::commands::{SessionContext, build_session, read_config_file};
use crate::error::CliError;
use crate::output;

pub async fn handle(args: UpArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let ctx = build_session(global, true)?;
    let result = run(&ctx, &args).await;
    ctx.controller().shutdown().await;
    result
}

async fn run(ctx: &SessionContext, args: &UpArgs) -> Result<(), CliError> {
    let config = resolve_config(ctx, args).await?;
    let mut snapshots = ctx.session.subscribe();

    // The consent prompt reads the terminal and the state directory.
    let session = ctx.session.clone();
    let outcome = tokio::task::spawn_blocking(move || session.gate().ensure(config))
        .await
        .map_err(|e| CliError::Session(format!("consent prompt aborted: {e}")))?;

    match outcome {
        GateOutcome::Granted => {}
        GateOutcome::Denied => return Err(CliError::ConsentDenied),
        GateOutcome::Pending(token) => {
            // The terminal provider always answers inline.
            ctx.session.gate().cancel(token);
            return Err(CliError::ConsentDenied);
        }
    }

    let Some(settled) = wait_settled(&mut snapshots, ctx.color).await else {
        return Err(CliError::Session("session worker exited".into()));
    };
    if let ConnectionState::Failed(reason) = &settled.state {
        return Err(CliError::Backend {
            operation: "bring-up".into(),
            message: reason.clone(),
        });
    }

    monitor(ctx, &mut snapshots, args.duration).await;

    ctx.controller().execute(Command::Stop).await?;
    println!("{}", output::status_line(&ctx.session.snapshot(), ctx.color));
    Ok(())
}

/// The file argument wins and is persisted; otherwise reuse the last
/// loaded configuration. Either way the worker has answered a command
/// before this returns, so its startup restore is already published.
async fn resolve_config(
    ctx: &SessionContext,
    args: &UpArgs,
) -> Result<TunnelConfiguration, CliError> {
    let text = if let Some(path) = &args.file {
        let text = read_config_file(path)?;
        ctx.controller()
            .execute(Command::LoadConfig { text: text.clone() })
            .await?;
        text
    } else {
        debug!(path = %ctx.config_store.path().display(), "using saved configuration");
        // A no-op while disconnected; orders us after the worker's restore.
        ctx.controller().execute(Command::Stop).await?;
        ctx.session.snapshot().config_text.clone()
    };

    let config = TunnelConfiguration::from(text);
    if config.is_empty() {
        return Err(CliError::NoTunnelConfig);
    }
    Ok(config)
}

/// Print transitions until the session is connected or has failed.
async fn wait_settled(stream: &mut SnapshotStream, color: bool) -> Option<Arc<SessionSnapshot>> {
    loop {
        let snapshot = stream.changed().await?;
        println!("{}", output::status_line(&snapshot, color));
        if snapshot.state.is_connected() || snapshot.state.is_failed() {
            return Some(snapshot);
        }
    }
}

async fn until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

async fn monitor(ctx: &SessionContext, snapshots: &mut SnapshotStream, duration: Option<u64>) {
    let deadline = duration.map(|secs| Instant::now() + Duration::from_secs(secs));
    let mut stats = ctx.session.subscribe_stats();
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            _ = &mut ctrl_c => {
                info!("interrupted, disconnecting");
                break;
            }
            () = until(deadline) => {
                debug!("duration elapsed, disconnecting");
                break;
            }
            sample = stats.changed() => match sample {
                Some(Some(sample)) => println!("{}", output::stats_line(&sample, ctx.color)),
                Some(None) => {}
                None => break,
            },
            snapshot = snapshots.changed() => match snapshot {
                Some(snapshot) if snapshot.state.is_connected() => {}
                Some(snapshot) => {
                    println!("{}", output::status_line(&snapshot, ctx.color));
                    break;
                }
                None => break,
            },
        }
    }
}
