//! `trustguard serve`: newline-delimited JSON intents on stdin.
//!
//! Each line is a [`ServiceIntent`] such as
//! `{"action":"START","config":"[Interface]..."}` or `{"action":"STOP"}`.
//! Requests are handled one at a time; the settled state after each is
//! written to stdout. At end of input the session is shut down, which
//! tears down a live tunnel.

use std::sync::Arc;

use serde::Serialize;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, warn};

use trustguard_core::{
    ConnectionState, GateOutcome, IntentOutcome, ServiceIntent, SessionSnapshot, SnapshotStream,
    handle_intent,
};

use crate::cli::{GlobalOpts, ServeArgs};
use crate::commands::{SessionContext, build_session};
use crate::error::CliError;
use crate::output;

/// JSON line emitted per settled state. Never carries the configuration.
#[derive(Debug, Serialize)]
struct StateEvent<'a> {
    state: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    reason: Option<&'a str>,
    status: &'a str,
    error: Option<&'a str>,
}

impl<'a> From<&'a SessionSnapshot> for StateEvent<'a> {
    fn from(snapshot: &'a SessionSnapshot) -> Self {
        let reason = match &snapshot.state {
            ConnectionState::Failed(reason) => Some(reason.as_str()),
            _ => None,
        };
        Self {
            state: snapshot.state.label(),
            reason,
            status: &snapshot.status_message,
            error: snapshot.last_error.as_deref(),
        }
    }
}

pub async fn handle(args: ServeArgs, global: &GlobalOpts) -> Result<(), CliError> {
    // stdin carries requests, so consent can never be prompted for.
    let ctx = build_session(global, false)?;
    let result = serve(&ctx, args.json).await;

    ctx.controller().shutdown().await;
    emit(&ctx, &ctx.session.snapshot(), args.json)?;
    result
}

async fn serve(ctx: &SessionContext, json: bool) -> Result<(), CliError> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let intent: ServiceIntent = match serde_json::from_str(line) {
            Ok(intent) => intent,
            Err(e) => {
                warn!(error = %e, "discarding malformed request");
                eprintln!("ignored: malformed request: {e}");
                continue;
            }
        };

        let mut snapshots = ctx.session.subscribe();
        let before = snapshots.current().state.clone();

        match handle_intent(&ctx.session, intent) {
            IntentOutcome::Started(GateOutcome::Granted) if !before.is_active() => {
                if let Some(snapshot) =
                    settle(&mut snapshots, |s| s.is_connected() || s.is_failed()).await
                {
                    emit(ctx, &snapshot, json)?;
                }
            }
            IntentOutcome::Started(GateOutcome::Granted) => {
                debug!(state = %before, "start while active");
            }
            IntentOutcome::Started(GateOutcome::Denied) => {
                eprintln!("ignored: tunnel consent was not granted (pass --yes)");
            }
            IntentOutcome::Started(GateOutcome::Pending(token)) => {
                ctx.session.gate().cancel(token);
                eprintln!("ignored: tunnel consent is pending");
            }
            IntentOutcome::Stopped if before != ConnectionState::Disconnected => {
                if let Some(snapshot) =
                    settle(&mut snapshots, |s| *s == ConnectionState::Disconnected).await
                {
                    emit(ctx, &snapshot, json)?;
                }
            }
            IntentOutcome::Stopped => debug!("stop while disconnected"),
            IntentOutcome::Ignored(reason) => eprintln!("ignored: {reason}"),
        }
    }

    debug!("end of input");
    Ok(())
}

/// Wait for a snapshot whose state satisfies `done`. `None` if the
/// worker went away first.
async fn settle(
    stream: &mut SnapshotStream,
    done: impl Fn(&ConnectionState) -> bool,
) -> Option<Arc<SessionSnapshot>> {
    loop {
        let snapshot = stream.changed().await?;
        if done(&snapshot.state) {
            return Some(snapshot);
        }
    }
}

fn emit(ctx: &SessionContext, snapshot: &SessionSnapshot, json: bool) -> Result<(), CliError> {
    if json {
        println!("{}", serde_json::to_string(&StateEvent::from(snapshot))?);
    } else {
        println!("{}", output::status_line(snapshot, ctx.color));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failed_event_carries_reason_not_config() {
        let snapshot = SessionSnapshot::default()
            .with_config_text("[Interface]\nPrivateKey = c2VjcmV0\n")
            .with_state(ConnectionState::Failed("timeout".into()))
            .with_status("Connection failed")
            .with_error(Some("timeout".into()));
        let line = serde_json::to_string(&StateEvent::from(&snapshot)).unwrap_or_default();
        assert_eq!(
            line,
            concat!(
                r#"{"state":"failed","reason":"timeout","#,
                r#""status":"Connection failed","error":"timeout"}"#
            )
        );
    }

    #[test]
    fn connected_event_omits_reason() {
        let snapshot = SessionSnapshot::default()
            .with_state(ConnectionState::Connected)
            .with_status("UP");
        let line = serde_json::to_string(&StateEvent::from(&snapshot)).unwrap_or_default();
        assert_eq!(line, r#"{"state":"connected","status":"UP","error":null}"#);
    }
}
