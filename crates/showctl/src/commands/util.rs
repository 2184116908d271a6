//! Shared helpers for command handlers.

use std::fmt::Display;
use std::sync::Arc;

use tokio::sync::broadcast::{
    self,
    error::{RecvError, TryRecvError},
};

use showctl_core::{
    ClockId, Command, Controller, KnobOwner, Mirror, MirrorStream, Notice, WiggleId,
    WiggleOutput,
};

use crate::cli::GlobalOpts;
use crate::error::CliError;

/// Prompt for confirmation, auto-approving if `--yes` was passed.
pub fn confirm(message: &str, yes_flag: bool) -> Result<bool, CliError> {
    if yes_flag {
        return Ok(true);
    }
    let confirmed = dialoguer::Confirm::new()
        .with_prompt(message)
        .default(false)
        .interact()
        .map_err(|e| CliError::Io(std::io::Error::other(e)))?;
    Ok(confirmed)
}

/// Map a dialoguer / interactive I/O failure into CliError.
pub fn prompt_err(e: impl Display) -> CliError {
    CliError::Validation {
        field: "interactive".into(),
        reason: format!("prompt failed: {e}"),
    }
}

/// Status line on stderr, unless `--quiet`.
pub fn done(global: &GlobalOpts, message: impl Display) {
    if !global.quiet {
        eprintln!("{message}");
    }
}

/// Table cell for an optional value.
pub fn or_dash<T: Display>(value: Option<T>) -> String {
    value.map_or_else(|| "-".into(), |v| v.to_string())
}

// ── Command round trip ───────────────────────────────────────────────

/// Send `command` and wait until the echoed broadcast leaves the mirror
/// in a state where `settled` holds.
///
/// Server errors that arrive in the meantime fail the command.
pub async fn send_and_confirm(
    controller: &Controller,
    command: Command,
    settled: impl Fn(&Mirror) -> bool,
) -> Result<Arc<Mirror>, CliError> {
    let mut mirror = controller.subscribe();
    let mut notices = controller.notices();
    let timeout = controller.config().sync_timeout;
    let description = command.describe();

    controller.execute(command).await?;

    let waited = tokio::time::timeout(
        timeout,
        wait_settled(&mut mirror, &mut notices, &settled),
    )
    .await;

    waited.unwrap_or_else(|_| {
        Err(CliError::Timeout {
            seconds: timeout.as_secs(),
            waiting_for: format!("the server to confirm '{description}'"),
        })
    })
}

async fn wait_settled(
    mirror: &mut MirrorStream,
    notices: &mut broadcast::Receiver<Notice>,
    settled: &impl Fn(&Mirror) -> bool,
) -> Result<Arc<Mirror>, CliError> {
    loop {
        tokio::select! {
            biased;
            notice = notices.recv() => match notice {
                Ok(notice) => check_notice(notice)?,
                Err(RecvError::Lagged(skipped)) => {
                    tracing::debug!(skipped, "notice receiver lagged");
                }
                Err(RecvError::Closed) => return Err(CliError::Disconnected),
            },
            changed = mirror.changed() => {
                let snapshot = changed.ok_or(CliError::Disconnected)?;
                // An error response also touches the mirror; its notice
                // follows right behind.
                tokio::task::yield_now().await;
                loop {
                    match notices.try_recv() {
                        Ok(notice) => check_notice(notice)?,
                        Err(TryRecvError::Lagged(_)) => {}
                        Err(TryRecvError::Empty | TryRecvError::Closed) => break,
                    }
                }
                if settled(&snapshot) {
                    return Ok(snapshot);
                }
            }
        }
    }
}

fn check_notice(notice: Notice) -> Result<(), CliError> {
    match notice {
        Notice::ServerError(message) | Notice::ShowLibraryError(message) => {
            Err(CliError::Server { message })
        }
        Notice::ConnectionClosed { .. } => Err(CliError::Disconnected),
        _ => Ok(()),
    }
}

// ── Argument parsing ─────────────────────────────────────────────────

/// Parse `clock:NS:LOCAL` or `wiggle:NS:LOCAL`.
pub fn parse_knob_owner(raw: &str) -> Result<KnobOwner, CliError> {
    let invalid = || CliError::Validation {
        field: "owner".into(),
        reason: format!("'{raw}' is not clock:NS:LOCAL or wiggle:NS:LOCAL"),
    };
    let (family, address) = raw.trim().split_once(':').ok_or_else(invalid)?;
    match family.to_ascii_lowercase().as_str() {
        "clock" | "c" => address
            .parse::<ClockId>()
            .map(KnobOwner::Clock)
            .map_err(|_| invalid()),
        "wiggle" | "w" => address
            .parse::<WiggleId>()
            .map(KnobOwner::Wiggle)
            .map_err(|_| invalid()),
        _ => Err(invalid()),
    }
}

/// Parse `NS:LOCAL#OUTPUT`. A bare `NS:LOCAL` means output 0.
pub fn parse_wiggle_output(raw: &str) -> Result<WiggleOutput, CliError> {
    let invalid = || CliError::Validation {
        field: "source".into(),
        reason: format!("'{raw}' is not NS:LOCAL#OUTPUT"),
    };
    let (wiggle, output) = raw.trim().split_once('#').unwrap_or((raw.trim(), "0"));
    Ok(WiggleOutput {
        wiggle: wiggle.parse().map_err(|_| invalid())?,
        output: output.parse().map_err(|_| invalid())?,
    })
}
