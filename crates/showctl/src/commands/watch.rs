//! Live watch: connection changes, server notices and entity counts.
//!
//! Stays connected across reconnects until interrupted. Table and plain
//! output print one colored line per event; structured formats print one
//! JSON document per line.

use chrono::{DateTime, Local};
use owo_colors::OwoColorize;
use serde::Serialize;
use tokio::sync::broadcast::error::RecvError;
use tokio_stream::StreamExt;
use tracing::warn;

use showctl_core::{Controller, Mirror, Notice};

use crate::cli::{GlobalOpts, OutputFormat, WatchArgs};
use crate::error::CliError;
use crate::output;

use super::util;

// ── Events ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
struct Counts {
    clocks: usize,
    wiggles: usize,
    knobs: usize,
    fixtures: usize,
}

impl Counts {
    fn of(mirror: &Mirror) -> Self {
        Self {
            clocks: mirror.clocks().entries().len(),
            wiggles: mirror.wiggles().entries().len(),
            knobs: mirror.knobs().entries().len(),
            fixtures: mirror.patches().entries().len(),
        }
    }

    /// Counts of a synced snapshot, if they differ from `last`.
    fn changed(last: &mut Option<Self>, mirror: &Mirror) -> Option<Self> {
        if !mirror.is_synced() {
            return None;
        }
        let counts = Self::of(mirror);
        (last.replace(counts) != Some(counts)).then_some(counts)
    }
}

#[derive(Debug, Serialize)]
enum WatchEvent {
    Notice(Notice),
    Counts(Counts),
}

#[derive(Debug, Serialize)]
struct WatchLine {
    at: DateTime<Local>,
    #[serde(flatten)]
    event: WatchEvent,
}

// ── Rendering ───────────────────────────────────────────────────────

#[derive(Clone, Copy)]
enum Tone {
    Good,
    Bad,
    Info,
}

fn describe(event: &WatchEvent) -> (Tone, &'static str, String) {
    match event {
        WatchEvent::Notice(notice) => match notice {
            Notice::ConnectionOpened { opens } => {
                let detail = if *opens > 1 {
                    format!("reconnected (open #{opens}), resyncing")
                } else {
                    "connected, syncing".into()
                };
                (Tone::Good, "open", detail)
            }
            Notice::ConnectionClosed { reason } => (
                Tone::Bad,
                "closed",
                reason.clone().unwrap_or_else(|| "connection lost".into()),
            ),
            Notice::ServerError(message) => (Tone::Bad, "error", message.clone()),
            Notice::ShowLibraryError(message) => (Tone::Bad, "library", message.clone()),
            Notice::ShowSaved => (Tone::Good, "saved", "show saved".into()),
            Notice::ShowLoaded(name) => (Tone::Info, "loaded", format!("show '{name}' loaded")),
            Notice::ServerQuit => (Tone::Bad, "quit", "server is shutting down".into()),
        },
        WatchEvent::Counts(c) => (
            Tone::Info,
            "mirror",
            format!(
                "{} clocks, {} wiggles, {} knobs, {} fixtures",
                c.clocks, c.wiggles, c.knobs, c.fixtures
            ),
        ),
    }
}

fn render_line(line: &WatchLine, format: &OutputFormat, color: bool) -> String {
    match format {
        OutputFormat::Json | OutputFormat::JsonCompact | OutputFormat::Yaml => {
            output::render_json(line, true)
        }
        OutputFormat::Table | OutputFormat::Plain => {
            let (tone, tag, detail) = describe(&line.event);
            let time = line.at.format("%H:%M:%S").to_string();
            let tag = format!("{tag:<7}");
            if color {
                let tag = match tone {
                    Tone::Good => tag.green().bold().to_string(),
                    Tone::Bad => tag.red().bold().to_string(),
                    Tone::Info => tag.cyan().to_string(),
                };
                format!("{}  {tag}  {detail}", time.dimmed())
            } else {
                format!("{time}  {tag}  {detail}")
            }
        }
    }
}

fn emit(global: &GlobalOpts, color: bool, event: WatchEvent) {
    let line = WatchLine {
        at: Local::now(),
        event,
    };
    output::print_output(&render_line(&line, &global.output, color), global.quiet);
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(
    controller: Controller,
    args: &WatchArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let color = output::should_color(&global.color);
    let mut notices = controller.notices();
    let mut snapshots = controller.subscribe().into_stream();

    controller.connect().await?;
    util::done(
        global,
        format!("Watching {} (Ctrl-C to stop)", controller.config().url),
    );

    let interrupted = tokio::signal::ctrl_c();
    tokio::pin!(interrupted);
    let mut last_counts = None;

    let result = loop {
        tokio::select! {
            signal = &mut interrupted => break signal.map_err(CliError::from),
            notice = notices.recv() => match notice {
                Ok(notice) => emit(global, color, WatchEvent::Notice(notice)),
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "watch fell behind, notices dropped");
                }
                Err(RecvError::Closed) => break Ok(()),
            },
            snapshot = snapshots.next(), if args.counts => {
                let Some(snapshot) = snapshot else { break Ok(()) };
                if let Some(counts) = Counts::changed(&mut last_counts, &snapshot) {
                    emit(global, color, WatchEvent::Counts(counts));
                }
            }
        }
    };

    controller.disconnect().await;
    result
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    use super::*;

    fn line(event: WatchEvent) -> WatchLine {
        WatchLine {
            at: Local.with_ymd_and_hms(2026, 3, 14, 20, 5, 9).unwrap(),
            event,
        }
    }

    #[test]
    fn counts_report_synced_changes_once() {
        use showctl_core::protocol::{ClockResponse, KnobResponse, PatchResponse, WiggleResponse};
        use showctl_core::Response;

        let mut mirror = Mirror::new();
        let mut last = None;
        assert_eq!(Counts::changed(&mut last, &mirror), None);

        for response in [
            Response::Clock(ClockResponse::State(vec![])),
            Response::Wiggle(WiggleResponse::State(vec![])),
            Response::Knob(KnobResponse::State(vec![])),
            Response::Patch(PatchResponse::PatchState(vec![])),
        ] {
            mirror.apply(response).unwrap();
        }
        let empty = Counts {
            clocks: 0,
            wiggles: 0,
            knobs: 0,
            fixtures: 0,
        };
        assert_eq!(Counts::changed(&mut last, &mirror), Some(empty));
        assert_eq!(Counts::changed(&mut last, &mirror), None);
    }

    #[test]
    fn plain_lines_are_uncolored() {
        let out = render_line(
            &line(WatchEvent::Notice(Notice::ServerError("no port".into()))),
            &OutputFormat::Plain,
            false,
        );
        assert_eq!(out, "20:05:09  error    no port");
    }

    #[test]
    fn reconnects_are_called_out() {
        let (_, tag, detail) = describe(&WatchEvent::Notice(Notice::ConnectionOpened { opens: 3 }));
        assert_eq!(tag, "open");
        assert_eq!(detail, "reconnected (open #3), resyncing");
    }

    #[test]
    fn json_lines_carry_the_event() {
        let out = render_line(
            &line(WatchEvent::Counts(Counts {
                clocks: 1,
                wiggles: 2,
                knobs: 5,
                fixtures: 12,
            })),
            &OutputFormat::Json,
            true,
        );
        let value: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(value["Counts"]["fixtures"], 12);
        assert!(value["at"].is_string());
    }
}
