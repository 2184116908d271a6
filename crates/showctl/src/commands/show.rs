//! Show-file command handlers.

use showctl_core::protocol::ShowCommand as Wire;
use showctl_core::{Command as CoreCommand, Controller, Mirror, ShowState};

use crate::cli::{GlobalOpts, ShowArgs, ShowCommand};
use crate::error::CliError;
use crate::output;

use super::util;

fn detail(show: &ShowState) -> String {
    use std::fmt::Write;
    let mut out = String::new();
    let _ = writeln!(out, "Show:  {}", show.name.as_deref().unwrap_or("(untitled)"));
    let _ = writeln!(
        out,
        "Saved: {}",
        if show.saved_at_least_once { "yes" } else { "not this session" }
    );
    if let Some(ref err) = show.last_error {
        let _ = writeln!(out, "Last library error: {err}");
    }
    out.trim_end().to_owned()
}

// ── Settle checks ───────────────────────────────────────────────────

/// The saves listing has been replaced since `before` was taken.
fn saves_listed(before: &Mirror) -> impl Fn(&Mirror) -> bool + use<> {
    let seen = before.show().saves_version;
    move |m| m.show().saves_version > seen
}

fn shows_listed(before: &Mirror) -> impl Fn(&Mirror) -> bool + use<> {
    let seen = before.show().shows_version;
    move |m| m.show().shows_version > seen
}

/// A show load has landed since `before`, and it is `name` if one is given.
fn show_loaded(before: &Mirror, name: Option<String>) -> impl Fn(&Mirror) -> bool + use<> {
    let seen = before.show().loads;
    move |m| {
        m.show().loads > seen
            && name
                .as_deref()
                .is_none_or(|name| m.show().name.as_deref() == Some(name))
    }
}

fn print_names(global: &GlobalOpts, names: &[String]) {
    let out = output::render_single(
        &global.output,
        &names,
        |n| {
            if n.is_empty() {
                "(none)".into()
            } else {
                n.join("\n")
            }
        },
        |n| n.join("\n"),
    );
    output::print_output(&out, global.quiet);
}

pub async fn handle(
    controller: &Controller,
    args: ShowArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match args.command {
        ShowCommand::Info => {
            let show = controller.show_snapshot();
            let out = output::render_single(&global.output, &show, detail, |s| {
                s.name.clone().unwrap_or_default()
            });
            output::print_output(&out, global.quiet);
            Ok(())
        }

        ShowCommand::Save { name: None } => {
            util::send_and_confirm(controller, CoreCommand::Show(Wire::Save), |m| {
                m.show().saved_at_least_once
            })
            .await?;
            util::done(global, "Show saved");
            Ok(())
        }

        ShowCommand::Save { name: Some(name) } => {
            let expected = name.clone();
            util::send_and_confirm(controller, CoreCommand::Show(Wire::SaveAs(name)), |m| {
                m.show().saved_at_least_once
            })
            .await?;
            util::done(global, format!("Show saved as '{expected}'"));
            Ok(())
        }

        ShowCommand::Load { name } => {
            if !util::confirm(
                &format!(
                    "Load '{name}'? Every console switches to it and unsaved changes are lost."
                ),
                global.yes,
            )? {
                return Ok(());
            }
            let expected = name.clone();
            let settled = show_loaded(&controller.mirror(), Some(name.clone()));
            util::send_and_confirm(controller, CoreCommand::Show(Wire::Load(name)), settled)
                .await?;
            util::done(global, format!("Loaded '{expected}'"));
            Ok(())
        }

        ShowCommand::New => {
            if !util::confirm(
                "Start a new show? Every console switches to it and unsaved changes are lost.",
                global.yes,
            )? {
                return Ok(());
            }
            let settled = show_loaded(&controller.mirror(), None);
            util::send_and_confirm(controller, CoreCommand::Show(Wire::NewShow), settled).await?;
            util::done(global, "New show started");
            Ok(())
        }

        ShowCommand::Saves => {
            let settled = saves_listed(&controller.mirror());
            let mirror =
                util::send_and_confirm(controller, CoreCommand::Show(Wire::AvailableSaves), settled)
                    .await?;
            print_names(global, &mirror.show().saves);
            Ok(())
        }

        ShowCommand::List => {
            let settled = shows_listed(&controller.mirror());
            let mirror =
                util::send_and_confirm(controller, CoreCommand::Show(Wire::SavedShows), settled)
                    .await?;
            print_names(global, &mirror.show().shows);
            Ok(())
        }

        ShowCommand::Quit => {
            let name = controller.show_snapshot().name.unwrap_or_default();
            if !util::confirm(
                &format!("Shut down the show server running '{name}'? All consoles disconnect."),
                global.yes,
            )? {
                return Ok(());
            }
            controller.execute(CoreCommand::Show(Wire::Quit)).await?;
            util::done(global, "Quit sent");
            Ok(())
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use pretty_assertions::assert_eq;
    use tokio::sync::mpsc;

    use showctl_core::protocol::{ClockResponse, Response, ShowResponse};
    use showctl_core::session::initial_queries;
    use showctl_core::{ControllerConfig, TransportEvent};

    use super::*;

    fn show(response: ShowResponse) -> Response {
        Response::Show(response)
    }

    #[test]
    fn saves_settle_only_on_a_fresh_listing() {
        let mut mirror = Mirror::new();
        mirror
            .apply(show(ShowResponse::SavesAvailable(vec!["old".into()])))
            .unwrap();
        let settled = saves_listed(&mirror);

        mirror
            .apply(Response::Clock(ClockResponse::Classes(vec!["Tap".into()])))
            .unwrap();
        mirror
            .apply(show(ShowResponse::ShowsAvailable(vec!["Tour".into()])))
            .unwrap();
        assert!(!settled(&mirror));

        mirror
            .apply(show(ShowResponse::SavesAvailable(vec!["old".into()])))
            .unwrap();
        assert!(settled(&mirror));
    }

    #[test]
    fn shows_settle_only_on_a_fresh_listing() {
        let mut mirror = Mirror::new();
        let settled = shows_listed(&mirror);
        mirror
            .apply(show(ShowResponse::SavesAvailable(vec![])))
            .unwrap();
        assert!(!settled(&mirror));
        mirror
            .apply(show(ShowResponse::ShowsAvailable(vec![])))
            .unwrap();
        assert!(settled(&mirror));
    }

    #[test]
    fn reloading_the_open_show_waits_for_the_load() {
        let mut mirror = Mirror::new();
        mirror.apply(show(ShowResponse::ShowName("Tour".into()))).unwrap();
        let settled = show_loaded(&mirror, Some("Tour".into()));

        mirror.apply(show(ShowResponse::Saved)).unwrap();
        assert!(!settled(&mirror));

        mirror.apply(show(ShowResponse::Loaded("Tour".into()))).unwrap();
        assert!(settled(&mirror));
    }

    #[test]
    fn new_show_waits_for_any_load() {
        let mut mirror = Mirror::new();
        let settled = show_loaded(&mirror, None);
        mirror.apply(show(ShowResponse::ShowName("Tour".into()))).unwrap();
        assert!(!settled(&mirror));
        mirror.apply(show(ShowResponse::Loaded("untitled".into()))).unwrap();
        assert!(settled(&mirror));
    }

    #[tokio::test]
    async fn saves_listing_ignores_other_clients_broadcasts() {
        let url = showctl_config::parse_server_url("ws://127.0.0.1:9/ws").unwrap();
        let controller = Controller::new(ControllerConfig::new(url));
        let (events, events_rx) = mpsc::channel(16);
        let (out_tx, mut outbound) = mpsc::unbounded_channel();
        controller.attach(events_rx, out_tx).await;

        events.send(TransportEvent::Opened).await.unwrap();
        for _ in initial_queries() {
            outbound.recv().await.unwrap();
        }

        let settled = saves_listed(&controller.mirror());
        let waiter = tokio::spawn({
            let controller = controller.clone();
            async move {
                util::send_and_confirm(
                    &controller,
                    CoreCommand::Show(Wire::AvailableSaves),
                    settled,
                )
                .await
            }
        });
        let frame = outbound.recv().await.unwrap();
        assert!(frame.contains("AvailableSaves"), "unexpected frame {frame}");

        let push = |response: Response| {
            TransportEvent::Message(serde_json::to_string(&response).unwrap())
        };
        events
            .send(push(Response::Clock(ClockResponse::Classes(vec!["Tap".into()]))))
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(!waiter.is_finished());

        events
            .send(push(show(ShowResponse::SavesAvailable(vec![
                "v1".into(),
                "v2".into(),
            ]))))
            .await
            .unwrap();
        let mirror = waiter.await.unwrap().unwrap();
        assert_eq!(mirror.show().saves, ["v1", "v2"]);

        controller.disconnect().await;
    }
}
