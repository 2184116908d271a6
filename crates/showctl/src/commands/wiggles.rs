//! Wiggle command handlers.

use serde::Serialize;
use tabled::Tabled;

use showctl_core::protocol::WiggleCommand;
use showctl_core::{
    Command as CoreCommand, Controller, KnobOwner, Mirror, WiggleDescription, WiggleId,
    WiggleOutput,
};

use crate::cli::{GlobalOpts, WigglesArgs, WigglesCommand};
use crate::error::CliError;
use crate::output;

use super::knobs::KnobEntry;
use super::util;

// ── Table row ───────────────────────────────────────────────────────

#[derive(Serialize)]
struct WiggleEntry {
    id: WiggleId,
    #[serde(flatten)]
    description: WiggleDescription,
}

#[derive(Tabled)]
struct WiggleRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Kind")]
    kind: String,
    #[tabled(rename = "Inputs")]
    inputs: String,
    #[tabled(rename = "Outputs")]
    outputs: usize,
    #[tabled(rename = "Clock")]
    clock: String,
}

impl From<&WiggleEntry> for WiggleRow {
    fn from(w: &WiggleEntry) -> Self {
        Self {
            id: w.id.to_string(),
            name: w.description.name.clone(),
            kind: w.description.kind.clone(),
            inputs: w
                .description
                .inputs
                .iter()
                .map(|i| util::or_dash(i.as_ref()))
                .collect::<Vec<_>>()
                .join(", "),
            outputs: w.description.outputs,
            clock: util::or_dash(w.description.clock.clock()),
        }
    }
}

#[derive(Serialize)]
struct WiggleDetail {
    #[serde(flatten)]
    wiggle: WiggleEntry,
    knobs: Vec<KnobEntry>,
}

fn detail(d: &WiggleDetail, mirror: &Mirror) -> String {
    use std::fmt::Write;
    let mut out = String::new();
    let id = d.wiggle.id;
    let w = &d.wiggle.description;
    let _ = writeln!(out, "Wiggle {id}  {}", w.name);
    let _ = writeln!(out, "  kind:    {}", w.kind);
    let _ = writeln!(out, "  outputs: {}", w.outputs);
    let clock = match (w.clock.clock(), mirror.clock_driving(&id)) {
        (Some(_), Some((clock, description))) => format!("{clock} {}", description.name),
        (Some(clock), None) => format!("{clock} (missing)"),
        (None, _) => "-".into(),
    };
    let _ = writeln!(out, "  clock:   {clock}");
    for (slot, input) in w.inputs.iter().enumerate() {
        let source = match (input, mirror.input_source(&id, slot)) {
            (Some(_), Some((source, description))) => format!("{source} {}", description.name),
            (Some(source), None) => format!("{source} (missing)"),
            (None, _) => "(disconnected)".into(),
        };
        let _ = writeln!(out, "  input {slot}: {source}");
    }
    for knob in &d.knobs {
        let _ = writeln!(out, "  knob {}: {} = {}", knob.slot, knob.name, knob.value);
    }
    out.trim_end().to_owned()
}

fn require(mirror: &Mirror, id: WiggleId) -> Result<&WiggleDescription, CliError> {
    mirror.wiggles().get(&id).ok_or_else(|| not_found(id))
}

fn counts(mirror: &Mirror, id: WiggleId) -> Option<(usize, usize)> {
    mirror
        .wiggles()
        .get(&id)
        .map(|w| (w.inputs.len(), w.outputs))
}

// ── Handler ─────────────────────────────────────────────────────────

#[allow(clippy::too_many_lines)]
pub async fn handle(
    controller: &Controller,
    args: WigglesArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let mirror = controller.mirror();

    match args.command {
        WigglesCommand::List => {
            let entries: Vec<WiggleEntry> = controller
                .wiggles_snapshot()
                .into_iter()
                .map(|(id, description)| WiggleEntry { id, description })
                .collect();
            let out = output::render_list(
                &global.output,
                &entries,
                |w| WiggleRow::from(w),
                |w| w.id.to_string(),
            );
            output::print_output(&out, global.quiet);
            Ok(())
        }

        WigglesCommand::Get { id } => {
            let description = require(&mirror, id)?.clone();
            let knobs = mirror
                .knobs_owned_by(KnobOwner::Wiggle(id))
                .map(|(address, knob)| KnobEntry::new(&mirror, *address, knob))
                .collect();
            let data = WiggleDetail {
                wiggle: WiggleEntry { id, description },
                knobs,
            };
            let out = output::render_single(
                &global.output,
                &data,
                |d| detail(d, &mirror),
                |d| d.wiggle.id.to_string(),
            );
            output::print_output(&out, global.quiet);
            Ok(())
        }

        WigglesCommand::Kinds => {
            let kinds = mirror.wiggles().kinds().to_vec();
            let out =
                output::render_single(&global.output, &kinds, |k| k.join("\n"), |k| k.join("\n"));
            output::print_output(&out, global.quiet);
            Ok(())
        }

        WigglesCommand::Create { kind } => {
            if !mirror.wiggles().kinds().iter().any(|k| *k == kind) {
                return Err(CliError::NotFound {
                    resource_type: "wiggle kind".into(),
                    identifier: kind,
                    list_command: "wiggles kinds".into(),
                });
            }
            let before = mirror.wiggles().entries().len();
            util::send_and_confirm(
                controller,
                CoreCommand::Wiggle(WiggleCommand::Create(kind.clone())),
                |m| m.wiggles().entries().len() > before,
            )
            .await?;
            util::done(global, format!("Wiggle created ({kind})"));
            Ok(())
        }

        WigglesCommand::Rename { id, name } => {
            require(&mirror, id)?;
            let expected = name.clone();
            util::send_and_confirm(
                controller,
                CoreCommand::Wiggle(WiggleCommand::Rename(id, name)),
                |m| m.wiggles().get(&id).is_some_and(|w| w.name == expected),
            )
            .await?;
            util::done(global, format!("Wiggle {id} renamed to '{expected}'"));
            Ok(())
        }

        WigglesCommand::Remove { id } => {
            let name = require(&mirror, id)?.name.clone();
            if !util::confirm(&format!("Delete wiggle '{name}' ({id})?"), global.yes)? {
                return Ok(());
            }
            util::send_and_confirm(
                controller,
                CoreCommand::Wiggle(WiggleCommand::Remove(id)),
                |m| m.wiggles().get(&id).is_none(),
            )
            .await?;
            util::done(global, format!("Wiggle {id} deleted"));
            Ok(())
        }

        WigglesCommand::SetInput { id, slot, source } => {
            let inputs = require(&mirror, id)?.inputs.len();
            if slot >= inputs {
                return Err(CliError::Validation {
                    field: "slot".into(),
                    reason: format!("wiggle {id} has {inputs} inputs"),
                });
            }
            let source: Option<WiggleOutput> =
                source.as_deref().map(util::parse_wiggle_output).transpose()?;
            if let Some(WiggleOutput { wiggle, output: port }) = source {
                let outputs = require(&mirror, wiggle)?.outputs;
                if port >= outputs {
                    return Err(CliError::Validation {
                        field: "source".into(),
                        reason: format!("wiggle {wiggle} has {outputs} outputs"),
                    });
                }
            }
            util::send_and_confirm(
                controller,
                CoreCommand::Wiggle(WiggleCommand::SetInput(id, slot, source)),
                |m| {
                    m.wiggles()
                        .get(&id)
                        .and_then(|w| w.inputs.get(slot).copied())
                        == Some(source)
                },
            )
            .await?;
            util::done(global, format!("Wiggle {id} input {slot} set"));
            Ok(())
        }

        WigglesCommand::PushInput { id } => {
            let (inputs, outputs) = counts(&mirror, id).ok_or_else(|| not_found(id))?;
            util::send_and_confirm(
                controller,
                CoreCommand::Wiggle(WiggleCommand::PushInput(id)),
                |m| counts(m, id) == Some((inputs + 1, outputs)),
            )
            .await?;
            util::done(global, format!("Wiggle {id} now has {} inputs", inputs + 1));
            Ok(())
        }

        WigglesCommand::PopInput { id } => {
            let (inputs, outputs) = counts(&mirror, id).ok_or_else(|| not_found(id))?;
            let Some(after) = inputs.checked_sub(1) else {
                return Err(CliError::Validation {
                    field: "inputs".into(),
                    reason: format!("wiggle {id} has no inputs"),
                });
            };
            util::send_and_confirm(
                controller,
                CoreCommand::Wiggle(WiggleCommand::PopInput(id)),
                |m| counts(m, id) == Some((after, outputs)),
            )
            .await?;
            util::done(global, format!("Wiggle {id} now has {after} inputs"));
            Ok(())
        }

        WigglesCommand::PushOutput { id } => {
            let (inputs, outputs) = counts(&mirror, id).ok_or_else(|| not_found(id))?;
            util::send_and_confirm(
                controller,
                CoreCommand::Wiggle(WiggleCommand::PushOutput(id)),
                |m| counts(m, id) == Some((inputs, outputs + 1)),
            )
            .await?;
            util::done(global, format!("Wiggle {id} now has {} outputs", outputs + 1));
            Ok(())
        }

        WigglesCommand::PopOutput { id } => {
            let (inputs, outputs) = counts(&mirror, id).ok_or_else(|| not_found(id))?;
            let Some(after) = outputs.checked_sub(1) else {
                return Err(CliError::Validation {
                    field: "outputs".into(),
                    reason: format!("wiggle {id} has no outputs"),
                });
            };
            util::send_and_confirm(
                controller,
                CoreCommand::Wiggle(WiggleCommand::PopOutput(id)),
                |m| counts(m, id) == Some((inputs, after)),
            )
            .await?;
            util::done(global, format!("Wiggle {id} now has {after} outputs"));
            Ok(())
        }

        WigglesCommand::SetClock { id, clock } => {
            require(&mirror, id)?;
            if let Some(clock) = clock {
                if mirror.clocks().get(&clock).is_none() {
                    return Err(CliError::NotFound {
                        resource_type: "clock".into(),
                        identifier: clock.to_string(),
                        list_command: "clocks list".into(),
                    });
                }
            }
            util::send_and_confirm(
                controller,
                CoreCommand::Wiggle(WiggleCommand::SetClock(id, clock)),
                |m| m.wiggles().get(&id).is_some_and(|w| w.clock.clock() == clock),
            )
            .await?;
            match clock {
                Some(clock) => util::done(global, format!("Wiggle {id} follows clock {clock}")),
                None => util::done(global, format!("Wiggle {id} detached from its clock")),
            }
            Ok(())
        }
    }
}

fn not_found(id: WiggleId) -> CliError {
    CliError::NotFound {
        resource_type: "wiggle".into(),
        identifier: id.to_string(),
        list_command: "wiggles list".into(),
    }
}
