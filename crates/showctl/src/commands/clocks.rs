//! Clock command handlers.

use serde::Serialize;
use tabled::Tabled;

use showctl_core::protocol::ClockCommand;
use showctl_core::{
    ClockDescription, ClockId, Command as CoreCommand, Controller, KnobOwner, Mirror,
};

use crate::cli::{ClocksArgs, ClocksCommand, GlobalOpts};
use crate::error::CliError;
use crate::output;

use super::knobs::KnobEntry;
use super::util;

// ── Table row ───────────────────────────────────────────────────────

#[derive(Serialize)]
struct ClockEntry {
    id: ClockId,
    #[serde(flatten)]
    description: ClockDescription,
}

#[derive(Tabled)]
struct ClockRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Class")]
    class: String,
    #[tabled(rename = "Inputs")]
    inputs: String,
}

impl From<&ClockEntry> for ClockRow {
    fn from(c: &ClockEntry) -> Self {
        Self {
            id: c.id.to_string(),
            name: c.description.name.clone(),
            class: c.description.kind.clone(),
            inputs: format_inputs(&c.description.inputs),
        }
    }
}

fn format_inputs(inputs: &[Option<ClockId>]) -> String {
    inputs
        .iter()
        .map(|i| util::or_dash(i.as_ref()))
        .collect::<Vec<_>>()
        .join(", ")
}

#[derive(Serialize)]
struct ClockDetail {
    #[serde(flatten)]
    clock: ClockEntry,
    knobs: Vec<KnobEntry>,
}

fn detail(d: &ClockDetail, mirror: &Mirror) -> String {
    use std::fmt::Write;
    let mut out = String::new();
    let c = &d.clock.description;
    let _ = writeln!(out, "Clock {}  {}", d.clock.id, c.name);
    let _ = writeln!(out, "  class:  {}", c.kind);
    for (slot, input) in c.inputs.iter().enumerate() {
        let source = input.map_or_else(
            || "(disconnected)".to_owned(),
            |id| match mirror.clock_input_source(&d.clock.id, slot) {
                Some((_, source)) => format!("{id} {}", source.name),
                None => format!("{id} (missing)"),
            },
        );
        let _ = writeln!(out, "  input {slot}: {source}");
    }
    for knob in &d.knobs {
        let _ = writeln!(out, "  knob {}: {} = {}", knob.slot, knob.name, knob.value);
    }
    out.trim_end().to_owned()
}

fn require(mirror: &Mirror, id: ClockId) -> Result<&ClockDescription, CliError> {
    mirror.clocks().get(&id).ok_or_else(|| CliError::NotFound {
        resource_type: "clock".into(),
        identifier: id.to_string(),
        list_command: "clocks list".into(),
    })
}

fn input_count(mirror: &Mirror, id: ClockId) -> Option<usize> {
    mirror.clocks().get(&id).map(|c| c.inputs.len())
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(
    controller: &Controller,
    args: ClocksArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let mirror = controller.mirror();

    match args.command {
        ClocksCommand::List => {
            let entries: Vec<ClockEntry> = controller
                .clocks_snapshot()
                .into_iter()
                .map(|(id, description)| ClockEntry { id, description })
                .collect();
            let out = output::render_list(&global.output, &entries, |c| ClockRow::from(c), |c| {
                c.id.to_string()
            });
            output::print_output(&out, global.quiet);
            Ok(())
        }

        ClocksCommand::Get { id } => {
            let description = require(&mirror, id)?.clone();
            let knobs = mirror
                .knobs_owned_by(KnobOwner::Clock(id))
                .map(|(address, knob)| KnobEntry::new(&mirror, *address, knob))
                .collect();
            let data = ClockDetail {
                clock: ClockEntry { id, description },
                knobs,
            };
            let out = output::render_single(
                &global.output,
                &data,
                |d| detail(d, &mirror),
                |d| d.clock.id.to_string(),
            );
            output::print_output(&out, global.quiet);
            Ok(())
        }

        ClocksCommand::Classes => {
            let classes = mirror.clocks().classes().to_vec();
            let out = output::render_single(
                &global.output,
                &classes,
                |c| c.join("\n"),
                |c| c.join("\n"),
            );
            output::print_output(&out, global.quiet);
            Ok(())
        }

        ClocksCommand::Create { class } => {
            if !mirror.clocks().classes().iter().any(|c| *c == class) {
                return Err(CliError::NotFound {
                    resource_type: "clock class".into(),
                    identifier: class,
                    list_command: "clocks classes".into(),
                });
            }
            let before = mirror.clocks().entries().len();
            util::send_and_confirm(
                controller,
                CoreCommand::Clock(ClockCommand::Create(class.clone())),
                |m| m.clocks().entries().len() > before,
            )
            .await?;
            util::done(global, format!("Clock created ({class})"));
            Ok(())
        }

        ClocksCommand::Rename { id, name } => {
            require(&mirror, id)?;
            let expected = name.clone();
            util::send_and_confirm(
                controller,
                CoreCommand::Clock(ClockCommand::Rename(id, name)),
                |m| m.clocks().get(&id).is_some_and(|c| c.name == expected),
            )
            .await?;
            util::done(global, format!("Clock {id} renamed to '{expected}'"));
            Ok(())
        }

        ClocksCommand::Remove { id } => {
            let name = require(&mirror, id)?.name.clone();
            if !util::confirm(&format!("Delete clock '{name}' ({id})?"), global.yes)? {
                return Ok(());
            }
            util::send_and_confirm(
                controller,
                CoreCommand::Clock(ClockCommand::Remove(id)),
                |m| m.clocks().get(&id).is_none(),
            )
            .await?;
            util::done(global, format!("Clock {id} deleted"));
            Ok(())
        }

        ClocksCommand::SetInput { id, slot, source } => {
            let inputs = require(&mirror, id)?.inputs.len();
            if slot >= inputs {
                return Err(CliError::Validation {
                    field: "slot".into(),
                    reason: format!("clock {id} has {inputs} inputs"),
                });
            }
            if let Some(source) = source {
                require(&mirror, source)?;
            }
            util::send_and_confirm(
                controller,
                CoreCommand::Clock(ClockCommand::SetInput(id, slot, source)),
                |m| {
                    m.clocks()
                        .get(&id)
                        .and_then(|c| c.inputs.get(slot).copied())
                        == Some(source)
                },
            )
            .await?;
            util::done(global, format!("Clock {id} input {slot} set"));
            Ok(())
        }

        ClocksCommand::PushInput { id } => {
            let before = require(&mirror, id)?.inputs.len();
            util::send_and_confirm(
                controller,
                CoreCommand::Clock(ClockCommand::PushInput(id)),
                |m| input_count(m, id) == Some(before + 1),
            )
            .await?;
            util::done(global, format!("Clock {id} now has {} inputs", before + 1));
            Ok(())
        }

        ClocksCommand::PopInput { id } => {
            let before = require(&mirror, id)?.inputs.len();
            let Some(after) = before.checked_sub(1) else {
                return Err(CliError::Validation {
                    field: "inputs".into(),
                    reason: format!("clock {id} has no inputs"),
                });
            };
            util::send_and_confirm(
                controller,
                CoreCommand::Clock(ClockCommand::PopInput(id)),
                |m| input_count(m, id) == Some(after),
            )
            .await?;
            util::done(global, format!("Clock {id} now has {after} inputs"));
            Ok(())
        }
    }
}
