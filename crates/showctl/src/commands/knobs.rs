//! Knob command handlers.

use serde::Serialize;
use tabled::Tabled;

use showctl_core::{
    Controller, Knob, KnobAddress, KnobDatatype, KnobEdit, KnobFilter, KnobKind, KnobOwner,
    KnobValue, Mirror,
};

use crate::cli::{GlobalOpts, KnobsArgs, KnobsCommand};
use crate::error::CliError;
use crate::output;

use super::util;

// ── Table row ───────────────────────────────────────────────────────

/// A knob as shown to the operator, with its owner's name resolved.
#[derive(Serialize)]
pub(super) struct KnobEntry {
    pub address: KnobAddress,
    pub owner: String,
    pub slot: usize,
    pub name: String,
    pub kind: KnobKind,
    pub value: KnobValue,
}

impl KnobEntry {
    pub fn new(mirror: &Mirror, address: KnobAddress, knob: &Knob) -> Self {
        Self {
            address,
            owner: mirror
                .knob_owner_name(&address)
                .map_or_else(|| address.owner().to_string(), str::to_owned),
            slot: address.slot(),
            name: knob.description.name.clone(),
            kind: knob.kind(),
            value: knob.value.clone(),
        }
    }
}

#[derive(Tabled)]
struct KnobRow {
    #[tabled(rename = "Owner")]
    owner: String,
    #[tabled(rename = "Slot")]
    slot: usize,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Kind")]
    kind: String,
    #[tabled(rename = "Value")]
    value: String,
}

impl From<&KnobEntry> for KnobRow {
    fn from(k: &KnobEntry) -> Self {
        Self {
            owner: format!("{} ({})", k.owner, k.address.owner()),
            slot: k.slot,
            name: k.name.clone(),
            kind: k.kind.to_string(),
            value: k.value.to_string(),
        }
    }
}

// ── Value parsing ───────────────────────────────────────────────────

/// Turn operator text into the widget edit this knob understands.
fn parse_edit(knob: &Knob, raw: &str) -> Result<KnobEdit, CliError> {
    let invalid = |reason: String| CliError::Validation {
        field: "value".into(),
        reason,
    };
    match &knob.description.datatype {
        KnobDatatype::Button => match raw.trim().to_ascii_lowercase().as_str() {
            "on" | "true" | "1" | "press" => Ok(KnobEdit::Press(true)),
            "off" | "false" | "0" | "release" => Ok(KnobEdit::Press(false)),
            _ => Err(invalid(format!("'{raw}' is not on or off"))),
        },
        KnobDatatype::Picker(options) => options
            .iter()
            .find(|o| o.eq_ignore_ascii_case(raw.trim()))
            .map(|o| KnobEdit::Select(o.clone()))
            .ok_or_else(|| {
                let choices: Vec<&str> = options.iter().map(String::as_str).collect();
                invalid(format!("expected one of: {}", choices.join(", ")))
            }),
        KnobDatatype::Rate | KnobDatatype::UFloat | KnobDatatype::Wiggle(_) => raw
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|x| x.is_finite())
            .map(KnobEdit::Drag)
            .ok_or_else(|| invalid(format!("'{raw}' is not a number"))),
    }
}

fn knob_address(owner: KnobOwner, slot: usize) -> KnobAddress {
    match owner {
        KnobOwner::Clock(id) => KnobAddress::Clock(id, slot),
        KnobOwner::Wiggle(id) => KnobAddress::Wiggle(id, slot),
    }
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(
    controller: &Controller,
    args: KnobsArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match args.command {
        KnobsCommand::List { owner, kind } => {
            let mut filters = Vec::new();
            if let Some(owner) = owner {
                filters.push(KnobFilter::ByOwner(util::parse_knob_owner(&owner)?));
            }
            if let Some(kind) = kind {
                filters.push(KnobFilter::ByKind(kind));
            }

            let mirror = controller.mirror();
            let entries: Vec<KnobEntry> = mirror
                .knobs()
                .entries()
                .iter()
                .filter(|(address, knob)| filters.iter().all(|f| f.matches(address, knob)))
                .map(|(address, knob)| KnobEntry::new(&mirror, *address, knob))
                .collect();

            let out = output::render_list(
                &global.output,
                &entries,
                |k| KnobRow::from(k),
                |k| k.address.to_string(),
            );
            output::print_output(&out, global.quiet);
            Ok(())
        }

        KnobsCommand::Set { owner, slot, value } => {
            let address = knob_address(util::parse_knob_owner(&owner)?, slot);
            let edit = {
                let mirror = controller.mirror();
                let knob = mirror.knobs().get(&address).ok_or_else(|| CliError::NotFound {
                    resource_type: "knob".into(),
                    identifier: address.to_string(),
                    list_command: format!("knobs list --owner {owner}"),
                })?;
                parse_edit(knob, &value)?
            };

            controller.edit_knob(address, edit).await?;

            let mirror = controller.mirror();
            if let Some(knob) = mirror.knobs().get(&address) {
                util::done(
                    global,
                    format!("{} {} = {}", address, knob.description.name, knob.value),
                );
            }
            Ok(())
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use showctl_core::{ClockId, KnobDescription};

    fn knob(datatype: KnobDatatype) -> Knob {
        Knob::new(KnobDescription {
            name: "test".into(),
            datatype,
        })
    }

    #[test]
    fn buttons_take_on_and_off() {
        let button = knob(KnobDatatype::Button);
        assert_eq!(parse_edit(&button, "ON").unwrap(), KnobEdit::Press(true));
        assert_eq!(parse_edit(&button, "release").unwrap(), KnobEdit::Press(false));
        assert!(parse_edit(&button, "maybe").is_err());
    }

    #[test]
    fn pickers_match_options_case_insensitively() {
        let picker = knob(KnobDatatype::Picker(
            ["Sine", "Square"].into_iter().map(String::from).collect(),
        ));
        assert_eq!(
            parse_edit(&picker, "square").unwrap(),
            KnobEdit::Select("Square".into())
        );
        let err = parse_edit(&picker, "Saw").unwrap_err();
        assert!(matches!(
            err,
            CliError::Validation { ref reason, .. } if reason.contains("Sine, Square")
        ));
    }

    #[test]
    fn numeric_knobs_take_finite_numbers() {
        let rate = knob(KnobDatatype::Rate);
        assert_eq!(parse_edit(&rate, " 2.5 ").unwrap(), KnobEdit::Drag(2.5));
        assert!(parse_edit(&rate, "NaN").is_err());
        assert!(parse_edit(&rate, "fast").is_err());
    }

    #[test]
    fn owner_and_slot_make_the_address() {
        let owner = KnobOwner::Clock(ClockId::new(0, 1));
        assert_eq!(
            knob_address(owner, 2),
            KnobAddress::Clock(ClockId::new(0, 1), 2)
        );
    }
}
