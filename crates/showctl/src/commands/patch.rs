//! Fixture patching and universe command handlers.

use dialoguer::Select;
use tabled::Tabled;

use showctl_core::protocol::PatchCommand as Wire;
use showctl_core::{
    CellMsg, Command as CoreCommand, Controller, CoreError, FixtureId, FixtureKind, Mirror,
    PatchField, PatchFilter, PatchForm, PatchItem, UniverseStatus, dmx,
};

use crate::cli::{GlobalOpts, PatchArgs, PatchCommand};
use crate::error::CliError;
use crate::output;

use super::util;

// ── Table rows ──────────────────────────────────────────────────────

#[derive(Tabled)]
struct FixtureRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Type")]
    kind: String,
    #[tabled(rename = "Address")]
    address: String,
    #[tabled(rename = "Channels")]
    channels: u32,
}

impl From<&PatchItem> for FixtureRow {
    fn from(p: &PatchItem) -> Self {
        Self {
            id: p.id.to_string(),
            name: p.name.clone(),
            kind: p.kind.clone(),
            address: util::or_dash(p.address),
            channels: p.channel_count,
        }
    }
}

#[derive(Tabled)]
struct KindRow {
    #[tabled(rename = "Type")]
    name: String,
    #[tabled(rename = "Channels")]
    channels: u32,
}

#[derive(Tabled)]
struct UniverseRow {
    #[tabled(rename = "Universe")]
    universe: u32,
    #[tabled(rename = "Port")]
    port: String,
    #[tabled(rename = "Fixtures")]
    fixtures: usize,
}

fn universe_row(status: &UniverseStatus, mirror: &Mirror) -> UniverseRow {
    let filter = PatchFilter::InUniverse(status.universe);
    UniverseRow {
        universe: status.universe,
        port: util::or_dash(status.port.as_deref()),
        fixtures: mirror
            .patches()
            .entries()
            .values()
            .filter(|item| filter.matches(item))
            .count(),
    }
}

fn require(mirror: &Mirror, id: FixtureId) -> Result<&PatchItem, CliError> {
    mirror.patches().get(&id).ok_or_else(|| CliError::NotFound {
        resource_type: "fixture".into(),
        identifier: id.to_string(),
        list_command: "patch list".into(),
    })
}

/// A universe listing with one more universe than `before` has arrived.
fn universe_added(before: &Mirror) -> impl Fn(&Mirror) -> bool + use<> {
    let seen = before.patches().universes_version();
    let count = before.patches().universes().len();
    move |m| m.patches().universes_version() > seen && m.patches().universes().len() > count
}

/// A universe listing shows `universe` on `port`.
fn port_attached(
    before: &Mirror,
    universe: u32,
    port: Option<String>,
) -> impl Fn(&Mirror) -> bool + use<> {
    let seen = before.patches().universes_version();
    move |m| {
        m.patches().universes_version() > seen
            && m.patches().universe(universe).map(|s| &s.port) == Some(&port)
    }
}

/// Ask for a fixture type when none was given on the command line.
fn prompt_kind(kinds: &[FixtureKind]) -> Result<String, CliError> {
    if kinds.is_empty() {
        return Err(CliError::Validation {
            field: "kind".into(),
            reason: "the server offers no fixture types".into(),
        });
    }
    let labels: Vec<String> = kinds
        .iter()
        .map(|k| format!("{} ({} ch)", k.name, k.channel_count))
        .collect();
    let selection = Select::new()
        .with_prompt("Fixture type")
        .items(&labels)
        .default(0)
        .interact()
        .map_err(util::prompt_err)?;
    kinds
        .get(selection)
        .map(|k| k.name.clone())
        .ok_or_else(|| util::prompt_err("selection out of range"))
}

/// Fill the patch form from command-line text and build the command.
fn build_patch(
    form: &mut PatchForm,
    kind: String,
    name: String,
    quantity: String,
    universe: String,
    address: String,
    kinds: &[FixtureKind],
) -> Result<CoreCommand, CliError> {
    form.select_kind(kind);
    form.update(PatchField::Name, CellMsg::Update(name));
    form.update(PatchField::Quantity, CellMsg::Update(quantity));
    form.update(PatchField::Universe, CellMsg::Update(universe));
    form.update(PatchField::Address, CellMsg::Update(address));
    Ok(form.submit(kinds)?)
}

// ── Handler ─────────────────────────────────────────────────────────

#[allow(clippy::too_many_lines)]
pub async fn handle(
    controller: &Controller,
    args: PatchArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let mirror = controller.mirror();

    match args.command {
        PatchCommand::List {
            universe,
            unpatched,
            patched,
            kind,
        } => {
            let mut filters = Vec::new();
            if let Some(universe) = universe {
                filters.push(PatchFilter::InUniverse(universe));
            }
            if unpatched {
                filters.push(PatchFilter::Unpatched);
            }
            if patched {
                filters.push(PatchFilter::Patched);
            }
            if let Some(kind) = kind {
                filters.push(PatchFilter::ByKind(kind));
            }

            let mut items: Vec<PatchItem> = controller
                .patches_snapshot()
                .into_iter()
                .map(|(_, item)| item)
                .filter(|item| filters.iter().all(|f| f.matches(item)))
                .collect();
            items.sort_by_key(|item| (item.address.is_none(), item.address, item.id));

            let out = output::render_list(
                &global.output,
                &items,
                |p| FixtureRow::from(p),
                |p| p.id.to_string(),
            );
            output::print_output(&out, global.quiet);
            Ok(())
        }

        PatchCommand::Kinds => {
            let kinds = mirror.patches().kinds();
            let out = output::render_list(
                &global.output,
                kinds,
                |k| KindRow {
                    name: k.name.clone(),
                    channels: k.channel_count,
                },
                |k| k.name.clone(),
            );
            output::print_output(&out, global.quiet);
            Ok(())
        }

        PatchCommand::Add {
            kind,
            name,
            quantity,
            universe,
            address,
        } => {
            let kinds = mirror.patches().kinds();
            let kind = match kind {
                Some(kind) => kind,
                None => prompt_kind(kinds)?,
            };

            let mut form = PatchForm::new();
            let command = build_patch(&mut form, kind, name, quantity, universe, address, kinds)?;
            let count = match &command {
                CoreCommand::Patch(Wire::NewPatches(requests)) => requests.len(),
                _ => 0,
            };

            let before = mirror.patches().entries().len();
            util::send_and_confirm(controller, command, |m| {
                m.patches().entries().len() >= before + count
            })
            .await?;

            util::done(global, format!("Patched {count} fixture(s)"));
            if let Some(Some(next)) = form.address().parsed() {
                util::done(global, format!("Next free address: {next}"));
            }
            Ok(())
        }

        PatchCommand::Remove { id } => {
            let name = require(&mirror, id)?.name.clone();
            if !util::confirm(&format!("Delete fixture '{name}' ({id})?"), global.yes)? {
                return Ok(());
            }
            util::send_and_confirm(controller, CoreCommand::Patch(Wire::Remove(id)), |m| {
                m.patches().get(&id).is_none()
            })
            .await?;
            util::done(global, format!("Fixture {id} deleted"));
            Ok(())
        }

        PatchCommand::Rename { id, name } => {
            require(&mirror, id)?;
            let expected = name.clone();
            util::send_and_confirm(
                controller,
                CoreCommand::Patch(Wire::Rename(id, name)),
                |m| m.patches().get(&id).is_some_and(|p| p.name == expected),
            )
            .await?;
            util::done(global, format!("Fixture {id} renamed to '{expected}'"));
            Ok(())
        }

        PatchCommand::Repatch {
            id,
            universe,
            address,
        } => {
            let item = require(&mirror, id)?;
            let target =
                dmx::global_address_from_optionals(universe, address).map_err(CoreError::from)?;
            if target.is_none()
                && item.is_patched()
                && !util::confirm(&format!("Unpatch fixture '{}' ({id})?", item.name), global.yes)?
            {
                return Ok(());
            }
            util::send_and_confirm(
                controller,
                CoreCommand::Patch(Wire::Repatch(id, target)),
                |m| m.patches().get(&id).is_some_and(|p| p.address == target),
            )
            .await?;
            match target {
                Some(at) => util::done(global, format!("Fixture {id} moved to {at}")),
                None => util::done(global, format!("Fixture {id} unpatched")),
            }
            Ok(())
        }

        PatchCommand::Universes => {
            let out = output::render_list(
                &global.output,
                mirror.patches().universes(),
                |status| universe_row(status, &mirror),
                |status| status.universe.to_string(),
            );
            output::print_output(&out, global.quiet);
            Ok(())
        }

        PatchCommand::Ports => {
            let ports = mirror.patches().ports();
            let out = output::render_single(
                &global.output,
                &ports,
                |p| p.join("\n"),
                |p| p.join("\n"),
            );
            output::print_output(&out, global.quiet);
            Ok(())
        }

        PatchCommand::AddUniverse => {
            util::send_and_confirm(
                controller,
                CoreCommand::Patch(Wire::AddUniverse),
                universe_added(&mirror),
            )
            .await?;
            util::done(global, "Universe added");
            Ok(())
        }

        PatchCommand::RemoveUniverse { universe } => {
            let in_use = mirror
                .patches()
                .entries()
                .values()
                .filter(|item| PatchFilter::InUniverse(universe).matches(item))
                .count();
            let prompt = if in_use == 0 {
                format!("Remove universe {universe}?")
            } else {
                format!("Remove universe {universe}? {in_use} fixture(s) are patched to it.")
            };
            if !util::confirm(&prompt, global.yes)? {
                return Ok(());
            }
            util::send_and_confirm(
                controller,
                CoreCommand::Patch(Wire::RemoveUniverse(universe)),
                |m| !m.patches().universes().iter().any(|s| s.universe == universe),
            )
            .await?;
            util::done(global, format!("Universe {universe} removed"));
            Ok(())
        }

        PatchCommand::AttachPort { universe, port } => {
            if let Some(port) = &port {
                if !mirror.patches().ports().contains(port) {
                    return Err(CliError::NotFound {
                        resource_type: "port".into(),
                        identifier: port.clone(),
                        list_command: "patch ports".into(),
                    });
                }
            }
            let message = match &port {
                Some(port) => format!("Universe {universe} attached to {port}"),
                None => format!("Universe {universe} detached"),
            };
            let settled = port_attached(&mirror, universe, port.clone());
            util::send_and_confirm(
                controller,
                CoreCommand::Patch(Wire::AttachPort(universe, port)),
                settled,
            )
            .await?;
            util::done(global, message);
            Ok(())
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use showctl_core::{GlobalAddress, PatchRequest};

    fn kinds() -> Vec<FixtureKind> {
        vec![FixtureKind {
            name: "Par64".into(),
            channel_count: 4,
        }]
    }

    #[test]
    fn command_line_text_fills_the_form() {
        let mut form = PatchForm::new();
        let command = build_patch(
            &mut form,
            "Par64".into(),
            "Wash".into(),
            "2".into(),
            "1".into(),
            "1".into(),
            &kinds(),
        )
        .unwrap();

        let CoreCommand::Patch(Wire::NewPatches(requests)) = command else {
            panic!("expected NewPatches");
        };
        assert_eq!(
            requests,
            vec![
                PatchRequest {
                    name: "Wash 1".into(),
                    kind: "Par64".into(),
                    address: Some(GlobalAddress {
                        universe: 1,
                        address: 1,
                    }),
                },
                PatchRequest {
                    name: "Wash 2".into(),
                    kind: "Par64".into(),
                    address: Some(GlobalAddress {
                        universe: 1,
                        address: 5,
                    }),
                },
            ]
        );
        assert_eq!(form.address().parsed(), Some(&Some(9)));
    }

    #[test]
    fn bad_quantity_is_a_usage_error() {
        let mut form = PatchForm::new();
        let err = build_patch(
            &mut form,
            "Par64".into(),
            String::new(),
            "two".into(),
            String::new(),
            String::new(),
            &kinds(),
        )
        .unwrap_err();
        assert!(matches!(err, CliError::Validation { ref field, .. } if field == "quantity"));
    }

    #[test]
    fn unknown_kind_is_not_found() {
        let mut form = PatchForm::new();
        let err = build_patch(
            &mut form,
            "Fogger".into(),
            String::new(),
            "1".into(),
            String::new(),
            String::new(),
            &kinds(),
        )
        .unwrap_err();
        assert!(matches!(err, CliError::NotFound { .. }));
    }

    fn universes(list: &[(u32, Option<&str>)]) -> showctl_core::Response {
        showctl_core::Response::Patch(showctl_core::protocol::PatchResponse::Universes(
            list.iter()
                .map(|&(universe, port)| UniverseStatus {
                    universe,
                    port: port.map(String::from),
                })
                .collect(),
        ))
    }

    #[test]
    fn add_universe_waits_for_a_longer_listing() {
        let mut mirror = Mirror::new();
        mirror.apply(universes(&[(0, None)])).unwrap();
        let settled = universe_added(&mirror);

        mirror
            .apply(showctl_core::Response::Patch(
                showctl_core::protocol::PatchResponse::Ports(vec!["enttec-1".into()]),
            ))
            .unwrap();
        assert!(!settled(&mirror));
        mirror.apply(universes(&[(0, None)])).unwrap();
        assert!(!settled(&mirror));
        mirror.apply(universes(&[(0, None), (1, None)])).unwrap();
        assert!(settled(&mirror));
    }

    #[test]
    fn attach_port_waits_for_the_requested_port() {
        let mut mirror = Mirror::new();
        mirror.apply(universes(&[(0, Some("enttec-1"))])).unwrap();
        let settled = port_attached(&mirror, 0, Some("enttec-1".into()));
        assert!(!settled(&mirror));

        let settled = port_attached(&mirror, 0, Some("artnet-2".into()));
        mirror.apply(universes(&[(0, Some("enttec-1"))])).unwrap();
        assert!(!settled(&mirror));
        mirror.apply(universes(&[(0, Some("artnet-2"))])).unwrap();
        assert!(settled(&mirror));

        let detached = port_attached(&mirror, 0, None);
        mirror.apply(universes(&[(0, None)])).unwrap();
        assert!(detached(&mirror));
    }
}
