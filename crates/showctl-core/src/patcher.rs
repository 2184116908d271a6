// ── Fixture patching form ──
//
// Collects the fields needed to patch one or more fixtures, validates
// them together, and produces the `NewPatches` command. A successful
// submit pre-fills the address of the next batch.

use thiserror::Error;

use crate::dmx::{self, DmxError};
use crate::input::{
    CellMsg, IdSource, ValidatedInput, parse_optional_dmx_address, parse_optional_universe,
    parse_positive_int,
};
use crate::model::{FixtureKind, GlobalAddress};
use crate::protocol::{Command, PatchCommand};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormError {
    #[error("{field}: '{raw}' is not valid ({reason})")]
    InvalidField {
        field: String,
        raw: String,
        reason: String,
    },

    #[error("Choose a fixture type first")]
    NoKind,

    #[error("Unknown fixture type '{0}'")]
    UnknownKind(String),

    #[error(transparent)]
    Dmx(#[from] DmxError),
}

/// Which cell a message is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatchField {
    Name,
    Quantity,
    Universe,
    Address,
}

#[derive(Debug, Clone)]
pub struct PatchForm {
    name: ValidatedInput<String>,
    kind: Option<String>,
    quantity: ValidatedInput<i64>,
    universe: ValidatedInput<Option<u32>>,
    address: ValidatedInput<Option<u16>>,
}

impl Default for PatchForm {
    fn default() -> Self {
        Self::new()
    }
}

impl PatchForm {
    pub fn new() -> Self {
        let mut ids = IdSource::new("patch");
        Self {
            name: ValidatedInput::new("Name", parse_label, "").with_id(ids.next_id()),
            kind: None,
            quantity: ValidatedInput::new("Quantity", parse_positive_int, "1")
                .with_id(ids.next_id()),
            universe: ValidatedInput::new("Universe", parse_optional_universe, "")
                .with_id(ids.next_id()),
            address: ValidatedInput::new("Address", parse_optional_dmx_address, "")
                .with_id(ids.next_id()),
        }
    }

    pub fn update(&mut self, field: PatchField, msg: CellMsg) {
        match field {
            PatchField::Name => self.name.update(msg),
            PatchField::Quantity => self.quantity.update(msg),
            PatchField::Universe => self.universe.update(msg),
            PatchField::Address => self.address.update(msg),
        }
    }

    pub fn select_kind(&mut self, kind: impl Into<String>) {
        self.kind = Some(kind.into());
    }

    pub fn kind(&self) -> Option<&str> {
        self.kind.as_deref()
    }

    pub fn name(&self) -> &ValidatedInput<String> {
        &self.name
    }

    pub fn quantity(&self) -> &ValidatedInput<i64> {
        &self.quantity
    }

    pub fn universe(&self) -> &ValidatedInput<Option<u32>> {
        &self.universe
    }

    pub fn address(&self) -> &ValidatedInput<Option<u16>> {
        &self.address
    }

    /// True when no cell holds a failed edit and a kind is chosen.
    pub fn can_submit(&self) -> bool {
        self.kind.is_some()
            && self.name.is_ok()
            && self.quantity.is_ok()
            && self.universe.is_ok()
            && self.address.is_ok()
    }

    /// Validate everything and build the patch command.
    ///
    /// On success the address cell advances past the fixtures just placed
    /// so the next batch lands right after them.
    pub fn submit(&mut self, kinds: &[FixtureKind]) -> Result<Command, FormError> {
        check(&self.name)?;
        check(&self.quantity)?;
        check(&self.universe)?;
        check(&self.address)?;

        let kind_name = self.kind.as_deref().ok_or(FormError::NoKind)?;
        let kind = kinds
            .iter()
            .find(|k| k.name == kind_name)
            .ok_or_else(|| FormError::UnknownKind(kind_name.to_owned()))?;

        let quantity = self.quantity.parsed_value_or(1);
        let start = dmx::global_address_from_optionals(
            self.universe.parsed().copied().flatten().map(i64::from),
            self.address.parsed().copied().flatten().map(i64::from),
        )?;
        let name = self.name.parsed().map_or("", String::as_str);
        let requests = dmx::sequential_placement(name, kind, quantity, start)?;

        if let Some(start) = start {
            let placed = u32::try_from(requests.len()).unwrap_or(u32::MAX);
            let GlobalAddress { address, .. } = dmx::advance_address(start, placed, kind);
            self.address.set_parsed(Some(address));
        }

        Ok(Command::Patch(PatchCommand::NewPatches(requests)))
    }
}

/// Fixture names may be blank; placement falls back to the kind's name.
fn parse_label(text: &str) -> Result<String, String> {
    Ok(text.trim().to_owned())
}

fn check<T>(cell: &ValidatedInput<T>) -> Result<(), FormError> {
    match cell.value() {
        Some(Err(raw)) => Err(FormError::InvalidField {
            field: cell.label().to_owned(),
            raw: raw.clone(),
            reason: cell.error_message().unwrap_or("invalid").to_owned(),
        }),
        _ => Ok(()),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::model::PatchRequest;

    fn kinds() -> Vec<FixtureKind> {
        vec![FixtureKind {
            name: "Par64".into(),
            channel_count: 4,
        }]
    }

    fn form(name: &str, qty: &str, universe: &str, address: &str) -> PatchForm {
        let mut form = PatchForm::new();
        form.select_kind("Par64");
        form.update(PatchField::Name, CellMsg::Update(name.into()));
        form.update(PatchField::Quantity, CellMsg::Update(qty.into()));
        form.update(PatchField::Universe, CellMsg::Update(universe.into()));
        form.update(PatchField::Address, CellMsg::Update(address.into()));
        form
    }

    #[test]
    fn submit_places_and_advances() {
        let mut form = form("Par", "3", "1", "10");
        let cmd = form.submit(&kinds()).unwrap();

        let Command::Patch(PatchCommand::NewPatches(requests)) = cmd else {
            panic!("expected NewPatches");
        };
        let addresses: Vec<_> = requests.iter().map(|r| r.address.unwrap().address).collect();
        assert_eq!(addresses, vec![10, 14, 18]);
        assert_eq!(form.address().parsed(), Some(&Some(22)));
    }

    #[test]
    fn unpatched_single_fixture_uses_kind_name() {
        let mut form = form("", "1", "", "");
        let cmd = form.submit(&kinds()).unwrap();
        assert_eq!(
            cmd,
            Command::Patch(PatchCommand::NewPatches(vec![PatchRequest {
                name: "Par64".into(),
                kind: "Par64".into(),
                address: None,
            }]))
        );
        assert_eq!(form.address().parsed(), Some(&None));
    }

    #[test]
    fn bad_cell_blocks_submit() {
        let mut form = form("Par", "abc", "1", "10");
        assert!(!form.can_submit());
        let err = form.submit(&kinds()).unwrap_err();
        assert!(matches!(
            err,
            FormError::InvalidField { ref field, ref raw, .. }
                if field == "Quantity" && raw == "abc"
        ));
    }

    #[test]
    fn half_address_is_rejected() {
        let mut form = form("Par", "1", "1", "");
        assert_eq!(
            form.submit(&kinds()),
            Err(FormError::Dmx(DmxError::PartialAddress))
        );
    }

    #[test]
    fn kind_must_be_known() {
        let mut form = PatchForm::new();
        assert_eq!(form.submit(&kinds()), Err(FormError::NoKind));
        form.select_kind("Moving head");
        assert_eq!(
            form.submit(&kinds()),
            Err(FormError::UnknownKind("Moving head".into()))
        );
    }

    #[test]
    fn cells_get_distinct_ids() {
        let form = PatchForm::new();
        let ids = [
            form.name().id().unwrap().as_str(),
            form.quantity().id().unwrap().as_str(),
            form.universe().id().unwrap().as_str(),
            form.address().id().unwrap().as_str(),
        ];
        assert_eq!(ids, ["patch-0", "patch-1", "patch-2", "patch-3"]);
    }
}
