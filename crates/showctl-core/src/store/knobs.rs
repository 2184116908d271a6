use tracing::debug;

use super::collection::EntityCollection;
use crate::error::CoreError;
use crate::model::{Knob, KnobAddress, KnobEdit, KnobOwner, KnobValue};
use crate::protocol::{Command, KnobCommand, KnobResponse};

/// Mirrored knobs, keyed by owner and slot.
#[derive(Debug, Clone, PartialEq)]
pub struct KnobStore {
    entries: EntityCollection<KnobAddress, Knob>,
}

impl Default for KnobStore {
    fn default() -> Self {
        Self {
            entries: EntityCollection::new("knob"),
        }
    }
}

impl KnobStore {
    pub fn apply(&mut self, response: KnobResponse) -> Result<(), CoreError> {
        match response {
            KnobResponse::Added(address, knob) => {
                self.entries.upsert(address, knob);
            }
            KnobResponse::Removed(address) => {
                self.entries.remove(&address);
            }
            KnobResponse::ValueChange(address, value) => {
                self.entries.update(&address, |knob| {
                    if knob.accepts(&value) {
                        Ok(knob.with_value(value))
                    } else {
                        Err(CoreError::DatatypeMismatch {
                            address: address.to_string(),
                            expected: knob.kind(),
                            got: value.kind(),
                        })
                    }
                })?;
            }
            KnobResponse::State(entries) => {
                debug!(count = entries.len(), "knob state replaced");
                self.entries.replace_all(entries);
            }
        }
        Ok(())
    }

    /// Apply an edit from the knob's own widget and return the command
    /// that tells everyone else.
    ///
    /// The edit is shaped by the knob's datatype, so there is no tag
    /// check; an edit from the wrong widget family is still refused.
    pub fn edit(&mut self, address: KnobAddress, edit: KnobEdit) -> Result<Command, CoreError> {
        let mut sent: Option<KnobValue> = None;
        self.entries.update(&address, |knob| {
            let value = knob
                .value_for_edit(edit)
                .ok_or_else(|| CoreError::EditMismatch {
                    address: address.to_string(),
                    datatype: knob.kind(),
                })?;
            sent = Some(value.clone());
            Ok(knob.with_value(value))
        })?;

        let value = sent.ok_or_else(|| CoreError::UnknownAddress {
            collection: self.entries.label(),
            address: address.to_string(),
        })?;
        Ok(Command::Knob(KnobCommand::Set(address, value)))
    }

    pub fn entries(&self) -> &EntityCollection<KnobAddress, Knob> {
        &self.entries
    }

    pub fn get(&self, address: &KnobAddress) -> Option<&Knob> {
        self.entries.get(address)
    }

    /// Every knob exposed by `owner`, in slot order.
    pub fn owned_by(&self, owner: KnobOwner) -> impl Iterator<Item = (&KnobAddress, &Knob)> {
        self.entries
            .iter()
            .filter(move |(address, _)| address.owner() == owner)
    }

    pub(crate) fn begin_resync(&mut self) {
        self.entries.begin_resync();
    }
}
