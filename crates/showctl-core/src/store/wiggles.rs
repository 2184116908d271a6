use tracing::debug;

use super::collection::EntityCollection;
use crate::error::CoreError;
use crate::model::{UsesClock, WiggleDescription, WiggleId};
use crate::protocol::WiggleResponse;

/// Mirrored wiggles plus the catalogue of wiggle kinds.
#[derive(Debug, Clone, PartialEq)]
pub struct WiggleStore {
    entries: EntityCollection<WiggleId, WiggleDescription>,
    kinds: Vec<String>,
}

impl Default for WiggleStore {
    fn default() -> Self {
        Self {
            entries: EntityCollection::new("wiggle"),
            kinds: Vec::new(),
        }
    }
}

impl WiggleStore {
    pub fn apply(&mut self, response: WiggleResponse) -> Result<(), CoreError> {
        match response {
            WiggleResponse::New(id, description) => {
                self.entries.upsert(id, description);
            }
            WiggleResponse::Removed(id) => {
                self.entries.remove(&id);
            }
            WiggleResponse::Renamed(id, name) => self.entries.rename(&id, name)?,
            WiggleResponse::SetInput(id, slot, source) => {
                self.entries.set_input(&id, slot, source)?;
            }
            WiggleResponse::PushInput(id) => self.entries.push_input(&id)?,
            WiggleResponse::PopInput(id) => self.entries.pop_input(&id)?,
            WiggleResponse::PushOutput(id) => self.entries.update(&id, |w| {
                Ok(WiggleDescription {
                    outputs: w.outputs + 1,
                    ..w.clone()
                })
            })?,
            WiggleResponse::PopOutput(id) => self.entries.update(&id, |w| {
                let outputs = w.outputs.checked_sub(1).ok_or_else(|| CoreError::NoOutputs {
                    address: id.to_string(),
                })?;
                Ok(WiggleDescription {
                    outputs,
                    ..w.clone()
                })
            })?,
            WiggleResponse::SetClock(id, clock) => self.entries.update(&id, |w| {
                Ok(WiggleDescription {
                    clock: UsesClock::Yes(clock),
                    ..w.clone()
                })
            })?,
            WiggleResponse::State(entries) => {
                debug!(count = entries.len(), "wiggle state replaced");
                self.entries.replace_all(entries);
            }
            WiggleResponse::Kinds(kinds) => self.kinds = kinds,
        }
        Ok(())
    }

    pub fn entries(&self) -> &EntityCollection<WiggleId, WiggleDescription> {
        &self.entries
    }

    pub fn get(&self, id: &WiggleId) -> Option<&WiggleDescription> {
        self.entries.get(id)
    }

    pub fn kinds(&self) -> &[String] {
        &self.kinds
    }

    pub(crate) fn begin_resync(&mut self) {
        self.entries.begin_resync();
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::model::{ClockId, WiggleOutput};

    fn lfo(outputs: usize) -> WiggleDescription {
        WiggleDescription {
            name: "LFO".into(),
            kind: "Sine".into(),
            inputs: vec![None],
            outputs,
            clock: UsesClock::No,
        }
    }

    #[test]
    fn outputs_floor_at_zero() {
        let mut store = WiggleStore::default();
        let id = WiggleId::new(0, 1);
        store.apply(WiggleResponse::New(id, lfo(1))).unwrap();

        store.apply(WiggleResponse::PopOutput(id)).unwrap();
        assert_eq!(store.get(&id).unwrap().outputs, 0);

        let err = store.apply(WiggleResponse::PopOutput(id)).unwrap_err();
        assert!(matches!(err, CoreError::NoOutputs { .. }));
        assert_eq!(store.get(&id).unwrap().outputs, 0);

        store.apply(WiggleResponse::PushOutput(id)).unwrap();
        store.apply(WiggleResponse::PushOutput(id)).unwrap();
        assert_eq!(store.get(&id).unwrap().outputs, 2);
    }

    #[test]
    fn set_clock_marks_wiggle_as_clocked() {
        let mut store = WiggleStore::default();
        let id = WiggleId::new(0, 1);
        store.apply(WiggleResponse::New(id, lfo(1))).unwrap();

        store.apply(WiggleResponse::SetClock(id, None)).unwrap();
        assert_eq!(store.get(&id).unwrap().clock, UsesClock::Yes(None));

        let clock = ClockId::new(0, 9);
        store.apply(WiggleResponse::SetClock(id, Some(clock))).unwrap();
        assert_eq!(store.get(&id).unwrap().clock.clock(), Some(clock));
    }

    #[test]
    fn input_wiring_targets_other_wiggle_outputs() {
        let mut store = WiggleStore::default();
        let id = WiggleId::new(0, 1);
        let source = WiggleOutput {
            wiggle: WiggleId::new(0, 2),
            output: 0,
        };
        store.apply(WiggleResponse::New(id, lfo(1))).unwrap();
        store
            .apply(WiggleResponse::SetInput(id, 0, Some(source)))
            .unwrap();
        assert_eq!(store.get(&id).unwrap().inputs, vec![Some(source)]);

        assert!(
            store
                .apply(WiggleResponse::SetInput(id, 1, None))
                .is_err()
        );
    }

    #[test]
    fn state_replaces_and_marks_synced() {
        let mut store = WiggleStore::default();
        store
            .apply(WiggleResponse::New(WiggleId::new(0, 7), lfo(1)))
            .unwrap();
        store
            .apply(WiggleResponse::State(vec![(WiggleId::new(0, 1), lfo(2))]))
            .unwrap();

        assert!(store.entries().is_synced());
        assert_eq!(store.entries().len(), 1);
        assert!(store.get(&WiggleId::new(0, 7)).is_none());
    }
}
