use tracing::debug;

use super::collection::EntityCollection;
use crate::error::CoreError;
use crate::model::{ClockDescription, ClockId};
use crate::protocol::ClockResponse;

/// Mirrored clocks plus the catalogue of clock classes.
#[derive(Debug, Clone, PartialEq)]
pub struct ClockStore {
    entries: EntityCollection<ClockId, ClockDescription>,
    classes: Vec<String>,
}

impl Default for ClockStore {
    fn default() -> Self {
        Self {
            entries: EntityCollection::new("clock"),
            classes: Vec::new(),
        }
    }
}

impl ClockStore {
    pub fn apply(&mut self, response: ClockResponse) -> Result<(), CoreError> {
        match response {
            ClockResponse::New(id, description) => {
                self.entries.upsert(id, description);
            }
            ClockResponse::Removed(id) => {
                self.entries.remove(&id);
            }
            ClockResponse::Renamed(id, name) => self.entries.rename(&id, name)?,
            ClockResponse::SetInput(id, slot, source) => {
                self.entries.set_input(&id, slot, source)?;
            }
            ClockResponse::PushInput(id) => self.entries.push_input(&id)?,
            ClockResponse::PopInput(id) => self.entries.pop_input(&id)?,
            ClockResponse::State(entries) => {
                debug!(count = entries.len(), "clock state replaced");
                self.entries.replace_all(entries);
            }
            ClockResponse::Classes(classes) => self.classes = classes,
        }
        Ok(())
    }

    pub fn entries(&self) -> &EntityCollection<ClockId, ClockDescription> {
        &self.entries
    }

    pub fn get(&self, id: &ClockId) -> Option<&ClockDescription> {
        self.entries.get(id)
    }

    pub fn classes(&self) -> &[String] {
        &self.classes
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

    fn main_clock() -> ClockDescription {
        ClockDescription {
            name: "Main".into(),
            kind: "Simple".into(),
            inputs: vec![None],
        }
    }

    #[test]
    fn clock_lifecycle() {
        let mut store = ClockStore::default();
        let id = ClockId::new(0, 1);

        store.apply(ClockResponse::New(id, main_clock())).unwrap();
        store
            .apply(ClockResponse::SetInput(id, 0, Some(ClockId::new(0, 2))))
            .unwrap();
        store.apply(ClockResponse::Renamed(id, "Tap".into())).unwrap();

        let clock = store.get(&id).unwrap();
        assert_eq!(clock.name, "Tap");
        assert_eq!(clock.inputs, vec![Some(ClockId::new(0, 2))]);

        store.apply(ClockResponse::Removed(id)).unwrap();
        assert!(store.entries().is_empty());
    }

    #[test]
    fn classes_are_catalogued() {
        let mut store = ClockStore::default();
        store
            .apply(ClockResponse::Classes(vec!["Simple".into(), "Tap".into()]))
            .unwrap();
        assert_eq!(store.classes(), ["Simple", "Tap"]);
    }

    #[test]
    fn rename_of_missing_clock_is_a_diagnostic() {
        let mut store = ClockStore::default();
        let err = store
            .apply(ClockResponse::Renamed(ClockId::new(5, 5), "x".into()))
            .unwrap_err();
        assert!(err.is_diagnostic());
        assert!(store.entries().is_empty());
    }
}
