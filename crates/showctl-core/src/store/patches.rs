use tracing::debug;

use super::collection::EntityCollection;
use crate::error::CoreError;
use crate::model::{FixtureId, FixtureKind, PatchItem, UniverseStatus};
use crate::protocol::PatchResponse;

/// Mirrored fixtures plus the patching catalogues.
#[derive(Debug, Clone, PartialEq)]
pub struct PatchStore {
    entries: EntityCollection<FixtureId, PatchItem>,
    kinds: Vec<FixtureKind>,
    ports: Vec<String>,
    universes: Vec<UniverseStatus>,
    universes_version: u64,
}

impl Default for PatchStore {
    fn default() -> Self {
        Self {
            entries: EntityCollection::new("fixture"),
            kinds: Vec::new(),
            ports: Vec::new(),
            universes: Vec::new(),
            universes_version: 0,
        }
    }
}

impl PatchStore {
    pub fn apply(&mut self, response: PatchResponse) -> Result<(), CoreError> {
        match response {
            PatchResponse::Update(item) => {
                let id = item.id;
                self.entries.update(&id, move |_| Ok(item))?;
            }
            PatchResponse::Remove(id) => {
                self.entries.remove(&id);
            }
            PatchResponse::NewPatches(items) => {
                for item in items {
                    self.entries.upsert(item.id, item);
                }
            }
            PatchResponse::PatchState(items) => {
                debug!(count = items.len(), "patch state replaced");
                self.entries
                    .replace_all(items.into_iter().map(|item| (item.id, item)));
            }
            PatchResponse::Kinds(kinds) => self.kinds = kinds,
            PatchResponse::Ports(ports) => self.ports = ports,
            PatchResponse::Universes(universes) => {
                self.universes = universes;
                self.universes_version += 1;
            }
        }
        Ok(())
    }

    pub fn entries(&self) -> &EntityCollection<FixtureId, PatchItem> {
        &self.entries
    }

    pub fn get(&self, id: &FixtureId) -> Option<&PatchItem> {
        self.entries.get(id)
    }

    pub fn kinds(&self) -> &[FixtureKind] {
        &self.kinds
    }

    /// Look up a fixture kind by name.
    pub fn kind(&self, name: &str) -> Option<&FixtureKind> {
        self.kinds.iter().find(|k| k.name == name)
    }

    pub fn ports(&self) -> &[String] {
        &self.ports
    }

    pub fn universes(&self) -> &[UniverseStatus] {
        &self.universes
    }

    /// Number of universe listings received so far.
    pub fn universes_version(&self) -> u64 {
        self.universes_version
    }

    /// The universe entry for `universe`, if the server has listed it.
    pub fn universe(&self, universe: u32) -> Option<&UniverseStatus> {
        self.universes.iter().find(|s| s.universe == universe)
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
    use crate::model::GlobalAddress;

    fn par(id: u32, address: Option<u16>) -> PatchItem {
        PatchItem {
            id: FixtureId(id),
            name: format!("Par {id}"),
            kind: "Par64".into(),
            address: address.map(|address| GlobalAddress {
                universe: 0,
                address,
            }),
            channel_count: 4,
        }
    }

    #[test]
    fn new_patches_then_update_and_remove() {
        let mut store = PatchStore::default();
        store
            .apply(PatchResponse::NewPatches(vec![par(1, Some(1)), par(2, Some(5))]))
            .unwrap();
        assert_eq!(store.entries().len(), 2);

        let mut moved = par(2, None);
        moved.name = "Spare".into();
        store.apply(PatchResponse::Update(moved.clone())).unwrap();
        assert_eq!(store.get(&FixtureId(2)), Some(&moved));

        store.apply(PatchResponse::Remove(FixtureId(1))).unwrap();
        store.apply(PatchResponse::Remove(FixtureId(1))).unwrap();
        assert_eq!(store.entries().len(), 1);
    }

    #[test]
    fn update_of_unknown_fixture_is_a_diagnostic() {
        let mut store = PatchStore::default();
        let err = store.apply(PatchResponse::Update(par(7, None))).unwrap_err();
        assert!(matches!(
            err,
            CoreError::UnknownAddress {
                collection: "fixture",
                ..
            }
        ));
        assert!(store.entries().is_empty());
    }

    #[test]
    fn catalogues_are_replaced_wholesale() {
        let mut store = PatchStore::default();
        store
            .apply(PatchResponse::Kinds(vec![FixtureKind {
                name: "Par64".into(),
                channel_count: 4,
            }]))
            .unwrap();
        store
            .apply(PatchResponse::Ports(vec!["enttec-1".into()]))
            .unwrap();
        store
            .apply(PatchResponse::Universes(vec![UniverseStatus {
                universe: 0,
                port: Some("enttec-1".into()),
            }]))
            .unwrap();

        assert_eq!(store.kind("Par64").map(|k| k.channel_count), Some(4));
        assert!(store.kind("Moving head").is_none());
        assert_eq!(store.ports(), ["enttec-1"]);
        assert_eq!(store.universes().len(), 1);
        assert_eq!(store.universes_version(), 1);
        assert_eq!(
            store.universe(0).and_then(|s| s.port.as_deref()),
            Some("enttec-1")
        );
        assert!(store.universe(3).is_none());
    }
}
