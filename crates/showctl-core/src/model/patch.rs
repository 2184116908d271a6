use serde::{Deserialize, Serialize};

use super::{FixtureId, GlobalAddress, Named};

/// A fixture patched into the show.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatchItem {
    pub id: FixtureId,
    pub name: String,
    pub kind: String,
    /// `None` when the fixture is not bound to any DMX channels.
    pub address: Option<GlobalAddress>,
    pub channel_count: u32,
}

impl PatchItem {
    pub fn is_patched(&self) -> bool {
        self.address.is_some()
    }
}

impl Named for PatchItem {
    fn name(&self) -> &str {
        &self.name
    }

    fn set_name(&mut self, name: String) {
        self.name = name;
    }
}

/// A fixture type the server knows how to patch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FixtureKind {
    pub name: String,
    pub channel_count: u32,
}

/// Request to patch one new fixture.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatchRequest {
    pub name: String,
    pub kind: String,
    pub address: Option<GlobalAddress>,
}

/// A DMX universe and the output port it is attached to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UniverseStatus {
    pub universe: u32,
    pub port: Option<String>,
}
