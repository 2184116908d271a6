use serde::{Deserialize, Serialize};

use super::{ClockId, HasInputs, Named};

/// A timing source on the server.
///
/// Each input slot may be driven by another clock's output or left
/// disconnected. Inputs are positional; the server decides how many exist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClockDescription {
    pub name: String,
    pub kind: String,
    #[serde(default)]
    pub inputs: Vec<Option<ClockId>>,
}

impl Named for ClockDescription {
    fn name(&self) -> &str {
        &self.name
    }

    fn set_name(&mut self, name: String) {
        self.name = name;
    }
}

impl HasInputs for ClockDescription {
    type Target = ClockId;

    fn inputs(&self) -> &[Option<ClockId>] {
        &self.inputs
    }

    fn inputs_mut(&mut self) -> &mut Vec<Option<ClockId>> {
        &mut self.inputs
    }
}
