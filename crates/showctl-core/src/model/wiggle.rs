use serde::{Deserialize, Serialize};

use super::{ClockId, HasInputs, Named, WiggleOutput};

/// Whether a wiggle is driven by a clock.
///
/// `Yes(None)` means the wiggle wants a clock but none is assigned yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum UsesClock {
    #[default]
    No,
    Yes(Option<ClockId>),
}

impl UsesClock {
    /// The assigned clock, if any.
    pub fn clock(&self) -> Option<ClockId> {
        match *self {
            Self::No | Self::Yes(None) => None,
            Self::Yes(Some(id)) => Some(id),
        }
    }
}

/// A modulation generator on the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WiggleDescription {
    pub name: String,
    pub kind: String,
    #[serde(default)]
    pub inputs: Vec<Option<WiggleOutput>>,
    /// Number of exposed output ports.
    pub outputs: usize,
    #[serde(default)]
    pub clock: UsesClock,
}

impl Named for WiggleDescription {
    fn name(&self) -> &str {
        &self.name
    }

    fn set_name(&mut self, name: String) {
        self.name = name;
    }
}

impl HasInputs for WiggleDescription {
    type Target = WiggleOutput;

    fn inputs(&self) -> &[Option<WiggleOutput>] {
        &self.inputs
    }

    fn inputs_mut(&mut self) -> &mut Vec<Option<WiggleOutput>> {
        &mut self.inputs
    }
}
