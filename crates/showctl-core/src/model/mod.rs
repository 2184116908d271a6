// ── Domain model ──
//
// Canonical types mirrored from the show server. Every collection entry
// is one of these, keyed by one of the address types.

pub mod address;
pub mod clock;
pub mod knob;
pub mod patch;
pub mod wiggle;

pub use address::{
    Address, ClockId, FixtureId, GlobalAddress, KnobAddress, KnobOwner, WiggleId, WiggleOutput,
};
pub use clock::ClockDescription;
pub use knob::{
    Knob, KnobDatatype, KnobDescription, KnobEdit, KnobKind, KnobValue, NumericRange,
    WigglePolarity,
};
pub use patch::{FixtureKind, PatchItem, PatchRequest, UniverseStatus};
pub use wiggle::{UsesClock, WiggleDescription};

/// Entities that carry a user-visible name.
pub trait Named {
    fn name(&self) -> &str;
    fn set_name(&mut self, name: String);
}

/// Entities with positional input slots that can be connected to a target
/// or left disconnected.
pub trait HasInputs {
    type Target: Clone + std::fmt::Debug;

    fn inputs(&self) -> &[Option<Self::Target>];
    fn inputs_mut(&mut self) -> &mut Vec<Option<Self::Target>>;
}
