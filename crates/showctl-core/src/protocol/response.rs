// ── Inbound responses ──
//
// Every server message is exactly one of these. Each family is consumed
// by a single reducer; `Error` goes straight to the notice channel.

use serde::{Deserialize, Serialize};
use strum::Display;

use crate::model::{
    ClockDescription, ClockId, FixtureId, FixtureKind, Knob, KnobAddress, KnobValue, PatchItem,
    UniverseStatus, WiggleDescription, WiggleId, WiggleOutput,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Response {
    Clock(ClockResponse),
    Wiggle(WiggleResponse),
    Knob(KnobResponse),
    Patch(PatchResponse),
    Show(ShowResponse),
    /// A server-side failure the operator should see.
    Error(String),
}

impl Response {
    /// Family name used in logs.
    pub fn family(&self) -> &'static str {
        match self {
            Self::Clock(_) => "clock",
            Self::Wiggle(_) => "wiggle",
            Self::Knob(_) => "knob",
            Self::Patch(_) => "patch",
            Self::Show(_) => "show",
            Self::Error(_) => "error",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Display)]
pub enum ClockResponse {
    New(ClockId, ClockDescription),
    Removed(ClockId),
    Renamed(ClockId, String),
    SetInput(ClockId, usize, Option<ClockId>),
    PushInput(ClockId),
    PopInput(ClockId),
    State(Vec<(ClockId, ClockDescription)>),
    Classes(Vec<String>),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Display)]
pub enum WiggleResponse {
    New(WiggleId, WiggleDescription),
    Removed(WiggleId),
    Renamed(WiggleId, String),
    SetInput(WiggleId, usize, Option<WiggleOutput>),
    PushInput(WiggleId),
    PopInput(WiggleId),
    PushOutput(WiggleId),
    PopOutput(WiggleId),
    SetClock(WiggleId, Option<ClockId>),
    State(Vec<(WiggleId, WiggleDescription)>),
    Kinds(Vec<String>),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Display)]
pub enum KnobResponse {
    Added(KnobAddress, Knob),
    Removed(KnobAddress),
    ValueChange(KnobAddress, KnobValue),
    State(Vec<(KnobAddress, Knob)>),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Display)]
pub enum PatchResponse {
    /// Replace one fixture, keyed by its id.
    Update(PatchItem),
    Remove(FixtureId),
    NewPatches(Vec<PatchItem>),
    PatchState(Vec<PatchItem>),
    Kinds(Vec<FixtureKind>),
    Ports(Vec<String>),
    Universes(Vec<UniverseStatus>),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Display)]
pub enum ShowResponse {
    Saved,
    /// A different show replaced the whole patch graph.
    Loaded(String),
    Renamed(String),
    ShowName(String),
    ShowsAvailable(Vec<String>),
    SavesAvailable(Vec<String>),
    ShowLibErr(String),
    Quit,
}
