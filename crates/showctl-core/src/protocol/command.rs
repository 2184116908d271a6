// ── Outbound commands ──
//
// One closed enum per collection. The envelope carries the response
// filter that tells the server who should hear about the result.

use serde::{Deserialize, Serialize};
use strum::Display;

use crate::model::{
    ClockId, FixtureId, GlobalAddress, KnobAddress, KnobValue, PatchRequest, WiggleId,
    WiggleOutput,
};

/// Which clients receive the broadcast a command produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
pub enum ResponseFilter {
    /// Every connected client, the sender included.
    All,
    /// Everyone except the sender, which already applied the change.
    AllButSelf,
    /// Only the sender.
    Exclusive,
}

/// A command wrapped for the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerCommand {
    pub filter: ResponseFilter,
    pub command: Command,
}

impl From<Command> for ServerCommand {
    fn from(command: Command) -> Self {
        Self {
            filter: command.response_filter(),
            command,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Command {
    Clock(ClockCommand),
    Wiggle(WiggleCommand),
    Knob(KnobCommand),
    Patch(PatchCommand),
    Show(ShowCommand),
}

impl Command {
    /// How the server should fan out the result of this command.
    ///
    /// Knob sets are applied locally before sending, so the sender is
    /// excluded from the echo. Pure queries only concern the sender.
    pub fn response_filter(&self) -> ResponseFilter {
        match self {
            Self::Knob(KnobCommand::Set(..)) => ResponseFilter::AllButSelf,
            Self::Clock(ClockCommand::Classes | ClockCommand::State)
            | Self::Wiggle(WiggleCommand::Kinds | WiggleCommand::State)
            | Self::Knob(KnobCommand::State)
            | Self::Patch(
                PatchCommand::GetKinds | PatchCommand::PatchState | PatchCommand::AvailablePorts,
            )
            | Self::Show(
                ShowCommand::ShowName | ShowCommand::AvailableSaves | ShowCommand::SavedShows,
            ) => ResponseFilter::Exclusive,
            _ => ResponseFilter::All,
        }
    }

    /// Short human-readable name used in logs.
    pub fn describe(&self) -> String {
        match self {
            Self::Clock(c) => format!("clock {c}"),
            Self::Wiggle(c) => format!("wiggle {c}"),
            Self::Knob(c) => format!("knob {c}"),
            Self::Patch(c) => format!("patch {c}"),
            Self::Show(c) => format!("show {c}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Display)]
pub enum ClockCommand {
    /// Create a clock of the named class.
    Create(String),
    Remove(ClockId),
    Rename(ClockId, String),
    SetInput(ClockId, usize, Option<ClockId>),
    PushInput(ClockId),
    PopInput(ClockId),
    Classes,
    State,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Display)]
pub enum WiggleCommand {
    /// Create a wiggle of the named kind.
    Create(String),
    Remove(WiggleId),
    Rename(WiggleId, String),
    SetInput(WiggleId, usize, Option<WiggleOutput>),
    PushInput(WiggleId),
    PopInput(WiggleId),
    PushOutput(WiggleId),
    PopOutput(WiggleId),
    SetClock(WiggleId, Option<ClockId>),
    Kinds,
    State,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Display)]
pub enum KnobCommand {
    Set(KnobAddress, KnobValue),
    State,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Display)]
pub enum PatchCommand {
    GetKinds,
    NewPatches(Vec<PatchRequest>),
    Remove(FixtureId),
    Rename(FixtureId, String),
    /// Move a fixture, or unpatch it with `None`.
    Repatch(FixtureId, Option<GlobalAddress>),
    PatchState,
    AddUniverse,
    RemoveUniverse(u32),
    /// Bind a universe to a named output port, or detach it.
    AttachPort(u32, Option<String>),
    AvailablePorts,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Display)]
pub enum ShowCommand {
    ShowName,
    Save,
    SaveAs(String),
    Load(String),
    NewShow,
    AvailableSaves,
    SavedShows,
    Quit,
}
