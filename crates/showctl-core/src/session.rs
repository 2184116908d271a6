// ── Session / connection state ──
//
// Tracks where the socket is in its lifecycle. Every transition to `Open`
// triggers a full resync; there is no incremental catch-up.

use serde::{Deserialize, Serialize};
use strum::Display;

use crate::protocol::{
    ClockCommand, Command, KnobCommand, PatchCommand, ShowCommand, WiggleCommand,
};

/// Connection state observable by consumers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display)]
pub enum ConnectionState {
    /// No socket has opened yet.
    #[default]
    Waiting,
    Open,
    Closed,
}

/// Something the operator should be told about that is not part of the
/// mirrored entity state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Notice {
    ServerError(String),
    ShowLibraryError(String),
    ShowSaved,
    ShowLoaded(String),
    ServerQuit,
    ConnectionOpened { opens: u64 },
    ConnectionClosed { reason: Option<String> },
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    state: ConnectionState,
    opens: u64,
    last_close_reason: Option<String>,
}

impl Session {
    /// Mark the socket open and return the queries that rebuild the mirror.
    pub fn on_open(&mut self) -> Vec<Command> {
        self.state = ConnectionState::Open;
        self.opens += 1;
        self.last_close_reason = None;
        initial_queries()
    }

    pub fn on_close(&mut self, reason: Option<String>) {
        self.state = ConnectionState::Closed;
        self.last_close_reason = reason;
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn is_open(&self) -> bool {
        self.state == ConnectionState::Open
    }

    /// How many times the socket has opened, reconnects included.
    pub fn opens(&self) -> u64 {
        self.opens
    }

    pub fn last_close_reason(&self) -> Option<&str> {
        self.last_close_reason.as_deref()
    }
}

/// Everything a fresh client needs to know about the server.
pub fn initial_queries() -> Vec<Command> {
    vec![
        Command::Clock(ClockCommand::State),
        Command::Clock(ClockCommand::Classes),
        Command::Wiggle(WiggleCommand::State),
        Command::Wiggle(WiggleCommand::Kinds),
        Command::Knob(KnobCommand::State),
        Command::Patch(PatchCommand::PatchState),
        Command::Patch(PatchCommand::GetKinds),
        Command::Patch(PatchCommand::AvailablePorts),
        Command::Show(ShowCommand::ShowName),
    ]
}
