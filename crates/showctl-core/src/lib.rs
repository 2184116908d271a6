//! Client-side mirror and command protocol for show-control consoles.
//!
//! Many clients connect to one authoritative show server. Each keeps a
//! local mirror of the server's patch graph (clocks, wiggles, knobs and
//! patched fixtures) and stays consistent with it by applying broadcast
//! responses in delivery order.
//!
//! - **[`Controller`]**: async facade. Owns the mirror, drains transport
//!   events on one background task and sends commands.
//!   [`Controller::oneshot()`] connects, waits for a full resync, runs a
//!   closure and disconnects.
//!
//! - **[`Mirror`]**: the four entity stores plus show state. Every
//!   response is routed to exactly one reducer; unknown addresses and
//!   mismatched values are reported and leave the mirror unchanged.
//!
//! - **[`protocol`]**: closed command and response enums, the
//!   response-filter policy and the JSON codec.
//!
//! - **[`input`] / [`patcher`] / [`dmx`]**: validated text cells, the
//!   fixture patching form and DMX address arithmetic.

pub mod config;
pub mod controller;
pub mod dmx;
pub mod error;
pub mod input;
pub mod model;
pub mod patcher;
pub mod protocol;
pub mod session;
pub mod store;
pub mod stream;

// ── Primary re-exports ──────────────────────────────────────────────
pub use config::ControllerConfig;
pub use controller::Controller;
pub use dmx::DmxError;
pub use error::CoreError;
pub use input::{CellMsg, IdSource, ValidatedInput, WidgetId};
pub use patcher::{FormError, PatchField, PatchForm};
pub use protocol::{Command, Response, ResponseFilter, ServerCommand};
pub use session::{ConnectionState, Notice, Session};
pub use store::{Effects, EntityCollection, Mirror, ShowState};
pub use stream::{KnobFilter, MirrorStream, PatchFilter};

pub use showctl_api::{ReconnectConfig, TransportEvent};

// Re-export model types at the crate root for ergonomics.
pub use model::{
    Address, ClockDescription, ClockId, FixtureId, FixtureKind, GlobalAddress, Knob,
    KnobAddress, KnobDatatype, KnobDescription, KnobEdit, KnobKind, KnobOwner, KnobValue,
    PatchItem, PatchRequest, UniverseStatus, UsesClock, WiggleDescription, WiggleId,
    WiggleOutput,
};
