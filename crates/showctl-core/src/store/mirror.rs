// ── Client mirror ──
//
// The full local copy of the server's patch graph. `apply` is a pure left
// fold over responses: feed the same sequence to two equal mirrors and
// they stay equal.

use tracing::{debug, warn};

use super::{ClockStore, KnobStore, PatchStore, ShowState, WiggleStore};
use crate::error::CoreError;
use crate::model::{
    ClockDescription, ClockId, Knob, KnobAddress, KnobEdit, KnobOwner, Named, WiggleDescription,
    WiggleId, WiggleOutput,
};
use crate::protocol::{Command, Response, ShowResponse};
use crate::session::{Notice, initial_queries};

/// Follow-up work produced by applying one response.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Effects {
    /// Commands the client should send next.
    pub commands: Vec<Command>,
    pub notices: Vec<Notice>,
}

impl Effects {
    fn notice(notice: Notice) -> Self {
        Self {
            commands: Vec::new(),
            notices: vec![notice],
        }
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty() && self.notices.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Mirror {
    clocks: ClockStore,
    wiggles: WiggleStore,
    knobs: KnobStore,
    patches: PatchStore,
    show: ShowState,
}

impl Mirror {
    pub fn new() -> Self {
        Self::default()
    }

    /// Route one response to its reducer.
    ///
    /// Address-consistency failures come back as `Err` and leave the
    /// mirror unchanged.
    pub fn apply(&mut self, response: Response) -> Result<Effects, CoreError> {
        debug!(family = response.family(), "applying response");
        match response {
            Response::Clock(r) => self.clocks.apply(r).map(|()| Effects::default()),
            Response::Wiggle(r) => self.wiggles.apply(r).map(|()| Effects::default()),
            Response::Knob(r) => self.knobs.apply(r).map(|()| Effects::default()),
            Response::Patch(r) => self.patches.apply(r).map(|()| Effects::default()),
            Response::Show(r) => Ok(self.apply_show(r)),
            Response::Error(message) => Ok(Effects::notice(Notice::ServerError(message))),
        }
    }

    /// Apply a local knob edit, returning the command to broadcast it.
    pub fn edit_knob(
        &mut self,
        address: KnobAddress,
        edit: KnobEdit,
    ) -> Result<Command, CoreError> {
        self.knobs.edit(address, edit)
    }

    /// Clear every collection's synced flag ahead of a full resync.
    pub fn begin_resync(&mut self) {
        self.clocks.begin_resync();
        self.wiggles.begin_resync();
        self.knobs.begin_resync();
        self.patches.begin_resync();
    }

    /// True once every collection has received its `State` since the last
    /// resync began.
    pub fn is_synced(&self) -> bool {
        self.clocks.entries().is_synced()
            && self.wiggles.entries().is_synced()
            && self.knobs.entries().is_synced()
            && self.patches.entries().is_synced()
    }

    fn apply_show(&mut self, response: ShowResponse) -> Effects {
        match response {
            ShowResponse::Saved => {
                self.show.saved_at_least_once = true;
                self.show.last_error = None;
                Effects::notice(Notice::ShowSaved)
            }
            ShowResponse::Loaded(name) => {
                self.show.name = Some(name.clone());
                self.show.loads += 1;
                self.show.saved_at_least_once = true;
                self.show.last_error = None;
                self.begin_resync();
                Effects {
                    commands: initial_queries(),
                    notices: vec![Notice::ShowLoaded(name)],
                }
            }
            ShowResponse::Renamed(name) | ShowResponse::ShowName(name) => {
                self.show.name = Some(name);
                Effects::default()
            }
            ShowResponse::ShowsAvailable(shows) => {
                self.show.shows = shows;
                self.show.shows_version += 1;
                Effects::default()
            }
            ShowResponse::SavesAvailable(saves) => {
                self.show.saves = saves;
                self.show.saves_version += 1;
                Effects::default()
            }
            ShowResponse::ShowLibErr(message) => {
                warn!(%message, "show library error");
                self.show.last_error = Some(message.clone());
                Effects::notice(Notice::ShowLibraryError(message))
            }
            ShowResponse::Quit => Effects::notice(Notice::ServerQuit),
        }
    }

    // ── Accessors ────────────────────────────────────────────────────

    pub fn clocks(&self) -> &ClockStore {
        &self.clocks
    }

    pub fn wiggles(&self) -> &WiggleStore {
        &self.wiggles
    }

    pub fn knobs(&self) -> &KnobStore {
        &self.knobs
    }

    pub fn patches(&self) -> &PatchStore {
        &self.patches
    }

    pub fn show(&self) -> &ShowState {
        &self.show
    }

    // ── Weak-reference resolution ────────────────────────────────────

    /// The clock driving `wiggle`, if it has one and that clock exists.
    pub fn clock_driving(&self, wiggle: &WiggleId) -> Option<(ClockId, &ClockDescription)> {
        let id = self.wiggles.get(wiggle)?.clock.clock()?;
        self.clocks.get(&id).map(|clock| (id, clock))
    }

    /// The wiggle output feeding input `slot` of `wiggle`.
    pub fn input_source(
        &self,
        wiggle: &WiggleId,
        slot: usize,
    ) -> Option<(WiggleOutput, &WiggleDescription)> {
        let source = (*self.wiggles.get(wiggle)?.inputs.get(slot)?)?;
        self.wiggles
            .get(&source.wiggle)
            .map(|description| (source, description))
    }

    /// The clock feeding input `slot` of `clock`.
    pub fn clock_input_source(
        &self,
        clock: &ClockId,
        slot: usize,
    ) -> Option<(ClockId, &ClockDescription)> {
        let source = (*self.clocks.get(clock)?.inputs.get(slot)?)?;
        self.clocks
            .get(&source)
            .map(|description| (source, description))
    }

    /// Name of the clock or wiggle exposing `knob`.
    pub fn knob_owner_name(&self, knob: &KnobAddress) -> Option<&str> {
        match knob.owner() {
            KnobOwner::Clock(id) => self.clocks.get(&id).map(Named::name),
            KnobOwner::Wiggle(id) => self.wiggles.get(&id).map(Named::name),
        }
    }

    pub fn knobs_owned_by(&self, owner: KnobOwner) -> impl Iterator<Item = (&KnobAddress, &Knob)> {
        self.knobs.owned_by(owner)
    }
}
