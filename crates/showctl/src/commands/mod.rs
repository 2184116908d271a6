//! Command dispatch: bridges CLI args -> core Commands -> output formatting.

pub mod clocks;
pub mod config_cmd;
pub mod knobs;
pub mod patch;
pub mod show;
pub mod util;
pub mod watch;
pub mod wiggles;

use showctl_core::Controller;

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;

/// Dispatch a server-bound command to the appropriate handler.
///
/// Runs against a controller whose mirror is already synced.
pub async fn dispatch(
    cmd: Command,
    controller: &Controller,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match cmd {
        Command::Clocks(args) => clocks::handle(controller, args, global).await,
        Command::Wiggles(args) => wiggles::handle(controller, args, global).await,
        Command::Knobs(args) => knobs::handle(controller, args, global).await,
        Command::Patch(args) => patch::handle(controller, args, global).await,
        Command::Show(args) => show::handle(controller, args, global).await,
        // Handled in main before a controller is built
        Command::Watch(_) | Command::Config(_) | Command::Completions(_) => Ok(()),
    }
}
