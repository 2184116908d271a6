//! Clap derive structures for the `showctl` CLI.
//!
//! Defines the complete command tree, global flags, and shared types.

use clap::{Args, Parser, Subcommand, ValueEnum};

use showctl_core::{ClockId, FixtureId, KnobKind, WiggleId};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// showctl -- drive a show-control console from the command line
#[derive(Debug, Parser)]
#[command(
    name = "showctl",
    version,
    about = "Inspect and edit a live show-control console",
    long_about = "Connects to a show server over its websocket, mirrors the live patch\n\
        graph (clocks, wiggles, knobs and fixtures) and sends commands that every\n\
        connected console sees.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Server profile to use
    #[arg(long, short = 'p', env = "SHOWCTL_PROFILE", global = true)]
    pub profile: Option<String>,

    /// Server websocket URL (overrides profile)
    #[arg(long, short = 's', env = "SHOWCTL_SERVER", global = true)]
    pub server: Option<String>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "SHOWCTL_OUTPUT",
        default_value = "table",
        global = true
    )]
    pub output: OutputFormat,

    /// When to use color output
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorMode,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Skip confirmation prompts
    #[arg(long, short = 'y', global = true)]
    pub yes: bool,

    /// Seconds to wait for the show state and for command confirmations
    #[arg(long, env = "SHOWCTL_TIMEOUT", global = true)]
    pub timeout: Option<u64>,
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
    /// Plain text, one value per line (scripting)
    Plain,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Follow connection changes and server notices
    #[command(alias = "w")]
    Watch(WatchArgs),

    /// Manage clocks
    #[command(alias = "clk")]
    Clocks(ClocksArgs),

    /// Manage wiggles (modulation generators)
    #[command(alias = "wig")]
    Wiggles(WigglesArgs),

    /// Inspect and set knobs
    #[command(alias = "k")]
    Knobs(KnobsArgs),

    /// Patch fixtures and manage universes
    Patch(PatchArgs),

    /// Save, load and switch show files
    Show(ShowArgs),

    /// Manage configuration profiles
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Watch ────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct WatchArgs {
    /// Also report entity counts whenever they change
    #[arg(long)]
    pub counts: bool,
}

// ── Clocks ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ClocksArgs {
    #[command(subcommand)]
    pub command: ClocksCommand,
}

#[derive(Debug, Subcommand)]
pub enum ClocksCommand {
    /// List clocks
    #[command(alias = "ls")]
    List,

    /// Show one clock with its inputs and knobs
    Get { id: ClockId },

    /// List the clock classes the server can create
    Classes,

    /// Create a clock of the given class
    Create { class: String },

    /// Rename a clock
    Rename { id: ClockId, name: String },

    /// Delete a clock
    #[command(alias = "rm")]
    Remove { id: ClockId },

    /// Connect an input slot to another clock (omit SOURCE to disconnect)
    SetInput {
        id: ClockId,
        slot: usize,
        source: Option<ClockId>,
    },

    /// Append an empty input slot
    PushInput { id: ClockId },

    /// Drop the last input slot
    PopInput { id: ClockId },
}

// ── Wiggles ──────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct WigglesArgs {
    #[command(subcommand)]
    pub command: WigglesCommand,
}

#[derive(Debug, Subcommand)]
pub enum WigglesCommand {
    /// List wiggles
    #[command(alias = "ls")]
    List,

    /// Show one wiggle with its inputs, clock and knobs
    Get { id: WiggleId },

    /// List the wiggle kinds the server can create
    Kinds,

    /// Create a wiggle of the given kind
    Create { kind: String },

    /// Rename a wiggle
    Rename { id: WiggleId, name: String },

    /// Delete a wiggle
    #[command(alias = "rm")]
    Remove { id: WiggleId },

    /// Connect an input slot to another wiggle's output, written
    /// NAMESPACE:LOCAL#OUTPUT (omit SOURCE to disconnect)
    SetInput {
        id: WiggleId,
        slot: usize,
        source: Option<String>,
    },

    /// Append an empty input slot
    PushInput { id: WiggleId },

    /// Drop the last input slot
    PopInput { id: WiggleId },

    /// Add an output port
    PushOutput { id: WiggleId },

    /// Remove the last output port
    PopOutput { id: WiggleId },

    /// Drive a wiggle from a clock (omit CLOCK to detach)
    SetClock { id: WiggleId, clock: Option<ClockId> },
}

// ── Knobs ────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct KnobsArgs {
    #[command(subcommand)]
    pub command: KnobsCommand,
}

#[derive(Debug, Subcommand)]
pub enum KnobsCommand {
    /// List knobs
    #[command(alias = "ls")]
    List {
        /// Only knobs of this owner (clock:NS:LOCAL or wiggle:NS:LOCAL)
        #[arg(long)]
        owner: Option<String>,

        /// Only knobs of this kind (Button, Picker, Rate, UFloat, Bipolar, Unipolar)
        #[arg(long)]
        kind: Option<KnobKind>,
    },

    /// Set a knob value
    ///
    /// Buttons take on/off, pickers take one of their options, numeric
    /// knobs take a number that is clamped into the knob's range.
    Set {
        /// Owner of the knob (clock:NS:LOCAL or wiggle:NS:LOCAL)
        owner: String,
        /// Slot index on the owner
        slot: usize,
        value: String,
    },
}

// ── Patch ────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct PatchArgs {
    #[command(subcommand)]
    pub command: PatchCommand,
}

#[derive(Debug, Subcommand)]
pub enum PatchCommand {
    /// List patched fixtures
    #[command(alias = "ls")]
    List {
        /// Only fixtures in this universe
        #[arg(long, short = 'u')]
        universe: Option<u32>,

        /// Only fixtures without a DMX address
        #[arg(long, conflicts_with_all = ["universe", "patched"])]
        unpatched: bool,

        /// Only fixtures with a DMX address
        #[arg(long)]
        patched: bool,

        /// Only fixtures of this type
        #[arg(long)]
        kind: Option<String>,
    },

    /// List the fixture types the server knows
    Kinds,

    /// Patch one or more fixtures of one type
    Add {
        /// Fixture type (prompted for when omitted)
        #[arg(long, short = 'k')]
        kind: Option<String>,

        /// Fixture name; several fixtures are numbered from 1
        #[arg(long, short = 'n', default_value = "")]
        name: String,

        #[arg(long, default_value = "1")]
        quantity: String,

        /// Universe of the first fixture (leave both unset to add unpatched)
        #[arg(long, short = 'u', default_value = "")]
        universe: String,

        /// DMX start address of the first fixture
        #[arg(long, short = 'a', default_value = "")]
        address: String,
    },

    /// Delete a fixture
    #[command(alias = "rm")]
    Remove { id: FixtureId },

    /// Rename a fixture
    Rename { id: FixtureId, name: String },

    /// Move a fixture (leave both unset to unpatch it)
    Repatch {
        id: FixtureId,

        #[arg(long, short = 'u')]
        universe: Option<i64>,

        #[arg(long, short = 'a')]
        address: Option<i64>,
    },

    /// List universes and their output ports
    Universes,

    /// List output ports available on the server
    Ports,

    /// Add a universe
    AddUniverse,

    /// Remove a universe
    RemoveUniverse { universe: u32 },

    /// Bind a universe to an output port (omit PORT to detach)
    AttachPort { universe: u32, port: Option<String> },
}

// ── Show ─────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ShowArgs {
    #[command(subcommand)]
    pub command: ShowCommand,
}

#[derive(Debug, Subcommand)]
pub enum ShowCommand {
    /// Name of the open show
    Info,

    /// Save the open show
    Save {
        /// Save under a new name instead
        #[arg(long = "as")]
        name: Option<String>,
    },

    /// Load a show from the library
    Load { name: String },

    /// Start a new, empty show
    New,

    /// List saves of the open show
    Saves,

    /// List shows in the library
    #[command(alias = "ls")]
    List,

    /// Shut the show server down
    Quit,
}

// ── Config ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Interactive setup wizard
    Init,

    /// Display current configuration
    Show,

    /// Set a value on the active profile
    Set { key: String, value: String },

    /// List configured profiles
    Profiles,

    /// Make a profile the default
    Use { name: String },
}

// ── Completions ──────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn command_tree_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_addresses_in_arguments() {
        let cli =
            Cli::try_parse_from(["showctl", "clocks", "set-input", "0:2", "1", "0:7"]).unwrap();
        let Command::Clocks(ClocksArgs {
            command: ClocksCommand::SetInput { id, slot, source },
        }) = cli.command
        else {
            panic!("expected clocks set-input");
        };
        assert_eq!(id, ClockId::new(0, 2));
        assert_eq!(slot, 1);
        assert_eq!(source, Some(ClockId::new(0, 7)));
    }

    #[test]
    fn rejects_malformed_addresses() {
        assert!(Cli::try_parse_from(["showctl", "wiggles", "remove", "nope"]).is_err());
    }

    #[test]
    fn global_flags_follow_subcommands() {
        let cli =
            Cli::try_parse_from(["showctl", "patch", "ls", "-o", "json", "--unpatched"]).unwrap();
        assert!(matches!(cli.global.output, OutputFormat::Json));
        assert!(matches!(
            cli.command,
            Command::Patch(PatchArgs {
                command: PatchCommand::List { unpatched: true, .. }
            })
        ));
    }
}
