// ── Mirrored entity stores ──
//
// One store per server collection, each with its own reducer, all built
// on the same `EntityCollection`. `Mirror` owns them and routes every
// inbound response to exactly one.

pub mod collection;
mod clocks;
mod knobs;
mod mirror;
mod patches;
mod show;
mod wiggles;

pub use clocks::ClockStore;
pub use collection::EntityCollection;
pub use knobs::KnobStore;
pub use mirror::{Effects, Mirror};
pub use patches::PatchStore;
pub use show::ShowState;
pub use wiggles::WiggleStore;
