// ── Filter predicates for mirror snapshots ──
//
// Used by listing commands to narrow a snapshot without another query.

use crate::model::{Knob, KnobAddress, KnobKind, KnobOwner, PatchItem};

/// Filter predicate for patched fixtures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatchFilter {
    Patched,
    Unpatched,
    InUniverse(u32),
    ByKind(String),
}

impl PatchFilter {
    pub fn matches(&self, item: &PatchItem) -> bool {
        match self {
            Self::Patched => item.is_patched(),
            Self::Unpatched => !item.is_patched(),
            Self::InUniverse(u) => item.address.is_some_and(|a| a.universe == *u),
            Self::ByKind(kind) => item.kind.eq_ignore_ascii_case(kind),
        }
    }
}

/// Filter predicate for knobs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KnobFilter {
    ByOwner(KnobOwner),
    ByKind(KnobKind),
}

impl KnobFilter {
    pub fn matches(&self, address: &KnobAddress, knob: &Knob) -> bool {
        match self {
            Self::ByOwner(owner) => address.owner() == *owner,
            Self::ByKind(kind) => knob.kind() == *kind,
        }
    }
}
