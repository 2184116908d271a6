// ── Core identity types ──
//
// Every mirrored entity is keyed by a server-assigned address. Clocks and
// wiggles share the same composite shape but get distinct newtypes so a
// clock address can never be used to look up a wiggle. The client never
// mints any of these.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

// ── Address ─────────────────────────────────────────────────────────

/// Composite `(namespace, local)` identifier for clocks and wiggles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Address {
    pub namespace: u32,
    pub local: u32,
}

impl Address {
    pub const fn new(namespace: u32, local: u32) -> Self {
        Self { namespace, local }
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.namespace, self.local)
    }
}

impl FromStr for Address {
    type Err = CoreError;

    /// Parses the `namespace:local` form produced by `Display`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || CoreError::InvalidAddress {
            input: s.to_owned(),
        };
        let (ns, local) = s.trim().split_once(':').ok_or_else(invalid)?;
        Ok(Self {
            namespace: ns.parse().map_err(|_| invalid())?,
            local: local.parse().map_err(|_| invalid())?,
        })
    }
}

macro_rules! composite_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub Address);

        impl $name {
            pub const fn new(namespace: u32, local: u32) -> Self {
                Self(Address::new(namespace, local))
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }

        impl FromStr for $name {
            type Err = CoreError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                s.parse().map(Self)
            }
        }

        impl From<Address> for $name {
            fn from(a: Address) -> Self {
                Self(a)
            }
        }
    };
}

composite_id!(
    /// Address of a clock.
    ClockId
);

composite_id!(
    /// Address of a wiggle (modulation generator).
    WiggleId
);

// ── FixtureId ───────────────────────────────────────────────────────

/// Patched fixtures are keyed by a bare integer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FixtureId(pub u32);

impl fmt::Display for FixtureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for FixtureId {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse()
            .map(Self)
            .map_err(|_| CoreError::InvalidAddress {
                input: s.to_owned(),
            })
    }
}

// ── Knob addressing ─────────────────────────────────────────────────

/// The entity that exposes a knob.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum KnobOwner {
    Clock(ClockId),
    Wiggle(WiggleId),
}

impl fmt::Display for KnobOwner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Clock(id) => write!(f, "clock {id}"),
            Self::Wiggle(id) => write!(f, "wiggle {id}"),
        }
    }
}

/// A knob is identified by its owner plus the slot index the owner
/// exposes it at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum KnobAddress {
    Clock(ClockId, usize),
    Wiggle(WiggleId, usize),
}

impl KnobAddress {
    pub fn owner(&self) -> KnobOwner {
        match *self {
            Self::Clock(id, _) => KnobOwner::Clock(id),
            Self::Wiggle(id, _) => KnobOwner::Wiggle(id),
        }
    }

    pub fn slot(&self) -> usize {
        match *self {
            Self::Clock(_, slot) | Self::Wiggle(_, slot) => slot,
        }
    }
}

impl fmt::Display for KnobAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner(), self.slot())
    }
}

/// One output port of a wiggle, the target of another wiggle's input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct WiggleOutput {
    pub wiggle: WiggleId,
    pub output: usize,
}

impl fmt::Display for WiggleOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.wiggle, self.output)
    }
}

// ── DMX addressing ──────────────────────────────────────────────────

/// A fixture's position in the DMX address space.
///
/// Construct through [`crate::dmx::global_address_from_optionals`] or the
/// other validators in [`crate::dmx`] to guarantee `address` is in 1..=512.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct GlobalAddress {
    pub universe: u32,
    pub address: u16,
}

impl fmt::Display for GlobalAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:03}", self.universe, self.address)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn address_display_round_trips_through_from_str() {
        let a = Address::new(2, 17);
        assert_eq!(a.to_string(), "2:17");
        assert_eq!("2:17".parse::<Address>().unwrap(), a);
    }

    #[test]
    fn address_rejects_garbage() {
        assert!("217".parse::<Address>().is_err());
        assert!("a:b".parse::<Address>().is_err());
    }

    #[test]
    fn addresses_order_by_namespace_then_local() {
        let mut ids = vec![ClockId::new(1, 0), ClockId::new(0, 5), ClockId::new(0, 2)];
        ids.sort();
        assert_eq!(ids, vec![ClockId::new(0, 2), ClockId::new(0, 5), ClockId::new(1, 0)]);
    }

    #[test]
    fn knob_address_exposes_owner_and_slot() {
        let knob = KnobAddress::Wiggle(WiggleId::new(0, 3), 1);
        assert_eq!(knob.owner(), KnobOwner::Wiggle(WiggleId::new(0, 3)));
        assert_eq!(knob.slot(), 1);
        assert_eq!(knob.to_string(), "wiggle 0:3/1");
    }

    #[test]
    fn ids_serialize_transparently() {
        let json = serde_json::to_value(ClockId::new(0, 4)).unwrap();
        assert_eq!(json, serde_json::json!({"namespace": 0, "local": 4}));
        assert_eq!(serde_json::to_value(FixtureId(9)).unwrap(), serde_json::json!(9));
    }

    #[test]
    fn global_address_display_pads_channel() {
        let ga = GlobalAddress {
            universe: 1,
            address: 7,
        };
        assert_eq!(ga.to_string(), "1.007");
    }
}
