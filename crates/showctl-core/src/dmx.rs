// ── DMX address allocation ──
//
// Pure arithmetic for validating universe/address pairs and laying out
// several fixtures back to back. Overlap between fixtures is the server's
// business; the only hard rule here is that no address outside 1..=512
// ever leaves the client.

use thiserror::Error;

use crate::model::{FixtureKind, GlobalAddress, PatchRequest};

/// Lowest DMX channel in a universe.
pub const DMX_ADDRESS_MIN: u16 = 1;
/// Highest DMX channel in a universe.
pub const DMX_ADDRESS_MAX: u16 = 512;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DmxError {
    #[error("Universe {0} is invalid (must be 0 or greater)")]
    InvalidUniverse(i64),

    #[error("DMX address {0} is out of range (1-512)")]
    InvalidAddress(i64),

    #[error("Universe and address must both be set or both be empty")]
    PartialAddress,

    #[error("Quantity {0} is invalid (must be at least 1)")]
    InvalidQuantity(i64),

    #[error("Fixture {index} of {quantity} would start at channel {channel}, past 512")]
    AddressOverflow {
        index: u32,
        quantity: u32,
        channel: u64,
    },
}

pub fn valid_universe(universe: i64) -> Result<u32, DmxError> {
    u32::try_from(universe).map_err(|_| DmxError::InvalidUniverse(universe))
}

pub fn valid_dmx_address(address: i64) -> Result<u16, DmxError> {
    u16::try_from(address)
        .ok()
        .filter(|a| (DMX_ADDRESS_MIN..=DMX_ADDRESS_MAX).contains(a))
        .ok_or(DmxError::InvalidAddress(address))
}

/// Combine separately entered universe and address fields.
///
/// Both empty means "leave unpatched". A half-filled pair is an error.
pub fn global_address_from_optionals(
    universe: Option<i64>,
    address: Option<i64>,
) -> Result<Option<GlobalAddress>, DmxError> {
    match (universe, address) {
        (None, None) => Ok(None),
        (Some(universe), Some(address)) => Ok(Some(GlobalAddress {
            universe: valid_universe(universe)?,
            address: valid_dmx_address(address)?,
        })),
        _ => Err(DmxError::PartialAddress),
    }
}

/// Lay out `quantity` fixtures of `kind` starting at `start`.
///
/// A single fixture keeps `name` as is. Several fixtures are numbered
/// `"{name} 1"`, `"{name} 2"`, ... and placed back to back. A blank name
/// falls back to the kind's name.
pub fn sequential_placement(
    name: &str,
    kind: &FixtureKind,
    quantity: i64,
    start: Option<GlobalAddress>,
) -> Result<Vec<PatchRequest>, DmxError> {
    let quantity = u32::try_from(quantity)
        .ok()
        .filter(|q| *q >= 1)
        .ok_or(DmxError::InvalidQuantity(quantity))?;

    let base_name = match name.trim() {
        "" => kind.name.as_str(),
        trimmed => trimmed,
    };

    if quantity == 1 {
        return Ok(vec![PatchRequest {
            name: base_name.to_owned(),
            kind: kind.name.clone(),
            address: start,
        }]);
    }

    (0..quantity)
        .map(|i| -> Result<PatchRequest, DmxError> {
            let address = start
                .map(|start| offset_address(start, u64::from(kind.channel_count) * u64::from(i)))
                .transpose()
                .map_err(|channel| DmxError::AddressOverflow {
                    index: i + 1,
                    quantity,
                    channel,
                })?;
            Ok(PatchRequest {
                name: format!("{base_name} {}", i + 1),
                kind: kind.name.clone(),
                address,
            })
        })
        .collect()
}

/// Suggested start address for the next patch after placing `quantity`
/// fixtures of `kind` at `current`. Saturates at the last channel.
pub fn advance_address(current: GlobalAddress, quantity: u32, kind: &FixtureKind) -> GlobalAddress {
    let next = u64::from(current.address) + u64::from(quantity) * u64::from(kind.channel_count);
    GlobalAddress {
        universe: current.universe,
        address: u16::try_from(next.min(u64::from(DMX_ADDRESS_MAX))).unwrap_or(DMX_ADDRESS_MAX),
    }
}

/// Shift `start` by `channels`, or report the channel it would land on.
fn offset_address(start: GlobalAddress, channels: u64) -> Result<GlobalAddress, u64> {
    let channel = u64::from(start.address) + channels;
    u16::try_from(channel)
        .ok()
        .filter(|a| *a <= DMX_ADDRESS_MAX)
        .map(|address| GlobalAddress {
            universe: start.universe,
            address,
        })
        .ok_or(channel)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn par64() -> FixtureKind {
        FixtureKind {
            name: "Par64".into(),
            channel_count: 4,
        }
    }

    fn at(universe: u32, address: u16) -> GlobalAddress {
        GlobalAddress { universe, address }
    }

    #[test]
    fn dmx_bounds() {
        assert_eq!(valid_dmx_address(0), Err(DmxError::InvalidAddress(0)));
        assert_eq!(valid_dmx_address(1), Ok(1));
        assert_eq!(valid_dmx_address(512), Ok(512));
        assert_eq!(valid_dmx_address(513), Err(DmxError::InvalidAddress(513)));
        assert!(valid_dmx_address(-4).is_err());
    }

    #[test]
    fn universe_must_be_non_negative() {
        assert_eq!(valid_universe(0), Ok(0));
        assert_eq!(valid_universe(7), Ok(7));
        assert_eq!(valid_universe(-1), Err(DmxError::InvalidUniverse(-1)));
    }

    #[test]
    fn optionals_both_or_neither() {
        assert_eq!(global_address_from_optionals(None, None), Ok(None));
        assert_eq!(global_address_from_optionals(Some(3), Some(10)), Ok(Some(at(3, 10))));
        assert_eq!(
            global_address_from_optionals(Some(3), None),
            Err(DmxError::PartialAddress)
        );
        assert_eq!(
            global_address_from_optionals(None, Some(10)),
            Err(DmxError::PartialAddress)
        );
        assert_eq!(
            global_address_from_optionals(Some(0), Some(600)),
            Err(DmxError::InvalidAddress(600))
        );
    }

    #[test]
    fn places_fixtures_back_to_back() {
        let requests = sequential_placement("Par", &par64(), 3, Some(at(1, 10))).unwrap();
        assert_eq!(
            requests,
            vec![
                PatchRequest {
                    name: "Par 1".into(),
                    kind: "Par64".into(),
                    address: Some(at(1, 10)),
                },
                PatchRequest {
                    name: "Par 2".into(),
                    kind: "Par64".into(),
                    address: Some(at(1, 14)),
                },
                PatchRequest {
                    name: "Par 3".into(),
                    kind: "Par64".into(),
                    address: Some(at(1, 18)),
                },
            ]
        );
    }

    #[test]
    fn single_fixture_keeps_name_or_falls_back_to_kind() {
        let one = sequential_placement("Stage left", &par64(), 1, None).unwrap();
        assert_eq!(one.len(), 1);
        assert_eq!(one[0].name, "Stage left");
        assert_eq!(one[0].address, None);

        let unnamed = sequential_placement("   ", &par64(), 1, Some(at(0, 1))).unwrap();
        assert_eq!(unnamed[0].name, "Par64");
    }

    #[test]
    fn unpatched_batch_stays_unpatched() {
        let requests = sequential_placement("Wash", &par64(), 2, None).unwrap();
        assert!(requests.iter().all(|r| r.address.is_none()));
        assert_eq!(requests[1].name, "Wash 2");
    }

    #[test]
    fn rejects_empty_quantity() {
        assert_eq!(
            sequential_placement("Par", &par64(), 0, None),
            Err(DmxError::InvalidQuantity(0))
        );
        assert!(sequential_placement("Par", &par64(), -2, None).is_err());
    }

    #[test]
    fn refuses_to_run_past_the_universe() {
        let err = sequential_placement("Par", &par64(), 3, Some(at(0, 507))).unwrap_err();
        assert_eq!(
            err,
            DmxError::AddressOverflow {
                index: 3,
                quantity: 3,
                channel: 515,
            }
        );
    }

    #[test]
    fn advance_saturates_at_last_channel() {
        assert_eq!(advance_address(at(2, 10), 3, &par64()), at(2, 22));
        assert_eq!(advance_address(at(2, 500), 10, &par64()), at(2, 512));
    }
}
