//! Consistency checks over a base.
//!
//! Every mutation must leave the status flags, the capacity maxima and the
//! grid in agreement with the buildings. [`check_base`] verifies that; with
//! the `debug-validation` feature the lifecycle runs it after each change.

use crate::base::BaseId;
use crate::campaign::Campaign;
use crate::capacity::CapacityKind;
use crate::error::{BaseError, Result};
use crate::grid::TileCell;
use crate::ledger;
use crate::resolver;
use crate::templates::BuildingType;

/// Verify flags, capacity maxima and grid references of a base.
pub fn check_base(campaign: &Campaign, id: BaseId) -> Result<()> {
    let base = campaign.base(id)?;

    for building_type in BuildingType::ALL {
        let flag = resolver::building_status(base, building_type);
        let derived = resolver::type_operational(base, building_type);
        if flag != derived {
            return Err(BaseError::CorruptedState(format!(
                "{building_type:?} flag is {flag}, buildings say {derived}"
            )));
        }
    }

    for kind in CapacityKind::ALL {
        let max = base.capacity(kind).max;
        let derived = ledger::derived_max(base, kind);
        if max != derived {
            return Err(BaseError::CorruptedState(format!(
                "{kind:?} maximum is {max}, buildings give {derived}"
            )));
        }
    }

    for building in base.buildings() {
        for tile in building.tiles() {
            if base.grid().get(tile) != Some(TileCell::Occupied(building.id)) {
                return Err(BaseError::TileMismatch { base: id, tile });
            }
        }
    }
    for (tile, cell) in base.grid().tiles() {
        if let TileCell::Occupied(building) = cell {
            if base.building(building).is_none() {
                return Err(BaseError::TileMismatch { base: id, tile });
            }
        }
    }
    Ok(())
}

/// Log a failed [`check_base`].
#[cfg(feature = "debug-validation")]
pub(crate) fn debug_check(campaign: &Campaign, id: BaseId) {
    if let Err(err) = check_base(campaign, id) {
        tracing::error!(base = id.0, %err, "Base invariant violated");
    }
}
