//! Building and base destruction.

use crate::aircraft;
use crate::base::{Base, BaseId, BaseStatus, BuildingId, BuildingStatus};
use crate::campaign::{self, Campaign};
use crate::capacity::{capacity_for_building_type, Capacities, CapacityKind};
use crate::employees;
use crate::error::{BaseError, DestroyRefusal, Result};
use crate::events::{CampaignEvent, TriggerKind};
use crate::grid::TileCell;
use crate::ledger::{self, CapacityScope};
use crate::overflow;
use crate::radar;
use crate::resolver;
use crate::templates::BuildingType;

/// What destroying a building would cost the base.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DestroyImpact {
    /// Capacity kind the building feeds.
    pub capacity: Option<CapacityKind>,
    /// Capacity that would be lost.
    pub lost: i32,
    /// Usage that would no longer fit and be removed.
    pub overflow: i32,
}

/// Why a building may not be removed right now, if anything.
#[must_use]
pub fn destroy_refusal(base: &Base, id: BuildingId) -> Option<DestroyRefusal> {
    if base.status() == BaseStatus::Destroyed {
        return None;
    }
    let building = base.building(id)?;
    if building.building_type == BuildingType::Entrance {
        return Some(DestroyRefusal::Entrance);
    }
    let entrance = base.entrance_tiles();
    if entrance.is_empty() {
        return None;
    }
    if base.grid.buildings_connected_without(&entrance, id) {
        None
    } else {
        Some(DestroyRefusal::BreaksConnectivity)
    }
}

/// Whether a building may be removed (`B_IsBuildingDestroyable`).
#[must_use]
pub fn is_building_destroyable(base: &Base, id: BuildingId) -> bool {
    base.building(id).is_some() && destroy_refusal(base, id).is_none()
}

/// Remove a building from its base (`B_BuildingDestroy`).
///
/// Frees its tiles, recomputes flags and capacities, and throws out what
/// no longer fits. A tile that does not reference the building means the
/// grid is corrupted; that error is fatal.
pub fn building_destroy(campaign: &mut Campaign, base: BaseId, id: BuildingId) -> Result<()> {
    let target = campaign.base_mut(base)?;
    let building = target
        .building(id)
        .cloned()
        .ok_or(BaseError::UnknownBuilding { base, building: id })?;

    if let Some(refusal) = destroy_refusal(target, id) {
        return Err(BaseError::NotDestroyable(refusal));
    }
    let tiles = building.tiles();
    for &tile in &tiles {
        if target.grid.get(tile) != Some(TileCell::Occupied(id)) {
            tracing::error!(base = base.0, col = tile.col, row = tile.row, "Tile does not reference building");
            return Err(BaseError::TileMismatch { base, tile });
        }
    }

    let was_working = building.status == BuildingStatus::Working;
    if let Some(entry) = target.building_mut(id) {
        entry.status = BuildingStatus::NotSet;
    }
    target.grid.clear(&tiles);
    if target.current == Some(id) {
        target.current = None;
    }
    target.remove_building(id);

    let building_type = building.building_type;
    let flipped = resolver::refresh_type_status(campaign, base, building_type)?;
    match (flipped, capacity_for_building_type(building_type)) {
        (false, Some(kind)) => {
            ledger::update_base_capacities(campaign.base_mut(base)?, CapacityScope::Kind(kind));
            overflow::enforce_capacity(campaign, base, kind)?;
        }
        _ => {
            ledger::update_base_capacities(campaign.base_mut(base)?, CapacityScope::All);
            overflow::enforce_all(campaign, base)?;
        }
    }
    if !flipped && building_type == BuildingType::Radar {
        radar::update_base_coverage(campaign, base);
    }

    let template = campaign
        .templates
        .get(building.template)
        .ok_or_else(|| BaseError::CorruptedState(format!("missing template {}", building.template.0)))?;
    let (template_id, on_destroy) = (template.id.clone(), template.on_destroy.clone());
    tracing::info!(base = base.0, template = %template_id, "Building destroyed");
    campaign.emit(CampaignEvent::BuildingDestroyed {
        base,
        template: template_id,
    });
    if was_working {
        if let Some(command) = on_destroy {
            campaign.emit(CampaignEvent::Trigger {
                base,
                kind: TriggerKind::Destroy,
                command,
            });
        }
    }

    #[cfg(feature = "debug-validation")]
    crate::validate::debug_check(campaign, base);
    Ok(())
}

/// Select a building for destruction and report what it would cost
/// (`B_MarkBuildingDestroy`). The building is not removed.
pub fn mark_building_destroy(campaign: &mut Campaign, base: BaseId, id: BuildingId) -> Result<DestroyImpact> {
    let target = campaign.base_mut(base)?;
    if target.status() == BaseStatus::UnderAttack {
        return Err(BaseError::NotDestroyable(DestroyRefusal::UnderAttack));
    }
    let building = target
        .building(id)
        .cloned()
        .ok_or(BaseError::UnknownBuilding { base, building: id })?;
    if let Some(refusal) = destroy_refusal(target, id) {
        return Err(BaseError::NotDestroyable(refusal));
    }
    target.current = Some(id);

    let capacity = capacity_for_building_type(building.building_type);
    let (lost, overflow) = match capacity {
        Some(kind) if building.status.contributes_capacity() => {
            let entry = target.capacity(kind);
            let lost = building.capacity;
            (lost, (entry.cur - (entry.max - lost)).max(0))
        }
        _ => (0, 0),
    };
    Ok(DestroyImpact {
        capacity,
        lost,
        overflow,
    })
}

/// Destroy a whole base.
///
/// Flying aircraft look for a new home, parked ones are lost, staff are
/// deleted, stock and captives are gone, and every building is removed
/// in reverse construction order.
pub fn destroy_base(campaign: &mut Campaign, base: BaseId) -> Result<()> {
    campaign.founded_base(base)?;
    campaign.base_mut(base)?.status = BaseStatus::Destroyed;
    tracing::info!(base = base.0, "Base destroyed");
    campaign.emit(CampaignEvent::BaseDestroyed { base });

    aircraft::evacuate_base(campaign, base)?;
    employees::delete_all_at_base(campaign, base)?;
    {
        let target = campaign.base_mut(base)?;
        target.storage = Default::default();
        target.containment = Default::default();
    }

    let mut buildings = campaign.base(base)?.building_ids();
    buildings.reverse();
    for id in buildings {
        building_destroy(campaign, base, id)?;
    }

    let target = campaign.base_mut(base)?;
    target.capacities = Capacities::default();
    target.current = None;
    campaign::update_installation_limit(campaign, base);
    Ok(())
}
