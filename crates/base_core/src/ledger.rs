//! Capacity ledger.
//!
//! The maximum of each capacity kind is derived from the buildings of the
//! matching type: every building at or past `ConstructionFinished` adds its
//! capacity, whether it is operational or not. Current usage is derived
//! from whatever occupies the capacity: staff, stored items, aircraft,
//! captives or antimatter.

use crate::base::{Base, BaseId, DefenceBatteries};
use crate::campaign::Campaign;
use crate::capacity::{building_type_for_capacity, CapacityKind};
use crate::employees::EmployeeType;
use crate::error::Result;
use crate::storage::stored_volume;
use crate::templates::BuildingType;

/// Which capacity kinds to recompute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CapacityScope {
    /// One kind.
    Kind(CapacityKind),
    /// Every kind.
    All,
}

impl CapacityScope {
    fn kinds(self) -> Vec<CapacityKind> {
        match self {
            Self::Kind(kind) => vec![kind],
            Self::All => CapacityKind::ALL.to_vec(),
        }
    }
}

/// Maximum of one kind derived from the base's buildings.
#[must_use]
pub fn derived_max(base: &Base, kind: CapacityKind) -> i32 {
    base.buildings_of_type(building_type_for_capacity(kind))
        .filter(|building| building.status.contributes_capacity())
        .map(|building| building.capacity)
        .sum()
}

/// Recompute capacity maxima (`B_UpdateBaseCapacities`). Defence
/// batteries are recounted as well.
pub fn update_base_capacities(base: &mut Base, scope: CapacityScope) {
    for kind in scope.kinds() {
        let max = derived_max(base, kind);
        base.capacities.get_mut(kind).max = max;
    }

    let count = |building_type: BuildingType| {
        base.buildings_of_type(building_type)
            .filter(|building| building.status.contributes_capacity())
            .count() as u32
    };
    let batteries = DefenceBatteries {
        missile: count(BuildingType::DefenceMissile),
        laser: count(BuildingType::DefenceLaser),
    };
    base.batteries = batteries;
}

/// Current usage of one kind, derived from campaign state.
pub fn derived_current(campaign: &Campaign, base: BaseId, kind: CapacityKind) -> Result<i32> {
    let target = campaign.base(base)?;
    let cur = match kind {
        CapacityKind::Employees => campaign.employees.count_all_hired(base),
        CapacityKind::Items => {
            let robots = campaign.employees.count_hired(base, EmployeeType::Robot);
            stored_volume(&campaign.catalog, &target.storage)
                .saturating_add(robots.saturating_mul(campaign.config.robot_storage_volume))
        }
        CapacityKind::LabSpace => campaign
            .employees
            .count_hired(base, EmployeeType::Scientist)
            .min(target.capacity(kind).max),
        CapacityKind::Workspace => campaign
            .employees
            .count_hired(base, EmployeeType::Worker)
            .min(target.capacity(kind).max),
        CapacityKind::SmallHangar | CapacityKind::LargeHangar => {
            campaign.fleet.count_in_hangar(base, kind)
        }
        CapacityKind::Aliens => target.containment.count_alive(),
        CapacityKind::Antimatter => campaign
            .catalog
            .antimatter()
            .map_or(0, |item| target.storage.amount(item)),
    };
    Ok(cur)
}

/// Recompute the current usage of one kind.
pub fn refresh_current(campaign: &mut Campaign, base: BaseId, kind: CapacityKind) -> Result<()> {
    let cur = derived_current(campaign, base, kind)?;
    campaign.base_mut(base)?.capacities.set_current(kind, cur);
    Ok(())
}

/// Recompute used storage volume (`B_UpdateStorageCap`).
pub fn update_storage_cap(campaign: &mut Campaign, base: BaseId) -> Result<()> {
    refresh_current(campaign, base, CapacityKind::Items)
}

/// Recompute stored antimatter (`B_UpdateAntimatterCap`).
pub fn update_antimatter_cap(campaign: &mut Campaign, base: BaseId) -> Result<()> {
    refresh_current(campaign, base, CapacityKind::Antimatter)
}

/// Free space of a kind (`CAP_GetFreeCapacity`). Negative when overflowing.
#[must_use]
pub fn free_capacity(base: &Base, kind: CapacityKind) -> i32 {
    base.capacity(kind).free()
}

/// Log every kind whose usage exceeds its maximum.
pub fn warn_overflow(base: &Base) {
    for (kind, capacity) in base.capacities().iter() {
        if capacity.is_overflowing() {
            tracing::warn!(
                base = base.id().0,
                ?kind,
                cur = capacity.cur,
                max = capacity.max,
                "Capacity exceeds maximum"
            );
        }
    }
}
