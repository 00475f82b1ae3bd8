//! Building-type status resolution.
//!
//! Each base keeps one flag per [`BuildingType`] saying whether at least
//! one building of that type is operational: working, and with its
//! dependency type operational too. When a flag flips, every type that
//! depends on it is re-checked, and so on through the dependency graph.
//!
//! Propagation runs in one direction per call. A call that follows an
//! enablement only switches types on, a call that follows a disablement
//! only switches types off, so each type flips at most once and the
//! worklist always drains.

use std::collections::VecDeque;

use crate::base::{Base, BaseId, Building, BuildingId, BuildingStatus};
use crate::campaign::Campaign;
use crate::capacity::{building_type_for_capacity, CapacityKind};
use crate::error::Result;
use crate::hooks;
use crate::ledger::{self, CapacityScope};
use crate::templates::{BuildingType, MAX_BUILDING_TYPE};

// ============================================================================
// Flag access
// ============================================================================

/// Whether a building type is operational (`B_GetBuildingStatus`).
///
/// [`BuildingType::Misc`] always reads as operational.
#[must_use]
pub fn building_status(base: &Base, building_type: BuildingType) -> bool {
    building_type == BuildingType::Misc || base.has_building[building_type.index()]
}

/// Flag lookup by raw type index. Out-of-range indices read as `false`.
#[must_use]
pub fn building_status_by_index(base: &Base, index: usize) -> bool {
    match BuildingType::try_from(index) {
        Ok(building_type) => building_status(base, building_type),
        Err(_) => {
            tracing::warn!(index, max = MAX_BUILDING_TYPE, "Building type index out of range");
            false
        }
    }
}

/// Set the flag of a type (`B_SetBuildingStatus`).
pub fn set_building_status(base: &mut Base, building_type: BuildingType, value: bool) {
    if building_type == BuildingType::Misc {
        return;
    }
    base.has_building[building_type.index()] = value;
}

/// Flag write by raw type index. Out-of-range indices are ignored.
pub fn set_building_status_by_index(base: &mut Base, index: usize, value: bool) {
    match BuildingType::try_from(index) {
        Ok(building_type) => set_building_status(base, building_type, value),
        Err(_) => {
            tracing::warn!(index, max = MAX_BUILDING_TYPE, "Building type index out of range");
        }
    }
}

// ============================================================================
// Operational checks
// ============================================================================

/// Whether the type a building depends on is operational
/// (`B_CheckBuildingDependencesStatus`).
#[must_use]
pub fn dependencies_satisfied(base: &Base, building: &Building) -> bool {
    building
        .depends_type
        .map_or(true, |needed| building_status(base, needed))
}

/// Whether one building is operational.
#[must_use]
pub fn is_building_operational(base: &Base, building: &Building) -> bool {
    building.status == BuildingStatus::Working && dependencies_satisfied(base, building)
}

/// Whether any building of a type is operational.
#[must_use]
pub fn type_operational(base: &Base, building_type: BuildingType) -> bool {
    building_type == BuildingType::Misc
        || base
            .buildings_of_type(building_type)
            .any(|building| is_building_operational(base, building))
}

/// Re-derive the flag of a building's type (`B_CheckUpdateBuilding`).
///
/// The flag takes every building of the type into account, not just this
/// one. Returns whether the flag changed.
pub fn check_update_building(base: &mut Base, id: BuildingId) -> bool {
    let Some(building_type) = base.building(id).map(|building| building.building_type) else {
        return false;
    };
    if building_type == BuildingType::Misc {
        return false;
    }
    let old = building_status(base, building_type);
    let new = type_operational(base, building_type);
    set_building_status(base, building_type, new);
    if old != new {
        tracing::debug!(base = base.id().0, ?building_type, enabled = new, "Building status changed");
    }
    old != new
}

// ============================================================================
// Propagation
// ============================================================================

/// Propagate a flag change of `building_type` to its dependents
/// (`B_UpdateStatusBuilding`).
///
/// With `was_enabled` only dependents that are currently off can switch
/// on; otherwise only dependents that are on can switch off. Hooks fire for
/// every flip. Returns whether any dependent changed.
pub fn update_status_building(
    campaign: &mut Campaign,
    base: BaseId,
    building_type: BuildingType,
    was_enabled: bool,
) -> Result<bool> {
    let limit = campaign.config.resolver_step_limit;
    let mut queue: VecDeque<BuildingType> = campaign
        .templates
        .graph()
        .dependents(building_type)
        .iter()
        .copied()
        .collect();
    let mut changed = false;
    let mut steps = 0u32;

    while let Some(next) = queue.pop_front() {
        steps += 1;
        if steps > limit {
            tracing::warn!(
                base = base.0,
                ?building_type,
                limit,
                "Status propagation hit the step limit"
            );
            break;
        }

        let target = campaign.base_mut(base)?;
        let current = building_status(target, next);
        if current == was_enabled {
            continue;
        }
        if type_operational(target, next) != was_enabled {
            continue;
        }
        set_building_status(target, next, was_enabled);
        tracing::debug!(base = base.0, building_type = ?next, enabled = was_enabled, "Dependent status changed");
        hooks::fire(campaign, base, next, was_enabled);
        changed = true;
        queue.extend(campaign.templates.graph().dependents(next).iter().copied());
    }

    Ok(changed)
}

/// Re-derive the flag of one type and propagate a change to dependents.
/// Returns whether the type itself flipped.
pub fn refresh_type_status(campaign: &mut Campaign, base: BaseId, building_type: BuildingType) -> Result<bool> {
    if building_type == BuildingType::Misc {
        return Ok(false);
    }
    let target = campaign.base_mut(base)?;
    let old = building_status(target, building_type);
    let new = type_operational(target, building_type);
    if old == new {
        return Ok(false);
    }
    set_building_status(target, building_type, new);
    tracing::debug!(base = base.0, ?building_type, enabled = new, "Building status changed");
    hooks::fire(campaign, base, building_type, new);
    update_status_building(campaign, base, building_type, new)?;
    Ok(true)
}

/// Recompute every flag and capacity of a base from scratch
/// (`B_ResetAllStatusAndCapacities`).
///
/// Hooks fire for switched-on types only when `first_enable` is set, as
/// when a base is founded. Restored bases pass `false`.
pub fn reset_all_status_and_capacities(campaign: &mut Campaign, base: BaseId, first_enable: bool) -> Result<()> {
    let limit = campaign.config.resolver_step_limit;
    {
        let target = campaign.base_mut(base)?;
        for building_type in BuildingType::ALL {
            set_building_status(target, building_type, false);
        }
    }

    let mut steps = 0u32;
    let mut progress = true;
    while progress {
        progress = false;
        for building_type in BuildingType::ALL {
            if building_type == BuildingType::Misc {
                continue;
            }
            let target = campaign.base_mut(base)?;
            if building_status(target, building_type) || !type_operational(target, building_type) {
                continue;
            }
            steps += 1;
            if steps > limit {
                tracing::warn!(base = base.0, limit, "Status reset hit the step limit");
                progress = false;
                break;
            }
            set_building_status(target, building_type, true);
            if first_enable {
                hooks::fire(campaign, base, building_type, true);
            }
            progress = true;
        }
    }

    ledger::update_base_capacities(campaign.base_mut(base)?, CapacityScope::All);

    for kind in CapacityKind::ALL {
        let target = campaign.base(base)?;
        let active = match kind {
            CapacityKind::SmallHangar | CapacityKind::LargeHangar => {
                building_status(target, BuildingType::SmallHangar)
                    || building_status(target, BuildingType::Hangar)
            }
            _ => building_status(target, building_type_for_capacity(kind)),
        };
        if active {
            ledger::refresh_current(campaign, base, kind)?;
        }
    }

    ledger::warn_overflow(campaign.base(base)?);
    Ok(())
}
