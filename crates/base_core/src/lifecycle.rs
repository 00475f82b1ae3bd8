//! Building construction lifecycle.
//!
//! Placement starts a construction timer; the daily update finishes
//! buildings whose timer ran out and switches them on. Every status change
//! goes through [`update_building_status`], which keeps flags, capacities
//! and radar coverage in step.

use crate::base::{Base, BaseId, BaseStatus, BuildingId, BuildingStatus};
use crate::campaign::Campaign;
use crate::capacity::{capacity_for_building_type, CapacityKind};
use crate::error::{BaseError, Result};
use crate::events::{CampaignEvent, TriggerKind};
use crate::grid::Tile;
use crate::ledger::{self, CapacityScope};
use crate::radar;
use crate::resolver;
use crate::templates::{BuildingTemplate, BuildingType};

/// Insert a finished building without touching flags or capacities.
///
/// The caller runs a status reset afterwards.
pub(crate) fn insert_finished(
    base: &mut Base,
    template: &BuildingTemplate,
    tile: Tile,
    today: u32,
) -> Result<BuildingId> {
    let tiles = base.grid.resolve_footprint(tile, template.footprint)?;
    let time_start = today.saturating_sub(template.build_time);
    Ok(base.insert_building(template, &tiles, BuildingStatus::Working, time_start))
}

/// Place a new building and start its construction.
///
/// Construction costs are paid up front. Nothing changes on error.
pub fn place_building(
    campaign: &mut Campaign,
    base: BaseId,
    template_id: &str,
    tile: Tile,
) -> Result<BuildingId> {
    let target = campaign.base(base)?;
    if target.status() != BaseStatus::Working {
        return Err(BaseError::BaseNotOperational(base));
    }
    let template = campaign
        .templates
        .by_id(template_id)
        .ok_or_else(|| BaseError::UnknownTemplate(template_id.to_string()))?;

    if template.max_count > 0
        && target.count_buildings_of_template(template.tid) >= template.max_count as usize
    {
        return Err(BaseError::MaxCountReached {
            template: template.id.clone(),
            max: template.max_count,
        });
    }
    if campaign.credits < template.fix_costs {
        return Err(BaseError::InsufficientCredits {
            required: template.fix_costs,
            available: campaign.credits,
        });
    }
    let tiles = target.grid.resolve_footprint(tile, template.footprint)?;

    let template = template.clone();
    let day = campaign.day;
    campaign.credits -= template.fix_costs;
    let target = campaign.base_mut(base)?;
    let id = target.insert_building(&template, &tiles, BuildingStatus::UnderConstruction, day);
    target.current = Some(id);

    tracing::info!(
        base = base.0,
        template = %template.id,
        col = tiles[0].col,
        row = tiles[0].row,
        cost = template.fix_costs,
        "Construction started"
    );
    campaign.emit(CampaignEvent::ConstructionStarted {
        base,
        building: id,
        template: template.id,
    });
    Ok(id)
}

/// Add an already finished building at no cost, as scripted events do.
pub fn build_from_template(
    campaign: &mut Campaign,
    base: BaseId,
    template_id: &str,
    tile: Tile,
) -> Result<BuildingId> {
    campaign.founded_base(base)?;
    let template = campaign
        .templates
        .by_id(template_id)
        .cloned()
        .ok_or_else(|| BaseError::UnknownTemplate(template_id.to_string()))?;
    let day = campaign.day;
    let id = insert_finished(campaign.base_mut(base)?, &template, tile, day)?;
    apply_status_change(campaign, base, template.building_type)?;
    Ok(id)
}

/// Set a building's status and bring flags, capacities and radar up to
/// date (`B_UpdateAllBaseBuildingStatus`).
pub fn update_building_status(
    campaign: &mut Campaign,
    base: BaseId,
    building: BuildingId,
    status: BuildingStatus,
) -> Result<()> {
    let target = campaign.base_mut(base)?;
    let entry = target
        .building_mut(building)
        .ok_or(BaseError::UnknownBuilding { base, building })?;
    entry.status = status;
    let building_type = entry.building_type;
    apply_status_change(campaign, base, building_type)
}

fn apply_status_change(campaign: &mut Campaign, base: BaseId, building_type: BuildingType) -> Result<()> {
    let flipped = resolver::refresh_type_status(campaign, base, building_type)?;
    let kind = capacity_for_building_type(building_type);

    if flipped {
        ledger::update_base_capacities(campaign.base_mut(base)?, CapacityScope::All);
        for kind in CapacityKind::ALL {
            ledger::refresh_current(campaign, base, kind)?;
        }
    } else {
        let scope = kind.map_or(CapacityScope::All, CapacityScope::Kind);
        ledger::update_base_capacities(campaign.base_mut(base)?, scope);
        if let Some(kind) = kind {
            ledger::refresh_current(campaign, base, kind)?;
        }
        if building_type == BuildingType::Radar {
            radar::update_base_coverage(campaign, base);
        }
    }

    #[cfg(feature = "debug-validation")]
    crate::validate::debug_check(campaign, base);
    Ok(())
}

/// Finish every building whose construction time is up
/// (`B_CheckBuildingConstruction`). Returns the number finished.
pub fn check_building_construction(campaign: &mut Campaign, base: BaseId) -> Result<u32> {
    let day = campaign.day;
    let target = campaign.base(base)?;
    let ready: Vec<BuildingId> = target
        .buildings()
        .filter(|building| {
            building.status == BuildingStatus::UnderConstruction && building.is_built_up(day)
        })
        .map(|building| building.id)
        .collect();

    for &building in &ready {
        update_building_status(campaign, base, building, BuildingStatus::Working)?;

        let tid = campaign
            .base(base)?
            .building(building)
            .map(|entry| entry.template)
            .ok_or(BaseError::UnknownBuilding { base, building })?;
        let template = campaign
            .templates
            .get(tid)
            .ok_or_else(|| BaseError::CorruptedState(format!("missing template {}", tid.0)))?;
        let (template_id, on_construct) = (template.id.clone(), template.on_construct.clone());

        tracing::info!(base = base.0, template = %template_id, "Construction finished");
        campaign.emit(CampaignEvent::ConstructionFinished {
            base,
            building,
            template: template_id,
        });
        if let Some(command) = on_construct {
            campaign.emit(CampaignEvent::Trigger {
                base,
                kind: TriggerKind::Construct,
                command,
            });
        }
    }
    Ok(ready.len() as u32)
}

/// Daily update of one base (`B_UpdateBaseData`). Returns the number of
/// buildings finished.
pub fn update_base_data(campaign: &mut Campaign, base: BaseId) -> Result<u32> {
    if !campaign.base(base)?.is_founded() {
        return Ok(0);
    }
    check_building_construction(campaign, base)
}
