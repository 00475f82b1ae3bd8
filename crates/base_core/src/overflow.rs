//! Capacity overflow enforcement.
//!
//! After a capacity maximum shrinks, whatever no longer fits is removed:
//! stored items and robots at random, antimatter by the excess, staff by
//! type priority, aircraft at random and captives by killing them.

use rand::Rng;

use crate::aircraft;
use crate::aliens;
use crate::base::BaseId;
use crate::campaign::Campaign;
use crate::capacity::CapacityKind;
use crate::employees::{self, EmployeeType};
use crate::error::Result;
use crate::events::CampaignEvent;
use crate::ledger;
use crate::storage::ItemId;

/// Something in storage that can be thrown out.
#[derive(Debug, Clone, Copy)]
enum StorageEntry {
    Item(ItemId),
    Robot,
}

/// Remove whatever exceeds a capacity kind.
pub fn enforce_capacity(campaign: &mut Campaign, base: BaseId, kind: CapacityKind) -> Result<()> {
    ledger::refresh_current(campaign, base, kind)?;
    if campaign.free_capacity(base, kind)? >= 0 {
        return Ok(());
    }

    match kind {
        CapacityKind::Items => remove_exceeding_items(campaign, base)?,
        CapacityKind::Antimatter => remove_exceeding_antimatter(campaign, base)?,
        CapacityKind::Employees => employees::delete_exceeding_employees(campaign, base)?,
        CapacityKind::SmallHangar | CapacityKind::LargeHangar => {
            aircraft::remove_exceeding_aircraft(campaign, base, kind)?;
        }
        CapacityKind::Aliens => aliens::remove_exceeding_captives(campaign, base)?,
        CapacityKind::LabSpace | CapacityKind::Workspace => {}
    }

    ledger::refresh_current(campaign, base, kind)?;
    let capacity = campaign.base(base)?.capacity(kind);
    if capacity.is_overflowing() {
        tracing::warn!(base = base.0, ?kind, cur = capacity.cur, max = capacity.max, "Capacity still exceeded");
    }
    Ok(())
}

/// Enforce every capacity kind.
pub fn enforce_all(campaign: &mut Campaign, base: BaseId) -> Result<()> {
    for kind in CapacityKind::ALL {
        enforce_capacity(campaign, base, kind)?;
    }
    Ok(())
}

/// Throw out random storage entries until the storage fits.
///
/// Every stored item type is one candidate, and every hired robot is one
/// more. Picking an item type destroys all of its units; picking a robot
/// deletes one robot.
pub fn remove_exceeding_items(campaign: &mut Campaign, base: BaseId) -> Result<()> {
    loop {
        ledger::refresh_current(campaign, base, CapacityKind::Items)?;
        if campaign.free_capacity(base, CapacityKind::Items)? >= 0 {
            return Ok(());
        }

        let target = campaign.base(base)?;
        let mut candidates: Vec<StorageEntry> = target
            .storage
            .iter()
            .filter(|&(item, amount)| amount > 0 && campaign.catalog.stored_in_base_storage(item))
            .map(|(item, _)| StorageEntry::Item(item))
            .collect();
        let robots = campaign.employees.count_hired(base, EmployeeType::Robot);
        candidates.extend((0..robots).map(|_| StorageEntry::Robot));
        if candidates.is_empty() {
            return Ok(());
        }

        let pick = campaign.rng.gen_range(0..candidates.len());
        match candidates[pick] {
            StorageEntry::Item(item) => {
                let amount = campaign.base_mut(base)?.storage.remove_all(item);
                let item = campaign
                    .catalog
                    .get(item)
                    .map_or_else(String::new, |def| def.id.clone());
                tracing::info!(base = base.0, %item, amount, "Stored items destroyed");
                campaign.emit(CampaignEvent::ItemsDestroyed { base, item, amount });
            }
            StorageEntry::Robot => {
                employees::delete_one_robot(campaign, base);
            }
        }
    }
}

/// Drop antimatter beyond the facility capacity.
pub fn remove_exceeding_antimatter(campaign: &mut Campaign, base: BaseId) -> Result<()> {
    ledger::refresh_current(campaign, base, CapacityKind::Antimatter)?;
    let excess = -campaign.free_capacity(base, CapacityKind::Antimatter)?;
    let Some(item) = campaign.catalog.antimatter() else {
        return Ok(());
    };
    if excess <= 0 {
        return Ok(());
    }
    campaign.base_mut(base)?.storage.add(item, -excess);
    ledger::refresh_current(campaign, base, CapacityKind::Antimatter)?;
    tracing::info!(base = base.0, amount = excess, "Antimatter lost");
    campaign.emit(CampaignEvent::AntimatterLost {
        base,
        amount: excess,
    });
    Ok(())
}
