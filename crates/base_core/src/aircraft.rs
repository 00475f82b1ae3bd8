//! Aircraft and hangar occupancy.
//!
//! An aircraft always occupies a slot in its homebase hangar, even while it
//! is flying a mission.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::base::BaseId;
use crate::campaign::Campaign;
use crate::capacity::{building_type_for_capacity, CapacityKind};
use crate::error::{BaseError, Result};
use crate::events::CampaignEvent;
use crate::ledger;
use crate::math::GeoPos;
use crate::resolver;

/// Hangar class an aircraft needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AircraftSize {
    /// Interceptors.
    Small,
    /// Transporters.
    Large,
}

impl AircraftSize {
    /// Hangar capacity this size occupies.
    #[must_use]
    pub const fn capacity(self) -> CapacityKind {
        match self {
            Self::Small => CapacityKind::SmallHangar,
            Self::Large => CapacityKind::LargeHangar,
        }
    }
}

/// Unique aircraft identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AircraftId(pub u32);

/// Where an aircraft is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AircraftLocation {
    /// Parked in the homebase hangar.
    InBase,
    /// Flying.
    Away {
        /// Current position.
        pos: GeoPos,
        /// Whether it is over water.
        over_water: bool,
    },
}

/// One aircraft.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Aircraft {
    /// Identifier.
    pub id: AircraftId,
    /// Display name.
    pub name: String,
    /// Hangar class.
    pub size: AircraftSize,
    /// Base owning the hangar slot.
    pub homebase: BaseId,
    /// Current location.
    pub location: AircraftLocation,
}

/// Every aircraft in the campaign.
#[derive(Debug, Clone, Default)]
pub struct Fleet {
    aircraft: Vec<Aircraft>,
    next_id: u32,
}

impl Fleet {
    /// Aircraft by id.
    #[must_use]
    pub fn get(&self, id: AircraftId) -> Option<&Aircraft> {
        self.aircraft.iter().find(|aircraft| aircraft.id == id)
    }

    fn get_mut(&mut self, id: AircraftId) -> Option<&mut Aircraft> {
        self.aircraft.iter_mut().find(|aircraft| aircraft.id == id)
    }

    /// All aircraft.
    pub fn iter(&self) -> impl Iterator<Item = &Aircraft> {
        self.aircraft.iter()
    }

    /// Aircraft based at `base`.
    pub fn based_at(&self, base: BaseId) -> impl Iterator<Item = &Aircraft> {
        self.aircraft
            .iter()
            .filter(move |aircraft| aircraft.homebase == base)
    }

    /// Number of aircraft occupying a hangar kind at a base.
    #[must_use]
    pub fn count_in_hangar(&self, base: BaseId, kind: CapacityKind) -> i32 {
        self.based_at(base)
            .filter(|aircraft| aircraft.size.capacity() == kind)
            .count() as i32
    }

    fn add(&mut self, name: String, size: AircraftSize, homebase: BaseId) -> AircraftId {
        let id = AircraftId(self.next_id);
        self.next_id += 1;
        self.aircraft.push(Aircraft {
            id,
            name,
            size,
            homebase,
            location: AircraftLocation::InBase,
        });
        id
    }

    fn remove(&mut self, id: AircraftId) -> Option<Aircraft> {
        let index = self.aircraft.iter().position(|aircraft| aircraft.id == id)?;
        Some(self.aircraft.remove(index))
    }
}

/// Refresh both hangar kinds of a base (`AIR_UpdateHangarCapForAll`).
pub fn update_hangar_cap_for_all(campaign: &mut Campaign, base: BaseId) -> Result<()> {
    ledger::refresh_current(campaign, base, CapacityKind::SmallHangar)?;
    ledger::refresh_current(campaign, base, CapacityKind::LargeHangar)
}

fn check_hangar(campaign: &Campaign, base: BaseId, size: AircraftSize) -> Result<()> {
    let kind = size.capacity();
    let target = campaign.founded_base(base)?;
    let hangar = building_type_for_capacity(kind);
    if !resolver::building_status(target, hangar) {
        return Err(BaseError::NoFunctionalBuilding(hangar));
    }
    let free = campaign.fleet.count_in_hangar(base, kind);
    let free = target.capacity(kind).max - free;
    if free < 1 {
        return Err(BaseError::NoCapacity {
            kind,
            required: 1,
            free,
        });
    }
    Ok(())
}

/// Buy an aircraft into a base hangar.
pub fn buy_aircraft(
    campaign: &mut Campaign,
    base: BaseId,
    size: AircraftSize,
    name: impl Into<String>,
) -> Result<AircraftId> {
    check_hangar(campaign, base, size)?;
    let id = campaign.fleet.add(name.into(), size, base);
    ledger::refresh_current(campaign, base, size.capacity())?;
    Ok(id)
}

/// Launch an aircraft.
pub fn send_away(campaign: &mut Campaign, id: AircraftId, pos: GeoPos, over_water: bool) -> Result<()> {
    let aircraft = campaign
        .fleet
        .get_mut(id)
        .ok_or(BaseError::UnknownAircraft(id))?;
    aircraft.location = AircraftLocation::Away { pos, over_water };
    Ok(())
}

/// Park an aircraft at its homebase.
pub fn return_home(campaign: &mut Campaign, id: AircraftId) -> Result<()> {
    let aircraft = campaign
        .fleet
        .get_mut(id)
        .ok_or(BaseError::UnknownAircraft(id))?;
    aircraft.location = AircraftLocation::InBase;
    Ok(())
}

/// Whether `base` has a free, working hangar slot for the aircraft.
#[must_use]
pub fn can_move_into_homebase(campaign: &Campaign, id: AircraftId, base: BaseId) -> bool {
    campaign
        .fleet
        .get(id)
        .is_some_and(|aircraft| aircraft.homebase != base && check_hangar(campaign, base, aircraft.size).is_ok())
}

/// Transfer an aircraft to a new homebase.
pub fn move_to_new_homebase(campaign: &mut Campaign, id: AircraftId, to: BaseId) -> Result<()> {
    let aircraft = campaign.fleet.get(id).ok_or(BaseError::UnknownAircraft(id))?;
    let (from, size) = (aircraft.homebase, aircraft.size);
    check_hangar(campaign, to, size)?;

    if let Some(aircraft) = campaign.fleet.get_mut(id) {
        aircraft.homebase = to;
    }
    ledger::refresh_current(campaign, to, size.capacity())?;
    if campaign.base(from).is_ok() {
        ledger::refresh_current(campaign, from, size.capacity())?;
    }
    tracing::info!(aircraft = id.0, from = from.0, to = to.0, "Aircraft moved to new homebase");
    campaign.emit(CampaignEvent::AircraftRehomed { aircraft: id, from, to });
    Ok(())
}

fn destroy_aircraft(campaign: &mut Campaign, id: AircraftId) {
    if let Some(aircraft) = campaign.fleet.remove(id) {
        tracing::info!(aircraft = id.0, base = aircraft.homebase.0, "Aircraft destroyed");
        campaign.emit(CampaignEvent::AircraftDestroyed {
            base: aircraft.homebase,
            aircraft: id,
        });
    }
}

/// Move an aircraft to any other base that can take it, or lose it.
///
/// A lost aircraft that is flying over land leaves a crash site for a
/// rescue mission.
pub fn relocate_or_lose(campaign: &mut Campaign, id: AircraftId) -> Result<()> {
    let aircraft = campaign.fleet.get(id).ok_or(BaseError::UnknownAircraft(id))?;
    let location = aircraft.location;

    let new_home = campaign
        .founded_base_ids()
        .into_iter()
        .find(|&base| can_move_into_homebase(campaign, id, base));
    if let Some(to) = new_home {
        return move_to_new_homebase(campaign, id, to);
    }

    if let AircraftLocation::Away {
        pos,
        over_water: false,
    } = location
    {
        campaign.emit(CampaignEvent::RescueMissionSpawned { aircraft: id, pos });
    }
    destroy_aircraft(campaign, id);
    Ok(())
}

/// Get rid of aircraft until a hangar kind fits its capacity.
///
/// Parked aircraft are destroyed first, picked at random. Once none are
/// left, flying aircraft are relocated or lost.
pub fn remove_exceeding_aircraft(campaign: &mut Campaign, base: BaseId, kind: CapacityKind) -> Result<()> {
    loop {
        ledger::refresh_current(campaign, base, kind)?;
        if campaign.free_capacity(base, kind)? >= 0 {
            return Ok(());
        }

        let (parked, away): (Vec<&Aircraft>, Vec<&Aircraft>) = campaign
            .fleet
            .based_at(base)
            .filter(|aircraft| aircraft.size.capacity() == kind)
            .partition(|aircraft| aircraft.location == AircraftLocation::InBase);
        let parked: Vec<AircraftId> = parked.into_iter().map(|aircraft| aircraft.id).collect();
        let away: Vec<AircraftId> = away.into_iter().map(|aircraft| aircraft.id).collect();

        if !parked.is_empty() {
            let pick = campaign.rng.gen_range(0..parked.len());
            destroy_aircraft(campaign, parked[pick]);
        } else if !away.is_empty() {
            let pick = campaign.rng.gen_range(0..away.len());
            relocate_or_lose(campaign, away[pick])?;
        } else {
            return Err(BaseError::CorruptedState(format!(
                "{kind:?} over capacity with no aircraft to remove"
            )));
        }
    }
}

/// Rehome or lose every aircraft of a base that is being destroyed.
pub(crate) fn evacuate_base(campaign: &mut Campaign, base: BaseId) -> Result<()> {
    let ids: Vec<AircraftId> = campaign.fleet.based_at(base).map(|aircraft| aircraft.id).collect();
    for id in ids {
        let flying = campaign
            .fleet
            .get(id)
            .is_some_and(|aircraft| aircraft.location != AircraftLocation::InBase);
        if flying {
            relocate_or_lose(campaign, id)?;
        } else {
            destroy_aircraft(campaign, id);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_size_maps_to_hangar() {
        assert_eq!(AircraftSize::Small.capacity(), CapacityKind::SmallHangar);
        assert_eq!(AircraftSize::Large.capacity(), CapacityKind::LargeHangar);
    }

    #[test]
    fn test_fleet_counts_away_aircraft() {
        let mut fleet = Fleet::default();
        let a = fleet.add("Stiletto".into(), AircraftSize::Small, BaseId(0));
        let b = fleet.add("Firebird".into(), AircraftSize::Large, BaseId(0));
        fleet.add("Raptor".into(), AircraftSize::Small, BaseId(1));

        fleet.get_mut(a).unwrap().location = AircraftLocation::Away {
            pos: GeoPos::default(),
            over_water: true,
        };
        assert_eq!(fleet.count_in_hangar(BaseId(0), CapacityKind::SmallHangar), 1);
        assert_eq!(fleet.count_in_hangar(BaseId(0), CapacityKind::LargeHangar), 1);
        assert_eq!(fleet.based_at(BaseId(0)).count(), 2);

        assert!(fleet.remove(b).is_some());
        assert!(fleet.get(b).is_none());
        assert_eq!(fleet.count_in_hangar(BaseId(0), CapacityKind::LargeHangar), 0);
    }
}
