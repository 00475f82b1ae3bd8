//! Bases and the building instances they own.
//!
//! Buildings live in a slab arena addressed by a generation-checked
//! [`BuildingId`]. A separate dense `order` list keeps construction order,
//! which doubles as the building's compact index: removing a building only
//! drops its entry from `order`, so no other record needs rewriting.

use serde::{Deserialize, Serialize};
use slab::Slab;

use crate::aliens::AlienContainment;
use crate::capacity::{Capacities, Capacity, CapacityKind};
use crate::grid::{BaseGrid, Tile};
use crate::math::{Fixed, GeoPos};
use crate::radar::Radar;
use crate::storage::ItemStorage;
use crate::templates::{BuildingTemplate, BuildingType, Footprint, TemplateId, MAX_BUILDING_TYPE};

/// Index of a base in the campaign.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BaseId(pub usize);

/// Handle of a building inside its base.
///
/// Handles are never reused: a handle to a destroyed building stays invalid
/// even after its arena slot is recycled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BuildingId {
    slot: u32,
    generation: u32,
}

impl BuildingId {
    /// Create a handle from raw parts.
    #[must_use]
    pub const fn new(slot: u32, generation: u32) -> Self {
        Self { slot, generation }
    }
}

/// Lifecycle status of a base.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BaseStatus {
    /// Normal operation.
    Working,
    /// Aliens are attacking the base.
    UnderAttack,
    /// The base is gone.
    Destroyed,
}

/// Lifecycle status of a building.
///
/// The ordering matters: anything at or above `ConstructionFinished`
/// contributes capacity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum BuildingStatus {
    /// Not placed, or being removed.
    NotSet,
    /// Waiting for the construction timer.
    UnderConstruction,
    /// Construction done, not yet switched on.
    ConstructionFinished,
    /// Switched on.
    Working,
    /// Present but out of order.
    Down,
}

impl BuildingStatus {
    /// Whether the building counts toward its capacity kind.
    #[must_use]
    pub fn contributes_capacity(self) -> bool {
        self >= Self::ConstructionFinished
    }
}

/// Missile and laser defence batteries available to a base.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct DefenceBatteries {
    /// Missile batteries.
    pub missile: u32,
    /// Laser batteries.
    pub laser: u32,
}

/// A building placed in a base.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Building {
    /// Handle of this building.
    pub id: BuildingId,
    /// Template it was built from.
    pub template: TemplateId,
    /// Functional category.
    pub building_type: BuildingType,
    /// Tiles covered.
    pub footprint: Footprint,
    /// Capacity granted once built.
    pub capacity: i32,
    /// Type that must be operational for this building to work.
    pub depends_type: Option<BuildingType>,
    /// Left-most tile.
    pub pos: Tile,
    /// Lifecycle status.
    pub status: BuildingStatus,
    /// Day construction started.
    pub time_start: u32,
    /// Construction time in days.
    pub build_time: u32,
    /// Upgrade level.
    #[serde(with = "crate::math::fixed_serde")]
    pub level: Fixed,
}

impl Building {
    /// Tiles covered by the building.
    #[must_use]
    pub fn tiles(&self) -> Vec<Tile> {
        (0..self.footprint.width())
            .map(|dx| Tile::new(self.pos.col + dx, self.pos.row))
            .collect()
    }

    /// Whether the construction timer has run out on `today`.
    #[must_use]
    pub const fn is_built_up(&self, today: u32) -> bool {
        self.time_start + self.build_time <= today
    }

    /// Days left until construction finishes.
    #[must_use]
    pub fn construction_days_left(&self, today: u32) -> u32 {
        (self.time_start + self.build_time).saturating_sub(today)
    }

    /// Construction progress as a percentage (0-100).
    #[must_use]
    pub fn construction_percentage(&self, today: u32) -> u32 {
        if self.status >= BuildingStatus::ConstructionFinished || self.build_time == 0 {
            100
        } else {
            let elapsed = today.saturating_sub(self.time_start).min(self.build_time);
            elapsed * 100 / self.build_time
        }
    }
}

/// A player base.
#[derive(Debug, Clone)]
pub struct Base {
    id: BaseId,
    /// Display name.
    pub name: String,
    /// Geoscape position.
    pub pos: GeoPos,
    pub(crate) status: BaseStatus,
    /// How interesting the base is to the aliens.
    pub alien_interest: Fixed,
    pub(crate) grid: BaseGrid,
    buildings: Slab<Building>,
    order: Vec<BuildingId>,
    next_generation: u32,
    pub(crate) has_building: [bool; MAX_BUILDING_TYPE],
    pub(crate) capacities: Capacities,
    pub(crate) current: Option<BuildingId>,
    pub(crate) storage: ItemStorage,
    pub(crate) containment: AlienContainment,
    pub(crate) radar: Radar,
    pub(crate) batteries: DefenceBatteries,
}

impl Base {
    /// Create an empty, working base.
    #[must_use]
    pub fn new(id: BaseId, name: impl Into<String>, pos: GeoPos, grid_size: u32) -> Self {
        let mut has_building = [false; MAX_BUILDING_TYPE];
        has_building[BuildingType::Misc.index()] = true;
        Self {
            id,
            name: name.into(),
            pos,
            status: BaseStatus::Working,
            alien_interest: Fixed::ZERO,
            grid: BaseGrid::new(grid_size),
            buildings: Slab::new(),
            order: Vec::new(),
            next_generation: 0,
            has_building,
            capacities: Capacities::default(),
            current: None,
            storage: ItemStorage::default(),
            containment: AlienContainment::default(),
            radar: Radar::default(),
            batteries: DefenceBatteries::default(),
        }
    }

    /// Base id.
    #[must_use]
    pub const fn id(&self) -> BaseId {
        self.id
    }

    /// Base status.
    #[must_use]
    pub const fn status(&self) -> BaseStatus {
        self.status
    }

    /// Whether the base exists (not destroyed).
    #[must_use]
    pub fn is_founded(&self) -> bool {
        self.status != BaseStatus::Destroyed
    }

    /// Tile grid.
    #[must_use]
    pub const fn grid(&self) -> &BaseGrid {
        &self.grid
    }

    /// Capacity table.
    #[must_use]
    pub const fn capacities(&self) -> &Capacities {
        &self.capacities
    }

    /// One capacity entry.
    #[must_use]
    pub fn capacity(&self, kind: CapacityKind) -> Capacity {
        self.capacities.get(kind)
    }

    /// Item storage.
    #[must_use]
    pub const fn storage(&self) -> &ItemStorage {
        &self.storage
    }

    /// Alien containment.
    #[must_use]
    pub const fn containment(&self) -> &AlienContainment {
        &self.containment
    }

    /// Radar coverage.
    #[must_use]
    pub const fn radar(&self) -> &Radar {
        &self.radar
    }

    /// Defence batteries.
    #[must_use]
    pub const fn batteries(&self) -> DefenceBatteries {
        self.batteries
    }

    /// The currently selected building.
    #[must_use]
    pub const fn current(&self) -> Option<BuildingId> {
        self.current
    }

    /// Select a building.
    pub fn set_current(&mut self, building: Option<BuildingId>) {
        self.current = building;
    }

    /// Building by handle.
    #[must_use]
    pub fn building(&self, id: BuildingId) -> Option<&Building> {
        self.buildings
            .get(id.slot as usize)
            .filter(|building| building.id == id)
    }

    pub(crate) fn building_mut(&mut self, id: BuildingId) -> Option<&mut Building> {
        self.buildings
            .get_mut(id.slot as usize)
            .filter(|building| building.id == id)
    }

    /// Buildings in construction order.
    pub fn buildings(&self) -> impl Iterator<Item = &Building> + '_ {
        self.order
            .iter()
            .filter_map(move |&id| self.buildings.get(id.slot as usize))
    }

    /// Handles in construction order.
    #[must_use]
    pub fn building_ids(&self) -> Vec<BuildingId> {
        self.order.clone()
    }

    /// Number of buildings.
    #[must_use]
    pub fn building_count(&self) -> usize {
        self.order.len()
    }

    /// Compact index of a building (its position in construction order).
    #[must_use]
    pub fn building_index(&self, id: BuildingId) -> Option<usize> {
        self.order.iter().position(|&other| other == id)
    }

    /// Building at a compact index.
    #[must_use]
    pub fn building_at_index(&self, index: usize) -> Option<&Building> {
        self.order.get(index).and_then(|&id| self.building(id))
    }

    /// Building covering a tile.
    #[must_use]
    pub fn building_at(&self, tile: Tile) -> Option<&Building> {
        match self.grid.get(tile) {
            Some(crate::grid::TileCell::Occupied(id)) => self.building(id),
            _ => None,
        }
    }

    /// Buildings of a type.
    pub fn buildings_of_type(
        &self,
        building_type: BuildingType,
    ) -> impl Iterator<Item = &Building> + '_ {
        self.buildings()
            .filter(move |building| building.building_type == building_type)
    }

    /// Number of buildings of a type, in any status
    /// (`B_GetNumberOfBuildingsInBaseByBuildingType`).
    #[must_use]
    pub fn count_buildings_of_type(&self, building_type: BuildingType) -> usize {
        self.buildings_of_type(building_type).count()
    }

    /// Number of buildings built from a template.
    #[must_use]
    pub fn count_buildings_of_template(&self, template: TemplateId) -> usize {
        self.buildings()
            .filter(|building| building.template == template)
            .count()
    }

    /// Tiles covered by entrance buildings.
    #[must_use]
    pub fn entrance_tiles(&self) -> Vec<Tile> {
        self.buildings_of_type(BuildingType::Entrance)
            .flat_map(Building::tiles)
            .collect()
    }

    /// Add a building on `tiles` (left-most first) and occupy them.
    pub(crate) fn insert_building(
        &mut self,
        template: &BuildingTemplate,
        tiles: &[Tile],
        status: BuildingStatus,
        time_start: u32,
    ) -> BuildingId {
        let entry = self.buildings.vacant_entry();
        let id = BuildingId::new(entry.key() as u32, self.next_generation);
        self.next_generation = self.next_generation.wrapping_add(1);
        entry.insert(Building {
            id,
            template: template.tid,
            building_type: template.building_type,
            footprint: template.footprint,
            capacity: template.capacity,
            depends_type: template.depends_type,
            pos: tiles[0],
            status,
            time_start,
            build_time: template.build_time,
            level: template.level,
        });
        self.order.push(id);
        self.grid.occupy(tiles, id);
        id
    }

    /// Drop a building from the arena and order list.
    ///
    /// Grid tiles are left to the caller, which validates them first.
    pub(crate) fn remove_building(&mut self, id: BuildingId) -> Option<Building> {
        self.building(id)?;
        self.order.retain(|&other| other != id);
        Some(self.buildings.remove(id.slot as usize))
    }
}
