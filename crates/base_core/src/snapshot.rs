//! Base snapshots for save games.
//!
//! A snapshot stores what cannot be derived: the grid, the buildings with
//! their timers and levels, stock and captives. Tiles reference buildings
//! by compact index. Defence batteries and radar ranges are saved as well
//! but rebuilt on restore, like status flags and capacities; a mismatch is
//! logged.

use serde::{Deserialize, Serialize};

use crate::aliens::Captive;
use crate::base::{Base, BaseId, BaseStatus, BuildingStatus, DefenceBatteries};
use crate::campaign::{self, Campaign};
use crate::error::{BaseError, Result};
use crate::grid::{Tile, TileCell};
use crate::math::{fixed_serde, Fixed, GeoPos};
use crate::radar::{self, Radar};
use crate::resolver;

/// One tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileSnapshot {
    /// Compact index of the building on the tile.
    pub building: Option<usize>,
    /// Whether the tile is blocked.
    pub blocked: bool,
}

/// One building.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildingSnapshot {
    /// Template id.
    pub template: String,
    /// Left-most tile.
    pub pos: Tile,
    /// Lifecycle status.
    pub status: BuildingStatus,
    /// Day construction started.
    pub time_start: u32,
    /// Upgrade level.
    #[serde(with = "fixed_serde")]
    pub level: Fixed,
}

/// Persistent state of a base.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BaseSnapshot {
    /// Display name.
    pub name: String,
    /// Geoscape position.
    pub pos: GeoPos,
    /// Base status.
    pub status: BaseStatus,
    /// Alien interest.
    #[serde(with = "fixed_serde")]
    pub alien_interest: Fixed,
    /// Grid edge length.
    pub size: u32,
    /// Tiles in row-major order.
    pub tiles: Vec<TileSnapshot>,
    /// Buildings in construction order.
    pub buildings: Vec<BuildingSnapshot>,
    /// Stored items by id.
    pub storage: Vec<(String, i32)>,
    /// Captives per race.
    pub captives: Vec<Captive>,
    /// Defence batteries at save time.
    pub batteries: DefenceBatteries,
    /// Radar coverage at save time.
    pub radar: Radar,
}

impl BaseSnapshot {
    /// Encode with bincode.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        bincode::serialize(self).map_err(|e| BaseError::Snapshot(e.to_string()))
    }

    /// Decode from bincode.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        bincode::deserialize(bytes).map_err(|e| BaseError::Snapshot(e.to_string()))
    }
}

/// Capture a base.
pub fn snapshot_base(campaign: &Campaign, id: BaseId) -> Result<BaseSnapshot> {
    let base = campaign.base(id)?;

    let tiles = base
        .grid()
        .tiles()
        .map(|(tile, cell)| match cell {
            TileCell::Empty => Ok(TileSnapshot {
                building: None,
                blocked: false,
            }),
            TileCell::Blocked => Ok(TileSnapshot {
                building: None,
                blocked: true,
            }),
            TileCell::Occupied(building) => base
                .building_index(building)
                .map(|index| TileSnapshot {
                    building: Some(index),
                    blocked: false,
                })
                .ok_or(BaseError::TileMismatch { base: id, tile }),
        })
        .collect::<Result<Vec<_>>>()?;

    let buildings = base
        .buildings()
        .map(|building| {
            let template = campaign.templates().get(building.template).ok_or_else(|| {
                BaseError::CorruptedState(format!("missing template {}", building.template.0))
            })?;
            Ok(BuildingSnapshot {
                template: template.id.clone(),
                pos: building.pos,
                status: building.status,
                time_start: building.time_start,
                level: building.level,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    let storage = base
        .storage()
        .iter()
        .filter_map(|(item, amount)| {
            campaign
                .catalog()
                .get(item)
                .map(|def| (def.id.clone(), amount))
        })
        .collect();

    Ok(BaseSnapshot {
        name: base.name.clone(),
        pos: base.pos,
        status: base.status(),
        alien_interest: base.alien_interest,
        size: base.grid().size(),
        tiles,
        buildings,
        storage,
        captives: base.containment().captives().to_vec(),
        batteries: base.batteries(),
        radar: *base.radar(),
    })
}

fn corrupted(message: impl Into<String>) -> BaseError {
    BaseError::CorruptedState(message.into())
}

fn rebuild(campaign: &Campaign, id: BaseId, snapshot: &BaseSnapshot) -> Result<Base> {
    let size = snapshot.size;
    if size < 2 || snapshot.tiles.len() != (size * size) as usize {
        return Err(corrupted(format!(
            "grid of size {size} with {} tiles",
            snapshot.tiles.len()
        )));
    }

    let mut base = Base::new(id, snapshot.name.clone(), snapshot.pos, size);
    base.status = snapshot.status;
    base.alien_interest = snapshot.alien_interest;

    let tile_at = |index: usize| Tile::new(index as u32 % size, index as u32 / size);

    for (index, entry) in snapshot.buildings.iter().enumerate() {
        let template = campaign
            .templates()
            .by_id(&entry.template)
            .ok_or_else(|| BaseError::UnknownTemplate(entry.template.clone()))?;
        let mut tiles: Vec<Tile> = snapshot
            .tiles
            .iter()
            .enumerate()
            .filter(|(_, tile)| tile.building == Some(index))
            .map(|(position, _)| tile_at(position))
            .collect();
        tiles.sort_by_key(|tile| (tile.row, tile.col));

        let expected: Vec<Tile> = (0..template.footprint.width())
            .map(|dx| Tile::new(entry.pos.col + dx, entry.pos.row))
            .collect();
        if tiles != expected {
            return Err(corrupted(format!(
                "building {index} ('{}') does not match its tiles",
                entry.template
            )));
        }
        if tiles.iter().any(|&tile| !base.grid.is_available(tile)) {
            return Err(corrupted(format!("building {index} overlaps another")));
        }

        let building = base.insert_building(template, &tiles, entry.status, entry.time_start);
        if let Some(restored) = base.building_mut(building) {
            restored.level = entry.level;
        }
    }

    for (position, tile) in snapshot.tiles.iter().enumerate() {
        if let Some(index) = tile.building {
            if index >= snapshot.buildings.len() {
                return Err(corrupted(format!("tile references missing building {index}")));
            }
        }
        if tile.blocked {
            base.grid.set(tile_at(position), TileCell::Blocked);
        }
    }

    for (item_id, amount) in &snapshot.storage {
        let item = campaign
            .catalog()
            .by_id(item_id)
            .ok_or_else(|| BaseError::UnknownItem(item_id.clone()))?;
        base.storage.add(item, *amount);
    }
    for captive in &snapshot.captives {
        base.containment.add(&captive.race, captive.alive, captive.dead);
    }
    Ok(base)
}

/// Restore a base as a new base of the campaign.
///
/// Flags and capacities are recomputed without firing status hooks; radar
/// coverage and the installation limit are refreshed afterwards.
pub fn restore_base(campaign: &mut Campaign, snapshot: &BaseSnapshot) -> Result<BaseId> {
    let id = BaseId(campaign.bases.len());
    let base = rebuild(campaign, id, snapshot)?;
    campaign.bases.push(base);

    resolver::reset_all_status_and_capacities(campaign, id, false)?;
    radar::update_base_coverage(campaign, id);
    campaign::update_installation_limit(campaign, id);

    let restored = campaign.base(id)?;
    if restored.batteries() != snapshot.batteries || *restored.radar() != snapshot.radar {
        tracing::warn!(
            base = id.0,
            saved_missile = snapshot.batteries.missile,
            saved_laser = snapshot.batteries.laser,
            "Saved batteries or radar differ from the rebuilt base"
        );
    }
    tracing::info!(base = id.0, buildings = snapshot.buildings.len(), "Base restored");
    Ok(id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CampaignConfig;
    use crate::lifecycle;
    use crate::storage::ItemCatalog;
    use crate::templates::{BuildingTemplateData, BuildingType, Footprint, TemplateStore};

    fn campaign() -> (Campaign, BaseId) {
        let templates = TemplateStore::from_data(vec![
            BuildingTemplateData::new("lab", BuildingType::Lab).with_capacity(10),
            BuildingTemplateData::new("hangar", BuildingType::Hangar)
                .double()
                .with_capacity(2)
                .with_build_time(5),
        ])
        .unwrap();
        let mut config = CampaignConfig::default();
        config.blocked_tiles = 2;
        let mut campaign = Campaign::new(config, templates, ItemCatalog::default());
        let base = campaign.found_base("Alpha", GeoPos::from_degrees(10, -20), None).unwrap();
        (campaign, base)
    }

    fn free_tile(campaign: &Campaign, base: BaseId, footprint: Footprint) -> Tile {
        let grid = campaign.base(base).unwrap().grid();
        grid.tiles()
            .map(|(tile, _)| tile)
            .find(|&tile| grid.resolve_footprint(tile, footprint).is_ok())
            .unwrap()
    }

    #[test]
    fn test_snapshot_restore_matches() {
        let (mut campaign, base) = campaign();
        let tile = free_tile(&campaign, base, Footprint::Single);
        lifecycle::build_from_template(&mut campaign, base, "lab", tile).unwrap();
        let tile = free_tile(&campaign, base, Footprint::Double);
        lifecycle::place_building(&mut campaign, base, "hangar", tile).unwrap();

        let snapshot = snapshot_base(&campaign, base).unwrap();
        let bytes = snapshot.to_bytes().unwrap();
        let decoded = BaseSnapshot::from_bytes(&bytes).unwrap();
        assert_eq!(decoded, snapshot);

        let restored = restore_base(&mut campaign, &decoded).unwrap();
        let original = campaign.base(base).unwrap();
        let copy = campaign.base(restored).unwrap();
        assert_eq!(copy.grid(), original.grid());
        assert_eq!(copy.has_building, original.has_building);
        assert_eq!(copy.capacities(), original.capacities());
        assert_eq!(snapshot_base(&campaign, restored).unwrap(), snapshot);
    }

    #[test]
    fn test_bad_tile_reference_rejected() {
        let (mut campaign, base) = campaign();
        let mut snapshot = snapshot_base(&campaign, base).unwrap();
        snapshot.tiles[0] = TileSnapshot {
            building: Some(7),
            blocked: false,
        };
        let err = restore_base(&mut campaign, &snapshot).unwrap_err();
        assert!(err.is_fatal());
        assert_eq!(campaign.founded_base_count(), 1);
    }

    #[test]
    fn test_garbage_bytes_rejected() {
        assert!(matches!(
            BaseSnapshot::from_bytes(&[1, 2, 3]),
            Err(BaseError::Snapshot(_))
        ));
    }
}
