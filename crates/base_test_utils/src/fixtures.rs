//! Test fixtures and helpers.
//!
//! A standard set of building templates, an item catalogue and a compact
//! base layout, so tests across crates start from the same campaign.

use base_core::base::{BaseId, BuildingId};
use base_core::campaign::{BaseTemplate, BaseTemplateEntry, Campaign};
use base_core::config::CampaignConfig;
use base_core::grid::Tile;
use base_core::lifecycle;
use base_core::math::GeoPos;
use base_core::storage::ItemCatalog;
use base_core::templates::{BuildingType, Footprint, TemplateStore};
use fixed::types::I32F32;

/// Create a fixed-point number from an integer.
#[must_use]
pub fn fixed(n: i32) -> I32F32 {
    I32F32::from_num(n)
}

/// One template per building type. Power feeds most buildings and the
/// radar needs the command centre.
pub const STANDARD_TEMPLATES: &str = r#"[
    BuildingTemplateData(id: "building_entrance", name: "Entrance", building_type: Entrance),
    BuildingTemplateData(id: "building_powerplant", name: "Power Plant", building_type: Power,
        fix_costs: 15000, var_costs: 1000, build_time: 6),
    BuildingTemplateData(id: "building_command", name: "Command Centre", building_type: Command,
        fix_costs: 20000, var_costs: 1500, build_time: 8, depends_on: Some("building_powerplant"),
        max_count: 1),
    BuildingTemplateData(id: "building_quarters", name: "Living Quarters", building_type: Quarters,
        capacity: 10, fix_costs: 10000, var_costs: 500, build_time: 5),
    BuildingTemplateData(id: "building_storage", name: "Storage", building_type: Storage,
        capacity: 100, fix_costs: 8000, var_costs: 400, build_time: 4),
    BuildingTemplateData(id: "building_lab", name: "Laboratory", building_type: Lab,
        capacity: 10, fix_costs: 30000, var_costs: 2000, build_time: 8,
        depends_on: Some("building_powerplant"), on_construct: Some("lab_online")),
    BuildingTemplateData(id: "building_workshop", name: "Workshop", building_type: Workshop,
        capacity: 10, fix_costs: 25000, var_costs: 2000, build_time: 8,
        depends_on: Some("building_powerplant")),
    BuildingTemplateData(id: "building_hangar", name: "Hangar", building_type: Hangar,
        footprint: Double, capacity: 1, fix_costs: 50000, var_costs: 3000, build_time: 10,
        depends_on: Some("building_powerplant")),
    BuildingTemplateData(id: "building_intercept", name: "Small Hangar", building_type: SmallHangar,
        capacity: 1, fix_costs: 30000, var_costs: 2000, build_time: 8,
        depends_on: Some("building_powerplant")),
    BuildingTemplateData(id: "building_aliencontainment", name: "Alien Containment",
        building_type: AlienContainment, capacity: 10, fix_costs: 20000, var_costs: 1500,
        build_time: 8, depends_on: Some("building_powerplant")),
    BuildingTemplateData(id: "building_antimatter", name: "Antimatter Storage",
        building_type: Antimatter, capacity: 50, fix_costs: 40000, var_costs: 2500,
        build_time: 10, depends_on: Some("building_powerplant")),
    BuildingTemplateData(id: "building_radar", name: "Radar", building_type: Radar,
        fix_costs: 50000, var_costs: 5000, build_time: 10, depends_on: Some("building_command"),
        level: 1),
    BuildingTemplateData(id: "building_hospital", name: "Hospital", building_type: Hospital,
        fix_costs: 12000, var_costs: 800, build_time: 6, depends_on: Some("building_powerplant")),
    BuildingTemplateData(id: "building_missile", name: "Missile Battery",
        building_type: DefenceMissile, fix_costs: 20000, var_costs: 1000, build_time: 5,
        depends_on: Some("building_powerplant"), on_attack: Some("missile_fire")),
    BuildingTemplateData(id: "building_laser", name: "Laser Battery",
        building_type: DefenceLaser, fix_costs: 30000, var_costs: 1500, build_time: 7,
        depends_on: Some("building_powerplant"), on_destroy: Some("laser_lost")),
]"#;

/// Items with volumes that add up to round numbers.
pub const STANDARD_ITEMS: &str = r#"[
    ItemDef(id: "assault_rifle", name: "Assault Rifle", volume: 20, price: 1200),
    ItemDef(id: "rifle_ammo", name: "Rifle Magazine", volume: 1, price: 40),
    ItemDef(id: "medikit", name: "Medikit", volume: 5, price: 300),
    ItemDef(id: "antimatter", name: "Antimatter", volume: 1, price: 5000, is_antimatter: true),
    ItemDef(id: "research_credit", name: "Research Credit", is_virtual: true),
]"#;

/// The standard template store.
///
/// # Panics
///
/// Panics if [`STANDARD_TEMPLATES`] does not parse.
#[must_use]
pub fn standard_templates() -> TemplateStore {
    TemplateStore::from_ron_str(STANDARD_TEMPLATES).expect("standard templates parse")
}

/// The standard item catalogue.
///
/// # Panics
///
/// Panics if [`STANDARD_ITEMS`] does not parse.
#[must_use]
pub fn standard_catalog() -> ItemCatalog {
    ItemCatalog::from_ron_str(STANDARD_ITEMS).expect("standard items parse")
}

/// Configuration without blocked tiles, so layouts are predictable.
#[must_use]
pub fn test_config(seed: u64) -> CampaignConfig {
    CampaignConfig {
        seed,
        starting_credits: 10_000_000,
        blocked_tiles: 0,
        ..CampaignConfig::default()
    }
}

/// Campaign with the standard templates and items.
#[must_use]
pub fn standard_campaign(seed: u64) -> Campaign {
    Campaign::new(test_config(seed), standard_templates(), standard_catalog())
}

/// Campaign with custom templates and the standard items.
#[must_use]
pub fn campaign_with(templates: TemplateStore, seed: u64) -> Campaign {
    Campaign::new(test_config(seed), templates, standard_catalog())
}

fn entry(template: &str, col: u32, row: u32) -> BaseTemplateEntry {
    BaseTemplateEntry {
        template: template.to_string(),
        col,
        row,
    }
}

/// Compact layout of every standard building, connected to the entrance.
///
/// ```text
/// row 0: entrance  power     command   quarters  storage
/// row 1: lab       workshop  hangar    hangar    intercept
/// row 2: alien     antimat.  radar     hospital  missile
/// ```
#[must_use]
pub fn standard_layout() -> BaseTemplate {
    BaseTemplate {
        id: "standard".to_string(),
        buildings: vec![
            entry("building_entrance", 0, 0),
            entry("building_powerplant", 1, 0),
            entry("building_command", 2, 0),
            entry("building_quarters", 3, 0),
            entry("building_storage", 4, 0),
            entry("building_lab", 0, 1),
            entry("building_workshop", 1, 1),
            entry("building_hangar", 2, 1),
            entry("building_intercept", 4, 1),
            entry("building_aliencontainment", 0, 2),
            entry("building_antimatter", 1, 2),
            entry("building_radar", 2, 2),
            entry("building_hospital", 3, 2),
            entry("building_missile", 4, 2),
        ],
    }
}

/// Standard campaign with one fully built base.
///
/// # Panics
///
/// Panics if the layout does not fit the grid.
#[must_use]
pub fn standard_base(seed: u64) -> (Campaign, BaseId) {
    let mut campaign = standard_campaign(seed);
    let base = campaign
        .found_base("Alpha", GeoPos::from_degrees(12, 48), Some(&standard_layout()))
        .expect("standard layout fits");
    (campaign, base)
}

/// First tile where `footprint` fits, scanning row by row.
#[must_use]
pub fn free_tile(campaign: &Campaign, base: BaseId, footprint: Footprint) -> Option<Tile> {
    let grid = campaign.base(base).ok()?.grid();
    grid.tiles()
        .map(|(tile, _)| tile)
        .find(|&tile| grid.resolve_footprint(tile, footprint).is_ok())
}

/// Add a finished building at the first free tile.
///
/// # Panics
///
/// Panics if the template is unknown or there is no room.
pub fn place_working(campaign: &mut Campaign, base: BaseId, template_id: &str) -> BuildingId {
    let footprint = campaign
        .templates()
        .by_id(template_id)
        .map(|template| template.footprint)
        .expect("known template");
    let tile = free_tile(campaign, base, footprint).expect("room for building");
    lifecycle::build_from_template(campaign, base, template_id, tile).expect("building placed")
}

/// First building of a type in a base.
#[must_use]
pub fn building_of_type(campaign: &Campaign, base: BaseId, building_type: BuildingType) -> Option<BuildingId> {
    campaign
        .base(base)
        .ok()?
        .buildings_of_type(building_type)
        .map(|building| building.id)
        .next()
}

#[cfg(test)]
mod tests {
    use super::*;
    use base_core::capacity::CapacityKind;

    #[test]
    fn test_fixed_helper() {
        assert_eq!(fixed(3), I32F32::from_num(3));
    }

    #[test]
    fn test_standard_data_parses() {
        assert_eq!(standard_templates().len(), 15);
        assert!(standard_catalog().antimatter().is_some());
        assert!(standard_templates().graph().find_cycle().is_none());
    }

    #[test]
    fn test_standard_base_is_fully_operational() {
        let (campaign, base) = standard_base(1);
        for building_type in BuildingType::ALL {
            if matches!(building_type, BuildingType::Misc | BuildingType::DefenceLaser) {
                continue;
            }
            assert!(
                campaign.building_status(base, building_type),
                "{building_type:?} should be operational"
            );
        }
        let target = campaign.base(base).unwrap();
        assert_eq!(target.capacity(CapacityKind::Items).max, 100);
        assert_eq!(target.capacity(CapacityKind::LargeHangar).max, 1);
    }

    #[test]
    fn test_place_working_uses_free_tile() {
        let (mut campaign, base) = standard_base(1);
        let id = place_working(&mut campaign, base, "building_quarters");
        let target = campaign.base(base).unwrap();
        assert_eq!(target.building(id).unwrap().pos, Tile::new(0, 3));
        assert_eq!(target.capacity(CapacityKind::Employees).max, 20);
    }
}
