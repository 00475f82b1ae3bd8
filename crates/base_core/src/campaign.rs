//! The campaign context.
//!
//! [`Campaign`] owns every piece of strategic state the base simulation
//! touches: bases, templates, the item catalogue, the employee pool, the
//! aircraft fleet, credits and the calendar. Every operation receives it
//! explicitly, so independent campaigns can coexist in one process.
//!
//! # Example
//!
//! ```
//! use base_core::campaign::Campaign;
//! use base_core::config::CampaignConfig;
//! use base_core::grid::Tile;
//! use base_core::lifecycle::place_building;
//! use base_core::math::GeoPos;
//! use base_core::storage::ItemCatalog;
//! use base_core::templates::{BuildingTemplateData, BuildingType, TemplateStore};
//!
//! let templates = TemplateStore::from_data(vec![
//!     BuildingTemplateData::new("building_lab", BuildingType::Lab)
//!         .with_capacity(20)
//!         .with_build_time(2),
//! ])
//! .unwrap();
//! let mut campaign = Campaign::new(CampaignConfig::default(), templates, ItemCatalog::default());
//! let base = campaign.found_base("Alpha", GeoPos::default(), None).unwrap();
//!
//! place_building(&mut campaign, base, "building_lab", Tile::new(0, 0)).unwrap();
//! campaign.advance_day().unwrap();
//! campaign.advance_day().unwrap();
//! assert!(campaign.building_status(base, BuildingType::Lab));
//! ```

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::path::Path;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::aircraft::Fleet;
use crate::base::{Base, BaseId, BaseStatus, BuildingStatus};
use crate::capacity::CapacityKind;
use crate::config::CampaignConfig;
use crate::employees::EmployeePool;
use crate::error::{BaseError, Result};
use crate::events::{CampaignEvent, TriggerKind};
use crate::grid::Tile;
use crate::hooks::StatusHooks;
use crate::lifecycle;
use crate::math::GeoPos;
use crate::resolver;
use crate::snapshot;
use crate::storage::ItemCatalog;
use crate::templates::{read_data_file, BuildingType, DataError, TemplateStore};

/// One building of a base template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BaseTemplateEntry {
    /// Building template id.
    pub template: String,
    /// Column of the clicked tile.
    pub col: u32,
    /// Row of the clicked tile.
    pub row: u32,
}

/// Pre-defined layout for a new base.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BaseTemplate {
    /// Template id.
    pub id: String,
    /// Buildings to place, already finished.
    pub buildings: Vec<BaseTemplateEntry>,
}

impl BaseTemplate {
    /// Parse a RON list of base templates.
    pub fn list_from_ron_str(ron: &str) -> std::result::Result<Vec<Self>, DataError> {
        Ok(ron::from_str(ron)?)
    }

    /// Load a RON file of base templates.
    pub fn load_list<P: AsRef<Path>>(path: P) -> std::result::Result<Vec<Self>, DataError> {
        let contents = read_data_file(path.as_ref())?;
        Self::list_from_ron_str(&contents)
    }
}

/// Strategic campaign state.
#[derive(Debug)]
pub struct Campaign {
    pub(crate) config: CampaignConfig,
    pub(crate) templates: TemplateStore,
    pub(crate) catalog: ItemCatalog,
    pub(crate) bases: Vec<Base>,
    pub(crate) employees: EmployeePool,
    pub(crate) fleet: Fleet,
    pub(crate) hooks: StatusHooks,
    pub(crate) rng: ChaCha8Rng,
    pub(crate) events: Vec<CampaignEvent>,
    pub(crate) day: u32,
    pub(crate) credits: i64,
    pub(crate) installation_limit: u32,
}

impl Campaign {
    /// Start a campaign.
    #[must_use]
    pub fn new(config: CampaignConfig, templates: TemplateStore, catalog: ItemCatalog) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(config.seed),
            credits: config.starting_credits,
            config,
            templates,
            catalog,
            bases: Vec::new(),
            employees: EmployeePool::default(),
            fleet: Fleet::default(),
            hooks: StatusHooks::with_defaults(),
            events: Vec::new(),
            day: 0,
            installation_limit: 0,
        }
    }

    /// Configuration.
    #[must_use]
    pub const fn config(&self) -> &CampaignConfig {
        &self.config
    }

    /// Building templates.
    #[must_use]
    pub const fn templates(&self) -> &TemplateStore {
        &self.templates
    }

    /// Item catalogue.
    #[must_use]
    pub const fn catalog(&self) -> &ItemCatalog {
        &self.catalog
    }

    /// Current day.
    #[must_use]
    pub const fn day(&self) -> u32 {
        self.day
    }

    /// Jump the calendar to `day` without running daily updates.
    pub fn set_day(&mut self, day: u32) {
        self.day = day;
    }

    /// Available credits.
    #[must_use]
    pub const fn credits(&self) -> i64 {
        self.credits
    }

    /// Add (or with a negative amount, remove) credits.
    pub fn add_credits(&mut self, amount: i64) {
        self.credits += amount;
    }

    /// Installations allowed across the campaign.
    #[must_use]
    pub const fn installation_limit(&self) -> u32 {
        self.installation_limit
    }

    /// Employee pool.
    #[must_use]
    pub const fn employees(&self) -> &EmployeePool {
        &self.employees
    }

    /// Employee pool, mutably.
    pub fn employees_mut(&mut self) -> &mut EmployeePool {
        &mut self.employees
    }

    /// Aircraft fleet.
    #[must_use]
    pub const fn fleet(&self) -> &Fleet {
        &self.fleet
    }

    /// Status hook table, for registering extra hooks.
    pub fn hooks_mut(&mut self) -> &mut StatusHooks {
        &mut self.hooks
    }

    /// Base by id, destroyed or not.
    pub fn base(&self, id: BaseId) -> Result<&Base> {
        self.bases.get(id.0).ok_or(BaseError::UnknownBase(id))
    }

    pub(crate) fn base_mut(&mut self, id: BaseId) -> Result<&mut Base> {
        self.bases.get_mut(id.0).ok_or(BaseError::UnknownBase(id))
    }

    /// Base by id, failing if it has been destroyed.
    pub fn founded_base(&self, id: BaseId) -> Result<&Base> {
        let base = self.base(id)?;
        if base.is_founded() {
            Ok(base)
        } else {
            Err(BaseError::BaseNotOperational(id))
        }
    }

    /// Bases that have not been destroyed.
    pub fn bases(&self) -> impl Iterator<Item = &Base> {
        self.bases.iter().filter(|base| base.is_founded())
    }

    /// Ids of bases that have not been destroyed.
    #[must_use]
    pub fn founded_base_ids(&self) -> Vec<BaseId> {
        self.bases().map(Base::id).collect()
    }

    /// Number of founded bases.
    #[must_use]
    pub fn founded_base_count(&self) -> usize {
        self.bases().count()
    }

    /// Whether a building type is operational in a base.
    ///
    /// Unknown bases read as `false`.
    #[must_use]
    pub fn building_status(&self, base: BaseId, building_type: BuildingType) -> bool {
        self.base(base)
            .map(|base| resolver::building_status(base, building_type))
            .unwrap_or(false)
    }

    /// Free space of a capacity kind (`B_FreeCapacity`).
    pub fn free_capacity(&self, base: BaseId, kind: CapacityKind) -> Result<i32> {
        Ok(self.base(base)?.capacity(kind).free())
    }

    /// Events recorded so far.
    #[must_use]
    pub fn events(&self) -> &[CampaignEvent] {
        &self.events
    }

    /// Take all recorded events.
    pub fn drain_events(&mut self) -> Vec<CampaignEvent> {
        std::mem::take(&mut self.events)
    }

    pub(crate) fn emit(&mut self, event: CampaignEvent) {
        tracing::debug!(?event, "Campaign event");
        self.events.push(event);
    }

    /// Found a new base.
    ///
    /// With a base template its buildings are placed finished; without one
    /// every mandatory template is placed at a random free position. Random
    /// blocked tiles are added afterwards. Nothing is created on error.
    pub fn found_base(
        &mut self,
        name: impl Into<String>,
        pos: GeoPos,
        template: Option<&BaseTemplate>,
    ) -> Result<BaseId> {
        self.config.validate()?;
        if self.founded_base_count() >= self.config.max_bases {
            return Err(BaseError::TooManyBases(self.config.max_bases));
        }

        let id = BaseId(self.bases.len());
        let mut base = Base::new(id, name, pos, self.config.base_size);

        match template {
            Some(layout) => {
                for entry in &layout.buildings {
                    let tpl = self
                        .templates
                        .by_id(&entry.template)
                        .ok_or_else(|| BaseError::UnknownTemplate(entry.template.clone()))?;
                    lifecycle::insert_finished(&mut base, tpl, Tile::new(entry.col, entry.row), self.day)?;
                }
            }
            None => {
                for tpl in self.templates.mandatory() {
                    if base.count_buildings_of_type(tpl.building_type) > 0 {
                        continue;
                    }
                    let tiles = base
                        .grid
                        .random_free_position(tpl.footprint, &mut self.rng)
                        .ok_or_else(|| {
                            BaseError::CorruptedState(format!(
                                "no room for mandatory building '{}'",
                                tpl.id
                            ))
                        })?;
                    lifecycle::insert_finished(&mut base, tpl, tiles[0], self.day)?;
                }
            }
        }

        base.grid
            .add_blocked_tiles(self.config.blocked_tiles, &mut self.rng);
        self.bases.push(base);

        resolver::reset_all_status_and_capacities(self, id, true)?;
        tracing::info!(base = id.0, "Base founded");
        Ok(id)
    }

    /// Advance the calendar by one day and run the daily base update
    /// (`B_UpdateBaseData`). Returns the number of buildings finished.
    pub fn advance_day(&mut self) -> Result<u32> {
        self.day += 1;
        let mut finished = 0;
        for base in self.founded_base_ids() {
            finished += lifecycle::update_base_data(self, base)?;
        }
        Ok(finished)
    }

    /// Upkeep owed for one month: the running costs of every built building.
    #[must_use]
    pub fn monthly_upkeep(&self) -> i64 {
        self.bases()
            .flat_map(Base::buildings)
            .filter(|building| building.status.contributes_capacity())
            .filter_map(|building| self.templates.get(building.template))
            .map(|template| template.var_costs)
            .sum()
    }

    /// Pay the monthly upkeep. Returns the amount paid.
    pub fn pay_monthly_upkeep(&mut self) -> i64 {
        let amount = self.monthly_upkeep();
        self.credits -= amount;
        self.emit(CampaignEvent::UpkeepPaid { amount });
        amount
    }

    /// Start an alien attack on a base, firing `on_attack` for every
    /// working building.
    pub fn begin_base_attack(&mut self, id: BaseId) -> Result<()> {
        let base = self.founded_base(id)?;
        let commands: Vec<String> = base
            .buildings()
            .filter(|building| building.status == BuildingStatus::Working)
            .filter_map(|building| self.templates.get(building.template))
            .filter_map(|template| template.on_attack.clone())
            .collect();

        self.base_mut(id)?.status = BaseStatus::UnderAttack;
        self.emit(CampaignEvent::BaseAttacked { base: id });
        for command in commands {
            self.emit(CampaignEvent::Trigger {
                base: id,
                kind: TriggerKind::Attack,
                command,
            });
        }
        Ok(())
    }

    /// End an alien attack that the base survived.
    pub fn end_base_attack(&mut self, id: BaseId) -> Result<()> {
        let base = self.base_mut(id)?;
        if base.status == BaseStatus::UnderAttack {
            base.status = BaseStatus::Working;
        }
        Ok(())
    }

    /// Hash of the full strategic state.
    pub fn state_hash(&self) -> Result<u64> {
        let mut hasher = DefaultHasher::new();
        self.day.hash(&mut hasher);
        self.credits.hash(&mut hasher);
        self.installation_limit.hash(&mut hasher);
        for base in &self.bases {
            snapshot::snapshot_base(self, base.id())?
                .to_bytes()?
                .hash(&mut hasher);
            base.has_building.hash(&mut hasher);
            base.capacities.hash(&mut hasher);
        }
        Ok(hasher.finish())
    }
}

/// Recompute the global installation limit from working command centres.
pub fn update_installation_limit(campaign: &mut Campaign, _base: BaseId) {
    let commands = campaign
        .bases()
        .filter(|base| resolver::building_status(base, BuildingType::Command))
        .count() as u32;
    let limit = (commands * campaign.config.installations_per_base)
        .min(campaign.config.max_installations);
    campaign.installation_limit = limit;
    tracing::debug!(limit, "Installation limit updated");
    campaign.emit(CampaignEvent::InstallationLimitUpdated { limit });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::TileCell;
    use crate::templates::BuildingTemplateData;

    fn campaign() -> Campaign {
        let templates = TemplateStore::from_data(vec![
            BuildingTemplateData::new("entrance", BuildingType::Entrance).mandatory(),
            BuildingTemplateData::new("command", BuildingType::Command)
                .mandatory()
                .with_costs(0, 100),
            BuildingTemplateData::new("lab", BuildingType::Lab)
                .with_capacity(10)
                .with_costs(500, 40)
                .with_triggers(None, Some("alert_lab"), None),
        ])
        .unwrap();
        Campaign::new(CampaignConfig::default(), templates, ItemCatalog::default())
    }

    #[test]
    fn test_found_base_with_mandatory_buildings() {
        let mut campaign = campaign();
        let id = campaign.found_base("Alpha", GeoPos::default(), None).unwrap();
        let base = campaign.base(id).unwrap();
        assert_eq!(base.count_buildings_of_type(BuildingType::Entrance), 1);
        assert_eq!(base.count_buildings_of_type(BuildingType::Command), 1);
        assert_eq!(base.count_buildings_of_type(BuildingType::Lab), 0);
        assert!(campaign.building_status(id, BuildingType::Command));
        assert_eq!(campaign.installation_limit(), 3);
    }

    #[test]
    fn test_found_base_from_template() {
        let mut campaign = campaign();
        let layout = BaseTemplate {
            id: "main".into(),
            buildings: vec![
                BaseTemplateEntry {
                    template: "entrance".into(),
                    col: 0,
                    row: 0,
                },
                BaseTemplateEntry {
                    template: "lab".into(),
                    col: 1,
                    row: 0,
                },
            ],
        };
        let id = campaign
            .found_base("Alpha", GeoPos::default(), Some(&layout))
            .unwrap();
        assert!(campaign.building_status(id, BuildingType::Lab));
        assert_eq!(campaign.base(id).unwrap().capacity(CapacityKind::LabSpace).max, 10);
        // A template fixes the layout: mandatory buildings are not added.
        assert_eq!(
            campaign.base(id).unwrap().count_buildings_of_type(BuildingType::Command),
            0
        );
    }

    #[test]
    fn test_found_base_from_bad_template_creates_nothing() {
        let mut campaign = campaign();
        let layout = BaseTemplate {
            id: "broken".into(),
            buildings: vec![
                BaseTemplateEntry {
                    template: "lab".into(),
                    col: 0,
                    row: 0,
                },
                BaseTemplateEntry {
                    template: "lab".into(),
                    col: 0,
                    row: 0,
                },
            ],
        };
        let err = campaign
            .found_base("Alpha", GeoPos::default(), Some(&layout))
            .unwrap_err();
        assert!(matches!(err, BaseError::TileOccupied(_)));
        assert_eq!(campaign.founded_base_count(), 0);
    }

    #[test]
    fn test_max_bases() {
        let mut campaign = campaign();
        campaign.config.max_bases = 1;
        campaign.found_base("Alpha", GeoPos::default(), None).unwrap();
        assert!(matches!(
            campaign.found_base("Beta", GeoPos::default(), None),
            Err(BaseError::TooManyBases(1))
        ));
    }

    #[test]
    fn test_found_base_rejects_tiny_grid() {
        let mut campaign = campaign();
        campaign.config.base_size = 1;
        assert!(matches!(
            campaign.found_base("Alpha", GeoPos::default(), None),
            Err(BaseError::Data(crate::templates::DataError::Invalid(_)))
        ));
        assert_eq!(campaign.founded_base_count(), 0);
    }

    #[test]
    fn test_monthly_upkeep() {
        let mut campaign = campaign();
        let id = campaign.found_base("Alpha", GeoPos::default(), None).unwrap();
        assert_eq!(campaign.monthly_upkeep(), 100);

        let (free, _) = campaign
            .base(id)
            .unwrap()
            .grid()
            .tiles()
            .find(|&(_, cell)| cell == TileCell::Empty)
            .unwrap();
        lifecycle::place_building(&mut campaign, id, "lab", free).unwrap();
        // Buildings under construction cost nothing yet.
        assert_eq!(campaign.monthly_upkeep(), 100);

        let before = campaign.credits();
        assert_eq!(campaign.pay_monthly_upkeep(), 100);
        assert_eq!(campaign.credits(), before - 100);
    }

    #[test]
    fn test_base_attack_fires_on_attack_triggers() {
        let mut campaign = campaign();
        let layout = BaseTemplate {
            id: "main".into(),
            buildings: vec![BaseTemplateEntry {
                template: "lab".into(),
                col: 2,
                row: 2,
            }],
        };
        let id = campaign
            .found_base("Alpha", GeoPos::default(), Some(&layout))
            .unwrap();
        campaign.drain_events();

        campaign.begin_base_attack(id).unwrap();
        assert_eq!(campaign.base(id).unwrap().status(), BaseStatus::UnderAttack);
        assert!(campaign.events().contains(&CampaignEvent::Trigger {
            base: id,
            kind: TriggerKind::Attack,
            command: "alert_lab".into(),
        }));

        campaign.end_base_attack(id).unwrap();
        assert_eq!(campaign.base(id).unwrap().status(), BaseStatus::Working);
    }

    #[test]
    fn test_state_hash_is_deterministic() {
        let build = || {
            let mut campaign = campaign();
            campaign.config.blocked_tiles = 3;
            campaign.found_base("Alpha", GeoPos::default(), None).unwrap();
            campaign.state_hash().unwrap()
        };
        assert_eq!(build(), build());
    }
}
