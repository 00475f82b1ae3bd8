//! Scenario execution and reports.
//!
//! [`CampaignData`] bundles the RON data a campaign starts from.
//! [`run_scenario`] applies a scenario's orders in sequence. Refused orders
//! are recorded and the run continues; a fatal error aborts it.

use std::path::Path;

use base_core::aircraft;
use base_core::aliens;
use base_core::base::{Base, BaseId, BaseStatus, BuildingId, BuildingStatus};
use base_core::campaign::{BaseTemplate, Campaign};
use base_core::capacity::CapacityKind;
use base_core::config::CampaignConfig;
use base_core::destruction;
use base_core::employees;
use base_core::error::{BaseError, Result as BaseResult};
use base_core::events::CampaignEvent;
use base_core::grid::Tile;
use base_core::lifecycle;
use base_core::math::GeoPos;
use base_core::resolver;
use base_core::storage::{self, ItemCatalog};
use base_core::templates::{BuildingType, TemplateStore};
use serde::Serialize;

use crate::scenario::{Scenario, ScenarioAction, ScenarioError};

/// Everything a campaign is created from.
#[derive(Debug, Clone)]
pub struct CampaignData {
    /// Tunable constants.
    pub config: CampaignConfig,
    /// Building templates.
    pub templates: TemplateStore,
    /// Item catalogue.
    pub catalog: ItemCatalog,
    /// Named base layouts.
    pub layouts: Vec<BaseTemplate>,
}

impl CampaignData {
    /// Load every data file. Without a config file the defaults apply.
    pub fn load(
        config: Option<&Path>,
        templates: &Path,
        items: &Path,
        layouts: Option<&Path>,
    ) -> Result<Self, ScenarioError> {
        let config = match config {
            Some(path) => CampaignConfig::load(path)?,
            None => CampaignConfig::default(),
        };
        let templates = TemplateStore::load(templates)?;
        let catalog = ItemCatalog::load(items)?;
        let layouts = match layouts {
            Some(path) => BaseTemplate::load_list(path)?,
            None => Vec::new(),
        };
        tracing::info!(
            templates = templates.len(),
            layouts = layouts.len(),
            seed = config.seed,
            "Campaign data loaded"
        );
        Ok(Self {
            config,
            templates,
            catalog,
            layouts,
        })
    }

    /// Layout by id.
    #[must_use]
    pub fn layout(&self, id: &str) -> Option<&BaseTemplate> {
        self.layouts.iter().find(|layout| layout.id == id)
    }

    /// Layout entries naming templates that do not exist.
    #[must_use]
    pub fn unknown_layout_templates(&self) -> Vec<(String, String)> {
        self.layouts
            .iter()
            .flat_map(|layout| {
                layout
                    .buildings
                    .iter()
                    .filter(|entry| self.templates.by_id(&entry.template).is_none())
                    .map(|entry| (layout.id.clone(), entry.template.clone()))
            })
            .collect()
    }
}

/// An order the campaign refused.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Refusal {
    /// Index of the action.
    pub index: usize,
    /// Why it was refused.
    pub reason: String,
}

/// Usage and maximum of one capacity kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CapacityReport {
    /// Capacity kind.
    pub kind: CapacityKind,
    /// In use.
    pub cur: i32,
    /// Maximum.
    pub max: i32,
}

/// One building.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BuildingReport {
    /// Template id.
    pub template: String,
    /// Left-most tile.
    pub pos: Tile,
    /// Lifecycle status.
    pub status: BuildingStatus,
    /// Days until construction finishes.
    pub days_left: u32,
}

/// Final state of one base.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BaseReport {
    /// Founding index.
    pub index: usize,
    /// Name.
    pub name: String,
    /// Base status.
    pub status: BaseStatus,
    /// Operational building types.
    pub operational: Vec<BuildingType>,
    /// Buildings in construction order.
    pub buildings: Vec<BuildingReport>,
    /// Capacity table.
    pub capacities: Vec<CapacityReport>,
    /// Radar range in whole degrees.
    pub radar_range: i32,
    /// Missile and laser batteries.
    pub batteries: (u32, u32),
    /// Market value of the stored items.
    pub storage_value: i64,
}

/// Outcome of a scenario run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunReport {
    /// Scenario name.
    pub scenario: String,
    /// Seed used.
    pub seed: u64,
    /// Final day.
    pub day: u32,
    /// Final credits.
    pub credits: i64,
    /// Installation limit.
    pub installation_limit: u32,
    /// Hash of the final state.
    pub state_hash: u64,
    /// Orders the campaign refused.
    pub refusals: Vec<Refusal>,
    /// Every event emitted during the run.
    pub events: Vec<CampaignEvent>,
    /// Final state of every base.
    pub bases: Vec<BaseReport>,
}

impl RunReport {
    /// Pretty JSON.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

fn base_report(campaign: &Campaign, base: &Base) -> BaseReport {
    let day = campaign.day();
    BaseReport {
        index: base.id().0,
        name: base.name.clone(),
        status: base.status(),
        operational: BuildingType::ALL
            .into_iter()
            .filter(|&building_type| building_type != BuildingType::Misc)
            .filter(|&building_type| resolver::building_status(base, building_type))
            .collect(),
        buildings: base
            .buildings()
            .map(|building| BuildingReport {
                template: campaign
                    .templates()
                    .get(building.template)
                    .map_or_else(String::new, |template| template.id.clone()),
                pos: building.pos,
                status: building.status,
                days_left: if building.status == BuildingStatus::UnderConstruction {
                    building.construction_days_left(day)
                } else {
                    0
                },
            })
            .collect(),
        capacities: base
            .capacities()
            .iter()
            .map(|(kind, capacity)| CapacityReport {
                kind,
                cur: capacity.cur,
                max: capacity.max,
            })
            .collect(),
        radar_range: base.radar().range.to_num(),
        batteries: (base.batteries().missile, base.batteries().laser),
        storage_value: storage::storage_value(campaign, base.id()).unwrap_or_default(),
    }
}

fn building_on(campaign: &Campaign, base: BaseId, col: u32, row: u32) -> BaseResult<BuildingId> {
    let tile = Tile::new(col, row);
    campaign
        .base(base)?
        .building_at(tile)
        .map(|building| building.id)
        .ok_or(BaseError::InvalidPosition(tile))
}

fn apply(campaign: &mut Campaign, data: &CampaignData, action: &ScenarioAction) -> Result<BaseResult<()>, ScenarioError> {
    let result = match action {
        ScenarioAction::Found {
            name,
            lon,
            lat,
            layout,
        } => {
            let layout = match layout {
                Some(id) => Some(
                    data.layout(id)
                        .ok_or_else(|| ScenarioError::UnknownLayout(id.clone()))?,
                ),
                None => None,
            };
            campaign
                .found_base(name.clone(), GeoPos::from_degrees(*lon, *lat), layout)
                .map(|_| ())
        }
        ScenarioAction::Place {
            base,
            template,
            col,
            row,
        } => lifecycle::place_building(campaign, BaseId(*base), template, Tile::new(*col, *row)).map(|_| ()),
        ScenarioAction::Destroy { base, col, row } => building_on(campaign, BaseId(*base), *col, *row)
            .and_then(|id| destruction::building_destroy(campaign, BaseId(*base), id)),
        ScenarioAction::SetStatus {
            base,
            col,
            row,
            status,
        } => building_on(campaign, BaseId(*base), *col, *row)
            .and_then(|id| lifecycle::update_building_status(campaign, BaseId(*base), id, *status)),
        ScenarioAction::Hire { base, kind, count } => (0..*count).try_for_each(|n| {
            let id = campaign
                .employees_mut()
                .add_unhired(*kind, format!("{kind:?} {n}"));
            employees::hire(campaign, BaseId(*base), id)
        }),
        ScenarioAction::AddItems { base, item, amount } => {
            storage::add_to_storage(campaign, BaseId(*base), item, *amount).map(|_| ())
        }
        ScenarioAction::AddCaptives { base, race, amount } => {
            aliens::add_captives(campaign, BaseId(*base), race, *amount).map(|_| ())
        }
        ScenarioAction::BuyAircraft { base, size, name } => {
            aircraft::buy_aircraft(campaign, BaseId(*base), *size, name.clone()).map(|_| ())
        }
        ScenarioAction::AdvanceDays(days) => (0..*days).try_for_each(|_| campaign.advance_day().map(|_| ())),
        ScenarioAction::PayUpkeep => {
            campaign.pay_monthly_upkeep();
            Ok(())
        }
        ScenarioAction::Attack { base } => campaign.begin_base_attack(BaseId(*base)),
        ScenarioAction::EndAttack { base } => campaign.end_base_attack(BaseId(*base)),
        ScenarioAction::DestroyBase { base } => destruction::destroy_base(campaign, BaseId(*base)),
    };
    Ok(result)
}

/// Run a scenario on a fresh campaign.
pub fn run_scenario(data: &CampaignData, scenario: &Scenario) -> Result<RunReport, ScenarioError> {
    let config = match scenario.seed {
        Some(seed) => data.config.clone().with_seed(seed),
        None => data.config.clone(),
    };
    let seed = config.seed;
    let mut campaign = Campaign::new(config, data.templates.clone(), data.catalog.clone());
    let mut refusals = Vec::new();
    let mut events = Vec::new();

    tracing::info!(scenario = %scenario.name, seed, actions = scenario.actions.len(), "Running scenario");

    for (index, action) in scenario.actions.iter().enumerate() {
        tracing::debug!(index, ?action, "Applying action");
        match apply(&mut campaign, data, action)? {
            Ok(()) => {}
            Err(err) if err.is_fatal() => {
                tracing::error!(index, %err, "Fatal campaign error");
                return Err(ScenarioError::Fatal { index, source: err });
            }
            Err(err) => {
                tracing::warn!(index, %err, "Action refused");
                refusals.push(Refusal {
                    index,
                    reason: err.to_string(),
                });
            }
        }
        events.extend(campaign.drain_events());
    }

    let state_hash = campaign
        .state_hash()
        .map_err(|source| ScenarioError::Fatal {
            index: scenario.actions.len(),
            source,
        })?;
    let bases = campaign
        .bases()
        .map(|base| base_report(&campaign, base))
        .collect();

    Ok(RunReport {
        scenario: scenario.name.clone(),
        seed,
        day: campaign.day(),
        credits: campaign.credits(),
        installation_limit: campaign.installation_limit(),
        state_hash,
        refusals,
        events,
        bases,
    })
}
