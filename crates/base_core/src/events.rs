//! Events emitted by the base simulation.
//!
//! The core never talks to the UI, the mission system or the script
//! engine directly. It records what happened as [`CampaignEvent`]s which
//! the outer layers drain after each call.

use serde::{Deserialize, Serialize};

use crate::aircraft::AircraftId;
use crate::base::{BaseId, BuildingId};
use crate::employees::{EmployeeId, EmployeeType};
use crate::math::{fixed_serde, Fixed, GeoPos};
use crate::templates::BuildingType;

/// Which template trigger fired.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TriggerKind {
    /// `on_construct`.
    Construct,
    /// `on_attack`.
    Attack,
    /// `on_destroy`.
    Destroy,
}

/// Something that happened in the campaign.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CampaignEvent {
    /// A building was placed and construction began.
    ConstructionStarted {
        /// Base.
        base: BaseId,
        /// New building.
        building: BuildingId,
        /// Template id.
        template: String,
    },
    /// Construction of a building finished.
    ConstructionFinished {
        /// Base.
        base: BaseId,
        /// Finished building.
        building: BuildingId,
        /// Template id.
        template: String,
    },
    /// A building was removed.
    BuildingDestroyed {
        /// Base.
        base: BaseId,
        /// Template id.
        template: String,
    },
    /// A template trigger command must be executed by the script engine.
    Trigger {
        /// Base.
        base: BaseId,
        /// Trigger kind.
        kind: TriggerKind,
        /// Command text.
        command: String,
    },
    /// A building type became operational or stopped being operational.
    StatusChanged {
        /// Base.
        base: BaseId,
        /// Building type.
        building_type: BuildingType,
        /// New status.
        enabled: bool,
    },
    /// Radar coverage was recomputed.
    RadarCoverageUpdated {
        /// Base.
        base: BaseId,
        /// New radar range.
        #[serde(with = "fixed_serde")]
        range: Fixed,
    },
    /// The global installation limit was recomputed.
    InstallationLimitUpdated {
        /// New limit.
        limit: u32,
    },
    /// Captive aliens died.
    CaptivesKilled {
        /// Base.
        base: BaseId,
        /// Number of aliens killed.
        count: i32,
    },
    /// Stored items were destroyed to fit the storage capacity.
    ItemsDestroyed {
        /// Base.
        base: BaseId,
        /// Item id.
        item: String,
        /// Units destroyed.
        amount: i32,
    },
    /// Antimatter was lost.
    AntimatterLost {
        /// Base.
        base: BaseId,
        /// Units lost.
        amount: i32,
    },
    /// An employee was deleted.
    EmployeeDeleted {
        /// Base the employee was hired at.
        base: BaseId,
        /// Employee.
        employee: EmployeeId,
        /// Employee type.
        kind: EmployeeType,
    },
    /// An aircraft was destroyed.
    AircraftDestroyed {
        /// Former homebase.
        base: BaseId,
        /// Aircraft.
        aircraft: AircraftId,
    },
    /// An aircraft moved to a new homebase.
    AircraftRehomed {
        /// Aircraft.
        aircraft: AircraftId,
        /// Previous homebase.
        from: BaseId,
        /// New homebase.
        to: BaseId,
    },
    /// An aircraft went down over land and its crew needs rescuing.
    RescueMissionSpawned {
        /// Lost aircraft.
        aircraft: AircraftId,
        /// Crash site.
        pos: GeoPos,
    },
    /// Aliens started attacking a base.
    BaseAttacked {
        /// Base.
        base: BaseId,
    },
    /// A base was destroyed.
    BaseDestroyed {
        /// Base.
        base: BaseId,
    },
    /// Monthly upkeep was paid.
    UpkeepPaid {
        /// Credits spent.
        amount: i64,
    },
}
