//! Scenario loading.
//!
//! A scenario is a RON script of orders against a campaign: found bases,
//! place and destroy buildings, hire staff, move stock and let days pass.
//! Bases are referenced by their founding index.
//!
//! # Example RON
//!
//! ```ron
//! Scenario(
//!     name: "Quick build",
//!     seed: Some(7),
//!     actions: [
//!         Found(name: "Alpha", lon: 10, lat: 50, layout: Some("main")),
//!         Place(base: 0, template: "building_lab", col: 0, row: 3),
//!         AdvanceDays(8),
//!     ],
//! )
//! ```

use std::path::Path;

use base_core::aircraft::AircraftSize;
use base_core::base::BuildingStatus;
use base_core::employees::EmployeeType;
use base_core::error::BaseError;
use base_core::templates::DataError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error type for scenario operations.
#[derive(Error, Debug)]
pub enum ScenarioError {
    /// File not found.
    #[error("Scenario file not found: {0}")]
    FileNotFound(String),
    /// Failed to read file.
    #[error("Failed to read scenario file: {0}")]
    ReadError(#[from] std::io::Error),
    /// Failed to parse RON.
    #[error("Failed to parse scenario: {0}")]
    ParseError(#[from] ron::error::SpannedError),
    /// Campaign data could not be loaded.
    #[error("Failed to load campaign data: {0}")]
    Data(#[from] DataError),
    /// A base layout named by the scenario does not exist.
    #[error("Unknown base layout: {0}")]
    UnknownLayout(String),
    /// The campaign reached a state it cannot continue from.
    #[error("Fatal error in action {index}: {source}")]
    Fatal {
        /// Index of the failing action.
        index: usize,
        /// Underlying error.
        source: BaseError,
    },
}

/// One order of a scenario.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScenarioAction {
    /// Found a base, optionally from a named layout.
    Found {
        /// Base name.
        name: String,
        /// Longitude in degrees.
        lon: i32,
        /// Latitude in degrees.
        lat: i32,
        /// Base layout id.
        #[serde(default)]
        layout: Option<String>,
    },
    /// Start construction of a building.
    Place {
        /// Base index.
        base: usize,
        /// Building template id.
        template: String,
        /// Clicked column.
        col: u32,
        /// Clicked row.
        row: u32,
    },
    /// Destroy the building on a tile.
    Destroy {
        /// Base index.
        base: usize,
        /// Column.
        col: u32,
        /// Row.
        row: u32,
    },
    /// Change the status of the building on a tile.
    SetStatus {
        /// Base index.
        base: usize,
        /// Column.
        col: u32,
        /// Row.
        row: u32,
        /// New status.
        status: BuildingStatus,
    },
    /// Hire new employees.
    Hire {
        /// Base index.
        base: usize,
        /// Employee type.
        kind: EmployeeType,
        /// Number to hire.
        count: u32,
    },
    /// Add (or remove, if negative) items.
    AddItems {
        /// Base index.
        base: usize,
        /// Item id.
        item: String,
        /// Amount.
        amount: i32,
    },
    /// Bring captured aliens in.
    AddCaptives {
        /// Base index.
        base: usize,
        /// Alien race.
        race: String,
        /// Number captured.
        amount: i32,
    },
    /// Buy an aircraft.
    BuyAircraft {
        /// Base index.
        base: usize,
        /// Hangar class.
        size: AircraftSize,
        /// Aircraft name.
        name: String,
    },
    /// Let days pass.
    AdvanceDays(u32),
    /// Pay the monthly upkeep.
    PayUpkeep,
    /// Start an alien attack.
    Attack {
        /// Base index.
        base: usize,
    },
    /// End an alien attack.
    EndAttack {
        /// Base index.
        base: usize,
    },
    /// Destroy a whole base.
    DestroyBase {
        /// Base index.
        base: usize,
    },
}

/// A complete scenario.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scenario {
    /// Scenario name.
    pub name: String,
    /// Human-readable description.
    #[serde(default)]
    pub description: String,
    /// Overrides the configured seed.
    #[serde(default)]
    pub seed: Option<u64>,
    /// Orders, applied in sequence.
    pub actions: Vec<ScenarioAction>,
}

impl Scenario {
    /// Load a scenario from a RON file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ScenarioError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ScenarioError::FileNotFound(path.display().to_string()));
        }
        let contents = std::fs::read_to_string(path)?;
        Self::from_ron_str(&contents)
    }

    /// Load from a RON string (useful for embedded scenarios).
    pub fn from_ron_str(ron: &str) -> Result<Self, ScenarioError> {
        let scenario: Scenario = ron::from_str(ron)?;
        Ok(scenario)
    }
}
