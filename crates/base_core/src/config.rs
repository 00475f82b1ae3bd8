//! Campaign configuration.
//!
//! Tunable constants of the base simulation, loaded from RON. Every field
//! has a default so configuration files only need to list overrides.
//!
//! # Example RON
//!
//! ```ron
//! CampaignConfig(
//!     seed: 42,
//!     starting_credits: 500000,
//!     blocked_tiles: 2,
//! )
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::grid::{BASE_SIZE, MIN_BASE_SIZE};
use crate::templates::{read_data_file, DataError};

/// Tunable campaign constants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CampaignConfig {
    /// Seed for every random decision.
    pub seed: u64,
    /// Credits at campaign start.
    pub starting_credits: i64,
    /// Edge length of a base grid.
    pub base_size: u32,
    /// Random blocked tiles added to each new base.
    pub blocked_tiles: u32,
    /// Maximum number of bases.
    pub max_bases: usize,
    /// Storage volume taken by one hired robot.
    pub robot_storage_volume: i32,
    /// Radar range of a level 1 radar.
    pub radar_base_range: i32,
    /// Tracking range of a level 1 radar.
    pub radar_base_tracking_range: i32,
    /// Extra radar range per level above 1, in percent.
    pub radar_upgrade_percent: u32,
    /// Installations allowed per working command centre.
    pub installations_per_base: u32,
    /// Hard cap on installations.
    pub max_installations: u32,
    /// Maximum propagation steps the status resolver may take per call.
    pub resolver_step_limit: u32,
}

impl Default for CampaignConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            starting_credits: 1_000_000,
            base_size: BASE_SIZE,
            blocked_tiles: 0,
            max_bases: 8,
            robot_storage_volume: 300,
            radar_base_range: 24,
            radar_base_tracking_range: 34,
            radar_upgrade_percent: 40,
            installations_per_base: 3,
            max_installations: 16,
            resolver_step_limit: 256,
        }
    }
}

impl CampaignConfig {
    /// Load from a RON file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, DataError> {
        let contents = read_data_file(path.as_ref())?;
        Self::from_ron_str(&contents)
    }

    /// Parse from a RON string.
    pub fn from_ron_str(ron: &str) -> Result<Self, DataError> {
        let config: Self = ron::from_str(ron)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the base model cannot work with.
    pub fn validate(&self) -> Result<(), DataError> {
        if self.base_size < MIN_BASE_SIZE {
            return Err(DataError::Invalid(format!(
                "base_size {} is below the minimum of {MIN_BASE_SIZE}",
                self.base_size
            )));
        }
        Ok(())
    }

    /// Same configuration with a different seed.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }
}
