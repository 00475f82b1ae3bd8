//! Determinism testing utilities.
//!
//! Provides a harness for verifying that a campaign produces identical
//! results given identical inputs.
//!
//! # Testing Strategy
//!
//! Two campaigns created from the same configuration and fed the same
//! orders must end in bit-identical states. Sources of non-determinism
//! include:
//!
//! - **System randomness**: every random pick (overflow removal, blocked
//!   tiles, mandatory building placement) must draw from the campaign's
//!   seeded RNG.
//!
//! - **HashMap iteration order**: state is hashed through the ordered
//!   bincode snapshot, never through hash map iteration.
//!
//! - **Floating-point math**: levels and ranges use
//!   [`base_core::math::Fixed`].

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use base_core::campaign::Campaign;

/// Result of a determinism test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeterminismResult {
    /// Whether all runs produced identical results.
    pub is_deterministic: bool,
    /// Hashes from each run.
    pub hashes: Vec<u64>,
    /// Number of steps run.
    pub steps: u64,
}

impl DeterminismResult {
    /// Get all unique hashes (should be 1 for a deterministic campaign).
    #[must_use]
    pub fn unique_hashes(&self) -> Vec<u64> {
        let mut unique: Vec<u64> = self.hashes.clone();
        unique.sort_unstable();
        unique.dedup();
        unique
    }

    /// Assert that the runs were deterministic, with a detailed error message.
    ///
    /// # Panics
    ///
    /// Panics if the runs produced different hashes.
    pub fn assert_deterministic(&self) {
        if !self.is_deterministic {
            let unique = self.unique_hashes();
            panic!(
                "Campaign is non-deterministic!\n\
                 Runs: {}\n\
                 Steps: {}\n\
                 Unique hashes: {} (expected 1)\n\
                 All hashes: {:?}",
                self.hashes.len(),
                self.steps,
                unique.len(),
                self.hashes
            );
        }
    }
}

/// Run a state machine multiple times and verify determinism.
///
/// # Arguments
///
/// * `runs` - Number of times to run
/// * `steps` - Number of steps per run
/// * `setup` - Function to create the initial state
/// * `step` - Function to advance the state by one step
/// * `hash` - Function to compute the state hash
pub fn verify_determinism<S, Setup, Step, HashFn>(
    runs: usize,
    steps: u64,
    setup: Setup,
    step: Step,
    hash: HashFn,
) -> DeterminismResult
where
    Setup: Fn() -> S,
    Step: Fn(&mut S, u64),
    HashFn: Fn(&S) -> u64,
{
    let mut hashes = Vec::with_capacity(runs);

    for _ in 0..runs {
        let mut state = setup();

        for index in 0..steps {
            step(&mut state, index);
        }

        hashes.push(hash(&state));
    }

    let is_deterministic = hashes.windows(2).all(|w| w[0] == w[1]);

    DeterminismResult {
        is_deterministic,
        hashes,
        steps,
    }
}

/// Hash of a campaign, panicking on corrupted state.
///
/// # Panics
///
/// Panics if a base cannot be snapshotted.
#[must_use]
pub fn campaign_hash(campaign: &Campaign) -> u64 {
    campaign.state_hash().expect("campaign state hashes")
}

/// Compare two campaigns step by step, finding the first divergence.
///
/// # Returns
///
/// `None` if the campaigns stay identical, `Some(step)` if they diverge
/// after that step (0 = already at setup).
pub fn find_first_divergence<Setup, Step>(setup: Setup, step: Step, steps: u64) -> Option<u64>
where
    Setup: Fn() -> Campaign,
    Step: Fn(&mut Campaign, u64),
{
    let mut first = setup();
    let mut second = setup();

    if campaign_hash(&first) != campaign_hash(&second) {
        return Some(0);
    }

    for index in 1..=steps {
        step(&mut first, index - 1);
        step(&mut second, index - 1);

        if campaign_hash(&first) != campaign_hash(&second) {
            return Some(index);
        }
    }

    None
}

/// Compute a simple hash for any hashable value.
pub fn compute_hash<T: Hash>(value: &T) -> u64 {
    let mut hasher = DefaultHasher::new();
    value.hash(&mut hasher);
    hasher.finish()
}

/// Proptest strategies for campaign testing.
///
/// These strategies generate random but reproducible order sequences for
/// property-based testing of the base invariants.
pub mod strategies {
    use base_core::aircraft::{self, AircraftSize};
    use base_core::base::{BaseId, BuildingStatus};
    use base_core::campaign::Campaign;
    use base_core::destruction;
    use base_core::employees::{self, EmployeeType};
    use base_core::error::BaseError;
    use base_core::lifecycle;
    use base_core::storage;
    use proptest::prelude::*;

    use crate::fixtures::free_tile;

    /// Template ids of the standard fixture set.
    pub const TEMPLATE_IDS: [&str; 14] = [
        "building_powerplant",
        "building_command",
        "building_quarters",
        "building_storage",
        "building_lab",
        "building_workshop",
        "building_hangar",
        "building_intercept",
        "building_aliencontainment",
        "building_antimatter",
        "building_radar",
        "building_hospital",
        "building_missile",
        "building_laser",
    ];

    /// Item ids of the standard fixture set.
    pub const ITEM_IDS: [&str; 4] = ["assault_rifle", "rifle_ammo", "medikit", "antimatter"];

    /// One player or world order against a base.
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum Action {
        /// Start construction of a template at the first free tile.
        Place(usize),
        /// Add a finished building at the first free tile.
        Build(usize),
        /// Destroy the n-th building (modulo the building count).
        Destroy(usize),
        /// Set the n-th building down or back to working.
        Toggle(usize, bool),
        /// Add (or remove, if negative) items.
        AddItems(usize, i32),
        /// Hire a new employee.
        Hire(usize),
        /// Buy an aircraft.
        BuyAircraft(bool),
        /// Advance the calendar by one day.
        AdvanceDay,
    }

    /// Generate one action.
    pub fn arb_action() -> impl Strategy<Value = Action> {
        prop_oneof![
            (0..TEMPLATE_IDS.len()).prop_map(Action::Place),
            (0..TEMPLATE_IDS.len()).prop_map(Action::Build),
            (0usize..32).prop_map(Action::Destroy),
            ((0usize..32), any::<bool>()).prop_map(|(index, down)| Action::Toggle(index, down)),
            ((0..ITEM_IDS.len()), -30i32..60).prop_map(|(item, amount)| Action::AddItems(item, amount)),
            (0..EmployeeType::ALL.len()).prop_map(Action::Hire),
            any::<bool>().prop_map(Action::BuyAircraft),
            Just(Action::AdvanceDay),
        ]
    }

    /// Generate a sequence of actions.
    pub fn arb_actions(max_len: usize) -> impl Strategy<Value = Vec<Action>> {
        prop::collection::vec(arb_action(), 1..=max_len)
    }

    /// Apply an action. Refusals are fine; fatal errors are returned.
    pub fn apply_action(campaign: &mut Campaign, base: BaseId, action: &Action) -> Result<(), BaseError> {
        let result = match *action {
            Action::Place(index) | Action::Build(index) => {
                let template_id = TEMPLATE_IDS[index % TEMPLATE_IDS.len()];
                let footprint = campaign
                    .templates()
                    .by_id(template_id)
                    .map(|template| template.footprint)
                    .unwrap_or_default();
                match free_tile(campaign, base, footprint) {
                    Some(tile) if matches!(action, Action::Place(_)) => {
                        lifecycle::place_building(campaign, base, template_id, tile).map(|_| ())
                    }
                    Some(tile) => {
                        lifecycle::build_from_template(campaign, base, template_id, tile).map(|_| ())
                    }
                    None => Ok(()),
                }
            }
            Action::Destroy(index) => match nth_building(campaign, base, index) {
                Some(id) => destruction::building_destroy(campaign, base, id),
                None => Ok(()),
            },
            Action::Toggle(index, down) => match nth_building(campaign, base, index) {
                Some(id) => {
                    let status = campaign
                        .base(base)?
                        .building(id)
                        .map_or(BuildingStatus::NotSet, |building| building.status);
                    match (status, down) {
                        (BuildingStatus::Working, true) => {
                            lifecycle::update_building_status(campaign, base, id, BuildingStatus::Down)
                        }
                        (BuildingStatus::Down, false) => {
                            lifecycle::update_building_status(campaign, base, id, BuildingStatus::Working)
                        }
                        _ => Ok(()),
                    }
                }
                None => Ok(()),
            },
            Action::AddItems(item, amount) => {
                storage::add_to_storage(campaign, base, ITEM_IDS[item % ITEM_IDS.len()], amount).map(|_| ())
            }
            Action::Hire(kind) => {
                let kind = EmployeeType::ALL[kind % EmployeeType::ALL.len()];
                let id = campaign.employees_mut().add_unhired(kind, format!("{kind:?}"));
                employees::hire(campaign, base, id)
            }
            Action::BuyAircraft(large) => {
                let size = if large { AircraftSize::Large } else { AircraftSize::Small };
                aircraft::buy_aircraft(campaign, base, size, "Craft").map(|_| ())
            }
            Action::AdvanceDay => campaign.advance_day().map(|_| ()),
        };

        match result {
            Err(err) if err.is_fatal() => Err(err),
            _ => Ok(()),
        }
    }

    fn nth_building(campaign: &Campaign, base: BaseId, index: usize) -> Option<base_core::base::BuildingId> {
        let ids = campaign.base(base).ok()?.building_ids();
        if ids.is_empty() {
            None
        } else {
            Some(ids[index % ids.len()])
        }
    }
}
