//! Invariant assertions over a campaign.
//!
//! Wraps [`base_core::validate::check_base`] and adds the usage side of the
//! capacity ledger, so tests can check a base after every step.

use base_core::base::BaseId;
use base_core::campaign::Campaign;
use base_core::capacity::CapacityKind;
use base_core::ledger;
use base_core::resolver;
use base_core::templates::BuildingType;

/// Snapshot of the derived state that must survive a recompute untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DerivedState {
    /// Status flag of every building type, in index order.
    pub flags: Vec<bool>,
    /// `(cur, max)` of every capacity kind, in index order.
    pub capacities: Vec<(i32, i32)>,
}

/// Capture flags and capacities of a base.
///
/// # Panics
///
/// Panics if the base does not exist.
#[must_use]
pub fn derived_state(campaign: &Campaign, base: BaseId) -> DerivedState {
    let target = campaign.base(base).expect("base exists");
    DerivedState {
        flags: BuildingType::ALL
            .iter()
            .map(|&building_type| resolver::building_status(target, building_type))
            .collect(),
        capacities: CapacityKind::ALL
            .iter()
            .map(|&kind| {
                let capacity = target.capacity(kind);
                (capacity.cur, capacity.max)
            })
            .collect(),
    }
}

/// Assert that flags, maxima and grid agree with the buildings.
///
/// # Panics
///
/// Panics with the violated invariant.
pub fn assert_base_consistent(campaign: &Campaign, base: BaseId) {
    if let Err(err) = base_core::validate::check_base(campaign, base) {
        panic!("base {} is inconsistent: {err}", base.0);
    }
}

/// Assert that current usage matches what occupies each capacity.
///
/// # Panics
///
/// Panics on the first kind whose usage is stale.
pub fn assert_usage_current(campaign: &Campaign, base: BaseId) {
    let target = campaign.base(base).expect("base exists");
    for kind in CapacityKind::ALL {
        let derived = ledger::derived_current(campaign, base, kind).expect("usage derivable");
        assert_eq!(
            target.capacity(kind).cur,
            derived,
            "{kind:?} usage is stale in base {}",
            base.0
        );
    }
}

/// Assert that no capacity kind is over its maximum.
///
/// # Panics
///
/// Panics on the first overflowing kind.
pub fn assert_no_overflow(campaign: &Campaign, base: BaseId) {
    let target = campaign.base(base).expect("base exists");
    for (kind, capacity) in target.capacities().iter() {
        assert!(
            !capacity.is_overflowing(),
            "{kind:?} overflows in base {}: {} > {}",
            base.0,
            capacity.cur,
            capacity.max
        );
    }
}
