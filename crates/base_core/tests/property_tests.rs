//! Property tests: random order sequences keep a base consistent.

use base_core::base::BaseId;
use base_core::campaign::Campaign;
use base_core::capacity::CapacityKind;
use base_core::destruction::building_destroy;
use base_core::lifecycle;
use base_core::resolver::reset_all_status_and_capacities;
use base_core::snapshot::{restore_base, snapshot_base, BaseSnapshot};
use base_core::storage;
use base_core::templates::BuildingType;
use base_test_utils::determinism::strategies::{apply_action, arb_actions, Action};
use base_test_utils::determinism::{campaign_hash, find_first_divergence, verify_determinism};
use base_test_utils::fixtures::{building_of_type, standard_base};
use base_test_utils::invariants::{
    assert_base_consistent, assert_no_overflow, assert_usage_current, derived_state,
};
use proptest::prelude::*;

const SCRIPT: [Action; 10] = [
    Action::AddItems(0, 3),
    Action::Place(2),
    Action::Hire(0),
    Action::AdvanceDay,
    Action::Destroy(4),
    Action::AddItems(1, 40),
    Action::Build(3),
    Action::Toggle(1, true),
    Action::Destroy(3),
    Action::AdvanceDay,
];

fn scripted_step(campaign: &mut Campaign, step: u64) {
    let action = &SCRIPT[step as usize % SCRIPT.len()];
    apply_action(campaign, BaseId(0), action).unwrap();
}

// =============================================================================
// Deterministic properties
// =============================================================================

#[test]
fn test_reset_is_idempotent() {
    let (mut campaign, base) = standard_base(21);
    storage::add_to_storage(&mut campaign, base, "medikit", 6).unwrap();
    let before = derived_state(&campaign, base);

    reset_all_status_and_capacities(&mut campaign, base, false).unwrap();
    let once = derived_state(&campaign, base);
    reset_all_status_and_capacities(&mut campaign, base, false).unwrap();
    let twice = derived_state(&campaign, base);

    assert_eq!(before, once);
    assert_eq!(once, twice);
}

#[test]
fn test_rebuilding_only_building_restores_state() {
    let (mut campaign, base) = standard_base(8);
    let before = derived_state(&campaign, base);

    let lab = building_of_type(&campaign, base, BuildingType::Lab).unwrap();
    let pos = campaign.base(base).unwrap().building(lab).unwrap().pos;
    building_destroy(&mut campaign, base, lab).unwrap();
    assert!(!campaign.building_status(base, BuildingType::Lab));
    assert_eq!(campaign.base(base).unwrap().capacity(CapacityKind::LabSpace).max, 0);

    lifecycle::build_from_template(&mut campaign, base, "building_lab", pos).unwrap();
    assert_eq!(derived_state(&campaign, base), before);
    assert_base_consistent(&campaign, base);
}

#[test]
fn test_snapshot_restore_reproduces_derived_state() {
    let (mut campaign, base) = standard_base(13);
    storage::add_to_storage(&mut campaign, base, "assault_rifle", 2).unwrap();
    storage::add_to_storage(&mut campaign, base, "antimatter", 20).unwrap();
    base_core::aliens::add_captives(&mut campaign, base, "taman", 3).unwrap();

    let bytes = snapshot_base(&campaign, base).unwrap().to_bytes().unwrap();
    let snapshot = BaseSnapshot::from_bytes(&bytes).unwrap();
    let copy = restore_base(&mut campaign, &snapshot).unwrap();

    assert_eq!(derived_state(&campaign, copy), derived_state(&campaign, base));
    let (original, restored) = (campaign.base(base).unwrap(), campaign.base(copy).unwrap());
    assert_eq!(restored.radar(), original.radar());
    assert_eq!(restored.batteries(), original.batteries());
    assert_eq!(restored.capacity(CapacityKind::Antimatter).cur, 20);
    assert_base_consistent(&campaign, copy);
}

#[test]
fn test_scripted_campaign_is_deterministic() {
    let result = verify_determinism(
        3,
        40,
        || standard_base(99).0,
        scripted_step,
        campaign_hash,
    );
    result.assert_deterministic();
    assert_eq!(find_first_divergence(|| standard_base(99).0, scripted_step, 40), None);
}

// =============================================================================
// Property-based tests using proptest
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Every public operation leaves flags, maxima and usage consistent.
    #[test]
    fn prop_actions_preserve_invariants(seed in 0u64..1000, actions in arb_actions(40)) {
        let (mut campaign, base) = standard_base(seed);
        for action in &actions {
            let result = apply_action(&mut campaign, base, action);
            prop_assert!(result.is_ok(), "fatal error after {:?}: {:?}", action, result);
            assert_base_consistent(&campaign, base);
            assert_usage_current(&campaign, base);
        }
        assert_no_overflow(&campaign, base);
    }

    /// A full reset never changes a consistent base.
    #[test]
    fn prop_reset_is_idempotent(seed in 0u64..1000, actions in arb_actions(30)) {
        let (mut campaign, base) = standard_base(seed);
        for action in &actions {
            apply_action(&mut campaign, base, action).unwrap();
        }
        let before = derived_state(&campaign, base);
        reset_all_status_and_capacities(&mut campaign, base, false).unwrap();
        prop_assert_eq!(&before, &derived_state(&campaign, base));
        reset_all_status_and_capacities(&mut campaign, base, false).unwrap();
        prop_assert_eq!(&before, &derived_state(&campaign, base));
    }

    /// The same seed and orders always end in the same state.
    #[test]
    fn prop_same_orders_same_state(seed in 0u64..1000, actions in arb_actions(30)) {
        let run = || {
            let (mut campaign, base) = standard_base(seed);
            for action in &actions {
                apply_action(&mut campaign, base, action).unwrap();
            }
            campaign_hash(&campaign)
        };
        prop_assert_eq!(run(), run());
    }
}
