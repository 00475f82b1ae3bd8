//! End-to-end base scenarios.
//!
//! Each test drives a campaign through the public API only and checks
//! flags, capacities and emitted events afterwards.

use base_core::aircraft;
use base_core::aliens;
use base_core::capacity::CapacityKind;
use base_core::destruction::building_destroy;
use base_core::events::CampaignEvent;
use base_core::grid::Tile;
use base_core::lifecycle::place_building;
use base_core::math::GeoPos;
use base_core::prelude::*;
use base_core::snapshot;
use base_core::storage;
use base_test_utils::fixtures::{
    building_of_type, campaign_with, place_working, standard_base, standard_layout,
};
use base_test_utils::invariants::{assert_base_consistent, assert_usage_current};

fn count_events(events: &[CampaignEvent], predicate: impl Fn(&CampaignEvent) -> bool) -> usize {
    events.iter().filter(|event| predicate(event)).count()
}

// =============================================================================
// Dependency propagation
// =============================================================================

#[test]
fn test_destroying_command_switches_off_radar_once() {
    let templates = TemplateStore::from_data(vec![
        BuildingTemplateData::new("building_command", BuildingType::Command),
        BuildingTemplateData::new("building_radar", BuildingType::Radar).depends_on("building_command"),
    ])
    .unwrap();
    let mut campaign = campaign_with(templates, 7);
    let base = campaign.found_base("Alpha", GeoPos::default(), None).unwrap();

    let command = place_working(&mut campaign, base, "building_command");
    place_working(&mut campaign, base, "building_radar");
    assert!(campaign.building_status(base, BuildingType::Command));
    assert!(campaign.building_status(base, BuildingType::Radar));
    assert!(campaign.base(base).unwrap().radar().is_active());
    assert_eq!(campaign.installation_limit(), 3);
    campaign.drain_events();

    building_destroy(&mut campaign, base, command).unwrap();

    assert!(!campaign.building_status(base, BuildingType::Command));
    assert!(!campaign.building_status(base, BuildingType::Radar));
    assert!(!campaign.base(base).unwrap().radar().is_active());
    assert_eq!(campaign.installation_limit(), 0);

    let events = campaign.drain_events();
    assert_eq!(
        count_events(&events, |e| matches!(e, CampaignEvent::RadarCoverageUpdated { .. })),
        1
    );
    assert_eq!(
        count_events(&events, |e| matches!(e, CampaignEvent::InstallationLimitUpdated { .. })),
        1
    );
    assert_base_consistent(&campaign, base);
}

#[test]
fn test_power_down_cascades_and_recovers() {
    let (mut campaign, base) = standard_base(3);
    let power = building_of_type(&campaign, base, BuildingType::Power).unwrap();

    update_building_status(&mut campaign, base, power, BuildingStatus::Down).unwrap();
    for building_type in [
        BuildingType::Power,
        BuildingType::Command,
        BuildingType::Radar,
        BuildingType::Lab,
        BuildingType::Hangar,
        BuildingType::AlienContainment,
    ] {
        assert!(!campaign.building_status(base, building_type), "{building_type:?} still on");
    }
    assert!(campaign.building_status(base, BuildingType::Quarters));
    assert!(campaign.building_status(base, BuildingType::Storage));
    // Down buildings keep their capacity.
    assert_eq!(campaign.base(base).unwrap().capacity(CapacityKind::LabSpace).max, 10);
    assert_base_consistent(&campaign, base);

    update_building_status(&mut campaign, base, power, BuildingStatus::Working).unwrap();
    assert!(campaign.building_status(base, BuildingType::Radar));
    assert!(campaign.building_status(base, BuildingType::Lab));
    assert_base_consistent(&campaign, base);
}

// =============================================================================
// Capacity overflow
// =============================================================================

#[test]
fn test_destroying_only_storage_empties_it() {
    let (mut campaign, base) = standard_base(11);
    storage::add_to_storage(&mut campaign, base, "assault_rifle", 4).unwrap();
    storage::add_to_storage(&mut campaign, base, "rifle_ammo", 15).unwrap();
    let items = campaign.base(base).unwrap().capacity(CapacityKind::Items);
    assert_eq!((items.cur, items.max), (95, 100));

    assert!(matches!(
        storage::add_to_storage(&mut campaign, base, "medikit", 2),
        Err(BaseError::NoCapacity { required: 10, free: 5, .. })
    ));

    let store = building_of_type(&campaign, base, BuildingType::Storage).unwrap();
    campaign.drain_events();
    building_destroy(&mut campaign, base, store).unwrap();

    let target = campaign.base(base).unwrap();
    let items = target.capacity(CapacityKind::Items);
    assert_eq!((items.cur, items.max), (0, 0));
    assert!(target.storage().is_empty());
    let events = campaign.drain_events();
    assert_eq!(
        count_events(&events, |e| matches!(e, CampaignEvent::ItemsDestroyed { .. })),
        2
    );
    assert_base_consistent(&campaign, base);
    assert_usage_current(&campaign, base);
}

#[test]
fn test_quarters_overflow_keeps_soldiers() {
    let (mut campaign, base) = standard_base(5);
    let extra = place_working(&mut campaign, base, "building_quarters");
    assert_eq!(campaign.base(base).unwrap().capacity(CapacityKind::Employees).max, 20);

    for (kind, count) in [
        (EmployeeType::Soldier, 12),
        (EmployeeType::Scientist, 4),
        (EmployeeType::Worker, 2),
        (EmployeeType::Pilot, 2),
    ] {
        for n in 0..count {
            let id = campaign.employees_mut().add_unhired(kind, format!("{kind:?} {n}"));
            base_core::employees::hire(&mut campaign, base, id).unwrap();
        }
    }
    let spare = campaign.employees_mut().add_unhired(EmployeeType::Soldier, "Spare");
    assert!(matches!(
        base_core::employees::hire(&mut campaign, base, spare),
        Err(BaseError::NoCapacity { kind: CapacityKind::Employees, .. })
    ));

    building_destroy(&mut campaign, base, extra).unwrap();

    let pool = campaign.employees();
    assert_eq!(pool.count_hired(base, EmployeeType::Soldier), 10);
    assert_eq!(pool.count_hired(base, EmployeeType::Scientist), 0);
    assert_eq!(pool.count_hired(base, EmployeeType::Worker), 0);
    assert_eq!(pool.count_hired(base, EmployeeType::Pilot), 0);
    let employees = campaign.base(base).unwrap().capacity(CapacityKind::Employees);
    assert_eq!((employees.cur, employees.max), (10, 10));
    assert_usage_current(&campaign, base);
}

#[test]
fn test_destroying_containment_kills_captives() {
    let (mut campaign, base) = standard_base(2);
    assert_eq!(aliens::add_captives(&mut campaign, base, "taman", 5).unwrap(), 5);
    assert_eq!(campaign.base(base).unwrap().capacity(CapacityKind::Aliens).cur, 5);

    let containment = building_of_type(&campaign, base, BuildingType::AlienContainment).unwrap();
    campaign.drain_events();
    building_destroy(&mut campaign, base, containment).unwrap();

    let target = campaign.base(base).unwrap();
    assert_eq!(target.containment().count_alive(), 0);
    assert_eq!(target.containment().count_dead(), 5);
    assert_eq!(target.capacity(CapacityKind::Aliens).cur, 0);

    let events = campaign.drain_events();
    let killed = events
        .iter()
        .position(|e| *e == CampaignEvent::CaptivesKilled { base, count: 5 })
        .expect("captives killed");
    let destroyed = events
        .iter()
        .position(|e| matches!(e, CampaignEvent::BuildingDestroyed { .. }))
        .expect("building destroyed");
    assert!(killed < destroyed);
}

#[test]
fn test_captives_dead_on_arrival_without_room() {
    let (mut campaign, base) = standard_base(2);
    assert_eq!(aliens::add_captives(&mut campaign, base, "ortnok", 12).unwrap(), 10);
    let target = campaign.base(base).unwrap();
    assert_eq!(target.containment().count_alive(), 10);
    assert_eq!(target.containment().count_dead(), 2);
}

#[test]
fn test_destroying_hangar_loses_parked_aircraft() {
    let (mut campaign, base) = standard_base(4);
    let firebird = aircraft::buy_aircraft(&mut campaign, base, AircraftSize::Large, "Firebird").unwrap();
    assert_eq!(campaign.base(base).unwrap().capacity(CapacityKind::LargeHangar).cur, 1);

    let hangar = building_of_type(&campaign, base, BuildingType::Hangar).unwrap();
    campaign.drain_events();
    building_destroy(&mut campaign, base, hangar).unwrap();

    assert!(campaign.fleet().get(firebird).is_none());
    let hangar = campaign.base(base).unwrap().capacity(CapacityKind::LargeHangar);
    assert_eq!((hangar.cur, hangar.max), (0, 0));
    let events = campaign.drain_events();
    assert!(events.contains(&CampaignEvent::AircraftDestroyed { base, aircraft: firebird }));
    assert_eq!(
        count_events(&events, |e| matches!(e, CampaignEvent::RescueMissionSpawned { .. })),
        0
    );
    assert_base_consistent(&campaign, base);
    assert_usage_current(&campaign, base);
}

#[test]
fn test_flying_aircraft_moves_to_other_base() {
    let (mut campaign, alpha) = standard_base(4);
    let bravo = campaign
        .found_base("Bravo", GeoPos::from_degrees(-70, 40), Some(&standard_layout()))
        .unwrap();
    let firebird = aircraft::buy_aircraft(&mut campaign, alpha, AircraftSize::Large, "Firebird").unwrap();
    aircraft::send_away(&mut campaign, firebird, GeoPos::from_degrees(20, 50), false).unwrap();

    let hangar = building_of_type(&campaign, alpha, BuildingType::Hangar).unwrap();
    campaign.drain_events();
    building_destroy(&mut campaign, alpha, hangar).unwrap();

    assert_eq!(campaign.fleet().get(firebird).unwrap().homebase, bravo);
    assert_eq!(campaign.base(alpha).unwrap().capacity(CapacityKind::LargeHangar).cur, 0);
    assert_eq!(campaign.base(bravo).unwrap().capacity(CapacityKind::LargeHangar).cur, 1);
    let events = campaign.drain_events();
    assert!(events.contains(&CampaignEvent::AircraftRehomed {
        aircraft: firebird,
        from: alpha,
        to: bravo,
    }));
    assert_eq!(
        count_events(&events, |e| matches!(e, CampaignEvent::AircraftDestroyed { .. })),
        0
    );
    assert_usage_current(&campaign, alpha);
    assert_usage_current(&campaign, bravo);
}

#[test]
fn test_homeless_aircraft_over_land_needs_rescue() {
    let (mut campaign, base) = standard_base(4);
    let firebird = aircraft::buy_aircraft(&mut campaign, base, AircraftSize::Large, "Firebird").unwrap();
    let crash_site = GeoPos::from_degrees(20, 50);
    aircraft::send_away(&mut campaign, firebird, crash_site, false).unwrap();

    let hangar = building_of_type(&campaign, base, BuildingType::Hangar).unwrap();
    campaign.drain_events();
    building_destroy(&mut campaign, base, hangar).unwrap();

    assert!(campaign.fleet().get(firebird).is_none());
    let events = campaign.drain_events();
    let rescue = events
        .iter()
        .position(|e| {
            *e == CampaignEvent::RescueMissionSpawned {
                aircraft: firebird,
                pos: crash_site,
            }
        })
        .expect("rescue mission");
    let lost = events
        .iter()
        .position(|e| *e == CampaignEvent::AircraftDestroyed { base, aircraft: firebird })
        .expect("aircraft destroyed");
    assert!(rescue < lost);
}

#[test]
fn test_homeless_aircraft_over_water_is_lost() {
    let (mut campaign, base) = standard_base(4);
    let stiletto = aircraft::buy_aircraft(&mut campaign, base, AircraftSize::Small, "Stiletto").unwrap();
    aircraft::send_away(&mut campaign, stiletto, GeoPos::from_degrees(-30, 0), true).unwrap();

    let intercept = building_of_type(&campaign, base, BuildingType::SmallHangar).unwrap();
    campaign.drain_events();
    building_destroy(&mut campaign, base, intercept).unwrap();

    assert!(campaign.fleet().get(stiletto).is_none());
    let events = campaign.drain_events();
    assert!(events.contains(&CampaignEvent::AircraftDestroyed { base, aircraft: stiletto }));
    assert_eq!(
        count_events(&events, |e| matches!(e, CampaignEvent::RescueMissionSpawned { .. })),
        0
    );
}

#[test]
fn test_destroying_antimatter_facility_loses_stock() {
    let (mut campaign, base) = standard_base(6);
    assert_eq!(storage::add_to_storage(&mut campaign, base, "antimatter", 30).unwrap(), 30);
    let antimatter = campaign.base(base).unwrap().capacity(CapacityKind::Antimatter);
    assert_eq!((antimatter.cur, antimatter.max), (30, 50));

    let facility = building_of_type(&campaign, base, BuildingType::Antimatter).unwrap();
    campaign.drain_events();
    building_destroy(&mut campaign, base, facility).unwrap();

    let antimatter = campaign.base(base).unwrap().capacity(CapacityKind::Antimatter);
    assert_eq!((antimatter.cur, antimatter.max), (0, 0));
    let events = campaign.drain_events();
    assert!(events.contains(&CampaignEvent::AntimatterLost { base, amount: 30 }));
    assert_base_consistent(&campaign, base);
    assert_usage_current(&campaign, base);
}

// =============================================================================
// Placement and construction
// =============================================================================

#[test]
fn test_double_building_in_last_column_extends_left() {
    let templates = TemplateStore::from_data(vec![
        BuildingTemplateData::new("building_hangar", BuildingType::Hangar).double(),
        BuildingTemplateData::new("building_quarters", BuildingType::Quarters),
    ])
    .unwrap();
    let mut campaign = campaign_with(templates, 1);
    let base = campaign.found_base("Alpha", GeoPos::default(), None).unwrap();

    let hangar = place_building(&mut campaign, base, "building_hangar", Tile::new(4, 0)).unwrap();
    assert_eq!(
        campaign.base(base).unwrap().building(hangar).unwrap().tiles(),
        vec![Tile::new(3, 0), Tile::new(4, 0)]
    );

    place_building(&mut campaign, base, "building_quarters", Tile::new(3, 1)).unwrap();
    let credits = campaign.credits();
    assert!(matches!(
        place_building(&mut campaign, base, "building_hangar", Tile::new(4, 1)),
        Err(BaseError::TileOccupied(tile)) if tile == Tile::new(3, 1)
    ));
    assert_eq!(campaign.credits(), credits);

    // A blocked left neighbour refuses the building as well.
    let mut layout = snapshot::snapshot_base(&campaign, base).unwrap();
    layout.tiles[2 * 5 + 3].blocked = true;
    let copy = snapshot::restore_base(&mut campaign, &layout).unwrap();
    assert!(matches!(
        place_building(&mut campaign, copy, "building_hangar", Tile::new(4, 2)),
        Err(BaseError::TileBlocked(tile)) if tile == Tile::new(3, 2)
    ));
}

#[test]
fn test_construction_finishes_on_exact_day() {
    let templates = TemplateStore::from_data(vec![BuildingTemplateData::new(
        "building_lab",
        BuildingType::Lab,
    )
    .with_capacity(10)
    .with_build_time(3)])
    .unwrap();
    let mut campaign = campaign_with(templates, 1);
    let base = campaign.found_base("Alpha", GeoPos::default(), None).unwrap();

    campaign.set_day(10);
    let lab = place_building(&mut campaign, base, "building_lab", Tile::new(0, 0)).unwrap();
    assert_eq!(campaign.base(base).unwrap().building(lab).unwrap().time_start, 10);

    for day in 11..=12 {
        assert_eq!(campaign.advance_day().unwrap(), 0, "finished early on day {day}");
        assert_eq!(
            campaign.base(base).unwrap().building(lab).unwrap().status,
            BuildingStatus::UnderConstruction
        );
    }
    assert_eq!(campaign.advance_day().unwrap(), 1);
    assert_eq!(campaign.day(), 13);
    assert_eq!(
        campaign.base(base).unwrap().building(lab).unwrap().status,
        BuildingStatus::Working
    );
    assert!(campaign.building_status(base, BuildingType::Lab));
}

// =============================================================================
// Whole-base operations
// =============================================================================

#[test]
fn test_attack_refuses_destruction_marking() {
    let (mut campaign, base) = standard_base(4);
    let lab = building_of_type(&campaign, base, BuildingType::Lab).unwrap();
    campaign.begin_base_attack(base).unwrap();

    let events = campaign.drain_events();
    assert!(events.contains(&CampaignEvent::Trigger {
        base,
        kind: TriggerKind::Attack,
        command: "missile_fire".into(),
    }));
    assert!(matches!(
        mark_building_destroy(&mut campaign, base, lab),
        Err(BaseError::NotDestroyable(DestroyRefusal::UnderAttack))
    ));

    campaign.end_base_attack(base).unwrap();
    let impact = mark_building_destroy(&mut campaign, base, lab).unwrap();
    assert_eq!(impact.lost, 10);
    assert_eq!(campaign.base(base).unwrap().current(), Some(lab));
}

#[test]
fn test_destroy_base_clears_everything() {
    let (mut campaign, base) = standard_base(9);
    storage::add_to_storage(&mut campaign, base, "medikit", 3).unwrap();
    aliens::add_captives(&mut campaign, base, "taman", 2).unwrap();

    destroy_base(&mut campaign, base).unwrap();

    let target = campaign.base(base).unwrap();
    assert_eq!(target.status(), BaseStatus::Destroyed);
    assert_eq!(target.building_count(), 0);
    assert!(target.storage().is_empty());
    for kind in CapacityKind::ALL {
        assert_eq!(target.capacity(kind).max, 0, "{kind:?}");
    }
    assert_eq!(campaign.founded_base_count(), 0);
    assert_eq!(campaign.installation_limit(), 0);
    assert!(matches!(
        place_building(&mut campaign, base, "building_lab", Tile::new(0, 0)),
        Err(BaseError::BaseNotOperational(_))
    ));
}
