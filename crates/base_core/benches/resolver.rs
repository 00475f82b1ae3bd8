//! Resolver benchmarks for base_core.
//!
//! Run with: `cargo bench -p base_core`

// Benchmark binaries don't need docs on macro-generated functions
#![allow(missing_docs)]

use base_core::base::BuildingStatus;
use base_core::lifecycle::update_building_status;
use base_core::resolver::reset_all_status_and_capacities;
use base_core::templates::BuildingType;
use base_test_utils::fixtures::{building_of_type, standard_base};
use criterion::{black_box, criterion_group, criterion_main, Criterion};

/// Full recompute and power cascade on the standard base.
pub fn resolver_benchmark(c: &mut Criterion) {
    let (mut campaign, base) = standard_base(1);
    let power = building_of_type(&campaign, base, BuildingType::Power);

    c.bench_function("reset_all_status_and_capacities", |b| {
        b.iter(|| {
            reset_all_status_and_capacities(&mut campaign, black_box(base), false)
                .map_err(|err| err.to_string())
        })
    });

    if let Some(power) = power {
        c.bench_function("power_cascade_toggle", |b| {
            b.iter(|| {
                let _ = update_building_status(&mut campaign, base, power, BuildingStatus::Down);
                let _ = update_building_status(&mut campaign, base, power, BuildingStatus::Working);
                campaign.drain_events().len()
            })
        });
    }
}

criterion_group!(benches, resolver_benchmark);
criterion_main!(benches);
