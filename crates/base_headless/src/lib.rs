//! Headless campaign runner for scripted scenarios and CI verification.
//!
//! Loads campaign data from RON files, applies a scenario's orders to a
//! fresh campaign and reports the final state of every base as JSON.
//!
//! - **CI verification**: scenarios double as regression tests for the
//!   base rules
//! - **Determinism checks**: the report carries a hash of the final state
//! - **Data validation**: template graphs and layouts are checked before a
//!   campaign ever starts
//!
//! # Example
//!
//! ```bash
//! cargo run -p base_headless -- run \
//!     --templates data/buildings.ron --items data/items.ron \
//!     --layouts data/layouts.ron --scenario data/scenarios/demo.ron
//!
//! cargo run -p base_headless -- validate --templates data/buildings.ron
//! ```

pub mod runner;
pub mod scenario;

pub use runner::{run_scenario, BaseReport, CampaignData, Refusal, RunReport};
pub use scenario::{Scenario, ScenarioAction, ScenarioError};

/// Problems found in campaign data that loaded without errors.
#[must_use]
pub fn validate_data(data: &CampaignData) -> Vec<String> {
    let mut problems = Vec::new();
    if let Some(cycle) = data.templates.graph().find_cycle() {
        let names: Vec<String> = cycle.iter().map(|building_type| format!("{building_type:?}")).collect();
        problems.push(format!("dependency cycle: {}", names.join(" -> ")));
    }
    for (layout, template) in data.unknown_layout_templates() {
        problems.push(format!("layout '{layout}' names unknown template '{template}'"));
    }
    problems
}

#[cfg(test)]
mod tests {
    use super::*;
    use base_core::templates::TemplateStore;
    use base_test_utils::fixtures::{standard_catalog, standard_layout, standard_templates, test_config};

    #[test]
    fn test_standard_data_is_valid() {
        let data = CampaignData {
            config: test_config(1),
            templates: standard_templates(),
            catalog: standard_catalog(),
            layouts: vec![standard_layout()],
        };
        assert!(validate_data(&data).is_empty());
    }

    #[test]
    fn test_unknown_layout_template_reported() {
        let data = CampaignData {
            config: test_config(1),
            templates: TemplateStore::default(),
            catalog: standard_catalog(),
            layouts: vec![standard_layout()],
        };
        let problems = validate_data(&data);
        assert!(!problems.is_empty());
        assert!(problems.iter().all(|problem| problem.starts_with("layout 'standard'")));
    }
}
