//! Headless base campaign runner.
//!
//! Runs scripted scenarios against the base core without any interface and
//! prints a JSON report of the final campaign state.
//!
//! # Usage
//!
//! ```bash
//! # Run a scenario and print the report
//! cargo run -p base_headless -- run --scenario data/scenarios/demo.ron
//!
//! # Run and write the report to a file
//! cargo run -p base_headless -- run --scenario data/scenarios/demo.ron --output report.json
//!
//! # Check campaign data for cycles and broken layouts
//! cargo run -p base_headless -- validate
//! ```
//!
//! Logs go to stderr; the report goes to stdout unless `--output` is set.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use base_headless::{run_scenario, validate_data, CampaignData, Scenario, ScenarioAction};

#[derive(Parser)]
#[command(name = "base_headless")]
#[command(about = "Headless base campaign runner for scripted scenarios and CI")]
#[command(version)]
struct Cli {
    /// Enable verbose logging to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a scenario on a fresh campaign
    Run {
        /// Scenario file to run
        #[arg(short, long)]
        scenario: PathBuf,

        /// Campaign configuration (defaults apply when omitted)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Building templates
        #[arg(long, default_value = "data/buildings.ron")]
        templates: PathBuf,

        /// Item catalogue
        #[arg(long, default_value = "data/items.ron")]
        items: PathBuf,

        /// Base layouts
        #[arg(long, default_value = "data/layouts.ron")]
        layouts: PathBuf,

        /// Extra days to let pass after the last action
        #[arg(long, default_value = "0")]
        days: u32,

        /// Write the JSON report here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Check campaign data without running anything
    Validate {
        /// Building templates
        #[arg(long, default_value = "data/buildings.ron")]
        templates: PathBuf,

        /// Item catalogue
        #[arg(long, default_value = "data/items.ron")]
        items: PathBuf,

        /// Base layouts
        #[arg(long, default_value = "data/layouts.ron")]
        layouts: PathBuf,
    },
}

fn main() {
    let cli = Cli::parse();

    let log_level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(true),
        )
        .with(tracing_subscriber::filter::LevelFilter::from_level(
            log_level,
        ))
        .init();

    match cli.command {
        Commands::Run {
            scenario,
            config,
            templates,
            items,
            layouts,
            days,
            output,
        } => cmd_run(&scenario, config, &templates, &items, &layouts, days, output),
        Commands::Validate {
            templates,
            items,
            layouts,
        } => cmd_validate(&templates, &items, &layouts),
    }
}

fn load_data(
    config: Option<&Path>,
    templates: &Path,
    items: &Path,
    layouts: &Path,
) -> CampaignData {
    match CampaignData::load(config, templates, items, Some(layouts)) {
        Ok(data) => data,
        Err(e) => {
            eprintln!("Failed to load campaign data: {e}");
            std::process::exit(1);
        }
    }
}

fn cmd_run(
    scenario_path: &Path,
    config: Option<PathBuf>,
    templates: &Path,
    items: &Path,
    layouts: &Path,
    days: u32,
    output: Option<PathBuf>,
) {
    let data = load_data(config.as_deref(), templates, items, layouts);
    let mut scenario = match Scenario::load(scenario_path) {
        Ok(scenario) => scenario,
        Err(e) => {
            eprintln!("Failed to load scenario: {e}");
            std::process::exit(1);
        }
    };
    if days > 0 {
        scenario.actions.push(ScenarioAction::AdvanceDays(days));
    }

    let report = match run_scenario(&data, &scenario) {
        Ok(report) => report,
        Err(e) => {
            eprintln!("Scenario failed: {e}");
            std::process::exit(1);
        }
    };
    tracing::info!(
        refusals = report.refusals.len(),
        events = report.events.len(),
        state_hash = report.state_hash,
        "Scenario complete"
    );

    let json = match report.to_json() {
        Ok(json) => json,
        Err(e) => {
            eprintln!("Failed to serialize report: {e}");
            std::process::exit(1);
        }
    };
    match output {
        Some(path) => {
            if let Err(e) = std::fs::write(&path, json) {
                eprintln!("Failed to write {}: {e}", path.display());
                std::process::exit(1);
            }
            tracing::info!(path = %path.display(), "Report written");
        }
        None => println!("{json}"),
    }
}

fn cmd_validate(templates: &Path, items: &Path, layouts: &Path) {
    let data = load_data(None, templates, items, layouts);
    let problems = validate_data(&data);
    if problems.is_empty() {
        println!(
            "OK: {} templates, {} layouts",
            data.templates.len(),
            data.layouts.len()
        );
        return;
    }
    for problem in &problems {
        eprintln!("{problem}");
    }
    std::process::exit(1);
}
