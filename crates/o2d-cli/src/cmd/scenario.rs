use crate::output::{print_json, print_table};
use clap::Subcommand;
use o2d_core::clock::format_full;
use o2d_core::scenario::WarnLevel;
use std::path::Path;

// ---------------------------------------------------------------------------
// Subcommand types
// ---------------------------------------------------------------------------

#[derive(Subcommand)]
pub enum ScenarioSubcommand {
    /// Show the stages and delays of the active scenario
    Show,

    /// Validate the scenario for common mistakes
    Validate,
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

pub fn run(
    root: &Path,
    scenario: Option<&Path>,
    subcmd: ScenarioSubcommand,
    json: bool,
) -> anyhow::Result<()> {
    match subcmd {
        ScenarioSubcommand::Show => show(root, scenario, json),
        ScenarioSubcommand::Validate => validate(root, scenario, json),
    }
}

// ---------------------------------------------------------------------------
// show
// ---------------------------------------------------------------------------

fn show(root: &Path, scenario: Option<&Path>, json: bool) -> anyhow::Result<()> {
    let scenario = super::load_scenario(root, scenario)?;
    if json {
        return print_json(&scenario);
    }

    println!("Scenario: {} ({})", scenario.display_title(), scenario.name);
    println!(
        "Unit: {}  Policy: {}  Start: {}",
        scenario.unit,
        scenario.policy,
        format_full(scenario.start_time)
    );

    for (i, stage) in scenario.stages.iter().enumerate() {
        println!("\nStep {}: {}", i + 1, stage.name);
        if stage.delays.is_empty() {
            println!("  (no delays)");
            continue;
        }
        let rows: Vec<Vec<String>> = stage
            .delays
            .iter()
            .map(|d| {
                vec![
                    d.reason.clone(),
                    d.duration.to_string(),
                    d.touchpoints.to_string(),
                    d.action.clone(),
                ]
            })
            .collect();
        print_table(&["REASON", "COST", "TOUCHPOINTS", "ACTION"], rows);
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// validate
// ---------------------------------------------------------------------------

fn validate(root: &Path, scenario: Option<&Path>, json: bool) -> anyhow::Result<()> {
    let scenario = super::load_scenario(root, scenario)?;
    let warnings = scenario.validate();

    if json {
        let value = serde_json::json!({
            "scenario": scenario.name,
            "warnings": warnings,
        });
        print_json(&value)?;
    } else if warnings.is_empty() {
        println!("Scenario '{}' is valid. No warnings.", scenario.name);
    } else {
        for w in &warnings {
            let prefix = match w.level {
                WarnLevel::Warning => "warning",
                WarnLevel::Error => "error",
            };
            println!("[{prefix}] {}", w.message);
        }
    }

    let has_errors = warnings.iter().any(|w| w.level == WarnLevel::Error);
    if has_errors {
        anyhow::bail!("scenario validation found errors");
    }

    Ok(())
}
