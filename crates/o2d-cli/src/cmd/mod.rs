pub mod init;
pub mod play;
pub mod run;
pub mod scenario;

use anyhow::Context;
use o2d_core::scenario::WarnLevel;
use o2d_core::{paths, types::AdvancePolicy, Scenario, Sequencer};
use std::path::Path;

/// Load the scenario a command should use.
///
/// Priority:
/// 1. `--scenario` flag / `O2D_SCENARIO` env var
/// 2. `<root>/.o2d/scenario.yaml`
/// 3. The built-in order-to-delivery scenario
pub fn load_scenario(root: &Path, explicit: Option<&Path>) -> anyhow::Result<Scenario> {
    if let Some(path) = explicit {
        return Scenario::load(path)
            .with_context(|| format!("failed to load scenario {}", path.display()));
    }
    let path = paths::scenario_path(root);
    if path.exists() {
        return Scenario::load(&path)
            .with_context(|| format!("failed to load scenario {}", path.display()));
    }
    tracing::debug!("no scenario file found, using the built-in scenario");
    Ok(Scenario::o2d_default())
}

/// Start a fresh session, optionally forcing the permissive policy.
pub fn open_session(
    root: &Path,
    explicit: Option<&Path>,
    permissive: bool,
) -> anyhow::Result<Sequencer> {
    let scenario = load_scenario(root, explicit)?;
    for w in scenario.validate() {
        if w.level == WarnLevel::Warning {
            tracing::warn!(scenario = %scenario.name, "{}", w.message);
        }
    }
    let seq = Sequencer::new(scenario).context("scenario is not playable")?;
    Ok(if permissive {
        seq.with_policy(AdvancePolicy::Permissive)
    } else {
        seq
    })
}
