use crate::output::print_json;
use anyhow::Context;
use o2d_core::{io, paths, Scenario};
use std::path::Path;

pub fn run(root: &Path, force: bool, json: bool) -> anyhow::Result<()> {
    let path = paths::scenario_path(root);
    let scenario = Scenario::o2d_default();
    let data = render_yaml(&scenario)?;

    let written = if force {
        io::atomic_write(&path, data.as_bytes())
            .with_context(|| format!("failed to write {}", path.display()))?;
        true
    } else {
        io::write_if_missing(&path, data.as_bytes())
            .with_context(|| format!("failed to write {}", path.display()))?
    };

    if json {
        return print_json(&serde_json::json!({
            "path": path.display().to_string(),
            "written": written,
        }));
    }

    if written {
        println!("Wrote scenario '{}' to {}", scenario.name, path.display());
    } else {
        println!(
            "Scenario already exists at {} (use --force to overwrite)",
            path.display()
        );
    }
    Ok(())
}

fn render_yaml(scenario: &Scenario) -> anyhow::Result<String> {
    let header = "# Order-to-delivery scenario. Durations are in the unit below.\n";
    let body = scenario.to_yaml().context("failed to serialize scenario")?;
    Ok(format!("{header}{body}"))
}
