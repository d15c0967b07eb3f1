use crate::output::print_json;
use crate::view;
use anyhow::Context;
use o2d_core::sequencer::{Advance, Resolution, Sequencer};
use o2d_core::summary::Summary;
use serde::Serialize;
use std::path::Path;

#[derive(Debug, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum RunEvent {
    Advanced(Advance),
    Fixed(Resolution),
}

#[derive(Debug, Serialize)]
pub struct RunReport {
    pub events: Vec<RunEvent>,
    pub summary: Summary,
}

/// Walk `seq` to delivery, fixing each surfaced delay unless `skip_fixes`.
pub fn walk(seq: &mut Sequencer, skip_fixes: bool) -> anyhow::Result<RunReport> {
    if skip_fixes && !seq.policy().allows_unresolved() {
        anyhow::bail!("--skip-fixes requires the permissive policy (pass --permissive)");
    }

    let mut events = Vec::new();
    loop {
        let outcome = seq.advance().context("advance failed")?;
        let delivered = matches!(outcome, Advance::Delivered { .. });
        let fix = match &outcome {
            Advance::DelaySurfaced { stage, delay } if !skip_fixes => {
                Some((stage.clone(), delay.reason.clone()))
            }
            _ => None,
        };
        events.push(RunEvent::Advanced(outcome));
        if let Some((stage, reason)) = fix {
            let r = seq
                .resolve(&stage, &reason)
                .with_context(|| format!("failed to fix '{reason}' in '{stage}'"))?;
            events.push(RunEvent::Fixed(r));
        }
        if delivered {
            break;
        }
    }

    Ok(RunReport {
        events,
        summary: seq.summary(),
    })
}

pub fn run(
    root: &Path,
    scenario: Option<&Path>,
    permissive: bool,
    skip_fixes: bool,
    json: bool,
) -> anyhow::Result<()> {
    let mut seq = super::open_session(root, scenario, permissive)?;
    let report = walk(&mut seq, skip_fixes)?;

    if json {
        return print_json(&report);
    }

    print!("{}", render(&seq, &report));
    Ok(())
}

fn render(seq: &Sequencer, report: &RunReport) -> String {
    let scenario = seq.scenario();
    let mut s = format!("{}\n", scenario.display_title());
    if let Some(first) = scenario.stages.first() {
        s.push_str(&view::step_header(1, &first.name));
    }
    let mut step = 1;
    for event in &report.events {
        match event {
            RunEvent::Advanced(outcome) => {
                if matches!(outcome, Advance::StageCompleted { .. }) {
                    step += 1;
                }
                s.push_str(&view::advance(outcome, scenario.unit, step));
            }
            RunEvent::Fixed(r) => s.push_str(&view::resolution(r, scenario.unit)),
        }
    }
    s.push('\n');
    s.push_str(&view::summary(&report.summary));
    s
}
