//! Human-readable rendering of sequencer outcomes.

use crate::output::render_table;
use o2d_core::clock::{format_full, format_time};
use o2d_core::scenario::Scenario;
use o2d_core::sequencer::{Advance, Resolution, Sequencer};
use o2d_core::summary::Summary;
use o2d_core::types::TimeUnit;

pub fn cost(duration: u64, unit: TimeUnit) -> String {
    format!("+{duration} {}", unit.suffix())
}

pub fn welcome(scenario: &Scenario) -> String {
    format!(
        "Welcome to {}\n{} stages, {} scripted delays. Type 'help' for commands.\n",
        scenario.display_title(),
        scenario.stage_count(),
        scenario.delay_count()
    )
}

pub fn advance(outcome: &Advance, unit: TimeUnit, step: usize) -> String {
    match outcome {
        Advance::DelaySurfaced { stage, delay } => {
            let mut s = format!("Delay in {stage}: {}\n", delay.reason);
            if !delay.action.is_empty() {
                s.push_str(&format!("  action: {}\n", delay.action));
            }
            s.push_str(&format!(
                "  cost:   {}, {} touchpoint(s)\n  fix with: fix {}\n",
                cost(delay.duration, unit),
                delay.touchpoints,
                delay.reason
            ));
            s
        }
        Advance::StageCompleted {
            stage,
            message,
            completed_at,
            next_stage,
        } => format!(
            "{stage} completed at {}: {message}\n{}",
            format_time(*completed_at),
            step_header(step, next_stage)
        ),
        Advance::Delivered {
            message,
            delivered_at,
            ..
        } => format!(
            "{message}\nDelivery completed at {}\n",
            format_full(*delivered_at)
        ),
    }
}

pub fn step_header(step: usize, stage: &str) -> String {
    format!("Step {step}: {stage}\n")
}

pub fn resolution(r: &Resolution, unit: TimeUnit) -> String {
    let mut s = format!(
        "Fixed: {} in {} -> {}\n",
        r.delay.reason,
        r.stage,
        cost(r.delay.duration, unit)
    );
    if !r.delay.resolution.is_empty() {
        s.push_str(&format!("  {}\n", r.delay.resolution));
    }
    s.push_str(&format!("  clock: {}\n", format_full(r.clock)));
    s
}

pub fn status(seq: &Sequencer) -> String {
    let st = seq.state();
    let count = seq.scenario().stage_count();
    let mut s = match seq.current_stage() {
        Some(stage) => format!(
            "Step {}/{}: {} [{}]\n",
            st.stage_index + 1,
            count,
            stage.name,
            seq.status()
        ),
        None => format!("All {count} stages completed [{}]\n", seq.status()),
    };
    s.push_str(&format!("Clock: {}\n", format_full(seq.clock())));
    let pending = seq.pending();
    if !pending.is_empty() {
        s.push_str("Pending:\n");
        for (i, d) in pending.iter().enumerate() {
            s.push_str(&format!("  {}. {} ({})\n", i + 1, d.reason, d.action));
        }
    }
    s
}

pub fn summary(summary: &Summary) -> String {
    let rows: Vec<Vec<String>> = summary
        .stages
        .iter()
        .map(|st| {
            vec![
                st.name.clone(),
                st.elapsed.to_string(),
                st.touchpoints.to_string(),
                st.completed_at.map(format_time).unwrap_or_else(|| "-".to_string()),
            ]
        })
        .collect();

    let mut s = render_table(&["STAGE", "ELAPSED", "TOUCHPOINTS", "COMPLETED"], &rows, "");
    s.push_str(&format!(
        "Total: {} {}, {} touchpoint(s)\n",
        summary.total_elapsed, summary.unit, summary.total_touchpoints
    ));
    s.push_str(&format!(
        "Started {}, now {}\n",
        format_full(summary.started_at),
        format_full(summary.clock)
    ));

    if !summary.delays.is_empty() {
        s.push_str("\nFix log:\n");
        for d in &summary.delays {
            if d.fixed {
                s.push_str(&format!(
                    "  {} in {} -> {}\n",
                    d.reason,
                    d.stage,
                    cost(d.duration, summary.unit)
                ));
            } else {
                s.push_str(&format!("  {} in {} -> not fixed\n", d.reason, d.stage));
            }
        }
    }
    if summary.delivered() {
        s.push_str(&format!("\nDelivered at {}\n", format_full(summary.clock)));
    }
    s
}

pub fn help() -> &'static str {
    "Commands:
  advance | next            surface the next delay or complete the stage
  fix <reason>              fix a delay of the active stage
  fix #<n>                  fix the n-th pending delay (a bare number works
                            unless it is also a reason)
  fix <stage>:<reason>      fix a delay naming its stage explicitly
  status                    show the active stage and pending delays
  summary                   show elapsed time, touchpoints and the fix log
  reset                     start the order over
  help                      show this help
  quit | exit               leave the simulator
"
}
