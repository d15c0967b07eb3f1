use crate::scenario::Scenario;
use crate::sequencer::SequencerState;
use crate::types::{SequencerStatus, TimeUnit};
use chrono::NaiveDateTime;
use serde::Serialize;

// ---------------------------------------------------------------------------
// Summary
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StageSummary {
    pub name: String,
    pub elapsed: u64,
    pub touchpoints: u32,
    pub completed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<NaiveDateTime>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DelayLogEntry {
    pub stage: String,
    pub reason: String,
    pub duration: u64,
    pub touchpoints: u32,
    pub fixed: bool,
}

/// Read-only report of a run: totals, per-stage breakdown and every delay
/// surfaced so far in encounter order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub scenario: String,
    pub unit: TimeUnit,
    pub status: SequencerStatus,
    pub stage_index: usize,
    pub stage_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_stage: Option<String>,
    pub started_at: NaiveDateTime,
    pub clock: NaiveDateTime,
    pub total_elapsed: u64,
    pub total_touchpoints: u64,
    pub stages: Vec<StageSummary>,
    pub delays: Vec<DelayLogEntry>,
}

impl Summary {
    pub fn build(
        scenario: &Scenario,
        state: &SequencerState,
        status: SequencerStatus,
        clock: NaiveDateTime,
    ) -> Self {
        let stages = scenario
            .stages
            .iter()
            .enumerate()
            .map(|(i, stage)| {
                let completion = state.completions.iter().find(|c| c.stage == i);
                StageSummary {
                    name: stage.name.clone(),
                    elapsed: state.elapsed.get(i).copied().unwrap_or(0),
                    touchpoints: state.touchpoints.get(i).copied().unwrap_or(0),
                    completed: completion.is_some(),
                    completed_at: completion.map(|c| c.completed_at),
                    message: completion.map(|c| c.message.clone()),
                }
            })
            .collect();

        let delays = state
            .encountered
            .iter()
            .filter_map(|inst| {
                let stage = scenario.stages.get(inst.stage)?;
                let def = stage.delays.get(inst.delay)?;
                Some(DelayLogEntry {
                    stage: stage.name.clone(),
                    reason: def.reason.clone(),
                    duration: def.duration,
                    touchpoints: def.touchpoints,
                    fixed: inst.fixed,
                })
            })
            .collect();

        let current_stage = if state.delivered {
            None
        } else {
            scenario
                .stages
                .get(state.stage_index)
                .map(|s| s.name.clone())
        };

        Self {
            scenario: scenario.name.clone(),
            unit: scenario.unit,
            status,
            stage_index: state.stage_index,
            stage_count: scenario.stage_count(),
            current_stage,
            started_at: scenario.start_time,
            clock,
            total_elapsed: state.total_elapsed(),
            total_touchpoints: state.total_touchpoints(),
            stages,
            delays,
        }
    }

    pub fn delivered(&self) -> bool {
        self.status.is_terminal()
    }

    /// Fixed delays only, in the order they were surfaced.
    pub fn fix_log(&self) -> impl Iterator<Item = &DelayLogEntry> {
        self.delays.iter().filter(|d| d.fixed)
    }

    pub fn unfixed_count(&self) -> usize {
        self.delays.iter().filter(|d| !d.fixed).count()
    }
}
