use crate::error::{Result, SimError};
use crate::scenario::{DelayDefinition, Scenario, StageDef};
use crate::summary::Summary;
use crate::types::{AdvancePolicy, SequencerStatus};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

// ---------------------------------------------------------------------------
// Supporting types
// ---------------------------------------------------------------------------

/// A delay definition that has been surfaced during the current run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DelayInstance {
    /// Index of the owning stage.
    pub stage: usize,
    /// Index of the definition within the stage.
    pub delay: usize,
    pub fixed: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageCompletion {
    pub stage: usize,
    pub message: String,
    pub completed_at: NaiveDateTime,
}

// ---------------------------------------------------------------------------
// SequencerState
// ---------------------------------------------------------------------------

/// Everything that changes during a run. Two states compare equal iff the
/// runs are indistinguishable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SequencerState {
    /// `0..=stage_count`; equal to the stage count once delivered.
    pub stage_index: usize,
    /// Next undrawn delay of the active stage.
    pub delay_cursor: usize,
    pub elapsed: Vec<u64>,
    pub touchpoints: Vec<u32>,
    /// Encounter order. The fixed flags form the set of fixed pairs.
    pub encountered: Vec<DelayInstance>,
    pub completions: Vec<StageCompletion>,
    pub delivered: bool,
}

impl SequencerState {
    pub fn new(stage_count: usize) -> Self {
        Self {
            stage_index: 0,
            delay_cursor: 0,
            elapsed: vec![0; stage_count],
            touchpoints: vec![0; stage_count],
            encountered: Vec::new(),
            completions: Vec::new(),
            delivered: false,
        }
    }

    pub fn total_elapsed(&self) -> u64 {
        self.elapsed.iter().fold(0u64, |acc, e| acc.saturating_add(*e))
    }

    pub fn total_touchpoints(&self) -> u64 {
        self.touchpoints.iter().map(|t| u64::from(*t)).sum()
    }
}

// ---------------------------------------------------------------------------
// Transition outcomes
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Advance {
    DelaySurfaced {
        stage: String,
        delay: DelayDefinition,
    },
    StageCompleted {
        stage: String,
        message: String,
        completed_at: NaiveDateTime,
        next_stage: String,
    },
    Delivered {
        stage: String,
        message: String,
        delivered_at: NaiveDateTime,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Resolution {
    pub stage: String,
    pub delay: DelayDefinition,
    pub stage_elapsed: u64,
    pub stage_touchpoints: u32,
    pub clock: NaiveDateTime,
}

// ---------------------------------------------------------------------------
// Sequencer
// ---------------------------------------------------------------------------

/// One training session walking a scenario's stages.
///
/// The scenario is shared and immutable; the state is owned by this value
/// alone, so independent sessions never observe each other.
#[derive(Debug, Clone)]
pub struct Sequencer {
    scenario: Arc<Scenario>,
    policy: AdvancePolicy,
    state: SequencerState,
}

impl Sequencer {
    pub fn new(scenario: Scenario) -> Result<Self> {
        Self::from_shared(Arc::new(scenario))
    }

    pub fn from_shared(scenario: Arc<Scenario>) -> Result<Self> {
        scenario.ensure_valid()?;
        let state = SequencerState::new(scenario.stage_count());
        Ok(Self {
            policy: scenario.policy,
            scenario,
            state,
        })
    }

    /// A fresh session over the same scenario and policy.
    pub fn new_session(&self) -> Self {
        Self {
            scenario: Arc::clone(&self.scenario),
            policy: self.policy,
            state: SequencerState::new(self.scenario.stage_count()),
        }
    }

    /// Override the scenario's advance policy for this session.
    pub fn with_policy(mut self, policy: AdvancePolicy) -> Self {
        self.policy = policy;
        self
    }

    // -----------------------------------------------------------------------
    // Reads
    // -----------------------------------------------------------------------

    pub fn scenario(&self) -> &Scenario {
        &self.scenario
    }

    pub fn policy(&self) -> AdvancePolicy {
        self.policy
    }

    pub fn state(&self) -> &SequencerState {
        &self.state
    }

    pub fn status(&self) -> SequencerStatus {
        if self.state.delivered {
            SequencerStatus::Delivered
        } else if self.pending().is_empty() {
            SequencerStatus::AwaitingAdvance
        } else {
            SequencerStatus::AwaitingResolve
        }
    }

    /// The active stage, `None` once delivered.
    pub fn current_stage(&self) -> Option<&StageDef> {
        if self.state.delivered {
            return None;
        }
        self.scenario.stages.get(self.state.stage_index)
    }

    /// Surfaced but unfixed delays of the active stage, in encounter order.
    pub fn pending(&self) -> Vec<&DelayDefinition> {
        let Some(stage) = self.current_stage() else {
            return Vec::new();
        };
        self.state
            .encountered
            .iter()
            .filter(|i| i.stage == self.state.stage_index && !i.fixed)
            .filter_map(|i| stage.delays.get(i.delay))
            .collect()
    }

    /// Current simulated time.
    pub fn clock(&self) -> NaiveDateTime {
        self.scenario.clock().at(self.state.total_elapsed())
    }

    pub fn summary(&self) -> Summary {
        Summary::build(&self.scenario, &self.state, self.status(), self.clock())
    }

    // -----------------------------------------------------------------------
    // Transitions
    // -----------------------------------------------------------------------

    /// Surface the next delay of the active stage, or complete the stage
    /// when none remain.
    pub fn advance(&mut self) -> Result<Advance> {
        if self.state.delivered {
            return Err(SimError::AlreadyDelivered);
        }
        let idx = self.state.stage_index;
        let Some(stage) = self.scenario.stages.get(idx) else {
            return Err(SimError::AlreadyDelivered);
        };

        if let Some(unresolved) = self.pending().first() {
            if !self.policy.allows_unresolved() {
                return Err(SimError::UnresolvedDelay {
                    stage: stage.name.clone(),
                    reason: unresolved.reason.clone(),
                });
            }
            tracing::debug!(
                stage = %stage.name,
                reason = %unresolved.reason,
                "pushing past unresolved delay"
            );
        }

        if let Some(delay) = stage.delays.get(self.state.delay_cursor) {
            self.state.encountered.push(DelayInstance {
                stage: idx,
                delay: self.state.delay_cursor,
                fixed: false,
            });
            self.state.delay_cursor += 1;
            tracing::debug!(stage = %stage.name, reason = %delay.reason, "delay surfaced");
            return Ok(Advance::DelaySurfaced {
                stage: stage.name.clone(),
                delay: delay.clone(),
            });
        }

        let completed_at = self.clock();
        let message = stage.completion_text();
        self.state.completions.push(StageCompletion {
            stage: idx,
            message: message.clone(),
            completed_at,
        });
        self.state.delay_cursor = 0;
        self.state.stage_index += 1;

        match self.scenario.stages.get(self.state.stage_index) {
            Some(next) => {
                tracing::debug!(stage = %stage.name, next = %next.name, "stage completed");
                Ok(Advance::StageCompleted {
                    stage: stage.name.clone(),
                    message,
                    completed_at,
                    next_stage: next.name.clone(),
                })
            }
            None => {
                self.state.delivered = true;
                tracing::info!(
                    scenario = %self.scenario.name,
                    elapsed = self.state.total_elapsed(),
                    "order delivered"
                );
                Ok(Advance::Delivered {
                    stage: stage.name.clone(),
                    message,
                    delivered_at: completed_at,
                })
            }
        }
    }

    /// Mark a surfaced delay of the active stage as fixed and accrue its cost.
    pub fn resolve(&mut self, stage: &str, reason: &str) -> Result<Resolution> {
        let unknown = || SimError::UnknownStageOrReason {
            stage: stage.to_string(),
            reason: reason.to_string(),
        };
        if self.state.delivered {
            return Err(SimError::AlreadyDelivered);
        }
        let stage_idx = self.scenario.stage_index(stage).ok_or_else(unknown)?;
        let (delay_idx, def) = self.scenario.stages[stage_idx]
            .delay(reason)
            .ok_or_else(unknown)?;

        let invalid = || SimError::InvalidResolve {
            stage: stage.to_string(),
            reason: reason.to_string(),
        };
        if stage_idx != self.state.stage_index {
            return Err(invalid());
        }
        let instance = self
            .state
            .encountered
            .iter_mut()
            .find(|i| i.stage == stage_idx && i.delay == delay_idx && !i.fixed)
            .ok_or_else(invalid)?;

        instance.fixed = true;
        let elapsed = &mut self.state.elapsed[stage_idx];
        *elapsed = elapsed.saturating_add(def.duration);
        let touchpoints = &mut self.state.touchpoints[stage_idx];
        *touchpoints = touchpoints.saturating_add(def.touchpoints);

        let resolution = Resolution {
            stage: stage.to_string(),
            delay: def.clone(),
            stage_elapsed: self.state.elapsed[stage_idx],
            stage_touchpoints: self.state.touchpoints[stage_idx],
            clock: self.clock(),
        };
        tracing::debug!(
            stage,
            reason,
            duration = def.duration,
            touchpoints = def.touchpoints,
            "delay fixed"
        );
        Ok(resolution)
    }

    /// Start the run over from the first stage.
    pub fn reset(&mut self) {
        self.state = SequencerState::new(self.scenario.stage_count());
        tracing::debug!(scenario = %self.scenario.name, "sequencer reset");
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
