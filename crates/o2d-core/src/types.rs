use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// TimeUnit
// ---------------------------------------------------------------------------

/// Unit that every delay duration in a scenario is expressed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeUnit {
    #[default]
    Hours,
    Minutes,
    Seconds,
}

impl TimeUnit {
    pub fn as_str(self) -> &'static str {
        match self {
            TimeUnit::Hours => "hours",
            TimeUnit::Minutes => "minutes",
            TimeUnit::Seconds => "seconds",
        }
    }

    /// Short suffix used in fix logs, e.g. `+3 hrs`.
    pub fn suffix(self) -> &'static str {
        match self {
            TimeUnit::Hours => "hrs",
            TimeUnit::Minutes => "min",
            TimeUnit::Seconds => "sec",
        }
    }

    pub fn seconds_per_unit(self) -> i64 {
        match self {
            TimeUnit::Hours => 3600,
            TimeUnit::Minutes => 60,
            TimeUnit::Seconds => 1,
        }
    }
}

impl fmt::Display for TimeUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// AdvancePolicy
// ---------------------------------------------------------------------------

/// Whether `advance()` may push past a surfaced delay that was never fixed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdvancePolicy {
    #[default]
    Strict,
    Permissive,
}

impl AdvancePolicy {
    pub fn as_str(self) -> &'static str {
        match self {
            AdvancePolicy::Strict => "strict",
            AdvancePolicy::Permissive => "permissive",
        }
    }

    pub fn allows_unresolved(self) -> bool {
        matches!(self, AdvancePolicy::Permissive)
    }
}

impl fmt::Display for AdvancePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// SequencerStatus
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SequencerStatus {
    AwaitingAdvance,
    AwaitingResolve,
    Delivered,
}

impl SequencerStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            SequencerStatus::AwaitingAdvance => "awaiting_advance",
            SequencerStatus::AwaitingResolve => "awaiting_resolve",
            SequencerStatus::Delivered => "delivered",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, SequencerStatus::Delivered)
    }
}

impl fmt::Display for SequencerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
