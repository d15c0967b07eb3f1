use crate::clock::{self, SimClock};
use crate::error::{Result, SimError};
use crate::paths;
use crate::types::{AdvancePolicy, TimeUnit};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

// ---------------------------------------------------------------------------
// ScenarioWarning / WarnLevel
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioWarning {
    pub level: WarnLevel,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarnLevel {
    Warning,
    Error,
}

impl ScenarioWarning {
    fn warning(message: String) -> Self {
        Self {
            level: WarnLevel::Warning,
            message,
        }
    }

    fn error(message: String) -> Self {
        Self {
            level: WarnLevel::Error,
            message,
        }
    }
}

// ---------------------------------------------------------------------------
// DelayDefinition
// ---------------------------------------------------------------------------

/// A scripted obstacle raised while a stage is active.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DelayDefinition {
    /// Unique within its stage; this is what `resolve` is addressed by.
    pub reason: String,
    /// What the trainee does to clear the delay.
    #[serde(default)]
    pub action: String,
    /// Cost in the scenario's [`TimeUnit`].
    pub duration: u64,
    #[serde(default)]
    pub touchpoints: u32,
    #[serde(default)]
    pub resolution: String,
}

impl DelayDefinition {
    pub fn new(
        reason: impl Into<String>,
        action: impl Into<String>,
        duration: u64,
        touchpoints: u32,
        resolution: impl Into<String>,
    ) -> Self {
        Self {
            reason: reason.into(),
            action: action.into(),
            duration,
            touchpoints,
            resolution: resolution.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// StageDef
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageDef {
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub completion_message: String,
    #[serde(default)]
    pub delays: Vec<DelayDefinition>,
}

impl StageDef {
    pub fn new(name: impl Into<String>, completion_message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            completion_message: completion_message.into(),
            delays: Vec::new(),
        }
    }

    pub fn with_delay(mut self, delay: DelayDefinition) -> Self {
        self.delays.push(delay);
        self
    }

    /// Index and definition of `reason` within this stage.
    pub fn delay(&self, reason: &str) -> Option<(usize, &DelayDefinition)> {
        self.delays
            .iter()
            .enumerate()
            .find(|(_, d)| d.reason == reason)
    }

    pub fn completion_text(&self) -> String {
        if self.completion_message.trim().is_empty() {
            format!("{} completed", self.name)
        } else {
            self.completion_message.clone()
        }
    }
}

// ---------------------------------------------------------------------------
// Scenario (top-level)
// ---------------------------------------------------------------------------

/// Static stage/delay table a simulation run walks through.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scenario {
    #[serde(default = "default_version")]
    pub version: u32,
    pub name: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub unit: TimeUnit,
    #[serde(default)]
    pub policy: AdvancePolicy,
    #[serde(default = "clock::default_start")]
    pub start_time: NaiveDateTime,
    pub stages: Vec<StageDef>,
}

fn default_version() -> u32 {
    1
}

impl Scenario {
    pub fn new(name: impl Into<String>, stages: Vec<StageDef>) -> Self {
        Self {
            version: 1,
            name: name.into(),
            title: String::new(),
            unit: TimeUnit::default(),
            policy: AdvancePolicy::default(),
            start_time: clock::default_start(),
            stages,
        }
    }

    /// The built-in order-to-delivery walkthrough.
    pub fn o2d_default() -> Self {
        let stages = vec![
            StageDef::new(
                "Order processing",
                "Order processed and released to logistics",
            )
            .with_delay(DelayDefinition::new(
                "Customer funds unavailable",
                "Contact customer finance and secure a payment confirmation",
                3,
                2,
                "Credit released, order unblocked",
            ))
            .with_delay(DelayDefinition::new(
                "Stock shortage",
                "Reallocate stock from the nearest depot",
                1,
                1,
                "Stock reallocated to the order",
            ))
            .with_delay(DelayDefinition::new(
                "Incorrect Material",
                "Correct the material code with customer service",
                2,
                2,
                "Material corrected on the sales order",
            )),
            StageDef::new(
                "FO and vehicle placement",
                "Freight order created and vehicle placed",
            )
            .with_delay(DelayDefinition::new(
                "Vehicle Unavailable",
                "Escalate to the transporter for an alternate vehicle",
                4,
                2,
                "Alternate vehicle assigned",
            ))
            .with_delay(DelayDefinition::new(
                "Dock waiting",
                "Reprioritise the dock schedule with the warehouse",
                2,
                1,
                "Vehicle moved to an open dock",
            ))
            .with_delay(DelayDefinition::new(
                "Underload",
                "Consolidate with pending orders to fill the vehicle",
                12,
                3,
                "Load consolidated to full truck",
            )),
            StageDef::new("In Transit", "Shipment arrived at the customer location")
                .with_delay(DelayDefinition::new(
                    "No entry window",
                    "Re-plan the route around city entry restrictions",
                    8,
                    1,
                    "Entry window booked",
                ))
                .with_delay(DelayDefinition::new(
                    "Traffic/Road blocks",
                    "Reroute via the alternate highway",
                    3,
                    1,
                    "Vehicle rerouted",
                ))
                .with_delay(DelayDefinition::new(
                    "CD weekly off",
                    "Agree a delivery slot with the distributor for the next working day",
                    12,
                    2,
                    "Delivery slot confirmed",
                )),
            StageDef::new("Reached Customer", "Order delivered to the customer")
                .with_delay(DelayDefinition::new(
                    "Unloading Delayed",
                    "Arrange extra unloading labour with the distributor",
                    2,
                    1,
                    "Unloading completed",
                ))
                .with_delay(DelayDefinition::new(
                    "POD entry delayed",
                    "Follow up with the distributor for proof-of-delivery entry",
                    5,
                    2,
                    "Proof of delivery recorded",
                )),
        ];
        Self {
            title: "Order to Delivery (O2D) Simulation".to_string(),
            ..Self::new("o2d-default", stages)
        }
    }

    pub fn display_title(&self) -> &str {
        if self.title.is_empty() {
            &self.name
        } else {
            &self.title
        }
    }

    pub fn clock(&self) -> SimClock {
        SimClock::new(self.start_time, self.unit)
    }

    pub fn stage_count(&self) -> usize {
        self.stages.len()
    }

    pub fn stage_index(&self, name: &str) -> Option<usize> {
        self.stages.iter().position(|s| s.name == name)
    }

    pub fn stage(&self, name: &str) -> Option<&StageDef> {
        self.stages.iter().find(|s| s.name == name)
    }

    pub fn delay_count(&self) -> usize {
        self.stages.iter().map(|s| s.delays.len()).sum()
    }

    // -----------------------------------------------------------------------
    // Persistence
    // -----------------------------------------------------------------------

    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(SimError::ScenarioNotFound(path.to_path_buf()));
        }
        let data = std::fs::read_to_string(path)?;
        let scenario: Scenario = serde_yaml::from_str(&data)?;
        tracing::debug!(scenario = %scenario.name, path = %path.display(), "scenario loaded");
        Ok(scenario)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let data = self.to_yaml()?;
        crate::io::atomic_write(path, data.as_bytes())
    }

    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    // -----------------------------------------------------------------------
    // Validation
    // -----------------------------------------------------------------------

    pub fn validate(&self) -> Vec<ScenarioWarning> {
        let mut warnings = Vec::new();

        if paths::validate_slug(&self.name).is_err() {
            warnings.push(ScenarioWarning::error(format!(
                "scenario name '{}' must be lowercase alphanumeric with hyphens",
                self.name
            )));
        }

        if self.stages.is_empty() {
            warnings.push(ScenarioWarning::error(
                "scenario has no stages".to_string(),
            ));
        }

        let mut stage_names = HashSet::new();
        for (i, stage) in self.stages.iter().enumerate() {
            if stage.name.trim().is_empty() {
                warnings.push(ScenarioWarning::error(format!(
                    "stage #{} has an empty name",
                    i + 1
                )));
            } else if !stage_names.insert(stage.name.as_str()) {
                warnings.push(ScenarioWarning::error(format!(
                    "duplicate stage name '{}'",
                    stage.name
                )));
            }

            if stage.delays.is_empty() {
                warnings.push(ScenarioWarning::warning(format!(
                    "stage '{}' has no delays and completes on first advance",
                    stage.name
                )));
            }

            let mut reasons = HashSet::new();
            for delay in &stage.delays {
                if delay.reason.trim().is_empty() {
                    warnings.push(ScenarioWarning::error(format!(
                        "stage '{}' has a delay with an empty reason",
                        stage.name
                    )));
                    continue;
                }
                if !reasons.insert(delay.reason.as_str()) {
                    warnings.push(ScenarioWarning::error(format!(
                        "duplicate delay reason '{}' in stage '{}'",
                        delay.reason, stage.name
                    )));
                }
                if delay.action.trim().is_empty() {
                    warnings.push(ScenarioWarning::warning(format!(
                        "delay '{}' in stage '{}' has no action text",
                        delay.reason, stage.name
                    )));
                }
                if delay.duration == 0 {
                    warnings.push(ScenarioWarning::warning(format!(
                        "delay '{}' in stage '{}' costs no time",
                        delay.reason, stage.name
                    )));
                }
            }
        }

        warnings
    }

    /// Fail with the first error-level finding, if any.
    pub fn ensure_valid(&self) -> Result<()> {
        match self
            .validate()
            .into_iter()
            .find(|w| w.level == WarnLevel::Error)
        {
            Some(w) => Err(SimError::InvalidScenario(w.message)),
            None => Ok(()),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
