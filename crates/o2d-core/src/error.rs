use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SimError {
    #[error("invalid resolve: delay '{reason}' in stage '{stage}' is not pending")]
    InvalidResolve { stage: String, reason: String },

    #[error("order already delivered: reset to start a new run")]
    AlreadyDelivered,

    #[error("unknown stage or reason: '{stage}' / '{reason}'")]
    UnknownStageOrReason { stage: String, reason: String },

    #[error("delay '{reason}' in stage '{stage}' must be fixed before advancing")]
    UnresolvedDelay { stage: String, reason: String },

    #[error("invalid scenario: {0}")]
    InvalidScenario(String),

    #[error("scenario not found: {}", .0.display())]
    ScenarioNotFound(PathBuf),

    #[error("invalid slug '{0}': must be lowercase alphanumeric with hyphens")]
    InvalidSlug(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, SimError>;
