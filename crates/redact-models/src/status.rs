//! Pipeline lifecycle status.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One tracker's single active status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStatus {
    /// Nothing in flight
    #[default]
    Idle,
    /// Classifying a freshly confirmed region
    Detecting,
    /// Bulk audio scan in flight
    Scanning,
    /// Scan finished, entries available for editing
    Ready,
    /// Exactly one executor invocation in flight
    Processing,
    /// Action finished with a result location
    Completed,
    /// Scan or action failed with a message
    Error,
}

impl PipelineStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PipelineStatus::Idle => "idle",
            PipelineStatus::Detecting => "detecting",
            PipelineStatus::Scanning => "scanning",
            PipelineStatus::Ready => "ready",
            PipelineStatus::Processing => "processing",
            PipelineStatus::Completed => "completed",
            PipelineStatus::Error => "error",
        }
    }

    /// Check if this is a terminal state for one invocation.
    pub fn is_terminal(&self) -> bool {
        matches!(self, PipelineStatus::Completed | PipelineStatus::Error)
    }

    /// A remote call is in flight; triggering controls must be disabled.
    pub fn is_busy(&self) -> bool {
        matches!(
            self,
            PipelineStatus::Detecting | PipelineStatus::Scanning | PipelineStatus::Processing
        )
    }

    /// States from which an action may be started.
    pub fn accepts_trigger(&self) -> bool {
        matches!(self, PipelineStatus::Idle | PipelineStatus::Ready)
    }
}

impl fmt::Display for PipelineStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
