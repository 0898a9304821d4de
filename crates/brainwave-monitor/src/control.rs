//! Control surface result types

use serde::{Deserialize, Serialize};

/// Outcome of a control operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControlResponse {
    pub success: bool,
    pub message: String,
}

impl ControlResponse {
    pub fn ok(message: impl Into<String>) -> Self {
        ControlResponse {
            success: true,
            message: message.into(),
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        ControlResponse {
            success: false,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ControlResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let outcome = if self.success { "ok" } else { "failed" };
        write!(f, "[{}] {}", outcome, self.message)
    }
}

/// Read-only view of the pipeline's lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PipelineStatus {
    pub connected: bool,
    pub streaming: bool,
    /// The acquisition loop is live and pulling from the source
    pub has_active_source: bool,
    pub publishing: bool,
}
