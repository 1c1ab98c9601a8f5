use serde::{Deserialize, Serialize};

use crate::tool::{CommitReport, PreviewState, ToolSettings, UpdateOutcome};

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct StepReport {
    pub index: usize,
    pub step: String,
    pub duration_ms: u128,
    pub active: bool,
    pub time_point: f64,
    pub preview_state: PreviewState,
    /// Non-zero preview voxels over all time steps, while a preview is shown.
    pub preview_foreground: Option<usize>,
    pub update: Option<UpdateOutcome>,
    pub commit: Option<CommitReport>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SessionReport {
    pub session_name: Option<String>,
    pub tool: String,
    pub algorithm: String,
    pub settings: ToolSettings,
    pub steps: Vec<StepReport>,
    pub render_requests: u64,
    /// Messages emitted on the tool's error channel.
    pub error_messages: Vec<String>,
    pub result: ResultSummary,
}

/// Working segmentation after the last step.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ResultSummary {
    pub extent: [usize; 3],
    pub time_steps: usize,
    pub foreground_per_time_step: Vec<usize>,
}
