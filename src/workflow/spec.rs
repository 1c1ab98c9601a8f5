use serde::{Deserialize, Serialize};

use crate::model::PixelType;
use crate::tool::{AlgorithmSpec, ToolSettings};

use super::{Result, SessionError};

/// Scripted tool session over a synthetic reference volume.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SessionSpec {
    pub name: Option<String>,
    pub reference: ReferenceSpec,
    #[serde(default)]
    pub working: WorkingSpec,
    #[serde(default)]
    pub tool: ToolSpec,
    #[serde(default)]
    pub steps: Vec<SessionStep>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReferenceSpec {
    /// Two or three extents in index order.
    pub shape: Vec<usize>,
    #[serde(default = "default_time_steps")]
    pub time_steps: usize,
    #[serde(default = "default_step_duration")]
    pub step_duration: f64,
    #[serde(default = "default_spacing")]
    pub spacing: [f64; 3],
    #[serde(default)]
    pub origin: [f64; 3],
    #[serde(default)]
    pub pixel_type: PixelType,
    #[serde(default)]
    pub phantom: Phantom,
    pub layer: Option<i64>,
}

fn default_time_steps() -> usize {
    1
}

fn default_step_duration() -> f64 {
    1.0
}

fn default_spacing() -> [f64; 3] {
    [1.0; 3]
}

fn default_intensity() -> f64 {
    100.0
}

/// Synthetic intensity pattern of the reference.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Phantom {
    /// Value is the first index plus the time step.
    #[default]
    Ramp,
    /// Bright ball on a zero background whose radius grows by `growth` per time step.
    Sphere {
        /// Index-space centre; defaults to the volume centre.
        center: Option<[f64; 3]>,
        radius: f64,
        #[serde(default = "default_intensity")]
        intensity: f64,
        #[serde(default)]
        growth: f64,
    },
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum WorkingKind {
    #[default]
    LabelSet,
    Volume,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WorkingSpec {
    #[serde(default)]
    pub kind: WorkingKind,
    #[serde(default = "default_active_label")]
    pub active_label: u16,
    #[serde(default = "default_label_name")]
    pub label_name: String,
    /// One time step regardless of the reference's time steps.
    #[serde(default)]
    pub static_segmentation: bool,
}

fn default_active_label() -> u16 {
    1
}

fn default_label_name() -> String {
    "Label 1".to_string()
}

impl Default for WorkingSpec {
    fn default() -> Self {
        Self {
            kind: WorkingKind::default(),
            active_label: default_active_label(),
            label_name: default_label_name(),
            static_segmentation: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ToolSpec {
    #[serde(default = "default_tool_name")]
    pub name: String,
    #[serde(default)]
    pub algorithm: AlgorithmSpec,
    #[serde(default)]
    pub settings: ToolSettings,
}

fn default_tool_name() -> String {
    "Auto segmentation".to_string()
}

impl Default for ToolSpec {
    fn default() -> Self {
        Self {
            name: default_tool_name(),
            algorithm: AlgorithmSpec::default(),
            settings: ToolSettings::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum SessionStep {
    Activate,
    SelectTimePoint {
        time_point: f64,
    },
    /// Half-open index box `[min, max)` on the reference grid.
    SetRoi {
        min: [usize; 3],
        max: [usize; 3],
    },
    /// Ball mask on the reference grid.
    SetRoiMask {
        center: [f64; 3],
        radius: f64,
    },
    ClearRoi,
    Update {
        #[serde(default)]
        ignore_lazy: bool,
    },
    Confirm,
    Deactivate,
}

impl SessionStep {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Activate => "activate",
            Self::SelectTimePoint { .. } => "select_time_point",
            Self::SetRoi { .. } => "set_roi",
            Self::SetRoiMask { .. } => "set_roi_mask",
            Self::ClearRoi => "clear_roi",
            Self::Update { .. } => "update",
            Self::Confirm => "confirm",
            Self::Deactivate => "deactivate",
        }
    }
}

impl SessionSpec {
    pub fn validate(&self) -> Result<()> {
        let reference = &self.reference;
        if !matches!(reference.shape.len(), 2 | 3) {
            return Err(SessionError::Parse(format!(
                "reference shape must have 2 or 3 extents, got {}",
                reference.shape.len()
            )));
        }
        if reference.shape.contains(&0) || reference.time_steps == 0 {
            return Err(SessionError::Parse(
                "reference extents and time steps must be positive".to_string(),
            ));
        }
        if self.steps.is_empty() {
            return Err(SessionError::Parse(
                "session must include at least one step".to_string(),
            ));
        }
        for (index, step) in self.steps.iter().enumerate() {
            match step {
                SessionStep::SetRoi { min, max } if min.iter().zip(max).any(|(l, u)| l >= u) => {
                    return Err(SessionError::Parse(format!(
                        "step {index}: region {min:?}..{max:?} is empty"
                    )));
                }
                SessionStep::SetRoiMask { radius, .. } if *radius <= 0.0 => {
                    return Err(SessionError::Parse(format!(
                        "step {index}: mask radius must be positive"
                    )));
                }
                SessionStep::SelectTimePoint { time_point } if !time_point.is_finite() => {
                    return Err(SessionError::Parse(format!(
                        "step {index}: time point must be finite"
                    )));
                }
                _ => {}
            }
        }
        Ok(())
    }
}
