use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::filters::{ThresholdWindow, binary_threshold, min_max, otsu_threshold};
use crate::model::{ImageData, Volume};

use super::{NoopHooks, PreviewHooks, Progress, Result, ToolError, transfer_volume};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ParamSpec {
    pub name: String,
    pub description: String,
    pub required: bool,
    pub kind: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AlgorithmSchema {
    pub name: String,
    pub description: String,
    pub params: Vec<ParamSpec>,
}

/// Preview algorithm selected by configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AlgorithmSpec {
    Noop,
    Threshold {
        lower: f64,
        upper: f64,
    },
    #[default]
    Otsu,
}

impl AlgorithmSpec {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Noop => "noop",
            Self::Threshold { .. } => "threshold",
            Self::Otsu => "otsu",
        }
    }

    pub fn build(&self) -> Result<Box<dyn PreviewHooks>> {
        Ok(match self {
            Self::Noop => Box::new(NoopHooks),
            Self::Threshold { lower, upper } => {
                Box::new(ThresholdHooks::new(ThresholdWindow::new(*lower, *upper)?))
            }
            Self::Otsu => Box::new(OtsuThresholdHooks::default()),
        })
    }
}

pub fn list_algorithms() -> Vec<AlgorithmSchema> {
    let bound = |name: &str, description: &str| ParamSpec {
        name: name.to_string(),
        description: description.to_string(),
        required: true,
        kind: "float".to_string(),
    };
    vec![
        AlgorithmSchema {
            name: "noop".to_string(),
            description: "Leaves the preview as a copy of the working segmentation.".to_string(),
            params: vec![],
        },
        AlgorithmSchema {
            name: "otsu".to_string(),
            description: "Binary threshold from Otsu's method up to the input maximum, estimated on the first time step of the input.".to_string(),
            params: vec![],
        },
        AlgorithmSchema {
            name: "threshold".to_string(),
            description: "Binary threshold with a fixed inclusive intensity window.".to_string(),
            params: vec![
                bound("lower", "Lowest intensity inside the segmentation."),
                bound("upper", "Highest intensity inside the segmentation."),
            ],
        },
    ]
}

/// Value written for segmented voxels: the active label of a label set, 1 otherwise.
fn foreground_value(preview: &ImageData) -> f64 {
    preview
        .labels()
        .map(|labels| f64::from(labels.active_label().value))
        .unwrap_or(1.0)
}

fn threshold_into_preview(
    window: ThresholdWindow,
    input: &Volume,
    preview: &mut ImageData,
    time_step: usize,
    progress: &mut Progress,
) -> Result<()> {
    let segmented = binary_threshold(
        input,
        0,
        window,
        foreground_value(preview),
        preview.pixel_type(),
    )
    .map_err(|error| ToolError::Algorithm(error.to_string()))?;
    progress.advance(progress.remaining() / 2);
    transfer_volume(&segmented, preview.volume_mut(), time_step)?;
    Ok(())
}

/// Fixed-window binary threshold.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThresholdHooks {
    window: ThresholdWindow,
}

impl ThresholdHooks {
    pub fn new(window: ThresholdWindow) -> Self {
        Self { window }
    }

    pub fn window(&self) -> ThresholdWindow {
        self.window
    }
}

impl PreviewHooks for ThresholdHooks {
    fn name(&self) -> &str {
        "threshold"
    }

    fn do_update_preview(
        &mut self,
        input: &Volume,
        preview: &mut ImageData,
        time_step: usize,
        progress: &mut Progress,
    ) -> Result<()> {
        threshold_into_preview(self.window, input, preview, time_step, progress)
    }
}

/// Threshold whose window is estimated from the segmentation input.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct OtsuThresholdHooks {
    window: Option<ThresholdWindow>,
}

impl OtsuThresholdHooks {
    pub fn window(&self) -> Option<ThresholdWindow> {
        self.window
    }
}

impl PreviewHooks for OtsuThresholdHooks {
    fn name(&self) -> &str {
        "otsu"
    }

    fn initiate_by_input(&mut self, input: &Volume) -> Result<()> {
        let threshold = otsu_threshold(input, 0)?;
        let (_, max) = min_max(input, 0)?;
        let window = ThresholdWindow::new(threshold.min(max), max)?;
        debug!(lower = window.lower, upper = window.upper, "estimated otsu window");
        self.window = Some(window);
        Ok(())
    }

    fn do_update_preview(
        &mut self,
        input: &Volume,
        preview: &mut ImageData,
        time_step: usize,
        progress: &mut Progress,
    ) -> Result<()> {
        let window = self.window.ok_or_else(|| {
            ToolError::Algorithm("otsu window was not estimated from an input".to_string())
        })?;
        threshold_into_preview(window, input, preview, time_step, progress)
    }
}
