use serde::Serialize;
use tracing::{debug, error, warn};

use crate::model::{ImageData, Volume};

use super::{
    PREVIEW_PROGRESS_STEPS, PreviewHooks, Progress, Result, Signal, ToolError, ToolSettings,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PreviewState {
    Idle,
    Preparing,
    Computing,
    Finalizing,
    /// An unexpected error escaped the last update.
    Failed,
}

/// Which preview time steps an update recomputes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UpdateScope {
    AllTimeSteps,
    CurrentTimeStep,
}

/// Scope of an update over a preview with `preview_time_steps` steps.
///
/// Dynamic previews are recomputed completely unless lazy previews are on
/// and the caller did not ask to ignore laziness.
pub fn update_scope(preview_time_steps: usize, ignore_lazy: bool, lazy: bool) -> UpdateScope {
    if preview_time_steps > 1 && (ignore_lazy || !lazy) {
        UpdateScope::AllTimeSteps
    } else {
        UpdateScope::CurrentTimeStep
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum UpdateOutcome {
    /// Input or preview was missing; nothing was computed.
    Skipped,
    Completed { time_steps: Vec<usize> },
    /// The algorithm reported a recoverable failure.
    AlgorithmFailed { message: String },
}

/// State the time-point trigger decides on.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimePointTrigger {
    pub time_point_change_aware: bool,
    pub lazy_dynamic_previews: bool,
    pub preview_time_steps: Option<usize>,
    pub input_time_steps: Option<usize>,
    pub time_point: f64,
    pub last_time_point: f64,
}

/// Whether a change of the selected time point requires a preview update.
///
/// A static preview over a dynamic input always follows the time point; a
/// dynamic preview only does when it is computed lazily, otherwise every
/// step is already up to date.
pub fn should_update_on_time_point_change(trigger: &TimePointTrigger) -> bool {
    let (Some(preview_steps), Some(input_steps)) =
        (trigger.preview_time_steps, trigger.input_time_steps)
    else {
        return false;
    };
    if !trigger.time_point_change_aware || trigger.time_point == trigger.last_time_point {
        return false;
    }
    let static_over_dynamic = preview_steps == 1 && input_steps > 1;
    static_over_dynamic || (trigger.lazy_dynamic_previews && input_steps > 1)
}

/// Runs preview updates through the prepare, compute and finalize phases.
pub struct PreviewEngine {
    hooks: Box<dyn PreviewHooks>,
    state: PreviewState,
    progress: Progress,
    last_time_point: f64,
    pub currently_busy: Signal<bool>,
    pub error_message: Signal<String>,
    pub progress_changed: Signal<Progress>,
}

impl std::fmt::Debug for PreviewEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PreviewEngine")
            .field("hooks", &self.hooks.name())
            .field("state", &self.state)
            .field("progress", &self.progress)
            .field("last_time_point", &self.last_time_point)
            .finish()
    }
}

impl PreviewEngine {
    pub fn new(hooks: Box<dyn PreviewHooks>) -> Self {
        Self {
            hooks,
            state: PreviewState::Idle,
            progress: Progress::default(),
            last_time_point: 0.0,
            currently_busy: Signal::new(),
            error_message: Signal::new(),
            progress_changed: Signal::new(),
        }
    }

    pub fn state(&self) -> PreviewState {
        self.state
    }

    pub fn progress(&self) -> Progress {
        self.progress
    }

    /// Time point of the most recently finished update.
    pub fn last_time_point(&self) -> f64 {
        self.last_time_point
    }

    pub fn reset_last_time_point(&mut self) {
        self.last_time_point = 0.0;
    }

    pub fn hooks(&self) -> &dyn PreviewHooks {
        self.hooks.as_ref()
    }

    pub fn hooks_mut(&mut self) -> &mut dyn PreviewHooks {
        self.hooks.as_mut()
    }

    pub fn initiate_by_input(&mut self, input: &Volume) -> Result<()> {
        self.hooks.initiate_by_input(input)
    }

    /// Recomputes `preview` from `input` at `time_point`.
    ///
    /// Algorithm failures are reported through [`PreviewEngine::error_message`]
    /// and return [`UpdateOutcome::AlgorithmFailed`]. Any other error is
    /// returned after the engine has cleared its busy flag and finalized.
    pub fn update(
        &mut self,
        input: Option<&Volume>,
        preview: Option<&mut ImageData>,
        time_point: f64,
        settings: &ToolSettings,
        ignore_lazy: bool,
    ) -> Result<UpdateOutcome> {
        self.state = PreviewState::Preparing;
        self.hooks.update_prepare();

        self.state = PreviewState::Computing;
        self.currently_busy.send(&true);
        let computed = self.compute(input, preview, time_point, settings, ignore_lazy);

        let outcome = match computed {
            Ok(time_steps) if time_steps.is_empty() => UpdateOutcome::Skipped,
            Ok(time_steps) => UpdateOutcome::Completed { time_steps },
            Err(ToolError::Algorithm(message)) => {
                error!(hooks = self.hooks.name(), %message, "preview algorithm failed");
                self.error_message
                    .send(&format!("Failed to compute preview: {message}"));
                UpdateOutcome::AlgorithmFailed { message }
            }
            Err(other) => {
                warn!(hooks = self.hooks.name(), error = %other, "preview update aborted");
                self.finish(time_point);
                self.state = PreviewState::Failed;
                return Err(other);
            }
        };
        self.finish(time_point);
        self.state = PreviewState::Idle;
        Ok(outcome)
    }

    fn compute(
        &mut self,
        input: Option<&Volume>,
        preview: Option<&mut ImageData>,
        time_point: f64,
        settings: &ToolSettings,
        ignore_lazy: bool,
    ) -> Result<Vec<usize>> {
        let (Some(input), Some(preview)) = (input, preview) else {
            return Ok(Vec::new());
        };
        self.progress.restart(PREVIEW_PROGRESS_STEPS);
        self.progress_changed.send(&self.progress);

        let scope = update_scope(
            preview.time_steps(),
            ignore_lazy,
            settings.lazy_dynamic_previews,
        );
        debug!(?scope, time_point, hooks = self.hooks.name(), "updating preview");
        match scope {
            UpdateScope::AllTimeSteps => {
                let mut time_steps = Vec::with_capacity(input.time_steps());
                for time_step in 0..input.time_steps() {
                    let input_3d = input.select_time_step(time_step)?;
                    self.hooks
                        .do_update_preview(&input_3d, preview, time_step, &mut self.progress)?;
                    time_steps.push(time_step);
                }
                Ok(time_steps)
            }
            UpdateScope::CurrentTimeStep => {
                let preview_geometry = preview.volume().time_geometry();
                if !input.time_geometry().is_valid_time_point(time_point)
                    || !preview_geometry.is_valid_time_point(time_point)
                {
                    return Err(ToolError::Algorithm(format!(
                        "time point {time_point} is not valid for the segmentation input"
                    )));
                }
                let time_step = preview_geometry.time_point_to_time_step(time_point);
                let input_3d = input.select_time_point(time_point)?;
                self.hooks
                    .do_update_preview(&input_3d, preview, time_step, &mut self.progress)?;
                Ok(vec![time_step])
            }
        }
    }

    fn finish(&mut self, time_point: f64) {
        self.progress.complete();
        self.progress_changed.send(&self.progress);
        self.currently_busy.send(&false);
        self.state = PreviewState::Finalizing;
        self.hooks.update_clean_up();
        self.last_time_point = time_point;
    }
}
