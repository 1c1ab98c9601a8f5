use crate::model::{ImageData, Volume};

use super::{Progress, Result};

/// Customization points of a preview-based tool.
///
/// Every hook has a no-op default. [`PreviewHooks::do_update_preview`]
/// receives a single-time-step input volume and must write its result into
/// `time_step` of `preview`. Returning [`super::ToolError::Algorithm`]
/// marks a recoverable failure; any other error aborts the update.
pub trait PreviewHooks {
    fn name(&self) -> &str {
        "noop"
    }

    /// Called whenever the segmentation input changes (activation or region change).
    fn initiate_by_input(&mut self, _input: &Volume) -> Result<()> {
        Ok(())
    }

    fn update_prepare(&mut self) {}

    fn update_clean_up(&mut self) {}

    fn do_update_preview(
        &mut self,
        _input: &Volume,
        _preview: &mut ImageData,
        _time_step: usize,
        _progress: &mut Progress,
    ) -> Result<()> {
        Ok(())
    }
}

/// Hooks that leave the preview untouched.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopHooks;

impl PreviewHooks for NoopHooks {}
