use serde::Serialize;
use tracing::{debug, info};

use crate::filters::{PadOptions, pad_to_reference};
use crate::model::Volume;

use super::{TransferError, transfer_time_step};

/// Outcome of confirming a preview into the result segmentation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommitReport {
    /// Time steps written, in ascending order.
    pub transferred_time_steps: Vec<usize>,
    /// Whether the result was padded back from a cropped region.
    pub padded: bool,
    pub result_extent: [usize; 3],
}

/// Transfers `preview` into `result`.
///
/// With `create_all_time_steps` every time step is transferred in ascending
/// order, otherwise only the step `time_point` maps to in the result's
/// time geometry.
pub fn transfer_preview(
    preview: &Volume,
    result: &mut Volume,
    create_all_time_steps: bool,
    time_point: f64,
) -> Result<Vec<usize>, TransferError> {
    if preview.time_steps() != result.time_steps() {
        return Err(TransferError::TimeStepCountMismatch {
            preview: preview.time_steps(),
            result: result.time_steps(),
        });
    }

    let time_steps = if create_all_time_steps {
        (0..preview.time_steps()).collect::<Vec<_>>()
    } else {
        vec![
            result
                .time_geometry()
                .time_point_to_time_step(time_point),
        ]
    };
    for time_step in &time_steps {
        transfer_time_step(preview, result, *time_step)?;
    }
    info!(
        transferred = time_steps.len(),
        create_all_time_steps, "transferred preview into result segmentation"
    );
    Ok(time_steps)
}

/// Pads a segmentation computed on a cropped region back onto the
/// reference grid, keeping only label value 1.
pub fn pad_to_reference_segmentation(
    segmentation: &Volume,
    reference: &Volume,
) -> Result<Volume, TransferError> {
    let padded = pad_to_reference(segmentation, reference, &PadOptions::binary(1.0, 1.0))?;
    debug!(extent = ?padded.geometry(0).map(|g| g.extent), "padded result segmentation");
    Ok(padded)
}
