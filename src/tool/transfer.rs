use tracing::trace;

use crate::model::{CoreError, DEFAULT_GEOMETRY_PRECISION, Volume, geometry_equal};

use super::TransferError;

/// Copies the single-time-step volume `source` into `time_step` of `destination`.
///
/// Pixel type, dimensionality and geometry (origin, spacing, extent) are checked
/// before any voxel is written, so a failed transfer leaves `destination`
/// untouched.
pub fn transfer_volume(
    source: &Volume,
    destination: &mut Volume,
    time_step: usize,
) -> Result<(), TransferError> {
    if source.pixel_type() != destination.pixel_type() {
        return Err(TransferError::PixelTypeMismatch {
            source_type: source.pixel_type(),
            destination_type: destination.pixel_type(),
        });
    }
    if source.dimension() != destination.dimension() {
        return Err(TransferError::DimensionMismatch {
            source_rank: source.dimension().rank(),
            destination_rank: destination.dimension().rank(),
        });
    }

    let access = |source: CoreError| TransferError::Access { time_step, source };
    let target_geometry = destination
        .geometry(time_step)
        .ok_or(CoreError::TimeStepOutOfRange {
            time_step,
            time_steps: destination.time_steps(),
        })
        .map_err(access)?;
    let source_geometry = source
        .geometry(0)
        .ok_or(CoreError::EmptyVolume)
        .map_err(access)?;
    if !geometry_equal(
        source_geometry,
        target_geometry,
        DEFAULT_GEOMETRY_PRECISION,
        false,
    ) {
        return Err(TransferError::GeometryMismatch { time_step });
    }

    destination.set_volume(source, time_step).map_err(access)?;
    trace!(time_step, pixel_type = %source.pixel_type(), "transferred time step");
    Ok(())
}

/// Transfers time step `time_step` of `source` into the same time step of
/// `destination`.
pub fn transfer_time_step(
    source: &Volume,
    destination: &mut Volume,
    time_step: usize,
) -> Result<(), TransferError> {
    let image_3d = source
        .select_time_step(time_step)
        .map_err(|source| TransferError::Access { time_step, source })?;
    transfer_volume(&image_3d, destination, time_step)
}
