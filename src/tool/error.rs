use crate::filters::FilterError;
use crate::model::{CoreError, PixelType};
use crate::storage::StorageError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ToolError>;

/// Failures while moving preview voxels into the result segmentation.
///
/// Every variant is fatal for the commit in progress.
#[derive(Debug, Error)]
pub enum TransferError {
    #[error(
        "cannot transfer images, source and destination pixel types differ (source: {source_type}; destination: {destination_type})"
    )]
    PixelTypeMismatch {
        source_type: PixelType,
        destination_type: PixelType,
    },

    #[error("cannot transfer images, source and destination geometries differ at time step {time_step}")]
    GeometryMismatch { time_step: usize },

    #[error("cannot transfer images, source is {source_rank}-D but destination is {destination_rank}-D")]
    DimensionMismatch {
        source_rank: usize,
        destination_rank: usize,
    },

    #[error(
        "internal tool state is invalid: preview has {preview} time steps but the result segmentation has {result}"
    )]
    TimeStepCountMismatch { preview: usize, result: usize },

    #[error("error accessing time step {time_step} of the source image, cannot create segmentation: {source}")]
    Access {
        time_step: usize,
        source: CoreError,
    },

    #[error("cropping or padding the result segmentation failed: {0}")]
    Resample(#[from] FilterError),

    #[error("result segmentation node error: {0}")]
    Storage(#[from] StorageError),

    #[error("tool is in an invalid state: {0}")]
    InvalidState(String),
}

#[derive(Debug, Error)]
pub enum ToolError {
    /// Recoverable failure of the per-voxel preview computation.
    #[error("algorithm failure: {0}")]
    Algorithm(String),

    #[error("tool is in an invalid state: {0}")]
    InvalidState(String),

    #[error("no tool registered with id {0}")]
    UnknownTool(usize),

    #[error("tool `{0}` cannot handle the selected reference and working data")]
    CannotHandle(String),

    #[error("transfer failure: {0}")]
    Transfer(#[from] TransferError),

    #[error("core volume error: {0}")]
    Core(#[from] CoreError),

    #[error("filter error: {0}")]
    Filter(#[from] FilterError),

    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}
