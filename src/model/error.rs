use thiserror::Error;

use super::{LabelValue, PixelType};

pub type Result<T> = std::result::Result<T, CoreError>;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("volume has no time steps")]
    EmptyVolume,

    #[error("voxel buffer holds {frames} frames but the time geometry has {time_steps} time steps")]
    TimeStepCountMismatch { frames: usize, time_steps: usize },

    #[error("frame {time_step} has rank {rank}; only 2-D and 3-D frames are supported")]
    UnsupportedRank { time_step: usize, rank: usize },

    #[error("frame {time_step} has rank {rank} but the volume is {expected}-D")]
    DimensionalityMismatch {
        time_step: usize,
        rank: usize,
        expected: usize,
    },

    #[error("frame {time_step} has shape {actual:?} but its geometry extent is {expected:?}")]
    ShapeMismatch {
        time_step: usize,
        expected: Vec<usize>,
        actual: Vec<usize>,
    },

    #[error("time step {time_step} is out of range for a volume with {time_steps} time steps")]
    TimeStepOutOfRange { time_step: usize, time_steps: usize },

    #[error("pixel type mismatch: expected {expected}, found {actual}")]
    PixelTypeMismatch {
        expected: PixelType,
        actual: PixelType,
    },

    #[error("invalid geometry: {0}")]
    InvalidGeometry(String),

    #[error("label value {0} already exists in the label set")]
    DuplicateLabel(LabelValue),

    #[error("label value {0} does not exist in the label set")]
    UnknownLabel(LabelValue),

    #[error("label value {0} is the active label and cannot be removed")]
    ActiveLabelRemoval(LabelValue),
}
