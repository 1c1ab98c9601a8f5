use crate::model::CoreError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, FilterError>;

#[derive(Debug, Error)]
pub enum FilterError {
    #[error("invalid threshold window: lower {lower} exceeds upper {upper}")]
    InvalidWindow { lower: f64, upper: f64 },

    #[error("region {min:?}..{max:?} does not fit into extent {extent:?}")]
    RegionOutOfBounds {
        min: [usize; 3],
        max: [usize; 3],
        extent: [usize; 3],
    },

    #[error("region of interest is empty")]
    EmptyRegion,

    #[error("mask extent {mask:?} differs from input extent {input:?}")]
    MaskExtentMismatch { mask: [usize; 3], input: [usize; 3] },

    #[error("input is not aligned with the reference grid: {0}")]
    Misaligned(String),

    #[error("core volume error: {0}")]
    Core(#[from] CoreError),
}
