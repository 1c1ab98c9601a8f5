use std::fmt;

use ndarray::ArrayD;
use serde::{Deserialize, Serialize};

use super::VoxelBuffer;

/// Scalar type of the voxels stored in a [`super::Volume`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PixelType {
    U8,
    I16,
    #[default]
    U16,
    I32,
    F32,
    F64,
}

/// Pixel type of freshly created segmentations and of every label set image.
pub const DEFAULT_SEGMENTATION_PIXEL_TYPE: PixelType = PixelType::U16;

impl PixelType {
    pub const fn name(self) -> &'static str {
        match self {
            Self::U8 => "unsigned char",
            Self::I16 => "short",
            Self::U16 => "unsigned short",
            Self::I32 => "int",
            Self::F32 => "float",
            Self::F64 => "double",
        }
    }

    pub const fn size_in_bytes(self) -> usize {
        match self {
            Self::U8 => 1,
            Self::I16 | Self::U16 => 2,
            Self::I32 | Self::F32 => 4,
            Self::F64 => 8,
        }
    }

    pub const fn is_integer(self) -> bool {
        !matches!(self, Self::F32 | Self::F64)
    }
}

impl fmt::Display for PixelType {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.name())
    }
}

/// Number of spatial axes of every frame in a volume.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SpatialDim {
    Two,
    Three,
}

impl SpatialDim {
    pub const fn rank(self) -> usize {
        match self {
            Self::Two => 2,
            Self::Three => 3,
        }
    }

    pub const fn from_rank(rank: usize) -> Option<Self> {
        match rank {
            2 => Some(Self::Two),
            3 => Some(Self::Three),
            _ => None,
        }
    }
}

/// Element types a volume can be instantiated with.
///
/// Each implementation ties a Rust scalar to its [`PixelType`] tag and to the
/// matching [`VoxelBuffer`] variant, so generic algorithms can be written once
/// and selected by the buffer's variant.
pub trait Scalar: Copy + Default + PartialOrd + Send + Sync + fmt::Debug + 'static {
    const PIXEL_TYPE: PixelType;

    fn to_f64(self) -> f64;

    /// Saturating conversion; NaN maps to zero for integer types.
    fn from_f64(value: f64) -> Self;

    fn frames(buffer: &VoxelBuffer) -> Option<&Vec<ArrayD<Self>>>;

    fn frames_mut(buffer: &mut VoxelBuffer) -> Option<&mut Vec<ArrayD<Self>>>;

    fn into_buffer(frames: Vec<ArrayD<Self>>) -> VoxelBuffer;
}

macro_rules! impl_scalar {
    ($ty:ty, $variant:ident) => {
        impl Scalar for $ty {
            const PIXEL_TYPE: PixelType = PixelType::$variant;

            fn to_f64(self) -> f64 {
                self as f64
            }

            fn from_f64(value: f64) -> Self {
                value as $ty
            }

            fn frames(buffer: &VoxelBuffer) -> Option<&Vec<ArrayD<Self>>> {
                match buffer {
                    VoxelBuffer::$variant(frames) => Some(frames),
                    _ => None,
                }
            }

            fn frames_mut(buffer: &mut VoxelBuffer) -> Option<&mut Vec<ArrayD<Self>>> {
                match buffer {
                    VoxelBuffer::$variant(frames) => Some(frames),
                    _ => None,
                }
            }

            fn into_buffer(frames: Vec<ArrayD<Self>>) -> VoxelBuffer {
                VoxelBuffer::$variant(frames)
            }
        }
    };
}

impl_scalar!(u8, U8);
impl_scalar!(i16, I16);
impl_scalar!(u16, U16);
impl_scalar!(i32, I32);
impl_scalar!(f32, F32);
impl_scalar!(f64, F64);

/// Runs `$body` with `$ty` aliased to the Rust scalar of a [`PixelType`].
macro_rules! with_pixel_type {
    ($pixel_type:expr, $ty:ident => $body:expr) => {
        match $pixel_type {
            $crate::model::PixelType::U8 => {
                type $ty = u8;
                $body
            }
            $crate::model::PixelType::I16 => {
                type $ty = i16;
                $body
            }
            $crate::model::PixelType::U16 => {
                type $ty = u16;
                $body
            }
            $crate::model::PixelType::I32 => {
                type $ty = i32;
                $body
            }
            $crate::model::PixelType::F32 => {
                type $ty = f32;
                $body
            }
            $crate::model::PixelType::F64 => {
                type $ty = f64;
                $body
            }
        }
    };
}

pub(crate) use with_pixel_type;
