mod error;
mod geometry;
mod image;
mod labels;
mod pixel;
mod volume;


pub use error::{CoreError, Result};
pub use geometry::{DEFAULT_GEOMETRY_PRECISION, Geometry, TimeGeometry, geometry_equal};
pub use image::ImageData;
pub use labels::{Color, Label, LabelSet, LabelSetImage, LabelValue};
pub use pixel::{DEFAULT_SEGMENTATION_PIXEL_TYPE, PixelType, Scalar, SpatialDim};
pub use volume::{Volume, VoxelBuffer};

pub(crate) use pixel::with_pixel_type;
pub(crate) use volume::with_buffer;
