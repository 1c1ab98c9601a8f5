use ndarray::{ArrayD, Dimension, Slice, Zip};
use serde::{Deserialize, Serialize};

use crate::model::{Scalar, TimeGeometry, Volume, with_buffer};

use super::{FilterError, Result};

/// Half-open index box `[min, max)` in index order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexBox {
    pub min: [usize; 3],
    pub max: [usize; 3],
}

impl IndexBox {
    pub fn new(min: [usize; 3], max: [usize; 3]) -> Self {
        Self { min, max }
    }

    pub fn extent(&self) -> [usize; 3] {
        [
            self.max[0].saturating_sub(self.min[0]),
            self.max[1].saturating_sub(self.min[1]),
            self.max[2].saturating_sub(self.min[2]),
        ]
    }

    fn validate(&self, extent: [usize; 3]) -> Result<()> {
        if self.extent().contains(&0) {
            return Err(FilterError::EmptyRegion);
        }
        if self.max.iter().zip(&extent).any(|(max, size)| max > size) {
            return Err(FilterError::RegionOutOfBounds {
                min: self.min,
                max: self.max,
                extent,
            });
        }
        Ok(())
    }
}

/// Region restricting where segmentation input is drawn from.
#[derive(Debug, Clone, PartialEq)]
pub enum RegionOfInterest {
    Box(IndexBox),
    /// Binary mask laid out like the input; non-zero voxels are inside.
    Mask(Volume),
}

fn crop_frame<T: Clone>(frame: &ArrayD<T>, region: &IndexBox) -> ArrayD<T> {
    frame
        .slice_each_axis(|axis| {
            let index = axis.axis.index();
            Slice::from(region.min[index]..region.max[index])
        })
        .to_owned()
}

fn crop_frames<T: Scalar>(frames: &[ArrayD<T>], region: &IndexBox) -> Vec<ArrayD<T>> {
    frames.iter().map(|frame| crop_frame(frame, region)).collect()
}

fn cropped_time_geometry(volume: &Volume, region: &IndexBox) -> TimeGeometry {
    volume
        .time_geometry()
        .map_spatial(|geometry| geometry.cropped(region.min, region.extent()))
}

/// Crops every time step of `input` to `region`.
pub fn crop(input: &Volume, region: &IndexBox) -> Result<Volume> {
    for geometry in input.time_geometry().geometries() {
        region.validate(geometry.extent)?;
    }
    let buffer = with_buffer!(input.buffer(), frames => {
        Scalar::into_buffer(crop_frames(frames, region))
    });
    Ok(Volume::new(buffer, cropped_time_geometry(input, region))?)
}

fn mask_frame<T: Scalar>(frames: &[ArrayD<T>]) -> Option<ArrayD<bool>> {
    frames
        .first()
        .map(|frame| frame.mapv(|value| value.to_f64() != 0.0))
}

fn bounding_box(mask: &ArrayD<bool>) -> Option<IndexBox> {
    let mut min = [usize::MAX; 3];
    let mut max = [0usize; 3];
    let mut found = false;
    for (index, inside) in mask.indexed_iter() {
        if !*inside {
            continue;
        }
        found = true;
        for (axis, position) in index.slice().iter().enumerate() {
            min[axis] = min[axis].min(*position);
            max[axis] = max[axis].max(position + 1);
        }
    }
    if !found {
        return None;
    }
    if mask.ndim() == 2 {
        min[2] = 0;
        max[2] = 1;
    }
    Some(IndexBox { min, max })
}

fn fill_outside<T: Scalar>(frames: &mut [ArrayD<T>], mask: &ArrayD<bool>) {
    for frame in frames.iter_mut() {
        let floor = frame
            .iter()
            .copied()
            .reduce(|low, value| if value < low { value } else { low })
            .unwrap_or_default();
        Zip::from(frame).and(mask).for_each(|value, inside| {
            if !*inside {
                *value = floor;
            }
        });
    }
}

/// Crops `input` to the bounding box of `roi` and, for mask regions, sets
/// every voxel outside the mask to the minimum of its cropped frame.
pub fn mask_and_cut(input: &Volume, roi: &RegionOfInterest) -> Result<Volume> {
    let mask = match roi {
        RegionOfInterest::Box(region) => return crop(input, region),
        RegionOfInterest::Mask(mask) => mask,
    };

    let input_extent = input.geometry(0).map(|g| g.extent).unwrap_or_default();
    let mask_extent = mask.geometry(0).map(|g| g.extent).unwrap_or_default();
    if input_extent != mask_extent || mask.dimension() != input.dimension() {
        return Err(FilterError::MaskExtentMismatch {
            mask: mask_extent,
            input: input_extent,
        });
    }

    let inside = with_buffer!(mask.buffer(), frames => mask_frame(frames))
        .ok_or(FilterError::EmptyRegion)?;
    let region = bounding_box(&inside).ok_or(FilterError::EmptyRegion)?;
    let inside = crop_frame(&inside, &region);

    let mut cropped = crop(input, &region)?;
    with_buffer!(cropped.buffer_mut(), frames => fill_outside(frames, &inside));
    Ok(cropped)
}
