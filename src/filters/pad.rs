use ndarray::{ArrayD, IxDyn, Slice, Zip};
use tracing::debug;

use crate::model::{
    DEFAULT_GEOMETRY_PRECISION, Geometry, Scalar, TimeGeometry, Volume, with_buffer,
};

use super::{FilterError, Result};

/// Options of [`pad_to_reference`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PadOptions {
    /// Map values inside `[lower, upper]` to 1 and everything else to 0.
    pub binary: bool,
    pub lower: f64,
    pub upper: f64,
    pub pad_value: f64,
}

impl Default for PadOptions {
    fn default() -> Self {
        Self {
            binary: false,
            lower: 1.0,
            upper: 1.0,
            pad_value: 0.0,
        }
    }
}

impl PadOptions {
    pub fn binary(lower: f64, upper: f64) -> Self {
        Self {
            binary: true,
            lower,
            upper,
            pad_value: 0.0,
        }
    }
}

fn placement(input: &Geometry, reference: &Geometry) -> Result<[usize; 3]> {
    let close = |left: f64, right: f64| (left - right).abs() <= DEFAULT_GEOMETRY_PRECISION;
    if !input
        .spacing
        .iter()
        .zip(&reference.spacing)
        .all(|(l, r)| close(*l, *r))
    {
        return Err(FilterError::Misaligned(format!(
            "spacing {:?} differs from reference spacing {:?}",
            input.spacing, reference.spacing
        )));
    }
    if !input
        .direction
        .iter()
        .flatten()
        .zip(reference.direction.iter().flatten())
        .all(|(l, r)| close(*l, *r))
    {
        return Err(FilterError::Misaligned(
            "orientation differs from the reference".to_string(),
        ));
    }

    let continuous = reference.world_to_index(input.origin);
    let mut offset = [0usize; 3];
    for axis in 0..3 {
        let rounded = continuous[axis].round();
        if (continuous[axis] - rounded).abs() > 1e-3 || rounded < 0.0 {
            return Err(FilterError::Misaligned(format!(
                "origin {:?} maps to index {:?} of the reference",
                input.origin, continuous
            )));
        }
        offset[axis] = rounded as usize;
        if offset[axis] + input.extent[axis] > reference.extent[axis] {
            return Err(FilterError::RegionOutOfBounds {
                min: offset,
                max: [
                    offset[0] + input.extent[0],
                    offset[1] + input.extent[1],
                    offset[2] + input.extent[2],
                ],
                extent: reference.extent,
            });
        }
    }
    Ok(offset)
}

fn pad_frame<T: Scalar>(
    frame: &ArrayD<T>,
    offset: [usize; 3],
    reference: &Geometry,
    options: &PadOptions,
) -> ArrayD<T> {
    let shape = &reference.extent[..frame.ndim()];
    let mut output = ArrayD::from_elem(IxDyn(shape), T::from_f64(options.pad_value));
    let mut region = output.slice_each_axis_mut(|axis| {
        let index = axis.axis.index();
        Slice::from(offset[index]..offset[index] + frame.shape()[index])
    });
    if options.binary {
        let (inside, outside) = (T::from_f64(1.0), T::from_f64(0.0));
        Zip::from(&mut region).and(frame).for_each(|target, value| {
            let value = value.to_f64();
            *target = if value >= options.lower && value <= options.upper {
                inside
            } else {
                outside
            };
        });
    } else {
        region.assign(frame);
    }
    output
}

fn pad_frames<T: Scalar>(
    frames: &[ArrayD<T>],
    offsets: &[[usize; 3]],
    references: &[Geometry],
    options: &PadOptions,
) -> Vec<ArrayD<T>> {
    frames
        .iter()
        .zip(offsets)
        .zip(references)
        .map(|((frame, offset), reference)| pad_frame(frame, *offset, reference, options))
        .collect()
}

/// Pads `input` into the grid of `reference`.
///
/// Every time step of `input` is placed at the index its origin maps to in
/// the reference geometry of the same time step (or the only one, for a
/// static reference). The output keeps the pixel type and time axis of
/// `input` and takes the spatial geometry of `reference`.
pub fn pad_to_reference(input: &Volume, reference: &Volume, options: &PadOptions) -> Result<Volume> {
    let mut offsets = Vec::with_capacity(input.time_steps());
    let mut references = Vec::with_capacity(input.time_steps());
    for (time_step, geometry) in input.time_geometry().geometries().iter().enumerate() {
        let target = reference
            .geometry(time_step)
            .or_else(|| reference.geometry(0))
            .ok_or(crate::model::CoreError::EmptyVolume)?;
        offsets.push(placement(geometry, target)?);
        references.push(target.clone());
    }
    debug!(
        offset = ?offsets.first(),
        input_extent = ?input.geometry(0).map(|g| g.extent),
        reference_extent = ?references.first().map(|g| g.extent),
        binary = options.binary,
        "padding volume to reference grid"
    );

    let buffer = with_buffer!(input.buffer(), frames => {
        Scalar::into_buffer(pad_frames(frames, &offsets, &references, options))
    });
    let time_geometry = TimeGeometry::new(
        references,
        input.time_geometry().first_time_point(),
        input.time_geometry().step_duration(),
    )?;
    Ok(Volume::new(buffer, time_geometry)?)
}
