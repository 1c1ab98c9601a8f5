use ndarray::ArrayD;
use rayon::prelude::*;

use crate::model::{CoreError, Scalar, Volume, with_buffer};

use super::Result;

fn frame_at<T: Scalar>(frames: &[ArrayD<T>], time_step: usize) -> Result<&ArrayD<T>> {
    frames.get(time_step).ok_or_else(|| {
        CoreError::TimeStepOutOfRange {
            time_step,
            time_steps: frames.len(),
        }
        .into()
    })
}

fn in_range<T: Scalar>(value: T, lower: f64, upper: f64) -> bool {
    let value = value.to_f64();
    value >= lower && value <= upper
}

/// Smallest and largest voxel value of one time step.
pub fn min_max(volume: &Volume, time_step: usize) -> Result<(f64, f64)> {
    with_buffer!(volume.buffer(), frames => {
        let frame = frame_at(frames, time_step)?;
        let mut iter = frame.iter().map(|value| value.to_f64());
        let first = iter.next().unwrap_or(0.0);
        Ok(iter.fold((first, first), |(min, max), value| (min.min(value), max.max(value))))
    })
}

/// Number of voxels of one time step whose value lies in `[lower, upper]`.
pub fn count_in_range(volume: &Volume, time_step: usize, lower: f64, upper: f64) -> Result<usize> {
    with_buffer!(volume.buffer(), frames => {
        let frame = frame_at(frames, time_step)?;
        let inside = |value: &&_| in_range(**value, lower, upper);
        Ok(match frame.as_slice_memory_order() {
            Some(values) => values.par_iter().filter(inside).count(),
            None => frame.iter().filter(inside).count(),
        })
    })
}
