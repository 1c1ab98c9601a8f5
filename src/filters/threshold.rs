use ndarray::{ArrayD, Zip};
use serde::{Deserialize, Serialize};

use crate::model::{CoreError, PixelType, Scalar, Volume, with_buffer, with_pixel_type};

use super::{FilterError, Result};

/// Inclusive `[lower, upper]` intensity window.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThresholdWindow {
    pub lower: f64,
    pub upper: f64,
}

impl ThresholdWindow {
    pub fn new(lower: f64, upper: f64) -> Result<Self> {
        if lower > upper || lower.is_nan() || upper.is_nan() {
            return Err(FilterError::InvalidWindow { lower, upper });
        }
        Ok(Self { lower, upper })
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.lower && value <= self.upper
    }
}

fn threshold_frame<T: Scalar, O: Scalar>(
    frame: &ArrayD<T>,
    window: ThresholdWindow,
    inside: O,
) -> ArrayD<O> {
    Zip::from(frame).par_map_collect(|value| {
        if window.contains(value.to_f64()) {
            inside
        } else {
            O::default()
        }
    })
}

fn threshold_frames<T: Scalar>(
    frames: &[ArrayD<T>],
    time_step: usize,
    window: ThresholdWindow,
    inside: f64,
    output: PixelType,
) -> Result<crate::model::VoxelBuffer> {
    let frame = frames.get(time_step).ok_or(CoreError::TimeStepOutOfRange {
        time_step,
        time_steps: frames.len(),
    })?;
    Ok(with_pixel_type!(output, O => {
        O::into_buffer(vec![threshold_frame(frame, window, O::from_f64(inside))])
    }))
}

/// Binary threshold of one time step of `input`.
///
/// Voxels inside `window` become `inside`, all others zero. The result is a
/// single-time-step volume of `output` pixel type carrying the geometry of
/// `input` at `time_step`.
pub fn binary_threshold(
    input: &Volume,
    time_step: usize,
    window: ThresholdWindow,
    inside: f64,
    output: PixelType,
) -> Result<Volume> {
    let buffer = with_buffer!(input.buffer(), frames => {
        threshold_frames(frames, time_step, window, inside, output)
    })?;
    let time_geometry =
        input
            .time_geometry()
            .single_step(time_step)
            .ok_or(CoreError::TimeStepOutOfRange {
                time_step,
                time_steps: input.time_steps(),
            })?;
    Ok(Volume::new(buffer, time_geometry)?)
}

const OTSU_BINS: usize = 256;

/// Intensity histogram of one frame over its own value range.
struct Histogram {
    counts: [u64; OTSU_BINS],
    min: f64,
    bin_width: f64,
}

impl Histogram {
    fn of_frame<T: Scalar>(frame: &ArrayD<T>) -> Option<Self> {
        let (min, max) = frame
            .iter()
            .map(|value| value.to_f64())
            .filter(|value| value.is_finite())
            .fold(None, |range: Option<(f64, f64)>, value| match range {
                None => Some((value, value)),
                Some((min, max)) => Some((min.min(value), max.max(value))),
            })?;
        let bin_width = ((max - min) / (OTSU_BINS - 1) as f64).max(f64::EPSILON);
        let mut counts = [0_u64; OTSU_BINS];
        for value in frame.iter().map(|value| value.to_f64()) {
            if value.is_finite() {
                let bin = ((value - min) / bin_width).round() as usize;
                counts[bin.min(OTSU_BINS - 1)] += 1;
            }
        }
        Some(Self {
            counts,
            min,
            bin_width,
        })
    }

    /// Bin maximising the between-class variance.
    fn otsu_bin(&self) -> usize {
        let total = self.counts.iter().sum::<u64>() as f64;
        let weighted_total = self
            .counts
            .iter()
            .enumerate()
            .map(|(bin, count)| bin as f64 * *count as f64)
            .sum::<f64>();

        let mut below = 0.0_f64;
        let mut weighted_below = 0.0_f64;
        let mut best = (0usize, -1.0_f64);
        for (bin, count) in self.counts.iter().enumerate() {
            below += *count as f64;
            weighted_below += bin as f64 * *count as f64;
            let above = total - below;
            if below == 0.0 {
                continue;
            }
            if above == 0.0 {
                break;
            }
            let mean_gap = weighted_below / below - (weighted_total - weighted_below) / above;
            let variance = below * above * mean_gap * mean_gap;
            if variance > best.1 {
                best = (bin, variance);
            }
        }
        best.0
    }

    fn intensity(&self, bin: usize) -> f64 {
        self.min + bin as f64 * self.bin_width
    }
}

fn otsu_frames<T: Scalar>(frames: &[ArrayD<T>], time_step: usize) -> Result<f64> {
    let frame = frames.get(time_step).ok_or(CoreError::TimeStepOutOfRange {
        time_step,
        time_steps: frames.len(),
    })?;
    Ok(Histogram::of_frame(frame)
        .map(|histogram| histogram.intensity(histogram.otsu_bin()))
        .unwrap_or_default())
}

/// Otsu threshold over every voxel of one time step, in input intensity units.
///
/// Non-finite voxels are ignored; a frame without finite voxels yields 0.
pub fn otsu_threshold(input: &Volume, time_step: usize) -> Result<f64> {
    with_buffer!(input.buffer(), frames => otsu_frames(frames, time_step))
}
