use ndarray::{ArrayD, ArrayViewD, ArrayViewMutD, IxDyn};

use super::pixel::with_pixel_type;
use super::{CoreError, Geometry, PixelType, Result, Scalar, SpatialDim, TimeGeometry};

/// Voxel frames of a volume, one array per time step, tagged by scalar type.
#[derive(Debug, Clone, PartialEq)]
pub enum VoxelBuffer {
    U8(Vec<ArrayD<u8>>),
    I16(Vec<ArrayD<i16>>),
    U16(Vec<ArrayD<u16>>),
    I32(Vec<ArrayD<i32>>),
    F32(Vec<ArrayD<f32>>),
    F64(Vec<ArrayD<f64>>),
}

/// Runs `$body` with `$frames` bound to the typed frame vector of a buffer.
///
/// The body is instantiated once per scalar type, so it can call generic
/// functions over [`Scalar`].
macro_rules! with_buffer {
    ($buffer:expr, $frames:ident => $body:expr) => {
        match $buffer {
            $crate::model::VoxelBuffer::U8($frames) => $body,
            $crate::model::VoxelBuffer::I16($frames) => $body,
            $crate::model::VoxelBuffer::U16($frames) => $body,
            $crate::model::VoxelBuffer::I32($frames) => $body,
            $crate::model::VoxelBuffer::F32($frames) => $body,
            $crate::model::VoxelBuffer::F64($frames) => $body,
        }
    };
}

pub(crate) use with_buffer;

impl VoxelBuffer {
    pub fn pixel_type(&self) -> PixelType {
        match self {
            Self::U8(_) => PixelType::U8,
            Self::I16(_) => PixelType::I16,
            Self::U16(_) => PixelType::U16,
            Self::I32(_) => PixelType::I32,
            Self::F32(_) => PixelType::F32,
            Self::F64(_) => PixelType::F64,
        }
    }

    pub fn len(&self) -> usize {
        with_buffer!(self, frames => frames.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn frame_shape(&self, time_step: usize) -> Option<Vec<usize>> {
        with_buffer!(self, frames => frames.get(time_step).map(|frame| frame.shape().to_vec()))
    }

    fn zeros(pixel_type: PixelType, time_steps: usize, shape: &[usize]) -> Self {
        with_pixel_type!(pixel_type, T => T::into_buffer(
            (0..time_steps)
                .map(|_| ArrayD::<T>::default(IxDyn(shape)))
                .collect(),
        ))
    }
}

/// Time-resolved voxel container.
///
/// The pixel type and spatial dimensionality are fixed by the buffer variant
/// at construction; every time step shares them.
#[derive(Debug, Clone, PartialEq)]
pub struct Volume {
    buffer: VoxelBuffer,
    dimension: SpatialDim,
    time_geometry: TimeGeometry,
}

fn single_frame<T: Scalar>(frames: &[ArrayD<T>], time_step: usize) -> VoxelBuffer {
    T::into_buffer(vec![frames[time_step].clone()])
}

fn replace_frame<T: Scalar>(
    frames: &mut [ArrayD<T>],
    source: &VoxelBuffer,
    time_step: usize,
) -> Result<()> {
    let incoming = T::frames(source)
        .and_then(|incoming| incoming.first())
        .ok_or(CoreError::EmptyVolume)?;
    debug_assert_eq!(frames[time_step].shape(), incoming.shape());
    frames[time_step] = incoming.clone();
    Ok(())
}

fn frame_shape_for(geometry: &Geometry, dimension: SpatialDim) -> Vec<usize> {
    geometry.extent[..dimension.rank()].to_vec()
}

impl Volume {
    pub fn new(buffer: VoxelBuffer, time_geometry: TimeGeometry) -> Result<Self> {
        if buffer.is_empty() {
            return Err(CoreError::EmptyVolume);
        }
        if buffer.len() != time_geometry.time_steps() {
            return Err(CoreError::TimeStepCountMismatch {
                frames: buffer.len(),
                time_steps: time_geometry.time_steps(),
            });
        }

        let first_rank = buffer.frame_shape(0).map(|shape| shape.len()).unwrap_or(0);
        let dimension = SpatialDim::from_rank(first_rank).ok_or(CoreError::UnsupportedRank {
            time_step: 0,
            rank: first_rank,
        })?;

        for (time_step, geometry) in time_geometry.geometries().iter().enumerate() {
            let actual = buffer.frame_shape(time_step).unwrap_or_default();
            if actual.len() != dimension.rank() {
                return Err(CoreError::DimensionalityMismatch {
                    time_step,
                    rank: actual.len(),
                    expected: dimension.rank(),
                });
            }
            let expected = frame_shape_for(geometry, dimension);
            let flat = dimension == SpatialDim::Three || geometry.extent[2] == 1;
            if actual != expected || !flat {
                return Err(CoreError::ShapeMismatch {
                    time_step,
                    expected: geometry.extent[..].to_vec(),
                    actual,
                });
            }
        }

        Ok(Self {
            buffer,
            dimension,
            time_geometry,
        })
    }

    pub fn from_frames<T: Scalar>(frames: Vec<ArrayD<T>>, time_geometry: TimeGeometry) -> Result<Self> {
        Self::new(T::into_buffer(frames), time_geometry)
    }

    /// Allocates a zero-filled volume laid out like `time_geometry`.
    pub fn zeros(
        pixel_type: PixelType,
        dimension: SpatialDim,
        time_geometry: TimeGeometry,
    ) -> Result<Self> {
        let shape = time_geometry
            .geometry(0)
            .map(|geometry| frame_shape_for(geometry, dimension))
            .ok_or(CoreError::EmptyVolume)?;
        let buffer = VoxelBuffer::zeros(pixel_type, time_geometry.time_steps(), &shape);
        Self::new(buffer, time_geometry)
    }

    /// Zero-filled volume sharing pixel type, dimensionality and geometry with `self`.
    pub fn zeros_like(&self) -> Self {
        let shape = self.shape();
        Self {
            buffer: VoxelBuffer::zeros(self.pixel_type(), self.time_steps(), &shape),
            dimension: self.dimension,
            time_geometry: self.time_geometry.clone(),
        }
    }

    pub fn pixel_type(&self) -> PixelType {
        self.buffer.pixel_type()
    }

    pub fn dimension(&self) -> SpatialDim {
        self.dimension
    }

    pub fn time_steps(&self) -> usize {
        self.time_geometry.time_steps()
    }

    pub fn time_geometry(&self) -> &TimeGeometry {
        &self.time_geometry
    }

    pub fn geometry(&self, time_step: usize) -> Option<&Geometry> {
        self.time_geometry.geometry(time_step)
    }

    /// Frame shape of the first time step.
    pub fn shape(&self) -> Vec<usize> {
        self.buffer.frame_shape(0).unwrap_or_default()
    }

    pub fn voxel_count(&self) -> usize {
        self.shape().iter().product()
    }

    pub fn buffer(&self) -> &VoxelBuffer {
        &self.buffer
    }

    pub fn frames<T: Scalar>(&self) -> Option<&[ArrayD<T>]> {
        T::frames(&self.buffer).map(Vec::as_slice)
    }

    pub fn frame<T: Scalar>(&self, time_step: usize) -> Option<ArrayViewD<'_, T>> {
        T::frames(&self.buffer)?.get(time_step).map(|frame| frame.view())
    }

    pub fn frame_mut<T: Scalar>(&mut self, time_step: usize) -> Option<ArrayViewMutD<'_, T>> {
        T::frames_mut(&mut self.buffer)?
            .get_mut(time_step)
            .map(|frame| frame.view_mut())
    }

    fn check_time_step(&self, time_step: usize) -> Result<()> {
        if self.time_geometry.is_valid_time_step(time_step) {
            Ok(())
        } else {
            Err(CoreError::TimeStepOutOfRange {
                time_step,
                time_steps: self.time_steps(),
            })
        }
    }

    /// Copies out the single-time-step volume at `time_step`.
    pub fn select_time_step(&self, time_step: usize) -> Result<Self> {
        self.check_time_step(time_step)?;
        let time_geometry = self
            .time_geometry
            .single_step(time_step)
            .ok_or(CoreError::TimeStepOutOfRange {
                time_step,
                time_steps: self.time_steps(),
            })?;
        let buffer = with_buffer!(&self.buffer, frames => single_frame(frames, time_step));
        Ok(Self {
            buffer,
            dimension: self.dimension,
            time_geometry,
        })
    }

    /// Single-time-step volume at the step `time_point` maps to.
    pub fn select_time_point(&self, time_point: f64) -> Result<Self> {
        self.select_time_step(self.time_geometry.time_point_to_time_step(time_point))
    }

    /// Replaces the voxels of `time_step` with the first frame of `source`.
    ///
    /// The frame shape of `source` must match this volume's extent at
    /// `time_step`; callers establish that through a geometry check. Only the
    /// pixel type and the time step index are verified here.
    pub fn set_volume(&mut self, source: &Volume, time_step: usize) -> Result<()> {
        self.check_time_step(time_step)?;
        if source.pixel_type() != self.pixel_type() {
            return Err(CoreError::PixelTypeMismatch {
                expected: self.pixel_type(),
                actual: source.pixel_type(),
            });
        }
        with_buffer!(&mut self.buffer, frames => replace_frame(frames, &source.buffer, time_step))
    }

    pub(crate) fn buffer_mut(&mut self) -> &mut VoxelBuffer {
        &mut self.buffer
    }
}
