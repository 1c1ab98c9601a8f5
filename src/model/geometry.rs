use serde::{Deserialize, Serialize};

use super::{CoreError, Result};

/// Tolerance used when two geometries must match before voxels are copied
/// between them.
pub const DEFAULT_GEOMETRY_PRECISION: f64 = 1e-6;

const IDENTITY: [[f64; 3]; 3] = [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]];

/// Spatial geometry of one time step.
///
/// `extent` is given in index order and matches the frame shape; 2-D frames
/// use an extent of `[rows, columns, 1]`. Each row of `direction` is the unit
/// world vector of one index axis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Geometry {
    pub origin: [f64; 3],
    pub spacing: [f64; 3],
    #[serde(default = "identity_direction")]
    pub direction: [[f64; 3]; 3],
    pub extent: [usize; 3],
}

fn identity_direction() -> [[f64; 3]; 3] {
    IDENTITY
}

impl Geometry {
    pub fn new(extent: [usize; 3]) -> Self {
        Self {
            origin: [0.0; 3],
            spacing: [1.0; 3],
            direction: IDENTITY,
            extent,
        }
    }

    pub fn with_origin(mut self, origin: [f64; 3]) -> Self {
        self.origin = origin;
        self
    }

    pub fn with_spacing(mut self, spacing: [f64; 3]) -> Self {
        self.spacing = spacing;
        self
    }

    pub fn with_direction(mut self, direction: [[f64; 3]; 3]) -> Self {
        self.direction = direction;
        self
    }

    pub fn voxel_count(&self) -> usize {
        self.extent.iter().product()
    }

    pub fn validate(&self) -> Result<()> {
        if let Some(axis) = self.extent.iter().position(|size| *size == 0) {
            return Err(CoreError::InvalidGeometry(format!(
                "extent is zero along axis {axis}"
            )));
        }
        if let Some(axis) = self
            .spacing
            .iter()
            .position(|spacing| !spacing.is_finite() || *spacing <= 0.0)
        {
            return Err(CoreError::InvalidGeometry(format!(
                "spacing along axis {axis} must be positive and finite"
            )));
        }
        Ok(())
    }

    pub fn index_to_world(&self, index: [f64; 3]) -> [f64; 3] {
        let mut world = self.origin;
        for (axis, direction) in self.direction.iter().enumerate() {
            let step = index[axis] * self.spacing[axis];
            for (coordinate, component) in world.iter_mut().zip(direction) {
                *coordinate += component * step;
            }
        }
        world
    }

    /// Inverse of [`Geometry::index_to_world`] for orthonormal directions.
    pub fn world_to_index(&self, point: [f64; 3]) -> [f64; 3] {
        let relative = [
            point[0] - self.origin[0],
            point[1] - self.origin[1],
            point[2] - self.origin[2],
        ];
        let mut index = [0.0; 3];
        for (axis, direction) in self.direction.iter().enumerate() {
            let projected: f64 = direction
                .iter()
                .zip(&relative)
                .map(|(component, value)| component * value)
                .sum();
            index[axis] = projected / self.spacing[axis];
        }
        index
    }

    /// Geometry of the sub-region starting at index `offset` with `extent`.
    pub fn cropped(&self, offset: [usize; 3], extent: [usize; 3]) -> Self {
        let origin = self.index_to_world(offset.map(|value| value as f64));
        Self {
            origin,
            spacing: self.spacing,
            direction: self.direction,
            extent,
        }
    }
}

/// Compares two geometries within `precision`.
///
/// Origin and spacing are compared component-wise, extents exactly, and the
/// direction matrix only when `check_orientation` is set.
pub fn geometry_equal(a: &Geometry, b: &Geometry, precision: f64, check_orientation: bool) -> bool {
    let close = |left: f64, right: f64| (left - right).abs() <= precision;

    if a.extent != b.extent {
        return false;
    }
    if !a.origin.iter().zip(&b.origin).all(|(l, r)| close(*l, *r)) {
        return false;
    }
    if !a.spacing.iter().zip(&b.spacing).all(|(l, r)| close(*l, *r)) {
        return false;
    }
    if check_orientation {
        return a
            .direction
            .iter()
            .flatten()
            .zip(b.direction.iter().flatten())
            .all(|(l, r)| close(*l, *r));
    }
    true
}

/// Proportional time geometry: one spatial geometry per time step, steps of
/// equal duration starting at `first_time_point`.
///
/// A geometry with a single time step is static and covers every time point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeGeometry {
    first_time_point: f64,
    step_duration: f64,
    geometries: Vec<Geometry>,
}

impl TimeGeometry {
    pub fn new(geometries: Vec<Geometry>, first_time_point: f64, step_duration: f64) -> Result<Self> {
        if geometries.is_empty() {
            return Err(CoreError::EmptyVolume);
        }
        if !first_time_point.is_finite() {
            return Err(CoreError::InvalidGeometry(
                "first time point must be finite".to_string(),
            ));
        }
        if !step_duration.is_finite() || step_duration <= 0.0 {
            return Err(CoreError::InvalidGeometry(
                "time step duration must be positive and finite".to_string(),
            ));
        }
        for geometry in &geometries {
            geometry.validate()?;
        }
        Ok(Self {
            first_time_point,
            step_duration,
            geometries,
        })
    }

    /// Repeats `geometry` for `time_steps` steps of `step_duration`, starting at 0.
    pub fn proportional(geometry: Geometry, time_steps: usize, step_duration: f64) -> Result<Self> {
        Self::new(vec![geometry; time_steps], 0.0, step_duration)
    }

    pub fn static_geometry(geometry: Geometry) -> Result<Self> {
        Self::new(vec![geometry], 0.0, 1.0)
    }

    pub fn time_steps(&self) -> usize {
        self.geometries.len()
    }

    pub fn is_static(&self) -> bool {
        self.geometries.len() == 1
    }

    pub fn first_time_point(&self) -> f64 {
        self.first_time_point
    }

    pub fn step_duration(&self) -> f64 {
        self.step_duration
    }

    pub fn geometry(&self, time_step: usize) -> Option<&Geometry> {
        self.geometries.get(time_step)
    }

    pub fn geometries(&self) -> &[Geometry] {
        &self.geometries
    }

    /// Maps a time point to a time step index.
    ///
    /// Monotonic in `time_point`. The result may exceed the number of stored
    /// time steps; use [`TimeGeometry::is_valid_time_step`] before indexing.
    pub fn time_point_to_time_step(&self, time_point: f64) -> usize {
        if self.is_static() || !(time_point > self.first_time_point) {
            return 0;
        }
        ((time_point - self.first_time_point) / self.step_duration).floor() as usize
    }

    pub fn time_step_to_time_point(&self, time_step: usize) -> f64 {
        self.first_time_point + time_step as f64 * self.step_duration
    }

    pub fn is_valid_time_step(&self, time_step: usize) -> bool {
        time_step < self.geometries.len()
    }

    pub fn is_valid_time_point(&self, time_point: f64) -> bool {
        self.is_valid_time_step(self.time_point_to_time_step(time_point))
    }

    /// Applies `map` to every spatial geometry, keeping the time axis.
    pub fn map_spatial(&self, map: impl Fn(&Geometry) -> Geometry) -> Self {
        Self {
            first_time_point: self.first_time_point,
            step_duration: self.step_duration,
            geometries: self.geometries.iter().map(map).collect(),
        }
    }

    /// Time geometry holding only `time_step`, keeping its time bounds.
    pub fn single_step(&self, time_step: usize) -> Option<Self> {
        let geometry = self.geometries.get(time_step)?.clone();
        Some(Self {
            first_time_point: self.time_step_to_time_point(time_step),
            step_duration: self.step_duration,
            geometries: vec![geometry],
        })
    }
}
