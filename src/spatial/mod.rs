//! Broad-phase index projecting mesh links onto one world axis.
//!
//! Triangles become `[min, max]` intervals along a [`ProjectionLine`];
//! [`SpatialPartitionMap`] keeps those intervals sorted and bucketed so a
//! free-flight segment only has to be tested against the links whose
//! intervals overlap its own.

mod partition;
mod projected;

pub use partition::{sort_entries, Entry, PartitionView, SpatialPartitionMap};
pub use projected::ProjectedSpatialMap;

use glam::DVec3;

use crate::error::{PointPlaneError, Result};
use crate::numeric::Tolerance;
use crate::triangle::Triangle;

/// Closed interval on a projection line.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Interval {
    /// Lower bound.
    pub min: f64,
    /// Upper bound.
    pub max: f64,
}

impl Interval {
    /// The interval spanning both values, whichever order they come in.
    #[must_use]
    pub fn new(first: f64, second: f64) -> Self {
        Self {
            min: first.min(second),
            max: first.max(second),
        }
    }

    /// Whether the two closed intervals share at least one value.
    ///
    /// # Examples
    /// ```
    /// use pointplane::spatial::Interval;
    /// assert!(Interval::new(0.0, 0.25).overlaps(&Interval::new(0.25, 0.5)));
    /// assert!(!Interval::new(0.0, 0.25).overlaps(&Interval::new(0.3, 0.5)));
    /// ```
    #[must_use]
    pub fn overlaps(&self, other: &Self) -> bool {
        self.min <= other.max && other.min <= self.max
    }

    /// Whether `value` lies within the interval.
    #[must_use]
    pub fn contains(&self, value: f64) -> bool {
        self.min <= value && value <= self.max
    }
}

/// World axis a projection line can follow.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Axis {
    /// The x axis.
    X,
    /// The y axis.
    Y,
    /// The z axis.
    Z,
}

impl Axis {
    /// Unit vector along the axis.
    #[must_use]
    pub const fn unit(self) -> DVec3 {
        match self {
            Self::X => DVec3::X,
            Self::Y => DVec3::Y,
            Self::Z => DVec3::Z,
        }
    }
}

/// Directed line that maps world points to signed distances.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ProjectionLine {
    origin: DVec3,
    direction: DVec3,
}

impl Default for ProjectionLine {
    fn default() -> Self {
        Self::along_axis(Axis::X)
    }
}

impl ProjectionLine {
    /// Line through `a` towards `b`.
    ///
    /// # Errors
    /// Returns [`PointPlaneError::DegenerateProjectionLine`] when the points
    /// coincide under the default tolerance or are not finite.
    pub fn new(a: DVec3, b: DVec3) -> Result<Self> {
        if Tolerance::default().vec3_close(a, b) {
            return Err(PointPlaneError::DegenerateProjectionLine);
        }
        let direction = (b - a)
            .try_normalize()
            .ok_or(PointPlaneError::DegenerateProjectionLine)?;
        Ok(Self {
            origin: a,
            direction,
        })
    }

    /// Line through the origin along a world axis.
    #[must_use]
    pub const fn along_axis(axis: Axis) -> Self {
        Self {
            origin: DVec3::ZERO,
            direction: axis.unit(),
        }
    }

    /// Line along whichever world axis the triangles' vertices spread
    /// furthest on; the x axis when there are no triangles.
    #[must_use]
    pub fn spanning<'a>(triangles: impl IntoIterator<Item = &'a Triangle>) -> Self {
        let bounds = triangles
            .into_iter()
            .flat_map(Triangle::points)
            .fold(None, |bounds: Option<(DVec3, DVec3)>, point| {
                Some(bounds.map_or((point, point), |(low, high)| {
                    (low.min(point), high.max(point))
                }))
            });
        let Some((low, high)) = bounds else {
            return Self::default();
        };
        let extent = high - low;
        let axis = if extent.x >= extent.y && extent.x >= extent.z {
            Axis::X
        } else if extent.y >= extent.z {
            Axis::Y
        } else {
            Axis::Z
        };
        Self::along_axis(axis)
    }

    /// Unit direction of the line.
    #[must_use]
    pub const fn direction(&self) -> DVec3 {
        self.direction
    }

    /// Signed distance of `point`'s projection from the line's origin.
    #[must_use]
    pub fn point_for(&self, point: DVec3) -> f64 {
        (point - self.origin).dot(self.direction)
    }

    /// Interval covered by the segment between two points.
    #[must_use]
    pub fn interval_for(&self, a: DVec3, b: DVec3) -> Interval {
        Interval::new(self.point_for(a), self.point_for(b))
    }

    /// Interval covered by a triangle's three vertices.
    #[must_use]
    pub fn interval_for_triangle(&self, triangle: &Triangle) -> Interval {
        let [a, b, c] = triangle.points().map(|point| self.point_for(point));
        Interval {
            min: a.min(b).min(c),
            max: a.max(b).max(c),
        }
    }
}
