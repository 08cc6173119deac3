//! Triangle geometry in world space and in the triangle's own plane.
//!
//! Every [`Triangle`] carries an orthonormal frame. `basis_i` runs from `a`
//! towards `b` and `basis_j` completes a right-handed frame with the normal,
//! so local coordinates put `a` at the origin, `b` on the positive x axis and
//! `c` above the x axis. Containment tests are tolerant: points within the
//! triangle's [`Tolerance`] of an edge count as inside.

use std::fmt;

use glam::{DVec2, DVec3};

use crate::constants::{CROSSING_REFINEMENT_STEPS, LIMIT_BACKOFF};
use crate::error::{PointPlaneError, Result};
use crate::numeric::Tolerance;

/// Names one edge of a triangle, or its interior.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Side {
    /// Edge from point `a` to point `b`.
    Ab,
    /// Edge from point `b` to point `c`.
    Bc,
    /// Edge from point `c` to point `a`.
    Ca,
    /// Sentinel for "no edge"; rejected wherever an edge is required.
    Inside,
}

impl Side {
    /// The three concrete edges in winding order.
    pub const EDGES: [Self; 3] = [Self::Ab, Self::Bc, Self::Ca];

    /// Whether this names a concrete edge.
    #[must_use]
    pub const fn is_edge(self) -> bool {
        !matches!(self, Self::Inside)
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Ab => "ab",
            Self::Bc => "bc",
            Self::Ca => "ca",
            Self::Inside => "inside",
        };
        f.write_str(name)
    }
}

/// Where a local segment leaves a triangle.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SideCrossing {
    /// Edge the segment exits through.
    pub side: Side,
    /// Last contained point before the exit.
    pub inside: DVec2,
    /// First point past the exit; never contained.
    pub outside: DVec2,
}

/// How a triangle limits a free-flight segment.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LimitIntersection {
    /// Furthest point along the segment that stays clear of the triangle.
    pub limit: DVec3,
    /// Local coordinate where the segment meets the triangle.
    pub intersection: DVec2,
}

/// A non-degenerate triangle with its local frame cached.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Triangle {
    a: DVec3,
    b: DVec3,
    c: DVec3,
    normal: DVec3,
    basis_i: DVec3,
    basis_j: DVec3,
    tolerance: Tolerance,
}

impl Triangle {
    /// Build a triangle using the default tolerance.
    ///
    /// # Errors
    /// Returns [`PointPlaneError::NonFinitePoint`] when a vertex is not
    /// finite and [`PointPlaneError::CollinearPoints`] when the vertices do
    /// not span a plane.
    ///
    /// # Examples
    /// ```
    /// use glam::DVec3;
    /// use pointplane::triangle::Triangle;
    /// let triangle = Triangle::new(DVec3::ZERO, DVec3::X, DVec3::Y)?;
    /// assert_eq!(triangle.normal(), DVec3::Z);
    /// # Ok::<(), pointplane::error::PointPlaneError>(())
    /// ```
    pub fn new(a: DVec3, b: DVec3, c: DVec3) -> Result<Self> {
        Self::with_tolerance(a, b, c, Tolerance::default())
    }

    /// Build a triangle that compares points using `tolerance`.
    ///
    /// # Errors
    /// Same as [`Triangle::new`].
    pub fn with_tolerance(a: DVec3, b: DVec3, c: DVec3, tolerance: Tolerance) -> Result<Self> {
        if !(a.is_finite() && b.is_finite() && c.is_finite()) {
            return Err(PointPlaneError::NonFinitePoint);
        }
        if tolerance.vec3_close(a, b) || tolerance.vec3_close(b, c) || tolerance.vec3_close(c, a)
        {
            return Err(PointPlaneError::CollinearPoints);
        }
        let cross = (b - a).cross(c - a);
        if cross.length() <= tolerance.epsilon() * tolerance.epsilon() {
            return Err(PointPlaneError::CollinearPoints);
        }
        let normal = cross
            .try_normalize()
            .ok_or(PointPlaneError::CollinearPoints)?;
        Ok(Self::assemble(a, b, c, normal, tolerance))
    }

    fn assemble(a: DVec3, b: DVec3, c: DVec3, normal: DVec3, tolerance: Tolerance) -> Self {
        let edge = b - a;
        let basis_i = edge / edge.length();
        let basis_j = normal.cross(basis_i);
        Self {
            a,
            b,
            c,
            normal,
            basis_i,
            basis_j,
            tolerance,
        }
    }

    /// First vertex.
    #[must_use]
    pub const fn point_a(&self) -> DVec3 {
        self.a
    }

    /// Second vertex.
    #[must_use]
    pub const fn point_b(&self) -> DVec3 {
        self.b
    }

    /// Third vertex.
    #[must_use]
    pub const fn point_c(&self) -> DVec3 {
        self.c
    }

    /// All three vertices in winding order.
    #[must_use]
    pub const fn points(&self) -> [DVec3; 3] {
        [self.a, self.b, self.c]
    }

    /// Unit normal, `(b - a) × (c - a)` normalised.
    #[must_use]
    pub const fn normal(&self) -> DVec3 {
        self.normal
    }

    /// Local x axis in world space.
    #[must_use]
    pub const fn basis_i(&self) -> DVec3 {
        self.basis_i
    }

    /// Local y axis in world space.
    #[must_use]
    pub const fn basis_j(&self) -> DVec3 {
        self.basis_j
    }

    /// Tolerance used by this triangle's comparisons.
    #[must_use]
    pub const fn tolerance(&self) -> Tolerance {
        self.tolerance
    }

    /// Vertices expressed in local coordinates.
    #[must_use]
    pub fn points_in_2d(&self) -> [DVec2; 3] {
        [
            DVec2::ZERO,
            self.closest_point(self.b),
            self.closest_point(self.c),
        ]
    }

    /// World-space endpoints of `side`, in the order the side names them.
    ///
    /// # Errors
    /// Returns [`PointPlaneError::InsideSide`] for [`Side::Inside`].
    pub fn side_points(&self, side: Side) -> Result<(DVec3, DVec3)> {
        match side {
            Side::Ab => Ok((self.a, self.b)),
            Side::Bc => Ok((self.b, self.c)),
            Side::Ca => Ok((self.c, self.a)),
            Side::Inside => Err(PointPlaneError::InsideSide {
                operation: "side_points",
            }),
        }
    }

    /// Local endpoints of `side`.
    ///
    /// # Errors
    /// Returns [`PointPlaneError::InsideSide`] for [`Side::Inside`].
    pub fn side_points_in_2d(&self, side: Side) -> Result<(DVec2, DVec2)> {
        let (start, end) = self.side_points(side)?;
        Ok((self.closest_point(start), self.closest_point(end)))
    }

    /// The vertex that does not belong to `side`.
    ///
    /// # Errors
    /// Returns [`PointPlaneError::InsideSide`] for [`Side::Inside`].
    pub fn opposing_point(&self, side: Side) -> Result<DVec3> {
        match side {
            Side::Ab => Ok(self.c),
            Side::Bc => Ok(self.a),
            Side::Ca => Ok(self.b),
            Side::Inside => Err(PointPlaneError::InsideSide {
                operation: "opposing_point",
            }),
        }
    }

    /// Maps a local coordinate onto the triangle's (infinite) plane.
    #[must_use]
    pub fn point_at(&self, local: DVec2) -> DVec3 {
        self.a + self.world_displacement(local)
    }

    /// Projects a world point onto the plane and returns its local coordinate.
    #[must_use]
    pub fn closest_point(&self, point: DVec3) -> DVec2 {
        self.local_displacement(point - self.a)
    }

    /// Expresses a world displacement in the local frame, dropping the
    /// component along the normal.
    #[must_use]
    pub fn local_displacement(&self, displacement: DVec3) -> DVec2 {
        DVec2::new(displacement.dot(self.basis_i), displacement.dot(self.basis_j))
    }

    /// Expresses a local displacement in world space.
    #[must_use]
    pub fn world_displacement(&self, displacement: DVec2) -> DVec3 {
        self.basis_i * displacement.x + self.basis_j * displacement.y
    }

    /// Whether a local point lies within the triangle, edges included.
    #[must_use]
    pub fn contains_point(&self, local: DVec2) -> bool {
        Side::EDGES
            .iter()
            .filter_map(|side| self.edge_2d(*side))
            .all(|(start, end)| inward_distance(start, end, local) >= -self.tolerance.epsilon())
    }

    /// Which edge a local point lies beyond, or [`Side::Inside`] when contained.
    ///
    /// Points beyond two edges report the one they are furthest past.
    #[must_use]
    pub fn point_region(&self, local: DVec2) -> Side {
        if self.contains_point(local) {
            return Side::Inside;
        }
        Side::EDGES
            .iter()
            .filter_map(|side| {
                self.edge_2d(*side)
                    .map(|(start, end)| (*side, inward_distance(start, end, local)))
            })
            .min_by(|lhs, rhs| lhs.1.total_cmp(&rhs.1))
            .map_or(Side::Inside, |(side, _)| side)
    }

    /// Nearest point of the closed triangle to a world point, in local
    /// coordinates.
    #[must_use]
    pub fn closest_contained_point(&self, point: DVec3) -> DVec2 {
        self.clamp_local(self.closest_point(point))
    }

    fn clamp_local(&self, local: DVec2) -> DVec2 {
        if self.contains_point(local) {
            return local;
        }
        Side::EDGES
            .iter()
            .filter_map(|side| self.edge_2d(*side))
            .map(|(start, end)| closest_on_segment(start, end, local))
            .min_by(|lhs, rhs| {
                lhs.distance_squared(local)
                    .total_cmp(&rhs.distance_squared(local))
            })
            .unwrap_or(local)
    }

    /// Finds where the local segment `from -> to` leaves the triangle.
    ///
    /// Returns `None` when `to` is contained. A `from` outside the triangle
    /// is first clamped onto it.
    #[must_use]
    pub fn check_for_side_crossing(&self, from: DVec2, to: DVec2) -> Option<SideCrossing> {
        if self.contains_point(to) {
            return None;
        }
        let mut inside = self.clamp_local(from);
        let mut outside = to;
        for _ in 0..CROSSING_REFINEMENT_STEPS {
            let midpoint = inside.lerp(outside, 0.5);
            if self.contains_point(midpoint) {
                inside = midpoint;
            } else {
                outside = midpoint;
            }
        }
        Some(SideCrossing {
            side: self.point_region(outside),
            inside,
            outside,
        })
    }

    /// Local coordinate where the world segment `from -> to` passes through
    /// the triangle, if it does.
    ///
    /// Segments starting exactly on the plane do not intersect it.
    #[must_use]
    pub fn intersection(&self, from: DVec3, to: DVec3) -> Option<DVec2> {
        self.plane_crossing(from, to).map(|(_, local)| local)
    }

    /// Limits the world segment `from -> to` by this triangle.
    ///
    /// The limit sits a hair before the plane on the side of `from`, so a
    /// body parked there does not already touch the triangle.
    #[must_use]
    pub fn limit_with_intersection(&self, from: DVec3, to: DVec3) -> Option<LimitIntersection> {
        self.plane_crossing(from, to)
            .map(|(fraction, intersection)| LimitIntersection {
                limit: from.lerp(to, fraction * (1.0 - LIMIT_BACKOFF)),
                intersection,
            })
    }

    fn plane_crossing(&self, from: DVec3, to: DVec3) -> Option<(f64, DVec2)> {
        let from_height = (from - self.a).dot(self.normal);
        let to_height = (to - self.a).dot(self.normal);
        let crosses = (from_height > 0.0 && to_height <= 0.0)
            || (from_height < 0.0 && to_height >= 0.0);
        if !crosses {
            return None;
        }
        let fraction = from_height / (from_height - to_height);
        let local = self.closest_point(from.lerp(to, fraction));
        self.contains_point(local).then_some((fraction, local))
    }

    /// The same triangle wound the other way, so its normal is reversed.
    #[must_use]
    pub fn flip(&self) -> Self {
        Self::assemble(self.a, self.c, self.b, -self.normal, self.tolerance)
    }

    /// The same triangle moved by `offset`.
    #[must_use]
    pub fn translate(&self, offset: DVec3) -> Self {
        Self::assemble(
            self.a + offset,
            self.b + offset,
            self.c + offset,
            self.normal,
            self.tolerance,
        )
    }

    /// Centroid.
    #[must_use]
    pub fn center(&self) -> DVec3 {
        (self.a + self.b + self.c) / 3.0
    }

    /// Surface area.
    #[must_use]
    pub fn area(&self) -> f64 {
        (self.b - self.a).cross(self.c - self.a).length() * 0.5
    }

    fn edge_2d(&self, side: Side) -> Option<(DVec2, DVec2)> {
        self.side_points_in_2d(side).ok()
    }
}

/// Signed distance of `point` from the edge, positive towards the interior.
fn inward_distance(start: DVec2, end: DVec2, point: DVec2) -> f64 {
    let edge = end - start;
    edge.perp_dot(point - start) / edge.length()
}

fn closest_on_segment(start: DVec2, end: DVec2, point: DVec2) -> DVec2 {
    let edge = end - start;
    let fraction = ((point - start).dot(edge) / edge.length_squared()).clamp(0.0, 1.0);
    start + edge * fraction
}
