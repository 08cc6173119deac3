//! Vector helpers for projections and rotations.
//! Small free functions shared by the triangle and adjacency code.
use glam::DVec3;

/// Projects `vector` onto `axis`.
///
/// Returns the zero vector when `axis` has no length.
///
/// # Examples
/// ```
/// use glam::DVec3;
/// use pointplane::vector_math::project_onto;
/// let projected = project_onto(DVec3::new(3.0, 4.0, 0.0), DVec3::new(2.0, 0.0, 0.0));
/// assert_eq!(projected, DVec3::new(3.0, 0.0, 0.0));
/// ```
#[must_use]
pub fn project_onto(vector: DVec3, axis: DVec3) -> DVec3 {
    let length_squared = axis.length_squared();
    if length_squared == 0.0 {
        return DVec3::ZERO;
    }
    axis * (vector.dot(axis) / length_squared)
}

/// Removes the component of `vector` along `normal`.
///
/// # Examples
/// ```
/// use glam::DVec3;
/// use pointplane::vector_math::project_onto_plane;
/// let flat = project_onto_plane(DVec3::new(1.0, 2.0, 3.0), DVec3::Z);
/// assert_eq!(flat, DVec3::new(1.0, 2.0, 0.0));
/// ```
#[must_use]
pub fn project_onto_plane(vector: DVec3, normal: DVec3) -> DVec3 {
    vector - project_onto(vector, normal)
}

/// Unsigned angle between two vectors in radians.
///
/// Returns `None` when either vector has no length or is not finite.
#[must_use]
pub fn angle_between(lhs: DVec3, rhs: DVec3) -> Option<f64> {
    let lhs_unit = lhs.try_normalize()?;
    let rhs_unit = rhs.try_normalize()?;
    Some(lhs_unit.cross(rhs_unit).length().atan2(lhs_unit.dot(rhs_unit)))
}

/// Rotates `vector` by `angle` radians around `unit_axis`.
///
/// Uses Rodrigues' rotation formula; `unit_axis` must be normalised.
///
/// # Examples
/// ```
/// use glam::DVec3;
/// use pointplane::vector_math::rotate_around;
/// let rotated = rotate_around(DVec3::X, DVec3::Z, std::f64::consts::FRAC_PI_2);
/// assert!((rotated - DVec3::Y).length() < 1e-12);
/// ```
#[must_use]
pub fn rotate_around(vector: DVec3, unit_axis: DVec3, angle: f64) -> DVec3 {
    let (sin, cos) = angle.sin_cos();
    vector * cos + unit_axis.cross(vector) * sin + unit_axis * unit_axis.dot(vector) * (1.0 - cos)
}

/// Closest point to `point` on the infinite line through `start` and `end`.
///
/// Degenerate lines collapse to `start`.
#[must_use]
pub fn closest_point_on_line(start: DVec3, end: DVec3, point: DVec3) -> DVec3 {
    start + project_onto(point - start, end - start)
}
