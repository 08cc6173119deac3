//! Shared-edge discovery between two triangles.
//!
//! Two triangles share an edge when exactly two of their vertices coincide
//! under the left triangle's tolerance. The match also tells us whether the
//! edge runs the opposite way on the right triangle and whether crossing it
//! flips the sense of "above the surface".

use glam::DVec3;

use crate::triangle::{Side, Triangle};
use crate::vector_math::{angle_between, project_onto_plane, rotate_around};

/// A shared edge seen from the left triangle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Attachment {
    /// Edge of the left triangle.
    pub lhs_side: Side,
    /// The same edge on the right triangle.
    pub rhs_side: Side,
    /// The edge's endpoints appear in opposite order on the two sides.
    pub flips: bool,
    /// Crossing the edge flips a tracked point's normal sense.
    pub inverts_normal: bool,
}

impl Attachment {
    /// Looks for a single shared edge between `lhs` and `rhs`.
    ///
    /// Returns `None` unless exactly two vertex pairs match.
    ///
    /// # Examples
    /// ```
    /// use glam::DVec3;
    /// use pointplane::mesh::Attachment;
    /// use pointplane::triangle::{Side, Triangle};
    /// let lhs = Triangle::new(DVec3::ZERO, DVec3::X, DVec3::new(1.0, 1.0, 0.0))?;
    /// let rhs = Triangle::new(DVec3::ZERO, DVec3::new(1.0, 1.0, 0.0), DVec3::Y)?;
    /// let attachment = Attachment::find(&lhs, &rhs).expect("triangles share the diagonal");
    /// assert_eq!(attachment.lhs_side, Side::Ca);
    /// assert_eq!(attachment.rhs_side, Side::Ab);
    /// assert!(attachment.flips);
    /// # Ok::<(), pointplane::error::PointPlaneError>(())
    /// ```
    #[must_use]
    pub fn find(lhs: &Triangle, rhs: &Triangle) -> Option<Self> {
        let tolerance = lhs.tolerance();
        let lhs_points = lhs.points();
        let rhs_points = rhs.points();
        let matches: Vec<(usize, usize)> = lhs_points
            .iter()
            .enumerate()
            .flat_map(|(lhs_index, lhs_point)| {
                rhs_points
                    .iter()
                    .enumerate()
                    .filter(|(_, rhs_point)| tolerance.vec3_close(*lhs_point, **rhs_point))
                    .map(move |(rhs_index, _)| (lhs_index, rhs_index))
            })
            .collect();
        let [first, second] = matches.as_slice() else {
            return None;
        };
        let lhs_side = side_for(first.0, second.0)?;
        let rhs_side = side_for(first.1, second.1)?;
        let (lhs_start, _) = lhs.side_points(lhs_side).ok()?;
        let (_, rhs_end) = rhs.side_points(rhs_side).ok()?;
        Some(Self {
            lhs_side,
            rhs_side,
            flips: tolerance.vec3_close(lhs_start, rhs_end),
            inverts_normal: inverts_normal(lhs, lhs_side, rhs, rhs_side),
        })
    }
}

fn side_for(first: usize, second: usize) -> Option<Side> {
    match (first.min(second), first.max(second)) {
        (0, 1) => Some(Side::Ab),
        (1, 2) => Some(Side::Bc),
        (0, 2) => Some(Side::Ca),
        _ => None,
    }
}

/// Decides whether the normal sense flips across the shared edge.
///
/// Both opposing vertices are projected onto the plane orthogonal to the
/// edge. The fold angle between them has two signed solutions; the one whose
/// rotation carries the left opposing vector onto the right one is applied to
/// the left normal, which is then compared with the right normal. An
/// undefined fold angle (an opposing vertex projecting onto the edge) reports
/// no inversion.
fn inverts_normal(lhs: &Triangle, lhs_side: Side, rhs: &Triangle, rhs_side: Side) -> bool {
    let (Ok((pivot, edge_end)), Ok(lhs_opposing), Ok(rhs_opposing)) = (
        lhs.side_points(lhs_side),
        lhs.opposing_point(lhs_side),
        rhs.opposing_point(rhs_side),
    ) else {
        return false;
    };
    let Some(axis) = (edge_end - pivot).try_normalize() else {
        return false;
    };
    let lhs_arm = project_onto_plane(lhs_opposing - pivot, axis);
    let rhs_arm = project_onto_plane(rhs_opposing - pivot, axis);
    let Some(fold) = angle_between(lhs_arm, rhs_arm) else {
        return false;
    };
    let alignment = |angle: f64| -> f64 { rotate_around(lhs_arm, axis, angle).dot(rhs_arm) };
    let angle = if alignment(fold) >= alignment(-fold) {
        fold
    } else {
        -fold
    };
    let rotated_normal: DVec3 = rotate_around(lhs.normal(), axis, angle);
    rotated_normal.dot(rhs.normal()) > 0.0
}
