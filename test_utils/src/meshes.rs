//! Convenience constructors for meshes used in tests.

use glam::DVec3;
use pointplane::{Driver, LinkHandle, MeshArena, RegionId, Triangle};

/// Build a triangle from coordinate arrays.
///
/// # Panics
/// Panics if the points are degenerate.
///
/// # Examples
/// ```
/// use test_utils::meshes::triangle;
/// let t = triangle([0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]);
/// assert_eq!(t.normal(), glam::DVec3::Z);
/// ```
pub fn triangle(a: [f64; 3], b: [f64; 3], c: [f64; 3]) -> Triangle {
    Triangle::new(
        DVec3::from_array(a),
        DVec3::from_array(b),
        DVec3::from_array(c),
    )
    .expect("fixture triangle must be valid")
}

/// A unit square on the z = 0 plane split along its (0,0)-(1,1) diagonal.
#[derive(Clone, Debug)]
pub struct FlatSquare {
    /// Owner of both links.
    pub arena: MeshArena,
    /// Triangle below the diagonal: (0,0), (1,0), (1,1).
    pub lower: LinkHandle,
    /// Triangle above the diagonal: (0,0), (1,1), (0,1).
    pub upper: LinkHandle,
}

impl FlatSquare {
    /// Create the square with both triangles linked to each other.
    ///
    /// # Examples
    /// ```
    /// use pointplane::Side;
    /// use test_utils::meshes::FlatSquare;
    /// let square = FlatSquare::linked();
    /// assert!(square.arena.has_side_attached(square.lower, Side::Ca).unwrap());
    /// ```
    pub fn linked() -> Self {
        let mut square = Self::unlinked();
        square
            .arena
            .attach_unattached_matching_points(square.lower, square.upper);
        square
    }

    /// Create the square without any adjacency.
    pub fn unlinked() -> Self {
        let mut arena = MeshArena::new();
        let region = RegionId(0);
        let lower = arena.insert(
            region,
            triangle([0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [1.0, 1.0, 0.0]),
        );
        let upper = arena.insert(
            region,
            triangle([0.0, 0.0, 0.0], [1.0, 1.0, 0.0], [0.0, 1.0, 0.0]),
        );
        Self {
            arena,
            lower,
            upper,
        }
    }

    /// A driver with both links committed.
    pub fn driver(&self) -> Driver {
        let mut driver = Driver::default();
        driver.add_link(self.lower);
        driver.add_link(self.upper);
        driver.update(&self.arena);
        driver
    }
}

/// A pair of triangles expected to share exactly one edge.
#[derive(Clone, Copy, Debug)]
pub struct GoldenPair {
    /// Left triangle.
    pub lhs: Triangle,
    /// Right triangle.
    pub rhs: Triangle,
}

impl GoldenPair {
    /// Normals that look anti-parallel but meet over a fold.
    pub fn antiparallel_looking() -> Self {
        Self {
            lhs: triangle([0.0, 0.0, -0.5], [1.0, 1.0, -1.5], [1.0, 0.0, -0.5]),
            rhs: triangle([0.0, 1.0, 0.5], [0.0, 0.0, -0.5], [1.0, 0.0, -0.5]),
        }
    }

    /// A wall standing on a floor.
    pub fn orthogonal() -> Self {
        Self {
            lhs: triangle([0.0, 0.0, 0.0], [0.0, 0.0, 1.0], [1.0, 0.0, 0.0]),
            rhs: triangle([0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]),
        }
    }

    /// Coplanar triangles whose shared edge runs the same way on both.
    pub fn coplanar_opposed_winding() -> Self {
        Self {
            lhs: triangle([1.5, 2.0, 6.5], [2.5, 2.0, 6.5], [1.5, 3.0, 6.5]),
            rhs: triangle([2.5, 1.0, 6.5], [1.5, 2.0, 6.5], [2.5, 2.0, 6.5]),
        }
    }
}
