//! Numeric defaults shared by the geometry, index and driver modules.
//!
//! Runtime code reads tolerances from [`crate::config::PhysicsSettings`];
//! these values only seed its defaults and a few fixed heuristics.

/// Absolute tolerance used when comparing points and scalars.
pub const DEFAULT_EPSILON: f64 = 0.0005;
/// Upper bound on driver iterations for a single `resolve` call.
pub const DEFAULT_MAX_STEPS: usize = 256;
/// Fractions of the indexed value range where partition buckets begin.
///
/// The quartile split is fixed rather than adaptive.
pub const BUCKET_FRACTIONS: [f64; 4] = [0.0, 0.25, 0.5, 0.75];
/// Bisection iterations used to pin down where a segment leaves a triangle.
pub const CROSSING_REFINEMENT_STEPS: usize = 64;
/// Fraction of a free-flight segment kept between a limit point and its plane.
pub const LIMIT_BACKOFF: f64 = 1e-6;
