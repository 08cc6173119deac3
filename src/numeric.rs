//! Tolerance-aware scalar and vector comparisons.
//!
//! Every comparison uses an absolute epsilon: two values are close when the
//! square of their difference does not exceed the square of the epsilon.
//! Relative comparisons are deliberately absent so that results do not drift
//! with the magnitude of world coordinates.

use glam::{DVec2, DVec3};

use crate::constants::DEFAULT_EPSILON;

/// Absolute tolerance carried by geometry and driver values.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Tolerance(f64);

impl Default for Tolerance {
    fn default() -> Self {
        Self(DEFAULT_EPSILON)
    }
}

impl Tolerance {
    /// Create a tolerance from an absolute epsilon.
    ///
    /// Negative values are treated by magnitude.
    ///
    /// # Examples
    /// ```
    /// use pointplane::numeric::Tolerance;
    /// let tolerance = Tolerance::new(0.01);
    /// assert!(tolerance.is_close(1.0, 1.005));
    /// assert!(!tolerance.is_close(1.0, 1.02));
    /// ```
    #[must_use]
    pub fn new(epsilon: f64) -> Self {
        Self(epsilon.abs())
    }

    /// The absolute epsilon.
    #[must_use]
    pub const fn epsilon(self) -> f64 {
        self.0
    }

    /// Whether two scalars are within the tolerance of each other.
    #[must_use]
    pub fn is_close(self, lhs: f64, rhs: f64) -> bool {
        let difference = lhs - rhs;
        difference * difference <= self.0 * self.0
    }

    /// Whether a scalar is within the tolerance of zero.
    #[must_use]
    pub fn is_zero(self, value: f64) -> bool {
        self.is_close(value, 0.0)
    }

    /// Whether two 3D points are within the tolerance of each other.
    #[must_use]
    pub fn vec3_close(self, lhs: DVec3, rhs: DVec3) -> bool {
        lhs.distance_squared(rhs) <= self.0 * self.0
    }

    /// Whether two 2D points are within the tolerance of each other.
    #[must_use]
    pub fn vec2_close(self, lhs: DVec2, rhs: DVec2) -> bool {
        lhs.distance_squared(rhs) <= self.0 * self.0
    }

    /// Whether a 3D displacement is negligible.
    #[must_use]
    pub fn vec3_is_zero(self, value: DVec3) -> bool {
        self.vec3_close(value, DVec3::ZERO)
    }

    /// Whether a 2D displacement is negligible.
    #[must_use]
    pub fn vec2_is_zero(self, value: DVec2) -> bool {
        self.vec2_close(value, DVec2::ZERO)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(0.0, 0.0, true)]
    #[case(1.0, 1.0004, true)]
    #[case(1.0, 1.001, false)]
    #[case(-3.0, -2.9996, true)]
    #[case(f64::NAN, 0.0, false)]
    fn default_tolerance_is_absolute(#[case] lhs: f64, #[case] rhs: f64, #[case] close: bool) {
        assert_eq!(Tolerance::default().is_close(lhs, rhs), close);
    }

    #[test]
    fn negative_epsilon_uses_magnitude() {
        assert_eq!(Tolerance::new(-0.5).epsilon(), 0.5);
    }

    #[test]
    fn large_coordinates_do_not_widen_tolerance() {
        let tolerance = Tolerance::default();
        assert!(!tolerance.is_close(1.0e6, 1.0e6 + 0.01));
    }

    #[test]
    fn vector_closeness_uses_euclidean_distance() {
        let tolerance = Tolerance::new(0.1);
        assert!(tolerance.vec3_close(DVec3::ZERO, DVec3::new(0.05, 0.05, 0.05)));
        assert!(!tolerance.vec3_close(DVec3::ZERO, DVec3::new(0.07, 0.07, 0.07)));
        assert!(tolerance.vec2_is_zero(DVec2::new(0.0, 0.09)));
    }
}
