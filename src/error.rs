//! Error type shared by the geometry, mesh, index and driver modules.
//!
//! Every failure here is a caller or contract error and is never retried.
//! A reference that merely stopped resolving is not an error and never
//! reaches this type, except where the caller's own state depends on it.

use thiserror::Error;

use crate::mesh::LinkHandle;

/// Broad classification of a [`PointPlaneError`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    /// The caller passed a value the operation cannot accept.
    InvalidArgument,
    /// The operation is not valid in the receiver's current state.
    InvalidOperation,
}

/// Failures raised by point-and-plane operations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PointPlaneError {
    /// A concrete side was required but the inside sentinel was given.
    #[error("{operation}: the inside sentinel does not name a triangle side")]
    InsideSide {
        /// Operation that rejected the sentinel.
        operation: &'static str,
    },
    /// Partition entries were not sorted by interval minimum.
    #[error("spatial partition entries must be sorted by interval minimum")]
    UnsortedEntries,
    /// An event handler returned a displacement containing NaN or infinity.
    #[error("event handler returned a non-finite displacement")]
    NonFiniteDisplacement,
    /// An event handler returned a displacement longer than the one it was given.
    #[error(
        "event handler grew the displacement (squared length {previous} became {next})"
    )]
    IncreasingDisplacement {
        /// Squared length of the displacement entering the step.
        previous: f64,
        /// Squared length of the displacement the handler produced.
        next: f64,
    },
    /// The link container was queried while changes were still pending.
    #[error("link container has uncommitted changes; call update first")]
    UncommittedChanges,
    /// A triangle vertex contained NaN or infinity.
    #[error("triangle vertices must be finite")]
    NonFinitePoint,
    /// The triangle vertices do not span a plane.
    #[error("triangle vertices are collinear")]
    CollinearPoints,
    /// A projection line was built from two coincident points.
    #[error("projection line endpoints coincide")]
    DegenerateProjectionLine,
    /// A tracked point refers to a mesh link that has been unloaded.
    #[error("mesh link {0} is no longer loaded")]
    ExpiredLink(LinkHandle),
    /// The driver did not converge within its iteration budget.
    #[error("driver did not settle within {steps} steps")]
    StepLimitExceeded {
        /// Iterations performed before giving up.
        steps: usize,
    },
}

impl PointPlaneError {
    /// Classify the error.
    ///
    /// # Examples
    /// ```
    /// use pointplane::error::{ErrorKind, PointPlaneError};
    /// let error = PointPlaneError::UnsortedEntries;
    /// assert_eq!(error.kind(), ErrorKind::InvalidArgument);
    /// ```
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::InsideSide { .. }
            | Self::UnsortedEntries
            | Self::NonFiniteDisplacement
            | Self::IncreasingDisplacement { .. }
            | Self::NonFinitePoint
            | Self::CollinearPoints
            | Self::DegenerateProjectionLine => ErrorKind::InvalidArgument,
            Self::UncommittedChanges | Self::ExpiredLink(_) | Self::StepLimitExceeded { .. } => {
                ErrorKind::InvalidOperation
            }
        }
    }
}

/// Result alias used throughout the crate.
pub type Result<T, E = PointPlaneError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::inside(PointPlaneError::InsideSide { operation: "side_points" }, ErrorKind::InvalidArgument)]
    #[case::growth(
        PointPlaneError::IncreasingDisplacement { previous: 1.0, next: 2.0 },
        ErrorKind::InvalidArgument
    )]
    #[case::dirty(PointPlaneError::UncommittedChanges, ErrorKind::InvalidOperation)]
    #[case::steps(PointPlaneError::StepLimitExceeded { steps: 3 }, ErrorKind::InvalidOperation)]
    fn errors_are_classified(#[case] error: PointPlaneError, #[case] kind: ErrorKind) {
        assert_eq!(error.kind(), kind);
    }

    #[test]
    fn messages_name_the_operation() {
        let error = PointPlaneError::InsideSide {
            operation: "opposing_point",
        };
        assert!(error.to_string().starts_with("opposing_point:"));
    }
}
