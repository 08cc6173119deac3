//! Contact policy injected into the driver.
//!
//! The driver decides *when* a point meets a triangle or reaches an edge; an
//! [`EventHandler`] decides *what happens next*. Every displacement a handler
//! returns must be finite and no longer than the displacement it was handed,
//! otherwise [`Driver::resolve`](crate::driver::Driver::resolve) fails.

use glam::{DVec2, DVec3};

use crate::triangle::{SideCrossing, Triangle};

/// Displacement left over after a contact event.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Remainder {
    /// Continue on the triangle, in its local frame.
    Segment(DVec2),
    /// Continue in free flight.
    Air(DVec3),
}

/// Decision taken when a point reaches an edge with a linked neighbour.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum TransferOutcome {
    /// Stay on a surface.
    Segment {
        /// Move onto the neighbour (`true`) or stop at the edge (`false`).
        transfers: bool,
        /// Remaining displacement in the frame of the triangle chosen.
        remaining: DVec2,
    },
    /// Leave the surface with the given displacement.
    Air(DVec3),
}

/// Policy for contact between a moving point and the mesh.
pub trait EventHandler {
    /// A free-flying point reached `triangle`.
    ///
    /// `limit` is where the point stopped short of the surface,
    /// `intersection` the local coordinate it would have struck and `target`
    /// the end of its unobstructed path.
    fn on_triangle_hit(
        &self,
        triangle: &Triangle,
        limit: DVec3,
        intersection: DVec2,
        target: DVec3,
    ) -> Remainder;

    /// A tracked point reached an edge with no neighbour.
    fn on_transfer_absent_link(
        &self,
        triangle: &Triangle,
        crossing: &SideCrossing,
        target: DVec3,
    ) -> Remainder;

    /// A tracked point reached an edge shared with `to`.
    fn on_transfer(
        &self,
        from: &Triangle,
        crossing: &SideCrossing,
        to: &Triangle,
        target: DVec3,
    ) -> TransferOutcome;
}

/// Stops dead on every contact.
///
/// Attaches on landing, falls off unlinked edges and crosses linked ones,
/// each time discarding whatever displacement was left.
#[derive(Clone, Copy, Debug, Default)]
pub struct AbsorbingHandler;

impl EventHandler for AbsorbingHandler {
    fn on_triangle_hit(&self, _: &Triangle, _: DVec3, _: DVec2, _: DVec3) -> Remainder {
        Remainder::Segment(DVec2::ZERO)
    }

    fn on_transfer_absent_link(&self, _: &Triangle, _: &SideCrossing, _: DVec3) -> Remainder {
        Remainder::Air(DVec3::ZERO)
    }

    fn on_transfer(
        &self,
        _: &Triangle,
        _: &SideCrossing,
        _: &Triangle,
        _: DVec3,
    ) -> TransferOutcome {
        TransferOutcome::Segment {
            transfers: true,
            remaining: DVec2::ZERO,
        }
    }
}

/// Keeps moving along surfaces.
///
/// On landing the rest of the fall is projected onto the surface; unlinked
/// edges are left in free flight with the remaining displacement; linked
/// edges are always crossed with the remainder re-expressed in the
/// neighbour's frame.
#[derive(Clone, Copy, Debug, Default)]
pub struct SlidingHandler;

impl EventHandler for SlidingHandler {
    fn on_triangle_hit(
        &self,
        triangle: &Triangle,
        limit: DVec3,
        _: DVec2,
        target: DVec3,
    ) -> Remainder {
        Remainder::Segment(triangle.local_displacement(target - limit))
    }

    fn on_transfer_absent_link(
        &self,
        triangle: &Triangle,
        crossing: &SideCrossing,
        target: DVec3,
    ) -> Remainder {
        Remainder::Air(target - triangle.point_at(crossing.outside))
    }

    fn on_transfer(
        &self,
        from: &Triangle,
        crossing: &SideCrossing,
        to: &Triangle,
        target: DVec3,
    ) -> TransferOutcome {
        TransferOutcome::Segment {
            transfers: true,
            remaining: to.local_displacement(target - from.point_at(crossing.outside)),
        }
    }
}
