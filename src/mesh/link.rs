//! A triangle together with its three adjacency slots.

use crate::error::{PointPlaneError, Result};
use crate::mesh::{Attachment, LinkHandle};
use crate::triangle::{Side, Triangle};

/// How to continue across one edge of a [`MeshLink`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Transfer {
    /// Neighbouring link across the edge.
    pub target: LinkHandle,
    /// The neighbour's side that shares the edge.
    pub side: Side,
    /// The edge parameter runs the opposite way on the neighbour.
    pub flips: bool,
    /// Crossing flips the tracked point's normal sense.
    pub inverts_normal: bool,
}

/// A triangle plus one adjacency slot per edge.
///
/// Slots hold handles, not references, so a neighbour that has been
/// unloaded simply stops resolving through the owning
/// [`MeshArena`](crate::mesh::MeshArena).
#[derive(Clone, Debug, PartialEq)]
pub struct MeshLink {
    triangle: Triangle,
    transfers: [Option<Transfer>; 3],
}

impl MeshLink {
    /// Wrap a triangle with no neighbours.
    #[must_use]
    pub const fn new(triangle: Triangle) -> Self {
        Self {
            triangle,
            transfers: [None; 3],
        }
    }

    /// The wrapped triangle.
    #[must_use]
    pub const fn triangle(&self) -> &Triangle {
        &self.triangle
    }

    /// The adjacency recorded for `side`, whether or not its target is live.
    ///
    /// # Errors
    /// Returns [`PointPlaneError::InsideSide`] for [`Side::Inside`].
    pub fn transfers_to(&self, side: Side) -> Result<Option<Transfer>> {
        let index = slot_index(side, "transfers_to")?;
        Ok(self.transfers.get(index).copied().flatten())
    }

    /// Whether `side` holds any recorded adjacency.
    ///
    /// # Errors
    /// Returns [`PointPlaneError::InsideSide`] for [`Side::Inside`].
    pub fn has_side_attached(&self, side: Side) -> Result<bool> {
        Ok(self.transfers_to(side)?.is_some())
    }

    /// Number of sides holding a recorded adjacency.
    #[must_use]
    pub fn sides_attached_count(&self) -> usize {
        self.transfers.iter().flatten().count()
    }

    /// Attaches whichever side of `self` shares an edge with `other`.
    ///
    /// Returns whether an attachment was made. A pair without a shared edge
    /// is left untouched.
    pub fn attempt_attachment_to(&mut self, other_handle: LinkHandle, other: &Triangle) -> bool {
        Attachment::find(&self.triangle, other)
            .is_some_and(|attachment| self.record(other_handle, attachment))
    }

    /// Like [`MeshLink::attempt_attachment_to`], but only when the shared
    /// edge is `side`.
    ///
    /// # Errors
    /// Returns [`PointPlaneError::InsideSide`] for [`Side::Inside`].
    pub fn attempt_attachment_to_side(
        &mut self,
        side: Side,
        other_handle: LinkHandle,
        other: &Triangle,
    ) -> Result<bool> {
        slot_index(side, "attempt_attachment_to_side")?;
        Ok(Attachment::find(&self.triangle, other)
            .filter(|attachment| attachment.lhs_side == side)
            .is_some_and(|attachment| self.record(other_handle, attachment)))
    }

    pub(crate) fn record(&mut self, target: LinkHandle, attachment: Attachment) -> bool {
        let Ok(index) = slot_index(attachment.lhs_side, "record") else {
            return false;
        };
        let Some(slot) = self.transfers.get_mut(index) else {
            return false;
        };
        *slot = Some(Transfer {
            target,
            side: attachment.rhs_side,
            flips: attachment.flips,
            inverts_normal: attachment.inverts_normal,
        });
        true
    }
}

fn slot_index(side: Side, operation: &'static str) -> Result<usize> {
    match side {
        Side::Ab => Ok(0),
        Side::Bc => Ok(1),
        Side::Ca => Ok(2),
        Side::Inside => Err(PointPlaneError::InsideSide { operation }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::DVec3;

    fn handle(index: u32) -> LinkHandle {
        LinkHandle::new(index, 0)
    }

    fn lower() -> Triangle {
        Triangle::new(DVec3::ZERO, DVec3::X, DVec3::new(1.0, 1.0, 0.0)).expect("valid triangle")
    }

    fn upper() -> Triangle {
        Triangle::new(DVec3::ZERO, DVec3::new(1.0, 1.0, 0.0), DVec3::Y).expect("valid triangle")
    }

    #[test]
    fn attachment_fills_one_slot() {
        let mut link = MeshLink::new(lower());
        assert!(link.attempt_attachment_to(handle(1), &upper()));
        assert_eq!(link.sides_attached_count(), 1);
        let transfer = link
            .transfers_to(Side::Ca)
            .expect("concrete side")
            .expect("attached");
        assert_eq!(transfer.target, handle(1));
        assert_eq!(transfer.side, Side::Ab);
    }

    #[test]
    fn side_restricted_attachment_ignores_other_sides() {
        let mut link = MeshLink::new(lower());
        let attached = link
            .attempt_attachment_to_side(Side::Ab, handle(1), &upper())
            .expect("concrete side");
        assert!(!attached);
        assert_eq!(link.sides_attached_count(), 0);
    }

    #[test]
    fn inside_sentinel_never_attaches() {
        let mut link = MeshLink::new(lower());
        let result = link.attempt_attachment_to_side(Side::Inside, handle(1), &upper());
        assert!(matches!(result, Err(PointPlaneError::InsideSide { .. })));
        assert!(link.has_side_attached(Side::Inside).is_err());
        assert_eq!(link.sides_attached_count(), 0);
    }
}
