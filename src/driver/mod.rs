//! Point-and-plane locomotion.
//!
//! A moving point is either falling freely ([`InAir`]) or tracked across one
//! triangle in that triangle's local frame ([`OnSegment`]). The [`Driver`]
//! advances a [`State`] until its displacement is spent, consulting the
//! committed spatial index for free flight and the mesh adjacency for edge
//! crossings, and delegating every contact decision to an
//! [`EventHandler`].

mod handler;
mod resolve;

pub use handler::{AbsorbingHandler, EventHandler, Remainder, SlidingHandler, TransferOutcome};
pub use resolve::Driver;

use glam::{DVec2, DVec3};

use crate::error::{PointPlaneError, Result};
use crate::mesh::{LinkHandle, MeshArena};
use crate::numeric::Tolerance;
use crate::triangle::Triangle;

/// A point falling freely.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct InAir {
    /// World position.
    pub location: DVec3,
    /// Movement still to be applied.
    pub displacement: DVec3,
}

/// A point tracked across one triangle.
///
/// `location` is expected to lie within the linked triangle.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct OnSegment {
    /// Triangle the point is on.
    pub link: LinkHandle,
    /// The point sits on the side the normal points away from.
    pub invert_normal: bool,
    /// Position in the triangle's local frame.
    pub location: DVec2,
    /// Movement still to be applied, in the triangle's local frame.
    pub displacement: DVec2,
}

impl OnSegment {
    /// Triangle the point is on.
    ///
    /// # Errors
    /// Returns [`PointPlaneError::ExpiredLink`] when the link was unloaded.
    pub fn triangle<'a>(&self, arena: &'a MeshArena) -> Result<&'a Triangle> {
        arena
            .triangle(self.link)
            .ok_or(PointPlaneError::ExpiredLink(self.link))
    }

    /// Normal on the side the point is on.
    ///
    /// # Errors
    /// Returns [`PointPlaneError::ExpiredLink`] when the link was unloaded.
    pub fn effective_normal(&self, arena: &MeshArena) -> Result<DVec3> {
        let normal = self.triangle(arena)?.normal();
        Ok(if self.invert_normal { -normal } else { normal })
    }
}

/// Locomotion state of one moving point.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum State {
    /// Free flight.
    InAir(InAir),
    /// Tracked on a triangle.
    OnSegment(OnSegment),
}

impl From<InAir> for State {
    fn from(state: InAir) -> Self {
        Self::InAir(state)
    }
}

impl From<OnSegment> for State {
    fn from(state: OnSegment) -> Self {
        Self::OnSegment(state)
    }
}

impl State {
    /// Squared length of the pending displacement.
    ///
    /// Local frames are orthonormal, so 2D and 3D lengths compare directly.
    #[must_use]
    pub fn displacement_length_squared(&self) -> f64 {
        match self {
            Self::InAir(state) => state.displacement.length_squared(),
            Self::OnSegment(state) => state.displacement.length_squared(),
        }
    }

    /// Whether the pending displacement contains NaN or infinity.
    #[must_use]
    pub fn displacement_is_finite(&self) -> bool {
        match self {
            Self::InAir(state) => state.displacement.is_finite(),
            Self::OnSegment(state) => state.displacement.is_finite(),
        }
    }

    /// Whether no meaningful displacement remains.
    #[must_use]
    pub fn is_settled(&self, tolerance: Tolerance) -> bool {
        match self {
            Self::InAir(state) => tolerance.vec3_is_zero(state.displacement),
            Self::OnSegment(state) => tolerance.vec2_is_zero(state.displacement),
        }
    }
}

/// World position of the point.
///
/// # Errors
/// Returns [`PointPlaneError::ExpiredLink`] for a tracked point whose
/// triangle was unloaded.
pub fn location_of(state: &State, arena: &MeshArena) -> Result<DVec3> {
    match state {
        State::InAir(in_air) => Ok(in_air.location),
        State::OnSegment(on_segment) => Ok(on_segment.triangle(arena)?.point_at(on_segment.location)),
    }
}

/// World position the point would reach with its whole displacement applied.
///
/// # Errors
/// Same as [`location_of`].
pub fn displaced_location_of(state: &State, arena: &MeshArena) -> Result<DVec3> {
    match state {
        State::InAir(in_air) => Ok(in_air.location + in_air.displacement),
        State::OnSegment(on_segment) => Ok(on_segment
            .triangle(arena)?
            .point_at(on_segment.location + on_segment.displacement)),
    }
}

/// A tracked point's displacement in world space.
///
/// # Errors
/// Returns [`PointPlaneError::ExpiredLink`] when the link was unloaded.
pub fn segment_displacement_to_v3(on_segment: &OnSegment, arena: &MeshArena) -> Result<DVec3> {
    Ok(on_segment
        .triangle(arena)?
        .world_displacement(on_segment.displacement))
}

/// Expresses a world displacement in a tracked point's local frame.
///
/// The component along the triangle's normal is discarded.
///
/// # Errors
/// Returns [`PointPlaneError::ExpiredLink`] when the link was unloaded.
pub fn find_on_segment_displacement(
    on_segment: &OnSegment,
    displacement: DVec3,
    arena: &MeshArena,
) -> Result<DVec2> {
    Ok(on_segment.triangle(arena)?.local_displacement(displacement))
}

/// Releases a tracked point into free flight from where it stands.
///
/// # Errors
/// Returns [`PointPlaneError::ExpiredLink`] when the link was unloaded.
pub fn lift_off(on_segment: &OnSegment, arena: &MeshArena, displacement: DVec3) -> Result<InAir> {
    Ok(InAir {
        location: on_segment.triangle(arena)?.point_at(on_segment.location),
        displacement,
    })
}
