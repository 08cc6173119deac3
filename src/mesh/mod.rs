//! Mesh links and the arena that owns them.
//!
//! The arena stores every [`MeshLink`] in a generational slot. Adjacency
//! slots and index entries hold [`LinkHandle`]s; once a link is removed or
//! its region unloaded, the slot's generation moves on and every outstanding
//! handle to it quietly stops resolving.
//!
//! Adjacency is discovered from geometry alone with
//! [`MeshArena::attempt_attachment_to`] and
//! [`MeshArena::attach_unattached_matching_points`]; whole batches of links
//! can be linked at once with [`MeshArena::stitch`].

mod attachment;
mod link;

pub use attachment::Attachment;
pub use link::{MeshLink, Transfer};

use std::fmt;

use hashbrown::HashMap;
use log::debug;
use ordered_float::OrderedFloat;

use crate::error::{PointPlaneError, Result};
use crate::spatial::{Interval, ProjectionLine};
use crate::triangle::{Side, Triangle};

/// Generational reference to a [`MeshLink`] stored in a [`MeshArena`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LinkHandle {
    index: u32,
    generation: u32,
}

impl LinkHandle {
    /// Build a handle from raw parts.
    ///
    /// Handles are normally minted by [`MeshArena::insert`]; a fabricated one
    /// simply fails to resolve.
    #[must_use]
    pub const fn new(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }

    /// Slot index.
    #[must_use]
    pub const fn index(self) -> u32 {
        self.index
    }

    /// Slot generation at the time the handle was minted.
    #[must_use]
    pub const fn generation(self) -> u32 {
        self.generation
    }
}

impl fmt::Display for LinkHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}v{}", self.index, self.generation)
    }
}

/// Identifies a loaded region whose links share a lifetime.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RegionId(pub u32);

impl fmt::Display for RegionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "region {}", self.0)
    }
}

#[derive(Clone, Debug, Default)]
struct Slot {
    generation: u32,
    occupant: Option<(RegionId, MeshLink)>,
}

/// Owner of every loaded [`MeshLink`].
#[derive(Clone, Debug, Default)]
pub struct MeshArena {
    slots: Vec<Slot>,
    free: Vec<u32>,
    regions: HashMap<RegionId, Vec<LinkHandle>>,
}

impl MeshArena {
    /// An empty arena.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `triangle` as a new, unattached link owned by `region`.
    pub fn insert(&mut self, region: RegionId, triangle: Triangle) -> LinkHandle {
        let link = MeshLink::new(triangle);
        let handle = match self.free.pop() {
            Some(index) => {
                let generation = self.slot(index).map_or(0, |slot| slot.generation);
                if let Some(slot) = self.slot_mut(index) {
                    slot.occupant = Some((region, link));
                }
                LinkHandle::new(index, generation)
            }
            None => {
                let index = u32::try_from(self.slots.len()).unwrap_or(u32::MAX);
                self.slots.push(Slot {
                    generation: 0,
                    occupant: Some((region, link)),
                });
                LinkHandle::new(index, 0)
            }
        };
        self.regions.entry(region).or_default().push(handle);
        handle
    }

    /// Resolve a handle.
    #[must_use]
    pub fn get(&self, handle: LinkHandle) -> Option<&MeshLink> {
        self.slot(handle.index)
            .filter(|slot| slot.generation == handle.generation)
            .and_then(|slot| slot.occupant.as_ref())
            .map(|(_, link)| link)
    }

    fn get_mut(&mut self, handle: LinkHandle) -> Option<&mut MeshLink> {
        self.slot_mut(handle.index)
            .filter(|slot| slot.generation == handle.generation)
            .and_then(|slot| slot.occupant.as_mut())
            .map(|(_, link)| link)
    }

    /// Resolve a handle to its triangle.
    #[must_use]
    pub fn triangle(&self, handle: LinkHandle) -> Option<&Triangle> {
        self.get(handle).map(MeshLink::triangle)
    }

    /// Whether `handle` still resolves.
    #[must_use]
    pub fn contains(&self, handle: LinkHandle) -> bool {
        self.get(handle).is_some()
    }

    /// Drop one link, invalidating every handle to it.
    pub fn remove(&mut self, handle: LinkHandle) -> Option<MeshLink> {
        let slot = self
            .slots
            .get_mut(usize::try_from(handle.index).ok()?)
            .filter(|slot| slot.generation == handle.generation)?;
        let (region, link) = slot.occupant.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(handle.index);
        if let Some(handles) = self.regions.get_mut(&region) {
            handles.retain(|owned| *owned != handle);
            if handles.is_empty() {
                self.regions.remove(&region);
            }
        }
        Some(link)
    }

    /// Drop every link owned by `region` and return their (now stale) handles.
    pub fn unload_region(&mut self, region: RegionId) -> Vec<LinkHandle> {
        let handles = self.regions.remove(&region).unwrap_or_default();
        for handle in &handles {
            if let Some(slot) = self
                .slot_mut(handle.index)
                .filter(|slot| slot.generation == handle.generation)
            {
                slot.occupant = None;
                slot.generation = slot.generation.wrapping_add(1);
                self.free.push(handle.index);
            }
        }
        debug!("unloaded {region} ({} links)", handles.len());
        handles
    }

    /// Handles of the links owned by `region`.
    #[must_use]
    pub fn handles_in(&self, region: RegionId) -> &[LinkHandle] {
        self.regions.get(&region).map_or(&[], Vec::as_slice)
    }

    /// Number of live links.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots
            .iter()
            .filter(|slot| slot.occupant.is_some())
            .count()
    }

    /// Whether no links are live.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Live links with their handles, in slot order.
    pub fn iter(&self) -> impl Iterator<Item = (LinkHandle, &MeshLink)> + '_ {
        self.slots.iter().zip(0_u32..).filter_map(|(slot, index)| {
            slot.occupant
                .as_ref()
                .map(|(_, link)| (LinkHandle::new(index, slot.generation), link))
        })
    }

    /// The live adjacency across `side` of `handle`.
    ///
    /// A stale `handle` or a neighbour that no longer resolves reads as
    /// `None`.
    ///
    /// # Errors
    /// Returns [`PointPlaneError::InsideSide`] for
    /// [`Side::Inside`].
    pub fn transfers_to(&self, handle: LinkHandle, side: Side) -> Result<Option<Transfer>> {
        let Some(link) = self.get(handle) else {
            return if side.is_edge() {
                Ok(None)
            } else {
                Err(PointPlaneError::InsideSide {
                    operation: "transfers_to",
                })
            };
        };
        Ok(link
            .transfers_to(side)?
            .filter(|transfer| self.contains(transfer.target)))
    }

    /// Whether `side` of `handle` leads to a live neighbour.
    ///
    /// # Errors
    /// Returns [`PointPlaneError::InsideSide`] for
    /// [`Side::Inside`].
    pub fn has_side_attached(&self, handle: LinkHandle, side: Side) -> Result<bool> {
        Ok(self.transfers_to(handle, side)?.is_some())
    }

    /// Number of sides of `handle` leading to live neighbours.
    #[must_use]
    pub fn sides_attached_count(&self, handle: LinkHandle) -> usize {
        Side::EDGES
            .iter()
            .filter(|side| matches!(self.transfers_to(handle, **side), Ok(Some(_))))
            .count()
    }

    /// Attach `lhs` to `rhs` across their shared edge, one direction only.
    ///
    /// Returns whether an attachment was recorded; unresolvable handles and
    /// triangles without a shared edge record nothing.
    pub fn attempt_attachment_to(&mut self, lhs: LinkHandle, rhs: LinkHandle) -> bool {
        let Some(other) = self.triangle(rhs).copied() else {
            return false;
        };
        self.get_mut(lhs)
            .is_some_and(|link| link.attempt_attachment_to(rhs, &other))
    }

    /// Attach `lhs` and `rhs` to each other in both directions, leaving any
    /// side that already leads to a live neighbour untouched.
    ///
    /// Returns the number of sides newly attached (zero to two).
    pub fn attach_unattached_matching_points(&mut self, lhs: LinkHandle, rhs: LinkHandle) -> usize {
        self.attach_pair(lhs, rhs, false)
    }

    /// Attach `lhs` and `rhs` to each other in both directions, overwriting
    /// whatever the shared sides held before.
    pub fn reattach_matching_points(&mut self, lhs: LinkHandle, rhs: LinkHandle) -> usize {
        self.attach_pair(lhs, rhs, true)
    }

    fn attach_pair(&mut self, lhs: LinkHandle, rhs: LinkHandle, overwrite: bool) -> usize {
        if lhs == rhs {
            return 0;
        }
        let (Some(lhs_triangle), Some(rhs_triangle)) =
            (self.triangle(lhs).copied(), self.triangle(rhs).copied())
        else {
            return 0;
        };
        let mut attached = 0;
        for (from, from_triangle, to, to_triangle) in [
            (lhs, lhs_triangle, rhs, rhs_triangle),
            (rhs, rhs_triangle, lhs, lhs_triangle),
        ] {
            let Some(attachment) = Attachment::find(&from_triangle, &to_triangle) else {
                continue;
            };
            if !overwrite && matches!(self.has_side_attached(from, attachment.lhs_side), Ok(true))
            {
                continue;
            }
            if self
                .get_mut(from)
                .is_some_and(|link| link.record(to, attachment))
            {
                attached += 1;
            }
        }
        if attached > 0 {
            debug!("attached {lhs} and {rhs} on {attached} sides");
        }
        attached
    }

    /// Links every pair among `handles` that shares an edge.
    ///
    /// Links are sorted by their extent along the axis the batch spreads
    /// widest on, then swept so only pairs with overlapping extents are
    /// compared. Sides already leading to live neighbours are left alone.
    /// Returns the number of sides newly attached.
    pub fn stitch(&mut self, handles: &[LinkHandle]) -> usize {
        let triangles: Vec<(LinkHandle, Triangle)> = handles
            .iter()
            .filter_map(|handle| self.triangle(*handle).map(|triangle| (*handle, *triangle)))
            .collect();
        let line = ProjectionLine::spanning(triangles.iter().map(|(_, triangle)| triangle));
        let mut entries: Vec<(Interval, LinkHandle)> = triangles
            .iter()
            .map(|(handle, triangle)| (line.interval_for_triangle(triangle), *handle))
            .collect();
        entries.sort_by_key(|(interval, handle)| (OrderedFloat(interval.min), *handle));
        entries.dedup_by_key(|(_, handle)| *handle);
        let slack = triangles
            .first()
            .map_or(0.0, |(_, triangle)| triangle.tolerance().epsilon());

        let mut attached = 0;
        for (position, (interval, handle)) in entries.iter().enumerate() {
            for (other_interval, other) in entries.iter().skip(position + 1) {
                if other_interval.min > interval.max + slack {
                    break;
                }
                attached += self.attach_unattached_matching_points(*handle, *other);
            }
        }
        debug!("stitched {} links, {attached} sides attached", entries.len());
        attached
    }

    fn slot(&self, index: u32) -> Option<&Slot> {
        self.slots.get(usize::try_from(index).ok()?)
    }

    fn slot_mut(&mut self, index: u32) -> Option<&mut Slot> {
        self.slots.get_mut(usize::try_from(index).ok()?)
    }
}
