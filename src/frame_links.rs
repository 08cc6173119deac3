//! Per-frame staging of mesh membership changes.
//!
//! Additions and removals are queued as they happen and applied together by
//! [`FrameLinkContainer::update`], which then rebuilds the spatial index from
//! scratch. Queries are refused while changes are pending so that every
//! movement resolved in a frame sees the same committed mesh.

use glam::DVec3;
use log::debug;

use crate::error::{PointPlaneError, Result};
use crate::mesh::{LinkHandle, MeshArena};
use crate::spatial::ProjectedSpatialMap;

/// Link set with deferred additions and removals.
#[derive(Clone, Debug, Default)]
pub struct FrameLinkContainer {
    pending_additions: Vec<LinkHandle>,
    pending_removals: Vec<LinkHandle>,
    committed: Vec<LinkHandle>,
    index: ProjectedSpatialMap,
    dirty: bool,
}

impl FrameLinkContainer {
    /// An empty, committed container.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue `link` for addition at the next update.
    pub fn defer_addition_of(&mut self, link: LinkHandle) {
        self.pending_additions.push(link);
        self.dirty = true;
    }

    /// Queue `link` for removal at the next update.
    pub fn defer_removal_of(&mut self, link: LinkHandle) {
        self.pending_removals.push(link);
        self.dirty = true;
    }

    /// Whether changes are waiting for [`FrameLinkContainer::update`].
    #[must_use]
    pub const fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Committed links, including any that have since expired.
    #[must_use]
    pub fn links(&self) -> &[LinkHandle] {
        &self.committed
    }

    /// Number of committed links.
    #[must_use]
    pub fn len(&self) -> usize {
        self.committed.len()
    }

    /// Whether no links are committed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.committed.is_empty()
    }

    /// Apply queued changes and rebuild the index.
    ///
    /// A link both added and removed since the last update cancels out and
    /// never reaches the index. Links that no longer resolve in `arena` are
    /// dropped from the committed set.
    pub fn update(&mut self, arena: &MeshArena) {
        let mut additions = std::mem::take(&mut self.pending_additions);
        let mut removals = std::mem::take(&mut self.pending_removals);
        additions.sort_unstable();
        removals.sort_unstable();
        let cancelled = cancel_pairs(&mut additions, &mut removals);
        if cancelled > 0 {
            debug!("{cancelled} links were added and removed within one frame");
        }

        self.committed.extend(additions);
        self.committed.sort_unstable();
        self.committed.dedup();
        self.committed
            .retain(|link| removals.binary_search(link).is_err());
        let before = self.committed.len();
        self.committed.retain(|link| arena.contains(*link));
        let expired = before - self.committed.len();
        if expired > 0 {
            debug!("dropped {expired} expired links during update");
        }

        self.index = ProjectedSpatialMap::build(arena, &self.committed);
        self.dirty = false;
    }

    /// Drop all pending and committed links, leaving an empty committed index.
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Candidate links for the segment from `a` to `b`.
    ///
    /// # Errors
    /// Returns [`PointPlaneError::UncommittedChanges`] while changes are
    /// pending.
    pub fn view_for(&self, a: DVec3, b: DVec3) -> Result<impl Iterator<Item = LinkHandle> + '_> {
        if self.dirty {
            return Err(PointPlaneError::UncommittedChanges);
        }
        Ok(self.index.view_for(a, b))
    }
}

/// Removes links present in both sorted lists, one pair at a time.
fn cancel_pairs(additions: &mut Vec<LinkHandle>, removals: &mut Vec<LinkHandle>) -> usize {
    let mut kept_additions = Vec::with_capacity(additions.len());
    let mut kept_removals = Vec::with_capacity(removals.len());
    let mut cancelled = 0;
    let mut added = additions.iter().peekable();
    let mut removed = removals.iter().peekable();
    loop {
        match (added.peek().map(|link| **link), removed.peek().map(|link| **link)) {
            (Some(addition), Some(removal)) if addition == removal => {
                cancelled += 1;
                added.next();
                removed.next();
            }
            (Some(addition), Some(removal)) if addition < removal => {
                kept_additions.push(addition);
                added.next();
            }
            (_, Some(removal)) => {
                kept_removals.push(removal);
                removed.next();
            }
            (Some(addition), None) => {
                kept_additions.push(addition);
                added.next();
            }
            (None, None) => break,
        }
    }
    *additions = kept_additions;
    *removals = kept_removals;
    cancelled
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::RegionId;
    use crate::triangle::Triangle;

    fn arena_with_links(count: u32) -> (MeshArena, Vec<LinkHandle>) {
        let mut arena = MeshArena::new();
        let handles = (0..count)
            .map(|step| {
                let x = f64::from(step);
                let triangle = Triangle::new(
                    DVec3::new(x, 0.0, 0.0),
                    DVec3::new(x + 1.0, 0.0, 0.0),
                    DVec3::new(x, 1.0, 0.0),
                )
                .expect("valid triangle");
                arena.insert(RegionId(0), triangle)
            })
            .collect();
        (arena, handles)
    }

    #[test]
    fn matching_pairs_cancel() {
        let mut additions = vec![LinkHandle::new(1, 0), LinkHandle::new(2, 0)];
        let mut removals = vec![LinkHandle::new(2, 0), LinkHandle::new(3, 0)];
        assert_eq!(cancel_pairs(&mut additions, &mut removals), 1);
        assert_eq!(additions, vec![LinkHandle::new(1, 0)]);
        assert_eq!(removals, vec![LinkHandle::new(3, 0)]);
    }

    #[test]
    fn view_is_refused_until_update() {
        let (arena, handles) = arena_with_links(1);
        let mut container = FrameLinkContainer::new();
        container.defer_addition_of(handles[0]);
        assert!(matches!(
            container.view_for(DVec3::ZERO, DVec3::X),
            Err(PointPlaneError::UncommittedChanges)
        ));
        container.update(&arena);
        let found: Vec<_> = container
            .view_for(DVec3::ZERO, DVec3::X)
            .expect("committed")
            .collect();
        assert_eq!(found, handles);
    }

    #[test]
    fn add_then_remove_never_reaches_index() {
        let (arena, handles) = arena_with_links(2);
        let mut container = FrameLinkContainer::new();
        container.defer_addition_of(handles[0]);
        container.defer_addition_of(handles[1]);
        container.defer_removal_of(handles[1]);
        container.update(&arena);
        assert_eq!(container.links(), &handles[..1]);
    }

    #[test]
    fn removal_applies_to_committed_links() {
        let (arena, handles) = arena_with_links(2);
        let mut container = FrameLinkContainer::new();
        for handle in &handles {
            container.defer_addition_of(*handle);
        }
        container.update(&arena);
        container.defer_removal_of(handles[0]);
        container.update(&arena);
        assert_eq!(container.links(), &handles[1..]);
    }

    #[test]
    fn expired_links_are_dropped_on_update() {
        let (mut arena, handles) = arena_with_links(2);
        let mut container = FrameLinkContainer::new();
        for handle in &handles {
            container.defer_addition_of(*handle);
        }
        arena.remove(handles[1]);
        container.update(&arena);
        assert_eq!(container.len(), 1);
    }

    #[test]
    fn clear_leaves_an_empty_committed_index() {
        let (arena, handles) = arena_with_links(1);
        let mut container = FrameLinkContainer::new();
        container.defer_addition_of(handles[0]);
        container.update(&arena);
        container.defer_addition_of(handles[0]);
        container.clear();
        assert!(!container.is_dirty());
        assert!(container.is_empty());
        assert_eq!(
            container
                .view_for(DVec3::ZERO, DVec3::X)
                .expect("clear commits")
                .count(),
            0
        );
    }
}
