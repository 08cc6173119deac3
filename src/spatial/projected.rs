//! Partition index over mesh links.

use glam::DVec3;
use log::debug;

use crate::mesh::{LinkHandle, MeshArena};
use crate::spatial::{Entry, Interval, ProjectionLine, SpatialPartitionMap};

/// Mesh links indexed by their extent along the mesh's widest axis.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ProjectedSpatialMap {
    line: ProjectionLine,
    map: SpatialPartitionMap<LinkHandle>,
}

impl ProjectedSpatialMap {
    /// Index the given links; handles that no longer resolve are skipped.
    #[must_use]
    pub fn build(arena: &MeshArena, handles: &[LinkHandle]) -> Self {
        let live: Vec<_> = handles
            .iter()
            .filter_map(|handle| arena.triangle(*handle).map(|triangle| (*handle, triangle)))
            .collect();
        let skipped = handles.len() - live.len();
        if skipped > 0 {
            debug!("skipped {skipped} expired links while indexing");
        }
        let line = ProjectionLine::spanning(live.iter().map(|(_, triangle)| *triangle));
        let entries = live
            .iter()
            .map(|(handle, triangle)| Entry::new(line.interval_for_triangle(triangle), *handle))
            .collect();
        Self {
            line,
            map: SpatialPartitionMap::from_unsorted(entries),
        }
    }

    /// The line links were projected onto.
    #[must_use]
    pub const fn line(&self) -> &ProjectionLine {
        &self.line
    }

    /// Number of indexed links.
    #[must_use]
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Whether no links are indexed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Candidate links for the segment from `a` to `b`.
    ///
    /// Candidates may have expired since indexing; resolve each before use.
    pub fn view_for(&self, a: DVec3, b: DVec3) -> impl Iterator<Item = LinkHandle> + '_ {
        self.view_for_interval(self.line.interval_for(a, b))
    }

    /// Candidate links whose projected interval overlaps `interval`.
    pub fn view_for_interval(&self, interval: Interval) -> impl Iterator<Item = LinkHandle> + '_ {
        self.map.view_for(interval).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::RegionId;
    use crate::triangle::Triangle;

    fn strip(arena: &mut MeshArena) -> Vec<LinkHandle> {
        (0..5)
            .map(|step| {
                let x = f64::from(step);
                let triangle = Triangle::new(
                    DVec3::new(x, 0.0, 0.0),
                    DVec3::new(x + 1.0, 0.0, 0.0),
                    DVec3::new(x + 1.0, 1.0, 0.0),
                )
                .expect("valid triangle");
                arena.insert(RegionId(0), triangle)
            })
            .collect()
    }

    #[test]
    fn segment_query_finds_overlapping_links() {
        let mut arena = MeshArena::new();
        let handles = strip(&mut arena);
        let map = ProjectedSpatialMap::build(&arena, &handles);
        let found: Vec<_> = map
            .view_for(DVec3::new(1.5, 0.0, 0.0), DVec3::new(1.5, 0.0, 0.0))
            .collect();
        assert_eq!(found, vec![handles[1]]);
    }

    #[test]
    fn expired_links_are_not_indexed() {
        let mut arena = MeshArena::new();
        let handles = strip(&mut arena);
        arena.remove(handles[2]);
        let map = ProjectedSpatialMap::build(&arena, &handles);
        assert_eq!(map.len(), 4);
        assert_eq!(
            map.view_for(DVec3::new(2.4, 0.0, 0.0), DVec3::new(2.6, 0.0, 0.0))
                .count(),
            0
        );
    }
}
