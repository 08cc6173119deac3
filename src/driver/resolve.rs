//! The locomotion state machine.

use glam::{DVec2, DVec3};
use log::{debug, warn};

use crate::config::PhysicsSettings;
use crate::driver::{EventHandler, InAir, OnSegment, Remainder, State, TransferOutcome};
use crate::error::{PointPlaneError, Result};
use crate::frame_links::FrameLinkContainer;
use crate::mesh::{LinkHandle, MeshArena};

/// Resolves point movement against the committed mesh.
///
/// Mesh membership changes are staged with [`Driver::add_link`] and
/// [`Driver::remove_link`] and become visible after [`Driver::update`].
/// Resolution itself only reads the driver, so independent points can be
/// resolved in parallel once a frame's update has run.
#[derive(Clone, Debug, Default)]
pub struct Driver {
    links: FrameLinkContainer,
    settings: PhysicsSettings,
}

impl Driver {
    /// A driver with no links.
    #[must_use]
    pub fn new(settings: PhysicsSettings) -> Self {
        Self {
            links: FrameLinkContainer::new(),
            settings,
        }
    }

    /// Settings in effect.
    #[must_use]
    pub const fn settings(&self) -> &PhysicsSettings {
        &self.settings
    }

    /// The staged link set.
    #[must_use]
    pub const fn links(&self) -> &FrameLinkContainer {
        &self.links
    }

    /// Stage `link` for addition.
    pub fn add_link(&mut self, link: LinkHandle) {
        self.links.defer_addition_of(link);
    }

    /// Stage `link` for removal.
    pub fn remove_link(&mut self, link: LinkHandle) {
        self.links.defer_removal_of(link);
    }

    /// Forget every link.
    pub fn clear_links(&mut self) {
        self.links.clear();
    }

    /// Commit staged changes; call once per frame before resolving movement.
    pub fn update(&mut self, arena: &MeshArena) {
        self.links.update(arena);
    }

    /// Advance `state` until its displacement is spent.
    ///
    /// # Errors
    /// - [`PointPlaneError::UncommittedChanges`] when links are staged but
    ///   not yet committed.
    /// - [`PointPlaneError::NonFiniteDisplacement`] or
    ///   [`PointPlaneError::IncreasingDisplacement`] when the starting state
    ///   or `handler` breaks the displacement contract.
    /// - [`PointPlaneError::ExpiredLink`] when a tracked point's triangle has
    ///   been unloaded.
    /// - [`PointPlaneError::StepLimitExceeded`] when the displacement is not
    ///   spent within the configured number of steps.
    pub fn resolve<H>(&self, arena: &MeshArena, state: State, handler: &H) -> Result<State>
    where
        H: EventHandler + ?Sized,
    {
        if !state.displacement_is_finite() {
            return Err(PointPlaneError::NonFiniteDisplacement);
        }
        let tolerance = self.settings.tolerance();
        let mut current = state;
        for _ in 0..self.settings.max_steps {
            if current.is_settled(tolerance) {
                return Ok(current);
            }
            let next = self.step(arena, current, handler)?;
            verify_decreasing(&current, &next)?;
            current = next;
        }
        if current.is_settled(tolerance) {
            return Ok(current);
        }
        Err(PointPlaneError::StepLimitExceeded {
            steps: self.settings.max_steps,
        })
    }

    /// Perform a single state transition.
    ///
    /// # Errors
    /// Same as [`Driver::resolve`], except that the displacement contract is
    /// not checked.
    pub fn step<H>(&self, arena: &MeshArena, state: State, handler: &H) -> Result<State>
    where
        H: EventHandler + ?Sized,
    {
        match state {
            State::InAir(in_air) => self.step_in_air(arena, in_air, handler),
            State::OnSegment(on_segment) => step_on_segment(arena, on_segment, handler),
        }
    }

    fn step_in_air<H>(&self, arena: &MeshArena, in_air: InAir, handler: &H) -> Result<State>
    where
        H: EventHandler + ?Sized,
    {
        let InAir {
            location,
            displacement,
        } = in_air;
        let target = location + displacement;
        let nearest = self
            .links
            .view_for(location, target)?
            .filter_map(|link| {
                let triangle = arena.triangle(link)?;
                let hit = triangle.limit_with_intersection(location, target)?;
                Some((link, triangle, hit))
            })
            .min_by(|lhs, rhs| {
                lhs.2
                    .limit
                    .distance_squared(location)
                    .total_cmp(&rhs.2.limit.distance_squared(location))
            });
        let Some((link, triangle, hit)) = nearest else {
            return Ok(State::InAir(InAir {
                location: target,
                displacement: DVec3::ZERO,
            }));
        };
        debug!("free flight from {location} meets {link}");
        Ok(
            match handler.on_triangle_hit(triangle, hit.limit, hit.intersection, target) {
                Remainder::Segment(remaining) => State::OnSegment(OnSegment {
                    link,
                    invert_normal: triangle.normal().dot(displacement) > 0.0,
                    location: hit.intersection,
                    displacement: remaining,
                }),
                Remainder::Air(remaining) => State::InAir(InAir {
                    location: hit.limit,
                    displacement: remaining,
                }),
            },
        )
    }
}

fn step_on_segment<H>(arena: &MeshArena, mut on_segment: OnSegment, handler: &H) -> Result<State>
where
    H: EventHandler + ?Sized,
{
    let triangle = on_segment.triangle(arena)?;
    if !triangle.contains_point(on_segment.location) {
        warn!("{} drifted outside its triangle; clamping", on_segment.link);
        on_segment.location =
            triangle.closest_contained_point(triangle.point_at(on_segment.location));
    }
    let target = on_segment.location + on_segment.displacement;
    let Some(crossing) = triangle.check_for_side_crossing(on_segment.location, target) else {
        return Ok(State::OnSegment(OnSegment {
            location: target,
            displacement: DVec2::ZERO,
            ..on_segment
        }));
    };
    let target_in_world = triangle.point_at(target);
    let stay_at_edge = |remaining: DVec2| {
        State::OnSegment(OnSegment {
            location: crossing.inside,
            displacement: remaining,
            ..on_segment
        })
    };
    let fall_from_edge = |remaining: DVec3| {
        State::InAir(InAir {
            location: triangle.point_at(crossing.outside),
            displacement: remaining,
        })
    };

    let neighbour = arena
        .transfers_to(on_segment.link, crossing.side)?
        .and_then(|transfer| arena.triangle(transfer.target).map(|to| (transfer, to)));
    let Some((transfer, next_triangle)) = neighbour else {
        return Ok(
            match handler.on_transfer_absent_link(triangle, &crossing, target_in_world) {
                Remainder::Segment(remaining) => stay_at_edge(remaining),
                Remainder::Air(remaining) => fall_from_edge(remaining),
            },
        );
    };
    Ok(
        match handler.on_transfer(triangle, &crossing, next_triangle, target_in_world) {
            TransferOutcome::Segment {
                transfers: true,
                remaining,
            } => {
                debug!(
                    "{} crosses {} onto {}",
                    on_segment.link, crossing.side, transfer.target
                );
                State::OnSegment(OnSegment {
                    link: transfer.target,
                    invert_normal: on_segment.invert_normal != transfer.inverts_normal,
                    location: next_triangle
                        .closest_contained_point(triangle.point_at(crossing.outside)),
                    displacement: remaining,
                })
            }
            TransferOutcome::Segment {
                transfers: false,
                remaining,
            } => stay_at_edge(remaining),
            TransferOutcome::Air(remaining) => fall_from_edge(remaining),
        },
    )
}

fn verify_decreasing(previous: &State, next: &State) -> Result<()> {
    if !next.displacement_is_finite() {
        return Err(PointPlaneError::NonFiniteDisplacement);
    }
    let before = previous.displacement_length_squared();
    let after = next.displacement_length_squared();
    if after > before {
        return Err(PointPlaneError::IncreasingDisplacement {
            previous: before,
            next: after,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::{AbsorbingHandler, SlidingHandler};
    use crate::mesh::RegionId;
    use crate::triangle::Triangle;
    use approx::assert_relative_eq;

    fn ramp_world() -> (MeshArena, Driver, LinkHandle) {
        let mut arena = MeshArena::new();
        let triangle = Triangle::new(
            DVec3::ZERO,
            DVec3::new(4.0, 0.0, 0.0),
            DVec3::new(0.0, 4.0, 0.0),
        )
        .expect("valid triangle");
        let link = arena.insert(RegionId(1), triangle);
        let mut driver = Driver::default();
        driver.add_link(link);
        driver.update(&arena);
        (arena, driver, link)
    }

    #[test]
    fn empty_sky_moves_straight_to_target() {
        let arena = MeshArena::new();
        let driver = Driver::default();
        let state = State::InAir(InAir {
            location: DVec3::ZERO,
            displacement: DVec3::new(1.0, 2.0, 3.0),
        });
        let resolved = driver
            .resolve(&arena, state, &AbsorbingHandler)
            .expect("free flight resolves");
        assert_eq!(
            resolved,
            State::InAir(InAir {
                location: DVec3::new(1.0, 2.0, 3.0),
                displacement: DVec3::ZERO,
            })
        );
    }

    #[test]
    fn landing_from_above_keeps_normal_sense() {
        let (arena, driver, link) = ramp_world();
        let state = State::InAir(InAir {
            location: DVec3::new(1.0, 1.0, 2.0),
            displacement: DVec3::new(0.0, 0.0, -4.0),
        });
        let resolved = driver
            .resolve(&arena, state, &AbsorbingHandler)
            .expect("landing resolves");
        let State::OnSegment(on_segment) = resolved else {
            panic!("expected to land, got {resolved:?}");
        };
        assert_eq!(on_segment.link, link);
        assert!(!on_segment.invert_normal);
        assert_relative_eq!(on_segment.location.x, 1.0, epsilon = 1e-9);
        assert_relative_eq!(on_segment.location.y, 1.0, epsilon = 1e-9);
    }

    #[test]
    fn landing_from_below_inverts_normal() {
        let (arena, driver, _) = ramp_world();
        let state = State::InAir(InAir {
            location: DVec3::new(1.0, 1.0, -2.0),
            displacement: DVec3::new(0.0, 0.0, 4.0),
        });
        let resolved = driver
            .resolve(&arena, state, &AbsorbingHandler)
            .expect("landing resolves");
        assert!(matches!(
            resolved,
            State::OnSegment(OnSegment {
                invert_normal: true,
                ..
            })
        ));
    }

    #[test]
    fn sliding_off_an_unlinked_edge_falls() {
        let (arena, driver, link) = ramp_world();
        let state = State::OnSegment(OnSegment {
            link,
            invert_normal: false,
            location: DVec2::new(1.0, 1.0),
            displacement: DVec2::new(0.0, -2.0),
        });
        let resolved = driver
            .resolve(&arena, state, &SlidingHandler)
            .expect("falls off the edge");
        let State::InAir(in_air) = resolved else {
            panic!("expected free flight, got {resolved:?}");
        };
        assert_relative_eq!(in_air.location.y, -1.0, epsilon = 1e-3);
        assert_relative_eq!(in_air.displacement.length(), 0.0);
    }

    #[test]
    fn staged_links_block_resolution() {
        let (arena, mut driver, link) = ramp_world();
        driver.remove_link(link);
        let state = State::InAir(InAir {
            location: DVec3::new(1.0, 1.0, 2.0),
            displacement: DVec3::new(0.0, 0.0, -4.0),
        });
        assert_eq!(
            driver.resolve(&arena, state, &AbsorbingHandler),
            Err(PointPlaneError::UncommittedChanges)
        );
    }

    #[test]
    fn non_finite_start_is_rejected() {
        let (arena, driver, _) = ramp_world();
        let state = State::InAir(InAir {
            location: DVec3::ZERO,
            displacement: DVec3::new(f64::NAN, 0.0, 0.0),
        });
        assert_eq!(
            driver.resolve(&arena, state, &AbsorbingHandler),
            Err(PointPlaneError::NonFiniteDisplacement)
        );
    }

    /// Handler replying with fixed outcomes.
    struct Scripted {
        hit: Remainder,
        absent: Remainder,
        transfer: TransferOutcome,
    }

    impl Default for Scripted {
        fn default() -> Self {
            Self {
                hit: Remainder::Segment(DVec2::ZERO),
                absent: Remainder::Air(DVec3::ZERO),
                transfer: TransferOutcome::Segment {
                    transfers: true,
                    remaining: DVec2::ZERO,
                },
            }
        }
    }

    impl EventHandler for Scripted {
        fn on_triangle_hit(&self, _: &Triangle, _: DVec3, _: DVec2, _: DVec3) -> Remainder {
            self.hit
        }

        fn on_transfer_absent_link(
            &self,
            _: &Triangle,
            _: &crate::triangle::SideCrossing,
            _: DVec3,
        ) -> Remainder {
            self.absent
        }

        fn on_transfer(
            &self,
            _: &Triangle,
            _: &crate::triangle::SideCrossing,
            _: &Triangle,
            _: DVec3,
        ) -> TransferOutcome {
            self.transfer
        }
    }

    /// Unit square split along its diagonal; `flip_upper` reverses the upper
    /// triangle's winding so the shared edge inverts the normal sense.
    fn square_world(flip_upper: bool) -> (MeshArena, Driver, LinkHandle, LinkHandle) {
        let mut arena = MeshArena::new();
        let lower = Triangle::new(DVec3::ZERO, DVec3::X, DVec3::new(1.0, 1.0, 0.0))
            .expect("valid triangle");
        let wound = Triangle::new(DVec3::ZERO, DVec3::new(1.0, 1.0, 0.0), DVec3::Y)
            .expect("valid triangle");
        let upper = if flip_upper { wound.flip() } else { wound };
        let lower_link = arena.insert(RegionId(0), lower);
        let upper_link = arena.insert(RegionId(0), upper);
        assert_eq!(arena.attach_unattached_matching_points(lower_link, upper_link), 2);
        let mut driver = Driver::default();
        driver.add_link(lower_link);
        driver.add_link(upper_link);
        driver.update(&arena);
        (arena, driver, lower_link, upper_link)
    }

    fn across_diagonal(link: LinkHandle, invert_normal: bool) -> State {
        State::OnSegment(OnSegment {
            link,
            invert_normal,
            location: DVec2::new(0.75, 0.25),
            displacement: DVec2::new(-0.5, 0.5),
        })
    }

    #[test]
    fn declined_transfer_stops_at_the_edge() {
        let (arena, driver, lower, _) = square_world(false);
        let handler = Scripted {
            transfer: TransferOutcome::Segment {
                transfers: false,
                remaining: DVec2::ZERO,
            },
            ..Scripted::default()
        };
        let resolved = driver
            .resolve(&arena, across_diagonal(lower, false), &handler)
            .expect("stops at the edge");
        let State::OnSegment(on_segment) = resolved else {
            panic!("expected to stay on the floor, got {resolved:?}");
        };
        assert_eq!(on_segment.link, lower);
        assert_relative_eq!(on_segment.location.x, 0.5, epsilon = 1e-3);
        assert_relative_eq!(on_segment.location.y, 0.5, epsilon = 1e-3);
        assert_eq!(on_segment.displacement, DVec2::ZERO);
    }

    #[test]
    fn linked_edge_can_be_left_in_free_flight() {
        let (arena, driver, lower, _) = square_world(false);
        let handler = Scripted {
            transfer: TransferOutcome::Air(DVec3::ZERO),
            ..Scripted::default()
        };
        let resolved = driver
            .resolve(&arena, across_diagonal(lower, false), &handler)
            .expect("lifts off at the edge");
        let State::InAir(in_air) = resolved else {
            panic!("expected free flight, got {resolved:?}");
        };
        assert_relative_eq!(in_air.location.distance(DVec3::new(0.5, 0.5, 0.0)), 0.0, epsilon = 1e-3);
        assert_eq!(in_air.displacement, DVec3::ZERO);
    }

    #[test]
    fn unlinked_edge_can_hold_the_point() {
        let (arena, driver, link) = ramp_world();
        let handler = Scripted {
            absent: Remainder::Segment(DVec2::ZERO),
            ..Scripted::default()
        };
        let state = State::OnSegment(OnSegment {
            link,
            invert_normal: false,
            location: DVec2::new(1.0, 1.0),
            displacement: DVec2::new(0.0, -2.0),
        });
        let resolved = driver
            .resolve(&arena, state, &handler)
            .expect("held at the edge");
        let State::OnSegment(on_segment) = resolved else {
            panic!("expected to stay on the ramp, got {resolved:?}");
        };
        assert_eq!(on_segment.link, link);
        assert_relative_eq!(on_segment.location.x, 1.0, epsilon = 1e-3);
        assert_relative_eq!(on_segment.location.y, 0.0, epsilon = 1e-3);
    }

    #[test]
    fn hit_answered_in_three_dimensions_stays_airborne_at_the_limit() {
        let (arena, driver, _) = ramp_world();
        let handler = Scripted {
            hit: Remainder::Air(DVec3::ZERO),
            ..Scripted::default()
        };
        let state = State::InAir(InAir {
            location: DVec3::new(1.0, 1.0, 2.0),
            displacement: DVec3::new(0.0, 0.0, -4.0),
        });
        let resolved = driver
            .resolve(&arena, state, &handler)
            .expect("stops short of the ramp");
        let State::InAir(in_air) = resolved else {
            panic!("expected free flight, got {resolved:?}");
        };
        assert!(in_air.location.z > 0.0, "limit stays above the plane");
        assert_relative_eq!(in_air.location.z, 0.0, epsilon = 1e-3);
        assert_relative_eq!(in_air.location.x, 1.0, epsilon = 1e-9);
    }

    #[test]
    fn inverting_edge_flips_normal_sense() {
        let (arena, driver, lower, upper) = square_world(true);
        for invert_normal in [false, true] {
            let resolved = driver
                .resolve(&arena, across_diagonal(lower, invert_normal), &AbsorbingHandler)
                .expect("crosses the diagonal");
            let State::OnSegment(on_segment) = resolved else {
                panic!("expected to stay on the floor, got {resolved:?}");
            };
            assert_eq!(on_segment.link, upper);
            assert_eq!(on_segment.invert_normal, !invert_normal);
        }
    }

    #[test]
    fn consistent_edge_keeps_normal_sense() {
        let (arena, driver, lower, upper) = square_world(false);
        let resolved = driver
            .resolve(&arena, across_diagonal(lower, true), &AbsorbingHandler)
            .expect("crosses the diagonal");
        assert!(matches!(
            resolved,
            State::OnSegment(OnSegment { link, invert_normal: true, .. }) if link == upper
        ));
    }

    #[test]
    fn nearest_of_stacked_floors_is_hit() {
        let mut arena = MeshArena::new();
        let floor = Triangle::new(
            DVec3::ZERO,
            DVec3::new(4.0, 0.0, 0.0),
            DVec3::new(0.0, 4.0, 0.0),
        )
        .expect("valid triangle");
        let low = arena.insert(RegionId(0), floor);
        let high = arena.insert(RegionId(0), floor.translate(DVec3::Z));
        let mut driver = Driver::default();
        driver.add_link(low);
        driver.add_link(high);
        driver.update(&arena);
        let state = State::InAir(InAir {
            location: DVec3::new(1.0, 1.0, 3.0),
            displacement: DVec3::new(0.0, 0.0, -5.0),
        });
        let resolved = driver
            .resolve(&arena, state, &AbsorbingHandler)
            .expect("lands");
        assert!(matches!(
            resolved,
            State::OnSegment(OnSegment { link, .. }) if link == high
        ));
    }

    #[test]
    fn unloaded_surface_is_reported() {
        let (mut arena, driver, link) = ramp_world();
        arena.unload_region(RegionId(1));
        let state = State::OnSegment(OnSegment {
            link,
            invert_normal: false,
            location: DVec2::new(1.0, 1.0),
            displacement: DVec2::new(0.5, 0.0),
        });
        let error = driver
            .resolve(&arena, state, &AbsorbingHandler)
            .expect_err("surface is gone");
        assert_eq!(error, PointPlaneError::ExpiredLink(link));
        assert_eq!(error.kind(), crate::error::ErrorKind::InvalidOperation);
    }

    #[test]
    fn drifted_location_is_clamped_before_moving() {
        let (arena, driver, link) = ramp_world();
        let state = State::OnSegment(OnSegment {
            link,
            invert_normal: false,
            location: DVec2::new(-1.0, 1.0),
            displacement: DVec2::new(0.5, 0.0),
        });
        let resolved = driver
            .resolve(&arena, state, &AbsorbingHandler)
            .expect("moves from the clamped location");
        let State::OnSegment(on_segment) = resolved else {
            panic!("expected to stay on the ramp, got {resolved:?}");
        };
        assert_relative_eq!(on_segment.location.x, 0.5, epsilon = 1e-9);
        assert_relative_eq!(on_segment.location.y, 1.0, epsilon = 1e-9);
    }
}
