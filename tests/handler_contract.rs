//! The driver rejects handlers that do not spend displacement.

use glam::{DVec2, DVec3};
use mockall::mock;
use pointplane::{
    Driver, ErrorKind, EventHandler, InAir, PhysicsSettings, PointPlaneError, Remainder,
    SideCrossing, State, TransferOutcome, Triangle,
};
use test_utils::meshes::FlatSquare;

mock! {
    pub Handler {}
    impl EventHandler for Handler {
        fn on_triangle_hit(
            &self,
            triangle: &Triangle,
            limit: DVec3,
            intersection: DVec2,
            target: DVec3,
        ) -> Remainder;
        fn on_transfer_absent_link(
            &self,
            triangle: &Triangle,
            crossing: &SideCrossing,
            target: DVec3,
        ) -> Remainder;
        fn on_transfer(
            &self,
            from: &Triangle,
            crossing: &SideCrossing,
            to: &Triangle,
            target: DVec3,
        ) -> TransferOutcome;
    }
}

fn falling_onto_lower() -> State {
    State::InAir(InAir {
        location: DVec3::new(0.75, 0.25, 1.0),
        displacement: DVec3::new(0.0, 0.0, -2.0),
    })
}

#[test]
fn growing_displacement_is_an_invalid_argument() {
    let square = FlatSquare::linked();
    let driver = square.driver();
    let mut handler = MockHandler::new();
    handler
        .expect_on_triangle_hit()
        .times(1)
        .returning(|_, _, _, _| Remainder::Air(DVec3::new(0.0, 0.0, -100.0)));

    let error = driver
        .resolve(&square.arena, falling_onto_lower(), &handler)
        .expect_err("displacement grew");
    assert!(matches!(
        error,
        PointPlaneError::IncreasingDisplacement { .. }
    ));
    assert_eq!(error.kind(), ErrorKind::InvalidArgument);
}

#[test]
fn non_finite_remainder_is_rejected() {
    let square = FlatSquare::linked();
    let driver = square.driver();
    let mut handler = MockHandler::new();
    handler
        .expect_on_triangle_hit()
        .times(1)
        .returning(|_, _, _, _| Remainder::Segment(DVec2::new(f64::NAN, 0.0)));

    assert_eq!(
        driver.resolve(&square.arena, falling_onto_lower(), &handler),
        Err(PointPlaneError::NonFiniteDisplacement)
    );
}

#[test]
fn unspent_displacement_hits_the_step_limit() {
    let square = FlatSquare::linked();
    let mut driver = Driver::new(PhysicsSettings {
        max_steps: 4,
        ..PhysicsSettings::default()
    });
    driver.add_link(square.lower);
    driver.add_link(square.upper);
    driver.update(&square.arena);
    let mut handler = MockHandler::new();
    handler
        .expect_on_triangle_hit()
        .times(4)
        .returning(|_, _, _, _| Remainder::Air(DVec3::new(0.0, 0.0, -2.0)));

    let error = driver
        .resolve(&square.arena, falling_onto_lower(), &handler)
        .expect_err("the point never settles");
    assert_eq!(error, PointPlaneError::StepLimitExceeded { steps: 4 });
    assert_eq!(error.kind(), ErrorKind::InvalidOperation);
}
