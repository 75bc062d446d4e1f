//! Behavioural tests for [`VehicleNavigator`].
//!
//! Events are delivered outside the Tokio runtime so no background
//! resolution starts; each "resolved" step drives one resolution to
//! completion on the scenario's runtime.

#![expect(
    clippy::expect_used,
    reason = "behaviour tests use expect for readable failures"
)]

use std::cell::{Cell, RefCell};
use std::sync::Arc;

use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};
use schoolrun_core::geodesy::lat_lng;
use schoolrun_core::test_support::{FixedResolver, FixedResponse, ManualPositionSource};
use schoolrun_core::{Position, PositionError, Subject, Subscription};
use schoolrun_navigator::{
    ConformanceCheck, NavigationSnapshot, NavigatorConfig, Phase, ResolutionOutcome,
    ResolveReason, VehicleNavigator,
};
use tokio::runtime::Runtime;

struct NavigationWorld {
    runtime: Runtime,
    resolver: Arc<FixedResolver>,
    source: ManualPositionSource,
    navigator: VehicleNavigator,
    _subscription: Subscription,
    previous: RefCell<Option<NavigationSnapshot>>,
    outcome: Cell<Option<ResolutionOutcome>>,
    check: Cell<Option<ConformanceCheck>>,
}

impl NavigationWorld {
    fn new() -> Self {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .expect("build scenario runtime");
        let resolver = Arc::new(FixedResolver::straight_line());
        let config = NavigatorConfig::new(lat_lng(0.0, 0.03), "School")
            .with_fallback_position(lat_lng(0.0, 0.0));
        let navigator = VehicleNavigator::new("van-1", config, Arc::clone(&resolver));
        let source = ManualPositionSource::default();
        let subscription = navigator.attach(&source);
        Self {
            runtime,
            resolver,
            source,
            navigator,
            _subscription: subscription,
            previous: RefCell::new(None),
            outcome: Cell::new(None),
            check: Cell::new(None),
        }
    }

    fn resolve(&self) {
        let outcome = self
            .runtime
            .block_on(self.navigator.resolve_now(ResolveReason::Manual));
        self.outcome.set(Some(outcome));
    }

    fn snapshot(&self) -> NavigationSnapshot {
        self.navigator.snapshot()
    }
}

#[fixture]
fn world() -> NavigationWorld {
    NavigationWorld::new()
}

#[given("a vehicle bound for school with one waiting pupil")]
fn vehicle_with_pupil(world: &NavigationWorld) {
    world
        .navigator
        .set_roster(vec![Subject::waiting("ana", lat_lng(0.0, 0.01))]);
}

#[given("a route has been resolved")]
fn route_resolved(world: &NavigationWorld) {
    world.resolve();
    world.previous.replace(Some(world.snapshot()));
}

#[when("the route is resolved")]
fn resolve_route(world: &NavigationWorld) {
    world.resolve();
}

#[when("directions start failing")]
fn directions_fail(world: &NavigationWorld) {
    world.resolver.respond_with(FixedResponse::Fail);
}

#[when("the pupil stop is completed")]
fn pupil_collected(world: &NavigationWorld) {
    world
        .navigator
        .mark_stop_completed("stop-ana")
        .expect("ana is on the roster");
}

#[when("the vehicle reports a position beside the school")]
fn beside_school(world: &NavigationWorld) {
    world.source.push(Position::new(lat_lng(0.0, 0.0299)));
}

#[when("the vehicle reports a position one kilometre north")]
fn north_of_route(world: &NavigationWorld) {
    world.source.push(Position::new(lat_lng(0.009, 0.005)));
}

#[when("the position source reports the signal unavailable")]
fn signal_lost(world: &NavigationWorld) {
    world.source.fail(PositionError::Unavailable);
}

#[when("conformance is checked")]
fn check_conformance(world: &NavigationWorld) {
    let check = world
        .runtime
        .block_on(async { world.navigator.check_conformance() });
    world.check.set(Some(check));
}

#[then("the vehicle is guiding")]
fn is_guiding(world: &NavigationWorld) {
    assert_eq!(world.snapshot().phase, Phase::Guiding);
}

#[then("the manifest visits the pupil before the school")]
fn manifest_order(world: &NavigationWorld) {
    let snapshot = world.snapshot();
    let ids: Vec<&str> = snapshot
        .manifest
        .stops
        .iter()
        .map(|stop| stop.id.as_str())
        .collect();
    assert_eq!(ids, ["stop-ana", "school-dropoff"]);
}

#[then("the ETA is positive")]
fn eta_positive(world: &NavigationWorld) {
    let eta_minutes = world.snapshot().eta_minutes;
    assert!(eta_minutes > 0);
    assert_eq!(
        world.outcome.get(),
        Some(ResolutionOutcome::Applied { eta_minutes })
    );
}

#[then("the previous route is still shown")]
fn previous_route_kept(world: &NavigationWorld) {
    assert_eq!(world.outcome.get(), Some(ResolutionOutcome::Failed));
    let previous = world
        .previous
        .borrow()
        .clone()
        .expect("a route was resolved earlier");
    let current = world.snapshot();
    assert!(current.geometry.is_some());
    assert_eq!(current.geometry, previous.geometry);
    assert_eq!(current.eta_minutes, previous.eta_minutes);
}

#[then("the vehicle has arrived")]
fn has_arrived(world: &NavigationWorld) {
    assert_eq!(world.snapshot().phase, Phase::Arrived);
}

#[then("the instruction announces the school")]
fn announces_school(world: &NavigationWorld) {
    let instruction = world
        .snapshot()
        .instruction
        .expect("guidance is available at the school");
    assert_eq!(instruction.text, "You have arrived: School");
}

#[then("the vehicle is off route")]
fn is_off_route(world: &NavigationWorld) {
    assert!(world.snapshot().off_route);
}

#[then("a new resolution was started")]
fn resolution_started(world: &NavigationWorld) {
    assert!(matches!(
        world.check.get(),
        Some(ConformanceCheck::OffRoute {
            resolution_started: true,
            ..
        })
    ));
}

#[then("the position error is reported")]
fn error_reported(world: &NavigationWorld) {
    assert_eq!(
        world.snapshot().position_error,
        Some(PositionError::Unavailable)
    );
}

#[scenario(path = "tests/features/vehicle_navigation.feature", index = 0)]
fn planning_a_route(world: NavigationWorld) {
    let _ = world;
}

#[scenario(path = "tests/features/vehicle_navigation.feature", index = 1)]
fn keeping_the_previous_route(world: NavigationWorld) {
    let _ = world;
}

#[scenario(path = "tests/features/vehicle_navigation.feature", index = 2)]
fn arriving_at_school(world: NavigationWorld) {
    let _ = world;
}

#[scenario(path = "tests/features/vehicle_navigation.feature", index = 3)]
fn drifting_off_route(world: NavigationWorld) {
    let _ = world;
}

#[scenario(path = "tests/features/vehicle_navigation.feature", index = 4)]
fn losing_the_signal(world: NavigationWorld) {
    let _ = world;
}
