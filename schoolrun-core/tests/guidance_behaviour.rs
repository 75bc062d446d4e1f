//! Behavioural tests for next-instruction guidance.

use geo::Coord;
use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};
use std::cell::RefCell;
use schoolrun_core::{
    GuidanceConfig, NavigationInstruction, TurnKind, geodesy::lat_lng, next_instruction,
};

#[fixture]
fn path() -> RefCell<Vec<Coord<f64>>> {
    RefCell::new(Vec::new())
}

#[fixture]
fn position() -> RefCell<Coord<f64>> {
    RefCell::new(lat_lng(0.0, 0.0))
}

#[fixture]
fn instruction() -> RefCell<Option<NavigationInstruction>> {
    RefCell::new(None)
}

#[given("a straight path heading east")]
fn straight_path(#[from(path)] path: &RefCell<Vec<Coord<f64>>>) {
    *path.borrow_mut() = vec![lat_lng(0.0, 0.0), lat_lng(0.0, 0.01)];
}

#[given("a path heading east then north")]
fn corner_path(#[from(path)] path: &RefCell<Vec<Coord<f64>>>) {
    *path.borrow_mut() = vec![lat_lng(0.0, 0.0), lat_lng(0.0, 0.01), lat_lng(0.01, 0.01)];
}

#[given("a path with a single vertex")]
fn single_vertex(#[from(path)] path: &RefCell<Vec<Coord<f64>>>) {
    *path.borrow_mut() = vec![lat_lng(0.0, 0.0)];
}

#[given("the vehicle is a few metres from the end")]
fn near_end(#[from(position)] position: &RefCell<Coord<f64>>) {
    *position.borrow_mut() = lat_lng(0.0, 0.0098);
}

#[given("the vehicle is approaching the corner")]
fn approaching_corner(#[from(position)] position: &RefCell<Coord<f64>>) {
    *position.borrow_mut() = lat_lng(0.0, 0.009);
}

#[given("the vehicle is at the origin")]
fn at_origin(#[from(position)] position: &RefCell<Coord<f64>>) {
    *position.borrow_mut() = lat_lng(0.0, 0.0);
}

#[when("the next instruction is requested")]
fn request_instruction(
    #[from(path)] path: &RefCell<Vec<Coord<f64>>>,
    #[from(position)] position: &RefCell<Coord<f64>>,
    #[from(instruction)] instruction: &RefCell<Option<NavigationInstruction>>,
) {
    *instruction.borrow_mut() = next_instruction(
        *position.borrow(),
        &path.borrow(),
        "School",
        &GuidanceConfig::default(),
    );
}

#[then("the instruction is to arrive")]
fn is_arrive(#[from(instruction)] instruction: &RefCell<Option<NavigationInstruction>>) {
    let kind = instruction.borrow().as_ref().map(|i| i.kind);
    assert_eq!(kind, Some(TurnKind::Arrive));
}

#[then("the instruction is to turn left")]
fn is_left(#[from(instruction)] instruction: &RefCell<Option<NavigationInstruction>>) {
    let kind = instruction.borrow().as_ref().map(|i| i.kind);
    assert_eq!(kind, Some(TurnKind::TurnLeft));
}

#[then("no instruction is given")]
fn is_none(#[from(instruction)] instruction: &RefCell<Option<NavigationInstruction>>) {
    assert!(instruction.borrow().is_none());
}

#[scenario(path = "tests/features/guidance.feature", index = 0)]
fn arriving(
    path: RefCell<Vec<Coord<f64>>>,
    position: RefCell<Coord<f64>>,
    instruction: RefCell<Option<NavigationInstruction>>,
) {
    let _ = (path, position, instruction);
}

#[scenario(path = "tests/features/guidance.feature", index = 1)]
fn turning_left(
    path: RefCell<Vec<Coord<f64>>>,
    position: RefCell<Coord<f64>>,
    instruction: RefCell<Option<NavigationInstruction>>,
) {
    let _ = (path, position, instruction);
}

#[scenario(path = "tests/features/guidance.feature", index = 2)]
fn degenerate_path(
    path: RefCell<Vec<Coord<f64>>>,
    position: RefCell<Coord<f64>>,
    instruction: RefCell<Option<NavigationInstruction>>,
) {
    let _ = (path, position, instruction);
}
