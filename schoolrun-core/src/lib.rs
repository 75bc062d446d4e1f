//! Core domain types and algorithms for the school-run routing engine.
//!
//! The crate is free of I/O. It orders pickups into a [`Manifest`], turns
//! manifests into [`ResolvedRoute`]s through a [`PathResolver`], derives
//! turn-by-turn guidance and detects when a vehicle drifts off its route.
//! Network-backed directions live in `schoolrun-data` and the per-vehicle
//! orchestration lives in `schoolrun-navigator`.
//!
//! Coordinates are [`geo::Coord`] values with `x = longitude` and
//! `y = latitude`; build them with [`geodesy::lat_lng`] to avoid mixing the
//! two up.

#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]

mod account;
mod conformance;
pub mod directions;
pub mod geodesy;
mod guidance;
mod position;
mod resolver;
mod route;
mod sequencer;
mod stop;
mod subject;
#[cfg(any(test, feature = "test-support"))]
#[cfg_attr(docsrs, doc(cfg(feature = "test-support")))]
pub mod test_support;

pub use account::{Account, AccountError, AdminProfile, DriverProfile, PassengerProfile, Role};
pub use conformance::{ConformanceConfig, distance_from_route, is_off_route};
pub use directions::{DirectionsError, DirectionsProvider};
pub use guidance::{
    GuidanceConfig, NavigationInstruction, TurnKind, classify_turn, next_instruction,
    route_instructions,
};
pub use position::{
    Position, PositionCallback, PositionError, PositionErrorCallback, PositionSource,
    Subscription,
};
pub use resolver::{PathResolver, ProviderResolver, StraightLineResolver, waypoints};
pub use route::{ResolvedRoute, route_eta_minutes};
pub use sequencer::{NearestNeighbourSequencer, Sequencer, SequencerConfig};
pub use stop::{Manifest, SCHOOL_STOP_ID, Stop, StopEta, StopKind};
pub use subject::{Subject, SubjectStatus};
