//! Facade crate for the school-run routing engine.
//!
//! This crate re-exports the core domain types and algorithms, and exposes
//! the HTTP directions provider and the per-vehicle navigator behind feature
//! flags.

#![forbid(unsafe_code)]

pub use schoolrun_core::{
    Account, AccountError, AdminProfile, ConformanceConfig, DirectionsError, DirectionsProvider,
    DriverProfile, GuidanceConfig, Manifest, NavigationInstruction, NearestNeighbourSequencer,
    PassengerProfile, PathResolver, Position, PositionError, PositionSource, ProviderResolver,
    ResolvedRoute, Role, SCHOOL_STOP_ID, Sequencer, SequencerConfig, Stop, StopEta, StopKind,
    StraightLineResolver, Subject, SubjectStatus, Subscription, TurnKind, classify_turn,
    distance_from_route, geodesy, is_off_route, next_instruction, route_eta_minutes,
    route_instructions, waypoints,
};

#[cfg(feature = "http-directions")]
pub use schoolrun_data::routing::{
    HttpDirectionsProvider, HttpDirectionsProviderConfig, ProviderBuildError,
};

#[cfg(feature = "navigator")]
pub use schoolrun_navigator::{
    ConformanceCheck, Fleet, NavigationSnapshot, NavigatorConfig, NavigatorError, PeriodicTask,
    Phase, ResolutionOutcome, ResolveReason, SimulatedMover, SimulatedWalk, SimulatorConfig,
    VehicleNavigator,
};
