//! Per-vehicle orchestration for the school-run routing engine.
//!
//! [`VehicleNavigator`] ties the pure algorithms in `schoolrun-core`
//! together: it re-sequences pickups on every event, resolves the manifest
//! into a drivable route without blocking position updates, keeps guidance
//! pointed at the last known-good route and polls for drift on a
//! [`PeriodicTask`]. A [`Fleet`] groups navigators for hosts that drive more
//! than one vehicle, and [`SimulatedMover`] stands in for GPS in demos.
//!
//! Resolution and polling spawn onto the ambient Tokio runtime.

#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]

mod config;
mod error;
mod fleet;
mod navigator;
mod schedule;
mod simulator;

pub use config::NavigatorConfig;
pub use error::NavigatorError;
pub use fleet::Fleet;
pub use navigator::{
    ConformanceCheck, NavigationSnapshot, Phase, ResolutionOutcome, ResolveReason,
    VehicleNavigator,
};
pub use schedule::PeriodicTask;
pub use simulator::{SimulatedMover, SimulatedWalk, SimulatorConfig};
