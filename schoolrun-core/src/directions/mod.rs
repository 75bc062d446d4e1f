//! Fetch drivable routes through ordered waypoints.
//!
//! The `DirectionsProvider` trait abstracts an external turn-by-turn
//! directions service. Callers supply the ordered waypoints (origin, open
//! pickups, destination) and receive the provider's best
//! [`ResolvedRoute`](crate::ResolvedRoute).
//!
//! Errors are returned when inputs are invalid, e.g. fewer than two
//! waypoints, or when the service cannot produce a route.

mod error;
mod provider;

pub use error::DirectionsError;
pub use provider::DirectionsProvider;
