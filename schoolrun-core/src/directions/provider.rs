//! Directions provider trait for ordered waypoint lists.

use async_trait::async_trait;
use geo::Coord;

use crate::ResolvedRoute;

use super::error::DirectionsError;

/// Fetch the best drivable route through ordered waypoints.
///
/// `waypoints[0]` is the vehicle position and the last element is the
/// destination; everything between is visited in the given order.
///
/// # Examples
///
/// ```rust
/// use std::time::Duration;
/// use async_trait::async_trait;
/// use geo::{Coord, LineString};
/// use schoolrun_core::{DirectionsError, DirectionsProvider, ResolvedRoute};
///
/// struct StraightProvider;
///
/// #[async_trait]
/// impl DirectionsProvider for StraightProvider {
///     async fn route(&self, waypoints: &[Coord<f64>]) -> Result<ResolvedRoute, DirectionsError> {
///         if waypoints.len() < 2 {
///             return Err(DirectionsError::TooFewWaypoints);
///         }
///         Ok(ResolvedRoute::new(
///             LineString::from(waypoints.to_vec()),
///             0.0,
///             Duration::ZERO,
///         ))
///     }
/// }
/// ```
#[async_trait]
pub trait DirectionsProvider: Send + Sync {
    /// Return the provider's best route through `waypoints`.
    ///
    /// Implementations must return `Err(DirectionsError::TooFewWaypoints)`
    /// when fewer than two waypoints are supplied.
    async fn route(&self, waypoints: &[Coord<f64>]) -> Result<ResolvedRoute, DirectionsError>;
}

#[async_trait]
impl<P> DirectionsProvider for std::sync::Arc<P>
where
    P: DirectionsProvider + ?Sized,
{
    async fn route(&self, waypoints: &[Coord<f64>]) -> Result<ResolvedRoute, DirectionsError> {
        (**self).route(waypoints).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::Coord;

    use crate::geodesy::lat_lng;
    use crate::test_support::StubDirectionsProvider;

    fn sample_waypoints() -> Vec<Coord<f64>> {
        vec![lat_lng(-23.56, -46.65), lat_lng(-23.55, -46.63)]
    }

    #[tokio::test]
    async fn stub_echoes_waypoints_as_geometry() {
        let provider = StubDirectionsProvider::straight_line();
        let route = provider
            .route(&sample_waypoints())
            .await
            .expect("expected a route from the straight-line stub");
        assert_eq!(route.path(), sample_waypoints().as_slice());
    }

    #[tokio::test]
    async fn errors_on_single_waypoint() {
        let provider = StubDirectionsProvider::straight_line();
        let err = provider
            .route(&sample_waypoints()[..1])
            .await
            .expect_err("expected TooFewWaypoints for a single waypoint");
        assert_eq!(err, DirectionsError::TooFewWaypoints);
    }

    #[tokio::test]
    async fn shared_provider_delegates() {
        let provider = std::sync::Arc::new(StubDirectionsProvider::with_error(DirectionsError::NoRoute));
        let err = provider
            .route(&sample_waypoints())
            .await
            .expect_err("stub configured to fail");
        assert_eq!(err, DirectionsError::NoRoute);
    }
}
