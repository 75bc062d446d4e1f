//! Turn an ordered stop sequence into a drivable path.
//!
//! Two interchangeable strategies implement [`PathResolver`]:
//!
//! - [`ProviderResolver`] asks a [`DirectionsProvider`] for the best route and
//!   maps every failure to `None`, optionally falling back to straight lines.
//! - [`StraightLineResolver`] connects the waypoints directly and never
//!   touches the network.
//!
//! Each call builds a complete route; nothing is merged with earlier results.

use async_trait::async_trait;
use geo::Coord;
use log::{debug, warn};

use crate::geodesy::{DEFAULT_AVERAGE_SPEED_KMH, is_valid_coordinate};
use crate::{DirectionsProvider, ResolvedRoute};

/// Resolve `origin → waiting… → destination` into a [`ResolvedRoute`].
#[async_trait]
pub trait PathResolver: Send + Sync {
    /// Build a route, or `None` when no route can be produced.
    async fn resolve(
        &self,
        origin: Coord<f64>,
        waiting: &[Coord<f64>],
        destination: Coord<f64>,
    ) -> Option<ResolvedRoute>;
}

#[async_trait]
impl<R> PathResolver for std::sync::Arc<R>
where
    R: PathResolver + ?Sized,
{
    async fn resolve(
        &self,
        origin: Coord<f64>,
        waiting: &[Coord<f64>],
        destination: Coord<f64>,
    ) -> Option<ResolvedRoute> {
        (**self).resolve(origin, waiting, destination).await
    }
}

/// Assemble the waypoint list, dropping malformed pickups.
///
/// Returns `None` when the origin or destination is malformed.
#[must_use]
pub fn waypoints(
    origin: Coord<f64>,
    waiting: &[Coord<f64>],
    destination: Coord<f64>,
) -> Option<Vec<Coord<f64>>> {
    if !is_valid_coordinate(origin) || !is_valid_coordinate(destination) {
        warn!("cannot resolve a path from {origin:?} to {destination:?}: malformed endpoint");
        return None;
    }
    let mut points = Vec::with_capacity(waiting.len() + 2);
    points.push(origin);
    for &location in waiting {
        if is_valid_coordinate(location) {
            points.push(location);
        } else {
            warn!("dropping malformed waypoint {location:?}");
        }
    }
    points.push(destination);
    Some(points)
}

/// Fallback strategy joining waypoints with straight lines.
///
/// # Examples
/// ```
/// use schoolrun_core::{StraightLineResolver, geodesy::lat_lng};
///
/// let resolver = StraightLineResolver::default();
/// let route = resolver
///     .resolve_now(lat_lng(0.0, 0.0), &[lat_lng(0.0, 0.01)], lat_lng(0.0, 0.02))
///     .expect("straight lines always resolve");
/// assert_eq!(route.path().len(), 3);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StraightLineResolver {
    average_speed_kmh: f64,
}

impl Default for StraightLineResolver {
    fn default() -> Self {
        Self::new(DEFAULT_AVERAGE_SPEED_KMH)
    }
}

impl StraightLineResolver {
    /// Construct a resolver timing legs at `average_speed_kmh`.
    #[must_use]
    pub const fn new(average_speed_kmh: f64) -> Self {
        Self { average_speed_kmh }
    }

    /// Resolve synchronously; the async trait method delegates here.
    #[must_use]
    pub fn resolve_now(
        &self,
        origin: Coord<f64>,
        waiting: &[Coord<f64>],
        destination: Coord<f64>,
    ) -> Option<ResolvedRoute> {
        let points = waypoints(origin, waiting, destination)?;
        ResolvedRoute::straight_line(&points, self.average_speed_kmh)
    }
}

#[async_trait]
impl PathResolver for StraightLineResolver {
    async fn resolve(
        &self,
        origin: Coord<f64>,
        waiting: &[Coord<f64>],
        destination: Coord<f64>,
    ) -> Option<ResolvedRoute> {
        self.resolve_now(origin, waiting, destination)
    }
}

/// Preferred strategy backed by an external [`DirectionsProvider`].
///
/// Provider failures are logged and mapped to `None` so the caller can keep
/// its previous route. With [`ProviderResolver::with_fallback`] a straight
/// line route is produced instead.
#[derive(Debug, Clone)]
pub struct ProviderResolver<P> {
    provider: P,
    fallback: Option<StraightLineResolver>,
}

impl<P> ProviderResolver<P>
where
    P: DirectionsProvider,
{
    /// Wrap `provider` without a fallback.
    #[must_use]
    pub const fn new(provider: P) -> Self {
        Self {
            provider,
            fallback: None,
        }
    }

    /// Fall back to straight lines when the provider fails.
    #[must_use]
    pub const fn with_fallback(mut self, fallback: StraightLineResolver) -> Self {
        self.fallback = Some(fallback);
        self
    }

    /// Borrow the wrapped provider.
    #[must_use]
    pub const fn provider(&self) -> &P {
        &self.provider
    }
}

#[async_trait]
impl<P> PathResolver for ProviderResolver<P>
where
    P: DirectionsProvider,
{
    async fn resolve(
        &self,
        origin: Coord<f64>,
        waiting: &[Coord<f64>],
        destination: Coord<f64>,
    ) -> Option<ResolvedRoute> {
        let points = waypoints(origin, waiting, destination)?;
        match self.provider.route(&points).await {
            Ok(route) => Some(route),
            Err(err) => {
                warn!("directions provider failed: {err}");
                self.fallback.and_then(|fallback| {
                    debug!("using straight-line fallback for {} waypoints", points.len());
                    ResolvedRoute::straight_line(&points, fallback.average_speed_kmh)
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DirectionsError;
    use crate::geodesy::lat_lng;
    use crate::test_support::StubDirectionsProvider;

    fn origin() -> Coord<f64> {
        lat_lng(0.0, 0.0)
    }

    fn school() -> Coord<f64> {
        lat_lng(0.0, 0.03)
    }

    #[tokio::test]
    async fn provider_route_is_returned() {
        let resolver = ProviderResolver::new(StubDirectionsProvider::straight_line());
        let route = resolver
            .resolve(origin(), &[lat_lng(0.0, 0.01)], school())
            .await
            .expect("stub returns a route");
        assert_eq!(route.path().len(), 3);
    }

    #[tokio::test]
    async fn provider_failure_maps_to_none() {
        let resolver = ProviderResolver::new(StubDirectionsProvider::with_error(
            DirectionsError::NoRoute,
        ));
        assert!(resolver.resolve(origin(), &[], school()).await.is_none());
    }

    #[tokio::test]
    async fn provider_failure_uses_fallback_when_configured() {
        let resolver = ProviderResolver::new(StubDirectionsProvider::with_error(
            DirectionsError::Timeout {
                url: "http://example.com/route/v1/driving".to_owned(),
                timeout_secs: 30,
            },
        ))
        .with_fallback(StraightLineResolver::default());
        let route = resolver
            .resolve(origin(), &[lat_lng(0.0, 0.01)], school())
            .await
            .expect("fallback produces a straight line");
        assert_eq!(
            route.path(),
            [origin(), lat_lng(0.0, 0.01), school()].as_slice()
        );
    }

    #[tokio::test]
    async fn malformed_pickups_are_dropped() {
        let resolver = StraightLineResolver::default();
        let route = resolver
            .resolve(origin(), &[lat_lng(f64::INFINITY, 0.0)], school())
            .await
            .expect("remaining waypoints still resolve");
        assert_eq!(route.path(), [origin(), school()].as_slice());
    }

    #[tokio::test]
    async fn malformed_origin_resolves_to_none() {
        let resolver = StraightLineResolver::default();
        assert!(
            resolver
                .resolve(lat_lng(f64::NAN, 0.0), &[], school())
                .await
                .is_none()
        );
    }
}
