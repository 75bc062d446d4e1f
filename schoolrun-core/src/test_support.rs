//! Deterministic doubles for unit and behaviour tests.
//!
//! None of these perform I/O. Each records how often it was called so tests
//! can assert on coalescing and retry behaviour.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use geo::Coord;

use crate::geodesy::DEFAULT_AVERAGE_SPEED_KMH;
use crate::{
    DirectionsError, DirectionsProvider, PathResolver, Position, PositionCallback, PositionError,
    PositionErrorCallback, PositionSource, ResolvedRoute, StraightLineResolver, Subscription,
};

#[derive(Debug, Clone)]
enum StubResponse {
    StraightLine,
    Route(ResolvedRoute),
    Error(DirectionsError),
}

/// `DirectionsProvider` returning a canned response.
#[derive(Debug)]
pub struct StubDirectionsProvider {
    response: StubResponse,
    calls: AtomicUsize,
    last_waypoints: Mutex<Vec<Coord<f64>>>,
}

impl StubDirectionsProvider {
    fn with_response(response: StubResponse) -> Self {
        Self {
            response,
            calls: AtomicUsize::new(0),
            last_waypoints: Mutex::new(Vec::new()),
        }
    }

    /// Echo the waypoints back as a straight-line route at 40 km/h.
    #[must_use]
    pub fn straight_line() -> Self {
        Self::with_response(StubResponse::StraightLine)
    }

    /// Always return `route`.
    #[must_use]
    pub fn with_route(route: ResolvedRoute) -> Self {
        Self::with_response(StubResponse::Route(route))
    }

    /// Always fail with `error`.
    #[must_use]
    pub fn with_error(error: DirectionsError) -> Self {
        Self::with_response(StubResponse::Error(error))
    }

    /// Number of `route` calls so far.
    #[must_use]
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Waypoints passed to the most recent call.
    #[must_use]
    pub fn last_waypoints(&self) -> Vec<Coord<f64>> {
        self.last_waypoints
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl DirectionsProvider for StubDirectionsProvider {
    async fn route(&self, waypoints: &[Coord<f64>]) -> Result<ResolvedRoute, DirectionsError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        waypoints.clone_into(
            &mut self
                .last_waypoints
                .lock()
                .unwrap_or_else(PoisonError::into_inner),
        );
        if waypoints.len() < 2 {
            return Err(DirectionsError::TooFewWaypoints);
        }
        match &self.response {
            StubResponse::StraightLine => {
                ResolvedRoute::straight_line(waypoints, DEFAULT_AVERAGE_SPEED_KMH)
                    .ok_or(DirectionsError::TooFewWaypoints)
            }
            StubResponse::Route(route) => Ok(route.clone()),
            StubResponse::Error(error) => Err(error.clone()),
        }
    }
}

/// What a [`FixedResolver`] answers with.
#[derive(Debug, Clone, PartialEq)]
pub enum FixedResponse {
    /// Join the waypoints with straight lines.
    StraightLine,
    /// Return this route regardless of input.
    Route(ResolvedRoute),
    /// Fail every call.
    Fail,
}

/// `PathResolver` with a switchable canned response.
#[derive(Debug)]
pub struct FixedResolver {
    response: Mutex<FixedResponse>,
    calls: AtomicUsize,
}

impl FixedResolver {
    /// Start with `response`.
    #[must_use]
    pub const fn new(response: FixedResponse) -> Self {
        Self {
            response: Mutex::new(response),
            calls: AtomicUsize::new(0),
        }
    }

    /// Start by joining waypoints with straight lines.
    #[must_use]
    pub const fn straight_line() -> Self {
        Self::new(FixedResponse::StraightLine)
    }

    /// Start by failing every call.
    #[must_use]
    pub const fn failing() -> Self {
        Self::new(FixedResponse::Fail)
    }

    /// Switch the response for subsequent calls.
    pub fn respond_with(&self, response: FixedResponse) {
        *self.response.lock().unwrap_or_else(PoisonError::into_inner) = response;
    }

    /// Number of `resolve` calls so far.
    #[must_use]
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PathResolver for FixedResolver {
    async fn resolve(
        &self,
        origin: Coord<f64>,
        waiting: &[Coord<f64>],
        destination: Coord<f64>,
    ) -> Option<ResolvedRoute> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let response = self
            .response
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        match response {
            FixedResponse::StraightLine => {
                StraightLineResolver::default().resolve_now(origin, waiting, destination)
            }
            FixedResponse::Route(route) => Some(route),
            FixedResponse::Fail => None,
        }
    }
}

struct Listener {
    on_update: PositionCallback,
    on_error: PositionErrorCallback,
}

type Listeners = Arc<Mutex<Vec<(u64, Arc<Listener>)>>>;

/// `PositionSource` driven by explicit [`push`](Self::push) calls.
#[derive(Default)]
pub struct ManualPositionSource {
    listeners: Listeners,
    next_id: AtomicU64,
}

impl ManualPositionSource {
    /// Deliver `position` to every live subscriber.
    pub fn push(&self, position: Position) {
        for listener in self.snapshot() {
            (listener.on_update)(position);
        }
    }

    /// Deliver `error` to every live subscriber.
    pub fn fail(&self, error: PositionError) {
        for listener in self.snapshot() {
            (listener.on_error)(error);
        }
    }

    /// Number of live subscriptions.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    fn snapshot(&self) -> Vec<Arc<Listener>> {
        self.listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(_, listener)| Arc::clone(listener))
            .collect()
    }
}

impl std::fmt::Debug for ManualPositionSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ManualPositionSource")
            .field("subscribers", &self.subscriber_count())
            .finish_non_exhaustive()
    }
}

impl PositionSource for ManualPositionSource {
    fn subscribe(
        &self,
        on_update: PositionCallback,
        on_error: PositionErrorCallback,
    ) -> Subscription {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        self.listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((id, Arc::new(Listener { on_update, on_error })));
        let listeners = Arc::clone(&self.listeners);
        Subscription::new(move || {
            listeners
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .retain(|(existing, _)| *existing != id);
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geodesy::lat_lng;

    #[tokio::test]
    async fn fixed_resolver_switches_response() {
        let resolver = FixedResolver::straight_line();
        let origin = lat_lng(0.0, 0.0);
        let school = lat_lng(0.0, 0.01);
        assert!(resolver.resolve(origin, &[], school).await.is_some());

        resolver.respond_with(FixedResponse::Fail);
        assert!(resolver.resolve(origin, &[], school).await.is_none());
        assert_eq!(resolver.calls(), 2);
    }

    #[tokio::test]
    async fn stub_records_waypoints() {
        let provider = StubDirectionsProvider::straight_line();
        let points = vec![lat_lng(0.0, 0.0), lat_lng(0.0, 0.01)];
        provider
            .route(&points)
            .await
            .expect("straight-line stub routes two points");
        assert_eq!(provider.last_waypoints(), points);
        assert_eq!(provider.calls(), 1);
    }
}
