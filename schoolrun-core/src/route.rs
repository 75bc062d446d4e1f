//! Drivable routes produced by path resolution.
//!
//! A [`ResolvedRoute`] is replaced wholesale on every recomputation.

use std::time::Duration;

use geo::{Coord, LineString};

use crate::geodesy::distance_km;

/// Concrete polyline for the current manifest with aggregate metrics.
///
/// # Examples
/// ```
/// use std::time::Duration;
/// use geo::LineString;
/// use schoolrun_core::{ResolvedRoute, geodesy::lat_lng};
///
/// let route = ResolvedRoute::new(
///     LineString::from(vec![lat_lng(0.0, 0.0), lat_lng(0.0, 0.01)]),
///     1112.0,
///     Duration::from_secs(125),
/// );
/// assert_eq!(route.eta_minutes(), 3);
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ResolvedRoute {
    /// Path geometry (`x = longitude`, `y = latitude`).
    pub geometry: LineString<f64>,
    /// Total length in metres.
    pub distance_m: f64,
    /// Total expected travel time.
    pub duration: Duration,
}

impl ResolvedRoute {
    /// Construct a route from its parts.
    #[must_use]
    pub const fn new(geometry: LineString<f64>, distance_m: f64, duration: Duration) -> Self {
        Self {
            geometry,
            distance_m,
            duration,
        }
    }

    /// Connect `points` with straight lines, timing them at `speed_kmh`.
    ///
    /// Returns `None` when fewer than two points are supplied or the speed is
    /// not positive.
    ///
    /// # Examples
    /// ```
    /// use schoolrun_core::{ResolvedRoute, geodesy::lat_lng};
    ///
    /// let route = ResolvedRoute::straight_line(
    ///     &[lat_lng(0.0, 0.0), lat_lng(0.0, 0.1), lat_lng(0.0, 0.2)],
    ///     40.0,
    /// )
    /// .expect("two or more points");
    /// assert_eq!(route.geometry.0.len(), 3);
    /// assert!((route.distance_m - 22_239.0).abs() < 1.0);
    /// ```
    #[must_use]
    #[expect(
        clippy::float_arithmetic,
        reason = "leg lengths and durations are floating-point"
    )]
    pub fn straight_line(points: &[Coord<f64>], speed_kmh: f64) -> Option<Self> {
        if points.len() < 2 || speed_kmh.is_nan() || speed_kmh <= 0.0 {
            return None;
        }
        let km: f64 = points
            .windows(2)
            .map(|pair| match pair {
                [a, b] => distance_km(*a, *b),
                _ => 0.0,
            })
            .sum();
        let seconds = km / speed_kmh * 3600.0;
        let duration = Duration::try_from_secs_f64(seconds).unwrap_or(Duration::MAX);
        Some(Self::new(
            LineString::from(points.to_vec()),
            km * 1000.0,
            duration,
        ))
    }

    /// Aggregate ETA in whole minutes, rounded up.
    #[must_use]
    pub fn eta_minutes(&self) -> u32 {
        const NANOS_PER_MINUTE: u128 = 60_000_000_000;
        let minutes = self.duration.as_nanos().div_ceil(NANOS_PER_MINUTE);
        u32::try_from(minutes).unwrap_or(u32::MAX)
    }

    /// Path vertices in order.
    #[must_use]
    pub fn path(&self) -> &[Coord<f64>] {
        &self.geometry.0
    }
}

/// Aggregate ETA for an optional route; `0` when there is none.
#[must_use]
pub fn route_eta_minutes(route: Option<&ResolvedRoute>) -> u32 {
    route.map_or(0, ResolvedRoute::eta_minutes)
}
