//! Detect when a vehicle has drifted away from its resolved route.

use std::time::Duration;

use geo::{Coord, LineString};

use crate::geodesy::{distance_m, distance_to_segment_m};

/// Thresholds and cadence for off-route detection.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ConformanceConfig {
    /// Distance from the route beyond which the vehicle is off route.
    pub threshold_m: f64,
    /// How often the navigator polls for drift.
    pub poll_interval: Duration,
}

impl Default for ConformanceConfig {
    fn default() -> Self {
        Self {
            threshold_m: 30.0,
            poll_interval: Duration::from_secs(5),
        }
    }
}

impl ConformanceConfig {
    /// Set the off-route threshold in metres.
    #[must_use]
    pub const fn with_threshold_m(mut self, metres: f64) -> Self {
        self.threshold_m = metres;
        self
    }

    /// Set the polling interval.
    #[must_use]
    pub const fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }
}

/// Minimum distance in metres from `position` to any segment of `geometry`.
///
/// An empty geometry is infinitely far away; a single vertex is measured
/// directly.
///
/// # Examples
/// ```
/// use geo::LineString;
/// use schoolrun_core::{distance_from_route, geodesy::lat_lng};
///
/// let route = LineString::from(vec![lat_lng(0.0, 0.0), lat_lng(0.0, 0.01)]);
/// assert!(distance_from_route(lat_lng(0.0, 0.005), &route) < 1e-6);
/// assert!(distance_from_route(lat_lng(0.0, 0.0), &LineString::new(vec![])).is_infinite());
/// ```
#[must_use]
pub fn distance_from_route(position: Coord<f64>, geometry: &LineString<f64>) -> f64 {
    match geometry.0.as_slice() {
        [] => f64::INFINITY,
        [only] => distance_m(position, *only),
        vertices => vertices
            .windows(2)
            .filter_map(|pair| match pair {
                [start, end] => Some(distance_to_segment_m(position, *start, *end)),
                _ => None,
            })
            .fold(f64::INFINITY, f64::min),
    }
}

/// Whether `position` lies further than `threshold_m` from `geometry`.
#[must_use]
pub fn is_off_route(position: Coord<f64>, geometry: &LineString<f64>, threshold_m: f64) -> bool {
    distance_from_route(position, geometry) > threshold_m
}
