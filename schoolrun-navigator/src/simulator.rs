//! A [`PositionSource`] that drives a vehicle along a fixed path.
//!
//! Useful for demos and tests where no GPS is available. Each tick moves
//! the vehicle a fixed distance toward the next vertex of its path and
//! reports the new position.

use std::time::Duration;

use geo::{Bearing, Coord, Haversine, InterpolatePoint, Point};
use log::warn;
use schoolrun_core::geodesy::{distance_m, is_valid_coordinate};
use schoolrun_core::{
    Position, PositionCallback, PositionError, PositionErrorCallback, PositionSource,
    Subscription,
};
use tokio::runtime::Handle;

use crate::PeriodicTask;

/// Step size, cadence and arrival radius for a [`SimulatedMover`].
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SimulatorConfig {
    /// Distance covered per tick.
    pub step_m: f64,
    /// Time between ticks.
    pub tick: Duration,
    /// The mover holds still once this close to the final vertex.
    pub arrival_m: f64,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            step_m: 30.0,
            tick: Duration::from_secs(1),
            arrival_m: 10.0,
        }
    }
}

impl SimulatorConfig {
    /// Override the distance covered per tick.
    #[must_use]
    pub const fn with_step_m(mut self, metres: f64) -> Self {
        self.step_m = metres;
        self
    }

    /// Override the tick cadence.
    #[must_use]
    pub const fn with_tick(mut self, tick: Duration) -> Self {
        self.tick = tick;
        self
    }

    /// Override the arrival radius.
    #[must_use]
    pub const fn with_arrival_m(mut self, metres: f64) -> Self {
        self.arrival_m = metres;
        self
    }
}

/// Progress of one simulated vehicle along its path.
///
/// # Examples
/// ```
/// use schoolrun_core::geodesy::lat_lng;
/// use schoolrun_navigator::{SimulatedWalk, SimulatorConfig};
///
/// let path = [lat_lng(0.0, 0.0), lat_lng(0.0, 0.001)];
/// let mut walk = SimulatedWalk::new(&path, SimulatorConfig::default()).expect("valid path");
/// for _ in 0..10 {
///     walk.advance();
/// }
/// assert!(walk.has_arrived());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct SimulatedWalk {
    path: Vec<Coord<f64>>,
    target: usize,
    position: Coord<f64>,
    config: SimulatorConfig,
}

impl SimulatedWalk {
    /// Start at the first vertex of `path`.
    ///
    /// Malformed vertices are dropped; returns `None` when nothing remains.
    #[must_use]
    pub fn new(path: &[Coord<f64>], config: SimulatorConfig) -> Option<Self> {
        let path: Vec<Coord<f64>> = path
            .iter()
            .copied()
            .filter(|point| is_valid_coordinate(*point))
            .collect();
        let position = *path.first()?;
        Some(Self {
            path,
            target: 1,
            position,
            config,
        })
    }

    /// Current simulated coordinate.
    #[must_use]
    pub const fn position(&self) -> Coord<f64> {
        self.position
    }

    /// Whether the walk is holding at the final vertex.
    #[must_use]
    pub fn has_arrived(&self) -> bool {
        self.path
            .last()
            .is_some_and(|last| distance_m(self.position, *last) < self.config.arrival_m)
    }

    /// Move one step and report where the vehicle is now.
    #[expect(clippy::float_arithmetic, reason = "speed needs floating-point maths")]
    pub fn advance(&mut self) -> Position {
        let mut heading = None;
        while !self.has_arrived() {
            let Some(&target) = self.path.get(self.target) else {
                break;
            };
            let remaining = distance_m(self.position, target);
            heading = Some(Haversine.bearing(Point::from(self.position), Point::from(target)));
            if remaining <= self.config.step_m {
                self.position = target;
                if self.target + 1 < self.path.len() {
                    self.target += 1;
                    if remaining > 0.0 {
                        break;
                    }
                    continue;
                }
                break;
            }
            self.position = Haversine
                .point_at_distance_between(
                    Point::from(self.position),
                    Point::from(target),
                    self.config.step_m,
                )
                .into();
            break;
        }

        let seconds = self.config.tick.as_secs_f64();
        let speed = if heading.is_some() && seconds > 0.0 {
            self.config.step_m / seconds
        } else {
            0.0
        };
        let position = Position::new(self.position).with_speed_mps(speed);
        heading.map_or(position, |heading| position.with_heading_deg(heading))
    }
}

/// Simulated GPS walking a fixed path.
///
/// Every subscription gets its own walk starting at the first vertex and a
/// [`PeriodicTask`] ticking at [`SimulatorConfig::tick`]. Subscribing outside
/// a Tokio runtime reports [`PositionError::Unsupported`], and an empty path
/// reports [`PositionError::Unavailable`].
#[derive(Debug, Clone)]
pub struct SimulatedMover {
    path: Vec<Coord<f64>>,
    config: SimulatorConfig,
}

impl SimulatedMover {
    /// Walk `path` with the default step and cadence.
    #[must_use]
    pub fn new(path: Vec<Coord<f64>>) -> Self {
        Self::with_config(path, SimulatorConfig::default())
    }

    /// Walk `path` with explicit configuration.
    #[must_use]
    pub const fn with_config(path: Vec<Coord<f64>>, config: SimulatorConfig) -> Self {
        Self { path, config }
    }

    /// Active configuration.
    #[must_use]
    pub const fn config(&self) -> &SimulatorConfig {
        &self.config
    }
}

impl PositionSource for SimulatedMover {
    fn subscribe(
        &self,
        on_update: PositionCallback,
        on_error: PositionErrorCallback,
    ) -> Subscription {
        let Some(mut walk) = SimulatedWalk::new(&self.path, self.config) else {
            warn!("simulated mover has no valid path");
            on_error(PositionError::Unavailable);
            return Subscription::inert();
        };
        if Handle::try_current().is_err() {
            on_error(PositionError::Unsupported);
            return Subscription::inert();
        }
        let task = PeriodicTask::spawn(self.config.tick, move || on_update(walk.advance()));
        Subscription::new(move || task.cancel())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use schoolrun_core::geodesy::lat_lng;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex, PoisonError};

    fn walk(path: &[Coord<f64>]) -> SimulatedWalk {
        SimulatedWalk::new(path, SimulatorConfig::default()).expect("path has a valid vertex")
    }

    #[rstest]
    fn each_tick_covers_one_step() {
        let start = lat_lng(0.0, 0.0);
        let mut walk = walk(&[start, lat_lng(0.0, 0.01)]);
        let position = walk.advance();
        let moved = distance_m(start, position.coordinate);
        assert!((moved - 30.0).abs() < 0.5, "moved {moved} m");
        assert_eq!(position.speed_mps, Some(30.0));
        let heading = position.heading_deg.expect("moving vehicles report heading");
        assert!((heading - 90.0).abs() < 1e-6);
    }

    #[rstest]
    fn reaching_a_vertex_turns_toward_the_next() {
        let corner = lat_lng(0.0, 0.0002);
        let mut walk = walk(&[lat_lng(0.0, 0.0), corner, lat_lng(0.01, 0.0002)]);
        assert_eq!(walk.advance().coordinate, corner);
        let heading = walk.advance().heading_deg.expect("heading");
        assert!(heading.abs() < 1e-6, "now heading north, got {heading}");
    }

    #[rstest]
    fn holds_within_the_arrival_radius() {
        let end = lat_lng(0.0, 0.001);
        let mut walk = walk(&[lat_lng(0.0, 0.0), end]);
        for _ in 0..10 {
            walk.advance();
        }
        assert!(walk.has_arrived());
        let held = walk.position();
        let position = walk.advance();
        assert_eq!(position.coordinate, held);
        assert_eq!(position.speed_mps, Some(0.0));
        assert!(position.heading_deg.is_none());
    }

    #[rstest]
    fn malformed_vertices_are_skipped() {
        let path = [lat_lng(f64::NAN, 0.0), lat_lng(0.0, 0.0)];
        assert_eq!(walk(&path).position(), lat_lng(0.0, 0.0));
        assert!(SimulatedWalk::new(&[lat_lng(95.0, 0.0)], SimulatorConfig::default()).is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn mover_reports_positions_until_unsubscribed() {
        let mover = SimulatedMover::new(vec![lat_lng(0.0, 0.0), lat_lng(0.0, 0.01)]);
        let updates = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&updates);
        let subscription = mover.subscribe(
            Box::new(move |_| {
                seen.fetch_add(1, Ordering::SeqCst);
            }),
            Box::new(|_| {}),
        );
        tokio::time::sleep(Duration::from_millis(2_500)).await;
        assert_eq!(updates.load(Ordering::SeqCst), 3);

        subscription.unsubscribe();
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(updates.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn subscribing_without_a_runtime_reports_unsupported() {
        let mover = SimulatedMover::new(vec![lat_lng(0.0, 0.0), lat_lng(0.0, 0.01)]);
        let error = Arc::new(Mutex::new(None));
        let sink = Arc::clone(&error);
        let subscription = mover.subscribe(
            Box::new(|_| {}),
            Box::new(move |err| {
                *sink.lock().unwrap_or_else(PoisonError::into_inner) = Some(err);
            }),
        );
        assert!(!subscription.is_active());
        assert_eq!(
            *error.lock().unwrap_or_else(PoisonError::into_inner),
            Some(PositionError::Unsupported)
        );
    }
}
