//! Vehicle positions and the sources that report them.
//!
//! A [`PositionSource`] pushes fixes to a pair of callbacks until the
//! returned [`Subscription`] is cancelled. Cancellation happens on
//! [`Subscription::unsubscribe`] or when the subscription is dropped.

use std::fmt;

use geo::Coord;
use thiserror::Error;

/// A single location fix.
///
/// # Examples
/// ```
/// use schoolrun_core::{Position, geodesy::lat_lng};
///
/// let fix = Position::new(lat_lng(-23.55, -46.63)).with_heading_deg(90.0);
/// assert_eq!(fix.heading_deg, Some(90.0));
/// assert_eq!(fix.speed_mps, None);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Position {
    /// Reported location (`x = longitude`, `y = latitude`).
    pub coordinate: Coord<f64>,
    /// Direction of travel in degrees clockwise from north.
    pub heading_deg: Option<f64>,
    /// Ground speed in metres per second.
    pub speed_mps: Option<f64>,
    /// Horizontal accuracy radius in metres.
    pub accuracy_m: Option<f64>,
}

impl Position {
    /// Construct a fix carrying only a coordinate.
    #[must_use]
    pub const fn new(coordinate: Coord<f64>) -> Self {
        Self {
            coordinate,
            heading_deg: None,
            speed_mps: None,
            accuracy_m: None,
        }
    }

    /// Attach a heading.
    #[must_use]
    pub const fn with_heading_deg(mut self, heading: f64) -> Self {
        self.heading_deg = Some(heading);
        self
    }

    /// Attach a ground speed.
    #[must_use]
    pub const fn with_speed_mps(mut self, speed: f64) -> Self {
        self.speed_mps = Some(speed);
        self
    }

    /// Attach an accuracy radius.
    #[must_use]
    pub const fn with_accuracy_m(mut self, accuracy: f64) -> Self {
        self.accuracy_m = Some(accuracy);
        self
    }
}

impl From<Coord<f64>> for Position {
    fn from(coordinate: Coord<f64>) -> Self {
        Self::new(coordinate)
    }
}

/// Why a position source could not deliver a fix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum PositionError {
    /// The user refused location access.
    #[error("location permission denied")]
    PermissionDenied,
    /// No fix could be obtained.
    #[error("location unavailable")]
    Unavailable,
    /// The source did not produce a fix in time.
    #[error("location request timed out")]
    Timeout,
    /// The platform offers no location service.
    #[error("location is not supported on this platform")]
    Unsupported,
}

/// Callback receiving each new fix.
pub type PositionCallback = Box<dyn Fn(Position) + Send + Sync>;

/// Callback receiving source failures.
pub type PositionErrorCallback = Box<dyn Fn(PositionError) + Send + Sync>;

/// Something that reports vehicle positions over time.
pub trait PositionSource: Send + Sync {
    /// Start delivering fixes to `on_update` and failures to `on_error`.
    ///
    /// Delivery stops once the returned [`Subscription`] is cancelled.
    fn subscribe(
        &self,
        on_update: PositionCallback,
        on_error: PositionErrorCallback,
    ) -> Subscription;
}

/// Handle that stops delivery when cancelled or dropped.
#[must_use = "dropping a subscription cancels it immediately"]
pub struct Subscription {
    cancel: Option<Box<dyn FnOnce() + Send>>,
}

impl Subscription {
    /// Wrap the action that stops delivery.
    pub fn new(cancel: impl FnOnce() + Send + 'static) -> Self {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }

    /// A subscription with nothing to cancel.
    pub const fn inert() -> Self {
        Self { cancel: None }
    }

    /// Stop delivery now.
    pub fn unsubscribe(mut self) {
        self.cancel_now();
    }

    /// Whether cancelling would still do anything.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.cancel.is_some()
    }

    fn cancel_now(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.cancel_now();
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.is_active())
            .finish()
    }
}
