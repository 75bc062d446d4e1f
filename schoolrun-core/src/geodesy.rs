//! Great-circle primitives over WGS84 coordinates.
//!
//! Coordinates are [`geo::Coord`] values with `x = longitude` and
//! `y = latitude`, both in degrees. Distances are reported in kilometres by
//! [`distance_km`] and in metres by [`distance_m`]. Great-circle maths is
//! delegated to [`geo::Haversine`].
#![expect(
    clippy::float_arithmetic,
    reason = "unit conversions and angle wrapping are floating-point"
)]

use geo::{Bearing, Closest, ClosestPoint, Coord, Distance, Haversine, Line, Point};

/// Default average vehicle speed used for ETA estimates.
pub const DEFAULT_AVERAGE_SPEED_KMH: f64 = 40.0;

/// Build a coordinate from latitude and longitude in that order.
///
/// # Examples
/// ```
/// use schoolrun_core::geodesy::lat_lng;
///
/// let school = lat_lng(-23.5505, -46.6333);
/// assert_eq!(school.y, -23.5505);
/// assert_eq!(school.x, -46.6333);
/// ```
#[must_use]
pub const fn lat_lng(lat: f64, lng: f64) -> Coord<f64> {
    Coord { x: lng, y: lat }
}

/// Return `true` when `coord` is finite and inside WGS84 bounds.
///
/// # Examples
/// ```
/// use schoolrun_core::geodesy::{is_valid_coordinate, lat_lng};
///
/// assert!(is_valid_coordinate(lat_lng(51.5, -0.1)));
/// assert!(!is_valid_coordinate(lat_lng(f64::NAN, 0.0)));
/// assert!(!is_valid_coordinate(lat_lng(91.0, 0.0)));
/// ```
#[must_use]
pub fn is_valid_coordinate(coord: Coord<f64>) -> bool {
    coord.x.is_finite()
        && coord.y.is_finite()
        && (-90.0..=90.0).contains(&coord.y)
        && (-180.0..=180.0).contains(&coord.x)
}

/// Haversine distance between two coordinates in kilometres.
///
/// # Examples
/// ```
/// use schoolrun_core::geodesy::{distance_km, lat_lng};
///
/// let a = lat_lng(0.0, 0.0);
/// let b = lat_lng(0.0, 1.0);
/// assert!((distance_km(a, b) - 111.19).abs() < 0.01);
/// assert_eq!(distance_km(a, a), 0.0);
/// ```
#[must_use]
pub fn distance_km(a: Coord<f64>, b: Coord<f64>) -> f64 {
    distance_m(a, b) / 1000.0
}

/// Haversine distance between two coordinates in metres.
#[must_use]
pub fn distance_m(a: Coord<f64>, b: Coord<f64>) -> f64 {
    Haversine.distance(Point::from(a), Point::from(b))
}

/// Estimated travel time in whole minutes, rounded up.
///
/// Computes `ceil(distance_km / speed_kmh * 60)`. Degenerate inputs saturate
/// rather than panic: a non-positive speed yields `u32::MAX` for any positive
/// distance and negative or `NaN` results clamp to zero.
///
/// # Examples
/// ```
/// use schoolrun_core::geodesy::eta_minutes;
///
/// assert_eq!(eta_minutes(10.0, 40.0), 15);
/// assert_eq!(eta_minutes(0.1, 40.0), 1);
/// assert_eq!(eta_minutes(0.0, 40.0), 0);
/// ```
#[must_use]
#[expect(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    reason = "float-to-int casts saturate, which is the documented behaviour"
)]
pub fn eta_minutes(distance_km: f64, speed_kmh: f64) -> u32 {
    if distance_km <= 0.0 {
        return 0;
    }
    (distance_km / speed_kmh * 60.0).ceil() as u32
}

/// Initial compass bearing from `from` to `to` in degrees, within `(-180, 180]`.
///
/// North is `0`, east is `90`, west is `-90`. Identical points yield `0`.
///
/// # Examples
/// ```
/// use schoolrun_core::geodesy::{bearing, lat_lng};
///
/// let origin = lat_lng(0.0, 0.0);
/// assert!((bearing(origin, lat_lng(0.0, 1.0)) - 90.0).abs() < 1e-9);
/// assert!((bearing(origin, lat_lng(1.0, 0.0))).abs() < 1e-9);
/// ```
#[must_use]
pub fn bearing(from: Coord<f64>, to: Coord<f64>) -> f64 {
    normalise_angle(Haversine.bearing(Point::from(from), Point::from(to)))
}

/// Normalise an angular difference in degrees into `(-180, 180]`.
///
/// # Examples
/// ```
/// use schoolrun_core::geodesy::normalise_angle;
///
/// assert_eq!(normalise_angle(270.0), -90.0);
/// assert_eq!(normalise_angle(-180.0), 180.0);
/// ```
#[must_use]
pub fn normalise_angle(degrees: f64) -> f64 {
    let wrapped = degrees.rem_euclid(360.0);
    if wrapped > 180.0 {
        wrapped - 360.0
    } else {
        wrapped
    }
}

/// Minimum distance in metres from `point` to the segment `start`–`end`.
///
/// The closest point is found on the segment in coordinate space, clamped to
/// the segment ends, and the distance to it is measured with the haversine
/// formula. Degenerate segments collapse to a point distance.
#[must_use]
pub fn distance_to_segment_m(point: Coord<f64>, start: Coord<f64>, end: Coord<f64>) -> f64 {
    let target = Point::from(point);
    let closest = match Line::new(start, end).closest_point(&target) {
        Closest::Intersection(closest) | Closest::SinglePoint(closest) => closest,
        Closest::Indeterminate => Point::from(start),
    };
    Haversine.distance(target, closest)
}
