//! Planned visits and the manifest that orders them.
//!
//! A [`Manifest`] is rebuilt from scratch on every recomputation; stops carry
//! no identity across rebuilds beyond their derived `id`.

use geo::Coord;

/// Identifier of the single school stop in every manifest.
pub const SCHOOL_STOP_ID: &str = "school-dropoff";

/// What happens at a stop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "SCREAMING_SNAKE_CASE"))]
pub enum StopKind {
    /// Collect a passenger.
    Pickup,
    /// Final destination.
    School,
}

impl StopKind {
    /// Return the kind as an upper-case `&str`.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pickup => "PICKUP",
            Self::School => "SCHOOL",
        }
    }
}

impl std::fmt::Display for StopKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Arrival estimate attached to a stop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum StopEta {
    /// The stop was already visited on this leg.
    Completed,
    /// Whole minutes from the previous stop.
    Minutes(u32),
}

/// A single planned visit.
///
/// # Examples
/// ```
/// use schoolrun_core::{Stop, StopEta, geodesy::lat_lng};
///
/// let stop = Stop::pickup("s1", lat_lng(0.0, 0.0), StopEta::Minutes(4));
/// assert_eq!(stop.id, "stop-s1");
/// assert_eq!(stop.eta_label(), "4 min");
/// assert!(!stop.completed);
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Stop {
    /// Stable identifier derived from the subject, or [`SCHOOL_STOP_ID`].
    pub id: String,
    /// Passenger served by the stop; absent for the school.
    pub subject_id: Option<String>,
    /// Where the stop is.
    pub location: Coord<f64>,
    /// Pickup or school.
    pub kind: StopKind,
    /// Whether the stop was already visited.
    pub completed: bool,
    /// Arrival estimate.
    pub eta: StopEta,
}

impl Stop {
    /// Construct a pickup stop for `subject_id`.
    ///
    /// The stop counts as completed when `eta` is [`StopEta::Completed`].
    #[must_use]
    pub fn pickup(subject_id: &str, location: Coord<f64>, eta: StopEta) -> Self {
        Self {
            id: format!("stop-{subject_id}"),
            subject_id: Some(subject_id.to_owned()),
            location,
            kind: StopKind::Pickup,
            completed: eta == StopEta::Completed,
            eta,
        }
    }

    /// Construct the final school stop.
    #[must_use]
    pub fn school(location: Coord<f64>, eta_minutes: u32) -> Self {
        Self {
            id: SCHOOL_STOP_ID.to_owned(),
            subject_id: None,
            location,
            kind: StopKind::School,
            completed: false,
            eta: StopEta::Minutes(eta_minutes),
        }
    }

    /// Human-readable ETA shown next to the stop.
    #[must_use]
    pub fn eta_label(&self) -> String {
        match (self.kind, self.eta) {
            (_, StopEta::Completed) => "completed".to_owned(),
            (StopKind::Pickup, StopEta::Minutes(minutes)) => format!("{minutes} min"),
            (StopKind::School, StopEta::Minutes(minutes)) => format!("final · {minutes} min"),
        }
    }
}

/// Ordered stops plus the skeleton polyline through them.
///
/// `points` starts at the origin, visits every open pickup in manifest order
/// and ends at the destination. Completed stops are not part of `points`.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Manifest {
    /// Stops in visiting order; the school stop is always last.
    pub stops: Vec<Stop>,
    /// `[origin, open pickups..., destination]`.
    pub points: Vec<Coord<f64>>,
}

impl Manifest {
    /// First stop that has not been completed.
    #[must_use]
    pub fn next_stop(&self) -> Option<&Stop> {
        self.stops.iter().find(|stop| !stop.completed)
    }

    /// Pickup stops, completed or not, in manifest order.
    pub fn pickups(&self) -> impl Iterator<Item = &Stop> {
        self.stops
            .iter()
            .filter(|stop| stop.kind == StopKind::Pickup)
    }

    /// Locations of open pickups in visiting order.
    #[must_use]
    pub fn waiting_locations(&self) -> Vec<Coord<f64>> {
        self.pickups()
            .filter(|stop| !stop.completed)
            .map(|stop| stop.location)
            .collect()
    }

    /// Whether any pickup is still open.
    #[must_use]
    pub fn has_open_pickups(&self) -> bool {
        self.pickups().any(|stop| !stop.completed)
    }

    /// The final school stop.
    #[must_use]
    pub fn school(&self) -> Option<&Stop> {
        self.stops.last().filter(|stop| stop.kind == StopKind::School)
    }
}
