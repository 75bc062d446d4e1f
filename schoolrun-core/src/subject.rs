//! Passengers as seen by the routing core.
//!
//! A [`Subject`] is read-only input supplied by the roster owner. Only
//! [`SubjectStatus::Waiting`] subjects become new pickup stops.

use geo::Coord;

use crate::geodesy::is_valid_coordinate;

/// Boarding state of a passenger on the current leg.
///
/// # Examples
/// ```
/// use schoolrun_core::SubjectStatus;
///
/// assert_eq!(SubjectStatus::PickedUp.as_str(), "PICKED_UP");
/// assert_eq!("waiting".parse::<SubjectStatus>(), Ok(SubjectStatus::Waiting));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "SCREAMING_SNAKE_CASE"))]
pub enum SubjectStatus {
    /// Awaiting pickup; eligible for a new stop.
    Waiting,
    /// On board; shown as a completed stop.
    PickedUp,
    /// Delivered; no longer part of the manifest.
    DroppedOff,
    /// Not travelling today; no longer part of the manifest.
    Absent,
}

impl SubjectStatus {
    /// Return the status as an upper-case `&str`.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Waiting => "WAITING",
            Self::PickedUp => "PICKED_UP",
            Self::DroppedOff => "DROPPED_OFF",
            Self::Absent => "ABSENT",
        }
    }
}

impl std::fmt::Display for SubjectStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for SubjectStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "WAITING" => Ok(Self::Waiting),
            "PICKED_UP" => Ok(Self::PickedUp),
            "DROPPED_OFF" => Ok(Self::DroppedOff),
            "ABSENT" => Ok(Self::Absent),
            _ => Err(format!("unknown subject status '{s}'")),
        }
    }
}

/// A passenger with a pickup location.
///
/// # Examples
/// ```
/// use schoolrun_core::{Subject, SubjectStatus, geodesy::lat_lng};
///
/// let subject = Subject::new("s1", lat_lng(-23.56, -46.65), SubjectStatus::Waiting);
/// assert!(subject.is_waiting());
/// assert!(subject.has_valid_location());
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Subject {
    /// Stable passenger identifier.
    pub id: String,
    /// Pickup location (`x = longitude`, `y = latitude`).
    pub location: Coord<f64>,
    /// Current boarding state.
    pub status: SubjectStatus,
}

impl Subject {
    /// Construct a subject.
    #[must_use]
    pub fn new(id: impl Into<String>, location: Coord<f64>, status: SubjectStatus) -> Self {
        Self {
            id: id.into(),
            location,
            status,
        }
    }

    /// Construct a subject awaiting pickup.
    #[must_use]
    pub fn waiting(id: impl Into<String>, location: Coord<f64>) -> Self {
        Self::new(id, location, SubjectStatus::Waiting)
    }

    /// Whether the subject is eligible for a new pickup stop.
    #[must_use]
    pub fn is_waiting(&self) -> bool {
        self.status == SubjectStatus::Waiting
    }

    /// Whether the subject is currently on board.
    #[must_use]
    pub fn is_picked_up(&self) -> bool {
        self.status == SubjectStatus::PickedUp
    }

    /// Whether the location is usable for routing.
    #[must_use]
    pub fn has_valid_location(&self) -> bool {
        is_valid_coordinate(self.location)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geodesy::lat_lng;
    use rstest::rstest;

    #[rstest]
    #[case(SubjectStatus::Waiting)]
    #[case(SubjectStatus::PickedUp)]
    #[case(SubjectStatus::DroppedOff)]
    #[case(SubjectStatus::Absent)]
    fn status_parses_its_own_display(#[case] status: SubjectStatus) {
        assert_eq!(status.to_string().parse::<SubjectStatus>(), Ok(status));
    }

    #[rstest]
    fn unknown_status_is_rejected() {
        assert!("ON_BOARD".parse::<SubjectStatus>().is_err());
    }

    #[rstest]
    fn malformed_location_is_reported() {
        let subject = Subject::waiting("s1", lat_lng(f64::NAN, 0.0));
        assert!(!subject.has_valid_location());
    }
}
