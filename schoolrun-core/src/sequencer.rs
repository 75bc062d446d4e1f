//! Order pickups with a nearest-neighbour heuristic.
//!
//! The [`Sequencer`] trait is the seam the navigator plans through;
//! [`NearestNeighbourSequencer`] is the greedy implementation. It is not an
//! optimal tour: each step simply visits the closest remaining pickup.

use geo::Coord;
use log::warn;

use crate::geodesy::{DEFAULT_AVERAGE_SPEED_KMH, distance_km, eta_minutes, is_valid_coordinate};
use crate::{Manifest, Stop, StopEta, Subject};

/// Configuration for [`NearestNeighbourSequencer`].
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SequencerConfig {
    /// Average speed used to label stop ETAs.
    pub average_speed_kmh: f64,
}

impl Default for SequencerConfig {
    fn default() -> Self {
        Self {
            average_speed_kmh: DEFAULT_AVERAGE_SPEED_KMH,
        }
    }
}

impl SequencerConfig {
    /// Set the average speed used for ETA labels.
    #[must_use]
    pub const fn with_average_speed_kmh(mut self, speed: f64) -> Self {
        self.average_speed_kmh = speed;
        self
    }
}

/// Produce an ordered manifest from an origin, a roster and a destination.
///
/// Implementations must place exactly one school stop last and emit one
/// pickup stop per waiting subject with a valid location.
pub trait Sequencer: Send + Sync {
    /// Build the manifest for the current leg.
    fn sequence(
        &self,
        origin: Coord<f64>,
        subjects: &[Subject],
        destination: Coord<f64>,
    ) -> Manifest;
}

/// Greedy nearest-neighbour [`Sequencer`].
///
/// # Examples
/// ```
/// use schoolrun_core::{NearestNeighbourSequencer, Sequencer, Subject, geodesy::lat_lng};
///
/// let sequencer = NearestNeighbourSequencer::default();
/// let subjects = vec![
///     Subject::waiting("far", lat_lng(0.0, 2.0)),
///     Subject::waiting("near", lat_lng(0.0, 1.0)),
/// ];
/// let manifest = sequencer.sequence(lat_lng(0.0, 0.0), &subjects, lat_lng(0.0, 3.0));
/// let ids: Vec<_> = manifest.stops.iter().map(|s| s.id.as_str()).collect();
/// assert_eq!(ids, ["stop-near", "stop-far", "school-dropoff"]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct NearestNeighbourSequencer {
    config: SequencerConfig,
}

impl NearestNeighbourSequencer {
    /// Construct a sequencer with explicit configuration.
    #[must_use]
    pub const fn with_config(config: SequencerConfig) -> Self {
        Self { config }
    }

    /// Active configuration.
    #[must_use]
    pub const fn config(&self) -> &SequencerConfig {
        &self.config
    }

    fn eta(&self, distance: f64) -> u32 {
        eta_minutes(distance, self.config.average_speed_kmh)
    }
}

impl Sequencer for NearestNeighbourSequencer {
    fn sequence(
        &self,
        origin: Coord<f64>,
        subjects: &[Subject],
        destination: Coord<f64>,
    ) -> Manifest {
        let routable: Vec<&Subject> = subjects
            .iter()
            .filter(|subject| {
                let valid = subject.has_valid_location();
                if !valid {
                    warn!(
                        "skipping subject {} with malformed location {:?}",
                        subject.id, subject.location
                    );
                }
                valid
            })
            .collect();
        let (mut waiting, picked_up): (Vec<&Subject>, Vec<&Subject>) = routable
            .into_iter()
            .filter(|subject| subject.is_waiting() || subject.is_picked_up())
            .partition(|subject| subject.is_waiting());

        let mut stops: Vec<Stop> = picked_up
            .iter()
            .map(|subject| Stop::pickup(&subject.id, subject.location, StopEta::Completed))
            .collect();
        stops.reserve(waiting.len() + 1);
        let mut points = Vec::with_capacity(waiting.len() + 2);
        points.push(origin);

        let mut current = origin;
        while let Some((index, distance)) = nearest(current, &waiting) {
            let subject = waiting.remove(index);
            stops.push(Stop::pickup(
                &subject.id,
                subject.location,
                StopEta::Minutes(self.eta(distance)),
            ));
            points.push(subject.location);
            current = subject.location;
        }

        if !is_valid_coordinate(destination) {
            warn!("destination {destination:?} is malformed; school ETA is unreliable");
        }
        stops.push(Stop::school(
            destination,
            self.eta(distance_km(current, destination)),
        ));
        points.push(destination);

        Manifest { stops, points }
    }
}

/// Index and distance of the subject closest to `from`.
///
/// Ties keep the earliest subject in roster order.
fn nearest(from: Coord<f64>, candidates: &[&Subject]) -> Option<(usize, f64)> {
    candidates
        .iter()
        .enumerate()
        .map(|(index, subject)| (index, distance_km(from, subject.location)))
        .fold(None, |best, (index, distance)| match best {
            Some((_, best_distance)) if best_distance <= distance => best,
            _ => Some((index, distance)),
        })
}
