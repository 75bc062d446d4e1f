//! Turn-by-turn instructions derived from a resolved path.
//!
//! Guidance is stateless: [`next_instruction`] is recomputed from the current
//! location and path on every position update. Bearing differences are
//! signed so that a clockwise change (positive) is a right turn and an
//! anticlockwise change (negative) is a left turn.
#![expect(
    clippy::float_arithmetic,
    reason = "bearing deltas and thresholds are floating-point"
)]

use geo::Coord;

use crate::geodesy::{bearing, distance_m, normalise_angle};

/// Approach legs shorter than this carry no usable heading.
const MIN_APPROACH_M: f64 = 1.0;

/// Manoeuvre announced by an instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
pub enum TurnKind {
    /// Keep the current heading.
    Straight,
    /// Bear anticlockwise.
    TurnLeft,
    /// Bear clockwise.
    TurnRight,
    /// The destination has been reached.
    Arrive,
}

impl TurnKind {
    /// Return the kind as a kebab-case `&str`.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Straight => "straight",
            Self::TurnLeft => "turn-left",
            Self::TurnRight => "turn-right",
            Self::Arrive => "arrive",
        }
    }
}

impl std::fmt::Display for TurnKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single instruction shown to the driver.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NavigationInstruction {
    /// Manoeuvre to perform.
    pub kind: TurnKind,
    /// Length of the upcoming leg in whole metres; `0` on arrival.
    pub distance_m: u32,
    /// Display text.
    pub text: String,
}

impl NavigationInstruction {
    /// Build an instruction for `kind` over `distance_m`, rendering its text.
    #[must_use]
    pub fn manoeuvre(kind: TurnKind, distance_m: u32) -> Self {
        let text = match kind {
            TurnKind::Straight => format!("Continue straight for {distance_m} m"),
            TurnKind::TurnLeft => format!("Turn left in {distance_m} m"),
            TurnKind::TurnRight => format!("Turn right in {distance_m} m"),
            TurnKind::Arrive => "You have arrived".to_owned(),
        };
        Self {
            kind,
            distance_m,
            text,
        }
    }

    /// Build the terminal instruction naming the destination.
    #[must_use]
    pub fn arrive(destination_name: &str) -> Self {
        Self {
            kind: TurnKind::Arrive,
            distance_m: 0,
            text: format!("You have arrived: {destination_name}"),
        }
    }
}

/// Tunable guidance thresholds.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct GuidanceConfig {
    /// A vertex closer than this counts as passed.
    pub arrival_threshold_m: f64,
    /// Bearing changes smaller than this are reported as straight.
    pub straight_threshold_deg: f64,
}

impl Default for GuidanceConfig {
    fn default() -> Self {
        Self {
            arrival_threshold_m: 50.0,
            straight_threshold_deg: 30.0,
        }
    }
}

impl GuidanceConfig {
    /// Set the waypoint arrival threshold in metres.
    #[must_use]
    pub const fn with_arrival_threshold_m(mut self, metres: f64) -> Self {
        self.arrival_threshold_m = metres;
        self
    }

    /// Set the straight-ahead tolerance in degrees.
    #[must_use]
    pub const fn with_straight_threshold_deg(mut self, degrees: f64) -> Self {
        self.straight_threshold_deg = degrees;
        self
    }
}

/// Classify a signed bearing change.
///
/// `delta_deg` is normalised into `(-180, 180]` first. Positive values are
/// clockwise and map to [`TurnKind::TurnRight`].
///
/// # Examples
/// ```
/// use schoolrun_core::{TurnKind, classify_turn};
///
/// assert_eq!(classify_turn(0.0, 30.0), TurnKind::Straight);
/// assert_eq!(classify_turn(90.0, 30.0), TurnKind::TurnRight);
/// assert_eq!(classify_turn(-90.0, 30.0), TurnKind::TurnLeft);
/// assert_eq!(classify_turn(270.0, 30.0), TurnKind::TurnLeft);
/// ```
#[must_use]
pub fn classify_turn(delta_deg: f64, straight_threshold_deg: f64) -> TurnKind {
    let delta = normalise_angle(delta_deg);
    if delta.abs() < straight_threshold_deg {
        TurnKind::Straight
    } else if delta > 0.0 {
        TurnKind::TurnRight
    } else {
        TurnKind::TurnLeft
    }
}

/// Next instruction for a vehicle at `current` following `path`.
///
/// Returns `None` for paths with fewer than two vertices. The closest vertex
/// is treated as passed once within the arrival threshold; reaching the last
/// vertex yields an arrive instruction naming `destination_name`.
///
/// # Examples
/// ```
/// use schoolrun_core::{GuidanceConfig, TurnKind, next_instruction, geodesy::lat_lng};
///
/// let path = [lat_lng(0.0, 0.0), lat_lng(0.0, 0.01)];
/// let near_end = lat_lng(0.0, 0.0099);
/// let instruction = next_instruction(near_end, &path, "School", &GuidanceConfig::default())
///     .expect("two-point path yields guidance");
/// assert_eq!(instruction.kind, TurnKind::Arrive);
/// ```
#[must_use]
pub fn next_instruction(
    current: Coord<f64>,
    path: &[Coord<f64>],
    destination_name: &str,
    config: &GuidanceConfig,
) -> Option<NavigationInstruction> {
    if path.len() < 2 {
        return None;
    }
    let last = path.len() - 1;
    let (mut index, closest) = closest_vertex(current, path)?;
    if closest < config.arrival_threshold_m && index < last {
        index += 1;
    }
    if index >= last {
        return Some(NavigationInstruction::arrive(destination_name));
    }

    let vertex = *path.get(index)?;
    let following = *path.get(index + 1)?;
    let approach_from = index
        .checked_sub(1)
        .and_then(|previous| path.get(previous).copied())
        .unwrap_or(current);

    let next_bearing = bearing(vertex, following);
    let current_bearing = if distance_m(approach_from, vertex) < MIN_APPROACH_M {
        next_bearing
    } else {
        bearing(approach_from, vertex)
    };
    let kind = classify_turn(next_bearing - current_bearing, config.straight_threshold_deg);
    Some(NavigationInstruction::manoeuvre(
        kind,
        leg_metres(vertex, following),
    ))
}

/// Complete instruction list for `path` as seen from `current`.
///
/// The first leg runs straight from `current` to the second vertex; each
/// later vertex is classified against the previous leg's bearing. The list
/// ends with an arrive instruction. Paths with fewer than two vertices yield
/// an empty list.
#[must_use]
pub fn route_instructions(
    current: Coord<f64>,
    path: &[Coord<f64>],
    destination_name: &str,
    config: &GuidanceConfig,
) -> Vec<NavigationInstruction> {
    if path.len() < 2 {
        return Vec::new();
    }
    let mut instructions = Vec::with_capacity(path.len());
    let mut previous_bearing = None;
    for (index, pair) in path.windows(2).enumerate() {
        let [vertex, following] = pair else {
            continue;
        };
        let from = if index == 0 { current } else { *vertex };
        let leg_bearing = bearing(from, *following);
        let distance = leg_metres(from, *following);
        let kind = previous_bearing.map_or(TurnKind::Straight, |previous: f64| {
            classify_turn(leg_bearing - previous, config.straight_threshold_deg)
        });
        instructions.push(NavigationInstruction::manoeuvre(kind, distance));
        previous_bearing = Some(leg_bearing);
    }
    instructions.push(NavigationInstruction::arrive(destination_name));
    instructions
}

/// Index of the vertex nearest to `current` and its distance in metres.
///
/// Ties keep the earliest vertex.
fn closest_vertex(current: Coord<f64>, path: &[Coord<f64>]) -> Option<(usize, f64)> {
    path.iter()
        .enumerate()
        .map(|(index, vertex)| (index, distance_m(current, *vertex)))
        .fold(None, |best, (index, distance)| match best {
            Some((_, best_distance)) if best_distance <= distance => best,
            _ => Some((index, distance)),
        })
}

#[expect(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    reason = "distances are non-negative and saturate on overflow"
)]
fn leg_metres(from: Coord<f64>, to: Coord<f64>) -> u32 {
    distance_m(from, to).round() as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geodesy::lat_lng;
    use rstest::{fixture, rstest};

    #[fixture]
    fn config() -> GuidanceConfig {
        GuidanceConfig::default()
    }

    /// East along the equator, then north: a left turn at the corner.
    fn corner_path() -> Vec<Coord<f64>> {
        vec![lat_lng(0.0, 0.0), lat_lng(0.0, 0.01), lat_lng(0.01, 0.01)]
    }

    #[rstest]
    #[case(0.0, TurnKind::Straight)]
    #[case(29.9, TurnKind::Straight)]
    #[case(-29.9, TurnKind::Straight)]
    #[case(30.0, TurnKind::TurnRight)]
    #[case(90.0, TurnKind::TurnRight)]
    #[case(-90.0, TurnKind::TurnLeft)]
    #[case(-30.0, TurnKind::TurnLeft)]
    #[case(350.0, TurnKind::Straight)]
    #[case(-270.0, TurnKind::TurnRight)]
    fn turns_are_classified_by_signed_delta(#[case] delta: f64, #[case] expected: TurnKind) {
        assert_eq!(classify_turn(delta, 30.0), expected);
    }

    #[rstest]
    fn threshold_is_tunable() {
        assert_eq!(classify_turn(40.0, 45.0), TurnKind::Straight);
        assert_eq!(classify_turn(40.0, 30.0), TurnKind::TurnRight);
    }

    #[rstest]
    #[case(&[][..])]
    #[case(&[lat_lng(0.0, 0.0)][..])]
    fn short_paths_yield_no_instruction(config: GuidanceConfig, #[case] path: &[Coord<f64>]) {
        assert!(next_instruction(lat_lng(0.0, 0.0), path, "School", &config).is_none());
        assert!(route_instructions(lat_lng(0.0, 0.0), path, "School", &config).is_empty());
    }

    #[rstest]
    fn two_point_path_arrives_within_threshold(config: GuidanceConfig) {
        let path = [lat_lng(0.0, 0.0), lat_lng(0.0, 0.01)];
        let instruction = next_instruction(lat_lng(0.0, 0.0098), &path, "Escola", &config)
            .expect("guidance for a two-point path");
        assert_eq!(instruction.kind, TurnKind::Arrive);
        assert_eq!(instruction.distance_m, 0);
        assert_eq!(instruction.text, "You have arrived: Escola");
    }

    #[rstest]
    fn leaving_the_start_reports_the_first_leg(config: GuidanceConfig) {
        let path = [lat_lng(0.0, 0.0), lat_lng(0.0, 0.01)];
        // Behind the start on the same heading and well outside the threshold.
        let instruction = next_instruction(lat_lng(0.0, -0.002), &path, "School", &config)
            .expect("guidance for a two-point path");
        assert_eq!(instruction.kind, TurnKind::Straight);
        assert_eq!(instruction.distance_m, 1112);
        assert_eq!(instruction.text, "Continue straight for 1112 m");
    }

    #[rstest]
    fn standing_on_the_start_is_straight(config: GuidanceConfig) {
        let path = [lat_lng(0.0, 0.0), lat_lng(0.0, 0.01), lat_lng(0.0, 0.02)];
        // Within the threshold of the start, so the first vertex is passed
        // and the approach comes from the start vertex itself.
        let instruction = next_instruction(lat_lng(0.0, 0.0), &path, "School", &config)
            .expect("guidance for a three-point path");
        assert_eq!(instruction.kind, TurnKind::Straight);
    }

    #[rstest]
    fn corner_is_a_left_turn(config: GuidanceConfig) {
        // Approaching the corner but still outside the arrival threshold.
        let instruction = next_instruction(lat_lng(0.0, 0.009), &corner_path(), "School", &config)
            .expect("guidance at the corner");
        assert_eq!(instruction.kind, TurnKind::TurnLeft);
        assert_eq!(instruction.distance_m, 1112);
    }

    #[rstest]
    fn mirrored_corner_is_a_right_turn(config: GuidanceConfig) {
        let path = [lat_lng(0.0, 0.0), lat_lng(0.0, 0.01), lat_lng(-0.01, 0.01)];
        let instruction = next_instruction(lat_lng(0.0, 0.009), &path, "School", &config)
            .expect("guidance at the corner");
        assert_eq!(instruction.kind, TurnKind::TurnRight);
    }

    #[rstest]
    fn full_route_lists_every_leg(config: GuidanceConfig) {
        let instructions =
            route_instructions(lat_lng(0.0, 0.0), &corner_path(), "School", &config);
        let kinds: Vec<_> = instructions.iter().map(|i| i.kind).collect();
        assert_eq!(
            kinds,
            [TurnKind::Straight, TurnKind::TurnLeft, TurnKind::Arrive]
        );
        assert_eq!(
            instructions.last().map(|i| i.text.as_str()),
            Some("You have arrived: School")
        );
    }

    #[rstest]
    #[case(TurnKind::Straight, "straight")]
    #[case(TurnKind::TurnLeft, "turn-left")]
    #[case(TurnKind::TurnRight, "turn-right")]
    #[case(TurnKind::Arrive, "arrive")]
    fn kinds_render_as_kebab_case(#[case] kind: TurnKind, #[case] expected: &str) {
        assert_eq!(kind.to_string(), expected);
    }
}
