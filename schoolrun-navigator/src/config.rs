//! Per-vehicle navigator configuration.

use geo::Coord;
use schoolrun_core::{ConformanceConfig, GuidanceConfig, SequencerConfig};

/// Per-vehicle settings for a [`crate::VehicleNavigator`].
///
/// # Examples
/// ```
/// use std::time::Duration;
///
/// use schoolrun_core::{ConformanceConfig, geodesy::lat_lng};
/// use schoolrun_navigator::NavigatorConfig;
///
/// let config = NavigatorConfig::new(lat_lng(-23.55, -46.63), "Escola Central")
///     .with_fallback_position(lat_lng(-23.56, -46.65))
///     .with_conformance(ConformanceConfig::default().with_poll_interval(Duration::from_secs(2)));
/// assert_eq!(config.conformance.poll_interval, Duration::from_secs(2));
/// assert_eq!(config.guidance.arrival_threshold_m, 50.0);
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NavigatorConfig {
    /// School coordinate every manifest ends at.
    pub destination: Coord<f64>,
    /// Name announced by the arrive instruction.
    pub destination_name: String,
    /// Origin used until the first valid position arrives.
    #[cfg_attr(feature = "serde", serde(default))]
    pub fallback_position: Option<Coord<f64>>,
    /// Stop ordering heuristics.
    #[cfg_attr(feature = "serde", serde(default))]
    pub sequencer: SequencerConfig,
    /// Turn-by-turn thresholds.
    #[cfg_attr(feature = "serde", serde(default))]
    pub guidance: GuidanceConfig,
    /// Drift threshold and poll cadence.
    #[cfg_attr(feature = "serde", serde(default))]
    pub conformance: ConformanceConfig,
}

impl NavigatorConfig {
    /// Route to `destination` with default heuristics and no fallback origin.
    #[must_use]
    pub fn new(destination: Coord<f64>, destination_name: impl Into<String>) -> Self {
        Self {
            destination,
            destination_name: destination_name.into(),
            fallback_position: None,
            sequencer: SequencerConfig::default(),
            guidance: GuidanceConfig::default(),
            conformance: ConformanceConfig::default(),
        }
    }

    /// Plan from `position` until the vehicle reports where it is.
    #[must_use]
    pub const fn with_fallback_position(mut self, position: Coord<f64>) -> Self {
        self.fallback_position = Some(position);
        self
    }

    /// Override the sequencer settings.
    #[must_use]
    pub const fn with_sequencer(mut self, sequencer: SequencerConfig) -> Self {
        self.sequencer = sequencer;
        self
    }

    /// Override the guidance settings.
    #[must_use]
    pub const fn with_guidance(mut self, guidance: GuidanceConfig) -> Self {
        self.guidance = guidance;
        self
    }

    /// Override the conformance settings.
    #[must_use]
    pub const fn with_conformance(mut self, conformance: ConformanceConfig) -> Self {
        self.conformance = conformance;
        self
    }
}
