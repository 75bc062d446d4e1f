//! HTTP-based directions providers for routing services.
//!
//! This module provides [`HttpDirectionsProvider`], an implementation of
//! [`schoolrun_core::DirectionsProvider`] that fetches drivable routes from
//! an OSRM server or from Mapbox Directions.
//!
//! # Example
//!
//! ```no_run
//! use schoolrun_data::routing::{HttpDirectionsProvider, HttpDirectionsProviderConfig};
//! use std::time::Duration;
//!
//! // A self-hosted OSRM server with a longer timeout.
//! let config = HttpDirectionsProviderConfig::new("http://localhost:5000")
//!     .with_timeout(Duration::from_secs(60))
//!     .with_user_agent("my-app/1.0");
//! let provider = HttpDirectionsProvider::with_config(config)?;
//!
//! // Mapbox Directions.
//! let mapbox = HttpDirectionsProvider::with_config(HttpDirectionsProviderConfig::mapbox("pk.token"))?;
//! # Ok::<(), schoolrun_data::routing::ProviderBuildError>(())
//! ```

mod osrm;
mod provider;

pub use provider::{
    DEFAULT_USER_AGENT, HttpDirectionsProvider, HttpDirectionsProviderConfig, MAPBOX_BASE_URL,
    ProviderBuildError,
};
