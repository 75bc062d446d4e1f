//! HTTP-based `DirectionsProvider` speaking the OSRM Route API.
//!
//! This module provides [`HttpDirectionsProvider`], an implementation of the
//! [`DirectionsProvider`] trait that fetches a drivable route through ordered
//! waypoints from an OSRM server or from Mapbox Directions.
//!
//! # Architecture
//!
//! The provider is natively asynchronous. Callers await [`route`] from their
//! own Tokio runtime, so position updates and guidance are never blocked on
//! network I/O.
//!
//! [`route`]: DirectionsProvider::route
//!
//! # Example
//!
//! ```no_run
//! use schoolrun_core::{DirectionsProvider, geodesy::lat_lng};
//! use schoolrun_data::routing::HttpDirectionsProvider;
//!
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! let provider = HttpDirectionsProvider::new("http://localhost:5000")?;
//! let route = provider
//!     .route(&[lat_lng(-23.56, -46.65), lat_lng(-23.55, -46.63)])
//!     .await?;
//! println!("{} m in {:?}", route.distance_m, route.duration);
//! # Ok(())
//! # }
//! ```

use std::time::Duration;

use async_trait::async_trait;
use geo::{Coord, LineString};
use log::debug;
use reqwest::{Client, StatusCode};
use schoolrun_core::{DirectionsError, DirectionsProvider, ResolvedRoute};
use url::Url;

use super::osrm::{ErrorBody, RouteResponse};

/// Error type for [`HttpDirectionsProvider`] construction failures.
#[derive(Debug)]
pub enum ProviderBuildError {
    /// Failed to build the HTTP client.
    HttpClient(reqwest::Error),
    /// The configured base URL could not be parsed.
    InvalidBaseUrl(url::ParseError),
    /// The configured base URL cannot carry path segments.
    UnsupportedBaseUrl(String),
}

impl std::fmt::Display for ProviderBuildError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::HttpClient(err) => write!(f, "failed to build HTTP client: {err}"),
            Self::InvalidBaseUrl(err) => write!(f, "invalid base URL: {err}"),
            Self::UnsupportedBaseUrl(url) => write!(f, "base URL {url} cannot carry a path"),
        }
    }
}

impl std::error::Error for ProviderBuildError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::HttpClient(err) => Some(err),
            Self::InvalidBaseUrl(err) => Some(err),
            Self::UnsupportedBaseUrl(_) => None,
        }
    }
}

/// Default user agent for directions requests.
pub const DEFAULT_USER_AGENT: &str = "schoolrun-routing/0.1";

/// Base URL of the hosted Mapbox API.
pub const MAPBOX_BASE_URL: &str = "https://api.mapbox.com";

/// Default request timeout in seconds.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Query parameter carrying the access token; never echoed in errors.
const ACCESS_TOKEN_PARAM: &str = "access_token";

/// Configuration for [`HttpDirectionsProvider`].
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct HttpDirectionsProviderConfig {
    /// Base URL for the service (e.g., `"http://localhost:5000"`).
    pub base_url: String,
    /// Service path below the base URL (e.g., `"route/v1"`).
    pub service: String,
    /// Routing profile (e.g., `"driving"` or `"mapbox/driving"`).
    pub profile: String,
    /// Request timeout duration.
    pub timeout: Duration,
    /// User agent string for requests.
    pub user_agent: String,
    /// Access token appended as a query parameter when set.
    pub access_token: Option<String>,
}

impl Default for HttpDirectionsProviderConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5000".to_owned(),
            service: "route/v1".to_owned(),
            profile: "driving".to_owned(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            user_agent: DEFAULT_USER_AGENT.to_owned(),
            access_token: None,
        }
    }
}

impl HttpDirectionsProviderConfig {
    /// Create a new configuration with the given base URL.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }

    /// Configuration for Mapbox Directions driving routes.
    #[must_use]
    pub fn mapbox(access_token: impl Into<String>) -> Self {
        Self {
            base_url: MAPBOX_BASE_URL.to_owned(),
            service: "directions/v5".to_owned(),
            profile: "mapbox/driving".to_owned(),
            access_token: Some(access_token.into()),
            ..Default::default()
        }
    }

    /// Set the service path.
    #[must_use]
    pub fn with_service(mut self, service: impl Into<String>) -> Self {
        self.service = service.into();
        self
    }

    /// Set the routing profile.
    #[must_use]
    pub fn with_profile(mut self, profile: impl Into<String>) -> Self {
        self.profile = profile.into();
        self
    }

    /// Set the request timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the user agent string.
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Set the access token.
    #[must_use]
    pub fn with_access_token(mut self, access_token: impl Into<String>) -> Self {
        self.access_token = Some(access_token.into());
        self
    }
}

/// HTTP-based directions provider using the OSRM Route API.
///
/// One request is made per call with `geometries=geojson&overview=full`, and
/// the first (best) route is returned. The access token, if any, is removed
/// from URLs reported in errors.
pub struct HttpDirectionsProvider {
    client: Client,
    config: HttpDirectionsProviderConfig,
    base_url: Url,
}

impl std::fmt::Debug for HttpDirectionsProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpDirectionsProvider")
            .field("client", &self.client)
            .field("base_url", &self.base_url.as_str())
            .field("service", &self.config.service)
            .field("profile", &self.config.profile)
            .field("timeout", &self.config.timeout)
            .field("access_token", &self.config.access_token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl HttpDirectionsProvider {
    /// Create a new provider with default configuration.
    ///
    /// # Arguments
    ///
    /// * `base_url` - Base URL for the OSRM service (e.g., `"http://localhost:5000"`)
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL is invalid or the HTTP client fails
    /// to build.
    pub fn new(base_url: impl Into<String>) -> Result<Self, ProviderBuildError> {
        Self::with_config(HttpDirectionsProviderConfig::new(base_url))
    }

    /// Create a new provider with explicit configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL is invalid or the HTTP client fails
    /// to build.
    pub fn with_config(config: HttpDirectionsProviderConfig) -> Result<Self, ProviderBuildError> {
        let base_url = Url::parse(&config.base_url).map_err(ProviderBuildError::InvalidBaseUrl)?;
        if base_url.cannot_be_a_base() {
            return Err(ProviderBuildError::UnsupportedBaseUrl(config.base_url));
        }
        let client = Client::builder()
            .user_agent(&config.user_agent)
            .connect_timeout(config.timeout)
            .timeout(config.timeout)
            .build()
            .map_err(ProviderBuildError::HttpClient)?;
        Ok(Self {
            client,
            config,
            base_url,
        })
    }

    /// Active configuration.
    #[must_use]
    pub const fn config(&self) -> &HttpDirectionsProviderConfig {
        &self.config
    }

    /// Build the Route API URL for the given waypoints.
    ///
    /// The URL format is:
    /// `{base_url}/{service}/{profile}/{coordinates}?geometries=geojson&overview=full`
    /// where coordinates are semicolon-separated `lon,lat` pairs.
    fn build_route_url(&self, waypoints: &[Coord<f64>]) -> Url {
        let coords = waypoints
            .iter()
            .map(|point| format!("{},{}", point.x, point.y))
            .collect::<Vec<_>>()
            .join(";");

        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty();
            segments.extend(split_path(&self.config.service));
            segments.extend(split_path(&self.config.profile));
            segments.push(&coords);
        }
        {
            let mut query = url.query_pairs_mut();
            query
                .append_pair("geometries", "geojson")
                .append_pair("overview", "full");
            if let Some(token) = &self.config.access_token {
                query.append_pair(ACCESS_TOKEN_PARAM, token);
            }
        }
        url
    }

    /// Fetch and decode the route.
    async fn fetch_route(&self, waypoints: &[Coord<f64>]) -> Result<ResolvedRoute, DirectionsError> {
        let url = self.build_route_url(waypoints);
        let shown = redact(&url);
        debug!("requesting route through {} waypoints: {shown}", waypoints.len());

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|err| self.convert_reqwest_error(err, &shown))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|err| self.convert_reqwest_error(err, &shown))?;

        if !status.is_success() {
            return Err(convert_error_status(status, &body, &shown));
        }

        let route_response: RouteResponse =
            serde_json::from_str(&body).map_err(|err| DirectionsError::Parse {
                message: err.to_string(),
            })?;

        convert_response(route_response)
    }

    /// Convert a reqwest error to a `DirectionsError`.
    fn convert_reqwest_error(&self, error: reqwest::Error, url: &str) -> DirectionsError {
        let error = error.without_url();
        if error.is_timeout() {
            return DirectionsError::Timeout {
                url: url.to_owned(),
                timeout_secs: self.config.timeout.as_secs(),
            };
        }

        if let Some(status) = error.status() {
            return DirectionsError::Http {
                url: url.to_owned(),
                status: status.as_u16(),
                message: error.to_string(),
            };
        }

        DirectionsError::Network {
            url: url.to_owned(),
            message: error.to_string(),
        }
    }
}

#[async_trait]
impl DirectionsProvider for HttpDirectionsProvider {
    async fn route(&self, waypoints: &[Coord<f64>]) -> Result<ResolvedRoute, DirectionsError> {
        if waypoints.len() < 2 {
            return Err(DirectionsError::TooFewWaypoints);
        }
        self.fetch_route(waypoints).await
    }
}

fn split_path(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|part| !part.is_empty())
}

/// Render `url` without its access token.
fn redact(url: &Url) -> String {
    let mut shown = url.clone();
    let kept: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(key, _)| key != ACCESS_TOKEN_PARAM)
        .map(|(key, value)| (key.into_owned(), value.into_owned()))
        .collect();
    shown.query_pairs_mut().clear().extend_pairs(kept);
    shown.into()
}

/// Map a non-success HTTP status to a `DirectionsError`.
///
/// OSRM reports routing failures with a 4xx status and a JSON `code`; those
/// are surfaced as service errors like their 200 counterparts.
fn convert_error_status(status: StatusCode, body: &str, url: &str) -> DirectionsError {
    let parsed: ErrorBody = serde_json::from_str(body).unwrap_or_default();
    match parsed.code {
        Some(code) if code == "NoRoute" => DirectionsError::NoRoute,
        Some(code) if code != "Ok" => DirectionsError::Service {
            code,
            message: parsed.message.unwrap_or_default(),
        },
        _ => DirectionsError::Http {
            url: url.to_owned(),
            status: status.as_u16(),
            message: parsed
                .message
                .or_else(|| status.canonical_reason().map(str::to_owned))
                .unwrap_or_default(),
        },
    }
}

/// Convert a Route API response to a `ResolvedRoute`.
fn convert_response(response: RouteResponse) -> Result<ResolvedRoute, DirectionsError> {
    if !response.is_ok() {
        if response.code == "NoRoute" {
            return Err(DirectionsError::NoRoute);
        }
        return Err(DirectionsError::Service {
            code: response.code,
            message: response.message.unwrap_or_default(),
        });
    }

    let route = response
        .routes
        .into_iter()
        .next()
        .ok_or(DirectionsError::NoRoute)?;

    let distance = non_negative(route.distance, "distance")?;
    let seconds = non_negative(route.duration, "duration")?;
    let duration = Duration::try_from_secs_f64(seconds).map_err(|err| DirectionsError::Parse {
        message: format!("route duration {seconds}: {err}"),
    })?;

    let coordinates: Vec<Coord<f64>> = route
        .geometry
        .coordinates
        .iter()
        .filter_map(|position| match position.as_slice() {
            [x, y, ..] => Some(Coord { x: *x, y: *y }),
            _ => None,
        })
        .collect();
    if coordinates.len() < 2 {
        return Err(DirectionsError::Parse {
            message: format!(
                "route geometry has {} usable positions, need at least 2",
                coordinates.len()
            ),
        });
    }

    Ok(ResolvedRoute::new(
        LineString::from(coordinates),
        distance,
        duration,
    ))
}

fn non_negative(value: f64, field: &str) -> Result<f64, DirectionsError> {
    if value.is_finite() && value >= 0.0 {
        Ok(value)
    } else {
        Err(DirectionsError::Parse {
            message: format!("route {field} {value} is not a non-negative number"),
        })
    }
}
