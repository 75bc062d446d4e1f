//! Response types for the OSRM-compatible Route service.
//!
//! Mapbox Directions v5 answers with the same envelope, so one set of types
//! serves both.
//!
//! See: <http://project-osrm.org/docs/v5.24.0/api/#route-service>

use serde::Deserialize;

/// Route service response.
///
/// `code` is `"Ok"` on success; any other value is a service-level failure
/// described by `message`.
#[derive(Debug, Deserialize)]
pub struct RouteResponse {
    /// Status code from the service.
    ///
    /// Common values:
    /// - `"Ok"` - Request was successful
    /// - `"InvalidQuery"` - Invalid query parameters
    /// - `"NoRoute"` - No route found between the coordinates
    /// - `"NoSegment"` - A coordinate could not be snapped to the network
    pub code: String,

    /// Optional error message when `code` is not `"Ok"`.
    pub message: Option<String>,

    /// Alternative routes, best first.
    #[serde(default)]
    pub routes: Vec<RouteEntry>,
}

impl RouteResponse {
    /// Check if the response indicates success.
    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.code == "Ok"
    }
}

/// One route in a [`RouteResponse`].
#[derive(Debug, Deserialize)]
pub struct RouteEntry {
    /// Full-overview geometry requested with `geometries=geojson`.
    pub geometry: GeoJsonLineString,
    /// Length in metres.
    pub distance: f64,
    /// Travel time in seconds.
    pub duration: f64,
}

/// GeoJSON `LineString` geometry.
///
/// Positions are `[longitude, latitude]`, optionally followed by elevation.
#[derive(Debug, Deserialize)]
pub struct GeoJsonLineString {
    /// Ordered positions.
    pub coordinates: Vec<Vec<f64>>,
}

/// Body returned alongside non-success HTTP statuses.
///
/// OSRM includes a `code`; Mapbox authentication failures carry only a
/// `message`.
#[derive(Debug, Default, Deserialize)]
pub struct ErrorBody {
    /// Service status code, when present.
    pub code: Option<String>,
    /// Human-readable description, when present.
    pub message: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserialise_success_response() {
        let json = r#"{
            "code": "Ok",
            "routes": [{
                "geometry": {"type": "LineString", "coordinates": [[-46.65, -23.56], [-46.63, -23.55]]},
                "distance": 2456.7,
                "duration": 312.4,
                "legs": []
            }],
            "waypoints": []
        }"#;

        let response: RouteResponse = serde_json::from_str(json).expect("should deserialise");

        assert!(response.is_ok());
        let route = response.routes.first().expect("one route");
        assert_eq!(route.geometry.coordinates.len(), 2);
        assert_eq!(route.distance, 2456.7);
        assert_eq!(route.duration, 312.4);
    }

    #[test]
    fn deserialise_error_response() {
        let json = r#"{
            "code": "NoRoute",
            "message": "Impossible route between points"
        }"#;

        let response: RouteResponse = serde_json::from_str(json).expect("should deserialise");

        assert!(!response.is_ok());
        assert_eq!(
            response.message.as_deref(),
            Some("Impossible route between points")
        );
        assert!(response.routes.is_empty());
    }

    #[test]
    fn deserialise_positions_with_elevation() {
        let json = r#"{"coordinates": [[1.0, 2.0, 30.0], [3.0, 4.0, 31.0]]}"#;

        let geometry: GeoJsonLineString = serde_json::from_str(json).expect("should deserialise");

        assert_eq!(geometry.coordinates.len(), 2);
    }

    #[test]
    fn deserialise_message_only_error_body() {
        let json = r#"{"message": "Not Authorized - Invalid Token"}"#;

        let body: ErrorBody = serde_json::from_str(json).expect("should deserialise");

        assert!(body.code.is_none());
        assert_eq!(body.message.as_deref(), Some("Not Authorized - Invalid Token"));
    }
}
