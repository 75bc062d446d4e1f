use thiserror::Error;

/// Errors from [`crate::directions::DirectionsProvider::route`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DirectionsError {
    /// Fewer than two waypoints were provided.
    ///
    /// A route needs at least an origin and a destination. Callers should
    /// pre-filter malformed waypoints before asking for directions.
    #[error("at least two waypoints are required")]
    TooFewWaypoints,
    /// The request could not reach the service.
    #[error("request to {url} failed: {message}")]
    Network {
        /// Request URL with credentials removed.
        url: String,
        /// Transport error description.
        message: String,
    },
    /// The service did not answer in time.
    #[error("request to {url} timed out after {timeout_secs}s")]
    Timeout {
        /// Request URL with credentials removed.
        url: String,
        /// Configured timeout.
        timeout_secs: u64,
    },
    /// The service answered with a non-success HTTP status.
    #[error("request to {url} returned HTTP {status}: {message}")]
    Http {
        /// Request URL with credentials removed.
        url: String,
        /// HTTP status code.
        status: u16,
        /// Response or transport description.
        message: String,
    },
    /// The service reported an application-level error code.
    #[error("directions service returned {code}: {message}")]
    Service {
        /// Service status code, e.g. `InvalidQuery`.
        code: String,
        /// Service message, possibly empty.
        message: String,
    },
    /// The service found no route between the waypoints.
    #[error("no route found between the waypoints")]
    NoRoute,
    /// The response body could not be interpreted.
    #[error("failed to parse directions response: {message}")]
    Parse {
        /// Decoder error description.
        message: String,
    },
}
