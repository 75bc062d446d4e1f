//! Error types raised by the navigator.

use thiserror::Error;

/// Errors from manifest edits on a [`crate::VehicleNavigator`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NavigatorError {
    /// No subject with this id is on the vehicle's roster.
    ///
    /// Also returned by [`crate::VehicleNavigator::mark_stop_completed`] when
    /// the stop id does not name a pickup on the roster.
    #[error("subject {subject_id} is not assigned to this vehicle")]
    UnknownSubject {
        /// Identifier that failed to resolve.
        subject_id: String,
    },
    /// The subject's pickup coordinate is malformed.
    #[error("subject {subject_id} has an invalid pickup location")]
    InvalidLocation {
        /// Offending subject.
        subject_id: String,
    },
}
