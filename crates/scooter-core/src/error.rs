//! Error types for the scooter domain.
//!
//! These never cross the wire as errors: the server's scooter handler maps
//! each variant onto a response code.

use thiserror::Error;

use crate::location::Location;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    /// The user has no active login.
    #[error("user `{0}` is not logged in")]
    NotAuthenticated(String),

    /// No free scooter within the requested range.
    #[error("no free scooter within {range} of {origin}")]
    NoScooterInRange { origin: Location, range: i32 },

    /// Unknown, malformed, foreign or already-used reservation code.
    #[error("invalid reservation code `{0}`")]
    InvalidReservation(String),

    /// The location lies outside the grid.
    #[error("location {0} is outside the map")]
    OutOfBounds(Location),
}
