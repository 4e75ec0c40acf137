//! Scooter representation used inside the map.
//!
//! This type is **not** exposed over the wire; clients only ever see
//! locations and reservation codes.

use std::fmt;

use uuid::Uuid;

use crate::location::Location;

/// Opaque scooter identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScooterId(Uuid);

impl ScooterId {
    pub fn new() -> Self {
        ScooterId(Uuid::new_v4())
    }
}

impl Default for ScooterId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ScooterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// A single scooter on the grid.
#[derive(Debug, Clone)]
pub struct Scooter {
    pub id: ScooterId,
    pub location: Location,

    /// Set while a reservation holds the scooter.
    pub in_use: bool,
}

impl Scooter {
    pub fn new(location: Location) -> Self {
        Scooter {
            id: ScooterId::new(),
            location,
            in_use: false,
        }
    }
}
