//! Reservations on top of the scooter map.
//!
//! A reservation pins one scooter to one user until it is parked. The
//! reservation code is a random UUID handed to the client; parking consumes
//! it, so a code can be used at most once.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use uuid::Uuid;

use crate::error::DomainError;
use crate::location::Location;
use crate::scooter::ScooterId;
use crate::scooter_map::{RewardCandidates, ScooterMap};

/// Price per unit of Manhattan distance travelled.
pub const PRICE_PER_CELL: f64 = 0.1;

/// Price per whole minute the reservation was held.
pub const PRICE_PER_MINUTE: f64 = 0.2;

/// What the client gets back from a successful reservation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReservationTicket {
    pub code: String,
    pub location: Location,
}

/// A completed trip, produced by parking.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Trip {
    pub origin: Location,
    pub destination: Location,
    pub price: f64,
}

#[derive(Debug, Clone)]
pub struct Reservation {
    pub username: String,
    pub scooter: ScooterId,
    pub origin: Location,
    pub reserved_at: Instant,
}

impl Reservation {
    /// `0.1 × distance + 0.2 × whole minutes`.
    pub fn price_of_trip(distance: i64, elapsed: Duration) -> f64 {
        let minutes = (elapsed.as_secs() / 60) as f64;
        distance.max(0) as f64 * PRICE_PER_CELL + minutes * PRICE_PER_MINUTE
    }
}

#[derive(Debug)]
pub struct Fleet {
    map: ScooterMap,
    reservations: HashMap<Uuid, Reservation>,
}

impl Fleet {
    pub fn new(map: ScooterMap) -> Self {
        Fleet {
            map,
            reservations: HashMap::new(),
        }
    }

    pub fn map(&self) -> &ScooterMap {
        &self.map
    }

    pub fn active_reservations(&self) -> usize {
        self.reservations.len()
    }

    pub fn list_free_scooters(&self, range: i32, origin: Location) -> Vec<Location> {
        self.map.free_scooters_within(range, origin)
    }

    /// Reserve the closest free scooter within `range` of `origin`.
    pub fn reserve(
        &mut self,
        range: i32,
        origin: Location,
        username: &str,
    ) -> Result<ReservationTicket, DomainError> {
        let (scooter, location) = self
            .map
            .reserve_closest(range, origin)
            .ok_or(DomainError::NoScooterInRange { origin, range })?;

        let code = Uuid::new_v4();
        self.reservations.insert(
            code,
            Reservation {
                username: username.to_string(),
                scooter,
                origin: location,
                reserved_at: Instant::now(),
            },
        );

        Ok(ReservationTicket {
            code: code.to_string(),
            location,
        })
    }

    /// Park the scooter held by reservation `code` at `destination`.
    ///
    /// The code must exist and belong to `username`; on success it is
    /// consumed.
    pub fn park(&mut self, code: &str, destination: Location, username: &str) -> Result<Trip, DomainError> {
        let invalid = || DomainError::InvalidReservation(code.to_string());

        let key = Uuid::parse_str(code).map_err(|_| invalid())?;
        match self.reservations.get(&key) {
            Some(r) if r.username == username => {}
            _ => return Err(invalid()),
        }
        if !self.map.contains(destination) {
            return Err(DomainError::OutOfBounds(destination));
        }

        let reservation = self.reservations.remove(&key).ok_or_else(invalid)?;
        self.map
            .relocate(reservation.scooter, reservation.origin, destination)?;

        let distance = reservation.origin.manhattan_distance(destination);
        Ok(Trip {
            origin: reservation.origin,
            destination,
            price: Reservation::price_of_trip(distance, reservation.reserved_at.elapsed()),
        })
    }

    pub fn reward_candidates(&self, empty_radius: i32) -> RewardCandidates {
        self.map.reward_candidates(empty_radius)
    }
}
