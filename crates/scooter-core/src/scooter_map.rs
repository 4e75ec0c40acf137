//! N×N scooter grid.
//!
//! - Coordinates are discrete `(x, y)` pairs in `0..size`.
//! - Each cell holds any number of scooters, free or reserved.
//! - Distances are Manhattan distances.
//!
//! The map is not synchronized; [`crate::Fleet`] owns it and
//! [`crate::DomainService`] guards the fleet with a lock.

use rand::Rng;

use crate::error::DomainError;
use crate::location::Location;
use crate::scooter::{Scooter, ScooterId};

/// Origins and destinations eligible for a reward path.
///
/// Every origin pairs with every destination.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RewardCandidates {
    /// Cells currently holding two or more scooters.
    pub origins: Vec<Location>,

    /// Empty cells with no scooter within the empty radius.
    pub destinations: Vec<Location>,
}

impl RewardCandidates {
    pub fn is_empty(&self) -> bool {
        self.origins.is_empty() || self.destinations.is_empty()
    }
}

#[derive(Debug)]
pub struct ScooterMap {
    size: i32,

    /// Row-major: `cells[y][x]`.
    cells: Vec<Vec<Vec<Scooter>>>,
}

impl ScooterMap {
    /// Create an empty `size × size` map.
    ///
    /// Callers bound `size`; the grid is allocated up front.
    pub fn new(size: usize) -> Self {
        let side = size.min(i32::MAX as usize);
        ScooterMap {
            size: side as i32,
            cells: vec![vec![Vec::new(); side]; side],
        }
    }

    pub fn size(&self) -> i32 {
        self.size
    }

    pub fn contains(&self, location: Location) -> bool {
        (0..self.size).contains(&location.x) && (0..self.size).contains(&location.y)
    }

    /// Scatter `count` free scooters uniformly over the grid.
    pub fn populate<R: Rng + ?Sized>(&mut self, count: usize, rng: &mut R) {
        if self.size <= 0 {
            return;
        }
        for _ in 0..count {
            let location = Location::new(rng.gen_range(0..self.size), rng.gen_range(0..self.size));
            self.cell_mut(location).push(Scooter::new(location));
        }
    }

    /// Place one free scooter at `location`.
    pub fn place(&mut self, location: Location) -> Result<ScooterId, DomainError> {
        if !self.contains(location) {
            return Err(DomainError::OutOfBounds(location));
        }
        let scooter = Scooter::new(location);
        let id = scooter.id;
        self.cell_mut(location).push(scooter);
        Ok(id)
    }

    /// Number of scooters at `location`, reserved ones included.
    pub fn scooters_at(&self, location: Location) -> usize {
        if !self.contains(location) {
            return 0;
        }
        self.cell(location).len()
    }

    /// Total number of scooters on the map.
    pub fn total_scooters(&self) -> usize {
        self.cells.iter().flatten().map(Vec::len).sum()
    }

    /// Locations of every free scooter within `range` of `origin`, in
    /// row-major order (one entry per scooter).
    pub fn free_scooters_within(&self, range: i32, origin: Location) -> Vec<Location> {
        self.iter_cells()
            .filter(|(location, _)| location.manhattan_distance(origin) <= i64::from(range))
            .flat_map(|(location, scooters)| {
                scooters
                    .iter()
                    .filter(|s| !s.in_use)
                    .map(move |_| location)
            })
            .collect()
    }

    /// Mark the free scooter closest to `origin` (within `range`) as in use.
    ///
    /// Ties are broken by row-major order.
    pub fn reserve_closest(&mut self, range: i32, origin: Location) -> Option<(ScooterId, Location)> {
        let (location, index) = self
            .iter_cells()
            .filter_map(|(location, scooters)| {
                let distance = location.manhattan_distance(origin);
                if distance > i64::from(range) {
                    return None;
                }
                scooters
                    .iter()
                    .position(|s| !s.in_use)
                    .map(|index| (distance, location, index))
            })
            .min_by_key(|(distance, _, _)| *distance)
            .map(|(_, location, index)| (location, index))?;

        let scooter = &mut self.cell_mut(location)[index];
        scooter.in_use = true;
        Some((scooter.id, location))
    }

    /// Move scooter `id` from `from` to `to` and mark it free again.
    pub fn relocate(&mut self, id: ScooterId, from: Location, to: Location) -> Result<(), DomainError> {
        if !self.contains(to) {
            return Err(DomainError::OutOfBounds(to));
        }
        if !self.contains(from) {
            return Err(DomainError::OutOfBounds(from));
        }

        let source = self.cell_mut(from);
        let Some(index) = source.iter().position(|s| s.id == id) else {
            return Err(DomainError::InvalidReservation(id.to_string()));
        };
        let mut scooter = source.remove(index);
        scooter.location = to;
        scooter.in_use = false;
        self.cell_mut(to).push(scooter);
        Ok(())
    }

    /// Origins and destinations for the reward-path index.
    ///
    /// A destination is an empty cell with no scooter at Manhattan distance
    /// `<= empty_radius`. A non-positive radius yields no candidates.
    pub fn reward_candidates(&self, empty_radius: i32) -> RewardCandidates {
        let mut candidates = RewardCandidates::default();
        if empty_radius <= 0 {
            return candidates;
        }

        let occupied: Vec<Location> = self
            .iter_cells()
            .filter(|(_, scooters)| !scooters.is_empty())
            .map(|(location, _)| location)
            .collect();

        for (location, scooters) in self.iter_cells() {
            if scooters.len() > 1 {
                candidates.origins.push(location);
            } else if scooters.is_empty()
                && occupied
                    .iter()
                    .all(|other| other.manhattan_distance(location) > i64::from(empty_radius))
            {
                candidates.destinations.push(location);
            }
        }
        candidates
    }

    fn iter_cells(&self) -> impl Iterator<Item = (Location, &Vec<Scooter>)> {
        self.cells.iter().enumerate().flat_map(|(y, row)| {
            row.iter()
                .enumerate()
                .map(move |(x, scooters)| (Location::new(x as i32, y as i32), scooters))
        })
    }

    fn cell(&self, location: Location) -> &Vec<Scooter> {
        &self.cells[location.y as usize][location.x as usize]
    }

    fn cell_mut(&mut self, location: Location) -> &mut Vec<Scooter> {
        &mut self.cells[location.y as usize][location.x as usize]
    }
}
