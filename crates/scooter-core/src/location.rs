//! Discrete grid coordinates.

use std::fmt;

/// A cell on the scooter grid.
///
/// Distances between cells are Manhattan distances.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Location {
    pub x: i32,
    pub y: i32,
}

impl Location {
    pub const fn new(x: i32, y: i32) -> Self {
        Location { x, y }
    }

    /// `|Δx| + |Δy|`, widened so any two `i32` coordinates are representable.
    pub fn manhattan_distance(&self, other: Location) -> i64 {
        (i64::from(self.x) - i64::from(other.x)).abs()
            + (i64::from(self.y) - i64::from(other.y)).abs()
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({},{})", self.x, self.y)
    }
}

impl From<(i32, i32)> for Location {
    fn from((x, y): (i32, i32)) -> Self {
        Location::new(x, y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manhattan_distance_is_symmetric() {
        let a = Location::new(2, 2);
        let b = Location::new(6, 5);
        assert_eq!(a.manhattan_distance(b), 7);
        assert_eq!(b.manhattan_distance(a), 7);
        assert_eq!(a.manhattan_distance(a), 0);
    }

    #[test]
    fn manhattan_distance_spans_the_whole_i32_plane() {
        let low = Location::new(i32::MIN, i32::MIN);
        let high = Location::new(i32::MAX, i32::MAX);
        assert_eq!(low.manhattan_distance(high), 2 * (u32::MAX as i64));
        assert_eq!(high.manhattan_distance(low), 2 * (u32::MAX as i64));
    }

    #[test]
    fn display_matches_wire_friendly_form() {
        assert_eq!(Location::new(-1, 3).to_string(), "(-1,3)");
    }
}
