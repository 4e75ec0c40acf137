//! Reward-path index.
//!
//! A reward path marks a rebalancing opportunity: move a scooter from a
//! crowded cell (`start`) to an isolated empty cell (`finish`) and collect
//! `reward`. The index is rebuilt from scratch out of
//! [`RewardCandidates`] every broadcast cycle; the only in-place mutation is
//! [`RewardIndex::claim`], which removes a path once a trip completes it.

use std::collections::HashMap;
use std::fmt;

use crate::location::Location;
use crate::scooter_map::RewardCandidates;
use crate::subscriptions::Watch;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RewardPath {
    pub start: Location,
    pub finish: Location,
    pub reward: f64,
}

impl RewardPath {
    pub fn new(start: Location, finish: Location, reward: f64) -> Self {
        RewardPath {
            start,
            finish,
            reward,
        }
    }

    fn key(&self) -> (Location, Location) {
        (self.start, self.finish)
    }
}

impl fmt::Display for RewardPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {} for {:.2}", self.start, self.finish, self.reward)
    }
}

#[derive(Debug, Default)]
pub struct RewardIndex {
    /// start -> finish -> reward
    by_start: HashMap<Location, HashMap<Location, f64>>,
}

impl RewardIndex {
    pub fn new() -> Self {
        RewardIndex::default()
    }

    /// Pair every origin with every destination at a fixed reward.
    pub fn build(candidates: &RewardCandidates, reward: f64) -> Self {
        let mut by_start = HashMap::new();
        if candidates.destinations.is_empty() {
            return RewardIndex { by_start };
        }
        for &start in &candidates.origins {
            let finishes = candidates
                .destinations
                .iter()
                .map(|&finish| (finish, reward))
                .collect();
            by_start.insert(start, finishes);
        }
        RewardIndex { by_start }
    }

    /// Number of paths in the index.
    pub fn len(&self) -> usize {
        self.by_start.values().map(HashMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Paths starting within `range` of `origin` whose finish is also within
    /// `range` of that start.
    pub fn rewards_near(&self, origin: Location, range: i32) -> Vec<RewardPath> {
        let range = i64::from(range);
        self.collect_sorted(|path| {
            path.start.manhattan_distance(origin) <= range
                && path.start.manhattan_distance(path.finish) <= range
        })
    }

    /// Paths ending inside any of `watches`, each path reported once.
    pub fn matching(&self, watches: &[Watch]) -> Vec<RewardPath> {
        self.collect_sorted(|path| watches.iter().any(|w| w.covers(path.finish)))
    }

    /// Remove the `start -> finish` path, returning its reward.
    pub fn claim(&mut self, start: Location, finish: Location) -> Option<f64> {
        let finishes = self.by_start.get_mut(&start)?;
        let reward = finishes.remove(&finish);
        if finishes.is_empty() {
            self.by_start.remove(&start);
        }
        reward
    }

    fn collect_sorted<F>(&self, mut keep: F) -> Vec<RewardPath>
    where
        F: FnMut(&RewardPath) -> bool,
    {
        let mut paths: Vec<RewardPath> = self
            .by_start
            .iter()
            .flat_map(|(&start, finishes)| {
                finishes
                    .iter()
                    .map(move |(&finish, &reward)| RewardPath::new(start, finish, reward))
            })
            .filter(|path| keep(path))
            .collect();
        paths.sort_by_key(RewardPath::key);
        paths
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidates() -> RewardCandidates {
        RewardCandidates {
            origins: vec![Location::new(2, 2), Location::new(0, 9)],
            destinations: vec![Location::new(6, 6), Location::new(9, 0)],
        }
    }

    #[test]
    fn build_pairs_every_origin_with_every_destination() {
        let index = RewardIndex::build(&candidates(), 10.0);
        assert_eq!(index.len(), 4);

        let none = RewardCandidates {
            origins: vec![Location::new(1, 1)],
            destinations: vec![],
        };
        assert!(RewardIndex::build(&none, 10.0).is_empty());
    }

    #[test]
    fn matching_filters_on_finish() {
        let index = RewardIndex::build(&candidates(), 10.0);
        let paths = index.matching(&[Watch::new(Location::new(6, 6), 2)]);
        assert_eq!(
            paths,
            vec![
                RewardPath::new(Location::new(0, 9), Location::new(6, 6), 10.0),
                RewardPath::new(Location::new(2, 2), Location::new(6, 6), 10.0),
            ]
        );
    }

    #[test]
    fn matching_reports_each_path_once() {
        let index = RewardIndex::build(&candidates(), 10.0);
        let watches = [
            Watch::new(Location::new(6, 6), 1),
            Watch::new(Location::new(6, 7), 1),
        ];
        assert_eq!(index.matching(&watches).len(), 2);
    }

    #[test]
    fn rewards_near_bounds_start_and_trip_length() {
        let index = RewardIndex::build(&candidates(), 10.0);
        let paths = index.rewards_near(Location::new(2, 3), 8);
        assert_eq!(
            paths,
            vec![RewardPath::new(Location::new(2, 2), Location::new(6, 6), 10.0)]
        );
    }

    #[test]
    fn claim_removes_the_path() {
        let mut index = RewardIndex::build(&candidates(), 10.0);
        assert_eq!(index.claim(Location::new(2, 2), Location::new(6, 6)), Some(10.0));
        assert_eq!(index.claim(Location::new(2, 2), Location::new(6, 6)), None);
        assert_eq!(index.len(), 3);
    }
}
