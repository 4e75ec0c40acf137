//! Reward-notification subscriptions.
//!
//! A subscribed user watches any number of locations, each with its own
//! radius. Watches keep insertion order and are de-duplicated.

use std::collections::HashMap;

use indexmap::IndexSet;

use crate::location::Location;

/// A watched location.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Watch {
    pub location: Location,
    pub radius: i32,
}

impl Watch {
    pub fn new(location: Location, radius: i32) -> Self {
        Watch { location, radius }
    }

    pub fn covers(&self, location: Location) -> bool {
        self.location.manhattan_distance(location) <= i64::from(self.radius)
    }
}

#[derive(Debug, Default)]
pub struct Subscriptions {
    users: HashMap<String, IndexSet<Watch>>,
}

impl Subscriptions {
    pub fn new() -> Self {
        Subscriptions::default()
    }

    /// Returns `false` if the user was already subscribed.
    pub fn subscribe(&mut self, username: &str) -> bool {
        if self.users.contains_key(username) {
            return false;
        }
        self.users.insert(username.to_string(), IndexSet::new());
        true
    }

    pub fn is_subscribed(&self, username: &str) -> bool {
        self.users.contains_key(username)
    }

    /// Returns `false` if the user is not subscribed.
    pub fn watch(&mut self, username: &str, watch: Watch) -> bool {
        match self.users.get_mut(username) {
            Some(watches) => {
                watches.insert(watch);
                true
            }
            None => false,
        }
    }

    /// Returns `false` if the user was not subscribed.
    pub fn unsubscribe(&mut self, username: &str) -> bool {
        self.users.remove(username).is_some()
    }

    /// Snapshot of every subscriber that watches at least one location.
    pub fn snapshot(&self) -> Vec<(String, Vec<Watch>)> {
        self.users
            .iter()
            .filter(|(_, watches)| !watches.is_empty())
            .map(|(user, watches)| (user.clone(), watches.iter().copied().collect()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn watch_requires_subscription_and_deduplicates() {
        let mut subs = Subscriptions::new();
        let w = Watch::new(Location::new(6, 6), 2);
        assert!(!subs.watch("bob", w));

        assert!(subs.subscribe("bob"));
        assert!(!subs.subscribe("bob"));
        assert!(subs.watch("bob", w));
        assert!(subs.watch("bob", w));

        let snapshot = subs.snapshot();
        assert_eq!(snapshot, vec![("bob".to_string(), vec![w])]);

        assert!(subs.unsubscribe("bob"));
        assert!(!subs.is_subscribed("bob"));
        assert!(subs.snapshot().is_empty());
    }
}
