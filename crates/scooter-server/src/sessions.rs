//! Logged-in users and the connection they logged in from.
//!
//! The reward broadcaster uses this to find where to push a user's
//! notifications. An entry lives until the user logs out, logs in from
//! elsewhere, or the connection it points at is served no longer.

use std::net::SocketAddr;

use dashmap::DashMap;

#[derive(Debug, Default)]
pub struct Sessions {
    by_user: DashMap<String, SocketAddr>,
}

impl Sessions {
    pub fn new() -> Self {
        Sessions::default()
    }

    /// Bind `username` to `addr`, returning the address it was bound to before.
    pub fn bind(&self, username: &str, addr: SocketAddr) -> Option<SocketAddr> {
        self.by_user.insert(username.to_string(), addr)
    }

    pub fn unbind(&self, username: &str) -> Option<SocketAddr> {
        self.by_user.remove(username).map(|(_, addr)| addr)
    }

    /// Unbind every user still bound to `addr`, returning who was unbound.
    ///
    /// A user who rebinds elsewhere concurrently keeps the new binding.
    pub fn unbind_at(&self, addr: SocketAddr) -> Vec<String> {
        let bound: Vec<String> = self
            .by_user
            .iter()
            .filter(|entry| *entry.value() == addr)
            .map(|entry| entry.key().clone())
            .collect();
        bound
            .into_iter()
            .filter(|user| self.by_user.remove_if(user, |_, a| *a == addr).is_some())
            .collect()
    }

    pub fn address_of(&self, username: &str) -> Option<SocketAddr> {
        self.by_user.get(username).map(|entry| *entry.value())
    }

    pub fn len(&self) -> usize {
        self.by_user.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_user.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rebinding_reports_the_previous_address() {
        let sessions = Sessions::new();
        let first: SocketAddr = "127.0.0.1:4000".parse().unwrap();
        let second: SocketAddr = "127.0.0.1:4001".parse().unwrap();

        assert_eq!(sessions.bind("bob", first), None);
        assert_eq!(sessions.bind("bob", second), Some(first));
        assert_eq!(sessions.address_of("bob"), Some(second));

        assert_eq!(sessions.unbind("bob"), Some(second));
        assert!(sessions.is_empty());
    }

    #[test]
    fn unbind_at_only_touches_that_address() {
        let sessions = Sessions::new();
        let gone: SocketAddr = "127.0.0.1:4000".parse().unwrap();
        let live: SocketAddr = "127.0.0.1:4001".parse().unwrap();
        sessions.bind("bob", gone);
        sessions.bind("ana", gone);
        sessions.bind("carol", live);

        let mut unbound = sessions.unbind_at(gone);
        unbound.sort();
        assert_eq!(unbound, vec!["ana".to_string(), "bob".to_string()]);
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions.address_of("carol"), Some(live));
        assert!(sessions.unbind_at(gone).is_empty());
    }
}
