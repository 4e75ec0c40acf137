//! Thread-safe domain façade.
//!
//! Request handlers on many connections call into one shared
//! `DomainService`. Each aggregate sits behind its own lock so that, e.g.,
//! a reward-candidate scan of the map never blocks logins. Locks are held
//! only for the duration of one call and never across `.await`.
//!
//! Lock order when more than one is needed: accounts, then fleet, then
//! subscriptions.

use parking_lot::Mutex;

use crate::accounts::Accounts;
use crate::error::DomainError;
use crate::fleet::{Fleet, ReservationTicket, Trip};
use crate::location::Location;
use crate::scooter_map::{RewardCandidates, ScooterMap};
use crate::subscriptions::{Subscriptions, Watch};

#[derive(Debug)]
pub struct DomainService {
    accounts: Mutex<Accounts>,
    fleet: Mutex<Fleet>,
    subscriptions: Mutex<Subscriptions>,
}

impl DomainService {
    pub fn new(map: ScooterMap) -> Self {
        DomainService {
            accounts: Mutex::new(Accounts::new()),
            fleet: Mutex::new(Fleet::new(map)),
            subscriptions: Mutex::new(Subscriptions::new()),
        }
    }

    // -------------------------------------------------------------------------
    // Accounts
    // -------------------------------------------------------------------------

    pub fn register_user(&self, username: &str, password_hash: &str) -> bool {
        self.accounts.lock().register(username, password_hash)
    }

    pub fn login_user(&self, username: &str, password_hash: &str) -> bool {
        self.accounts.lock().login(username, password_hash)
    }

    pub fn logout_user(&self, username: &str) -> bool {
        self.accounts.lock().logout(username)
    }

    pub fn is_online(&self, username: &str) -> bool {
        self.accounts.lock().is_online(username)
    }

    // -------------------------------------------------------------------------
    // Scooters
    // -------------------------------------------------------------------------

    pub fn list_free_scooters(&self, range: i32, origin: Location) -> Vec<Location> {
        self.fleet.lock().list_free_scooters(range, origin)
    }

    pub fn reserve_scooter(
        &self,
        range: i32,
        origin: Location,
        username: &str,
    ) -> Result<ReservationTicket, DomainError> {
        self.require_online(username)?;
        self.fleet.lock().reserve(range, origin, username)
    }

    pub fn park_scooter(
        &self,
        code: &str,
        destination: Location,
        username: &str,
    ) -> Result<Trip, DomainError> {
        self.require_online(username)?;
        self.fleet.lock().park(code, destination, username)
    }

    /// Spatial query backing the reward-path index.
    pub fn reward_candidates(&self, empty_radius: i32) -> RewardCandidates {
        self.fleet.lock().reward_candidates(empty_radius)
    }

    // -------------------------------------------------------------------------
    // Notification subscriptions
    // -------------------------------------------------------------------------

    /// Only logged-in users may subscribe.
    pub fn subscribe(&self, username: &str) -> bool {
        self.is_online(username) && self.subscriptions.lock().subscribe(username)
    }

    pub fn is_subscribed(&self, username: &str) -> bool {
        self.subscriptions.lock().is_subscribed(username)
    }

    pub fn watch(&self, username: &str, location: Location, radius: i32) -> bool {
        self.is_online(username)
            && self
                .subscriptions
                .lock()
                .watch(username, Watch::new(location, radius))
    }

    pub fn unsubscribe(&self, username: &str) -> bool {
        self.subscriptions.lock().unsubscribe(username)
    }

    /// Every subscriber with at least one watch.
    pub fn subscriptions(&self) -> Vec<(String, Vec<Watch>)> {
        self.subscriptions.lock().snapshot()
    }

    fn require_online(&self, username: &str) -> Result<(), DomainError> {
        if self.is_online(username) {
            Ok(())
        } else {
            Err(DomainError::NotAuthenticated(username.to_string()))
        }
    }
}
