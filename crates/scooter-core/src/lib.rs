//! scooter-core
//!
//! Pure scooter-sharing domain logic:
//! - grid locations and the scooter map
//! - reservations and trip pricing
//! - user accounts and online state
//! - reward-notification subscriptions
//! - the reward-path index
//!
//! Everything here is synchronous and in-memory. [`DomainService`] is the
//! thread-safe façade the server's request handlers call into.

pub mod accounts;
pub mod error;
pub mod fleet;
pub mod location;
pub mod reward;
pub mod scooter;
pub mod scooter_map;
pub mod service;
pub mod subscriptions;

pub use accounts::Accounts;
pub use error::DomainError;
pub use fleet::{Fleet, Reservation, ReservationTicket, Trip};
pub use location::Location;
pub use reward::{RewardIndex, RewardPath};
pub use scooter::{Scooter, ScooterId};
pub use scooter_map::{RewardCandidates, ScooterMap};
pub use service::DomainService;
pub use subscriptions::{Subscriptions, Watch};
