//! scooter-server
//!
//! Multi-client async TCP server for the scooter-sharing service.
//!
//! - [`server`]: accept loop, one [`worker`] per connection
//! - [`response_manager`]: one writer task per client address
//! - [`reward_manager`]: background reward-path broadcaster
//! - [`handlers`]: the fixed tag → skeleton table

pub mod config;
pub mod handlers;
pub mod response_manager;
pub mod reward_manager;
pub mod server;
pub mod sessions;
pub mod types;
pub mod worker;

pub use config::Config;
pub use response_manager::ResponseManager;
pub use reward_manager::{RewardManager, RewardSettings, WorkSignal};
pub use server::Server;
pub use sessions::Sessions;
