//! scooter-client
//!
//! Client-side stubs for the scooter-sharing service. One TCP connection
//! carries every service; a demultiplexer splits replies and reward pushes
//! by tag so calls to different services and the notification listener run
//! side by side.

pub mod client;
pub mod config;
pub mod error;
pub mod listener;

pub use client::{ParkOutcome, ScooterClient};
pub use config::ClientConfig;
pub use error::ClientError;
pub use listener::NotificationListener;
