//! scooter-transport
//!
//! Async I/O on top of the frame format in `scooter-protocol`:
//!
//! - [`TaggedConnection`]: one duplex stream, independent send and receive
//!   locks, one whole frame per call.
//! - [`Demultiplexer`]: a single reader task fanning inbound frames into
//!   per-tag queues so several callers can block on different tags of the
//!   same connection.

pub mod connection;
pub mod demultiplexer;
pub mod error;

pub use connection::{TaggedConnection, TcpConnection};
pub use demultiplexer::Demultiplexer;
pub use error::TransportError;
