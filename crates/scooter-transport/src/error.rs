//! Transport error type.
//!
//! `TransportError` is `Clone` because the demultiplexer records one failure
//! and hands a copy to every current and future waiter.

use std::io;
use std::sync::Arc;

use scooter_protocol::ProtocolError;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum TransportError {
    /// The peer closed the stream, or the connection was shut down locally.
    #[error("connection closed")]
    Closed,

    #[error("connection i/o failed: {0}")]
    Io(Arc<io::Error>),

    /// Malformed frame; treated like a broken connection.
    #[error("protocol violation: {0}")]
    Protocol(#[from] ProtocolError),
}

impl TransportError {
    pub fn is_closed(&self) -> bool {
        matches!(self, TransportError::Closed)
    }
}

impl From<io::Error> for TransportError {
    fn from(err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::UnexpectedEof
            | io::ErrorKind::ConnectionReset
            | io::ErrorKind::ConnectionAborted
            | io::ErrorKind::BrokenPipe => TransportError::Closed,
            _ => TransportError::Io(Arc::new(err)),
        }
    }
}
