// crates/scooter-client/src/error.rs

use scooter_protocol::{ProtocolError, ResponseCode};
use scooter_transport::TransportError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("could not connect: {0}")]
    Connect(#[from] std::io::Error),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("malformed reply: {0}")]
    Protocol(#[from] ProtocolError),

    /// The server answered with a failure code.
    #[error("request refused ({0:?})")]
    Refused(ResponseCode),

    /// The task carrying the call died before a reply arrived.
    #[error("call aborted: {0}")]
    Aborted(#[from] tokio::task::JoinError),

    /// A well-formed reply of the wrong kind for the request.
    #[error("unexpected {0} reply")]
    UnexpectedReply(&'static str),
}
