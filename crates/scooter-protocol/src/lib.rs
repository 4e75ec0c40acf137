//! scooter-protocol
//!
//! Wire-level encoding/decoding for the scooter-sharing service.
//!
//! - [`frame`]        : `(tag, length, payload)` framing
//! - [`wire_types`]   : tags, operation codes, response codes, limits
//! - [`messages`]     : logical requests and replies per service
//! - [`binary_codec`] : payload encode/decode for every message
//!
//! Socket I/O lives in `scooter-transport`; this crate only touches
//! byte buffers.

pub mod binary_codec;
pub mod frame;
pub mod messages;
pub mod wire_types;

pub use binary_codec::ProtocolError;
pub use frame::Frame;
pub use messages::{AuthRequest, NotificationRequest, ScooterReply, ScooterRequest};
pub use wire_types::{
    AuthOp, NotificationOp, ReplyTag, ResponseCode, ScooterOp, ServiceTag, MAX_FRAME_LEN,
};
