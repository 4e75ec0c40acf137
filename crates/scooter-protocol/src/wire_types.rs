//! Low-level wire types and constants.
//!
//! This module defines:
//! - Server-bound service tags and client-bound reply tags.
//! - Per-service operation codes.
//! - Response codes for the scooter service.
//! - Size limits enforced by the framing layer.
//!
//! The actual encode/decode logic lives in `binary_codec`.

/// Largest payload a single frame may carry.
pub const MAX_FRAME_LEN: usize = 16 * 1024 * 1024;

/// Strings are prefixed with a `u16` byte length.
pub const MAX_STRING_LEN: usize = u16::MAX as usize;

/// Services a client can address (client → server frame tags).
#[repr(i32)]
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ServiceTag {
    Scooter = 0,
    Authentication = 1,
    Notification = 2,
}

impl ServiceTag {
    pub fn from_i32(v: i32) -> Option<Self> {
        match v {
            0 => Some(ServiceTag::Scooter),
            1 => Some(ServiceTag::Authentication),
            2 => Some(ServiceTag::Notification),
            _ => None,
        }
    }

    /// Replies travel back on the tag of the service that produced them.
    pub fn reply_tag(self) -> ReplyTag {
        match self {
            ServiceTag::Scooter => ReplyTag::Scooter,
            ServiceTag::Authentication => ReplyTag::Authentication,
            ServiceTag::Notification => ReplyTag::Notification,
        }
    }
}

/// Server → client frame tags.
#[repr(i32)]
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ReplyTag {
    Scooter = 0,
    Authentication = 1,
    Notification = 2,

    /// Unsolicited reward-path notification.
    RewardPush = 3,
}

impl ReplyTag {
    pub fn from_i32(v: i32) -> Option<Self> {
        match v {
            0 => Some(ReplyTag::Scooter),
            1 => Some(ReplyTag::Authentication),
            2 => Some(ReplyTag::Notification),
            3 => Some(ReplyTag::RewardPush),
            _ => None,
        }
    }
}

#[repr(i32)]
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum AuthOp {
    Register = 0,
    Login = 1,
    Logout = 2,
}

impl AuthOp {
    pub fn from_i32(v: i32) -> Option<Self> {
        match v {
            0 => Some(AuthOp::Register),
            1 => Some(AuthOp::Login),
            2 => Some(AuthOp::Logout),
            _ => None,
        }
    }
}

#[repr(i32)]
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ScooterOp {
    List = 0,
    Reserve = 1,
    Park = 2,
    ListRewards = 3,
}

impl ScooterOp {
    pub fn from_i32(v: i32) -> Option<Self> {
        match v {
            0 => Some(ScooterOp::List),
            1 => Some(ScooterOp::Reserve),
            2 => Some(ScooterOp::Park),
            3 => Some(ScooterOp::ListRewards),
            _ => None,
        }
    }
}

#[repr(i32)]
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum NotificationOp {
    Register = 0,
    IsRegistered = 1,
    AddLocation = 2,
    Remove = 3,
}

impl NotificationOp {
    pub fn from_i32(v: i32) -> Option<Self> {
        match v {
            0 => Some(NotificationOp::Register),
            1 => Some(NotificationOp::IsRegistered),
            2 => Some(NotificationOp::AddLocation),
            3 => Some(NotificationOp::Remove),
            _ => None,
        }
    }
}

/// First field of every scooter-service reply.
#[repr(i32)]
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ResponseCode {
    Ok = 0,

    /// Nothing in range, or an invalid reservation.
    NotFound = 1,

    Unauthenticated = 2,

    /// Park succeeded and completed a reward path.
    OkWithBounty = 3,
}

impl ResponseCode {
    pub fn from_i32(v: i32) -> Option<Self> {
        match v {
            0 => Some(ResponseCode::Ok),
            1 => Some(ResponseCode::NotFound),
            2 => Some(ResponseCode::Unauthenticated),
            3 => Some(ResponseCode::OkWithBounty),
            _ => None,
        }
    }
}
