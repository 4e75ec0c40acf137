//! Logical requests and replies for each service.
//!
//! These are transport-agnostic; `binary_codec` turns them into payload
//! bytes and back.

use scooter_core::{Location, ReservationTicket, RewardPath};

use crate::wire_types::{AuthOp, NotificationOp, ResponseCode, ScooterOp};

/// Authentication service request. Reply: `ok: bool`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthRequest {
    Register {
        username: String,
        password_hash: String,
    },
    Login {
        username: String,
        password_hash: String,
    },
    Logout {
        username: String,
    },
}

impl AuthRequest {
    pub fn op(&self) -> AuthOp {
        match self {
            AuthRequest::Register { .. } => AuthOp::Register,
            AuthRequest::Login { .. } => AuthOp::Login,
            AuthRequest::Logout { .. } => AuthOp::Logout,
        }
    }
}

/// Scooter service request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScooterRequest {
    List {
        origin: Location,
        range: i32,
    },
    Reserve {
        range: i32,
        origin: Location,
        username: String,
    },
    Park {
        code: String,
        destination: Location,
        username: String,
    },
    ListRewards {
        origin: Location,
        range: i32,
    },
}

impl ScooterRequest {
    pub fn op(&self) -> ScooterOp {
        match self {
            ScooterRequest::List { .. } => ScooterOp::List,
            ScooterRequest::Reserve { .. } => ScooterOp::Reserve,
            ScooterRequest::Park { .. } => ScooterOp::Park,
            ScooterRequest::ListRewards { .. } => ScooterOp::ListRewards,
        }
    }
}

/// Scooter service reply.
///
/// The wire form always starts with a [`ResponseCode`]; which body follows
/// depends on the request's operation, so decoding needs the [`ScooterOp`].
#[derive(Debug, Clone, PartialEq)]
pub enum ScooterReply {
    FreeScooters(Vec<Location>),
    Reserved(ReservationTicket),
    Parked { price: f64, bounty: Option<f64> },
    Rewards(Vec<RewardPath>),

    /// Any non-ok response code; no body.
    Failed(ResponseCode),
}

impl ScooterReply {
    pub fn code(&self) -> ResponseCode {
        match self {
            ScooterReply::Parked {
                bounty: Some(_), ..
            } => ResponseCode::OkWithBounty,
            ScooterReply::Failed(code) => *code,
            _ => ResponseCode::Ok,
        }
    }
}

/// Notification service request. Reply: `ok: bool`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotificationRequest {
    Register {
        username: String,
    },
    IsRegistered {
        username: String,
    },
    AddLocation {
        username: String,
        location: Location,
        radius: i32,
    },
    Remove {
        username: String,
    },
}

impl NotificationRequest {
    pub fn op(&self) -> NotificationOp {
        match self {
            NotificationRequest::Register { .. } => NotificationOp::Register,
            NotificationRequest::IsRegistered { .. } => NotificationOp::IsRegistered,
            NotificationRequest::AddLocation { .. } => NotificationOp::AddLocation,
            NotificationRequest::Remove { .. } => NotificationOp::Remove,
        }
    }

    pub fn username(&self) -> &str {
        match self {
            NotificationRequest::Register { username }
            | NotificationRequest::IsRegistered { username }
            | NotificationRequest::AddLocation { username, .. }
            | NotificationRequest::Remove { username } => username,
        }
    }
}
