//! Binary encoding/decoding for service payloads.
//!
//! This module converts between:
//! - frame payloads (`&[u8]` in, `BytesMut` out)
//! - the logical messages in [`crate::messages`]
//!
//! Payload layouts (all integers big-endian i32, `f64` IEEE-754 big-endian,
//! `bool` one byte, `string` = `u16` byte length + UTF-8):
//!
//! ```text
//! Authentication (tag 0x01)
//! -------------------------
//! request : op  username  [password_hash]      (hash for register/login)
//! reply   : ok:bool
//!
//! Scooter (tag 0x00)
//! ------------------
//! request : op=0 list         x y range
//!           op=1 reserve      range x y username
//!           op=2 park         code x y username
//!           op=3 listRewards  x y range
//! reply   : code
//!           list        ok -> count (x y)*
//!           reserve     ok -> code:string x y
//!           park        ok -> price:f64
//!                   bounty -> price:f64 bounty:f64
//!           listRewards ok -> count (sx sy fx fy reward:f64)*
//!           any other code -> no body
//!
//! Notification (tag 0x02)
//! -----------------------
//! request : op username [x y radius]            (only for addLocation)
//! reply   : ok:bool
//!
//! Reward push (client-bound tag 0x03)
//! -----------------------------------
//! payload : count (sx sy fx fy reward:f64)*
//! ```
//!
//! Every decoder insists on consuming the whole payload; leftover bytes are
//! a [`ProtocolError::TrailingBytes`].

use std::fmt;

use bytes::{Buf, BufMut, BytesMut};

use scooter_core::{Location, ReservationTicket, RewardPath};

use crate::messages::{AuthRequest, NotificationRequest, ScooterReply, ScooterRequest};
use crate::wire_types::{
    AuthOp, NotificationOp, ResponseCode, ScooterOp, MAX_FRAME_LEN, MAX_STRING_LEN,
};

/// Errors that can arise when encoding/decoding frames and payloads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// Buffer too short for the expected fields.
    Truncated,
    /// Bytes left over after a complete message.
    TrailingBytes(usize),
    /// Negative frame length on the wire.
    InvalidLength(i32),
    /// Frame payload above [`MAX_FRAME_LEN`].
    FrameTooLarge(usize),
    /// No service bound to this frame tag.
    UnknownTag(i32),
    /// Unknown operation code for a service.
    UnknownOperation { service: &'static str, op: i32 },
    /// Unknown or misplaced response code.
    UnknownResponseCode(i32),
    /// String too long or malformed UTF-8.
    InvalidString,
    /// Invalid count or other semantic issue.
    InvalidField(&'static str),
}

impl fmt::Display for ProtocolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProtocolError::Truncated => write!(f, "Buffer truncated"),
            ProtocolError::TrailingBytes(n) => write!(f, "{} trailing bytes after message", n),
            ProtocolError::InvalidLength(len) => write!(f, "Invalid frame length: {}", len),
            ProtocolError::FrameTooLarge(len) => {
                write!(f, "Frame of {} bytes exceeds limit of {}", len, MAX_FRAME_LEN)
            }
            ProtocolError::UnknownTag(tag) => write!(f, "Unknown frame tag: {}", tag),
            ProtocolError::UnknownOperation { service, op } => {
                write!(f, "Unknown {} operation: {}", service, op)
            }
            ProtocolError::UnknownResponseCode(code) => write!(f, "Unknown response code: {}", code),
            ProtocolError::InvalidString => write!(f, "Invalid string"),
            ProtocolError::InvalidField(field) => write!(f, "Invalid field: {}", field),
        }
    }
}

impl std::error::Error for ProtocolError {}

// ============================================================================
// AUTHENTICATION
// ============================================================================

pub fn encode_auth_request(req: &AuthRequest, out: &mut BytesMut) -> Result<(), ProtocolError> {
    out.put_i32(req.op() as i32);
    match req {
        AuthRequest::Register {
            username,
            password_hash,
        }
        | AuthRequest::Login {
            username,
            password_hash,
        } => {
            put_string(out, username)?;
            put_string(out, password_hash)
        }
        AuthRequest::Logout { username } => put_string(out, username),
    }
}

pub fn decode_auth_request(buf: &[u8]) -> Result<AuthRequest, ProtocolError> {
    let mut r = Reader::new(buf);
    let op = r.i32()?;
    let op = AuthOp::from_i32(op).ok_or(ProtocolError::UnknownOperation {
        service: "authentication",
        op,
    })?;

    let req = match op {
        AuthOp::Register => AuthRequest::Register {
            username: r.string()?,
            password_hash: r.string()?,
        },
        AuthOp::Login => AuthRequest::Login {
            username: r.string()?,
            password_hash: r.string()?,
        },
        AuthOp::Logout => AuthRequest::Logout {
            username: r.string()?,
        },
    };
    r.finish()?;
    Ok(req)
}

// ============================================================================
// BOOLEAN REPLIES (authentication, notification)
// ============================================================================

pub fn encode_bool_reply(ok: bool, out: &mut BytesMut) {
    out.put_u8(u8::from(ok));
}

pub fn decode_bool_reply(buf: &[u8]) -> Result<bool, ProtocolError> {
    let mut r = Reader::new(buf);
    let ok = r.bool()?;
    r.finish()?;
    Ok(ok)
}

// ============================================================================
// SCOOTER
// ============================================================================

pub fn encode_scooter_request(req: &ScooterRequest, out: &mut BytesMut) -> Result<(), ProtocolError> {
    out.put_i32(req.op() as i32);
    match req {
        ScooterRequest::List { origin, range } | ScooterRequest::ListRewards { origin, range } => {
            put_location(out, *origin);
            out.put_i32(*range);
        }
        ScooterRequest::Reserve {
            range,
            origin,
            username,
        } => {
            out.put_i32(*range);
            put_location(out, *origin);
            put_string(out, username)?;
        }
        ScooterRequest::Park {
            code,
            destination,
            username,
        } => {
            put_string(out, code)?;
            put_location(out, *destination);
            put_string(out, username)?;
        }
    }
    Ok(())
}

pub fn decode_scooter_request(buf: &[u8]) -> Result<ScooterRequest, ProtocolError> {
    let mut r = Reader::new(buf);
    let op = r.i32()?;
    let op = ScooterOp::from_i32(op).ok_or(ProtocolError::UnknownOperation {
        service: "scooter",
        op,
    })?;

    let req = match op {
        ScooterOp::List => ScooterRequest::List {
            origin: r.location()?,
            range: r.i32()?,
        },
        ScooterOp::Reserve => ScooterRequest::Reserve {
            range: r.i32()?,
            origin: r.location()?,
            username: r.string()?,
        },
        ScooterOp::Park => ScooterRequest::Park {
            code: r.string()?,
            destination: r.location()?,
            username: r.string()?,
        },
        ScooterOp::ListRewards => ScooterRequest::ListRewards {
            origin: r.location()?,
            range: r.i32()?,
        },
    };
    r.finish()?;
    Ok(req)
}

pub fn encode_scooter_reply(reply: &ScooterReply, out: &mut BytesMut) -> Result<(), ProtocolError> {
    out.put_i32(reply.code() as i32);
    match reply {
        ScooterReply::FreeScooters(locations) => {
            put_count(out, locations.len())?;
            for location in locations {
                put_location(out, *location);
            }
        }
        ScooterReply::Reserved(ticket) => {
            put_string(out, &ticket.code)?;
            put_location(out, ticket.location);
        }
        ScooterReply::Parked { price, bounty } => {
            out.put_f64(*price);
            if let Some(bounty) = bounty {
                out.put_f64(*bounty);
            }
        }
        ScooterReply::Rewards(paths) => put_reward_paths(out, paths)?,
        ScooterReply::Failed(ResponseCode::Ok | ResponseCode::OkWithBounty) => {
            return Err(ProtocolError::InvalidField("failure with success code"));
        }
        ScooterReply::Failed(_) => {}
    }
    Ok(())
}

/// Decode a scooter reply to a request of kind `op`.
pub fn decode_scooter_reply(op: ScooterOp, buf: &[u8]) -> Result<ScooterReply, ProtocolError> {
    let mut r = Reader::new(buf);
    let raw = r.i32()?;
    let code = ResponseCode::from_i32(raw).ok_or(ProtocolError::UnknownResponseCode(raw))?;

    let reply = match (op, code) {
        (_, ResponseCode::NotFound | ResponseCode::Unauthenticated) => ScooterReply::Failed(code),
        (ScooterOp::List, ResponseCode::Ok) => {
            let count = r.count()?;
            let mut locations = Vec::with_capacity(count.min(r.remaining() / 8));
            for _ in 0..count {
                locations.push(r.location()?);
            }
            ScooterReply::FreeScooters(locations)
        }
        (ScooterOp::Reserve, ResponseCode::Ok) => ScooterReply::Reserved(ReservationTicket {
            code: r.string()?,
            location: r.location()?,
        }),
        (ScooterOp::Park, ResponseCode::Ok) => ScooterReply::Parked {
            price: r.f64()?,
            bounty: None,
        },
        (ScooterOp::Park, ResponseCode::OkWithBounty) => ScooterReply::Parked {
            price: r.f64()?,
            bounty: Some(r.f64()?),
        },
        (ScooterOp::ListRewards, ResponseCode::Ok) => ScooterReply::Rewards(read_reward_paths(&mut r)?),
        (_, ResponseCode::Ok | ResponseCode::OkWithBounty) => {
            return Err(ProtocolError::UnknownResponseCode(raw));
        }
    };
    r.finish()?;
    Ok(reply)
}

// ============================================================================
// NOTIFICATION
// ============================================================================

pub fn encode_notification_request(
    req: &NotificationRequest,
    out: &mut BytesMut,
) -> Result<(), ProtocolError> {
    out.put_i32(req.op() as i32);
    put_string(out, req.username())?;
    if let NotificationRequest::AddLocation {
        location, radius, ..
    } = req
    {
        put_location(out, *location);
        out.put_i32(*radius);
    }
    Ok(())
}

pub fn decode_notification_request(buf: &[u8]) -> Result<NotificationRequest, ProtocolError> {
    let mut r = Reader::new(buf);
    let op = r.i32()?;
    let op = NotificationOp::from_i32(op).ok_or(ProtocolError::UnknownOperation {
        service: "notification",
        op,
    })?;
    let username = r.string()?;

    let req = match op {
        NotificationOp::Register => NotificationRequest::Register { username },
        NotificationOp::IsRegistered => NotificationRequest::IsRegistered { username },
        NotificationOp::AddLocation => NotificationRequest::AddLocation {
            username,
            location: r.location()?,
            radius: r.i32()?,
        },
        NotificationOp::Remove => NotificationRequest::Remove { username },
    };
    r.finish()?;
    Ok(req)
}

// ============================================================================
// REWARD PUSH
// ============================================================================

pub fn encode_reward_push(paths: &[RewardPath], out: &mut BytesMut) -> Result<(), ProtocolError> {
    put_reward_paths(out, paths)
}

pub fn decode_reward_push(buf: &[u8]) -> Result<Vec<RewardPath>, ProtocolError> {
    let mut r = Reader::new(buf);
    let paths = read_reward_paths(&mut r)?;
    r.finish()?;
    Ok(paths)
}

// -----------------------------------------------------------------------------
// Helpers
// -----------------------------------------------------------------------------

/// Size of one encoded reward path: four i32 plus one f64.
const REWARD_PATH_LEN: usize = 4 * 4 + 8;

fn put_string(out: &mut BytesMut, s: &str) -> Result<(), ProtocolError> {
    let bytes = s.as_bytes();
    if bytes.len() > MAX_STRING_LEN {
        return Err(ProtocolError::InvalidString);
    }
    out.put_u16(bytes.len() as u16);
    out.put_slice(bytes);
    Ok(())
}

fn put_location(out: &mut BytesMut, location: Location) {
    out.put_i32(location.x);
    out.put_i32(location.y);
}

fn put_count(out: &mut BytesMut, count: usize) -> Result<(), ProtocolError> {
    let count = i32::try_from(count).map_err(|_| ProtocolError::InvalidField("count"))?;
    out.put_i32(count);
    Ok(())
}

fn put_reward_paths(out: &mut BytesMut, paths: &[RewardPath]) -> Result<(), ProtocolError> {
    put_count(out, paths.len())?;
    out.reserve(paths.len() * REWARD_PATH_LEN);
    for path in paths {
        put_location(out, path.start);
        put_location(out, path.finish);
        out.put_f64(path.reward);
    }
    Ok(())
}

fn read_reward_paths(r: &mut Reader<'_>) -> Result<Vec<RewardPath>, ProtocolError> {
    let count = r.count()?;
    let mut paths = Vec::with_capacity(count.min(r.remaining() / REWARD_PATH_LEN));
    for _ in 0..count {
        paths.push(RewardPath::new(r.location()?, r.location()?, r.f64()?));
    }
    Ok(paths)
}

/// Bounds-checked cursor over a payload.
struct Reader<'a> {
    buf: &'a [u8],
}

impl<'a> Reader<'a> {
    fn new(buf: &'a [u8]) -> Self {
        Reader { buf }
    }

    fn remaining(&self) -> usize {
        self.buf.remaining()
    }

    fn need(&self, n: usize) -> Result<(), ProtocolError> {
        if self.buf.remaining() < n {
            Err(ProtocolError::Truncated)
        } else {
            Ok(())
        }
    }

    fn i32(&mut self) -> Result<i32, ProtocolError> {
        self.need(4)?;
        Ok(self.buf.get_i32())
    }

    fn f64(&mut self) -> Result<f64, ProtocolError> {
        self.need(8)?;
        Ok(self.buf.get_f64())
    }

    fn bool(&mut self) -> Result<bool, ProtocolError> {
        self.need(1)?;
        match self.buf.get_u8() {
            0 => Ok(false),
            1 => Ok(true),
            _ => Err(ProtocolError::InvalidField("bool")),
        }
    }

    fn count(&mut self) -> Result<usize, ProtocolError> {
        let count = self.i32()?;
        usize::try_from(count).map_err(|_| ProtocolError::InvalidField("count"))
    }

    fn location(&mut self) -> Result<Location, ProtocolError> {
        Ok(Location::new(self.i32()?, self.i32()?))
    }

    fn string(&mut self) -> Result<String, ProtocolError> {
        self.need(2)?;
        let len = self.buf.get_u16() as usize;
        self.need(len)?;
        let (bytes, rest) = self.buf.split_at(len);
        self.buf = rest;
        std::str::from_utf8(bytes)
            .map(str::to_string)
            .map_err(|_| ProtocolError::InvalidString)
    }

    fn finish(self) -> Result<(), ProtocolError> {
        match self.buf.remaining() {
            0 => Ok(()),
            n => Err(ProtocolError::TrailingBytes(n)),
        }
    }
}
