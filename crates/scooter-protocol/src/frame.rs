//! Tagged frame layout.
//!
//! ```text
//! [0..4]  tag     (i32 BE)
//! [4..8]  length  (i32 BE, 0..=MAX_FRAME_LEN)
//! [8..]   payload (exactly `length` bytes)
//! ```
//!
//! [`decode_frame`] works on an accumulating read buffer: it returns
//! `Ok(None)` until a whole frame is buffered, then splits it off.

use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::binary_codec::ProtocolError;
use crate::wire_types::MAX_FRAME_LEN;

pub const FRAME_HEADER_LEN: usize = 8;

/// One tagged unit on the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub tag: i32,
    pub payload: Bytes,
}

impl Frame {
    pub fn new(tag: i32, payload: impl Into<Bytes>) -> Self {
        Frame {
            tag,
            payload: payload.into(),
        }
    }
}

/// Validate a length field read off the wire.
pub fn payload_len(raw: i32) -> Result<usize, ProtocolError> {
    let len = usize::try_from(raw).map_err(|_| ProtocolError::InvalidLength(raw))?;
    if len > MAX_FRAME_LEN {
        return Err(ProtocolError::FrameTooLarge(len));
    }
    Ok(len)
}

/// Append one frame to `out`.
pub fn encode_frame(tag: i32, payload: &[u8], out: &mut BytesMut) -> Result<(), ProtocolError> {
    if payload.len() > MAX_FRAME_LEN {
        return Err(ProtocolError::FrameTooLarge(payload.len()));
    }
    out.reserve(FRAME_HEADER_LEN + payload.len());
    out.put_i32(tag);
    out.put_i32(payload.len() as i32);
    out.put_slice(payload);
    Ok(())
}

/// Split one complete frame off the front of `buf`, if there is one.
pub fn decode_frame(buf: &mut BytesMut) -> Result<Option<Frame>, ProtocolError> {
    if buf.len() < FRAME_HEADER_LEN {
        return Ok(None);
    }

    let mut header = &buf[..FRAME_HEADER_LEN];
    let tag = header.get_i32();
    let len = payload_len(header.get_i32())?;

    if buf.len() < FRAME_HEADER_LEN + len {
        buf.reserve(FRAME_HEADER_LEN + len - buf.len());
        return Ok(None);
    }

    buf.advance(FRAME_HEADER_LEN);
    let payload = buf.split_to(len).freeze();
    Ok(Some(Frame { tag, payload }))
}
