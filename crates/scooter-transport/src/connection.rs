// crates/scooter-transport/src/connection.rs

//! Framed duplex connection.
//!
//! Sending and receiving are guarded by two independent locks: one send never
//! interleaves with another, one receive never interleaves with another, but a
//! send may proceed while a receive is parked waiting for data.

use bytes::BytesMut;
use scooter_protocol::frame::{decode_frame, encode_frame};
use scooter_protocol::Frame;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tracing::trace;

use crate::error::TransportError;

const READ_BUFFER_CAPACITY: usize = 8 * 1024;

/// A connection over a TCP socket, the common case.
pub type TcpConnection = TaggedConnection<OwnedReadHalf, OwnedWriteHalf>;

struct ReadHalf<R> {
    stream: R,
    buffer: BytesMut,
}

pub struct TaggedConnection<R = OwnedReadHalf, W = OwnedWriteHalf> {
    reader: Mutex<ReadHalf<R>>,
    writer: Mutex<W>,
}

impl TcpConnection {
    pub fn from_stream(stream: TcpStream) -> Self {
        // Frames are small request/reply pairs.
        let _ = stream.set_nodelay(true);
        let (read, write) = stream.into_split();
        TaggedConnection::new(read, write)
    }
}

impl<R, W> TaggedConnection<R, W>
where
    R: AsyncRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    pub fn new(reader: R, writer: W) -> Self {
        TaggedConnection {
            reader: Mutex::new(ReadHalf {
                stream: reader,
                buffer: BytesMut::with_capacity(READ_BUFFER_CAPACITY),
            }),
            writer: Mutex::new(writer),
        }
    }

    /// Write one whole frame and flush it.
    pub async fn send(&self, tag: i32, payload: &[u8]) -> Result<(), TransportError> {
        let mut out = BytesMut::new();
        encode_frame(tag, payload, &mut out)?;

        let mut writer = self.writer.lock().await;
        writer.write_all(&out).await?;
        writer.flush().await?;
        trace!(tag, len = payload.len(), "frame sent");
        Ok(())
    }

    /// Block until one whole frame has arrived.
    ///
    /// End of stream, including end of stream in the middle of a frame, is
    /// reported as [`TransportError::Closed`].
    pub async fn receive(&self) -> Result<Frame, TransportError> {
        let mut guard = self.reader.lock().await;
        let ReadHalf { stream, buffer } = &mut *guard;

        loop {
            if let Some(frame) = decode_frame(buffer)? {
                trace!(tag = frame.tag, len = frame.payload.len(), "frame received");
                return Ok(frame);
            }
            if stream.read_buf(buffer).await? == 0 {
                return Err(TransportError::Closed);
            }
        }
    }

    /// Close the write direction. The peer's next receive sees end of stream.
    pub async fn shutdown(&self) -> Result<(), TransportError> {
        let mut writer = self.writer.lock().await;
        writer.shutdown().await?;
        Ok(())
    }
}
