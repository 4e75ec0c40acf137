//! Per-connection dispatch loop.
//!
//! A worker owns the receive side of one accepted connection. It reads one
//! frame at a time, looks the tag up in the [`HandlerTable`] and runs the
//! handler to completion before reading the next frame, so requests on one
//! connection are served in order. Replies go out through the
//! [`crate::ResponseManager`], never directly.
//!
//! Any failure ends the worker: sessions logged in over the connection end,
//! the worker drops its own response-manager reference and shuts the socket
//! down.

use std::net::SocketAddr;
use std::sync::Arc;

use scooter_protocol::ProtocolError;
use scooter_transport::{TaggedConnection, TransportError};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tracing::{debug, trace};

use crate::handlers::HandlerTable;
use crate::types::ServiceContext;

pub struct Worker<R = OwnedReadHalf, W = OwnedWriteHalf> {
    peer: SocketAddr,
    conn: Arc<TaggedConnection<R, W>>,
    handlers: Arc<HandlerTable>,
    ctx: ServiceContext,
}

impl<R, W> Worker<R, W>
where
    R: AsyncRead + Unpin + Send + 'static,
    W: AsyncWrite + Unpin + Send + 'static,
{
    pub fn new(
        peer: SocketAddr,
        conn: Arc<TaggedConnection<R, W>>,
        handlers: Arc<HandlerTable>,
        ctx: ServiceContext,
    ) -> Self {
        Worker {
            peer,
            conn,
            handlers,
            ctx,
        }
    }

    /// Serve until the connection ends.
    ///
    /// A clean close by the peer is `Ok`; anything else is the error that
    /// stopped the loop.
    pub async fn run(self) -> Result<(), TransportError> {
        self.ctx.responses.register(self.peer, &self.conn);

        let result = self.serve().await;

        self.ctx.end_sessions_at(self.peer);
        self.ctx.responses.remove(self.peer);
        if let Err(err) = self.conn.shutdown().await {
            debug!(peer = %self.peer, "shutdown after worker exit failed: {}", err);
        }

        match result {
            Err(TransportError::Closed) => Ok(()),
            other => other,
        }
    }

    async fn serve(&self) -> Result<(), TransportError> {
        loop {
            let frame = self.conn.receive().await?;
            trace!(peer = %self.peer, tag = frame.tag, "request frame");

            let handler = self
                .handlers
                .get(frame.tag)
                .ok_or(ProtocolError::UnknownTag(frame.tag))?;
            handler.handle(&frame.payload, self.peer)?;
        }
    }
}
