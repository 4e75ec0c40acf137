//! Asynchronous per-address response delivery.
//!
//! Every connected client address owns one outbound queue and one writer task
//! draining it onto the socket. Anything that wants to talk to a client (the
//! skeletons replying, the reward broadcaster pushing) enqueues here instead of
//! writing to the socket itself, so bytes for one address leave in enqueue
//! order.
//!
//! A registration is shared by every role using the address (the
//! connection's worker, a logged-in session) and counted. The last `remove`
//! queues a stop record and drops the entry in the same critical section, so
//! nothing can be enqueued behind the stop.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;

use bytes::Bytes;
use parking_lot::Mutex;
use scooter_protocol::ReplyTag;
use scooter_transport::TaggedConnection;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::types::{Outbound, OutboundRx, OutboundTx};

#[derive(Debug)]
struct Registration {
    tx: OutboundTx,
    refs: usize,
}

#[derive(Debug, Default)]
pub struct ResponseManager {
    senders: Mutex<HashMap<SocketAddr, Registration>>,
}

impl ResponseManager {
    pub fn new() -> Self {
        ResponseManager::default()
    }

    /// Take a reference on `addr`, spawning its writer on first use.
    pub fn register<R, W>(&self, addr: SocketAddr, conn: &Arc<TaggedConnection<R, W>>)
    where
        R: AsyncRead + Unpin + Send + 'static,
        W: AsyncWrite + Unpin + Send + 'static,
    {
        let mut senders = self.senders.lock();
        if let Some(registration) = senders.get_mut(&addr) {
            registration.refs += 1;
            return;
        }

        let (tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(run_writer(addr, Arc::clone(conn), rx));
        senders.insert(addr, Registration { tx, refs: 1 });
        debug!(%addr, "response writer started");
    }

    /// Take another reference on an existing registration.
    ///
    /// Returns `false` (and takes nothing) when `addr` is not registered.
    pub fn retain(&self, addr: SocketAddr) -> bool {
        match self.senders.lock().get_mut(&addr) {
            Some(registration) => {
                registration.refs += 1;
                true
            }
            None => false,
        }
    }

    /// Queue one frame for `addr`. Silently dropped if `addr` is not registered.
    pub fn send(&self, addr: SocketAddr, tag: ReplyTag, payload: Bytes) {
        let senders = self.senders.lock();
        if let Some(registration) = senders.get(&addr) {
            let _ = registration.tx.send(Outbound::Data {
                tag: tag as i32,
                payload,
            });
        }
    }

    /// Release one reference. Returns `true` if that was the last one.
    pub fn remove(&self, addr: SocketAddr) -> bool {
        let mut senders = self.senders.lock();
        let Some(registration) = senders.get_mut(&addr) else {
            return false;
        };

        registration.refs -= 1;
        if registration.refs > 0 {
            return false;
        }

        let _ = registration.tx.send(Outbound::Stop);
        senders.remove(&addr);
        true
    }

    pub fn ref_count(&self, addr: SocketAddr) -> usize {
        self.senders.lock().get(&addr).map_or(0, |r| r.refs)
    }

    /// Number of live registrations.
    pub fn len(&self) -> usize {
        self.senders.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

async fn run_writer<R, W>(addr: SocketAddr, conn: Arc<TaggedConnection<R, W>>, mut rx: OutboundRx)
where
    R: AsyncRead + Unpin + Send + 'static,
    W: AsyncWrite + Unpin + Send + 'static,
{
    while let Some(record) = rx.recv().await {
        match record {
            Outbound::Data { tag, payload } => {
                if let Err(err) = conn.send(tag, &payload).await {
                    warn!(%addr, "response write failed: {}", err);
                    break;
                }
            }
            Outbound::Stop => break,
        }
    }
    debug!(%addr, "response writer stopped");
}
