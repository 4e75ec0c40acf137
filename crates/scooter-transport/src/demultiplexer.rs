// crates/scooter-transport/src/demultiplexer.rs

//! Per-tag fan-out of one tagged connection.
//!
//! A single reader task owns the receive side. Every inbound frame is queued
//! under its tag and one waiter on that tag is woken. Callers block in
//! [`Demultiplexer::receive`] on the tag they expect, independently of each
//! other.
//!
//! Buffers are created the first time a tag is used and dropped by whoever
//! leaves one with an empty queue and no waiters.
//!
//! When the connection fails the reader records the error once and stops.
//! Waiters still drain frames that were queued before the failure and then
//! see the recorded error; so does every later `receive`.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use bytes::Bytes;
use parking_lot::Mutex;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tracing::{debug, trace};

use crate::connection::TaggedConnection;
use crate::error::TransportError;

struct FrameBuffer {
    queue: VecDeque<Bytes>,
    waiters: usize,
    notify: Arc<Notify>,
}

impl FrameBuffer {
    fn new() -> Self {
        FrameBuffer {
            queue: VecDeque::new(),
            waiters: 0,
            notify: Arc::new(Notify::new()),
        }
    }
}

#[derive(Default)]
struct State {
    buffers: HashMap<i32, FrameBuffer>,
    error: Option<TransportError>,
}

#[derive(Default)]
struct Shared {
    state: Mutex<State>,
}

impl Shared {
    fn push(&self, tag: i32, payload: Bytes) {
        let mut state = self.state.lock();
        let buffer = state.buffers.entry(tag).or_insert_with(FrameBuffer::new);
        buffer.queue.push_back(payload);
        buffer.notify.notify_one();
    }

    /// Record the first failure and wake everyone.
    fn fail(&self, err: TransportError) {
        let mut state = self.state.lock();
        if state.error.is_none() {
            state.error = Some(err);
        }
        for buffer in state.buffers.values() {
            buffer.notify.notify_waiters();
        }
    }
}

/// Unregisters a waiter when `receive` returns or is cancelled.
struct WaiterGuard<'a> {
    shared: &'a Shared,
    tag: i32,
}

impl Drop for WaiterGuard<'_> {
    fn drop(&mut self) {
        let mut state = self.shared.state.lock();
        let collect = match state.buffers.get_mut(&self.tag) {
            Some(buffer) => {
                buffer.waiters -= 1;
                buffer.waiters == 0 && buffer.queue.is_empty()
            }
            None => false,
        };
        if collect {
            state.buffers.remove(&self.tag);
        }
    }
}

pub struct Demultiplexer<R = OwnedReadHalf, W = OwnedWriteHalf> {
    conn: Arc<TaggedConnection<R, W>>,
    shared: Arc<Shared>,
    reader: Mutex<Option<JoinHandle<()>>>,
}

impl<R, W> Demultiplexer<R, W>
where
    R: AsyncRead + Unpin + Send + 'static,
    W: AsyncWrite + Unpin + Send + 'static,
{
    pub fn new(conn: Arc<TaggedConnection<R, W>>) -> Self {
        Demultiplexer {
            conn,
            shared: Arc::new(Shared::default()),
            reader: Mutex::new(None),
        }
    }

    /// Spawn the reader task. Calling it again is a no-op.
    pub fn start(&self) {
        let mut reader = self.reader.lock();
        if reader.is_some() {
            return;
        }

        let conn = Arc::clone(&self.conn);
        let shared = Arc::clone(&self.shared);
        *reader = Some(tokio::spawn(async move {
            loop {
                match conn.receive().await {
                    Ok(frame) => {
                        trace!(tag = frame.tag, "demultiplexing frame");
                        shared.push(frame.tag, frame.payload);
                    }
                    Err(err) => {
                        debug!("demultiplexer reader stopped: {}", err);
                        shared.fail(err);
                        break;
                    }
                }
            }
        }));
    }

    pub async fn send(&self, tag: i32, payload: &[u8]) -> Result<(), TransportError> {
        self.conn.send(tag, payload).await
    }

    /// Next payload queued under `tag`, in arrival order.
    pub async fn receive(&self, tag: i32) -> Result<Bytes, TransportError> {
        let notify = {
            let mut state = self.shared.state.lock();
            let buffer = state.buffers.entry(tag).or_insert_with(FrameBuffer::new);
            buffer.waiters += 1;
            Arc::clone(&buffer.notify)
        };
        let _guard = WaiterGuard {
            shared: &self.shared,
            tag,
        };

        loop {
            let notified = notify.notified();
            tokio::pin!(notified);
            // Registered before the check below, so a push or failure that
            // lands after we release the lock still wakes us.
            notified.as_mut().enable();

            {
                let mut state = self.shared.state.lock();
                if let Some(payload) = state
                    .buffers
                    .get_mut(&tag)
                    .and_then(|buffer| buffer.queue.pop_front())
                {
                    return Ok(payload);
                }
                if let Some(err) = &state.error {
                    return Err(err.clone());
                }
            }

            notified.await;
        }
    }

    /// Shut the connection down, stop the reader and fail every waiter.
    pub async fn close(&self) {
        if let Err(err) = self.conn.shutdown().await {
            debug!("shutdown during close failed: {}", err);
        }
        if let Some(reader) = self.reader.lock().take() {
            reader.abort();
        }
        self.shared.fail(TransportError::Closed);
    }

    /// Number of tags that currently hold a buffer.
    pub fn buffered_tags(&self) -> usize {
        self.shared.state.lock().buffers.len()
    }
}

impl<R, W> Drop for Demultiplexer<R, W> {
    fn drop(&mut self) {
        if let Some(reader) = self.reader.get_mut().take() {
            reader.abort();
        }
    }
}
