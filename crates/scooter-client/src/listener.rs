//! Background task that turns reward pushes into decoded paths.

use std::sync::Arc;

use scooter_core::RewardPath;
use scooter_protocol::binary_codec::decode_reward_push;
use scooter_protocol::ReplyTag;
use scooter_transport::Demultiplexer;
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::error::ClientError;

pub struct NotificationListener {
    demux: Arc<Demultiplexer>,
    tx: UnboundedSender<Vec<RewardPath>>,
}

impl NotificationListener {
    pub fn new(demux: Arc<Demultiplexer>, tx: UnboundedSender<Vec<RewardPath>>) -> Self {
        NotificationListener { demux, tx }
    }

    pub fn spawn(self) -> JoinHandle<Result<(), ClientError>> {
        tokio::spawn(async move {
            let result = self.run().await;
            if let Err(err) = &result {
                warn!("notification listener stopped: {}", err);
            }
            result
        })
    }

    /// Forward pushes until the connection closes or nobody is listening.
    pub async fn run(self) -> Result<(), ClientError> {
        loop {
            let payload = match self.demux.receive(ReplyTag::RewardPush as i32).await {
                Ok(payload) => payload,
                Err(err) if err.is_closed() => return Ok(()),
                Err(err) => return Err(err.into()),
            };

            let paths = decode_reward_push(&payload)?;
            debug!(paths = paths.len(), "reward push");
            if self.tx.send(paths).is_err() {
                return Ok(());
            }
        }
    }
}
