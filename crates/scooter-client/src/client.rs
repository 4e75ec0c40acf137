// crates/scooter-client/src/client.rs

//! Stubs for the three server-side services over one connection.
//!
//! Every call sends one request frame on the service's tag and waits for the
//! reply on the same tag. Each service admits one outstanding call at a time:
//! the per-service lock is held from send until the reply arrives. The
//! exchange runs in its own task, so a caller that stops waiting still leaves
//! its reply to be consumed there rather than by the next caller. Calls to
//! different services run concurrently.

use std::sync::Arc;

use bytes::{Bytes, BytesMut};
use scooter_core::{Location, ReservationTicket, RewardPath};
use scooter_protocol::binary_codec::{
    decode_bool_reply, decode_scooter_reply, encode_auth_request, encode_notification_request,
    encode_scooter_request,
};
use scooter_protocol::{
    AuthRequest, NotificationRequest, ScooterReply, ScooterRequest, ServiceTag,
};
use scooter_transport::{Demultiplexer, TcpConnection};
use tokio::net::{TcpStream, ToSocketAddrs};
use tokio::sync::{mpsc, Mutex};
use tracing::{debug, info};

use crate::error::ClientError;
use crate::listener::NotificationListener;

/// Result of a successful park.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParkOutcome {
    pub price: f64,
    /// Set when the trip completed a reward path.
    pub bounty: Option<f64>,
}

pub struct ScooterClient {
    demux: Arc<Demultiplexer>,
    /// One per service, indexed by `ServiceTag as usize`.
    calls: [Arc<Mutex<()>>; 3],
}

impl ScooterClient {
    pub async fn connect(addr: impl ToSocketAddrs) -> Result<Self, ClientError> {
        let stream = TcpStream::connect(addr).await?;
        let peer = stream.peer_addr()?;
        let demux = Arc::new(Demultiplexer::new(Arc::new(TcpConnection::from_stream(
            stream,
        ))));
        demux.start();
        info!(%peer, "connected");

        Ok(ScooterClient {
            demux,
            calls: Default::default(),
        })
    }

    async fn call(&self, service: ServiceTag, payload: Bytes) -> Result<Bytes, ClientError> {
        let demux = Arc::clone(&self.demux);
        let turn = Arc::clone(&self.calls[service as usize]);
        let exchange = tokio::spawn(async move {
            let _turn = turn.lock_owned().await;
            demux.send(service as i32, &payload).await?;
            demux.receive(service.reply_tag() as i32).await
        });

        let reply = exchange.await??;
        debug!(?service, len = reply.len(), "reply received");
        Ok(reply)
    }

    /// Start forwarding reward pushes into a channel.
    ///
    /// Pushes are consumed from the connection by the listener task; call this
    /// once per client.
    pub fn notifications(&self) -> mpsc::UnboundedReceiver<Vec<RewardPath>> {
        let (tx, rx) = mpsc::unbounded_channel();
        NotificationListener::new(Arc::clone(&self.demux), tx).spawn();
        rx
    }

    /// Shut the connection down. Pending calls fail with `Closed`.
    pub async fn close(&self) {
        self.demux.close().await;
    }

    // -------------------------------------------------------------------------
    // Authentication
    // -------------------------------------------------------------------------

    async fn auth(&self, request: AuthRequest) -> Result<bool, ClientError> {
        let mut payload = BytesMut::new();
        encode_auth_request(&request, &mut payload)?;
        let reply = self.call(ServiceTag::Authentication, payload.freeze()).await?;
        Ok(decode_bool_reply(&reply)?)
    }

    pub async fn register(&self, username: &str, password_hash: &str) -> Result<bool, ClientError> {
        self.auth(AuthRequest::Register {
            username: username.to_string(),
            password_hash: password_hash.to_string(),
        })
        .await
    }

    pub async fn login(&self, username: &str, password_hash: &str) -> Result<bool, ClientError> {
        self.auth(AuthRequest::Login {
            username: username.to_string(),
            password_hash: password_hash.to_string(),
        })
        .await
    }

    pub async fn logout(&self, username: &str) -> Result<bool, ClientError> {
        self.auth(AuthRequest::Logout {
            username: username.to_string(),
        })
        .await
    }

    // -------------------------------------------------------------------------
    // Scooters
    // -------------------------------------------------------------------------

    async fn scooter(&self, request: ScooterRequest) -> Result<ScooterReply, ClientError> {
        let op = request.op();
        let mut payload = BytesMut::new();
        encode_scooter_request(&request, &mut payload)?;
        let reply = self.call(ServiceTag::Scooter, payload.freeze()).await?;
        match decode_scooter_reply(op, &reply)? {
            ScooterReply::Failed(code) => Err(ClientError::Refused(code)),
            reply => Ok(reply),
        }
    }

    pub async fn list_free_scooters(
        &self,
        range: i32,
        origin: Location,
    ) -> Result<Vec<Location>, ClientError> {
        match self.scooter(ScooterRequest::List { origin, range }).await? {
            ScooterReply::FreeScooters(locations) => Ok(locations),
            _ => Err(ClientError::UnexpectedReply("list")),
        }
    }

    pub async fn reserve(
        &self,
        range: i32,
        origin: Location,
        username: &str,
    ) -> Result<ReservationTicket, ClientError> {
        let request = ScooterRequest::Reserve {
            range,
            origin,
            username: username.to_string(),
        };
        match self.scooter(request).await? {
            ScooterReply::Reserved(ticket) => Ok(ticket),
            _ => Err(ClientError::UnexpectedReply("reserve")),
        }
    }

    pub async fn park(
        &self,
        code: &str,
        destination: Location,
        username: &str,
    ) -> Result<ParkOutcome, ClientError> {
        let request = ScooterRequest::Park {
            code: code.to_string(),
            destination,
            username: username.to_string(),
        };
        match self.scooter(request).await? {
            ScooterReply::Parked { price, bounty } => Ok(ParkOutcome { price, bounty }),
            _ => Err(ClientError::UnexpectedReply("park")),
        }
    }

    /// Reward paths starting near `origin`.
    pub async fn list_rewards(
        &self,
        origin: Location,
        range: i32,
    ) -> Result<Vec<RewardPath>, ClientError> {
        match self.scooter(ScooterRequest::ListRewards { origin, range }).await? {
            ScooterReply::Rewards(paths) => Ok(paths),
            _ => Err(ClientError::UnexpectedReply("listRewards")),
        }
    }

    // -------------------------------------------------------------------------
    // Notifications
    // -------------------------------------------------------------------------

    async fn notification(&self, request: NotificationRequest) -> Result<bool, ClientError> {
        let mut payload = BytesMut::new();
        encode_notification_request(&request, &mut payload)?;
        let reply = self.call(ServiceTag::Notification, payload.freeze()).await?;
        Ok(decode_bool_reply(&reply)?)
    }

    pub async fn subscribe(&self, username: &str) -> Result<bool, ClientError> {
        self.notification(NotificationRequest::Register {
            username: username.to_string(),
        })
        .await
    }

    pub async fn is_subscribed(&self, username: &str) -> Result<bool, ClientError> {
        self.notification(NotificationRequest::IsRegistered {
            username: username.to_string(),
        })
        .await
    }

    /// Ask to be notified of reward paths ending within `radius` of `location`.
    pub async fn watch(
        &self,
        username: &str,
        location: Location,
        radius: i32,
    ) -> Result<bool, ClientError> {
        self.notification(NotificationRequest::AddLocation {
            username: username.to_string(),
            location,
            radius,
        })
        .await
    }

    pub async fn unsubscribe(&self, username: &str) -> Result<bool, ClientError> {
        self.notification(NotificationRequest::Remove {
            username: username.to_string(),
        })
        .await
    }
}
