//! Server-side skeletons.
//!
//! Each service tag maps to one [`Skeleton`]. A skeleton decodes the request
//! payload, calls the domain synchronously and queues its reply through the
//! response manager on the service's reply tag. A decode failure is returned
//! to the worker, which drops the connection; domain failures are ordinary
//! replies.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;

use bytes::BytesMut;
use scooter_core::DomainError;
use scooter_protocol::binary_codec::{
    decode_auth_request, decode_notification_request, decode_scooter_request, encode_bool_reply,
    encode_scooter_reply,
};
use scooter_protocol::{
    AuthRequest, NotificationRequest, ProtocolError, ReplyTag, ResponseCode, ScooterReply,
    ScooterRequest, ServiceTag,
};
use tracing::debug;

use crate::types::ServiceContext;

pub trait Skeleton: Send + Sync {
    /// Serve one request received from `peer`.
    fn handle(&self, payload: &[u8], peer: SocketAddr) -> Result<(), ProtocolError>;
}

/// Fixed tag → skeleton table shared by every worker.
#[derive(Clone)]
pub struct HandlerTable {
    handlers: HashMap<i32, Arc<dyn Skeleton>>,
}

impl HandlerTable {
    pub fn new(ctx: &ServiceContext) -> Self {
        let mut handlers: HashMap<i32, Arc<dyn Skeleton>> = HashMap::new();
        handlers.insert(
            ServiceTag::Scooter as i32,
            Arc::new(ScooterSkeleton { ctx: ctx.clone() }),
        );
        handlers.insert(
            ServiceTag::Authentication as i32,
            Arc::new(AuthSkeleton { ctx: ctx.clone() }),
        );
        handlers.insert(
            ServiceTag::Notification as i32,
            Arc::new(NotificationSkeleton { ctx: ctx.clone() }),
        );
        HandlerTable { handlers }
    }

    pub fn get(&self, tag: i32) -> Option<&dyn Skeleton> {
        self.handlers.get(&tag).map(|h| h.as_ref())
    }
}

fn bool_reply(ctx: &ServiceContext, peer: SocketAddr, tag: ReplyTag, ok: bool) {
    let mut out = BytesMut::with_capacity(1);
    encode_bool_reply(ok, &mut out);
    ctx.responses.send(peer, tag, out.freeze());
}

// ----------------------------------------------------------------------------
// Authentication
// ----------------------------------------------------------------------------

pub struct AuthSkeleton {
    ctx: ServiceContext,
}

impl AuthSkeleton {
    /// Point the user's session at `peer` and hold a reference on it.
    fn bind_session(&self, username: &str, peer: SocketAddr) {
        let responses = &self.ctx.responses;
        match self.ctx.sessions.bind(username, peer) {
            Some(previous) if previous == peer => {}
            Some(previous) => {
                responses.remove(previous);
                responses.retain(peer);
            }
            None => {
                responses.retain(peer);
            }
        }
    }

}

impl Skeleton for AuthSkeleton {
    fn handle(&self, payload: &[u8], peer: SocketAddr) -> Result<(), ProtocolError> {
        let request = decode_auth_request(payload)?;
        let domain = &self.ctx.domain;

        let ok = match &request {
            AuthRequest::Register {
                username,
                password_hash,
            } => domain.register_user(username, password_hash),
            AuthRequest::Login {
                username,
                password_hash,
            } => {
                let ok = domain.login_user(username, password_hash);
                if ok {
                    self.bind_session(username, peer);
                }
                ok
            }
            AuthRequest::Logout { username } => {
                let ok = domain.logout_user(username);
                if ok {
                    self.ctx.end_session(username);
                }
                ok
            }
        };

        debug!(%peer, op = ?request.op(), ok, "authentication request");
        bool_reply(&self.ctx, peer, ReplyTag::Authentication, ok);
        Ok(())
    }
}

// ----------------------------------------------------------------------------
// Scooters
// ----------------------------------------------------------------------------

pub struct ScooterSkeleton {
    ctx: ServiceContext,
}

fn failure_code(err: &DomainError) -> ResponseCode {
    match err {
        DomainError::NotAuthenticated(_) => ResponseCode::Unauthenticated,
        _ => ResponseCode::NotFound,
    }
}

impl ScooterSkeleton {
    fn serve(&self, request: ScooterRequest) -> ScooterReply {
        let domain = &self.ctx.domain;
        let rewards = &self.ctx.rewards;

        match request {
            ScooterRequest::List { origin, range } => {
                ScooterReply::FreeScooters(domain.list_free_scooters(range, origin))
            }
            ScooterRequest::Reserve {
                range,
                origin,
                username,
            } => match domain.reserve_scooter(range, origin, &username) {
                Ok(ticket) => {
                    rewards.signal();
                    ScooterReply::Reserved(ticket)
                }
                Err(err) => {
                    debug!(%username, "reserve refused: {}", err);
                    ScooterReply::Failed(failure_code(&err))
                }
            },
            ScooterRequest::Park {
                code,
                destination,
                username,
            } => {
                let result = domain.park_scooter(&code, destination, &username);
                let reply = match &result {
                    // Claim before the next rebuild sees the moved scooter.
                    Ok(trip) => ScooterReply::Parked {
                        price: trip.price,
                        bounty: rewards.claim(trip.origin, trip.destination),
                    },
                    Err(err) => {
                        debug!(%username, "park refused: {}", err);
                        ScooterReply::Failed(failure_code(err))
                    }
                };
                if !matches!(result, Err(DomainError::NotAuthenticated(_))) {
                    rewards.signal();
                }
                reply
            }
            ScooterRequest::ListRewards { origin, range } => {
                ScooterReply::Rewards(rewards.rewards_near(origin, range))
            }
        }
    }
}

impl Skeleton for ScooterSkeleton {
    fn handle(&self, payload: &[u8], peer: SocketAddr) -> Result<(), ProtocolError> {
        let request = decode_scooter_request(payload)?;
        let op = request.op();
        let reply = self.serve(request);
        debug!(%peer, ?op, code = ?reply.code(), "scooter request");

        let mut out = BytesMut::new();
        encode_scooter_reply(&reply, &mut out)?;
        self.ctx.responses.send(peer, ReplyTag::Scooter, out.freeze());
        Ok(())
    }
}

// ----------------------------------------------------------------------------
// Notifications
// ----------------------------------------------------------------------------

pub struct NotificationSkeleton {
    ctx: ServiceContext,
}

impl Skeleton for NotificationSkeleton {
    fn handle(&self, payload: &[u8], peer: SocketAddr) -> Result<(), ProtocolError> {
        let request = decode_notification_request(payload)?;
        let domain = &self.ctx.domain;

        let ok = match &request {
            NotificationRequest::Register { username } => domain.subscribe(username),
            NotificationRequest::IsRegistered { username } => domain.is_subscribed(username),
            NotificationRequest::AddLocation {
                username,
                location,
                radius,
            } => domain.watch(username, *location, *radius),
            NotificationRequest::Remove { username } => domain.unsubscribe(username),
        };

        debug!(%peer, op = ?request.op(), user = request.username(), ok, "notification request");
        bool_reply(&self.ctx, peer, ReplyTag::Notification, ok);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use scooter_core::{DomainService, Location, ScooterMap};
    use scooter_protocol::binary_codec::{
        decode_bool_reply, decode_scooter_reply, encode_auth_request, encode_scooter_request,
    };
    use scooter_transport::TaggedConnection;
    use tokio::io::{duplex, split, DuplexStream, ReadHalf, WriteHalf};
    use tokio::time::timeout;

    use super::*;
    use crate::reward_manager::RewardSettings;

    type Conn = TaggedConnection<ReadHalf<DuplexStream>, WriteHalf<DuplexStream>>;

    struct Fixture {
        ctx: ServiceContext,
        table: HandlerTable,
        peer: SocketAddr,
        client: Conn,
    }

    fn fixture() -> Fixture {
        let mut map = ScooterMap::new(10);
        map.place(Location::new(0, 0)).unwrap();
        let ctx = ServiceContext::new(
            Arc::new(DomainService::new(map)),
            RewardSettings {
                empty_radius: 2,
                reward: 10.0,
            },
        );

        let peer: SocketAddr = "127.0.0.1:7000".parse().unwrap();
        let (server_end, client_end) = duplex(64 * 1024);
        let (sr, sw) = split(server_end);
        let (cr, cw) = split(client_end);
        ctx.responses
            .register(peer, &Arc::new(TaggedConnection::new(sr, sw)));

        Fixture {
            table: HandlerTable::new(&ctx),
            ctx,
            peer,
            client: TaggedConnection::new(cr, cw),
        }
    }

    impl Fixture {
        fn call(&self, tag: ServiceTag, payload: &[u8]) {
            self.table
                .get(tag as i32)
                .unwrap()
                .handle(payload, self.peer)
                .unwrap();
        }

        async fn reply(&self) -> bytes::Bytes {
            timeout(Duration::from_secs(2), self.client.receive())
                .await
                .unwrap()
                .unwrap()
                .payload
        }

        async fn auth(&self, request: AuthRequest) -> bool {
            let mut buf = BytesMut::new();
            encode_auth_request(&request, &mut buf).unwrap();
            self.call(ServiceTag::Authentication, &buf);
            decode_bool_reply(&self.reply().await).unwrap()
        }

        async fn scooter(&self, request: ScooterRequest) -> ScooterReply {
            let op = request.op();
            let mut buf = BytesMut::new();
            encode_scooter_request(&request, &mut buf).unwrap();
            self.call(ServiceTag::Scooter, &buf);
            decode_scooter_reply(op, &self.reply().await).unwrap()
        }
    }

    #[tokio::test]
    async fn login_holds_a_reference_until_logout() {
        let f = fixture();
        assert!(
            f.auth(AuthRequest::Register {
                username: "bob".into(),
                password_hash: "h".into(),
            })
            .await
        );
        assert!(
            f.auth(AuthRequest::Login {
                username: "bob".into(),
                password_hash: "h".into(),
            })
            .await
        );
        assert_eq!(f.ctx.responses.ref_count(f.peer), 2);
        assert_eq!(f.ctx.sessions.address_of("bob"), Some(f.peer));

        // Logging in again from the same connection takes nothing new.
        assert!(
            f.auth(AuthRequest::Login {
                username: "bob".into(),
                password_hash: "h".into(),
            })
            .await
        );
        assert_eq!(f.ctx.responses.ref_count(f.peer), 2);

        assert!(
            f.auth(AuthRequest::Logout {
                username: "bob".into()
            })
            .await
        );
        assert_eq!(f.ctx.responses.ref_count(f.peer), 1);
        assert!(f.ctx.sessions.is_empty());
    }

    #[tokio::test]
    async fn reserve_without_login_is_unauthenticated() {
        let f = fixture();
        let reply = f
            .scooter(ScooterRequest::Reserve {
                range: 5,
                origin: Location::new(0, 0),
                username: "nobody".into(),
            })
            .await;
        assert_eq!(reply, ScooterReply::Failed(ResponseCode::Unauthenticated));
    }

    #[tokio::test]
    async fn second_park_with_the_same_code_is_not_found() {
        let f = fixture();
        f.ctx.domain.register_user("bob", "h");
        f.ctx.domain.login_user("bob", "h");

        let ticket = match f
            .scooter(ScooterRequest::Reserve {
                range: 5,
                origin: Location::new(0, 0),
                username: "bob".into(),
            })
            .await
        {
            ScooterReply::Reserved(ticket) => ticket,
            other => panic!("unexpected reply {:?}", other),
        };
        assert_eq!(ticket.location, Location::new(0, 0));

        let park = ScooterRequest::Park {
            code: ticket.code.clone(),
            destination: Location::new(3, 3),
            username: "bob".into(),
        };
        match f.scooter(park.clone()).await {
            ScooterReply::Parked { price, .. } => assert!(price >= 0.0),
            other => panic!("unexpected reply {:?}", other),
        }
        assert_eq!(
            f.scooter(park).await,
            ScooterReply::Failed(ResponseCode::NotFound)
        );
    }

    #[tokio::test]
    async fn unknown_tags_have_no_handler() {
        let f = fixture();
        assert!(f.table.get(3).is_none());
        assert!(f.table.get(-1).is_none());
    }

    #[tokio::test]
    async fn malformed_payload_is_an_error() {
        let f = fixture();
        let handler = f.table.get(ServiceTag::Notification as i32).unwrap();
        assert!(handler.handle(&[0, 0, 0, 9], f.peer).is_err());
    }
}
