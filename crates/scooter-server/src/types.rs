//! Shared types for the scooter TCP server.
//!
//! This module defines:
//! - `Outbound`: records queued for a client's writer task
//! - channel aliases between producers and writer tasks
//! - `ServiceContext`: the collaborators every skeleton needs

use std::net::SocketAddr;
use std::sync::Arc;

use bytes::Bytes;
use scooter_core::DomainService;
use tokio::sync::mpsc;
use tracing::info;

use crate::response_manager::ResponseManager;
use crate::reward_manager::{RewardManager, RewardSettings};
use crate::sessions::Sessions;

/// One record in a client's outbound queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outbound {
    Data { tag: i32, payload: Bytes },

    /// Last record a writer reads; queued when the registration goes away.
    Stop,
}

pub type OutboundTx = mpsc::UnboundedSender<Outbound>;
pub type OutboundRx = mpsc::UnboundedReceiver<Outbound>;

/// Everything a request handler may touch.
#[derive(Clone)]
pub struct ServiceContext {
    pub domain: Arc<DomainService>,
    pub responses: Arc<ResponseManager>,
    pub sessions: Arc<Sessions>,
    pub rewards: Arc<RewardManager>,
}

impl ServiceContext {
    /// Fresh registries around `domain`. The reward broadcaster is not started.
    pub fn new(domain: Arc<DomainService>, settings: RewardSettings) -> Self {
        let responses = Arc::new(ResponseManager::new());
        let sessions = Arc::new(Sessions::new());
        let rewards = Arc::new(RewardManager::new(
            settings,
            Arc::clone(&domain),
            Arc::clone(&responses),
            Arc::clone(&sessions),
        ));
        ServiceContext {
            domain,
            responses,
            sessions,
            rewards,
        }
    }

    /// Drop `username`'s session and watches, releasing the session reference.
    pub fn end_session(&self, username: &str) {
        if let Some(addr) = self.sessions.unbind(username) {
            self.responses.remove(addr);
        }
        self.domain.unsubscribe(username);
    }

    /// Log out every user whose session points at `peer`.
    ///
    /// Run when the connection from `peer` is no longer served.
    pub fn end_sessions_at(&self, peer: SocketAddr) -> usize {
        let users = self.sessions.unbind_at(peer);
        for user in &users {
            self.responses.remove(peer);
            self.domain.logout_user(user);
            self.domain.unsubscribe(user);
            info!(%peer, %user, "session ended with its connection");
        }
        users.len()
    }
}
