//! Reward-path broadcaster.
//!
//! One background task per server. It sleeps on a [`WorkSignal`]; every
//! wake-up is one pass:
//!
//! 1. ask the domain for reward candidates and rebuild the index from scratch,
//! 2. match every subscriber's watches against the fresh index,
//! 3. push each user's matches, as one frame, to the address of their session.
//!
//! Signals that arrive while a pass is running collapse into one more pass.
//! The index has its own lock; request handlers read it (`listRewards`) and
//! claim from it (parking) without touching the domain's locks.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use bytes::BytesMut;
use parking_lot::Mutex;
use scooter_core::{DomainService, Location, RewardIndex, RewardPath};
use scooter_protocol::binary_codec::encode_reward_push;
use scooter_protocol::ReplyTag;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::response_manager::ResponseManager;
use crate::sessions::Sessions;

/// Coalescing wake-up: a pending flag plus a notifier.
#[derive(Debug, Default)]
pub struct WorkSignal {
    pending: AtomicBool,
    notify: Notify,
}

impl WorkSignal {
    pub fn new() -> Self {
        WorkSignal::default()
    }

    pub fn signal(&self) {
        if !self.pending.swap(true, Ordering::AcqRel) {
            self.notify.notify_one();
        }
    }

    /// Wait until signalled, then clear the flag.
    pub async fn wait(&self) {
        loop {
            if self.pending.swap(false, Ordering::AcqRel) {
                return;
            }
            self.notify.notified().await;
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RewardSettings {
    /// A destination has no scooter within this distance.
    pub empty_radius: i32,
    /// Reward attached to every path.
    pub reward: f64,
}

pub struct RewardManager {
    settings: RewardSettings,
    domain: Arc<DomainService>,
    responses: Arc<ResponseManager>,
    sessions: Arc<Sessions>,
    index: Mutex<RewardIndex>,
    work: WorkSignal,
    passes: AtomicU64,
}

impl RewardManager {
    pub fn new(
        settings: RewardSettings,
        domain: Arc<DomainService>,
        responses: Arc<ResponseManager>,
        sessions: Arc<Sessions>,
    ) -> Self {
        RewardManager {
            settings,
            domain,
            responses,
            sessions,
            index: Mutex::new(RewardIndex::new()),
            work: WorkSignal::new(),
            passes: AtomicU64::new(0),
        }
    }

    /// Start the broadcaster task.
    pub fn spawn(self: &Arc<Self>) -> JoinHandle<()> {
        let manager = Arc::clone(self);
        tokio::spawn(async move {
            info!(
                empty_radius = manager.settings.empty_radius,
                reward = manager.settings.reward,
                "reward broadcaster started"
            );
            loop {
                manager.work.wait().await;
                manager.run_pass();
            }
        })
    }

    /// Ask for a broadcast pass.
    pub fn signal(&self) {
        self.work.signal();
    }

    /// Rebuild the index and push matches. Returns the number of pushes queued.
    pub fn run_pass(&self) -> usize {
        let candidates = self.domain.reward_candidates(self.settings.empty_radius);
        let subscribers = self.domain.subscriptions();

        let matches: Vec<(String, Vec<RewardPath>)> = {
            let mut index = self.index.lock();
            *index = RewardIndex::build(&candidates, self.settings.reward);
            subscribers
                .into_iter()
                .map(|(user, watches)| {
                    let paths = index.matching(&watches);
                    (user, paths)
                })
                .filter(|(_, paths)| !paths.is_empty())
                .collect()
        };

        let mut pushed = 0;
        for (user, paths) in matches {
            let Some(addr) = self.sessions.address_of(&user) else {
                continue;
            };
            let mut payload = BytesMut::new();
            if let Err(err) = encode_reward_push(&paths, &mut payload) {
                warn!(%user, "could not encode reward push: {}", err);
                continue;
            }
            self.responses
                .send(addr, ReplyTag::RewardPush, payload.freeze());
            debug!(%user, %addr, paths = paths.len(), "reward push queued");
            pushed += 1;
        }

        self.passes.fetch_add(1, Ordering::Relaxed);
        pushed
    }

    pub fn rewards_near(&self, origin: Location, range: i32) -> Vec<RewardPath> {
        self.index.lock().rewards_near(origin, range)
    }

    /// Take the reward for a completed `start -> finish` trip, if one is on offer.
    pub fn claim(&self, start: Location, finish: Location) -> Option<f64> {
        self.index.lock().claim(start, finish)
    }

    pub fn completed_passes(&self) -> u64 {
        self.passes.load(Ordering::Relaxed)
    }
}
