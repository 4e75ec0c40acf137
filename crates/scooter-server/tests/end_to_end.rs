//! Full client/server sessions over loopback TCP.

use std::sync::Arc;
use std::time::Duration;

use scooter_client::{ClientError, ScooterClient};
use scooter_core::{DomainService, Location, RewardPath, ScooterMap};
use scooter_protocol::ResponseCode;
use scooter_server::{Config, RewardManager, Server};
use scooter_transport::{TcpConnection, TransportError};
use tokio::net::TcpStream;
use tokio::time::{sleep, timeout};

const WAIT: Duration = Duration::from_secs(3);

struct Running {
    addr: String,
    rewards: Arc<RewardManager>,
    sessions: Arc<scooter_server::Sessions>,
}

async fn start(map: ScooterMap, max_clients: usize) -> Running {
    let config = Config {
        bind_addr: "127.0.0.1".into(),
        port: 0,
        max_clients,
        empty_radius: 2,
        reward: 10.0,
        ..Config::default()
    };
    let server = Server::with_domain(config, Arc::new(DomainService::new(map)))
        .await
        .unwrap();
    let running = Running {
        addr: server.local_addr().unwrap().to_string(),
        rewards: Arc::clone(&server.context().rewards),
        sessions: Arc::clone(&server.context().sessions),
    };
    tokio::spawn(server.run());
    running
}

fn map_with(scooters: &[(i32, i32)]) -> ScooterMap {
    let mut map = ScooterMap::new(10);
    for &(x, y) in scooters {
        map.place(Location::new(x, y)).unwrap();
    }
    map
}

async fn logged_in(addr: &str, user: &str) -> ScooterClient {
    let client = ScooterClient::connect(addr).await.unwrap();
    assert!(client.register(user, "secret").await.unwrap());
    assert!(client.login(user, "secret").await.unwrap());
    client
}

async fn wait_for_pass(rewards: &RewardManager, at_least: u64) {
    timeout(WAIT, async {
        while rewards.completed_passes() < at_least {
            sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .unwrap();
}

#[tokio::test]
async fn reservation_code_is_single_use() {
    let server = start(map_with(&[(0, 0)]), 16).await;
    let bob = logged_in(&server.addr, "bob").await;

    let ticket = bob.reserve(5, Location::new(0, 0), "bob").await.unwrap();
    assert_eq!(ticket.location, Location::new(0, 0));
    assert!(!ticket.code.is_empty());

    let outcome = bob.park(&ticket.code, Location::new(1, 2), "bob").await.unwrap();
    assert!(outcome.price >= 0.0);

    let err = bob
        .park(&ticket.code, Location::new(1, 2), "bob")
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::Refused(ResponseCode::NotFound)));
}

#[tokio::test]
async fn scooter_calls_need_a_login() {
    let server = start(map_with(&[(0, 0)]), 16).await;
    let client = ScooterClient::connect(&server.addr).await.unwrap();

    let err = client
        .reserve(5, Location::new(0, 0), "ghost")
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::Refused(ResponseCode::Unauthenticated)));

    // Listing is open to anyone.
    let free = client.list_free_scooters(5, Location::new(0, 0)).await.unwrap();
    assert_eq!(free, vec![Location::new(0, 0)]);
}

#[tokio::test]
async fn watcher_is_pushed_the_path_to_an_empty_cell() {
    let server = start(map_with(&[(2, 2), (2, 2)]), 16).await;
    let bob = logged_in(&server.addr, "bob").await;
    let mut pushes = bob.notifications();

    assert!(bob.subscribe("bob").await.unwrap());
    assert!(bob.is_subscribed("bob").await.unwrap());
    assert!(bob.watch("bob", Location::new(6, 6), 2).await.unwrap());
    server.rewards.signal();

    let paths = timeout(WAIT, pushes.recv()).await.unwrap().unwrap();
    assert!(paths.contains(&RewardPath::new(
        Location::new(2, 2),
        Location::new(6, 6),
        10.0
    )));
    assert!(paths
        .iter()
        .all(|p| p.finish.manhattan_distance(Location::new(6, 6)) <= 2));
}

#[tokio::test]
async fn completing_a_reward_path_pays_a_bounty() {
    let server = start(map_with(&[(2, 2), (2, 2)]), 16).await;
    wait_for_pass(&server.rewards, 1).await;

    let ana = logged_in(&server.addr, "ana").await;
    let offered = ana.list_rewards(Location::new(2, 2), 8).await.unwrap();
    assert!(offered
        .iter()
        .any(|p| p.start == Location::new(2, 2) && p.finish == Location::new(6, 6)));

    let ticket = ana.reserve(0, Location::new(2, 2), "ana").await.unwrap();
    let outcome = ana
        .park(&ticket.code, Location::new(6, 6), "ana")
        .await
        .unwrap();
    assert_eq!(outcome.bounty, Some(10.0));
}

#[tokio::test]
async fn logout_ends_the_session() {
    let server = start(map_with(&[]), 16).await;
    let bob = logged_in(&server.addr, "bob").await;
    assert!(server.sessions.address_of("bob").is_some());

    assert!(bob.subscribe("bob").await.unwrap());
    assert!(bob.logout("bob").await.unwrap());
    assert!(server.sessions.address_of("bob").is_none());
    assert!(!bob.is_subscribed("bob").await.unwrap());

    // A second logout has nothing to end.
    assert!(!bob.logout("bob").await.unwrap());
}

#[tokio::test]
async fn unknown_tag_drops_the_connection() {
    let server = start(map_with(&[]), 16).await;
    let raw = TcpConnection::from_stream(TcpStream::connect(&server.addr).await.unwrap());

    raw.send(42, b"hello?").await.unwrap();
    let result = timeout(WAIT, raw.receive()).await.unwrap();
    assert!(matches!(result, Err(TransportError::Closed)));

    // The server keeps serving everyone else.
    let client = ScooterClient::connect(&server.addr).await.unwrap();
    assert!(client.register("carol", "pw").await.unwrap());
}

#[tokio::test]
async fn connections_over_the_limit_are_dropped() {
    let server = start(map_with(&[]), 1).await;
    let first = ScooterClient::connect(&server.addr).await.unwrap();
    assert!(first.register("dave", "pw").await.unwrap());

    let extra = TcpConnection::from_stream(TcpStream::connect(&server.addr).await.unwrap());
    let result = timeout(WAIT, extra.receive()).await.unwrap();
    assert!(matches!(result, Err(TransportError::Closed)));

    // The first connection is unaffected.
    assert!(first.login("dave", "pw").await.unwrap());
}

#[tokio::test]
async fn extreme_coordinates_are_answered_not_fatal() {
    let server = start(map_with(&[(0, 0), (0, 0)]), 16).await;
    let bob = logged_in(&server.addr, "bob").await;
    let far = Location::new(i32::MIN, i32::MAX);

    let free = timeout(WAIT, bob.list_free_scooters(i32::MAX, far))
        .await
        .unwrap()
        .unwrap();
    assert!(free.is_empty());

    let err = timeout(WAIT, bob.reserve(5, Location::new(i32::MAX, i32::MIN), "bob"))
        .await
        .unwrap()
        .unwrap_err();
    assert!(matches!(err, ClientError::Refused(ResponseCode::NotFound)));

    let rewards = timeout(WAIT, bob.list_rewards(far, i32::MAX))
        .await
        .unwrap()
        .unwrap();
    assert!(rewards.is_empty());

    assert!(bob.subscribe("bob").await.unwrap());
    assert!(timeout(WAIT, bob.watch("bob", far, i32::MAX))
        .await
        .unwrap()
        .unwrap());
    server.rewards.signal();
    wait_for_pass(&server.rewards, 2).await;

    // The connection survived every request above.
    assert_eq!(
        bob.list_free_scooters(0, Location::new(0, 0)).await.unwrap(),
        vec![Location::new(0, 0), Location::new(0, 0)]
    );
}
