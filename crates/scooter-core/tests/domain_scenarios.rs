// crates/scooter-core/tests/domain_scenarios.rs
use scooter_core::{DomainError, DomainService, Location, RewardIndex, ScooterMap, Watch};

fn service_with(scooters: &[(i32, i32)]) -> DomainService {
    let mut map = ScooterMap::new(10);
    for &(x, y) in scooters {
        map.place(Location::new(x, y)).expect("scooter on the grid");
    }
    DomainService::new(map)
}

fn online(service: &DomainService, user: &str) {
    assert!(service.register_user(user, "hash"));
    assert!(service.login_user(user, "hash"));
}

#[test]
fn reserve_then_park_consumes_the_code() {
    let service = service_with(&[(1, 1), (8, 8)]);
    online(&service, "bob");

    let ticket = service
        .reserve_scooter(5, Location::new(0, 0), "bob")
        .expect("a scooter within range 5");
    assert_eq!(ticket.location, Location::new(1, 1));
    assert!(!ticket.code.is_empty());

    let trip = service
        .park_scooter(&ticket.code, Location::new(4, 3), "bob")
        .expect("valid reservation");
    assert!(trip.price >= 0.0);
    assert_eq!(trip.origin, Location::new(1, 1));
    assert_eq!(trip.destination, Location::new(4, 3));

    let second = service.park_scooter(&ticket.code, Location::new(4, 3), "bob");
    assert!(matches!(second, Err(DomainError::InvalidReservation(_))));

    // The scooter is free again at its new spot.
    assert_eq!(
        service.list_free_scooters(0, Location::new(4, 3)),
        vec![Location::new(4, 3)]
    );
}

#[test]
fn reserve_and_park_require_login() {
    let service = service_with(&[(0, 0)]);
    assert!(service.register_user("bob", "hash"));

    let err = service
        .reserve_scooter(5, Location::new(0, 0), "bob")
        .unwrap_err();
    assert_eq!(err, DomainError::NotAuthenticated("bob".into()));

    let err = service
        .park_scooter("whatever", Location::new(0, 0), "bob")
        .unwrap_err();
    assert_eq!(err, DomainError::NotAuthenticated("bob".into()));
}

#[test]
fn reserve_outside_range_finds_nothing() {
    let service = service_with(&[(9, 9)]);
    online(&service, "bob");
    let err = service
        .reserve_scooter(3, Location::new(0, 0), "bob")
        .unwrap_err();
    assert!(matches!(err, DomainError::NoScooterInRange { range: 3, .. }));
}

#[test]
fn reserved_scooters_still_count_as_crowding() {
    let service = service_with(&[(2, 2), (2, 2)]);
    online(&service, "bob");
    service
        .reserve_scooter(0, Location::new(2, 2), "bob")
        .expect("scooter at (2,2)");

    let candidates = service.reward_candidates(2);
    assert_eq!(candidates.origins, vec![Location::new(2, 2)]);
}

#[test]
fn parking_on_a_reward_destination_can_be_claimed_once() {
    let service = service_with(&[(2, 2), (2, 2)]);
    online(&service, "bob");

    let mut index = RewardIndex::build(&service.reward_candidates(2), 10.0);
    let ticket = service.reserve_scooter(0, Location::new(2, 2), "bob").unwrap();
    let trip = service
        .park_scooter(&ticket.code, Location::new(6, 6), "bob")
        .unwrap();

    assert_eq!(index.claim(trip.origin, trip.destination), Some(10.0));
    assert_eq!(index.claim(trip.origin, trip.destination), None);
}

#[test]
fn subscriptions_follow_login_state() {
    let service = service_with(&[]);
    assert!(service.register_user("bob", "hash"));
    assert!(!service.subscribe("bob"));

    assert!(service.login_user("bob", "hash"));
    assert!(service.subscribe("bob"));
    assert!(service.is_subscribed("bob"));
    assert!(service.watch("bob", Location::new(6, 6), 2));

    assert_eq!(
        service.subscriptions(),
        vec![("bob".to_string(), vec![Watch::new(Location::new(6, 6), 2)])]
    );

    assert!(service.unsubscribe("bob"));
    assert!(service.subscriptions().is_empty());
}
