//! Stub behaviour against a hand-driven fake server.

use std::time::Duration;

use bytes::BytesMut;
use scooter_client::{ClientError, ScooterClient};
use scooter_core::{Location, RewardPath};
use scooter_protocol::binary_codec::{
    decode_auth_request, decode_scooter_request, encode_bool_reply, encode_reward_push,
    encode_scooter_reply,
};
use scooter_protocol::{
    AuthRequest, ReplyTag, ResponseCode, ScooterReply, ScooterRequest, ServiceTag,
};
use scooter_transport::TcpConnection;
use tokio::net::TcpListener;
use tokio::time::timeout;

const WAIT: Duration = Duration::from_secs(2);

async fn fake_server() -> (TcpListener, String) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap().to_string();
    (listener, addr)
}

async fn accept(listener: &TcpListener) -> TcpConnection {
    let (stream, _) = listener.accept().await.unwrap();
    TcpConnection::from_stream(stream)
}

fn bool_payload(ok: bool) -> Vec<u8> {
    let mut out = BytesMut::new();
    encode_bool_reply(ok, &mut out);
    out.to_vec()
}

#[tokio::test]
async fn same_service_calls_wait_for_the_previous_reply() {
    let (listener, addr) = fake_server().await;

    let server = tokio::spawn(async move {
        let conn = accept(&listener).await;

        let first = conn.receive().await.unwrap();
        assert_eq!(first.tag, ServiceTag::Authentication as i32);
        // The second login must not be on the wire yet.
        assert!(timeout(Duration::from_millis(100), conn.receive())
            .await
            .is_err());
        conn.send(ReplyTag::Authentication as i32, &bool_payload(true))
            .await
            .unwrap();

        let second = conn.receive().await.unwrap();
        assert_eq!(second.tag, ServiceTag::Authentication as i32);
        conn.send(ReplyTag::Authentication as i32, &bool_payload(false))
            .await
            .unwrap();

        match decode_auth_request(&first.payload).unwrap() {
            AuthRequest::Login { .. } => {}
            other => panic!("unexpected {:?}", other),
        }
    });

    let client = ScooterClient::connect(&addr).await.unwrap();
    let (a, b) = tokio::join!(client.login("ana", "x"), client.login("ana", "y"));
    let mut answers = vec![a.unwrap(), b.unwrap()];
    answers.sort();
    assert_eq!(answers, vec![false, true]);

    timeout(WAIT, server).await.unwrap().unwrap();
}

#[tokio::test]
async fn different_services_are_answered_independently() {
    let (listener, addr) = fake_server().await;

    let server = tokio::spawn(async move {
        let conn = accept(&listener).await;
        let a = conn.receive().await.unwrap();
        let b = conn.receive().await.unwrap();
        let mut tags = vec![a.tag, b.tag];
        tags.sort();
        assert_eq!(
            tags,
            vec![ServiceTag::Scooter as i32, ServiceTag::Notification as i32]
        );

        // Answer in reverse order of arrival.
        for frame in [b, a] {
            if frame.tag == ServiceTag::Scooter as i32 {
                assert!(matches!(
                    decode_scooter_request(&frame.payload).unwrap(),
                    ScooterRequest::List { .. }
                ));
                let mut out = BytesMut::new();
                let reply = ScooterReply::FreeScooters(vec![Location::new(1, 1)]);
                encode_scooter_reply(&reply, &mut out).unwrap();
                conn.send(ReplyTag::Scooter as i32, &out).await.unwrap();
            } else {
                conn.send(ReplyTag::Notification as i32, &bool_payload(true))
                    .await
                    .unwrap();
            }
        }
    });

    let client = ScooterClient::connect(&addr).await.unwrap();
    let (free, subscribed) = tokio::join!(
        client.list_free_scooters(2, Location::new(0, 0)),
        client.is_subscribed("ana"),
    );
    assert_eq!(free.unwrap(), vec![Location::new(1, 1)]);
    assert!(subscribed.unwrap());

    timeout(WAIT, server).await.unwrap().unwrap();
}

#[tokio::test]
async fn failure_codes_surface_as_refusals() {
    let (listener, addr) = fake_server().await;

    let server = tokio::spawn(async move {
        let conn = accept(&listener).await;
        conn.receive().await.unwrap();
        let mut out = BytesMut::new();
        encode_scooter_reply(&ScooterReply::Failed(ResponseCode::Unauthenticated), &mut out)
            .unwrap();
        conn.send(ReplyTag::Scooter as i32, &out).await.unwrap();
    });

    let client = ScooterClient::connect(&addr).await.unwrap();
    let err = client
        .reserve(3, Location::new(0, 0), "ana")
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::Refused(ResponseCode::Unauthenticated)));

    timeout(WAIT, server).await.unwrap().unwrap();
}

#[tokio::test]
async fn pushes_reach_the_notification_channel() {
    let (listener, addr) = fake_server().await;
    let path = RewardPath::new(Location::new(2, 2), Location::new(6, 6), 10.0);

    let server = tokio::spawn(async move {
        let conn = accept(&listener).await;
        let mut out = BytesMut::new();
        encode_reward_push(&[path], &mut out).unwrap();
        conn.send(ReplyTag::RewardPush as i32, &out).await.unwrap();
        conn
    });

    let client = ScooterClient::connect(&addr).await.unwrap();
    let mut pushes = client.notifications();
    let paths = timeout(WAIT, pushes.recv()).await.unwrap().unwrap();
    assert_eq!(paths, vec![path]);

    let _conn = timeout(WAIT, server).await.unwrap().unwrap();
}

#[tokio::test]
async fn abandoned_call_does_not_hand_its_reply_to_the_next_caller() {
    let (listener, addr) = fake_server().await;

    let server = tokio::spawn(async move {
        let conn = accept(&listener).await;

        // Answer the first login only after its caller has given up.
        conn.receive().await.unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;
        conn.send(ReplyTag::Authentication as i32, &bool_payload(true))
            .await
            .unwrap();

        let second = conn.receive().await.unwrap();
        match decode_auth_request(&second.payload).unwrap() {
            AuthRequest::Login { password_hash, .. } => assert_eq!(password_hash, "wrong"),
            other => panic!("unexpected {:?}", other),
        }
        conn.send(ReplyTag::Authentication as i32, &bool_payload(false))
            .await
            .unwrap();
        conn
    });

    let client = ScooterClient::connect(&addr).await.unwrap();
    assert!(timeout(Duration::from_millis(20), client.login("ana", "right"))
        .await
        .is_err());

    let answer = timeout(WAIT, client.login("ana", "wrong"))
        .await
        .unwrap()
        .unwrap();
    assert!(!answer);

    let _conn = timeout(WAIT, server).await.unwrap().unwrap();
}
