//! Client reconnection integration tests
//!
//! Tests for the wait-for-ready policy and automatic reconnection when the
//! daemon goes away and comes back.

mod common;

use common::{fast_client, mock_response, socket_path, within, MockLightningd};
use lnrpc_client::{ClientBuilder, ConnectionState, ExponentialBackoff, FixedDelay, ReconnectionStrategy};
use serde_json::json;
use std::time::Duration;
use tokio::net::UnixListener;

#[tokio::test]
async fn test_call_waits_for_daemon_to_appear() {
    let path = socket_path("late-daemon");
    let client = fast_client(&path);

    let call = tokio::spawn({
        let client = client.clone();
        async move { client.getinfo().await }
    });

    // Let a few connection attempts fail first
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(!call.is_finished());
    assert_ne!(client.connection_state(), ConnectionState::Connected);

    let daemon = MockLightningd::with_handler(&path, |req| async move {
        Some(mock_response(&req.id, json!({"blockheight": 800000})))
    })
    .await;

    let info = within(call).await.unwrap().unwrap();
    assert_eq!(info["blockheight"], 800000);
    assert!(client.is_connected());

    client.shutdown().await;
    daemon.shutdown().await;
}

#[tokio::test]
async fn test_reconnect_after_daemon_restart() {
    let path = socket_path("restart");
    let daemon = MockLightningd::new(&path).await;
    let client = fast_client(&path);
    let mut states = client.subscribe_state();

    within(client.wait_ready()).await.unwrap();
    assert_eq!(within(client.getinfo()).await.unwrap(), json!(true));

    daemon.shutdown().await;
    within(states.wait_for(|s| *s != ConnectionState::Connected))
        .await
        .unwrap();

    // Issued while the daemon is down; must survive the outage
    let call = tokio::spawn({
        let client = client.clone();
        async move { client.invoke("listfunds", vec![]).await }
    });

    tokio::time::sleep(Duration::from_millis(50)).await;
    let mut daemon = MockLightningd::with_handler(&path, |req| async move {
        Some(mock_response(&req.id, json!({"outputs": []})))
    })
    .await;

    assert_eq!(within(call).await.unwrap().unwrap(), json!({"outputs": []}));
    assert_eq!(daemon.wait_for_request().await.method, "listfunds");
    assert!(client.is_connected());

    client.shutdown().await;
    daemon.shutdown().await;
}

#[tokio::test]
async fn test_state_transitions_through_outage() {
    let path = socket_path("states");
    let listener = UnixListener::bind(&path).unwrap();
    let client = ClientBuilder::new(&path)
        .with_reconnect(Box::new(FixedDelay::new(Duration::from_millis(20))))
        .build()
        .unwrap();
    let mut states = client.subscribe_state();

    let (stream, _) = within(listener.accept()).await.unwrap();
    within(states.wait_for(|s| *s == ConnectionState::Connected))
        .await
        .unwrap();

    // An orderly close by the daemon is treated as a failure
    drop(stream);
    within(states.wait_for(|s| matches!(s, ConnectionState::Reconnecting { .. })))
        .await
        .unwrap();

    let (_stream, _) = within(listener.accept()).await.unwrap();
    within(states.wait_for(|s| *s == ConnectionState::Connected))
        .await
        .unwrap();

    client.shutdown().await;
    assert_eq!(client.connection_state(), ConnectionState::Disconnected);
    let _ = std::fs::remove_file(&path);
}

#[tokio::test]
async fn test_pending_call_survives_connection_drop() {
    let path = socket_path("drop-midcall");
    let listener = UnixListener::bind(&path).unwrap();
    let client = fast_client(&path);

    let call = tokio::spawn({
        let client = client.clone();
        async move { client.invoke("waitanyinvoice", vec![json!(null)]).await }
    });

    // First connection takes the request and dies without answering
    let (mut stream, _) = within(listener.accept()).await.unwrap();
    let requests = common::read_requests(&mut stream, 1).await;
    drop(stream);

    // The entry is still pending; an answer on the next connection resolves it
    let (mut fresh, _) = within(listener.accept()).await.unwrap();
    let reply = mock_response(&requests[0].id, json!({"label": "coffee"}));
    tokio::io::AsyncWriteExt::write_all(&mut fresh, reply.as_bytes())
        .await
        .unwrap();

    assert_eq!(
        within(call).await.unwrap().unwrap(),
        json!({"label": "coffee"})
    );

    client.shutdown().await;
    let _ = std::fs::remove_file(&path);
}

#[test]
fn test_default_backoff_schedule() {
    let mut backoff = ExponentialBackoff::default();
    let delays: Vec<_> = (0..7).map(|attempt| backoff.next_delay(attempt)).collect();
    assert_eq!(
        delays,
        [1, 2, 4, 8, 16, 16, 16].map(Duration::from_secs).to_vec()
    );
}
