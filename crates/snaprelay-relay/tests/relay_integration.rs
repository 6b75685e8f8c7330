//! End-to-end tests for the relay over real local sockets.

use std::net::SocketAddr;
use std::time::Duration;

use futures::{SinkExt, StreamExt};
use tokio::net::TcpListener;
use tokio::time::timeout;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;

use snaprelay_config::RelayConfig;
use snaprelay_protocols::{
    CaptureRequest, CaptureResult, ChannelMessage, ConnectionState, CorrelationId, DuplexChannel,
    ImagePayload, RelayError, SequenceTag,
};
use snaprelay_relay::{ClientPolicy, RelayClient, RelayServer};

// ============================================================================
// Test Helpers
// ============================================================================

const WAIT: Duration = Duration::from_secs(5);

async fn start_server() -> (RelayServer, SocketAddr) {
    let server = RelayServer::new(RelayConfig {
        port: 0,
        ..Default::default()
    });
    server.connect().await.unwrap();
    let addr = server.local_addr().unwrap();
    (server, addr)
}

fn fast_policy() -> ClientPolicy {
    ClientPolicy {
        heartbeat_interval: Duration::from_millis(50),
        liveness_timeout: Duration::from_millis(400),
        reconnect_delay: Duration::from_millis(20),
        max_reconnect_attempts: 5,
    }
}

async fn wait_for_peers(server: &RelayServer, count: usize) {
    timeout(WAIT, async {
        while server.peer_count() < count {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("peer never registered");
}

async fn connected_pair() -> (RelayServer, RelayClient) {
    let (server, addr) = start_server().await;
    let client = RelayClient::with_policy(format!("ws://{}", addr), fast_policy());
    client.connect().await.unwrap();
    timeout(WAIT, client.wait_connected()).await.unwrap().unwrap();
    wait_for_peers(&server, 1).await;
    (server, client)
}

fn request(prompt: &str, index: u32, total: u32) -> ChannelMessage {
    let image = ImagePayload::png(vec![0x89, b'P', b'N', b'G', index as u8]);
    ChannelMessage::ProcessRequest(
        CaptureRequest::new(image, prompt).with_sequence(SequenceTag::new(index, total)),
    )
}

// ============================================================================
// Delivery
// ============================================================================

#[tokio::test]
async fn test_sequential_requests_arrive_in_order() {
    let (server, client) = connected_pair().await;
    let mut inbound = client.inbound();

    let sent: Vec<ChannelMessage> = (1..=5)
        .map(|i| request(&format!("page {} (i/n)", i), i, 5))
        .collect();
    for message in &sent {
        assert!(server.send(message));
    }

    for expected in &sent {
        let received = timeout(WAIT, inbound.recv()).await.unwrap().unwrap();
        assert_eq!(&received, expected);
    }

    client.close().await;
    server.close().await;
}

#[tokio::test]
async fn test_result_flows_back_to_server() {
    let (server, client) = connected_pair().await;
    let mut inbound = server.inbound();

    let id = CorrelationId::new();
    let reply = ChannelMessage::result(id, CaptureResult::new("42", Some("<p>42</p>".into())));
    assert!(client.send(&reply));

    let received = timeout(WAIT, inbound.recv()).await.unwrap().unwrap();
    assert_eq!(received.correlation_id(), Some(id));
    assert_eq!(received, reply);

    client.close().await;
    server.close().await;
}

#[tokio::test]
async fn test_broadcast_reaches_every_peer() {
    let (server, addr) = start_server().await;
    let first = RelayClient::with_policy(format!("ws://{}", addr), fast_policy());
    let second = RelayClient::with_policy(format!("ws://{}/ws", addr), fast_policy());
    first.connect().await.unwrap();
    second.connect().await.unwrap();
    timeout(WAIT, first.wait_connected()).await.unwrap().unwrap();
    timeout(WAIT, second.wait_connected()).await.unwrap().unwrap();
    wait_for_peers(&server, 2).await;

    let mut rx1 = first.inbound();
    let mut rx2 = second.inbound();
    let message = ChannelMessage::error(None, "broadcast");
    assert!(server.send(&message));

    assert_eq!(timeout(WAIT, rx1.recv()).await.unwrap().unwrap(), message);
    assert_eq!(timeout(WAIT, rx2.recv()).await.unwrap().unwrap(), message);

    first.close().await;
    second.close().await;
    server.close().await;
}

// ============================================================================
// Heartbeats and malformed frames
// ============================================================================

#[tokio::test]
async fn test_server_acks_heartbeat_and_filters_it() {
    let (server, addr) = start_server().await;
    let mut inbound = server.inbound();

    let (mut ws, _) = connect_async(format!("ws://{}", addr)).await.unwrap();
    ws.send(Message::Text(r#"{"action":"heartbeat"}"#.into()))
        .await
        .unwrap();

    let frame = timeout(WAIT, ws.next()).await.unwrap().unwrap().unwrap();
    let ack = ChannelMessage::decode(frame.to_text().unwrap()).unwrap();
    assert_eq!(ack, ChannelMessage::HeartbeatAck);

    let marker = ChannelMessage::error(None, "after heartbeat");
    ws.send(Message::Text(marker.encode().unwrap().into()))
        .await
        .unwrap();

    // The heartbeat never reached the application stream.
    let received = timeout(WAIT, inbound.recv()).await.unwrap().unwrap();
    assert_eq!(received, marker);

    server.close().await;
}

#[tokio::test]
async fn test_malformed_frame_keeps_connection_open() {
    let (server, addr) = start_server().await;
    let mut inbound = server.inbound();

    let (mut ws, _) = connect_async(format!("ws://{}", addr)).await.unwrap();
    ws.send(Message::Text("{not json".into())).await.unwrap();
    ws.send(Message::Text(r#"{"action":"teleport"}"#.into()))
        .await
        .unwrap();

    let valid = ChannelMessage::error(None, "still here");
    ws.send(Message::Text(valid.encode().unwrap().into()))
        .await
        .unwrap();

    let received = timeout(WAIT, inbound.recv()).await.unwrap().unwrap();
    assert_eq!(received, valid);
    assert_eq!(server.peer_count(), 1);

    server.close().await;
}

#[tokio::test]
async fn test_client_heartbeats_keep_session_alive() {
    let (server, client) = connected_pair().await;

    // Several liveness windows pass; acks keep the client connected.
    tokio::time::sleep(Duration::from_millis(1200)).await;
    assert_eq!(client.state(), ConnectionState::Connected);
    assert_eq!(client.dial_count(), 1);

    client.close().await;
    server.close().await;
}

// ============================================================================
// Reconnect and shutdown
// ============================================================================

#[tokio::test]
async fn test_reconnect_is_bounded() {
    // Reserve a port, then free it so every dial is refused.
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let client = RelayClient::with_policy(format!("ws://{}", addr), fast_policy());
    client.connect().await.unwrap();

    let result = timeout(WAIT, client.wait_connected()).await.unwrap();
    assert!(matches!(result, Err(RelayError::RetriesExhausted { attempts: 5 })));
    assert_eq!(client.dial_count(), 6);
    assert_eq!(client.state(), ConnectionState::Disconnected);

    // No further dials once the client gave up.
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(client.dial_count(), 6);
}

#[tokio::test]
async fn test_silent_server_triggers_reconnect() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    // Completes the handshake, then never answers.
    tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((stream, _)) = listener.accept().await {
            if let Ok(ws) = tokio_tungstenite::accept_async(stream).await {
                held.push(ws);
            }
        }
    });

    let client = RelayClient::with_policy(format!("ws://{}", addr), fast_policy());
    client.connect().await.unwrap();
    timeout(WAIT, client.wait_connected()).await.unwrap().unwrap();

    timeout(WAIT, async {
        while client.dial_count() < 2 {
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    })
    .await
    .expect("client never redialed");

    client.close().await;
}

#[tokio::test]
async fn test_close_does_not_reconnect() {
    let (server, client) = connected_pair().await;

    client.close().await;
    assert_eq!(client.state(), ConnectionState::Disconnected);
    assert!(!client.send(&ChannelMessage::Heartbeat));

    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(client.dial_count(), 1);
    assert_eq!(client.state(), ConnectionState::Disconnected);

    server.close().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_close_right_after_connect_leaves_client_reusable() {
    let (server, addr) = start_server().await;
    let client = RelayClient::with_policy(format!("ws://{}", addr), fast_policy());

    for round in 0..200 {
        client.connect().await.unwrap();
        for _ in 0..(round % 7) {
            tokio::task::yield_now().await;
        }
        client.close().await;
        assert_eq!(client.state(), ConnectionState::Disconnected);

        tokio::time::sleep(Duration::from_millis(2)).await;
        assert_eq!(
            client.state(),
            ConnectionState::Disconnected,
            "state changed after close in round {}",
            round
        );
        assert!(!client.send(&ChannelMessage::Heartbeat));
    }

    let dials = client.dial_count();
    client.connect().await.unwrap();
    timeout(WAIT, client.wait_connected()).await.unwrap().unwrap();
    assert!(client.dial_count() > dials);
    assert!(client.send(&ChannelMessage::Heartbeat));

    client.close().await;
    server.close().await;
}

#[tokio::test]
async fn test_connect_while_connected_is_noop() {
    let (server, client) = connected_pair().await;

    client.connect().await.unwrap();
    client.connect().await.unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(client.dial_count(), 1);

    client.close().await;
    server.close().await;
}

#[tokio::test]
async fn test_health_endpoint() {
    let (server, client) = connected_pair().await;
    let addr = server.local_addr().unwrap();

    let body: serde_json::Value = reqwest::get(format!("http://{}/health", addr))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["status"], "ok");
    assert_eq!(body["peers"], 1);

    client.close().await;
    server.close().await;
}
