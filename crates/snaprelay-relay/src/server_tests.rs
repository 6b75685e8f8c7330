use super::*;

fn ephemeral_config() -> RelayConfig {
    RelayConfig {
        port: 0,
        ..Default::default()
    }
}

#[test]
fn test_create_router() {
    let state = Arc::new(RelayState::new());
    let _router = create_router(state);
}

#[test]
fn test_relay_state() {
    let state = RelayState::new();
    assert!(state.peers.is_empty());
    assert!(!state.started.load(Ordering::SeqCst));
}

#[test]
fn test_server_address() {
    let server = RelayServer::new(RelayConfig::default());
    assert_eq!(server.address(), "127.0.0.1:8765");
    assert!(server.local_addr().is_none());
}

#[test]
fn test_send_when_not_started() {
    let server = RelayServer::new(ephemeral_config());
    assert!(!server.send(&ChannelMessage::Heartbeat));
    assert_eq!(server.state(), ConnectionState::Disconnected);
}

#[tokio::test]
async fn test_send_with_zero_peers() {
    let server = RelayServer::new(ephemeral_config());
    server.connect().await.unwrap();

    assert!(server.local_addr().is_some());
    assert_eq!(server.state(), ConnectionState::Connecting);
    assert!(!server.send(&ChannelMessage::error(None, "nobody listening")));

    server.close().await;
    assert_eq!(server.state(), ConnectionState::Disconnected);
}

#[tokio::test]
async fn test_connect_is_idempotent() {
    let server = RelayServer::new(ephemeral_config());
    server.connect().await.unwrap();
    let first = server.local_addr();
    server.connect().await.unwrap();
    assert_eq!(server.local_addr(), first);
    server.close().await;
}

#[tokio::test]
async fn test_bind_conflict() {
    let first = RelayServer::new(ephemeral_config());
    first.connect().await.unwrap();
    let port = first.local_addr().unwrap().port();

    let second = RelayServer::new(RelayConfig {
        port,
        ..Default::default()
    });
    let result = second.connect().await;
    assert!(matches!(result, Err(RelayError::Bind { .. })));

    first.close().await;
}
