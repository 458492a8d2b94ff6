use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

use tether_core::{MessageKind, ParticipantId};
use tether_session::{SignalingTransport, TransportConfig, TransportEvent};

use crate::integration::init_tracing;
use crate::utils::{LOCAL_ID, MockRelay};

#[tokio::test(start_paused = true)]
async fn test_heartbeat_sent_every_interval() {
    init_tracing();

    let relay = MockRelay::new();
    let (event_tx, mut events) = mpsc::unbounded_channel();
    let config = TransportConfig::new("ws://relay.test/ws", LOCAL_ID.into());
    let mut transport = SignalingTransport::new(config, Arc::new(relay.clone()), event_tx);

    transport.connect().await.expect("Failed to connect");
    assert!(matches!(events.recv().await, Some(TransportEvent::Opened)));
    assert!(relay.sent_messages().await.is_empty(), "No heartbeat before the first interval");

    tokio::time::sleep(Duration::from_secs(25)).await;

    let heartbeats = relay.sent_of_kind(MessageKind::Heartbeat).await;
    assert_eq!(heartbeats.len(), 2);
    assert!(heartbeats.iter().all(|m| m.from == ParticipantId::from(LOCAL_ID)));

    let state = transport.heartbeat_state().await;
    assert_eq!(state.interval_ms, 10_000);
    assert_eq!(state.sent, 2);
    assert!(state.pending);
    assert!(state.last_sent_at.is_some());

    transport.close().await;
}

#[tokio::test(start_paused = true)]
async fn test_heartbeat_restarts_on_reconnect() {
    init_tracing();

    let relay = MockRelay::new();
    let (event_tx, mut events) = mpsc::unbounded_channel();
    let config = TransportConfig::new("ws://relay.test/ws", LOCAL_ID.into());
    let mut transport = SignalingTransport::new(config, Arc::new(relay.clone()), event_tx);

    transport.connect().await.expect("Failed to connect");
    tokio::time::sleep(Duration::from_secs(15)).await;
    relay.drop_connection().await;

    while let Some(event) = events.recv().await {
        if matches!(event, TransportEvent::Closed) {
            break;
        }
    }
    assert!(!transport.is_connected());

    tokio::time::sleep(Duration::from_secs(30)).await;
    assert_eq!(relay.sent_of_kind(MessageKind::Heartbeat).await.len(), 1);

    transport.connect().await.expect("Failed to reconnect");
    assert_eq!(relay.connect_count().await, 2);
    assert_eq!(transport.heartbeat_state().await.sent, 0);

    tokio::time::sleep(Duration::from_secs(11)).await;
    assert_eq!(relay.sent_of_kind(MessageKind::Heartbeat).await.len(), 2);

    transport.close().await;
}
