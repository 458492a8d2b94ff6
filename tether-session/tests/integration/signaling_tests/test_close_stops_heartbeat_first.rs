use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

use tether_core::{MessageKind, SignalingMessage};
use tether_session::{RelayFrame, SessionError, SignalingTransport, TransportConfig};

use crate::integration::init_tracing;
use crate::utils::{LOCAL_ID, MockRelay};

#[tokio::test(start_paused = true)]
async fn test_close_stops_heartbeat_then_closes_channel() {
    init_tracing();

    let relay = MockRelay::new();
    let (event_tx, _events) = mpsc::unbounded_channel();
    let config = TransportConfig::new("ws://relay.test/ws", LOCAL_ID.into());
    let mut transport = SignalingTransport::new(config, Arc::new(relay.clone()), event_tx);

    transport.connect().await.expect("Failed to connect");
    tokio::time::sleep(Duration::from_secs(15)).await;

    transport.close().await;
    transport.close().await;
    tokio::time::sleep(Duration::from_secs(60)).await;

    let written = relay.written().await;
    assert_eq!(written.len(), 2, "One heartbeat and one close frame: {written:?}");
    assert_eq!(written.last(), Some(&RelayFrame::Close));
    assert_eq!(relay.sent_of_kind(MessageKind::Heartbeat).await.len(), 1);
    assert_eq!(relay.close_frames().await, 1);

    assert!(!transport.is_connected());
    let err = transport
        .send(&SignalingMessage::leave(LOCAL_ID.into()))
        .unwrap_err();
    assert!(matches!(err, SessionError::NotConnected));
}
