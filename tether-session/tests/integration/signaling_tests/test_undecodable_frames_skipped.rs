use std::sync::Arc;
use tokio::sync::mpsc;

use tether_core::{MessageKind, SignalPayload};
use tether_session::{SignalingTransport, TransportConfig, TransportEvent};

use crate::integration::init_tracing;
use crate::utils::{LOCAL_ID, MockRelay};

#[tokio::test]
async fn test_undecodable_frames_are_skipped() {
    init_tracing();

    let relay = MockRelay::new();
    let (event_tx, mut events) = mpsc::unbounded_channel();
    let config = TransportConfig::new("ws://relay.test/ws", LOCAL_ID.into());
    let mut transport = SignalingTransport::new(config, Arc::new(relay.clone()), event_tx);

    transport.connect().await.expect("Failed to connect");
    assert!(matches!(events.recv().await, Some(TransportEvent::Opened)));

    relay.inject_raw("not json at all").await;
    relay
        .inject_raw(r#"{"type":"offer","from":"java-client","data":{}}"#)
        .await;
    relay
        .inject_raw(r#"{"type":"chat","from":"peer1","data":{"text":"hi"}}"#)
        .await;
    relay
        .inject_raw(r#"{"type":"ice-candidate","from":"java-client","data":{"candidate":"candidate:1 1 UDP 1 10.0.0.1 9 typ host","sdpMid":"0","sdpMLineIndex":0}}"#)
        .await;

    let Some(TransportEvent::Message(unknown)) = events.recv().await else {
        panic!("Expected the unknown message to be forwarded");
    };
    assert!(matches!(unknown.payload, SignalPayload::Unknown { ref kind, .. } if kind == "chat"));

    let Some(TransportEvent::Message(candidate)) = events.recv().await else {
        panic!("Expected the candidate message");
    };
    assert_eq!(candidate.kind(), Some(MessageKind::Candidate));
    assert!(transport.is_connected());

    transport.close().await;
}
