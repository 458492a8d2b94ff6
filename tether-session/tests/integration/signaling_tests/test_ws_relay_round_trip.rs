use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;

use tether_core::{MessageKind, ParticipantId, SessionDescription, SignalPayload, SignalingMessage};
use tether_session::{
    ConnectionState, SessionHandle, SignalingTransport, TransportConfig, TransportEvent,
    WsRelayConnector,
};

use crate::integration::init_tracing;
use crate::utils::{
    LOCAL_ID, MOCK_ANSWER_SDP, MockEngineFactory, RecordingObserver, TEST_SUBPROTOCOL,
    spawn_test_relay, test_config, wait_for_state,
};

fn ws_transport(
    url: &str,
    id: &str,
    heartbeat: Duration,
) -> (SignalingTransport, mpsc::UnboundedReceiver<TransportEvent>) {
    let (event_tx, events) = mpsc::unbounded_channel();
    let mut config = TransportConfig::new(url, id.into());
    config.subprotocol = Some(TEST_SUBPROTOCOL.to_owned());
    config.heartbeat_interval = heartbeat;
    let transport = SignalingTransport::new(config, Arc::new(WsRelayConnector), event_tx);
    (transport, events)
}

/// Next forwarded message, skipping nothing but `Opened`.
async fn next_message(events: &mut mpsc::UnboundedReceiver<TransportEvent>) -> SignalingMessage {
    loop {
        let event = tokio::time::timeout(Duration::from_secs(5), events.recv())
            .await
            .expect("Timed out waiting for a relayed message")
            .expect("Transport event channel closed");
        match event {
            TransportEvent::Opened => continue,
            TransportEvent::Message(msg) => return msg,
            other => panic!("Unexpected transport event: {other:?}"),
        }
    }
}

#[tokio::test]
async fn test_ws_transport_relays_messages_and_heartbeats() {
    init_tracing();

    let url = spawn_test_relay().await;
    let (mut alice, _alice_events) = ws_transport(&url, "alice", Duration::from_millis(100));
    let (mut bob, mut bob_events) = ws_transport(&url, "bob", Duration::from_secs(60));

    alice.connect().await.expect("alice failed to connect");
    bob.connect().await.expect("bob failed to connect");
    // Let the relay register both sockets before traffic starts.
    tokio::time::sleep(Duration::from_millis(100)).await;

    alice
        .send(&SignalingMessage::join("alice".into(), "default-room", Some("Alice".into())))
        .expect("Send failed");

    let msg = next_message(&mut bob_events).await;
    assert_eq!(msg.from, ParticipantId::from("alice"));
    assert_eq!(msg.kind(), Some(MessageKind::Join));

    // The relay acknowledges heartbeats; the transport clears `pending`.
    let deadline = Instant::now() + Duration::from_secs(5);
    loop {
        let state = alice.heartbeat_state().await;
        if state.sent >= 1 && !state.pending {
            break;
        }
        assert!(Instant::now() < deadline, "Heartbeat never acknowledged: {state:?}");
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    alice.close().await;
    bob.close().await;
    assert!(!alice.is_connected());
}

#[tokio::test]
async fn test_session_answers_over_websocket() {
    init_tracing();

    let url = spawn_test_relay().await;
    let mut config = test_config();
    config.signaling_url = url.clone();
    config.subprotocol = Some(TEST_SUBPROTOCOL.to_owned());

    let engine = MockEngineFactory::new();
    let handle = SessionHandle::spawn(
        config,
        Arc::new(WsRelayConnector),
        Arc::new(engine.clone()),
        Arc::new(RecordingObserver::new()),
    );

    let (mut remote, mut remote_events) = ws_transport(&url, "java-client", Duration::from_secs(60));
    remote.connect().await.expect("Remote failed to connect");
    tokio::time::sleep(Duration::from_millis(100)).await;

    handle.start().expect("Failed to start");
    assert!(wait_for_state(&handle, ConnectionState::SignalingConnected).await);

    let join = next_message(&mut remote_events).await;
    assert_eq!(join.from, ParticipantId::from(LOCAL_ID));
    assert_eq!(join.kind(), Some(MessageKind::Join));

    remote
        .send(&SignalingMessage::offer("java-client".into(), "v=0\r\ns=remote\r\n"))
        .expect("Failed to send offer");

    let answer = next_message(&mut remote_events).await;
    assert_eq!(answer.to, None);
    assert_eq!(
        answer.payload,
        SignalPayload::Answer(SessionDescription::new(MOCK_ANSWER_SDP))
    );
    assert_eq!(handle.state(), ConnectionState::Negotiating);

    handle.stop();
    handle.closed().await;
    remote.close().await;
}
