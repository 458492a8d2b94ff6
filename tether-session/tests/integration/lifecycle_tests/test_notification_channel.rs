use std::sync::Arc;
use std::time::Duration;
use tether_session::{ConnectionState, SessionHandle, SessionNotification};
use tokio::sync::mpsc;

use crate::integration::init_tracing;
use crate::utils::{MockEngineFactory, MockRelay, test_config};

#[tokio::test]
async fn test_notification_channel() {
    init_tracing();

    let relay = MockRelay::new();
    let (tx, mut rx) = mpsc::unbounded_channel();
    let handle = SessionHandle::spawn(
        test_config(),
        Arc::new(relay.clone()),
        Arc::new(MockEngineFactory::new()),
        Arc::new(tx),
    );

    handle.start().expect("Failed to start session");
    handle.wait_for_state(ConnectionState::SignalingConnected).await;
    handle.stop();
    handle.closed().await;

    let mut notifications = Vec::new();
    while let Ok(Some(n)) = tokio::time::timeout(Duration::from_millis(100), rx.recv()).await {
        let done = matches!(n, SessionNotification::Closed);
        notifications.push(n);
        if done {
            break;
        }
    }

    let states: Vec<ConnectionState> = notifications
        .iter()
        .filter_map(|n| match n {
            SessionNotification::StateChanged(s) => Some(*s),
            _ => None,
        })
        .collect();
    assert_eq!(
        states,
        vec![
            ConnectionState::SignalingConnecting,
            ConnectionState::SignalingConnected,
            ConnectionState::Closed,
        ]
    );

    assert!(notifications.iter().any(|n| matches!(
        n,
        SessionNotification::Status(s) if s == "Connected to the signaling server"
    )));
    assert!(notifications.iter().any(|n| matches!(
        n,
        SessionNotification::ParticipantsChanged(ps) if ps.len() == 1
    )));
    assert!(matches!(notifications.last(), Some(SessionNotification::Closed)));
}
