use std::time::Duration;
use tether_core::MessageKind;
use tether_session::ConnectionState;

use crate::integration::{create_test_session, init_tracing};
use crate::utils::{EngineCall, connect_session, remote_offer, wait_for_state};

#[tokio::test]
async fn test_stop_discards_in_flight_answer() {
    init_tracing();

    let session = create_test_session();
    connect_session(&session).await;
    session.engine.set_delay(Duration::from_millis(200)).await;

    session.relay.inject(remote_offer("v=0\r\ns=remote\r\n")).await;
    assert!(wait_for_state(&session.handle, ConnectionState::Negotiating).await);

    session.handle.stop();
    session.handle.closed().await;

    // Give a discarded answer every chance to show up.
    tokio::time::sleep(Duration::from_millis(300)).await;

    assert!(session.relay.sent_of_kind(MessageKind::Answer).await.is_empty());
    assert!(session.engine.calls().await.contains(&EngineCall::Close));

    let recorded = session.observer.snapshot();
    assert!(!recorded.has_status("Sending answer"));
    assert!(recorded.failures.is_empty());
    assert_eq!(recorded.states.last(), Some(&ConnectionState::Closed));
    assert_eq!(recorded.closed, 1);
}
