use tether_session::ConnectionState;

use crate::integration::{create_test_session, init_tracing};
use crate::utils::{connect_session, wait_for_state};

#[tokio::test]
async fn test_connect_failure() {
    init_tracing();

    let session = create_test_session();
    session.relay.fail_next_connect().await;

    session.handle.start().expect("Failed to queue start");
    assert!(wait_for_state(&session.handle, ConnectionState::Disconnected).await);

    let recorded = session.observer.snapshot();
    assert!(recorded.has_status("Error connecting to signaling server"));
    assert_eq!(
        recorded.states,
        vec![
            ConnectionState::SignalingConnecting,
            ConnectionState::Disconnected
        ]
    );
    assert_eq!(session.relay.connect_count().await, 0);

    // A second attempt succeeds.
    connect_session(&session).await;
    assert_eq!(session.relay.connect_count().await, 1);
    assert_eq!(session.relay.last_subprotocol().await.as_deref(), Some("ws-signaling"));

    session.handle.stop();
    session.handle.closed().await;
}
