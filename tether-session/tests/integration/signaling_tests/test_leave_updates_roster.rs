use tether_core::SignalingMessage;

use crate::integration::{create_test_session, init_tracing};
use crate::utils::{LOCAL_ID, connect_session};

#[tokio::test]
async fn test_leave_updates_roster() {
    init_tracing();

    let session = create_test_session();
    connect_session(&session).await;

    for peer in ["peer1", "peer2"] {
        session
            .relay
            .inject(SignalingMessage::join(peer.into(), "default-room", None))
            .await;
    }
    session.relay.inject(SignalingMessage::leave("peer1".into())).await;

    assert!(session.observer.wait_for_status("User left: peer1").await);
    assert_eq!(session.observer.snapshot().roster_ids(), vec![LOCAL_ID, "peer2"]);

    // Neither a leave for the local id nor one for an unknown id changes anything.
    session.relay.inject(SignalingMessage::leave(LOCAL_ID.into())).await;
    session.relay.inject(SignalingMessage::leave("ghost".into())).await;
    session
        .relay
        .inject_raw(r#"{"type":"chat","from":"peer2","data":{"text":"hi"}}"#)
        .await;
    session
        .relay
        .inject(SignalingMessage::join("peer3".into(), "default-room", None))
        .await;

    assert!(session.observer.wait_for_status("User joined: peer3").await);
    let recorded = session.observer.snapshot();
    assert_eq!(recorded.roster_ids(), vec![LOCAL_ID, "peer2", "peer3"]);
    assert_eq!(recorded.status_count("User left"), 1);

    session.handle.stop();
    session.handle.closed().await;
}
