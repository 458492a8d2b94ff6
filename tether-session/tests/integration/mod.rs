pub mod lifecycle_tests;

use std::sync::Arc;
use tracing::Level;

use tether_session::{SessionConfig, SessionHandle};

use crate::utils::{MockEngineFactory, MockRelay, RecordingObserver, TestSession, test_config};

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(Level::DEBUG)
        .with_test_writer()
        .try_init();
}

pub fn create_test_session() -> TestSession {
    create_test_session_with(test_config())
}

pub fn create_test_session_with(config: SessionConfig) -> TestSession {
    let relay = MockRelay::new();
    let engine = MockEngineFactory::new();
    let observer = RecordingObserver::new();

    let handle = SessionHandle::spawn(
        config,
        Arc::new(relay.clone()),
        Arc::new(engine.clone()),
        Arc::new(observer.clone()),
    );

    TestSession {
        handle,
        relay,
        engine,
        observer,
    }
}
