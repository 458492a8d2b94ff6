use std::time::Duration;
use tether_core::ParticipantId;

pub const DEFAULT_HEARTBEAT_INTERVAL: Duration = Duration::from_millis(10_000);

#[derive(Clone, Debug)]
pub struct TransportConfig {
    pub url: String,
    pub subprotocol: Option<String>,
    /// Heartbeats are tagged with this id.
    pub local_id: ParticipantId,
    pub heartbeat_interval: Duration,
}

impl TransportConfig {
    pub fn new(url: impl Into<String>, local_id: ParticipantId) -> Self {
        Self {
            url: url.into(),
            subprotocol: None,
            local_id,
            heartbeat_interval: DEFAULT_HEARTBEAT_INTERVAL,
        }
    }
}
