use crate::negotiation::{MediaEngineFactory, SessionNegotiator};
use crate::roster::RosterTracker;
use crate::session::session_config::SessionConfig;
use crate::transport::{RelayConnector, SignalingTransport, TransportEvent};
use std::sync::Arc;
use tokio::sync::mpsc;

/// The components one session owns. Only the session loop touches them.
pub(crate) struct SessionContext {
    pub(crate) transport: SignalingTransport,
    pub(crate) negotiator: SessionNegotiator,
    pub(crate) roster: RosterTracker,
}

impl SessionContext {
    pub(crate) fn new(
        config: &SessionConfig,
        connector: Arc<dyn RelayConnector>,
        factory: Arc<dyn MediaEngineFactory>,
        transport_tx: mpsc::UnboundedSender<TransportEvent>,
    ) -> Self {
        Self {
            transport: SignalingTransport::new(config.transport_config(), connector, transport_tx),
            negotiator: SessionNegotiator::new(
                config.local_id.clone(),
                config.remote_id.clone(),
                factory,
            ),
            roster: RosterTracker::new(),
        }
    }
}
