use async_trait::async_trait;
use tokio::sync::mpsc;

/// A raw frame on the relay channel.
#[derive(Debug, Clone, PartialEq)]
pub enum RelayFrame {
    Text(String),
    Close,
    Error(String),
}

/// Both directions of an open relay channel.
///
/// `outbound` accepts `Text` and `Close`; `inbound` yields `Text` until the
/// channel ends with `Close` or `Error` (or the sender is dropped).
pub struct RelayConnection {
    pub outbound: mpsc::UnboundedSender<RelayFrame>,
    pub inbound: mpsc::UnboundedReceiver<RelayFrame>,
}

/// Opens duplex channels to a signaling relay.
#[async_trait]
pub trait RelayConnector: Send + Sync {
    async fn connect(&self, url: &str, subprotocol: Option<&str>) -> anyhow::Result<RelayConnection>;
}
