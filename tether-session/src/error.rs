use tether_core::WireError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SessionError {
    /// The relay channel could not be opened or dropped unexpectedly.
    #[error("signaling transport error: {0}")]
    Transport(String),

    /// A send was attempted while the relay channel is not open.
    #[error("signaling channel is not open")]
    NotConnected,

    /// The media engine rejected or could not produce a description or candidate.
    #[error("{context}: {source}")]
    Negotiation {
        context: &'static str,
        #[source]
        source: anyhow::Error,
    },

    /// A message or command arrived out of the protocol's expected order.
    #[error("invalid state: {0}")]
    InvalidState(String),

    #[error(transparent)]
    Wire(#[from] WireError),
}

impl SessionError {
    pub(crate) fn negotiation(context: &'static str, source: anyhow::Error) -> Self {
        Self::Negotiation { context, source }
    }

    pub(crate) fn invalid_state(reason: impl Into<String>) -> Self {
        Self::InvalidState(reason.into())
    }
}
