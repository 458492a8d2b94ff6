use tether_core::SignalingMessage;

/// Events the signaling transport reports to the session loop.
#[derive(Debug)]
pub enum TransportEvent {
    /// The relay channel is open and the heartbeat is running.
    Opened,

    /// A decoded inbound message. Heartbeat acknowledgements never appear here.
    Message(SignalingMessage),

    /// The relay closed the channel.
    Closed,

    /// The channel failed; it is no longer usable.
    Error(String),
}
