use std::fmt;

/// The single authoritative state of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    #[default]
    Idle,
    SignalingConnecting,
    SignalingConnected,
    Negotiating,
    Connected,
    Disconnected,
    Failed,
    Closed,
}

impl ConnectionState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, ConnectionState::Closed)
    }

    /// States in which `start()` (re)opens the signaling channel.
    pub fn can_start(&self) -> bool {
        matches!(self, ConnectionState::Idle | ConnectionState::Disconnected)
    }

    pub fn accepts_offer(&self) -> bool {
        matches!(
            self,
            ConnectionState::SignalingConnected
                | ConnectionState::Negotiating
                | ConnectionState::Connected
                | ConnectionState::Failed
        )
    }

    /// An answer is only applied to an outstanding local offer; these are the
    /// states an offer can be outstanding in.
    pub fn accepts_answer(&self) -> bool {
        matches!(
            self,
            ConnectionState::SignalingConnected
                | ConnectionState::Negotiating
                | ConnectionState::Connected
        )
    }

    /// Remote candidates are routed to the negotiator while signaling is up
    /// and a negotiation may be pending or running.
    pub fn accepts_candidates(&self) -> bool {
        self.accepts_offer()
    }

    /// States from which an outgoing call may start a new negotiation.
    pub fn accepts_call(&self) -> bool {
        matches!(
            self,
            ConnectionState::SignalingConnected | ConnectionState::Connected | ConnectionState::Failed
        )
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ConnectionState::Idle => "idle",
            ConnectionState::SignalingConnecting => "signaling-connecting",
            ConnectionState::SignalingConnected => "signaling-connected",
            ConnectionState::Negotiating => "negotiating",
            ConnectionState::Connected => "connected",
            ConnectionState::Disconnected => "disconnected",
            ConnectionState::Failed => "failed",
            ConnectionState::Closed => "closed",
        };
        f.write_str(s)
    }
}
