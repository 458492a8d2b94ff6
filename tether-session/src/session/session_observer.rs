use crate::negotiation::RemoteTrack;
use crate::session::connection_state::ConnectionState;
use tether_core::Participant;
use tokio::sync::mpsc;

/// Push-style notifications for the embedding application.
///
/// Called from the session loop; implementations must not block.
pub trait SessionObserver: Send + Sync {
    fn on_status(&self, _status: &str) {}

    fn on_state_changed(&self, _state: ConnectionState) {}

    fn on_participants_changed(&self, _participants: &[Participant]) {}

    fn on_track(&self, _track: &RemoteTrack) {}

    /// Whether remote media should be shown.
    fn on_media_visibility(&self, _visible: bool) {}

    fn on_failed(&self, _reason: &str) {}

    fn on_closed(&self) {}
}

/// Observer notifications as values, for consumers that prefer a stream.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionNotification {
    Status(String),
    StateChanged(ConnectionState),
    ParticipantsChanged(Vec<Participant>),
    Track(RemoteTrack),
    MediaVisibility(bool),
    Failed(String),
    Closed,
}

impl SessionObserver for mpsc::UnboundedSender<SessionNotification> {
    fn on_status(&self, status: &str) {
        let _ = self.send(SessionNotification::Status(status.to_owned()));
    }

    fn on_state_changed(&self, state: ConnectionState) {
        let _ = self.send(SessionNotification::StateChanged(state));
    }

    fn on_participants_changed(&self, participants: &[Participant]) {
        let _ = self.send(SessionNotification::ParticipantsChanged(participants.to_vec()));
    }

    fn on_track(&self, track: &RemoteTrack) {
        let _ = self.send(SessionNotification::Track(track.clone()));
    }

    fn on_media_visibility(&self, visible: bool) {
        let _ = self.send(SessionNotification::MediaVisibility(visible));
    }

    fn on_failed(&self, reason: &str) {
        let _ = self.send(SessionNotification::Failed(reason.to_owned()));
    }

    fn on_closed(&self) {
        let _ = self.send(SessionNotification::Closed);
    }
}
