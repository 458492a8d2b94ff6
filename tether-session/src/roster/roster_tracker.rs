use crate::error::SessionError;
use tether_core::{Participant, ParticipantId, SignalPayload, SignalingMessage};

/// Known participants of the session, in insertion order.
#[derive(Debug, Default)]
pub struct RosterTracker {
    self_id: Option<ParticipantId>,
    participants: Vec<Participant>,
}

impl RosterTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the local participant. Allowed once until [`clear`](Self::clear).
    pub fn add_self(&mut self, id: ParticipantId, display_name: Option<String>) -> Result<(), SessionError> {
        if let Some(existing) = &self.self_id {
            return Err(SessionError::invalid_state(format!(
                "local participant {existing} is already registered"
            )));
        }

        self.participants.retain(|p| p.id != id);
        self.participants.insert(0, Participant::new(id.clone(), display_name));
        self.self_id = Some(id);
        Ok(())
    }

    /// Returns `true` only when the participant was not yet known.
    pub fn handle_join(&mut self, msg: &SignalingMessage) -> bool {
        let (id, name) = match &msg.payload {
            SignalPayload::Join(info) => (
                info.user_info.user_id.clone().unwrap_or_else(|| msg.from.clone()),
                info.user_info.name.clone(),
            ),
            _ => (msg.from.clone(), None),
        };

        if self.contains(&id) {
            return false;
        }
        self.participants.push(Participant::new(id, name));
        true
    }

    /// Returns `true` when a participant was removed. A leave for the local
    /// id is ignored.
    pub fn handle_leave(&mut self, msg: &SignalingMessage) -> bool {
        if self.self_id.as_ref() == Some(&msg.from) {
            return false;
        }

        let before = self.participants.len();
        self.participants.retain(|p| p.id != msg.from);
        self.participants.len() != before
    }

    pub fn snapshot(&self) -> Vec<Participant> {
        self.participants.clone()
    }

    pub fn contains(&self, id: &ParticipantId) -> bool {
        self.participants.iter().any(|p| &p.id == id)
    }

    pub fn self_id(&self) -> Option<&ParticipantId> {
        self.self_id.as_ref()
    }

    pub fn len(&self) -> usize {
        self.participants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.participants.is_empty()
    }

    /// Session teardown; the only way the local participant leaves.
    pub fn clear(&mut self) {
        self.self_id = None;
        self.participants.clear();
    }
}
