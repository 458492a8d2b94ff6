use crate::error::WireError;
use crate::model::candidate::CandidateInit;
use crate::model::description::SessionDescription;
use crate::model::participant::{ParticipantId, UserInfo};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Message `type` values this endpoint understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    Offer,
    Answer,
    Candidate,
    Join,
    Leave,
    Heartbeat,
    HeartbeatAck,
}

impl MessageKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageKind::Offer => "offer",
            MessageKind::Answer => "answer",
            MessageKind::Candidate => "candidate",
            MessageKind::Join => "join",
            MessageKind::Leave => "leave",
            MessageKind::Heartbeat => "heartbeat",
            MessageKind::HeartbeatAck => "heartbeat-ack",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "offer" => Some(MessageKind::Offer),
            "answer" => Some(MessageKind::Answer),
            "candidate" | "ice-candidate" => Some(MessageKind::Candidate),
            "join" => Some(MessageKind::Join),
            "leave" => Some(MessageKind::Leave),
            "heartbeat" => Some(MessageKind::Heartbeat),
            "heartbeat-ack" => Some(MessageKind::HeartbeatAck),
            _ => None,
        }
    }
}

/// `data` of `join` messages.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct JoinInfo {
    #[serde(default)]
    pub room: String,
    #[serde(default)]
    pub user_info: UserInfo,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SignalPayload {
    Offer(SessionDescription),
    Answer(SessionDescription),
    Candidate(CandidateInit),
    Join(JoinInfo),
    Leave,
    Heartbeat,
    HeartbeatAck,
    /// A `type` relayed by the server that this endpoint does not understand.
    Unknown { kind: String, data: Value },
}

/// One relay frame: `{ type, from, to?, data }`.
#[derive(Debug, Clone, PartialEq)]
pub struct SignalingMessage {
    pub from: ParticipantId,
    pub to: Option<ParticipantId>,
    pub payload: SignalPayload,
}

#[derive(Serialize, Deserialize)]
struct Envelope {
    #[serde(rename = "type")]
    kind: String,
    from: ParticipantId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    to: Option<ParticipantId>,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    data: Value,
}

impl SignalingMessage {
    pub fn new(from: ParticipantId, payload: SignalPayload) -> Self {
        Self {
            from,
            to: None,
            payload,
        }
    }

    pub fn with_to(mut self, to: Option<ParticipantId>) -> Self {
        self.to = to;
        self
    }

    pub fn offer(from: ParticipantId, sdp: impl Into<String>) -> Self {
        Self::new(from, SignalPayload::Offer(SessionDescription::new(sdp)))
    }

    pub fn answer(from: ParticipantId, sdp: impl Into<String>) -> Self {
        Self::new(from, SignalPayload::Answer(SessionDescription::new(sdp)))
    }

    pub fn candidate(from: ParticipantId, candidate: CandidateInit) -> Self {
        Self::new(from, SignalPayload::Candidate(candidate))
    }

    pub fn join(from: ParticipantId, room: impl Into<String>, name: Option<String>) -> Self {
        let info = JoinInfo {
            room: room.into(),
            user_info: UserInfo {
                name,
                user_id: None,
            },
        };
        Self::new(from, SignalPayload::Join(info))
    }

    pub fn leave(from: ParticipantId) -> Self {
        Self::new(from, SignalPayload::Leave)
    }

    pub fn heartbeat(from: ParticipantId) -> Self {
        Self::new(from, SignalPayload::Heartbeat)
    }

    pub fn kind(&self) -> Option<MessageKind> {
        match &self.payload {
            SignalPayload::Offer(_) => Some(MessageKind::Offer),
            SignalPayload::Answer(_) => Some(MessageKind::Answer),
            SignalPayload::Candidate(_) => Some(MessageKind::Candidate),
            SignalPayload::Join(_) => Some(MessageKind::Join),
            SignalPayload::Leave => Some(MessageKind::Leave),
            SignalPayload::Heartbeat => Some(MessageKind::Heartbeat),
            SignalPayload::HeartbeatAck => Some(MessageKind::HeartbeatAck),
            SignalPayload::Unknown { .. } => None,
        }
    }

    /// The wire `type` string.
    pub fn kind_name(&self) -> &str {
        match &self.payload {
            SignalPayload::Unknown { kind, .. } => kind.as_str(),
            _ => self.kind().map(|k| k.as_str()).unwrap_or_default(),
        }
    }

    pub fn to_json(&self) -> Result<String, WireError> {
        let data = match &self.payload {
            SignalPayload::Offer(desc) | SignalPayload::Answer(desc) => serde_json::to_value(desc)?,
            SignalPayload::Candidate(candidate) => serde_json::to_value(candidate)?,
            SignalPayload::Join(info) => serde_json::to_value(info)?,
            SignalPayload::Unknown { data, .. } => data.clone(),
            SignalPayload::Leave | SignalPayload::Heartbeat | SignalPayload::HeartbeatAck => {
                Value::Null
            }
        };

        let envelope = Envelope {
            kind: self.kind_name().to_owned(),
            from: self.from.clone(),
            to: self.to.clone(),
            data,
        };
        Ok(serde_json::to_string(&envelope)?)
    }

    pub fn from_json(text: &str) -> Result<Self, WireError> {
        let envelope: Envelope = serde_json::from_str(text)?;

        let payload = match MessageKind::parse(&envelope.kind) {
            Some(MessageKind::Offer) => {
                SignalPayload::Offer(decode_data::<SessionDescription>(&envelope)?.unescaped())
            }
            Some(MessageKind::Answer) => {
                SignalPayload::Answer(decode_data::<SessionDescription>(&envelope)?.unescaped())
            }
            Some(MessageKind::Candidate) => SignalPayload::Candidate(decode_data(&envelope)?),
            Some(MessageKind::Join) => SignalPayload::Join(if envelope.data.is_null() {
                JoinInfo::default()
            } else {
                decode_data(&envelope)?
            }),
            Some(MessageKind::Leave) => SignalPayload::Leave,
            Some(MessageKind::Heartbeat) => SignalPayload::Heartbeat,
            Some(MessageKind::HeartbeatAck) => SignalPayload::HeartbeatAck,
            None => SignalPayload::Unknown {
                kind: envelope.kind.clone(),
                data: envelope.data.clone(),
            },
        };

        Ok(Self {
            from: envelope.from,
            to: envelope.to,
            payload,
        })
    }
}

fn decode_data<T: DeserializeOwned>(envelope: &Envelope) -> Result<T, WireError> {
    T::deserialize(&envelope.data).map_err(|source| WireError::Payload {
        kind: envelope.kind.clone(),
        source,
    })
}
