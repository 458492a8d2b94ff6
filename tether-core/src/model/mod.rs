mod candidate;
mod description;
mod ice;
mod participant;
mod signaling;

pub use candidate::CandidateInit;
pub use description::{SdpType, SessionDescription};
pub use ice::IceServerConfig;
pub use participant::{Participant, ParticipantId, UserInfo};
pub use signaling::{JoinInfo, MessageKind, SignalPayload, SignalingMessage};
