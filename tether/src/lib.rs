pub use tether_core::model::ParticipantId;

pub mod model {
    pub use tether_core::model::*;
}

#[cfg(feature = "session")]
pub mod session {
    pub use tether_session::*;
}
