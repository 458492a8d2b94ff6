mod candidate_buffer;
mod media_engine;
mod session_negotiator;
mod webrtc_engine;

pub use candidate_buffer::*;
pub use media_engine::*;
pub use session_negotiator::*;
pub use webrtc_engine::*;
