mod heartbeat;
mod relay;
mod signaling_transport;
mod transport_config;
mod transport_event;
mod ws_relay;

pub use heartbeat::*;
pub use relay::*;
pub use signaling_transport::*;
pub use transport_config::*;
pub use transport_event::*;
pub use ws_relay::*;
