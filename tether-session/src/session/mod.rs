mod connection_state;
mod session_command;
mod session_config;
mod session_context;
mod session_controller;
mod session_handle;
mod session_observer;

pub use connection_state::*;
pub use session_command::*;
pub use session_config::*;
pub use session_controller::*;
pub use session_handle::*;
pub use session_observer::*;
