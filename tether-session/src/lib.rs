mod error;
mod negotiation;
mod roster;
mod session;
mod transport;

pub use error::*;
pub use negotiation::*;
pub use roster::*;
pub use session::*;
pub use transport::*;
