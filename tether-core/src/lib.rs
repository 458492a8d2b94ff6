mod error;
pub mod model;

pub use error::WireError;
pub use model::*;
