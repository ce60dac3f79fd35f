pub mod requirement;
pub mod session;
pub mod snapshot;

pub use requirement::*;
pub use session::*;
pub use snapshot::*;
