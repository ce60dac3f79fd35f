//! The stage-sequencing state machine and its read-side companions

pub mod dashboard;
pub mod error;
pub mod reconciler;
pub mod screen;
pub mod sequencer;

pub use dashboard::*;
pub use error::*;
pub use reconciler::*;
pub use screen::*;
pub use sequencer::*;
