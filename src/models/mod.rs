// Core data models for procflow
// These structs represent the domain entities

pub mod stage;
pub mod requirement;
pub mod snapshot;
pub mod workflow;

pub use stage::*;
pub use requirement::*;
pub use snapshot::*;
pub use workflow::*;
