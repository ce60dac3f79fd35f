pub mod abbrev;
pub mod commands;
pub mod error;
pub mod output;
pub mod parser;

pub use commands::*;
pub use parser::*;
pub use output::*;
pub use error::*;
