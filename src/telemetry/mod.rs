pub mod types;
pub mod parser;

pub use types::*;
pub use parser::{try_parse, TelemetryError};
