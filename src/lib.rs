pub mod serial;
pub mod telemetry;
pub mod dialog;
pub mod session;
pub mod aggregate;
pub mod config;

pub use aggregate::{Aggregator, Summary};
pub use config::MonitorConfig;
pub use session::{SessionBuilder, SessionHandle};
pub use telemetry::{PowerState, Reading, TimedReading};
