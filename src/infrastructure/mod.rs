//! Infrastructure concerns: configuration, logging, and runtime wiring.

pub mod config;
pub mod logging;
pub mod setup;

pub use config::{ConfigError, ConfigLoader};
pub use logging::{init_logging, LogGuard};
pub use setup::{build_runtime, Runtime};
