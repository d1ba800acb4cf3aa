//! CLI command implementations.

pub mod agent;
pub mod rule;
pub mod run;
pub mod user;
