//! Port trait definitions (hexagonal architecture).
//!
//! Async trait interfaces the adapters implement:
//! - `Collection<T>`: generic document persistence
//! - `SourceAgent`: read-side platform plugin
//! - `TargetAgent`: write-side platform plugin
//!
//! These contracts keep the scheduling core independent of concrete
//! stores and platform integrations.

pub mod collection;
pub mod source_agent;
pub mod target_agent;

pub use collection::{Collection, Entity};
pub use source_agent::{SourceAgent, SourceAgentTask, SourceTaskResult};
pub use target_agent::{
    EntityListResult, OperationResult, TargetAgent, TargetAgentTask, TargetEntity,
};
