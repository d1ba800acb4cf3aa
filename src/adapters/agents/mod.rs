//! Agent-side adapters: test doubles and shared utilities for agent
//! implementors.

pub mod cache;
pub mod mock;

pub use cache::UpstreamCache;
pub use mock::{MockSourceAgent, MockTargetAgent};
