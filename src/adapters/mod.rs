//! Infrastructure adapters implementing the domain ports.

pub mod agents;
pub mod memory;
pub mod sqlite;
