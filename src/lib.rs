//! Weathervane - environmental rule scheduler
//!
//! Weathervane evaluates user-defined rules against environmental data
//! (weather, pollen, and other polled signals) and toggles entities on
//! advertising platforms when rule conditions flip. Data sources and
//! target platforms plug in through agent traits.
//!
//! # Architecture
//!
//! This crate follows Hexagonal Architecture principles:
//!
//! - **Domain Layer** (`domain`): Models and port traits
//! - **Service Layer** (`services`): Rule management, condition evaluation,
//!   and the scheduling core
//! - **Adapters** (`adapters`): Store backends and agent implementations
//! - **Infrastructure Layer** (`infrastructure`): Config, logging, wiring
//! - **CLI Layer** (`cli`): Command-line interface
//!
//! # Example
//!
//! ```ignore
//! use weathervane::infrastructure::{build_runtime, ConfigLoader};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = ConfigLoader::load()?;
//!     let runtime = build_runtime(&config).await?;
//!     runtime.scheduler.run_tick().await;
//!     Ok(())
//! }
//! ```

pub mod adapters;
pub mod cli;
pub mod domain;
pub mod infrastructure;
pub mod services;

// Re-export commonly used types for convenience
pub use domain::models::{
    Comparator, Config, DataValue, Rule, RuleCondition, RuleSource, RuleStatus, RuleTarget,
    TargetAction, User, ValueKind,
};
pub use domain::ports::{Collection, SourceAgent, TargetAgent};
pub use services::{AgentRegistry, RuleScheduler, RuleService, TickSummary};
