//! Service layer: condition evaluation, agent dispatch, rule management
//! and the scheduling core.

pub mod conditions;
pub mod registry;
pub mod rule_service;
pub mod scheduler;

pub use registry::AgentRegistry;
pub use rule_service::RuleService;
pub use scheduler::{RuleScheduler, TickSummary};
