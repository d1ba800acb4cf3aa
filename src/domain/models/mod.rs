//! Domain models.

pub mod agent;
pub mod config;
pub mod rule;
pub mod user;
pub mod value;

pub use agent::{
    AgentDescription, AgentKind, DataPointSpec, ParameterSpec, SettingSpec, TargetEntitySpec,
};
pub use config::{Config, DatabaseConfig, LoggingConfig, SchedulerConfig};
pub use rule::{
    Comparator, Rule, RuleCondition, RuleSource, RuleStatus, RuleTarget, TargetAction,
};
pub use user::User;
pub use value::{DataValue, ValueKind};
