//! Rule domain model.
//!
//! A `Rule` binds one source condition to one or more target actions,
//! executed on a fixed interval. Targets describe the state to enter when
//! the condition evaluates true; the scheduler enforces the inverse state
//! when it evaluates false.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::value::DataValue;

/// Comparator applied between a fetched data-point value and the rule's
/// compare value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Comparator {
    /// Strict equality.
    Eq,
    /// Numeric greater-than.
    Gt,
    /// Numeric less-than.
    Lt,
}

impl Comparator {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Eq => "eq",
            Self::Gt => "gt",
            Self::Lt => "lt",
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "eq" => Some(Self::Eq),
            "gt" => Some(Self::Gt),
            "lt" => Some(Self::Lt),
            _ => None,
        }
    }
}

/// Desired target state when a rule's condition evaluates true.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TargetAction {
    Activate,
    Deactivate,
}

impl TargetAction {
    /// The opposite action, enforced when the condition evaluates false.
    pub fn inverse(&self) -> Self {
        match self {
            Self::Activate => Self::Deactivate,
            Self::Deactivate => Self::Activate,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Activate => "ACTIVATE",
            Self::Deactivate => "DEACTIVATE",
        }
    }
}

/// Where a rule fetches its data from: a source agent plus the parameters
/// that agent needs (location, list ID, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleSource {
    pub agent_id: String,
    #[serde(default)]
    pub parameters: HashMap<String, String>,
}

/// The single condition a rule evaluates against fetched data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleCondition {
    /// Data point key the source agent must supply.
    pub data_point: String,
    pub comparator: Comparator,
    pub compare_value: DataValue,
}

/// One target-platform entity a rule steers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleTarget {
    pub agent_id: String,
    /// Addressing parameters for the entity (e.g. advertiser + line item IDs).
    #[serde(default)]
    pub parameters: HashMap<String, String>,
    /// Target state when the condition evaluates true.
    pub action: TargetAction,
}

/// Outcome of a rule's most recent execution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleStatus {
    pub success: bool,
    pub last_execution: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl RuleStatus {
    pub fn success(at: DateTime<Utc>) -> Self {
        Self { success: true, last_execution: at, error: None }
    }

    pub fn failure(at: DateTime<Utc>, error: impl Into<String>) -> Self {
        Self { success: false, last_execution: at, error: Some(error.into()) }
    }
}

/// A user-defined automation rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub name: String,
    /// Minutes between executions. Must be greater than zero.
    pub execution_interval_minutes: u32,
    pub source: RuleSource,
    pub condition: RuleCondition,
    pub targets: Vec<RuleTarget>,
    /// Outcome of the last execution; absent until the rule first runs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latest_status: Option<RuleStatus>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Rule {
    /// Create a new rule. The id is a placeholder until the store assigns one.
    pub fn new(
        owner_id: Uuid,
        name: impl Into<String>,
        execution_interval_minutes: u32,
        source: RuleSource,
        condition: RuleCondition,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            owner_id,
            name: name.into(),
            execution_interval_minutes,
            source,
            condition,
            targets: Vec::new(),
            latest_status: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_target(mut self, target: RuleTarget) -> Self {
        self.targets.push(target);
        self
    }

    /// Last execution time, if the rule has ever run.
    pub fn last_execution(&self) -> Option<DateTime<Utc>> {
        self.latest_status.as_ref().map(|s| s.last_execution)
    }
}
