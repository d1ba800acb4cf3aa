//! Target agent port.
//!
//! A target agent mutates named entities in an external advertising
//! platform (activate/deactivate line items, campaigns, ad groups) and
//! can enumerate the entities a user may select as rule targets.

use std::collections::HashMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::models::{AgentDescription, TargetAction, User};

/// One entity mutation handed to a target agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetAgentTask {
    pub agent_id: String,
    /// Effective action after condition-based inversion.
    pub action: TargetAction,
    /// Entity addressing parameters (e.g. advertiser + line item IDs).
    pub parameters: HashMap<String, String>,
    pub owner_id: Uuid,
    pub owner_settings: HashMap<String, String>,
}

/// Outcome of a single entity mutation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperationResult {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl OperationResult {
    pub fn ok() -> Self {
        Self { success: true, error: None }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self { success: false, error: Some(error.into()) }
    }
}

/// A selectable entity returned by `list_target_entities`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetEntity {
    pub kind: String,
    pub name: String,
    /// Parameters that address this entity in a `RuleTarget`.
    pub parameters: HashMap<String, String>,
}

/// Outcome of an entity listing request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum EntityListResult {
    Success { entities: Vec<TargetEntity> },
    Failed { error: String },
}

impl EntityListResult {
    pub fn failed(error: impl Into<String>) -> Self {
        Self::Failed { error: error.into() }
    }
}

/// Plugin contract for write-side integrations.
#[async_trait]
pub trait TargetAgent: Send + Sync {
    /// Stable unique identifier.
    fn id(&self) -> &str;

    /// Static capability metadata, including selectable entity kinds.
    fn describe(&self) -> AgentDescription;

    /// Execute a batch of entity mutations.
    ///
    /// The returned vector is positionally aligned with `tasks`. Each
    /// mutation is attempted independently: one task's failure must not
    /// abort its siblings.
    async fn execute_tasks(&self, tasks: Vec<TargetAgentTask>) -> Vec<OperationResult>;

    /// Enumerate selectable entities of `kind`.
    ///
    /// Fails gracefully (never panics or errors) on unsupported kinds,
    /// missing required parameters, or upstream failures.
    async fn list_target_entities(
        &self,
        kind: &str,
        parameters: &HashMap<String, String>,
        requestor: &User,
    ) -> EntityListResult;
}
