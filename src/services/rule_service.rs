//! Rule management service.
//!
//! Validated CRUD over the rule collection. Rules are checked against the
//! live agent registry before they are stored, so configuration errors
//! (unknown agent, unsupported data point, type-incompatible comparator,
//! missing required parameters) are caught at write time instead of
//! surfacing as failures on every tick.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{AgentDescription, Comparator, Rule, RuleTarget, ValueKind};
use crate::domain::ports::{Collection, EntityListResult};
use crate::services::registry::AgentRegistry;

/// Service for managing rule definitions.
pub struct RuleService {
    rules: Arc<dyn Collection<Rule>>,
    users: Arc<dyn Collection<crate::domain::models::User>>,
    registry: Arc<AgentRegistry>,
}

impl RuleService {
    pub fn new(
        rules: Arc<dyn Collection<Rule>>,
        users: Arc<dyn Collection<crate::domain::models::User>>,
        registry: Arc<AgentRegistry>,
    ) -> Self {
        Self { rules, users, registry }
    }

    /// Validate and store a new rule. Returns the stored rule with its
    /// store-assigned id.
    pub async fn create(&self, rule: Rule) -> DomainResult<Rule> {
        self.validate(&rule)?;
        let stored = self.rules.insert(rule).await?;
        tracing::info!(rule_id = %stored.id, rule_name = %stored.name, "Rule created");
        Ok(stored)
    }

    /// Get a rule by id.
    pub async fn get(&self, id: Uuid) -> DomainResult<Rule> {
        self.rules
            .get(id)
            .await?
            .ok_or(DomainError::RuleNotFound(id))
    }

    /// List all rules.
    pub async fn list(&self) -> DomainResult<Vec<Rule>> {
        self.rules.list().await
    }

    /// List the rules belonging to one owner.
    pub async fn list_for_owner(&self, owner_id: Uuid) -> DomainResult<Vec<Rule>> {
        self.rules
            .find_where("owner_id", &serde_json::json!(owner_id))
            .await
    }

    /// Update a rule in place: same id, new field values.
    ///
    /// `created_at` and `latest_status` are carried over from the stored
    /// rule; a user edit must not erase execution history.
    pub async fn update(&self, id: Uuid, mut rule: Rule) -> DomainResult<Rule> {
        let existing = self.get(id).await?;
        self.validate(&rule)?;

        rule.created_at = existing.created_at;
        rule.latest_status = existing.latest_status;
        rule.updated_at = Utc::now();

        let stored = self.rules.update(id, rule).await?;
        tracing::info!(rule_id = %id, rule_name = %stored.name, "Rule updated");
        Ok(stored)
    }

    /// Delete a rule by id.
    pub async fn delete(&self, id: Uuid) -> DomainResult<()> {
        self.rules.delete(id).await?;
        tracing::info!(rule_id = %id, "Rule deleted");
        Ok(())
    }

    /// Enumerate selectable entities of a target agent, on behalf of a
    /// user. Pass-through to the agent; unknown agents fail gracefully.
    pub async fn list_target_entities(
        &self,
        agent_id: &str,
        kind: &str,
        parameters: &HashMap<String, String>,
        requestor_id: Uuid,
    ) -> DomainResult<EntityListResult> {
        let requestor = self
            .users
            .get(requestor_id)
            .await?
            .ok_or(DomainError::UserNotFound(requestor_id))?;

        let Some(agent) = self.registry.target(agent_id) else {
            return Ok(EntityListResult::failed(format!(
                "Unknown target agent '{agent_id}'"
            )));
        };

        Ok(agent.list_target_entities(kind, parameters, &requestor).await)
    }

    /// Check a rule definition against the registry's capability metadata.
    fn validate(&self, rule: &Rule) -> DomainResult<()> {
        if rule.execution_interval_minutes == 0 {
            return Err(DomainError::ValidationFailed(
                "Execution interval must be greater than zero".to_string(),
            ));
        }
        if rule.targets.is_empty() {
            return Err(DomainError::ValidationFailed(
                "Rule must have at least one target".to_string(),
            ));
        }

        let Some(source) = self.registry.source(&rule.source.agent_id) else {
            return Err(DomainError::ValidationFailed(format!(
                "Unknown source agent '{}'",
                rule.source.agent_id
            )));
        };
        let description = source.describe();

        Self::validate_condition(rule, &description)?;
        Self::validate_source_parameters(rule, &description)?;

        for target in &rule.targets {
            self.validate_target(target)?;
        }

        Ok(())
    }

    fn validate_condition(rule: &Rule, description: &AgentDescription) -> DomainResult<()> {
        let Some(data_point) = description.data_point(&rule.condition.data_point) else {
            return Err(DomainError::ValidationFailed(format!(
                "Source agent '{}' does not supply data point '{}'",
                rule.source.agent_id, rule.condition.data_point
            )));
        };

        let compare_kind = rule.condition.compare_value.kind();
        if compare_kind != data_point.kind {
            return Err(DomainError::ValidationFailed(format!(
                "Data point '{}' yields {} values but the compare value is {}",
                data_point.key,
                data_point.kind.as_str(),
                compare_kind.as_str()
            )));
        }

        let comparator = rule.condition.comparator;
        let supported = match compare_kind {
            ValueKind::Number => true,
            ValueKind::Text | ValueKind::Bool => comparator == Comparator::Eq,
        };
        if !supported {
            return Err(DomainError::ValidationFailed(format!(
                "Comparator '{}' is not supported for {} values",
                comparator.as_str(),
                compare_kind.as_str()
            )));
        }

        Ok(())
    }

    fn validate_source_parameters(
        rule: &Rule,
        description: &AgentDescription,
    ) -> DomainResult<()> {
        for parameter in description.parameters.iter().filter(|p| p.required) {
            if !rule.source.parameters.contains_key(&parameter.key) {
                return Err(DomainError::ValidationFailed(format!(
                    "Source agent '{}' requires parameter '{}'",
                    rule.source.agent_id, parameter.key
                )));
            }
        }
        Ok(())
    }

    fn validate_target(&self, target: &RuleTarget) -> DomainResult<()> {
        let Some(agent) = self.registry.target(&target.agent_id) else {
            return Err(DomainError::ValidationFailed(format!(
                "Unknown target agent '{}'",
                target.agent_id
            )));
        };

        // The target parameters must fully address one of the entity
        // kinds the agent declares.
        let description = agent.describe();
        if description.target_entities.is_empty() {
            return Ok(());
        }
        let addressable = description.target_entities.iter().any(|entity| {
            entity
                .parameter_keys
                .iter()
                .all(|key| target.parameters.contains_key(key))
        });
        if !addressable {
            return Err(DomainError::ValidationFailed(format!(
                "Target parameters do not address any entity kind of agent '{}'",
                target.agent_id
            )));
        }

        Ok(())
    }
}
