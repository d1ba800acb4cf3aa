//! Mock agents for tests and local smoke runs.
//!
//! `MockSourceAgent` serves configurable data-point values and
//! `MockTargetAgent` records the tasks it receives. Both honor the full
//! agent contracts (fail-fast fetches, positionally aligned results,
//! graceful listing failures), so scheduler tests exercise exactly the
//! paths real integrations would.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::adapters::agents::cache::UpstreamCache;
use crate::domain::models::{
    AgentDescription, AgentKind, DataPointSpec, DataValue, ParameterSpec, TargetEntitySpec, User,
    ValueKind,
};
use crate::domain::ports::{
    EntityListResult, OperationResult, SourceAgent, SourceAgentTask, SourceTaskResult,
    TargetAgent, TargetAgentTask, TargetEntity,
};

/// Configurable source agent test double.
pub struct MockSourceAgent {
    id: String,
    name: String,
    parameters: Vec<ParameterSpec>,
    data_points: Vec<DataPointSpec>,
    values: RwLock<HashMap<String, DataValue>>,
    failure: RwLock<Option<String>>,
    upstream_calls: AtomicUsize,
    cache: UpstreamCache,
}

impl MockSourceAgent {
    pub fn new(id: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            id,
            parameters: Vec::new(),
            data_points: Vec::new(),
            values: RwLock::new(HashMap::new()),
            failure: RwLock::new(None),
            upstream_calls: AtomicUsize::new(0),
            cache: UpstreamCache::new(),
        }
    }

    /// Weather-shaped preset: numeric `temperature` and textual
    /// `conditions`, addressed by a required `location` parameter.
    pub fn weather() -> Self {
        Self::new("mock-weather")
            .with_parameter("location", true)
            .with_data_point("temperature", ValueKind::Number, &[])
            .with_data_point("conditions", ValueKind::Text, &["Clear", "Rain", "Snow"])
    }

    /// Pollen-shaped preset: enumerated `pollenRiskLevel`.
    pub fn pollen() -> Self {
        Self::new("mock-pollen")
            .with_parameter("location", true)
            .with_data_point("pollenRiskLevel", ValueKind::Text, &["Low", "Medium", "High"])
    }

    pub fn with_parameter(mut self, key: impl Into<String>, required: bool) -> Self {
        let key = key.into();
        self.parameters.push(ParameterSpec { name: key.clone(), key, required });
        self
    }

    pub fn with_data_point(
        mut self,
        key: impl Into<String>,
        kind: ValueKind,
        values: &[&str],
    ) -> Self {
        let key = key.into();
        self.data_points.push(DataPointSpec {
            name: key.clone(),
            key,
            kind,
            values: values.iter().map(|v| (*v).to_string()).collect(),
        });
        self
    }

    /// Set the value served for a data point.
    pub async fn set_value(&self, key: impl Into<String>, value: impl Into<DataValue>) {
        self.values.write().await.insert(key.into(), value.into());
    }

    /// Make every subsequent task fail with `error`.
    pub async fn fail_with(&self, error: impl Into<String>) {
        *self.failure.write().await = Some(error.into());
    }

    /// Number of simulated upstream API calls so far. Two data points
    /// served from one task count once, thanks to the task-scoped cache.
    pub fn upstream_calls(&self) -> usize {
        self.upstream_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SourceAgent for MockSourceAgent {
    fn id(&self) -> &str {
        &self.id
    }

    fn describe(&self) -> AgentDescription {
        AgentDescription {
            id: self.id.clone(),
            name: self.name.clone(),
            kind: AgentKind::Source,
            settings: Vec::new(),
            parameters: self.parameters.clone(),
            data_points: self.data_points.clone(),
            target_entities: Vec::new(),
        }
    }

    async fn execute_task(&self, task: SourceAgentTask) -> SourceTaskResult {
        self.cache.begin_task();

        if let Some(error) = self.failure.read().await.clone() {
            return SourceTaskResult::failed(error);
        }

        for parameter in self.parameters.iter().filter(|p| p.required) {
            if !task.parameters.contains_key(&parameter.key) {
                return SourceTaskResult::failed(format!(
                    "Missing required parameter '{}'",
                    parameter.key
                ));
            }
        }

        // Fail fast on any undeclared data point; no partial results.
        for key in &task.data_points {
            if !self.data_points.iter().any(|dp| &dp.key == key) {
                return SourceTaskResult::failed(format!(
                    "Agent '{}' does not supply data point '{key}'",
                    self.id
                ));
            }
        }

        // All data points come from one simulated upstream response per
        // parameter set; the task-scoped cache collapses repeat fetches.
        let mut request: Vec<_> = task.parameters.iter().collect();
        request.sort();
        let request_key = format!("{}?{request:?}", self.id);
        if self.cache.get(&request_key).await.is_none() {
            self.upstream_calls.fetch_add(1, Ordering::SeqCst);
            self.cache
                .insert(request_key, serde_json::json!({"fetched": true}))
                .await;
        }

        let values = self.values.read().await;
        let mut data = HashMap::new();
        for key in &task.data_points {
            match values.get(key) {
                Some(value) => {
                    data.insert(key.clone(), value.clone());
                }
                None => {
                    return SourceTaskResult::failed(format!(
                        "No value available for data point '{key}'"
                    ));
                }
            }
        }

        SourceTaskResult::success(data)
    }
}

/// Recording target agent test double.
pub struct MockTargetAgent {
    id: String,
    name: String,
    target_entities: Vec<TargetEntitySpec>,
    /// Parameter keys required for entity listing requests.
    list_parameters: Vec<String>,
    listable: RwLock<Vec<TargetEntity>>,
    recorded: RwLock<Vec<TargetAgentTask>>,
    failure: RwLock<Option<String>>,
}

impl MockTargetAgent {
    pub fn new(id: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            id,
            target_entities: Vec::new(),
            list_parameters: Vec::new(),
            listable: RwLock::new(Vec::new()),
            recorded: RwLock::new(Vec::new()),
            failure: RwLock::new(None),
        }
    }

    /// Ad-platform-shaped preset: steerable `lineItem` entities
    /// addressed by advertiser + line item IDs.
    pub fn ads() -> Self {
        let mut agent = Self::new("mock-ads");
        agent.target_entities.push(TargetEntitySpec {
            kind: "lineItem".to_string(),
            name: "Line Item".to_string(),
            parameter_keys: vec!["advertiserId".to_string(), "lineItemId".to_string()],
        });
        agent.list_parameters.push("advertiserId".to_string());
        agent
    }

    /// Make every subsequent task fail with `error`.
    pub async fn fail_with(&self, error: impl Into<String>) {
        *self.failure.write().await = Some(error.into());
    }

    /// Add an entity returned by `list_target_entities`.
    pub async fn add_listable_entity(&self, entity: TargetEntity) {
        self.listable.write().await.push(entity);
    }

    /// Snapshot of every task received so far, in arrival order.
    pub async fn recorded_tasks(&self) -> Vec<TargetAgentTask> {
        self.recorded.read().await.clone()
    }
}

#[async_trait]
impl TargetAgent for MockTargetAgent {
    fn id(&self) -> &str {
        &self.id
    }

    fn describe(&self) -> AgentDescription {
        AgentDescription {
            id: self.id.clone(),
            name: self.name.clone(),
            kind: AgentKind::Target,
            settings: Vec::new(),
            parameters: Vec::new(),
            data_points: Vec::new(),
            target_entities: self.target_entities.clone(),
        }
    }

    async fn execute_tasks(&self, tasks: Vec<TargetAgentTask>) -> Vec<OperationResult> {
        let failure = self.failure.read().await.clone();
        let mut results = Vec::with_capacity(tasks.len());
        let mut recorded = self.recorded.write().await;

        for task in tasks {
            recorded.push(task);
            match &failure {
                Some(error) => results.push(OperationResult::failed(error.clone())),
                None => results.push(OperationResult::ok()),
            }
        }

        results
    }

    async fn list_target_entities(
        &self,
        kind: &str,
        parameters: &HashMap<String, String>,
        _requestor: &User,
    ) -> EntityListResult {
        if !self.target_entities.iter().any(|te| te.kind == kind) {
            return EntityListResult::failed(format!(
                "Agent '{}' does not support target entity type '{kind}'",
                self.id
            ));
        }
        for key in &self.list_parameters {
            if !parameters.contains_key(key) {
                return EntityListResult::failed(format!("Missing required parameter '{key}'"));
            }
        }

        let entities = self
            .listable
            .read()
            .await
            .iter()
            .filter(|e| e.kind == kind)
            .cloned()
            .collect();
        EntityListResult::Success { entities }
    }
}
