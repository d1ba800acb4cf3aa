//! Source agent port.
//!
//! A source agent fetches named data-point values from an external read
//! API (weather, pollen, air quality). The scheduler only ever talks to
//! this trait; concrete integrations are added by implementing it and
//! registering the instance, never by touching the scheduler.

use std::collections::HashMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::models::{AgentDescription, DataValue};

/// One fetch request handed to a source agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceAgentTask {
    /// Agent-specific addressing parameters (e.g. location).
    pub parameters: HashMap<String, String>,
    pub owner_id: Uuid,
    /// Owner settings the agent may need (API keys, ...).
    pub owner_settings: HashMap<String, String>,
    /// Data point keys to resolve. All or nothing: an agent must return a
    /// value for every key or fail the whole task.
    pub data_points: Vec<String>,
}

/// Outcome of a source fetch.
///
/// Agents normalize every failure mode (bad credentials, unknown data
/// point, upstream error, malformed payload) into `Failed`; an `Err` or
/// panic must never cross the agent boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum SourceTaskResult {
    Success { data: HashMap<String, DataValue> },
    Failed { error: String },
}

impl SourceTaskResult {
    pub fn success(data: HashMap<String, DataValue>) -> Self {
        Self::Success { data }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self::Failed { error: error.into() }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }
}

/// Plugin contract for read-side integrations.
#[async_trait]
pub trait SourceAgent: Send + Sync {
    /// Stable unique identifier.
    fn id(&self) -> &str;

    /// Static capability metadata, including the supported data points.
    fn describe(&self) -> AgentDescription;

    /// Fetch the requested data points. Idempotent per call.
    async fn execute_task(&self, task: SourceAgentTask) -> SourceTaskResult;
}
