//! Static agent capability metadata.
//!
//! Every agent advertises what it can do through an [`AgentDescription`]:
//! the settings it reads from the owner, the parameters a rule must
//! supply, and either the data points it yields (source agents) or the
//! entity kinds it can steer (target agents). The rule service validates
//! rules against this metadata before they are stored.

use serde::{Deserialize, Serialize};

use super::value::ValueKind;

/// Whether an agent reads data or mutates entities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentKind {
    Source,
    Target,
}

impl AgentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Source => "source",
            Self::Target => "target",
        }
    }
}

/// An owner-level setting an agent consumes (e.g. an API key).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettingSpec {
    pub key: String,
    pub name: String,
    #[serde(default)]
    pub required: bool,
}

/// A per-rule parameter an agent needs (e.g. a location).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParameterSpec {
    pub key: String,
    pub name: String,
    #[serde(default)]
    pub required: bool,
}

/// A named, typed value a source agent can supply.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataPointSpec {
    pub key: String,
    pub name: String,
    pub kind: ValueKind,
    /// Enumerated values, for data points with a fixed domain
    /// (e.g. pollen risk levels).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub values: Vec<String>,
}

/// A selectable entity kind a target agent can steer, and the parameter
/// keys needed to address one entity of that kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetEntitySpec {
    pub kind: String,
    pub name: String,
    /// Parameter keys required to address an entity of this kind.
    pub parameter_keys: Vec<String>,
}

/// Static capability metadata for an agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentDescription {
    pub id: String,
    pub name: String,
    pub kind: AgentKind,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub settings: Vec<SettingSpec>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parameters: Vec<ParameterSpec>,
    /// Source agents only.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub data_points: Vec<DataPointSpec>,
    /// Target agents only.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub target_entities: Vec<TargetEntitySpec>,
}

impl AgentDescription {
    /// Look up a declared data point by key.
    pub fn data_point(&self, key: &str) -> Option<&DataPointSpec> {
        self.data_points.iter().find(|dp| dp.key == key)
    }

    /// Look up a declared target entity kind.
    pub fn target_entity(&self, kind: &str) -> Option<&TargetEntitySpec> {
        self.target_entities.iter().find(|te| te.kind == kind)
    }
}
