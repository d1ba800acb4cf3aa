//! Agent registry.
//!
//! Maps agent id strings to singleton agent instances. Source and target
//! agents live in separate namespaces, so a source agent and a target
//! agent may share the same id without collision. Lookups of unknown ids
//! return `None`; callers surface that as a task failure.

use std::collections::HashMap;
use std::sync::Arc;

use crate::domain::models::AgentDescription;
use crate::domain::ports::{SourceAgent, TargetAgent};

/// Registry of available source and target agents.
///
/// Populated once at process-start wiring; immutable afterwards.
#[derive(Default)]
pub struct AgentRegistry {
    sources: HashMap<String, Arc<dyn SourceAgent>>,
    targets: HashMap<String, Arc<dyn TargetAgent>>,
}

impl AgentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a source agent under its own id. Replaces any previous
    /// registration with the same id.
    pub fn register_source(&mut self, agent: Arc<dyn SourceAgent>) {
        self.sources.insert(agent.id().to_string(), agent);
    }

    /// Register a target agent under its own id.
    pub fn register_target(&mut self, agent: Arc<dyn TargetAgent>) {
        self.targets.insert(agent.id().to_string(), agent);
    }

    /// Look up a source agent. `None` for unknown ids, never an error.
    pub fn source(&self, id: &str) -> Option<Arc<dyn SourceAgent>> {
        self.sources.get(id).cloned()
    }

    /// Look up a target agent.
    pub fn target(&self, id: &str) -> Option<Arc<dyn TargetAgent>> {
        self.targets.get(id).cloned()
    }

    /// Capability metadata for every registered agent, sources first.
    pub fn describe_all(&self) -> Vec<AgentDescription> {
        let mut descriptions: Vec<AgentDescription> =
            self.sources.values().map(|a| a.describe()).collect();
        descriptions.extend(self.targets.values().map(|a| a.describe()));
        descriptions.sort_by(|a, b| (a.kind.as_str(), &a.id).cmp(&(b.kind.as_str(), &b.id)));
        descriptions
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::agents::{MockSourceAgent, MockTargetAgent};

    #[test]
    fn test_unknown_id_is_none() {
        let registry = AgentRegistry::new();
        assert!(registry.source("open-weather").is_none());
        assert!(registry.target("dv360").is_none());
    }

    #[test]
    fn test_namespaces_are_separate() {
        let mut registry = AgentRegistry::new();
        registry.register_source(Arc::new(MockSourceAgent::new("acme")));
        registry.register_target(Arc::new(MockTargetAgent::new("acme")));

        // The shared id resolves independently per namespace.
        assert!(registry.source("acme").is_some());
        assert!(registry.target("acme").is_some());
        assert!(registry.source("other").is_none());
    }

    #[test]
    fn test_describe_all_lists_both_kinds() {
        let mut registry = AgentRegistry::new();
        registry.register_source(Arc::new(MockSourceAgent::new("weather")));
        registry.register_target(Arc::new(MockTargetAgent::new("ads")));

        let descriptions = registry.describe_all();
        assert_eq!(descriptions.len(), 2);
    }
}
