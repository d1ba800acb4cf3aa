//! Task-scoped upstream response cache for agent implementors.
//!
//! Agents often resolve several data points from one upstream API
//! response. An `UpstreamCache` lets an agent reuse that response within
//! a single `execute_task` call instead of re-fetching it. The cache is
//! bounded and is cleared at the start of every task (`begin_task`), so
//! it never serves stale data across tasks and cannot grow without limit
//! in a long-lived process.

use std::sync::Arc;

use moka::future::Cache;

/// Default number of cached upstream responses per agent.
const DEFAULT_MAX_CAPACITY: u64 = 16;

/// Bounded, task-scoped cache of upstream responses, keyed by request
/// identity (URL plus parameters).
pub struct UpstreamCache {
    inner: Cache<String, Arc<serde_json::Value>>,
}

impl UpstreamCache {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_MAX_CAPACITY)
    }

    pub fn with_capacity(max_capacity: u64) -> Self {
        Self { inner: Cache::builder().max_capacity(max_capacity).build() }
    }

    /// Clear the cache. Agents call this at the start of every
    /// `execute_task`.
    pub fn begin_task(&self) {
        self.inner.invalidate_all();
    }

    /// Look up a cached upstream response.
    pub async fn get(&self, key: &str) -> Option<Arc<serde_json::Value>> {
        self.inner.get(key).await
    }

    /// Cache an upstream response.
    pub async fn insert(&self, key: impl Into<String>, value: serde_json::Value) {
        self.inner.insert(key.into(), Arc::new(value)).await;
    }
}

impl Default for UpstreamCache {
    fn default() -> Self {
        Self::new()
    }
}
