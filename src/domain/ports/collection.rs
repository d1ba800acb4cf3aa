//! Generic persistence port.
//!
//! The rule engine does not care where rules and users live. Anything
//! that can store, look up and query documents by a top-level field can
//! back it: the in-memory adapter for tests, the SQLite adapter for real
//! deployments, or an external document store behind the same trait.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use uuid::Uuid;

use crate::domain::errors::DomainResult;
use crate::domain::models::{Rule, User};

/// A persistable document with a store-assigned identity.
pub trait Entity: Clone + Send + Sync + Serialize + DeserializeOwned {
    /// Entity kind, used for error messages and table/collection naming.
    const KIND: &'static str;

    fn id(&self) -> Uuid;
    fn set_id(&mut self, id: Uuid);
}

impl Entity for Rule {
    const KIND: &'static str = "rule";

    fn id(&self) -> Uuid {
        self.id
    }

    fn set_id(&mut self, id: Uuid) {
        self.id = id;
    }
}

impl Entity for User {
    const KIND: &'static str = "user";

    fn id(&self) -> Uuid {
        self.id
    }

    fn set_id(&mut self, id: Uuid) {
        self.id = id;
    }
}

/// Generic CRUD + query-by-field persistence interface.
///
/// Implementations must preserve field values verbatim across a
/// write-then-read, including nested timestamps.
#[async_trait]
pub trait Collection<T: Entity>: Send + Sync {
    /// List all stored entities, in store-defined order.
    async fn list(&self) -> DomainResult<Vec<T>>;

    /// Fetch one entity by id.
    async fn get(&self, id: Uuid) -> DomainResult<Option<T>>;

    /// Store a new entity. The store assigns a fresh id and returns the
    /// stored value.
    async fn insert(&self, item: T) -> DomainResult<T>;

    /// Replace the entity stored under `id` with new field values,
    /// keeping the id.
    async fn update(&self, id: Uuid, item: T) -> DomainResult<T>;

    /// Delete an entity by id.
    async fn delete(&self, id: Uuid) -> DomainResult<()>;

    /// Find entities whose serialized top-level `field` equals `value`.
    async fn find_where(&self, field: &str, value: &serde_json::Value)
        -> DomainResult<Vec<T>>;
}
