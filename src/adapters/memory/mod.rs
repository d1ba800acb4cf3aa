//! In-memory collection adapter.
//!
//! Backs tests and the `memory` store mode. Items are kept in insertion
//! order behind an async `RwLock`; `find_where` compares serialized
//! top-level fields, so it behaves exactly like the SQLite adapter's
//! `json_extract` queries.

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::ports::{Collection, Entity};

/// In-memory `Collection` implementation.
#[derive(Default)]
pub struct MemoryCollection<T> {
    items: RwLock<Vec<T>>,
}

impl<T: Entity> MemoryCollection<T> {
    pub fn new() -> Self {
        Self { items: RwLock::new(Vec::new()) }
    }

    /// Seed an item without going through `insert`, keeping its id.
    /// Test helper.
    pub async fn seed(&self, item: T) {
        self.items.write().await.push(item);
    }
}

#[async_trait]
impl<T: Entity> Collection<T> for MemoryCollection<T> {
    async fn list(&self) -> DomainResult<Vec<T>> {
        Ok(self.items.read().await.clone())
    }

    async fn get(&self, id: Uuid) -> DomainResult<Option<T>> {
        Ok(self.items.read().await.iter().find(|i| i.id() == id).cloned())
    }

    async fn insert(&self, mut item: T) -> DomainResult<T> {
        item.set_id(Uuid::new_v4());
        self.items.write().await.push(item.clone());
        Ok(item)
    }

    async fn update(&self, id: Uuid, mut item: T) -> DomainResult<T> {
        item.set_id(id);
        let mut items = self.items.write().await;
        let stored = items
            .iter_mut()
            .find(|i| i.id() == id)
            .ok_or(DomainError::NotFound { entity: T::KIND, id })?;
        *stored = item.clone();
        Ok(item)
    }

    async fn delete(&self, id: Uuid) -> DomainResult<()> {
        self.items.write().await.retain(|i| i.id() != id);
        Ok(())
    }

    async fn find_where(
        &self,
        field: &str,
        value: &serde_json::Value,
    ) -> DomainResult<Vec<T>> {
        let items = self.items.read().await;
        let mut matches = Vec::new();
        for item in items.iter() {
            let doc = serde_json::to_value(item)?;
            if doc.get(field) == Some(value) {
                matches.push(item.clone());
            }
        }
        Ok(matches)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::User;

    #[tokio::test]
    async fn test_insert_assigns_fresh_id() {
        let collection = MemoryCollection::<User>::new();
        let user = User::new("alice");
        let original_id = user.id;

        let stored = collection.insert(user).await.unwrap();
        assert_ne!(stored.id, original_id);
        assert_eq!(collection.get(stored.id).await.unwrap().unwrap().name, "alice");
    }

    #[tokio::test]
    async fn test_update_unknown_id_fails() {
        let collection = MemoryCollection::<User>::new();
        let err = collection.update(Uuid::new_v4(), User::new("ghost")).await;
        assert!(matches!(err, Err(DomainError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_find_where_by_field() {
        let collection = MemoryCollection::<User>::new();
        collection.insert(User::new("alice")).await.unwrap();
        collection.insert(User::new("bob")).await.unwrap();

        let found = collection
            .find_where("name", &serde_json::json!("bob"))
            .await
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name, "bob");
    }
}
