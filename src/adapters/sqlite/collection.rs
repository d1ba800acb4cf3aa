//! SQLite implementation of the `Collection` port.
//!
//! Entities are stored as JSON documents in a single `documents` table,
//! keyed by collection name (the entity kind) and id. `find_where`
//! queries top-level fields with `json_extract`, falling back to a full
//! scan for value types SQLite cannot compare natively.

use std::marker::PhantomData;

use async_trait::async_trait;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::ports::{Collection, Entity};

/// SQLite-backed document collection for one entity kind.
#[derive(Clone)]
pub struct SqliteCollection<T> {
    pool: SqlitePool,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Entity> SqliteCollection<T> {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool, _marker: PhantomData }
    }

    fn decode(data: &str) -> DomainResult<T> {
        serde_json::from_str(data).map_err(DomainError::from)
    }
}

/// Only plain identifier fields may be spliced into a `json_extract`
/// path.
fn validate_field(field: &str) -> DomainResult<()> {
    if !field.is_empty() && field.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        Ok(())
    } else {
        Err(DomainError::ValidationFailed(format!(
            "Invalid query field '{field}'"
        )))
    }
}

#[async_trait]
impl<T: Entity> Collection<T> for SqliteCollection<T> {
    async fn list(&self) -> DomainResult<Vec<T>> {
        let rows: Vec<(String,)> =
            sqlx::query_as("SELECT data FROM documents WHERE collection = ? ORDER BY rowid")
                .bind(T::KIND)
                .fetch_all(&self.pool)
                .await?;

        rows.iter().map(|(data,)| Self::decode(data)).collect()
    }

    async fn get(&self, id: Uuid) -> DomainResult<Option<T>> {
        let row: Option<(String,)> =
            sqlx::query_as("SELECT data FROM documents WHERE collection = ? AND id = ?")
                .bind(T::KIND)
                .bind(id.to_string())
                .fetch_optional(&self.pool)
                .await?;

        row.map(|(data,)| Self::decode(&data)).transpose()
    }

    async fn insert(&self, mut item: T) -> DomainResult<T> {
        item.set_id(Uuid::new_v4());
        let data = serde_json::to_string(&item)?;

        sqlx::query("INSERT INTO documents (collection, id, data) VALUES (?, ?, ?)")
            .bind(T::KIND)
            .bind(item.id().to_string())
            .bind(&data)
            .execute(&self.pool)
            .await?;

        Ok(item)
    }

    async fn update(&self, id: Uuid, mut item: T) -> DomainResult<T> {
        item.set_id(id);
        let data = serde_json::to_string(&item)?;

        let result = sqlx::query("UPDATE documents SET data = ? WHERE collection = ? AND id = ?")
            .bind(&data)
            .bind(T::KIND)
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DomainError::NotFound { entity: T::KIND, id });
        }
        Ok(item)
    }

    async fn delete(&self, id: Uuid) -> DomainResult<()> {
        sqlx::query("DELETE FROM documents WHERE collection = ? AND id = ?")
            .bind(T::KIND)
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn find_where(
        &self,
        field: &str,
        value: &serde_json::Value,
    ) -> DomainResult<Vec<T>> {
        validate_field(field)?;
        let sql = format!(
            "SELECT data FROM documents
             WHERE collection = ? AND json_extract(data, '$.{field}') = ?
             ORDER BY rowid"
        );

        let query = sqlx::query_as::<_, (String,)>(&sql).bind(T::KIND);
        let rows: Vec<(String,)> = match value {
            serde_json::Value::String(s) => query.bind(s).fetch_all(&self.pool).await?,
            serde_json::Value::Bool(b) => query.bind(*b).fetch_all(&self.pool).await?,
            serde_json::Value::Number(n) => {
                let n = n.as_f64().ok_or_else(|| {
                    DomainError::ValidationFailed("Non-finite query value".to_string())
                })?;
                query.bind(n).fetch_all(&self.pool).await?
            }
            // Structured values can't be compared in SQL; scan instead.
            _ => {
                let mut matches = Vec::new();
                for item in self.list().await? {
                    let doc = serde_json::to_value(&item)?;
                    if doc.get(field) == Some(value) {
                        matches.push(serde_json::to_string(&item)?);
                    }
                }
                return matches.iter().map(|data| Self::decode(data)).collect();
            }
        };

        rows.iter().map(|(data,)| Self::decode(data)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::sqlite::{all_embedded_migrations, create_test_pool, Migrator};
    use crate::domain::models::User;

    async fn test_collection() -> SqliteCollection<User> {
        let pool = create_test_pool().await.unwrap();
        Migrator::new(pool.clone())
            .run_embedded_migrations(all_embedded_migrations())
            .await
            .unwrap();
        SqliteCollection::new(pool)
    }

    #[tokio::test]
    async fn test_insert_get_round_trip() {
        let collection = test_collection().await;
        let user = User::new("alice").with_setting("apiKey", "k-123");

        let stored = collection.insert(user).await.unwrap();
        let loaded = collection.get(stored.id).await.unwrap().unwrap();

        // Verbatim round trip, including the timestamp.
        assert_eq!(loaded, stored);
        assert_eq!(loaded.settings["apiKey"], "k-123");
    }

    #[tokio::test]
    async fn test_find_where_string_field() {
        let collection = test_collection().await;
        collection.insert(User::new("alice")).await.unwrap();
        let bob = collection.insert(User::new("bob")).await.unwrap();

        let found = collection
            .find_where("name", &serde_json::json!("bob"))
            .await
            .unwrap();
        assert_eq!(found, vec![bob]);
    }

    #[tokio::test]
    async fn test_update_then_delete() {
        let collection = test_collection().await;
        let stored = collection.insert(User::new("alice")).await.unwrap();

        let mut edited = stored.clone();
        edited.name = "alicia".to_string();
        let updated = collection.update(stored.id, edited).await.unwrap();
        assert_eq!(updated.id, stored.id);
        assert_eq!(
            collection.get(stored.id).await.unwrap().unwrap().name,
            "alicia"
        );

        collection.delete(stored.id).await.unwrap();
        assert!(collection.get(stored.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_rejects_malformed_query_field() {
        let collection = test_collection().await;
        let err = collection
            .find_where("name' --", &serde_json::json!("x"))
            .await;
        assert!(err.is_err());
    }
}
