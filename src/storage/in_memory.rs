//! In-memory entity set storage.
//!
//! Entities are kept in insertion order in an `IndexMap` keyed by the URL
//! literal of their key value, behind a tokio `RwLock`. Suitable for tests,
//! static reference data and development.
//!
//! # Performance Characteristics
//!
//! * READ/INSERT/REMOVE: O(1) average case
//! * QUERY: O(n), clones every entity

use super::EntitySetProvider;
use crate::error::{ODataError, ODataResult};
use crate::model::Entity;
use crate::primitive::Primitive;
use async_trait::async_trait;
use indexmap::IndexMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Thread-safe in-memory entity storage.
///
/// Cloning shares the underlying data.
#[derive(Debug, Clone, Default)]
pub struct InMemoryEntitySet {
    // key literal -> entity
    data: Arc<RwLock<IndexMap<String, Entity>>>,
}

impl InMemoryEntitySet {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store seeded with entities.
    ///
    /// Fails if an entity has no key; a later entity replaces an earlier one
    /// with the same key.
    pub fn with_entities(entities: impl IntoIterator<Item = Entity>) -> ODataResult<Self> {
        let mut data = IndexMap::new();
        for entity in entities {
            data.insert(Self::storage_key(&entity)?, entity);
        }
        Ok(Self {
            data: Arc::new(RwLock::new(data)),
        })
    }

    /// Insert or replace an entity, returning the previous one.
    pub async fn insert(&self, entity: Entity) -> ODataResult<Option<Entity>> {
        let key = Self::storage_key(&entity)?;
        let mut data_guard = self.data.write().await;
        Ok(data_guard.insert(key, entity))
    }

    /// Remove an entity by key, returning whether it existed.
    pub async fn remove(&self, key: &Primitive) -> bool {
        let mut data_guard = self.data.write().await;
        data_guard.shift_remove(&key.to_string()).is_some()
    }

    /// Clear all data (useful for testing).
    pub async fn clear(&self) {
        let mut data_guard = self.data.write().await;
        data_guard.clear();
    }

    fn storage_key(entity: &Entity) -> ODataResult<String> {
        entity.entity_id().ok_or_else(|| {
            ODataError::bad_request(
                "missing_key",
                format!("A {} entity must have a key to be stored", entity.type_name()),
            )
        })
    }
}

#[async_trait]
impl EntitySetProvider for InMemoryEntitySet {
    async fn read(&self, key: &Primitive) -> ODataResult<Option<Entity>> {
        let data_guard = self.data.read().await;
        Ok(data_guard.get(&key.to_string()).cloned())
    }

    async fn query(&self) -> ODataResult<Vec<Entity>> {
        let data_guard = self.data.read().await;
        Ok(data_guard.values().cloned().collect())
    }

    async fn count(&self) -> ODataResult<usize> {
        let data_guard = self.data.read().await;
        Ok(data_guard.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::EntityType;
    use crate::primitive::PrimitiveType;
    use std::sync::Arc;

    fn flight_type() -> Arc<EntityType> {
        EntityType::new("flight")
            .with_key("id", PrimitiveType::Int32)
            .with_property("origin", PrimitiveType::String)
            .into_shared()
    }

    fn flight(id: i32, origin: &str) -> Entity {
        Entity::new(flight_type())
            .with("id", id)
            .unwrap()
            .with("origin", origin)
            .unwrap()
    }

    #[tokio::test]
    async fn test_insert_and_read() {
        let storage = InMemoryEntitySet::new();
        assert!(storage.insert(flight(1, "lhr")).await.unwrap().is_none());

        let retrieved = storage.read(&Primitive::Int32(1)).await.unwrap();
        assert_eq!(retrieved, Some(flight(1, "lhr")));

        let replaced = storage.insert(flight(1, "sfo")).await.unwrap();
        assert_eq!(replaced, Some(flight(1, "lhr")));
    }

    #[tokio::test]
    async fn test_read_nonexistent() {
        let storage = InMemoryEntitySet::with_entities([flight(1, "lhr")]).unwrap();
        assert!(storage.read(&Primitive::Int32(2)).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_query_keeps_insertion_order() {
        let storage =
            InMemoryEntitySet::with_entities([flight(3, "lax"), flight(1, "lhr"), flight(2, "sfo")])
                .unwrap();

        let ids: Vec<_> = storage
            .query()
            .await
            .unwrap()
            .iter()
            .filter_map(|entity| entity.key().and_then(Primitive::as_i64))
            .collect();
        assert_eq!(ids, vec![3, 1, 2]);
        assert_eq!(storage.count().await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_remove_and_clear() {
        let storage = InMemoryEntitySet::with_entities([flight(1, "lhr"), flight(2, "sfo")]).unwrap();
        assert!(storage.remove(&Primitive::Int32(1)).await);
        assert!(!storage.remove(&Primitive::Int32(1)).await);
        assert_eq!(storage.count().await.unwrap(), 1);

        storage.clear().await;
        assert!(storage.query().await.unwrap().is_empty());
    }

    #[test]
    fn test_keyless_entities_are_rejected() {
        let text = EntityType::new("text")
            .with_property("a", PrimitiveType::String)
            .into_shared();
        let error = InMemoryEntitySet::with_entities([Entity::new(text)]).unwrap_err();
        assert_eq!(error.code(), "missing_key");
    }
}
