//! Named collections of entities.

use super::{Entity, EntityType};
use crate::error::{ODataError, ODataResult};
use crate::lexer::KeyPredicate;
use crate::primitive::Primitive;
use crate::storage::{EntitySetProvider, InMemoryEntitySet};
use crate::transaction::Transaction;
use std::fmt;
use std::sync::Arc;

/// A named, addressable set of entities of one type.
///
/// Cloning is cheap: the type and provider are shared. The catalog owns one
/// instance per set; requests work on clones with their transaction
/// attached.
#[derive(Clone)]
pub struct EntitySet {
    name: String,
    entity_type: Arc<EntityType>,
    provider: Arc<dyn EntitySetProvider>,
    transaction: Option<Arc<Transaction>>,
}

impl EntitySet {
    pub fn new(
        name: impl Into<String>,
        entity_type: Arc<EntityType>,
        provider: Arc<dyn EntitySetProvider>,
    ) -> Self {
        Self {
            name: name.into(),
            entity_type,
            provider,
            transaction: None,
        }
    }

    /// An entity set backed by [`InMemoryEntitySet`]
    pub fn in_memory(
        name: impl Into<String>,
        entity_type: Arc<EntityType>,
        entities: impl IntoIterator<Item = Entity>,
    ) -> ODataResult<Self> {
        let storage = InMemoryEntitySet::with_entities(entities)?;
        Ok(Self::new(name, entity_type, Arc::new(storage)))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn entity_type(&self) -> &Arc<EntityType> {
        &self.entity_type
    }

    /// A copy of this set bound to one request
    #[must_use]
    pub fn with_transaction(&self, transaction: Arc<Transaction>) -> Self {
        Self {
            transaction: Some(transaction),
            ..self.clone()
        }
    }

    pub fn transaction(&self) -> Option<&Arc<Transaction>> {
        self.transaction.as_ref()
    }

    /// An empty entity of this set's type
    pub fn new_entity(&self) -> Entity {
        Entity::new(self.entity_type.clone())
    }

    pub async fn read(&self, key: &Primitive) -> ODataResult<Option<Entity>> {
        self.provider.read(key).await
    }

    pub async fn query(&self) -> ODataResult<Vec<Entity>> {
        self.provider.query().await
    }

    pub async fn count(&self) -> ODataResult<usize> {
        self.provider.count().await
    }

    /// Type a key predicate against the key property of this set's type.
    ///
    /// `(1)` and `(id=1)` are both accepted; named predicates must name the
    /// key property.
    pub fn parse_key(&self, predicate: &KeyPredicate) -> ODataResult<Primitive> {
        let key = self.entity_type.key().ok_or_else(|| {
            ODataError::bad_request(
                "no_entity_key_defined",
                format!("The entity set '{}' has no key", self.name),
            )
        })?;

        let literal = match predicate {
            KeyPredicate::Single(literal) => literal,
            KeyPredicate::Named(keys) => match keys.get(key.name()) {
                Some(literal) if keys.len() == 1 => literal,
                _ => {
                    return Err(ODataError::bad_request(
                        "invalid_key",
                        format!("The key predicate must name the key property '{}'", key.name()),
                    ));
                }
            },
        };

        let value = key.primitive_type().parse_literal(literal).map_err(|e| {
            ODataError::bad_request("invalid_key", e.to_string())
        })?;

        if value.is_null() {
            return Err(ODataError::bad_request(
                "invalid_key",
                "A key value cannot be null",
            ));
        }
        Ok(value)
    }

    /// Canonical URL of an entity in this set, e.g. `…/flights(1)`
    pub fn entity_url(&self, service_root: &str, entity: &Entity) -> Option<String> {
        entity
            .entity_id()
            .map(|id| format!("{}{}({})", service_root, self.name, id))
    }
}

impl fmt::Debug for EntitySet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntitySet")
            .field("name", &self.name)
            .field("entity_type", &self.entity_type.name())
            .field("bound", &self.transaction.is_some())
            .finish()
    }
}

/// Entity sets are equal if they expose the same type under the same name
impl PartialEq for EntitySet {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.entity_type == other.entity_type
    }
}
