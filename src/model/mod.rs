//! Resource model: entity types, entities and entity sets.
//!
//! An [`EntityType`] describes the shape of an entity: its name, its key
//! property and its declared primitive properties. Types are shared through
//! `Arc` between the catalog, the entity sets that expose them and the
//! entities that conform to them.

mod entity;
mod entity_set;

pub use entity::{Entity, PropertyValue};
pub use entity_set::EntitySet;

use crate::primitive::PrimitiveType;
use indexmap::IndexMap;
use std::sync::Arc;

/// A declared primitive property of an entity type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Property {
    name: String,
    primitive_type: PrimitiveType,
    nullable: bool,
}

impl Property {
    pub fn new(name: impl Into<String>, primitive_type: PrimitiveType) -> Self {
        Self {
            name: name.into(),
            primitive_type,
            nullable: true,
        }
    }

    #[must_use]
    pub fn non_nullable(mut self) -> Self {
        self.nullable = false;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn primitive_type(&self) -> PrimitiveType {
        self.primitive_type
    }

    pub fn is_nullable(&self) -> bool {
        self.nullable
    }
}

/// Named structural type of an entity.
///
/// ```rust
/// use odata_server::model::EntityType;
/// use odata_server::primitive::PrimitiveType;
///
/// let airport = EntityType::new("airport")
///     .with_key("id", PrimitiveType::Int32)
///     .with_property("code", PrimitiveType::String)
///     .with_property("is_big", PrimitiveType::Boolean);
///
/// assert_eq!(airport.key().map(|k| k.name()), Some("id"));
/// assert!(airport.property("code").is_some());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityType {
    name: String,
    key: Option<String>,
    properties: IndexMap<String, Property>,
}

impl EntityType {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            key: None,
            properties: IndexMap::new(),
        }
    }

    /// Declare the key property. Keys are never nullable.
    #[must_use]
    pub fn with_key(mut self, name: impl Into<String>, primitive_type: PrimitiveType) -> Self {
        let property = Property::new(name, primitive_type).non_nullable();
        self.key = Some(property.name.clone());
        self.properties.insert(property.name.clone(), property);
        self
    }

    /// Declare a nullable property
    #[must_use]
    pub fn with_property(self, name: impl Into<String>, primitive_type: PrimitiveType) -> Self {
        self.with_declared_property(Property::new(name, primitive_type))
    }

    #[must_use]
    pub fn with_declared_property(mut self, property: Property) -> Self {
        self.properties.insert(property.name.clone(), property);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn key(&self) -> Option<&Property> {
        self.key.as_ref().and_then(|key| self.properties.get(key))
    }

    pub fn property(&self, name: &str) -> Option<&Property> {
        self.properties.get(name)
    }

    pub fn properties(&self) -> impl Iterator<Item = &Property> {
        self.properties.values()
    }

    /// Finish declaration and share the type
    pub fn into_shared(self) -> Arc<Self> {
        Arc::new(self)
    }
}
