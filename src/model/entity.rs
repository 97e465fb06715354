//! Entity instances and property values.

use super::EntityType;
use crate::error::{ODataError, ODataResult};
use crate::primitive::Primitive;
use indexmap::IndexMap;
use serde_json::{Map, Value};
use std::sync::Arc;

/// An instance of an [`EntityType`].
///
/// Values are checked against the declared properties when they are set:
/// unknown names and values that cannot be read as the declared type are
/// rejected.
#[derive(Debug, Clone, PartialEq)]
pub struct Entity {
    entity_type: Arc<EntityType>,
    values: IndexMap<String, Primitive>,
}

impl Entity {
    /// An empty entity of the given type
    pub fn new(entity_type: Arc<EntityType>) -> Self {
        Self {
            entity_type,
            values: IndexMap::new(),
        }
    }

    /// Build an entity from a JSON object, e.g. an action body or seed data.
    pub fn from_json(entity_type: Arc<EntityType>, value: &Value) -> ODataResult<Self> {
        let object = value.as_object().ok_or_else(|| {
            ODataError::bad_request(
                "invalid_entity",
                format!("A {} entity must be a JSON object", entity_type.name()),
            )
        })?;

        let mut entity = Self::new(entity_type);
        for (name, json) in object {
            // control information such as @odata.type is not a property
            if name.starts_with('@') || name.contains("@odata.") {
                continue;
            }
            let property = entity.entity_type.property(name).ok_or_else(|| {
                ODataError::bad_request(
                    "invalid_property",
                    format!("The property '{}' does not exist on '{}'", name, entity.type_name()),
                )
            })?;
            let primitive = property
                .primitive_type()
                .from_json(json)
                .map_err(|e| ODataError::bad_request("invalid_property_type", e.to_string()))?;
            entity.set(name, primitive)?;
        }
        Ok(entity)
    }

    pub fn entity_type(&self) -> &Arc<EntityType> {
        &self.entity_type
    }

    pub fn type_name(&self) -> &str {
        self.entity_type.name()
    }

    /// Set a property value, coercing it to the declared type if needed
    pub fn set(&mut self, name: &str, value: impl Into<Primitive>) -> ODataResult<()> {
        let value = value.into();
        let property = self.entity_type.property(name).ok_or_else(|| {
            ODataError::bad_request(
                "invalid_property",
                format!("The property '{}' does not exist on '{}'", name, self.entity_type.name()),
            )
        })?;

        let declared = property.primitive_type();
        let value = match value {
            Primitive::Null(_) if !property.is_nullable() => {
                return Err(ODataError::bad_request(
                    "property_not_nullable",
                    format!("The property '{}' cannot be set to null", name),
                ));
            }
            Primitive::Null(_) => declared.null(),
            value if value.primitive_type() == declared => value,
            value => declared
                .from_json(&value.to_json())
                .map_err(|e| ODataError::bad_request("invalid_property_type", e.to_string()))?,
        };

        self.values.insert(name.to_string(), value);
        Ok(())
    }

    /// Builder form of [`Entity::set`]
    pub fn with(mut self, name: &str, value: impl Into<Primitive>) -> ODataResult<Self> {
        self.set(name, value)?;
        Ok(self)
    }

    pub fn get(&self, name: &str) -> Option<&Primitive> {
        self.values.get(name)
    }

    /// The value of a declared property wrapped with its name; unset
    /// properties read as typed nulls
    pub fn property_value(&self, name: &str) -> Option<PropertyValue> {
        let property = self.entity_type.property(name)?;
        let value = self
            .values
            .get(name)
            .cloned()
            .unwrap_or_else(|| property.primitive_type().null());
        Some(PropertyValue::new(name, value))
    }

    /// The key value, if the type declares a key and it has been set
    pub fn key(&self) -> Option<&Primitive> {
        let key = self.entity_type.key()?;
        self.values.get(key.name()).filter(|value| !value.is_null())
    }

    /// The key in URL literal form, e.g. `1` or `'sfo'`
    pub fn entity_id(&self) -> Option<String> {
        self.key().map(ToString::to_string)
    }

    /// Set the key property
    pub fn set_entity_id(&mut self, value: impl Into<Primitive>) -> ODataResult<()> {
        let key = self
            .entity_type
            .key()
            .map(|key| key.name().to_string())
            .ok_or_else(|| {
                ODataError::internal(
                    "missing_key",
                    format!("The entity type '{}' has no key", self.type_name()),
                )
            })?;
        self.set(&key, value)
    }

    pub fn to_json(&self) -> Value {
        let object: Map<String, Value> = self
            .values
            .iter()
            .map(|(name, value)| (name.clone(), value.to_json()))
            .collect();
        Value::Object(object)
    }
}

/// A single property of an entity, produced by a property path segment.
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyValue {
    name: String,
    value: Primitive,
}

impl PropertyValue {
    pub fn new(name: impl Into<String>, value: Primitive) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value(&self) -> &Primitive {
        &self.value
    }

    pub fn into_value(self) -> Primitive {
        self.value
    }
}
