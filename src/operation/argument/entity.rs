use super::{ArgumentSource, invalid_bound_argument};
use crate::catalog::Catalog;
use crate::error::{ODataError, ODataResult};
use crate::model::{Entity, EntityType};
use crate::pipe::PipeValue;
use serde_json::Value;
use std::sync::Arc;

/// An entity argument.
///
/// The entity type is either declared explicitly or taken from the catalog
/// entity type that shares the parameter's name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityArgument {
    name: String,
    entity_type: Option<String>,
}

impl EntityArgument {
    pub fn new(name: impl Into<String>, entity_type: Option<String>) -> Self {
        Self {
            name: name.into(),
            entity_type,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn entity_type(&self, catalog: &Catalog) -> Option<Arc<EntityType>> {
        let type_name = self.entity_type.as_deref().unwrap_or(&self.name);
        catalog.entity_type(type_name).cloned()
    }

    /// A supplied entity passes through; with no source an empty entity of
    /// the argument's type is created.
    pub fn generate(&self, source: ArgumentSource, catalog: &Catalog) -> ODataResult<Entity> {
        match source {
            ArgumentSource::Bound(PipeValue::Entity(entity)) => Ok(entity),
            ArgumentSource::Bound(_) => Err(invalid_bound_argument()),
            ArgumentSource::Null | ArgumentSource::Json(Value::Null) => {
                Ok(Entity::new(self.resolve_type(catalog)?))
            }
            ArgumentSource::Json(json) => Entity::from_json(self.resolve_type(catalog)?, &json),
            ArgumentSource::Literal(_) | ArgumentSource::Transaction(_) => {
                Err(ODataError::bad_request(
                    "invalid_argument_type",
                    format!("The provided argument {} was not an entity", self.name),
                ))
            }
        }
    }

    fn resolve_type(&self, catalog: &Catalog) -> ODataResult<Arc<EntityType>> {
        self.entity_type(catalog).ok_or_else(|| {
            ODataError::internal(
                "invalid_entity_type",
                "Entity of this type could not be generated",
            )
        })
    }
}
