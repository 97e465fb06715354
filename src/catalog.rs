//! The service catalog.
//!
//! A [`Catalog`] holds every entity type, entity set and operation the
//! service exposes. It is assembled once with a [`CatalogBuilder`] during
//! setup and is read-only afterwards; requests only look things up and
//! clone what they need to bind.
//!
//! ```rust
//! use odata_server::catalog::Catalog;
//! use odata_server::model::{EntitySet, EntityType};
//! use odata_server::primitive::PrimitiveType;
//!
//! let flight = EntityType::new("flight")
//!     .with_key("id", PrimitiveType::Int32)
//!     .into_shared();
//! let flights = EntitySet::in_memory("flights", flight, []).unwrap();
//!
//! let catalog = Catalog::builder().add_entity_set(flights).build().unwrap();
//! assert!(catalog.entity_set("flights").is_some());
//! assert!(catalog.entity_type("flight").is_some());
//! assert!(catalog.entity_set("Flights").is_none());
//! ```

use crate::error::{ODataError, ODataResult};
use crate::model::{EntitySet, EntityType};
use crate::operation::OperationTemplate;
use indexmap::IndexMap;
use log::debug;
use std::sync::Arc;

/// Process-wide registry of the resources a service exposes.
#[derive(Debug, Default)]
pub struct Catalog {
    entity_types: IndexMap<String, Arc<EntityType>>,
    entity_sets: IndexMap<String, EntitySet>,
    operations: IndexMap<String, Arc<OperationTemplate>>,
}

impl Catalog {
    pub fn builder() -> CatalogBuilder {
        CatalogBuilder::default()
    }

    /// Look up an operation by its exact name
    pub fn operation(&self, name: &str) -> Option<&Arc<OperationTemplate>> {
        self.operations.get(name)
    }

    pub fn entity_set(&self, name: &str) -> Option<&EntitySet> {
        self.entity_sets.get(name)
    }

    pub fn entity_type(&self, name: &str) -> Option<&Arc<EntityType>> {
        self.entity_types.get(name)
    }

    pub fn operations(&self) -> impl Iterator<Item = &Arc<OperationTemplate>> {
        self.operations.values()
    }

    pub fn entity_sets(&self) -> impl Iterator<Item = &EntitySet> {
        self.entity_sets.values()
    }

    pub fn entity_types(&self) -> impl Iterator<Item = &Arc<EntityType>> {
        self.entity_types.values()
    }
}

/// Collects catalog members during setup.
///
/// Names are case-sensitive. Registering two members under one name is an
/// error reported by [`CatalogBuilder::build`]; entity sets and operations
/// share one namespace because both are addressed by the first path
/// segment.
#[derive(Debug, Default)]
pub struct CatalogBuilder {
    catalog: Catalog,
    error: Option<ODataError>,
}

impl CatalogBuilder {
    /// Register an entity type
    pub fn add_entity_type(mut self, entity_type: impl Into<Arc<EntityType>>) -> Self {
        let entity_type = entity_type.into();
        let name = entity_type.name().to_string();
        if self.catalog.entity_types.contains_key(&name) {
            self.duplicate("entity type", &name);
        } else {
            self.catalog.entity_types.insert(name, entity_type);
        }
        self
    }

    /// Register an entity set; its entity type is registered too unless a
    /// type of that name already exists
    pub fn add_entity_set(mut self, entity_set: EntitySet) -> Self {
        let name = entity_set.name().to_string();
        if self.is_addressable(&name) {
            self.duplicate("entity set", &name);
            return self;
        }

        let entity_type = entity_set.entity_type().clone();
        self.catalog
            .entity_types
            .entry(entity_type.name().to_string())
            .or_insert(entity_type);
        self.catalog.entity_sets.insert(name, entity_set);
        self
    }

    /// Register an operation
    pub fn add_operation(mut self, operation: OperationTemplate) -> Self {
        let name = operation.name().to_string();
        if self.is_addressable(&name) {
            self.duplicate("operation", &name);
        } else {
            self.catalog.operations.insert(name, Arc::new(operation));
        }
        self
    }

    /// Finish setup.
    ///
    /// # Errors
    ///
    /// `InternalServerError("duplicate_name")` for the first name that was
    /// registered twice.
    pub fn build(self) -> ODataResult<Catalog> {
        if let Some(error) = self.error {
            return Err(error);
        }
        debug!(
            "Catalog built with {} entity type(s), {} entity set(s) and {} operation(s)",
            self.catalog.entity_types.len(),
            self.catalog.entity_sets.len(),
            self.catalog.operations.len()
        );
        Ok(self.catalog)
    }

    fn is_addressable(&self, name: &str) -> bool {
        self.catalog.entity_sets.contains_key(name) || self.catalog.operations.contains_key(name)
    }

    fn duplicate(&mut self, kind: &str, name: &str) {
        if self.error.is_none() {
            self.error = Some(ODataError::internal(
                "duplicate_name",
                format!("Cannot register {kind} '{name}': the name is already in use"),
            ));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operation::{CallableReturn, OperationTemplate};
    use crate::primitive::{Primitive, PrimitiveType};

    fn exf1() -> OperationTemplate {
        OperationTemplate::function("exf1")
            .returns(CallableReturn::primitive(PrimitiveType::String))
            .callable(|_| Ok(Some(Primitive::from("hello").into())))
            .build()
            .unwrap()
    }

    #[test]
    fn test_lookups_are_case_sensitive() {
        let catalog = Catalog::builder().add_operation(exf1()).build().unwrap();
        assert!(catalog.operation("exf1").is_some());
        assert!(catalog.operation("EXF1").is_none());
        assert_eq!(catalog.operations().count(), 1);
    }

    #[test]
    fn test_duplicate_names_fail_the_build() {
        let error = Catalog::builder()
            .add_operation(exf1())
            .add_operation(exf1())
            .build()
            .unwrap_err();
        assert_eq!(error.code(), "duplicate_name");

        let flight = EntityType::new("exf1").into_shared();
        let clash = Catalog::builder()
            .add_operation(exf1())
            .add_entity_set(EntitySet::in_memory("exf1", flight, []).unwrap())
            .build()
            .unwrap_err();
        assert_eq!(clash.code(), "duplicate_name");
    }

    #[test]
    fn test_entity_set_registers_its_type() {
        let airport = EntityType::new("airport")
            .with_key("code", PrimitiveType::String)
            .into_shared();
        let catalog = Catalog::builder()
            .add_entity_set(EntitySet::in_memory("airports", airport, []).unwrap())
            .build()
            .unwrap();
        assert_eq!(catalog.entity_type("airport").unwrap().name(), "airport");
        assert_eq!(catalog.entity_types().count(), 1);
    }
}
