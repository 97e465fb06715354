use super::{ArgumentSource, invalid_bound_argument};
use crate::catalog::Catalog;
use crate::error::{ODataError, ODataResult};
use crate::model::EntitySet;
use crate::pipe::PipeValue;

/// An entity set argument, resolved from the catalog by parameter name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntitySetArgument {
    name: String,
}

impl EntitySetArgument {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The source must be the transaction; the result is a copy of the
    /// catalog set with the transaction attached. A bound entity set is used
    /// as it is.
    pub fn generate(&self, source: ArgumentSource, catalog: &Catalog) -> ODataResult<EntitySet> {
        match source {
            ArgumentSource::Transaction(transaction) => {
                let entity_set = catalog.entity_set(&self.name).ok_or_else(|| {
                    ODataError::internal(
                        "invalid_entity_set",
                        format!("Could not find entity set: {}", self.name),
                    )
                })?;
                Ok(entity_set.with_transaction(transaction))
            }
            ArgumentSource::Bound(PipeValue::EntitySet(entity_set)) => Ok(entity_set),
            ArgumentSource::Bound(_) => Err(invalid_bound_argument()),
            _ => Err(ODataError::internal(
                "invalid_transaction",
                "The source of an entity set is expected to be a transaction",
            )),
        }
    }
}
