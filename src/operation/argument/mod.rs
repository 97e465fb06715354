//! Operation arguments.
//!
//! Each declared [`Parameter`] of a callable is classified once into an
//! [`Argument`]. At invocation time the argument turns one raw
//! [`ArgumentSource`] into the [`ArgumentValue`] the callable receives:
//!
//! | declared type | argument      | generated from                      |
//! |---------------|---------------|-------------------------------------|
//! | entity set    | `EntitySet`   | the transaction (catalog lookup)    |
//! | transaction   | `Transaction` | the transaction                     |
//! | entity        | `Entity`      | bound entity, JSON object or nothing |
//! | Edm primitive | `Primitive`   | URL literal, JSON value or bound value |
//! | native value  | `Value`       | as primitive, then unwrapped        |

mod entity;
mod entity_set;
mod primitive;
mod transaction;
mod value;

pub use entity::EntityArgument;
pub use entity_set::EntitySetArgument;
pub use primitive::PrimitiveArgument;
pub use transaction::TransactionArgument;
pub use value::ValueArgument;

use super::signature::{DeclaredType, Parameter};
use crate::catalog::Catalog;
use crate::error::{ODataError, ODataResult};
use crate::model::{Entity, EntitySet};
use crate::pipe::PipeValue;
use crate::primitive::{NativeValue, Primitive};
use crate::transaction::Transaction;
use indexmap::IndexMap;
use serde_json::Value;
use std::sync::Arc;

/// Raw input for one argument.
#[derive(Debug, Clone)]
pub enum ArgumentSource {
    /// Nothing was supplied
    Null,
    /// URL literal from an inline parameter or parameter alias
    Literal(String),
    /// Member of an action body
    Json(Value),
    /// Value carried from the previous path segment
    Bound(PipeValue),
    /// The current request
    Transaction(Arc<Transaction>),
}

impl ArgumentSource {
    /// Describes the source for error messages
    pub fn describe(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Literal(_) => "literal",
            Self::Json(_) => "JSON value",
            Self::Bound(_) => "bound value",
            Self::Transaction(_) => "transaction",
        }
    }
}

/// A generated argument as seen by the callable.
#[derive(Debug, Clone)]
pub enum ArgumentValue {
    Primitive(Primitive),
    Native(Option<NativeValue>),
    Entity(Entity),
    EntitySet(EntitySet),
    Transaction(Arc<Transaction>),
}

/// A classified callable parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Argument {
    Primitive(PrimitiveArgument),
    Entity(EntityArgument),
    EntitySet(EntitySetArgument),
    Transaction(TransactionArgument),
    Value(ValueArgument),
}

impl Argument {
    /// Classify a declared parameter.
    ///
    /// Entity sets are recognised first, then transactions, entities and
    /// primitives; anything else is a generic value.
    pub fn classify(parameter: &Parameter) -> Self {
        let name = parameter.name().to_string();
        let nullable = parameter.is_nullable();
        match parameter.declared() {
            DeclaredType::EntitySet => Self::EntitySet(EntitySetArgument::new(name)),
            DeclaredType::Transaction => Self::Transaction(TransactionArgument::new(name)),
            DeclaredType::Entity(entity_type) => {
                Self::Entity(EntityArgument::new(name, entity_type.clone()))
            }
            DeclaredType::Primitive(primitive_type) => {
                Self::Primitive(PrimitiveArgument::new(name, *primitive_type, nullable))
            }
            DeclaredType::Value(native_type) => {
                Self::Value(ValueArgument::new(name, *native_type, nullable))
            }
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Self::Primitive(argument) => argument.name(),
            Self::Entity(argument) => argument.name(),
            Self::EntitySet(argument) => argument.name(),
            Self::Transaction(argument) => argument.name(),
            Self::Value(argument) => argument.name(),
        }
    }

    pub fn is_nullable(&self) -> bool {
        match self {
            Self::Primitive(argument) => argument.is_nullable(),
            Self::Value(argument) => argument.is_nullable(),
            _ => false,
        }
    }

    /// Whether the argument is generated from the transaction rather than
    /// from client input
    pub fn is_structural(&self) -> bool {
        matches!(self, Self::EntitySet(_) | Self::Transaction(_))
    }

    /// Turn a raw source into the value handed to the callable
    pub fn generate(&self, source: ArgumentSource, catalog: &Catalog) -> ODataResult<ArgumentValue> {
        match self {
            Self::Primitive(argument) => argument.generate(source).map(ArgumentValue::Primitive),
            Self::Entity(argument) => argument.generate(source, catalog).map(ArgumentValue::Entity),
            Self::EntitySet(argument) => {
                argument.generate(source, catalog).map(ArgumentValue::EntitySet)
            }
            Self::Transaction(argument) => argument.generate(source).map(ArgumentValue::Transaction),
            Self::Value(argument) => argument.generate(source).map(ArgumentValue::Native),
        }
    }

    /// Check that a bound value fits this argument slot
    pub fn assert_valid_parameter(&self, bound: &PipeValue) -> ODataResult<()> {
        let valid = match self {
            Self::Primitive(_) | Self::Value(_) => {
                matches!(bound, PipeValue::Primitive(_) | PipeValue::PropertyValue(_))
            }
            Self::Entity(_) => matches!(bound, PipeValue::Entity(_)),
            Self::EntitySet(_) => matches!(bound, PipeValue::EntitySet(_)),
            Self::Transaction(_) => false,
        };

        if valid {
            Ok(())
        } else {
            Err(invalid_bound_argument())
        }
    }
}

pub(crate) fn invalid_bound_argument() -> ODataError {
    ODataError::bad_request(
        "invalid_bound_argument_type",
        "The provided bound argument was not of the correct type for this function",
    )
}

/// Generated arguments in declaration order.
#[derive(Debug, Clone, Default)]
pub struct Arguments {
    values: IndexMap<String, ArgumentValue>,
}

impl Arguments {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: ArgumentValue) {
        self.values.insert(name.into(), value);
    }

    pub fn get(&self, name: &str) -> Option<&ArgumentValue> {
        self.values.get(name)
    }

    /// Argument by declaration position
    pub fn positional(&self, index: usize) -> Option<&ArgumentValue> {
        self.values.get_index(index).map(|(_, value)| value)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ArgumentValue)> {
        self.values.iter().map(|(name, value)| (name.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn into_values(self) -> Vec<ArgumentValue> {
        self.values.into_values().collect()
    }

    pub fn primitive(&self, name: &str) -> ODataResult<&Primitive> {
        match self.get(name) {
            Some(ArgumentValue::Primitive(value)) => Ok(value),
            _ => Err(missing_argument(name, "primitive")),
        }
    }

    pub fn native(&self, name: &str) -> ODataResult<Option<&NativeValue>> {
        match self.get(name) {
            Some(ArgumentValue::Native(value)) => Ok(value.as_ref()),
            _ => Err(missing_argument(name, "value")),
        }
    }

    pub fn entity(&self, name: &str) -> ODataResult<&Entity> {
        match self.get(name) {
            Some(ArgumentValue::Entity(entity)) => Ok(entity),
            _ => Err(missing_argument(name, "entity")),
        }
    }

    pub fn entity_set(&self, name: &str) -> ODataResult<&EntitySet> {
        match self.get(name) {
            Some(ArgumentValue::EntitySet(entity_set)) => Ok(entity_set),
            _ => Err(missing_argument(name, "entity set")),
        }
    }

    pub fn transaction(&self, name: &str) -> ODataResult<&Arc<Transaction>> {
        match self.get(name) {
            Some(ArgumentValue::Transaction(transaction)) => Ok(transaction),
            _ => Err(missing_argument(name, "transaction")),
        }
    }

    /// Integer view of a primitive or native argument
    pub fn int(&self, name: &str) -> ODataResult<i64> {
        let value = match self.get(name) {
            Some(ArgumentValue::Primitive(value)) => value.as_i64(),
            Some(ArgumentValue::Native(value)) => value.as_ref().and_then(NativeValue::as_i64),
            _ => None,
        };
        value.ok_or_else(|| missing_argument(name, "integer"))
    }

    /// String view of a primitive or native argument
    pub fn string(&self, name: &str) -> ODataResult<&str> {
        let value = match self.get(name) {
            Some(ArgumentValue::Primitive(value)) => value.as_str(),
            Some(ArgumentValue::Native(value)) => value.as_ref().and_then(NativeValue::as_str),
            _ => None,
        };
        value.ok_or_else(|| missing_argument(name, "string"))
    }
}

fn missing_argument(name: &str, expected: &str) -> ODataError {
    ODataError::internal(
        "missing_argument",
        format!("The callable expected a {expected} argument named '{name}'"),
    )
}
