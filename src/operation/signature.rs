//! Declared shape of an operation's callable.
//!
//! Callables are plain closures, so their parameter list and return type are
//! declared explicitly at registration time with [`Parameter`] and
//! [`CallableReturn`]. The declarations are classified into arguments once,
//! when the operation is built.

use crate::model::EntityType;
use crate::primitive::{NativeType, PrimitiveType};
use std::sync::Arc;

/// What a callable parameter accepts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeclaredType {
    /// A catalog entity set, found by the parameter name
    EntitySet,
    /// The current request
    Transaction,
    /// An entity; the type is given explicitly or found in the catalog by
    /// the parameter name
    Entity(Option<String>),
    /// A typed Edm value
    Primitive(PrimitiveType),
    /// An untyped native value
    Value(NativeType),
}

/// One formal parameter of a callable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parameter {
    name: String,
    declared: DeclaredType,
    nullable: bool,
}

impl Parameter {
    pub fn new(name: impl Into<String>, declared: DeclaredType) -> Self {
        Self {
            name: name.into(),
            declared,
            nullable: false,
        }
    }

    pub fn primitive(name: impl Into<String>, primitive_type: PrimitiveType) -> Self {
        Self::new(name, DeclaredType::Primitive(primitive_type))
    }

    pub fn value(name: impl Into<String>, native_type: NativeType) -> Self {
        Self::new(name, DeclaredType::Value(native_type))
    }

    /// An entity whose type is the catalog entity type named like the parameter
    pub fn entity(name: impl Into<String>) -> Self {
        Self::new(name, DeclaredType::Entity(None))
    }

    pub fn entity_of(name: impl Into<String>, entity_type: impl Into<String>) -> Self {
        Self::new(name, DeclaredType::Entity(Some(entity_type.into())))
    }

    /// The catalog entity set named like the parameter
    pub fn entity_set(name: impl Into<String>) -> Self {
        Self::new(name, DeclaredType::EntitySet)
    }

    pub fn transaction(name: impl Into<String>) -> Self {
        Self::new(name, DeclaredType::Transaction)
    }

    /// Allow null to be passed
    #[must_use]
    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn declared(&self) -> &DeclaredType {
        &self.declared
    }

    pub fn is_nullable(&self) -> bool {
        self.nullable
    }
}

/// Declared return kind of a callable
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReturnKind {
    Primitive(PrimitiveType),
    Value(NativeType),
    Entity,
    EntitySet,
    Array,
}

/// Return declaration of a callable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CallableReturn {
    /// Nothing declared; treated as nullable void
    #[default]
    Undeclared,
    Void,
    Declared { kind: ReturnKind, nullable: bool },
}

impl CallableReturn {
    pub fn primitive(primitive_type: PrimitiveType) -> Self {
        Self::declared(ReturnKind::Primitive(primitive_type))
    }

    pub fn value(native_type: NativeType) -> Self {
        Self::declared(ReturnKind::Value(native_type))
    }

    pub fn entity() -> Self {
        Self::declared(ReturnKind::Entity)
    }

    pub fn entity_set() -> Self {
        Self::declared(ReturnKind::EntitySet)
    }

    pub fn array() -> Self {
        Self::declared(ReturnKind::Array)
    }

    fn declared(kind: ReturnKind) -> Self {
        Self::Declared {
            kind,
            nullable: false,
        }
    }

    /// Allow null to be returned; no effect on void or undeclared returns
    #[must_use]
    pub fn nullable(self) -> Self {
        match self {
            Self::Declared { kind, .. } => Self::Declared {
                kind,
                nullable: true,
            },
            other => other,
        }
    }

    pub fn kind(&self) -> Option<ReturnKind> {
        match self {
            Self::Declared { kind, .. } => Some(*kind),
            _ => None,
        }
    }

    pub fn is_nullable(&self) -> bool {
        match self {
            Self::Undeclared | Self::Void => true,
            Self::Declared { nullable, .. } => *nullable,
        }
    }

    pub fn returns_collection(&self) -> bool {
        matches!(
            self.kind(),
            Some(ReturnKind::Array) | Some(ReturnKind::EntitySet)
        )
    }

    /// Name of the declared return type; undeclared reads as `void`
    pub fn type_name(&self) -> String {
        match self.kind() {
            None => "void".to_string(),
            Some(ReturnKind::Primitive(ty)) => ty.identifier().to_string(),
            Some(ReturnKind::Value(ty)) => ty.name().to_string(),
            Some(ReturnKind::Entity) => "Entity".to_string(),
            Some(ReturnKind::EntitySet) => "EntitySet".to_string(),
            Some(ReturnKind::Array) => "array".to_string(),
        }
    }
}

/// Protocol-level type of an operation's result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReturnType {
    Entity(Arc<EntityType>),
    Primitive(PrimitiveType),
}

impl ReturnType {
    pub fn identifier(&self) -> &str {
        match self {
            Self::Entity(entity_type) => entity_type.name(),
            Self::Primitive(primitive_type) => primitive_type.identifier(),
        }
    }
}
