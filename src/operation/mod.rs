//! Callable operations.
//!
//! An [`OperationTemplate`] is registered once in the catalog and never
//! changes afterwards. Each request that addresses it creates its own
//! [`OperationInvocation`] carrying the transaction, the bound value from
//! the previous path segment and the inline parameters; the template is
//! only ever read.
//!
//! ```rust
//! use odata_server::operation::{CallableReturn, OperationTemplate, Parameter};
//! use odata_server::primitive::{Primitive, PrimitiveType};
//!
//! let add = OperationTemplate::function("add")
//!     .parameter(Parameter::primitive("a", PrimitiveType::Int32))
//!     .parameter(Parameter::primitive("b", PrimitiveType::Int32))
//!     .returns(CallableReturn::primitive(PrimitiveType::Int32))
//!     .callable(|arguments| {
//!         let sum = arguments.int("a")? + arguments.int("b")?;
//!         Ok(Some(Primitive::Int32(sum as i32).into()))
//!     })
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(add.name(), "add");
//! assert_eq!(add.return_type().unwrap().identifier(), "Edm.Int32");
//! ```

mod action;
pub mod argument;
mod function;
pub(crate) mod invocation;
pub mod signature;

pub use argument::{Argument, ArgumentSource, ArgumentValue, Arguments};
pub use invocation::OperationInvocation;
pub use signature::{CallableReturn, DeclaredType, Parameter, ReturnKind, ReturnType};

use crate::error::{ODataError, ODataResult};
use crate::model::{Entity, EntitySet};
use crate::primitive::{NativeValue, Primitive};
use crate::transaction::Transaction;
use std::fmt;
use std::sync::Arc;

/// Action or function
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationKind {
    /// Invoked with POST, may have side effects, cannot be composed
    Action,
    /// Invoked with GET, composable
    Function,
}

impl OperationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Action => "Action",
            Self::Function => "Function",
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a callable hands back.
#[derive(Debug, Clone)]
pub enum ReturnValue {
    Primitive(Primitive),
    Native(NativeValue),
    Entity(Entity),
    EntitySet(EntitySet),
    Collection(Vec<Primitive>),
}

impl From<Primitive> for ReturnValue {
    fn from(value: Primitive) -> Self {
        Self::Primitive(value)
    }
}

impl From<NativeValue> for ReturnValue {
    fn from(value: NativeValue) -> Self {
        Self::Native(value)
    }
}

impl From<Entity> for ReturnValue {
    fn from(value: Entity) -> Self {
        Self::Entity(value)
    }
}

impl From<EntitySet> for ReturnValue {
    fn from(value: EntitySet) -> Self {
        Self::EntitySet(value)
    }
}

impl From<Vec<Primitive>> for ReturnValue {
    fn from(value: Vec<Primitive>) -> Self {
        Self::Collection(value)
    }
}

/// The function an operation runs. `Ok(None)` means void or null.
pub type Callable = Arc<dyn Fn(Arguments) -> ODataResult<Option<ReturnValue>> + Send + Sync>;

/// Immutable catalog entry for an action or function.
#[derive(Clone)]
pub struct OperationTemplate {
    name: String,
    kind: OperationKind,
    binding_parameter: Option<String>,
    return_type: Option<ReturnType>,
    parameters: Vec<Parameter>,
    callable_return: CallableReturn,
    arguments: Vec<Argument>,
    callable: Callable,
}

impl OperationTemplate {
    pub fn function(name: impl Into<String>) -> OperationBuilder {
        OperationBuilder::new(name, OperationKind::Function)
    }

    pub fn action(name: impl Into<String>) -> OperationBuilder {
        OperationBuilder::new(name, OperationKind::Action)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> OperationKind {
        self.kind
    }

    pub fn is_action(&self) -> bool {
        self.kind == OperationKind::Action
    }

    pub fn binding_parameter(&self) -> Option<&str> {
        self.binding_parameter.as_deref()
    }

    pub fn is_bound(&self) -> bool {
        self.binding_parameter.is_some()
    }

    pub fn parameters(&self) -> &[Parameter] {
        &self.parameters
    }

    /// Arguments classified from the declared parameters, in order
    pub fn arguments(&self) -> &[Argument] {
        &self.arguments
    }

    pub fn callable_return(&self) -> CallableReturn {
        self.callable_return
    }

    /// Protocol return type.
    ///
    /// An explicitly declared type wins; otherwise primitive and value
    /// returns give their Edm type.
    pub fn return_type(&self) -> Option<ReturnType> {
        if let Some(return_type) = &self.return_type {
            return Some(return_type.clone());
        }
        match self.callable_return.kind() {
            Some(ReturnKind::Primitive(primitive_type)) => Some(ReturnType::Primitive(primitive_type)),
            Some(ReturnKind::Value(native_type)) => {
                Some(ReturnType::Primitive(native_type.primitive_type()))
            }
            _ => None,
        }
    }

    pub fn is_nullable(&self) -> bool {
        self.callable_return.is_nullable()
    }

    pub fn returns_collection(&self) -> bool {
        self.callable_return.returns_collection()
    }

    pub fn callable_return_type(&self) -> String {
        self.callable_return.type_name()
    }

    /// Arguments exposed in service metadata.
    ///
    /// The binding parameter comes first. Only primitive arguments and the
    /// bound entity or entity set argument are included.
    pub fn metadata_arguments(&self) -> Vec<&Argument> {
        let binding = self.binding_parameter();
        let is_binding = |argument: &Argument| Some(argument.name()) == binding;

        let mut arguments: Vec<&Argument> = self
            .arguments
            .iter()
            .filter(|argument| match argument {
                Argument::Primitive(_) => true,
                Argument::Entity(_) | Argument::EntitySet(_) => is_binding(*argument),
                _ => false,
            })
            .collect();
        // stable: everything else keeps declaration order
        arguments.sort_by_key(|argument| !is_binding(*argument));
        arguments
    }

    /// Absolute URL of this operation below the service root
    pub fn resource_url(&self, transaction: &Transaction) -> String {
        format!("{}{}", transaction.service_root(), self.name)
    }

    /// Run the callable with already generated arguments
    pub fn invoke(&self, arguments: Arguments) -> ODataResult<Option<ReturnValue>> {
        (self.callable)(arguments)
    }
}

impl fmt::Debug for OperationTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OperationTemplate")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("binding_parameter", &self.binding_parameter)
            .field("return_type", &self.return_type)
            .field("parameters", &self.parameters)
            .field("callable_return", &self.callable_return)
            .finish_non_exhaustive()
    }
}

/// Registration-time builder for an [`OperationTemplate`].
pub struct OperationBuilder {
    name: String,
    kind: OperationKind,
    binding_parameter: Option<String>,
    return_type: Option<ReturnType>,
    parameters: Vec<Parameter>,
    callable_return: CallableReturn,
    callable: Option<Callable>,
}

impl OperationBuilder {
    fn new(name: impl Into<String>, kind: OperationKind) -> Self {
        Self {
            name: name.into(),
            kind,
            binding_parameter: None,
            return_type: None,
            parameters: Vec::new(),
            callable_return: CallableReturn::default(),
            callable: None,
        }
    }

    /// Declare the next positional parameter of the callable
    pub fn parameter(mut self, parameter: Parameter) -> Self {
        self.parameters.push(parameter);
        self
    }

    /// Name of the parameter filled by the previous path segment
    pub fn binding_parameter(mut self, name: impl Into<String>) -> Self {
        self.binding_parameter = Some(name.into());
        self
    }

    /// Declare what the callable returns
    pub fn returns(mut self, callable_return: CallableReturn) -> Self {
        self.callable_return = callable_return;
        self
    }

    /// Override the protocol return type, e.g. a specific entity type
    pub fn return_type(mut self, return_type: ReturnType) -> Self {
        self.return_type = Some(return_type);
        self
    }

    pub fn callable<F>(mut self, callable: F) -> Self
    where
        F: Fn(Arguments) -> ODataResult<Option<ReturnValue>> + Send + Sync + 'static,
    {
        self.callable = Some(Arc::new(callable));
        self
    }

    /// # Errors
    ///
    /// `InternalServerError("missing_callable")` without a callable and
    /// `InternalServerError("invalid_return_type")` when the declared return
    /// type contradicts the callable's return declaration.
    pub fn build(self) -> ODataResult<OperationTemplate> {
        let callable = self.callable.ok_or_else(|| {
            ODataError::internal(
                "missing_callable",
                format!("The operation '{}' has no callable", self.name),
            )
        })?;

        if let Some(return_type) = &self.return_type {
            Self::validate_return_type(&self.name, return_type, self.callable_return)?;
        }

        let arguments = self.parameters.iter().map(Argument::classify).collect();

        Ok(OperationTemplate {
            name: self.name,
            kind: self.kind,
            binding_parameter: self.binding_parameter,
            return_type: self.return_type,
            parameters: self.parameters,
            callable_return: self.callable_return,
            arguments,
            callable,
        })
    }

    fn validate_return_type(
        name: &str,
        return_type: &ReturnType,
        callable_return: CallableReturn,
    ) -> ODataResult<()> {
        let kind = callable_return.kind();
        let consistent = match return_type {
            ReturnType::Entity(_) => !matches!(
                (callable_return, kind),
                (CallableReturn::Void, _)
                    | (_, Some(ReturnKind::Primitive(_)))
                    | (_, Some(ReturnKind::Value(_)))
            ),
            ReturnType::Primitive(_) => !matches!(
                (callable_return, kind),
                (CallableReturn::Void, _)
                    | (_, Some(ReturnKind::Entity))
                    | (_, Some(ReturnKind::EntitySet))
            ),
        };

        if consistent {
            Ok(())
        } else {
            Err(ODataError::internal(
                "invalid_return_type",
                format!(
                    "The operation '{}' declares return type {} but its callable returns {}",
                    name,
                    return_type.identifier(),
                    callable_return.type_name()
                ),
            ))
        }
    }
}

impl fmt::Debug for OperationBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OperationBuilder")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("has_callable", &self.callable.is_some())
            .finish_non_exhaustive()
    }
}
