use super::argument::{ArgumentSource, Arguments};
use super::{OperationKind, OperationTemplate, ReturnType, ReturnValue, action, function};
use crate::catalog::Catalog;
use crate::error::{ODataError, ODataResult};
use crate::gate::AccessControl;
use crate::pipe::PipeValue;
use crate::primitive::{NativeValue, Primitive, PrimitiveType};
use crate::transaction::Transaction;
use indexmap::IndexMap;
use log::{debug, info};
use std::sync::Arc;

/// One request's use of a catalog operation.
///
/// Owns everything that is specific to the request; the template is shared
/// and read-only.
#[derive(Debug, Clone)]
pub struct OperationInvocation {
    template: Arc<OperationTemplate>,
    transaction: Arc<Transaction>,
    bound: Option<PipeValue>,
    inline: IndexMap<String, String>,
}

impl OperationInvocation {
    pub fn new(template: Arc<OperationTemplate>, transaction: Arc<Transaction>) -> Self {
        Self {
            template,
            transaction,
            bound: None,
            inline: IndexMap::new(),
        }
    }

    /// Attach the value from the previous segment; a property value is
    /// unwrapped to its primitive
    pub fn with_bound_value(mut self, bound: Option<PipeValue>) -> Self {
        self.bound = bound.map(|value| match value {
            PipeValue::PropertyValue(property) => PipeValue::Primitive(property.into_value()),
            other => other,
        });
        self
    }

    /// Attach inline parameters; values are URL literals
    pub fn with_inline_parameters(mut self, inline: IndexMap<String, String>) -> Self {
        self.inline = inline;
        self
    }

    pub fn template(&self) -> &OperationTemplate {
        &self.template
    }

    pub fn transaction(&self) -> &Arc<Transaction> {
        &self.transaction
    }

    pub fn bound_value(&self) -> Option<&PipeValue> {
        self.bound.as_ref()
    }

    pub fn inline_parameters(&self) -> &IndexMap<String, String> {
        &self.inline
    }

    /// Run the operation and coerce its result.
    pub fn execute(
        &self,
        catalog: &Catalog,
        access: &AccessControl,
    ) -> ODataResult<Option<PipeValue>> {
        info!(
            "Executing {} '{}' (request: '{}')",
            self.template.kind(),
            self.template.name(),
            self.transaction.request_id()
        );

        match self.template.kind() {
            OperationKind::Action => action::execute(self, catalog, access),
            OperationKind::Function => function::execute(self, catalog, access),
        }
    }

    /// Generate one value per declared argument.
    ///
    /// The binding argument takes the bound value, entity set and
    /// transaction arguments take the transaction, everything else takes the
    /// matching client argument or nothing.
    pub(super) fn parse_client_arguments(
        &self,
        mut client: IndexMap<String, ArgumentSource>,
        catalog: &Catalog,
    ) -> ODataResult<Arguments> {
        let binding = self.template.binding_parameter();

        if let Some(name) = binding {
            if !self.template.arguments().iter().any(|argument| argument.name() == name) {
                return Err(ODataError::internal(
                    "missing_callable_binding_parameter",
                    format!("The provided callable did not have a argument named {name}"),
                ));
            }
        }

        let mut arguments = Arguments::new();
        for argument in self.template.arguments() {
            let source = if binding == Some(argument.name()) {
                let bound = self.bound.clone().ok_or_else(missing_bound_argument)?;
                argument.assert_valid_parameter(&bound)?;
                ArgumentSource::Bound(bound)
            } else if argument.is_structural() {
                ArgumentSource::Transaction(self.transaction.clone())
            } else {
                client
                    .shift_remove(argument.name())
                    .unwrap_or(ArgumentSource::Null)
            };

            let value = argument.generate(source, catalog)?;
            arguments.insert(argument.name(), value);
        }

        debug!(
            "Generated {} argument(s) for '{}' (request: '{}')",
            arguments.len(),
            self.template.name(),
            self.transaction.request_id()
        );
        Ok(arguments)
    }

    /// Enforce the declared return contract on a callable result.
    pub(super) fn return_result(
        &self,
        result: Option<ReturnValue>,
    ) -> ODataResult<Option<PipeValue>> {
        let Some(result) = result else {
            if self.template.is_nullable() {
                return Ok(None);
            }
            return Err(ODataError::internal(
                "invalid_null_returned",
                "The operation returned null but the result is not nullable",
            ));
        };

        let value = match (self.template.return_type(), result) {
            (Some(ReturnType::Entity(expected)), result) => {
                let actual = match &result {
                    ReturnValue::Entity(entity) => Some(entity.type_name()),
                    ReturnValue::EntitySet(entity_set) => Some(entity_set.entity_type().name()),
                    _ => None,
                };
                if actual != Some(expected.name()) {
                    return Err(ODataError::internal(
                        "invalid_entity_type_returned",
                        "The operation returned an entity type that did not match its defined type",
                    ));
                }
                into_pipe_value(result)?
            }
            (Some(ReturnType::Primitive(primitive_type)), ReturnValue::Native(native)) => {
                PipeValue::Primitive(native_instance(primitive_type, &native)?)
            }
            (_, result) => into_pipe_value(result)?,
        };

        Ok(Some(value))
    }
}

fn into_pipe_value(result: ReturnValue) -> ODataResult<PipeValue> {
    let value = match result {
        ReturnValue::Primitive(primitive) => PipeValue::Primitive(primitive),
        ReturnValue::Entity(entity) => PipeValue::Entity(entity),
        ReturnValue::EntitySet(entity_set) => PipeValue::EntitySet(entity_set),
        ReturnValue::Collection(values) => PipeValue::Collection(values),
        ReturnValue::Native(native) => {
            let primitive_type = native.native_type().primitive_type();
            PipeValue::Primitive(native_instance(primitive_type, &native)?)
        }
    };
    Ok(value)
}

fn native_instance(primitive_type: PrimitiveType, native: &NativeValue) -> ODataResult<Primitive> {
    primitive_type.instance(native).map_err(|e| {
        ODataError::internal(
            "invalid_value_returned",
            format!("The operation returned a value that was not {primitive_type}: {e}"),
        )
    })
}

pub(crate) fn missing_bound_argument() -> ODataError {
    ODataError::bad_request(
        "missing_bound_argument",
        "This operation is bound, but no bound argument was provided",
    )
}
