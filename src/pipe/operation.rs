use super::{PipeContext, PipeValue, Resolution, Segment, SegmentResolver};
use crate::error::{ODataError, ODataResult};
use crate::lexer::Lexer;
use crate::operation::OperationInvocation;
use crate::operation::invocation::missing_bound_argument;
use async_trait::async_trait;
use indexmap::IndexMap;
use log::debug;

/// A catalog action or function, e.g. `increment` or `add(a=1,b=@b)`.
#[derive(Debug, Clone, Copy, Default)]
pub struct OperationResolver;

#[async_trait]
impl SegmentResolver for OperationResolver {
    async fn resolve(
        &self,
        context: &PipeContext,
        segment: &Segment<'_>,
        bound: Option<&PipeValue>,
    ) -> ODataResult<Resolution<Option<PipeValue>>> {
        let mut lexer = Lexer::new(segment.text());
        let Ok(name) = lexer.identifier() else {
            return Ok(Resolution::NotHandled);
        };
        let Some(template) = context.catalog().operation(&name) else {
            return Ok(Resolution::NotHandled);
        };

        if segment.next().is_some() && template.is_action() {
            return Err(ODataError::bad_request(
                "cannot_compose_action",
                "It is not permitted to further compose the result of an action",
            ));
        }

        if bound.is_none() && template.is_bound() {
            return Err(missing_bound_argument());
        }

        let parameters = lexer.operation_parameters().map_err(|e| {
            debug!("Inline parameters of '{}' rejected: {}", name, e);
            ODataError::bad_request(
                "invalid_arguments",
                "The arguments provided to the operation were not valid",
            )
        })?;

        let transaction = context.transaction();

        // an alias that is not supplied leaves its parameter without a value
        let mut inline: IndexMap<String, Option<String>> = parameters
            .into_iter()
            .map(|(key, value)| {
                let value = if value.starts_with('@') {
                    transaction.parameter_alias(&value).map(str::to_string)
                } else {
                    Some(value)
                };
                (key, value)
            })
            .collect();

        if segment.is_last() {
            for argument in template.arguments() {
                if inline.contains_key(argument.name()) {
                    continue;
                }
                if let Some(value) = transaction.implicit_parameter_alias(argument.name()) {
                    inline.insert(argument.name().to_string(), Some(value.to_string()));
                }
            }
        }

        let inline = inline
            .into_iter()
            .filter_map(|(key, value)| value.map(|value| (key, value)))
            .collect();

        let invocation = OperationInvocation::new(template.clone(), transaction.clone())
            .with_bound_value(bound.cloned())
            .with_inline_parameters(inline);

        invocation
            .execute(context.catalog(), context.access())
            .map(Resolution::Handled)
    }
}
