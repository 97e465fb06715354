use super::OperationInvocation;
use super::argument::ArgumentSource;
use crate::catalog::Catalog;
use crate::error::{ODataError, ODataResult};
use crate::gate::{AccessControl, Gate};
use crate::pipe::PipeValue;
use http::Method;

/// Functions are addressed with GET, take their arguments from the inline
/// parameters and must always produce a result.
pub(super) fn execute(
    invocation: &OperationInvocation,
    catalog: &Catalog,
    access: &AccessControl,
) -> ODataResult<Option<PipeValue>> {
    let transaction = invocation.transaction();
    transaction.assert_method(Method::GET, "This operation must be addressed with a GET request")?;

    let client = invocation
        .inline_parameters()
        .iter()
        .map(|(name, literal)| (name.clone(), ArgumentSource::Literal(literal.clone())))
        .collect();
    let arguments = invocation.parse_client_arguments(client, catalog)?;

    let template = invocation.template();
    Gate::execute(template, transaction, &arguments).ensure(access)?;

    let result = template.invoke(arguments)?;
    if result.is_none() {
        return Err(ODataError::internal(
            "missing_function_result",
            "Function is required to return a result",
        ));
    }

    invocation.return_result(result)
}
