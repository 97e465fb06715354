use super::OperationInvocation;
use super::argument::ArgumentSource;
use crate::catalog::Catalog;
use crate::error::{ODataError, ODataResult};
use crate::gate::{AccessControl, Gate};
use crate::pipe::PipeValue;
use crate::transaction::Transaction;
use http::Method;
use indexmap::IndexMap;
use log::debug;
use serde_json::Value;

/// Actions are addressed with POST and take their arguments from the members
/// of a JSON object body.
pub(super) fn execute(
    invocation: &OperationInvocation,
    catalog: &Catalog,
    access: &AccessControl,
) -> ODataResult<Option<PipeValue>> {
    let transaction = invocation.transaction();
    transaction.assert_method(Method::POST, "This operation must be addressed with a POST request")?;

    if transaction.has_body() {
        transaction.assert_content_type_json()?;
    }

    let client = client_arguments(transaction)?;
    let arguments = invocation.parse_client_arguments(client, catalog)?;

    let template = invocation.template();
    Gate::execute(template, transaction, &arguments).ensure(access)?;

    let result = template.invoke(arguments)?;

    if transaction.preference("return") == Some("minimal") {
        debug!(
            "Discarding result of '{}' for return=minimal (request: '{}')",
            template.name(),
            transaction.request_id()
        );
        transaction.preference_applied("return", "minimal");
        return Ok(None);
    }

    invocation.return_result(result)
}

fn client_arguments(transaction: &Transaction) -> ODataResult<IndexMap<String, ArgumentSource>> {
    match transaction.body()? {
        None => Ok(IndexMap::new()),
        Some(Value::Object(members)) => Ok(members
            .into_iter()
            .map(|(name, value)| (name, ArgumentSource::Json(value)))
            .collect()),
        Some(_) => Err(ODataError::bad_request(
            "invalid_action_arguments",
            "The arguments to the action were not correctly formed as an array",
        )),
    }
}
