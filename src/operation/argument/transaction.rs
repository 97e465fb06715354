use super::ArgumentSource;
use crate::error::{ODataError, ODataResult};
use crate::transaction::Transaction;
use std::sync::Arc;

/// Gives the callable access to the current request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionArgument {
    name: String,
}

impl TransactionArgument {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn generate(&self, source: ArgumentSource) -> ODataResult<Arc<Transaction>> {
        match source {
            ArgumentSource::Transaction(transaction) => Ok(transaction),
            other => Err(ODataError::internal(
                "invalid_transaction",
                format!(
                    "The argument {} expected a transaction but was given a {}",
                    self.name,
                    other.describe()
                ),
            )),
        }
    }
}
