//! Capability checks.
//!
//! A [`Gate`] is a short-lived value describing one access attempt: which
//! resource, which kind of access, on behalf of which request and (for
//! operation execution) with which arguments. It is checked against the
//! service's [`AccessControl`] and then dropped.
//!
//! Read-only mode blocks everything except `read` and `query` access before
//! the policy is consulted. With authorization disabled the policy is never
//! consulted.

use crate::error::{ODataError, ODataResult};
use crate::model::{Entity, EntitySet};
use crate::operation::{Arguments, OperationTemplate};
use crate::transaction::Transaction;
use log::warn;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Kind of access being requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Access {
    Read,
    Create,
    Update,
    Delete,
    Query,
    Execute,
}

impl Access {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Read => "read",
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
            Self::Query => "query",
            Self::Execute => "execute",
        }
    }

    /// Whether this access is allowed in read-only mode
    pub fn is_read_only(&self) -> bool {
        matches!(self, Self::Read | Self::Query)
    }
}

impl FromStr for Access {
    type Err = ODataError;

    fn from_str(access: &str) -> Result<Self, Self::Err> {
        match access {
            "read" => Ok(Self::Read),
            "create" => Ok(Self::Create),
            "update" => Ok(Self::Update),
            "delete" => Ok(Self::Delete),
            "query" => Ok(Self::Query),
            "execute" => Ok(Self::Execute),
            _ => Err(ODataError::internal(
                "invalid_access",
                "The access type requested is not valid",
            )),
        }
    }
}

impl fmt::Display for Access {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The resource an access attempt targets
#[derive(Debug, Clone, Copy)]
pub enum GateResource<'a> {
    EntitySet(&'a EntitySet),
    Entity(&'a Entity),
    Operation(&'a OperationTemplate),
}

impl GateResource<'_> {
    pub fn name(&self) -> &str {
        match self {
            Self::EntitySet(entity_set) => entity_set.name(),
            Self::Entity(entity) => entity.type_name(),
            Self::Operation(operation) => operation.name(),
        }
    }
}

/// One access attempt.
#[derive(Debug, Clone, Copy)]
pub struct Gate<'a> {
    access: Access,
    resource: GateResource<'a>,
    transaction: &'a Transaction,
    arguments: Option<&'a Arguments>,
}

impl<'a> Gate<'a> {
    pub fn new(access: Access, resource: GateResource<'a>, transaction: &'a Transaction) -> Self {
        Self {
            access,
            resource,
            transaction,
            arguments: None,
        }
    }

    pub fn read(resource: GateResource<'a>, transaction: &'a Transaction) -> Self {
        Self::new(Access::Read, resource, transaction)
    }

    pub fn create(resource: GateResource<'a>, transaction: &'a Transaction) -> Self {
        Self::new(Access::Create, resource, transaction)
    }

    pub fn update(resource: GateResource<'a>, transaction: &'a Transaction) -> Self {
        Self::new(Access::Update, resource, transaction)
    }

    pub fn delete(resource: GateResource<'a>, transaction: &'a Transaction) -> Self {
        Self::new(Access::Delete, resource, transaction)
    }

    pub fn query(resource: GateResource<'a>, transaction: &'a Transaction) -> Self {
        Self::new(Access::Query, resource, transaction)
    }

    /// Execution of an operation with its generated arguments
    pub fn execute(
        operation: &'a OperationTemplate,
        transaction: &'a Transaction,
        arguments: &'a Arguments,
    ) -> Self {
        Self {
            arguments: Some(arguments),
            ..Self::new(Access::Execute, GateResource::Operation(operation), transaction)
        }
    }

    pub fn access(&self) -> Access {
        self.access
    }

    pub fn resource(&self) -> GateResource<'a> {
        self.resource
    }

    pub fn transaction(&self) -> &'a Transaction {
        self.transaction
    }

    pub fn arguments(&self) -> Option<&'a Arguments> {
        self.arguments
    }

    /// Whether `ensure` would succeed
    pub fn allows(&self, control: &AccessControl) -> bool {
        self.ensure(control).is_ok()
    }

    /// # Errors
    ///
    /// `Forbidden("forbidden")` in read-only mode for anything but read and
    /// query access, or when the policy denies the attempt.
    pub fn ensure(&self, control: &AccessControl) -> ODataResult<()> {
        if control.readonly && !self.access.is_read_only() {
            warn!(
                "Denied {} access to '{}' in read-only mode (request: '{}')",
                self.access,
                self.resource.name(),
                self.transaction.request_id()
            );
            return Err(ODataError::forbidden("forbidden", "This service is read-only"));
        }

        if !control.authorization {
            return Ok(());
        }

        if control.policy.denies(self) {
            warn!(
                "Policy denied {} access to '{}' (request: '{}')",
                self.access,
                self.resource.name(),
                self.transaction.request_id()
            );
            return Err(ODataError::forbidden("forbidden", "This request is not permitted"));
        }

        Ok(())
    }
}

/// Authorization backend consulted for every gate check.
pub trait GatePolicy: Send + Sync {
    fn denies(&self, gate: &Gate<'_>) -> bool;
}

impl<F> GatePolicy for F
where
    F: Fn(&Gate<'_>) -> bool + Send + Sync,
{
    fn denies(&self, gate: &Gate<'_>) -> bool {
        self(gate)
    }
}

/// Policy that never denies
#[derive(Debug, Clone, Copy, Default)]
pub struct AllowAll;

impl GatePolicy for AllowAll {
    fn denies(&self, _gate: &Gate<'_>) -> bool {
        false
    }
}

/// Service-wide access settings.
#[derive(Clone)]
pub struct AccessControl {
    readonly: bool,
    authorization: bool,
    policy: Arc<dyn GatePolicy>,
}

impl AccessControl {
    pub fn new(readonly: bool, authorization: bool, policy: Arc<dyn GatePolicy>) -> Self {
        Self {
            readonly,
            authorization,
            policy,
        }
    }

    /// Writable, authorization enabled, nothing denied
    pub fn permissive() -> Self {
        Self::new(false, true, Arc::new(AllowAll))
    }

    pub fn is_readonly(&self) -> bool {
        self.readonly
    }

    pub fn is_authorization_enabled(&self) -> bool {
        self.authorization
    }
}

impl Default for AccessControl {
    fn default() -> Self {
        Self::permissive()
    }
}

impl fmt::Debug for AccessControl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessControl")
            .field("readonly", &self.readonly)
            .field("authorization", &self.authorization)
            .finish_non_exhaustive()
    }
}
