//! Path composition.
//!
//! A request path is evaluated one segment at a time. Each segment is
//! offered to a chain of [`SegmentResolver`]s together with the value the
//! previous segment produced; the first resolver that handles it produces
//! the value for the next segment. A resolver that does not recognise a
//! segment answers [`Resolution::NotHandled`] so the next one can try; only
//! when every resolver declines is the segment an error.

mod entity_set;
mod operation;
mod property;
mod value;

pub use entity_set::EntitySetResolver;
pub use operation::OperationResolver;
pub use property::PropertyResolver;
pub use value::RawValueResolver;

use crate::catalog::Catalog;
use crate::error::{ODataError, ODataResult};
use crate::gate::AccessControl;
use crate::model::{Entity, EntitySet, PropertyValue};
use crate::primitive::Primitive;
use crate::transaction::Transaction;
use async_trait::async_trait;
use log::debug;
use std::sync::Arc;

/// Value produced by a segment and consumed by the next one.
#[derive(Debug, Clone)]
pub enum PipeValue {
    Primitive(Primitive),
    PropertyValue(PropertyValue),
    Entity(Entity),
    EntitySet(EntitySet),
    Collection(Vec<Primitive>),
    /// Raw representation requested with `$value`
    Raw(Primitive),
}

impl PipeValue {
    pub fn describe(&self) -> &'static str {
        match self {
            Self::Primitive(_) => "primitive",
            Self::PropertyValue(_) => "property value",
            Self::Entity(_) => "entity",
            Self::EntitySet(_) => "entity set",
            Self::Collection(_) => "collection",
            Self::Raw(_) => "raw value",
        }
    }
}

/// Outcome of offering a segment to one resolver
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution<T> {
    Handled(T),
    NotHandled,
}

impl<T> Resolution<T> {
    pub fn is_handled(&self) -> bool {
        matches!(self, Self::Handled(_))
    }
}

/// Shared state for resolving one request's path.
#[derive(Debug, Clone)]
pub struct PipeContext {
    catalog: Arc<Catalog>,
    access: Arc<AccessControl>,
    transaction: Arc<Transaction>,
}

impl PipeContext {
    pub fn new(
        catalog: Arc<Catalog>,
        access: Arc<AccessControl>,
        transaction: Arc<Transaction>,
    ) -> Self {
        Self {
            catalog,
            access,
            transaction,
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn access(&self) -> &AccessControl {
        &self.access
    }

    pub fn transaction(&self) -> &Arc<Transaction> {
        &self.transaction
    }
}

/// One path segment in context
#[derive(Debug, Clone, Copy)]
pub struct Segment<'a> {
    text: &'a str,
    next: Option<&'a str>,
    index: usize,
}

impl<'a> Segment<'a> {
    pub fn new(text: &'a str, next: Option<&'a str>, index: usize) -> Self {
        Self { text, next, index }
    }

    pub fn text(&self) -> &'a str {
        self.text
    }

    /// The following segment, if this one is not the last
    pub fn next(&self) -> Option<&'a str> {
        self.next
    }

    pub fn is_first(&self) -> bool {
        self.index == 0
    }

    pub fn is_last(&self) -> bool {
        self.next.is_none()
    }
}

/// Resolves one kind of path segment.
#[async_trait]
pub trait SegmentResolver: Send + Sync {
    /// Resolve `segment` given the value of the previous segment.
    ///
    /// `Ok(Resolution::NotHandled)` passes the segment to the next resolver;
    /// errors end the request.
    async fn resolve(
        &self,
        context: &PipeContext,
        segment: &Segment<'_>,
        bound: Option<&PipeValue>,
    ) -> ODataResult<Resolution<Option<PipeValue>>>;
}

/// Ordered resolver chain applied to every segment of a path.
pub struct PathResolver {
    resolvers: Vec<Box<dyn SegmentResolver>>,
}

impl PathResolver {
    pub fn new(resolvers: Vec<Box<dyn SegmentResolver>>) -> Self {
        Self { resolvers }
    }

    /// Evaluate the transaction's path; `None` is an empty result
    pub async fn resolve(&self, context: &PipeContext) -> ODataResult<Option<PipeValue>> {
        let segments = context.transaction().segments();
        let mut bound: Option<PipeValue> = None;

        for (index, text) in segments.iter().enumerate() {
            let next = segments.get(index + 1).map(String::as_str);
            let segment = Segment::new(text, next, index);
            bound = self.resolve_segment(context, &segment, bound.as_ref()).await?;
        }

        Ok(bound)
    }

    async fn resolve_segment(
        &self,
        context: &PipeContext,
        segment: &Segment<'_>,
        bound: Option<&PipeValue>,
    ) -> ODataResult<Option<PipeValue>> {
        for resolver in &self.resolvers {
            if let Resolution::Handled(value) = resolver.resolve(context, segment, bound).await? {
                debug!(
                    "Resolved segment '{}' to {} (request: '{}')",
                    segment.text(),
                    value.as_ref().map_or("nothing", PipeValue::describe),
                    context.transaction().request_id()
                );
                return Ok(value);
            }
        }

        Err(ODataError::not_found(
            "no_handler",
            format!("No route to the path segment '{}'", segment.text()),
        ))
    }
}

impl Default for PathResolver {
    /// Entity sets, then operations, then properties, then `$value`
    fn default() -> Self {
        Self::new(vec![
            Box::new(EntitySetResolver),
            Box::new(OperationResolver),
            Box::new(PropertyResolver),
            Box::new(RawValueResolver),
        ])
    }
}

impl std::fmt::Debug for PathResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PathResolver")
            .field("resolvers", &self.resolvers.len())
            .finish()
    }
}
