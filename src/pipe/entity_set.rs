use super::{PipeContext, PipeValue, Resolution, Segment, SegmentResolver};
use crate::error::{ODataError, ODataResult};
use crate::gate::{Gate, GateResource};
use crate::lexer::Lexer;
use async_trait::async_trait;

/// `flights` or `flights(1)` as the first segment of a path.
#[derive(Debug, Clone, Copy, Default)]
pub struct EntitySetResolver;

#[async_trait]
impl SegmentResolver for EntitySetResolver {
    async fn resolve(
        &self,
        context: &PipeContext,
        segment: &Segment<'_>,
        bound: Option<&PipeValue>,
    ) -> ODataResult<Resolution<Option<PipeValue>>> {
        if !segment.is_first() || bound.is_some() {
            return Ok(Resolution::NotHandled);
        }

        let mut lexer = Lexer::new(segment.text());
        let Ok(name) = lexer.identifier() else {
            return Ok(Resolution::NotHandled);
        };
        let Some(entity_set) = context.catalog().entity_set(&name) else {
            return Ok(Resolution::NotHandled);
        };

        let transaction = context.transaction();
        let predicate = lexer.key_predicate().map_err(|e| {
            ODataError::bad_request(
                "invalid_key",
                format!("The key predicate of '{name}' could not be read: {e}"),
            )
        })?;

        let Some(predicate) = predicate else {
            Gate::query(GateResource::EntitySet(entity_set), transaction).ensure(context.access())?;
            let entity_set = entity_set.with_transaction(transaction.clone());
            return Ok(Resolution::Handled(Some(PipeValue::EntitySet(entity_set))));
        };

        let key = entity_set.parse_key(&predicate)?;
        Gate::read(GateResource::EntitySet(entity_set), transaction).ensure(context.access())?;

        let entity = entity_set.read(&key).await?.ok_or_else(|| {
            ODataError::not_found(
                "entity_not_found",
                format!("The entity with key {key} was not found in '{name}'"),
            )
        })?;

        Ok(Resolution::Handled(Some(PipeValue::Entity(entity))))
    }
}
