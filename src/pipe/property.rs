use super::{PipeContext, PipeValue, Resolution, Segment, SegmentResolver};
use crate::error::ODataResult;
use crate::lexer::Lexer;
use async_trait::async_trait;

/// A declared property of the bound entity, e.g. `flights(1)/origin`.
#[derive(Debug, Clone, Copy, Default)]
pub struct PropertyResolver;

#[async_trait]
impl SegmentResolver for PropertyResolver {
    async fn resolve(
        &self,
        _context: &PipeContext,
        segment: &Segment<'_>,
        bound: Option<&PipeValue>,
    ) -> ODataResult<Resolution<Option<PipeValue>>> {
        let Some(PipeValue::Entity(entity)) = bound else {
            return Ok(Resolution::NotHandled);
        };

        let mut lexer = Lexer::new(segment.text());
        let name = match lexer.identifier() {
            Ok(name) if lexer.is_finished() => name,
            _ => return Ok(Resolution::NotHandled),
        };

        Ok(match entity.property_value(&name) {
            Some(property) => Resolution::Handled(Some(PipeValue::PropertyValue(property))),
            None => Resolution::NotHandled,
        })
    }
}
