use super::{PipeContext, PipeValue, Resolution, Segment, SegmentResolver};
use crate::error::{ODataError, ODataResult};
use async_trait::async_trait;

/// `$value`: the raw form of a primitive.
#[derive(Debug, Clone, Copy, Default)]
pub struct RawValueResolver;

#[async_trait]
impl SegmentResolver for RawValueResolver {
    async fn resolve(
        &self,
        _context: &PipeContext,
        segment: &Segment<'_>,
        bound: Option<&PipeValue>,
    ) -> ODataResult<Resolution<Option<PipeValue>>> {
        if segment.text() != "$value" {
            return Ok(Resolution::NotHandled);
        }

        let primitive = match bound {
            Some(PipeValue::Primitive(primitive)) => primitive.clone(),
            Some(PipeValue::PropertyValue(property)) => property.value().clone(),
            Some(other) => {
                return Err(ODataError::bad_request(
                    "bad_raw_value",
                    format!("The raw value of a {} cannot be requested", other.describe()),
                ));
            }
            None => return Ok(Resolution::NotHandled),
        };

        if !segment.is_last() {
            return Err(ODataError::bad_request(
                "raw_value_not_terminal",
                "The $value segment must be the last segment of the path",
            ));
        }

        Ok(Resolution::Handled(Some(PipeValue::Raw(primitive))))
    }
}
