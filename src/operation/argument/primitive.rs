use super::{ArgumentSource, invalid_bound_argument};
use crate::error::{ODataError, ODataResult};
use crate::pipe::PipeValue;
use crate::primitive::{Primitive, PrimitiveType};

/// An Edm-typed argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrimitiveArgument {
    name: String,
    primitive_type: PrimitiveType,
    nullable: bool,
}

impl PrimitiveArgument {
    pub fn new(name: impl Into<String>, primitive_type: PrimitiveType, nullable: bool) -> Self {
        Self {
            name: name.into(),
            primitive_type,
            nullable,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn primitive_type(&self) -> PrimitiveType {
        self.primitive_type
    }

    pub fn is_nullable(&self) -> bool {
        self.nullable
    }

    /// Typed primitives pass through unchanged; everything else is read as
    /// the declared type.
    pub fn generate(&self, source: ArgumentSource) -> ODataResult<Primitive> {
        generate_typed(&self.name, self.primitive_type, self.nullable, source)
    }
}

pub(super) fn generate_typed(
    name: &str,
    primitive_type: PrimitiveType,
    nullable: bool,
    source: ArgumentSource,
) -> ODataResult<Primitive> {
    let invalid_type = || {
        ODataError::bad_request(
            "invalid_argument_type",
            format!(
                "The provided argument {} was not of type {}",
                name,
                primitive_type.identifier()
            ),
        )
    };

    let value = match source {
        ArgumentSource::Bound(PipeValue::Primitive(value)) => return Ok(value),
        ArgumentSource::Bound(PipeValue::PropertyValue(value)) => return Ok(value.into_value()),
        ArgumentSource::Bound(_) => return Err(invalid_bound_argument()),
        ArgumentSource::Null | ArgumentSource::Json(serde_json::Value::Null) => {
            primitive_type.null()
        }
        ArgumentSource::Literal(text) => primitive_type
            .parse_literal(&text)
            .map_err(|_| invalid_type())?,
        ArgumentSource::Json(json) => primitive_type.from_json(&json).map_err(|_| invalid_type())?,
        ArgumentSource::Transaction(_) => return Err(invalid_type()),
    };

    if value.is_null() && !nullable {
        return Err(ODataError::bad_request(
            "non_null_argument_missing",
            format!("A non-null argument ({name}) is missing"),
        ));
    }
    Ok(value)
}
