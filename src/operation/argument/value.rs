use super::ArgumentSource;
use super::primitive::generate_typed;
use crate::error::{ODataError, ODataResult};
use crate::pipe::PipeValue;
use crate::primitive::{NativeType, NativeValue, Primitive};

/// A generic argument handed to the callable as a native value.
///
/// Sources are read as the Edm type matching the native type and then
/// unwrapped, so a callable declaring an `int` parameter always receives an
/// integer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValueArgument {
    name: String,
    native_type: NativeType,
    nullable: bool,
}

impl ValueArgument {
    pub fn new(name: impl Into<String>, native_type: NativeType, nullable: bool) -> Self {
        Self {
            name: name.into(),
            native_type,
            nullable,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn native_type(&self) -> NativeType {
        self.native_type
    }

    pub fn is_nullable(&self) -> bool {
        self.nullable
    }

    pub fn generate(&self, source: ArgumentSource) -> ODataResult<Option<NativeValue>> {
        let primitive_type = self.native_type.primitive_type();

        // typed values are coerced rather than passed through
        let source = match source {
            ArgumentSource::Bound(PipeValue::Primitive(value)) => self.coerce(value)?,
            ArgumentSource::Bound(PipeValue::PropertyValue(value)) => {
                self.coerce(value.into_value())?
            }
            other => other,
        };

        let primitive = generate_typed(&self.name, primitive_type, self.nullable, source)?;
        Ok(primitive.into_native())
    }

    fn coerce(&self, value: Primitive) -> ODataResult<ArgumentSource> {
        if value.is_null() {
            return Ok(ArgumentSource::Null);
        }
        let primitive_type = self.native_type.primitive_type();
        primitive_type
            .from_json(&value.to_json())
            .map(|coerced| ArgumentSource::Bound(PipeValue::Primitive(coerced)))
            .map_err(|_| {
                ODataError::bad_request(
                    "invalid_argument_type",
                    format!(
                        "The provided argument {} was not of type {}",
                        self.name,
                        primitive_type.identifier()
                    ),
                )
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_literals_become_native() {
        let argument = ValueArgument::new("i", NativeType::Int, false);
        assert_eq!(
            argument.generate(ArgumentSource::Literal("41".to_string())).unwrap(),
            Some(NativeValue::Int(41))
        );

        let text = ValueArgument::new("s", NativeType::String, false);
        assert_eq!(
            text.generate(ArgumentSource::Literal("'hello world'".to_string())).unwrap(),
            Some(NativeValue::String("hello world".to_string()))
        );
    }

    #[test]
    fn test_bound_primitives_are_coerced() {
        let argument = ValueArgument::new("i", NativeType::Int, false);
        assert_eq!(
            argument
                .generate(ArgumentSource::Bound(PipeValue::Primitive(Primitive::Int32(1))))
                .unwrap(),
            Some(NativeValue::Int(1))
        );

        let error = argument
            .generate(ArgumentSource::Bound(PipeValue::Primitive(Primitive::from("x"))))
            .unwrap_err();
        assert_eq!(error.code(), "invalid_argument_type");
    }

    #[test]
    fn test_nullable_values() {
        let nullable = ValueArgument::new("arg", NativeType::Bool, true);
        assert_eq!(nullable.generate(ArgumentSource::Null).unwrap(), None);

        let required = ValueArgument::new("arg", NativeType::Bool, false);
        assert_eq!(
            required.generate(ArgumentSource::Null).unwrap_err().code(),
            "non_null_argument_missing"
        );
    }
}
