//! Domain conversion seam between host values and interchange objects

use super::value::Value;

/// Converts host-native values into interchange values.
///
/// Implemented per host; the engine only asks whether a value is convertible and then converts it.
pub trait DomainConverter {
    fn can_convert(&self, value: &Value) -> bool;

    /// Convert a value previously accepted by [`DomainConverter::can_convert`]
    fn convert(&self, value: &Value) -> Result<Value, String>;
}

/// Converter for hosts with no native types of their own
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopConverter;

impl DomainConverter for NoopConverter {
    fn can_convert(&self, _value: &Value) -> bool {
        false
    }

    fn convert(&self, value: &Value) -> Result<Value, String> {
        Err(format!("no converter for {}", value.type_name()))
    }
}

/// Best-effort conversion of a free-form input value.
///
/// Holders are unwrapped, scalars and interchange objects pass through, convertible host values
/// are converted, everything else becomes `Null`.
pub fn try_convert_item(value: Value, converter: &dyn DomainConverter) -> Value {
    let value = value.unwrap_host();
    if value.is_null() || value.is_scalar() {
        return value;
    }

    if converter.can_convert(&value) {
        return converter.convert(&value).unwrap_or_else(|err| {
            log::warn!("Free-form value of type {} failed to convert: {}", value.type_name(), err);
            Value::Null
        });
    }

    match value {
        Value::Object(_) => value,
        other => {
            log::debug!("Dropping unconvertible free-form value of type {}", other.type_name());
            Value::Null
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Base, HostObject};

    struct PointConverter;

    impl DomainConverter for PointConverter {
        fn can_convert(&self, value: &Value) -> bool {
            matches!(value, Value::Host(h) if h.type_name == "Host.Point")
        }

        fn convert(&self, _value: &Value) -> Result<Value, String> {
            Ok(Value::Object(Base::new("Objects.Geometry.Point")))
        }
    }

    #[test]
    fn test_try_convert_item_cases() {
        let converter = PointConverter;
        assert_eq!(try_convert_item(Value::Null, &converter), Value::Null);
        assert_eq!(
            try_convert_item(Value::wrapped(Value::Float(2.5)), &converter),
            Value::Float(2.5)
        );

        let converted = try_convert_item(Value::Host(HostObject::new("Host.Point")), &converter);
        assert_eq!(
            converted.as_object().map(|b| b.type_name().to_string()),
            Some("Objects.Geometry.Point".into())
        );

        let object = Value::Object(Base::new("Objects.Other.Tag"));
        assert_eq!(try_convert_item(object.clone(), &converter), object);

        let unknown = Value::Host(HostObject::new("Host.Mesh"));
        assert_eq!(try_convert_item(unknown, &converter), Value::Null);
        assert_eq!(try_convert_item(Value::List(vec![]), &NoopConverter), Value::Null);
    }
}
