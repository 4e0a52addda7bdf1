//! Value coercion pipeline: raw slot values to template parameter types
//!
//! Stages run in order and each either finishes the conversion, passes to the next stage,
//! or fails the whole evaluation:
//!
//! 1. null passes through
//! 2. values already assignable pass through unchanged
//! 3. enumerated choices parse from the value's text (failures fall through)
//! 4. primitive scalars convert generically (failures are fatal)
//! 5. the domain converter handles host values (failures are fatal)
//! 6. registered object casts (failures fall through)

use crate::error::ConversionError;
use crate::model::{CastTable, DomainConverter, TypeTag, Value};
use log::{debug, warn};

/// Result of one coercion stage
#[derive(Debug, Clone, PartialEq)]
pub enum StageOutcome {
    Done(Value),
    Next,
    Fail(ConversionError),
}

type Stage = fn(&Coercer<'_>, &Value, &TypeTag, &str) -> StageOutcome;

const STAGES: [(&str, Stage); 6] = [
    ("null", null_passthrough),
    ("assignable", assignable),
    ("enum", enum_parse),
    ("primitive", primitive),
    ("domain", domain),
    ("cast", explicit_cast),
];

/// Coerces raw values using a host's domain converter and cast table
pub struct Coercer<'a> {
    converter: &'a dyn DomainConverter,
    casts: &'a CastTable,
}

impl<'a> Coercer<'a> {
    pub fn new(converter: &'a dyn DomainConverter, casts: &'a CastTable) -> Self {
        Self { converter, casts }
    }

    /// Coerce one value to `target` for the slot named `slot`
    pub fn coerce(&self, raw: &Value, target: &TypeTag, slot: &str) -> Result<Value, ConversionError> {
        for (name, stage) in STAGES.iter() {
            match stage(self, raw, target, slot) {
                StageOutcome::Done(value) => {
                    debug!("Coerced `{}` ({} -> {}) at stage {}", slot, raw.type_name(), target, name);
                    return Ok(value);
                }
                StageOutcome::Fail(err) => return Err(err),
                StageOutcome::Next => {}
            }
        }

        Err(ConversionError::Unconvertible {
            from: raw.type_name(),
            to: target.to_string(),
            slot: slot.to_string(),
        })
    }

    /// Coerce every element of a collection input against the collection's element type.
    /// Host holders are unwrapped per element.
    pub fn coerce_list(
        &self,
        items: Vec<Value>,
        target: &TypeTag,
        slot: &str,
    ) -> Result<Value, ConversionError> {
        let element = target.element_type();
        items
            .into_iter()
            .map(|item| self.coerce(&item.unwrap_host(), element, slot))
            .collect::<Result<Vec<_>, _>>()
            .map(Value::List)
    }
}

fn null_passthrough(_: &Coercer<'_>, raw: &Value, _: &TypeTag, _: &str) -> StageOutcome {
    if raw.is_null() {
        StageOutcome::Done(Value::Null)
    } else {
        StageOutcome::Next
    }
}

fn assignable(_: &Coercer<'_>, raw: &Value, target: &TypeTag, _: &str) -> StageOutcome {
    if raw.is_assignable_to(target) {
        StageOutcome::Done(raw.clone())
    } else {
        StageOutcome::Next
    }
}

fn enum_parse(_: &Coercer<'_>, raw: &Value, target: &TypeTag, slot: &str) -> StageOutcome {
    let Some(enum_type) = target.as_enum() else {
        return StageOutcome::Next;
    };
    match raw.to_text().and_then(|text| enum_type.parse(&text)) {
        Some(member) => StageOutcome::Done(Value::Enum(member)),
        None => {
            warn!(
                "`{}`: {} is not a member of {}",
                slot,
                raw,
                enum_type.full_name
            );
            StageOutcome::Next
        }
    }
}

fn primitive(_: &Coercer<'_>, raw: &Value, target: &TypeTag, slot: &str) -> StageOutcome {
    if !raw.is_scalar() {
        return StageOutcome::Next;
    }
    match convert_primitive(raw, target) {
        Ok(value) => StageOutcome::Done(value),
        Err(reason) => StageOutcome::Fail(ConversionError::Incompatible {
            from: raw.type_name(),
            to: target.to_string(),
            slot: slot.to_string(),
            reason,
        }),
    }
}

fn domain(coercer: &Coercer<'_>, raw: &Value, target: &TypeTag, slot: &str) -> StageOutcome {
    if !coercer.converter.can_convert(raw) {
        return StageOutcome::Next;
    }
    let delegate_error = |message: String| ConversionError::Delegate {
        from: raw.type_name(),
        to: target.to_string(),
        slot: slot.to_string(),
        message,
    };

    let converted = match coercer.converter.convert(raw) {
        Ok(converted) => converted,
        Err(message) => return StageOutcome::Fail(delegate_error(message)),
    };
    if converted.is_assignable_to(target) {
        return StageOutcome::Done(converted);
    }

    if converted.is_scalar() {
        return match convert_primitive(&converted, target) {
            Ok(value) => StageOutcome::Done(value),
            Err(reason) => StageOutcome::Fail(delegate_error(reason)),
        };
    }
    match coercer.casts.cast(&converted, target) {
        Some(value) => StageOutcome::Done(value),
        None => StageOutcome::Fail(delegate_error(format!(
            "converted value is a {}",
            converted.type_name()
        ))),
    }
}

fn explicit_cast(coercer: &Coercer<'_>, raw: &Value, target: &TypeTag, slot: &str) -> StageOutcome {
    match coercer.casts.cast(raw, target) {
        Some(value) => StageOutcome::Done(value),
        None => {
            debug!("`{}`: no cast from {} to {}", slot, raw.type_name(), target);
            StageOutcome::Next
        }
    }
}

/// Generic conversion between primitive scalars
pub fn convert_primitive(value: &Value, target: &TypeTag) -> Result<Value, String> {
    match target.resolved() {
        TypeTag::Any => Ok(value.clone()),
        TypeTag::Text => value
            .to_text()
            .map(Value::Text)
            .ok_or_else(|| format!("{} has no text form", value.type_name())),
        TypeTag::Int => to_int(value).map(Value::Int),
        TypeTag::Float => to_float(value).map(Value::Float),
        TypeTag::Bool => to_bool(value).map(Value::Bool),
        TypeTag::Char => to_char(value).map(Value::Char),
        TypeTag::Enum(enum_type) => Err(format!("not a member of {}", enum_type.full_name)),
        other => Err(format!("{} is not a primitive type", other)),
    }
}

fn to_int(value: &Value) -> Result<i64, String> {
    match value {
        Value::Bool(v) => Ok(i64::from(*v)),
        Value::Int(v) => Ok(*v),
        Value::Float(v) => {
            let rounded = v.round_ties_even();
            if !rounded.is_finite() || rounded < i64::MIN as f64 || rounded >= i64::MAX as f64 {
                return Err(format!("{} is out of range", v));
            }
            Ok(rounded as i64)
        }
        Value::Char(v) => Ok(i64::from(u32::from(*v))),
        Value::Text(v) => v.trim().parse::<i64>().map_err(|e| e.to_string()),
        Value::Enum(v) => Ok(v.value),
        other => Err(format!("{} is not a number", other.type_name())),
    }
}

fn to_float(value: &Value) -> Result<f64, String> {
    match value {
        Value::Bool(v) => Ok(if *v { 1.0 } else { 0.0 }),
        Value::Int(v) => Ok(*v as f64),
        Value::Float(v) => Ok(*v),
        Value::Text(v) => v.trim().parse::<f64>().map_err(|e| e.to_string()),
        Value::Enum(v) => Ok(v.value as f64),
        other => Err(format!("{} is not a number", other.type_name())),
    }
}

fn to_bool(value: &Value) -> Result<bool, String> {
    match value {
        Value::Bool(v) => Ok(*v),
        Value::Int(v) => Ok(*v != 0),
        Value::Float(v) => Ok(*v != 0.0),
        Value::Text(v) => {
            let text = v.trim();
            if text.eq_ignore_ascii_case("true") {
                Ok(true)
            } else if text.eq_ignore_ascii_case("false") {
                Ok(false)
            } else {
                Err(format!("'{}' is not a boolean", v))
            }
        }
        other => Err(format!("{} is not a boolean", other.type_name())),
    }
}

fn to_char(value: &Value) -> Result<char, String> {
    match value {
        Value::Char(v) => Ok(*v),
        Value::Int(v) => u32::try_from(*v)
            .ok()
            .and_then(char::from_u32)
            .ok_or_else(|| format!("{} is not a character code", v)),
        Value::Text(v) => {
            let mut chars = v.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => Ok(c),
                _ => Err(format!("'{}' is not a single character", v)),
            }
        }
        other => Err(format!("{} is not a character", other.type_name())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kit::{self, geometry, host};
    use crate::model::{HostObject, NoopConverter};

    fn coerce(raw: Value, target: TypeTag) -> Result<Value, ConversionError> {
        let converter = host::HostConverter;
        let casts = kit::casts();
        Coercer::new(&converter, &casts).coerce(&raw, &target, "slot")
    }

    #[test]
    fn test_null_and_assignable_pass_through() {
        assert_eq!(coerce(Value::Null, TypeTag::Int), Ok(Value::Null));
        assert_eq!(coerce(Value::Float(1.5), TypeTag::Float), Ok(Value::Float(1.5)));
        let point = Value::Object(geometry::point(1.0, 2.0, 3.0));
        assert_eq!(coerce(point.clone(), TypeTag::object("Base")), Ok(point));
    }

    #[test]
    fn test_text_to_number() {
        assert_eq!(coerce(Value::text("2.5"), TypeTag::Float), Ok(Value::Float(2.5)));
        assert_eq!(coerce(Value::text(" 7 "), TypeTag::Int), Ok(Value::Int(7)));

        let err = coerce(Value::text("abc"), TypeTag::Int).unwrap_err();
        assert!(matches!(err, ConversionError::Incompatible { .. }));
        assert_eq!(err.type_pair(), ("Text", "Int"));
        assert_eq!(err.slot(), "slot");
    }

    #[test]
    fn test_float_to_int_rounds_half_to_even() {
        assert_eq!(coerce(Value::Float(2.5), TypeTag::Int), Ok(Value::Int(2)));
        assert_eq!(coerce(Value::Float(3.5), TypeTag::Int), Ok(Value::Int(4)));
        assert_eq!(coerce(Value::Float(-0.4), TypeTag::Int), Ok(Value::Int(0)));
        assert!(coerce(Value::Float(f64::NAN), TypeTag::Int).is_err());
        assert!(coerce(Value::Float(1e30), TypeTag::Int).is_err());
    }

    #[test]
    fn test_bool_and_char_conversions() {
        assert_eq!(coerce(Value::Int(5), TypeTag::Bool), Ok(Value::Bool(true)));
        assert_eq!(coerce(Value::text("FALSE"), TypeTag::Bool), Ok(Value::Bool(false)));
        assert!(coerce(Value::text("yes"), TypeTag::Bool).is_err());
        assert_eq!(coerce(Value::text("x"), TypeTag::Char), Ok(Value::Char('x')));
        assert!(coerce(Value::text("xy"), TypeTag::Char).is_err());
        assert_eq!(coerce(Value::Int(3), TypeTag::Text), Ok(Value::text("3")));
        assert_eq!(
            coerce(Value::Float(4.0), TypeTag::nullable(TypeTag::Int)),
            Ok(Value::Int(4))
        );
    }

    #[test]
    fn test_enum_from_name_and_number() {
        let target = TypeTag::Enum(kit::elements::LOCATION_LINE.clone());
        let by_name = coerce(Value::text("Exterior"), target.clone()).unwrap();
        assert!(matches!(by_name, Value::Enum(ref v) if v.value == 1));

        let by_value = coerce(Value::Int(3), target.clone()).unwrap();
        assert!(matches!(by_value, Value::Enum(ref v) if v.member == "CoreCenterline"));

        let err = coerce(Value::text("Sideways"), target).unwrap_err();
        assert!(matches!(err, ConversionError::Incompatible { .. }));
    }

    #[test]
    fn test_domain_conversion() {
        let converted = coerce(host::host_point(1.0, 2.0, 3.0), TypeTag::object(geometry::POINT_TYPE)).unwrap();
        assert_eq!(converted.as_object().and_then(|p| p.get_f64("y")), Some(2.0));

        // Host polyline converts to a Polyline, then the registered cast makes it a Polycurve
        let polyline = host::host_polyline(&[(0.0, 0.0, 0.0), (1.0, 0.0, 0.0), (1.0, 1.0, 0.0)]);
        let curve = coerce(polyline, TypeTag::object(geometry::POLYCURVE_TYPE)).unwrap();
        assert_eq!(
            curve.as_object().map(|c| c.type_name().to_string()),
            Some(geometry::POLYCURVE_TYPE.to_string())
        );

        let broken = Value::Host(HostObject::new(host::HOST_POINT).with_field("x", Value::Float(1.0)));
        let err = coerce(broken, TypeTag::object(geometry::POINT_TYPE)).unwrap_err();
        assert!(matches!(err, ConversionError::Delegate { .. }));

        let mismatch = coerce(host::host_point(0.0, 0.0, 0.0), TypeTag::object(geometry::LINE_TYPE));
        assert!(matches!(mismatch, Err(ConversionError::Delegate { .. })));
    }

    #[test]
    fn test_explicit_cast_fallback() {
        let polyline = Value::Object(geometry::polyline(&[
            geometry::point(0.0, 0.0, 0.0),
            geometry::point(2.0, 0.0, 0.0),
        ]));
        let curve = coerce(polyline, TypeTag::object(geometry::POLYCURVE_TYPE)).unwrap();
        let segments = curve.as_object().and_then(|c| c.get("segments")).cloned();
        assert!(matches!(segments, Some(Value::List(ref s)) if s.len() == 1));
    }

    #[test]
    fn test_unconvertible() {
        let mesh = Value::Host(HostObject::new("Host.Mesh"));
        let err = coerce(mesh, TypeTag::object(geometry::POINT_TYPE)).unwrap_err();
        assert_eq!(
            err,
            ConversionError::Unconvertible {
                from: "Host.Mesh".into(),
                to: geometry::POINT_TYPE.into(),
                slot: "slot".into(),
            }
        );
    }

    #[test]
    fn test_coerce_list_unwraps_elements() {
        let converter = NoopConverter;
        let casts = CastTable::new();
        let coercer = Coercer::new(&converter, &casts);
        let items = vec![Value::wrapped(Value::text("1.5")), Value::Int(2), Value::Null];
        let coerced = coercer
            .coerce_list(items, &TypeTag::list_of(TypeTag::Float), "values")
            .unwrap();
        assert_eq!(
            coerced,
            Value::List(vec![Value::Float(1.5), Value::Float(2.0), Value::Null])
        );

        let bad = coercer.coerce_list(vec![Value::text("x")], &TypeTag::list_of(TypeTag::Float), "values");
        assert!(bad.is_err());
    }
}
