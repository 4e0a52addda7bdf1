//! Host-side value model and its domain converter
//!
//! Host values arrive as [`HostObject`]s tagged with host type names; [`HostConverter`]
//! turns the ones it knows into kit geometry.

use super::geometry;
use crate::model::{Base, DomainConverter, HostObject, Value};

pub const HOST_POINT: &str = "Host.Point3d";
pub const HOST_LINE: &str = "Host.Line";
pub const HOST_POLYLINE: &str = "Host.Polyline";

pub fn host_point(x: f64, y: f64, z: f64) -> Value {
    Value::Host(
        HostObject::new(HOST_POINT)
            .with_field("x", Value::Float(x))
            .with_field("y", Value::Float(y))
            .with_field("z", Value::Float(z)),
    )
}

pub fn host_line(from: (f64, f64, f64), to: (f64, f64, f64)) -> Value {
    Value::Host(
        HostObject::new(HOST_LINE)
            .with_field("from", host_point(from.0, from.1, from.2))
            .with_field("to", host_point(to.0, to.1, to.2)),
    )
}

pub fn host_polyline(points: &[(f64, f64, f64)]) -> Value {
    Value::Host(HostObject::new(HOST_POLYLINE).with_field(
        "points",
        Value::List(points.iter().map(|&(x, y, z)| host_point(x, y, z)).collect()),
    ))
}

/// Converts host points, lines and polylines into kit geometry
#[derive(Debug, Default, Clone, Copy)]
pub struct HostConverter;

impl HostConverter {
    fn coordinate(host: &HostObject, axis: &str) -> Result<f64, String> {
        match host.field(axis) {
            Some(Value::Float(v)) => Ok(*v),
            Some(Value::Int(v)) => Ok(*v as f64),
            Some(other) => Err(format!("{} coordinate is a {}", axis, other.type_name())),
            None => Err(format!("{} has no {} coordinate", host.type_name, axis)),
        }
    }

    fn point(value: &Value) -> Result<Base, String> {
        match value {
            Value::Host(host) if host.type_name == HOST_POINT => Ok(geometry::point(
                Self::coordinate(host, "x")?,
                Self::coordinate(host, "y")?,
                Self::coordinate(host, "z")?,
            )),
            other => Err(format!("expected {}, got {}", HOST_POINT, other.type_name())),
        }
    }

    fn endpoint(host: &HostObject, field: &str) -> Result<Base, String> {
        let value = host
            .field(field)
            .ok_or_else(|| format!("{} has no {} point", host.type_name, field))?;
        Self::point(value)
    }
}

impl DomainConverter for HostConverter {
    fn can_convert(&self, value: &Value) -> bool {
        matches!(
            value,
            Value::Host(host) if [HOST_POINT, HOST_LINE, HOST_POLYLINE].contains(&host.type_name.as_str())
        )
    }

    fn convert(&self, value: &Value) -> Result<Value, String> {
        let Value::Host(host) = value else {
            return Err(format!("{} is not a host value", value.type_name()));
        };
        let converted = match host.type_name.as_str() {
            HOST_POINT => Self::point(value)?,
            HOST_LINE => geometry::line(Self::endpoint(host, "from")?, Self::endpoint(host, "to")?),
            HOST_POLYLINE => {
                let points = match host.field("points") {
                    Some(Value::List(items)) => items
                        .iter()
                        .map(Self::point)
                        .collect::<Result<Vec<_>, _>>()?,
                    _ => return Err("polyline has no points".to_string()),
                };
                geometry::polyline(&points)
            }
            other => return Err(format!("unsupported host type {}", other)),
        };
        Ok(Value::Object(converted))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_converts_known_host_types() {
        let converter = HostConverter;
        let line = converter
            .convert(&host_line((0.0, 0.0, 0.0), (0.0, 2.0, 0.0)))
            .unwrap();
        let line = line.as_object().unwrap();
        assert_eq!(line.type_name(), geometry::LINE_TYPE);
        assert_eq!(line.get_f64("length"), Some(2.0));

        let polyline = converter
            .convert(&host_polyline(&[(0.0, 0.0, 0.0), (0.0, 0.0, 1.0)]))
            .unwrap();
        assert_eq!(
            polyline.as_object().map(|p| p.type_name()),
            Some(geometry::POLYLINE_TYPE)
        );
    }

    #[test]
    fn test_rejects_unknown_and_incomplete_values() {
        let converter = HostConverter;
        assert!(!converter.can_convert(&Value::Host(HostObject::new("Host.Mesh"))));
        assert!(!converter.can_convert(&Value::Object(geometry::point(0.0, 0.0, 0.0))));

        let incomplete = Value::Host(HostObject::new(HOST_POINT).with_field("x", Value::Float(1.0)));
        assert!(converter.can_convert(&incomplete));
        let err = converter.convert(&incomplete).unwrap_err();
        assert!(err.contains("y"));
    }
}
