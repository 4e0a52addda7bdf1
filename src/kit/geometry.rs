//! Geometry types: points, lines, polylines and polycurves

use crate::catalog::{ConstructorArgs, ConstructorSpec, SchemaType, TemplateInfo, TemplateParameter};
use crate::error::ConstructError;
use crate::model::{Base, TypeTag, Value};
use glam::DVec3;

pub const POINT_TYPE: &str = "Objects.Geometry.Point";
pub const LINE_TYPE: &str = "Objects.Geometry.Line";
pub const POLYLINE_TYPE: &str = "Objects.Geometry.Polyline";
pub const POLYCURVE_TYPE: &str = "Objects.Geometry.Polycurve";

/// Interface satisfied by every curve type
pub const CURVE_TYPE: &str = "Objects.ICurve";

pub const POINT_ID: &str = "Objects.Geometry.Point.ctor(Float,Float,Float)";
pub const LINE_ID: &str = "Objects.Geometry.Line.ctor(Objects.Geometry.Point,Objects.Geometry.Point)";
pub const POLYLINE_ID: &str = "Objects.Geometry.Polyline.ctor(List<Objects.Geometry.Point>)";
pub const POLYCURVE_ID: &str = "Objects.Geometry.Polycurve.ctor(List<Objects.ICurve>)";

pub fn point(x: f64, y: f64, z: f64) -> Base {
    Base::new(POINT_TYPE)
        .with("x", x)
        .with("y", y)
        .with("z", z)
}

pub fn line(start: Base, end: Base) -> Base {
    let length = position(&start).distance(position(&end));
    Base::with_ancestors(LINE_TYPE, &[CURVE_TYPE])
        .with("start", start)
        .with("end", end)
        .with("length", length)
}

pub fn polyline(points: &[Base]) -> Base {
    let length: f64 = points
        .windows(2)
        .map(|pair| position(&pair[0]).distance(position(&pair[1])))
        .sum();
    let mut polyline = Base::with_ancestors(POLYLINE_TYPE, &[CURVE_TYPE]).with("length", length);
    polyline.set(
        "points",
        Value::List(points.iter().cloned().map(Value::Object).collect()),
    );
    polyline
}

pub fn polycurve(segments: Vec<Base>) -> Base {
    let length: f64 = segments.iter().filter_map(|s| s.get_f64("length")).sum();
    let mut polycurve = Base::with_ancestors(POLYCURVE_TYPE, &[CURVE_TYPE]).with("length", length);
    polycurve.set(
        "segments",
        Value::List(segments.into_iter().map(Value::Object).collect()),
    );
    polycurve
}

/// Point coordinates; missing members read as zero
pub fn position(point: &Base) -> DVec3 {
    DVec3::new(
        point.get_f64("x").unwrap_or_default(),
        point.get_f64("y").unwrap_or_default(),
        point.get_f64("z").unwrap_or_default(),
    )
}

fn points_of(polyline: &Base) -> Vec<Base> {
    match polyline.get("points") {
        Some(Value::List(items)) => items.iter().filter_map(Value::as_object).cloned().collect(),
        _ => Vec::new(),
    }
}

/// Cast a polyline to a polycurve of line segments between consecutive points
pub fn polyline_to_polycurve(polyline: &Base) -> Option<Base> {
    let points = points_of(polyline);
    if points.len() < 2 {
        return None;
    }
    let segments = points
        .windows(2)
        .map(|pair| line(pair[0].clone(), pair[1].clone()))
        .collect();
    Some(polycurve(segments))
}

pub fn line_to_polycurve(line: &Base) -> Option<Base> {
    Some(polycurve(vec![line.clone()]))
}

fn info(name: &str, description: &str) -> TemplateInfo {
    TemplateInfo::new(name, description, "Geometry", "")
}

fn construct_point(args: &ConstructorArgs<'_>) -> Result<Base, ConstructError> {
    Ok(point(
        args.require_float(0)?,
        args.require_float(1)?,
        args.float(2)?.unwrap_or_default(),
    ))
}

fn construct_line(args: &ConstructorArgs<'_>) -> Result<Base, ConstructError> {
    Ok(line(args.require_object(0)?, args.require_object(1)?))
}

fn construct_polyline(args: &ConstructorArgs<'_>) -> Result<Base, ConstructError> {
    let points = args.objects(0)?;
    if points.len() < 2 {
        return Err(ConstructError::new("A polyline needs at least two points"));
    }
    Ok(polyline(&points))
}

fn construct_polycurve(args: &ConstructorArgs<'_>) -> Result<Base, ConstructError> {
    let segments = args.objects(0)?;
    if segments.is_empty() {
        return Err(ConstructError::new("A polycurve needs at least one segment"));
    }
    Ok(polycurve(segments))
}

pub fn types() -> Vec<SchemaType> {
    let point_tag = || TypeTag::object(POINT_TYPE);
    vec![
        SchemaType::new(POINT_TYPE).with_constructor(
            ConstructorSpec::new(info("Point", "Creates a point from coordinates"), construct_point)
                .with_parameters(vec![
                    TemplateParameter::required("x", TypeTag::Float).with_description("X coordinate"),
                    TemplateParameter::required("y", TypeTag::Float).with_description("Y coordinate"),
                    TemplateParameter::optional("z", TypeTag::Float, Value::Float(0.0))
                        .with_description("Z coordinate"),
                ]),
        ),
        SchemaType::new(LINE_TYPE).with_constructor(
            ConstructorSpec::new(info("Line", "Creates a line between two points"), construct_line)
                .with_parameters(vec![
                    TemplateParameter::required("start", point_tag()),
                    TemplateParameter::required("end", point_tag()),
                ]),
        ),
        SchemaType::new(POLYLINE_TYPE).with_constructor(
            ConstructorSpec::new(
                info("Polyline", "Creates a polyline through a list of points"),
                construct_polyline,
            )
            .with_parameters(vec![TemplateParameter::required(
                "points",
                TypeTag::list_of(point_tag()),
            )
            .with_description("Vertices in order")]),
        ),
        SchemaType::new(POLYCURVE_TYPE).with_constructor(
            ConstructorSpec::new(
                info("Polycurve", "Joins curve segments into a single curve"),
                construct_polycurve,
            )
            .with_parameters(vec![TemplateParameter::required(
                "segments",
                TypeTag::list_of(TypeTag::object(CURVE_TYPE)),
            )]),
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_polyline_length() {
        let polyline = polyline(&[point(0.0, 0.0, 0.0), point(3.0, 4.0, 0.0), point(3.0, 4.0, 2.0)]);
        assert_eq!(polyline.get_f64("length"), Some(7.0));
        assert!(polyline.is_a(CURVE_TYPE));
    }

    #[test]
    fn test_polyline_cast_builds_segments() {
        let source = polyline(&[point(0.0, 0.0, 0.0), point(1.0, 0.0, 0.0), point(1.0, 1.0, 0.0)]);
        let curve = polyline_to_polycurve(&source).unwrap();
        assert_eq!(curve.type_name(), POLYCURVE_TYPE);
        assert_eq!(curve.get_f64("length"), Some(2.0));
        match curve.get("segments") {
            Some(Value::List(segments)) => {
                assert_eq!(segments.len(), 2);
                let second = segments[1].as_object().unwrap();
                assert_eq!(second.get_object("start").and_then(|p| p.get_f64("x")), Some(1.0));
            }
            other => panic!("unexpected segments: {:?}", other),
        }

        assert!(polyline_to_polycurve(&polyline(&[point(0.0, 0.0, 0.0)])).is_none());
    }

    #[test]
    fn test_polyline_needs_two_points() {
        let parameters = vec![TemplateParameter::required("points", TypeTag::list_of(TypeTag::object(POINT_TYPE)))];
        let values = vec![Value::List(vec![Value::Object(point(0.0, 0.0, 0.0))])];
        let args = ConstructorArgs::new(&parameters, &values);
        assert!(construct_polyline(&args).is_err());
    }
}
