//! Built elements: levels, walls, beams and floors

use super::geometry::CURVE_TYPE;
use crate::catalog::{ConstructorArgs, ConstructorSpec, SchemaType, TemplateInfo, TemplateParameter};
use crate::error::ConstructError;
use crate::model::{Base, EnumType, TypeTag, Value};
use once_cell::sync::Lazy;

pub const LEVEL_TYPE: &str = "Objects.BuiltElements.Level";
pub const WALL_TYPE: &str = "Objects.BuiltElements.Wall";
pub const BEAM_TYPE: &str = "Objects.BuiltElements.Beam";
pub const FLOOR_TYPE: &str = "Objects.BuiltElements.Floor";

pub const LEVEL_ID: &str = "Objects.BuiltElements.Level.ctor(Text,Float)";
pub const WALL_ID: &str = "Objects.BuiltElements.Wall.ctor(Float,Objects.ICurve,List<Base>)";
pub const WALL_BY_TYPE_ID: &str = "Objects.BuiltElements.Wall.ctor(Text,Text,Objects.ICurve,Objects.BuiltElements.Level,Bool,Objects.BuiltElements.LocationLine)";
pub const BEAM_ID: &str = "Objects.BuiltElements.Beam.ctor(Objects.ICurve,Objects.BuiltElements.Level)";
pub const FLOOR_ID: &str = "Objects.BuiltElements.Floor.ctor(Objects.ICurve,Objects.BuiltElements.Level,Float)";

/// Wall location line, in declaration order
pub static LOCATION_LINE: Lazy<EnumType> = Lazy::new(|| {
    EnumType::new(
        "Objects.BuiltElements.LocationLine",
        &[
            ("Centerline", 0),
            ("Exterior", 1),
            ("Interior", 2),
            ("CoreCenterline", 3),
        ],
    )
});

fn info(name: &str, description: &str, subcategory: &str) -> TemplateInfo {
    TemplateInfo::new(name, description, "BIM", subcategory)
}

fn curve() -> TypeTag {
    TypeTag::object(CURVE_TYPE)
}

fn level_parameter() -> TemplateParameter {
    TemplateParameter::optional("level", TypeTag::object(LEVEL_TYPE), Value::Null)
        .with_description("Host level")
}

fn construct_level(args: &ConstructorArgs<'_>) -> Result<Base, ConstructError> {
    Ok(Base::new(LEVEL_TYPE)
        .with("name", args.require_text(0)?.as_str())
        .with("elevation", args.float(1)?.unwrap_or_default()))
}

fn construct_wall(args: &ConstructorArgs<'_>) -> Result<Base, ConstructError> {
    let height = args.require_float(0)?;
    if height <= 0.0 {
        return Err(ConstructError::new("Wall height must be positive"));
    }
    let elements = args.objects(2)?;
    let mut wall = Base::new(WALL_TYPE)
        .with("height", height)
        .with("baseLine", args.require_object(1)?);
    if !elements.is_empty() {
        wall.set(
            "elements",
            Value::List(elements.into_iter().map(Value::Object).collect()),
        );
    }
    Ok(wall)
}

fn construct_wall_by_type(args: &ConstructorArgs<'_>) -> Result<Base, ConstructError> {
    let location = args
        .enum_value(5)?
        .map(|v| v.member)
        .unwrap_or_else(|| "Centerline".to_string());
    let mut wall = Base::new(WALL_TYPE)
        .with("family", args.require_text(0)?.as_str())
        .with("type", args.require_text(1)?.as_str())
        .with("baseLine", args.require_object(2)?)
        .with("structural", args.bool(4)?.unwrap_or(false))
        .with("location", location.as_str());
    if let Some(level) = args.object(3)? {
        wall.set("level", Value::Object(level));
    }
    Ok(wall)
}

fn construct_beam(args: &ConstructorArgs<'_>) -> Result<Base, ConstructError> {
    let mut beam = Base::new(BEAM_TYPE).with("baseLine", args.require_object(0)?);
    if let Some(level) = args.object(1)? {
        beam.set("level", Value::Object(level));
    }
    Ok(beam)
}

fn construct_floor(args: &ConstructorArgs<'_>) -> Result<Base, ConstructError> {
    let mut floor = Base::new(FLOOR_TYPE)
        .with("outline", args.require_object(0)?)
        .with("thickness", args.float(2)?.unwrap_or(0.2));
    if let Some(level) = args.object(1)? {
        floor.set("level", Value::Object(level));
    }
    Ok(floor)
}

pub fn types() -> Vec<SchemaType> {
    vec![
        SchemaType::new(LEVEL_TYPE)
            .with_constructor(
                ConstructorSpec::new(
                    info("Level", "Creates a new level", "Architecture"),
                    construct_level,
                )
                .with_parameters(vec![
                    TemplateParameter::required("name", TypeTag::Text).with_description("Level name"),
                    TemplateParameter::optional("elevation", TypeTag::Float, Value::Float(0.0))
                        .with_description("Level elevation"),
                ]),
            )
            .with_constructor(
                ConstructorSpec::untagged(|_| Ok(Base::new(LEVEL_TYPE)))
            ),
        SchemaType::new(WALL_TYPE)
            .with_constructor(
                ConstructorSpec::new(
                    info("Wall", "Creates a wall along a base curve", "Architecture"),
                    construct_wall,
                )
                .with_parameters(vec![
                    TemplateParameter::required("height", TypeTag::Float).with_description("Wall height"),
                    TemplateParameter::required("baseLine", curve())
                        .with_description("Base curve")
                        .as_carrier(),
                    TemplateParameter::optional(
                        "elements",
                        TypeTag::list_of(TypeTag::object("Base")),
                        Value::Null,
                    )
                    .with_description("Hosted elements"),
                ]),
            )
            .with_constructor(
                ConstructorSpec::new(
                    info("Wall by type", "Creates a wall of a named family and type", "Architecture"),
                    construct_wall_by_type,
                )
                .with_parameters(vec![
                    TemplateParameter::required("family", TypeTag::Text),
                    TemplateParameter::required("type", TypeTag::Text),
                    TemplateParameter::required("baseLine", curve()).as_carrier(),
                    level_parameter(),
                    TemplateParameter::optional("structural", TypeTag::Bool, Value::Bool(false)),
                    TemplateParameter::optional(
                        "location",
                        TypeTag::Enum(LOCATION_LINE.clone()),
                        LOCATION_LINE
                            .member("Centerline")
                            .map(Value::Enum)
                            .unwrap_or(Value::Null),
                    )
                    .with_description("Location line of the wall"),
                ]),
            ),
        SchemaType::new(BEAM_TYPE).with_constructor(
            ConstructorSpec::new(
                info("Beam", "Creates a beam along a curve", "Structure"),
                construct_beam,
            )
            .with_parameters(vec![
                TemplateParameter::required("baseLine", curve()).as_carrier(),
                level_parameter(),
            ]),
        ),
        SchemaType::new(FLOOR_TYPE).with_constructor(
            ConstructorSpec::new(
                info("Floor", "Creates a floor from a closed outline", "Architecture"),
                construct_floor,
            )
            .with_parameters(vec![
                TemplateParameter::required("outline", curve())
                    .with_description("Closed boundary curve")
                    .as_carrier(),
                level_parameter(),
                TemplateParameter::optional("thickness", TypeTag::Float, Value::Float(0.2)),
            ]),
        ),
    ]
}
