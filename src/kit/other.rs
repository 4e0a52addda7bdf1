//! Miscellaneous annotation types

use crate::catalog::{ConstructorArgs, ConstructorSpec, SchemaType, TemplateInfo, TemplateParameter};
use crate::error::ConstructError;
use crate::model::{Base, TypeTag, Value};

pub const TAG_TYPE: &str = "Objects.Other.Tag";
pub const TAG_ID: &str = "Objects.Other.Tag.ctor(Text,Int)";

fn construct_tag(args: &ConstructorArgs<'_>) -> Result<Base, ConstructError> {
    let count = args.int(1)?.unwrap_or(3);
    if count < 0 {
        return Err(ConstructError::new("Tag count cannot be negative"));
    }
    Ok(Base::new(TAG_TYPE)
        .with("name", args.require_text(0)?.as_str())
        .with("count", count))
}

pub fn types() -> Vec<SchemaType> {
    vec![SchemaType::new(TAG_TYPE).with_constructor(
        ConstructorSpec::new(
            TemplateInfo::new("Tag", "Creates a named tag", "Other", "Annotation"),
            construct_tag,
        )
        .with_parameters(vec![
            TemplateParameter::required("name", TypeTag::Text).with_description("Tag text"),
            TemplateParameter::optional("count", TypeTag::Int, Value::Int(3))
                .with_description("Number of repetitions"),
        ]),
    )]
}
