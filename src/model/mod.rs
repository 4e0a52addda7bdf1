//! Interchange object model shared by the catalog and the schema nodes

pub mod base;
pub mod casts;
pub mod converter;
pub mod value;

pub use base::{Base, BASE_TYPE};
pub use casts::{CastFn, CastTable};
pub use converter::{try_convert_item, DomainConverter, NoopConverter};
pub use value::{namespace_of, simple_name, EnumType, EnumValue, HostObject, TypeTag, Value};
