//! Runtime values and declared types that flow into schema templates

use super::base::Base;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Enumerated-choice type declared by a template parameter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnumType {
    pub full_name: String,
    /// Members in declaration order as (name, numeric value)
    pub members: Vec<(String, i64)>,
}

impl EnumType {
    pub fn new(full_name: impl Into<String>, members: &[(&str, i64)]) -> Self {
        Self {
            full_name: full_name.into(),
            members: members
                .iter()
                .map(|(name, value)| (name.to_string(), *value))
                .collect(),
        }
    }

    /// Simple name (last namespace segment)
    pub fn simple_name(&self) -> &str {
        simple_name(&self.full_name)
    }

    /// Look up a member by exact name
    pub fn member(&self, name: &str) -> Option<EnumValue> {
        self.members
            .iter()
            .find(|(member, _)| member == name)
            .map(|(member, value)| self.value_of(member, *value))
    }

    /// Look up a member by numeric value
    pub fn member_by_value(&self, value: i64) -> Option<EnumValue> {
        self.members
            .iter()
            .find(|(_, v)| *v == value)
            .map(|(member, v)| self.value_of(member, *v))
    }

    /// Parse a textual form: a member name or the member's numeric value
    pub fn parse(&self, text: &str) -> Option<EnumValue> {
        let text = text.trim();
        self.member(text)
            .or_else(|| text.parse::<i64>().ok().and_then(|v| self.member_by_value(v)))
    }

    fn value_of(&self, member: &str, value: i64) -> EnumValue {
        EnumValue {
            type_name: self.full_name.clone(),
            member: member.to_string(),
            value,
        }
    }
}

/// A member of an enumerated-choice type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnumValue {
    pub type_name: String,
    pub member: String,
    pub value: i64,
}

/// Host-native value that only a domain converter understands
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HostObject {
    pub type_name: String,
    pub fields: BTreeMap<String, Value>,
}

impl HostObject {
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            fields: BTreeMap::new(),
        }
    }

    pub fn with_field(mut self, key: impl Into<String>, value: Value) -> Self {
        self.fields.insert(key.into(), value);
        self
    }

    pub fn field(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }
}

/// Declared type of a template parameter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TypeTag {
    /// Accepts any non-null value unchanged
    Any,
    Bool,
    Int,
    Float,
    Char,
    Text,
    Enum(EnumType),
    /// Interchange object type by full name; `Base` is the root of every chain
    Object(String),
    List(Box<TypeTag>),
    Dictionary,
    Nullable(Box<TypeTag>),
    /// Host-native type that must go through a domain converter
    Host(String),
}

impl TypeTag {
    pub fn object(full_name: impl Into<String>) -> Self {
        TypeTag::Object(full_name.into())
    }

    pub fn list_of(element: TypeTag) -> Self {
        TypeTag::List(Box::new(element))
    }

    pub fn nullable(inner: TypeTag) -> Self {
        TypeTag::Nullable(Box::new(inner))
    }

    /// The type with any nullable wrapper removed
    pub fn resolved(&self) -> &TypeTag {
        match self {
            TypeTag::Nullable(inner) => inner.resolved(),
            other => other,
        }
    }

    /// Collection types bind to list-access slots; text and dictionaries do not
    pub fn is_collection(&self) -> bool {
        matches!(self.resolved(), TypeTag::List(_))
    }

    /// Element type of a collection, or the resolved type itself
    pub fn element_type(&self) -> &TypeTag {
        match self.resolved() {
            TypeTag::List(element) => element,
            other => other,
        }
    }

    pub fn as_enum(&self) -> Option<&EnumType> {
        match self.resolved() {
            TypeTag::Enum(enum_type) => Some(enum_type),
            _ => None,
        }
    }

    pub fn is_scalar(&self) -> bool {
        matches!(
            self.resolved(),
            TypeTag::Bool | TypeTag::Int | TypeTag::Float | TypeTag::Char | TypeTag::Text
        )
    }

    /// Short name used in slot descriptions, e.g. `Line` or `List<Point>`
    pub fn short_name(&self) -> String {
        match self {
            TypeTag::Enum(enum_type) => enum_type.simple_name().to_string(),
            TypeTag::Object(name) | TypeTag::Host(name) => simple_name(name).to_string(),
            TypeTag::List(element) => format!("List<{}>", element.short_name()),
            TypeTag::Nullable(inner) => inner.short_name(),
            other => other.to_string(),
        }
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeTag::Any => write!(f, "Any"),
            TypeTag::Bool => write!(f, "Bool"),
            TypeTag::Int => write!(f, "Int"),
            TypeTag::Float => write!(f, "Float"),
            TypeTag::Char => write!(f, "Char"),
            TypeTag::Text => write!(f, "Text"),
            TypeTag::Enum(enum_type) => write!(f, "{}", enum_type.full_name),
            TypeTag::Object(name) | TypeTag::Host(name) => write!(f, "{}", name),
            TypeTag::List(element) => write!(f, "List<{}>", element),
            TypeTag::Dictionary => write!(f, "Dictionary"),
            TypeTag::Nullable(inner) => write!(f, "{}?", inner),
        }
    }
}

/// A runtime value read from an input slot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value")]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Char(char),
    Text(String),
    Enum(EnumValue),
    List(Vec<Value>),
    Map(BTreeMap<String, Value>),
    Object(Base),
    Host(HostObject),
    /// Host holder carrying a payload (a "goo" wrapper around the real value)
    Wrapped(Box<Value>),
}

impl Value {
    pub fn text(value: impl Into<String>) -> Self {
        Value::Text(value.into())
    }

    pub fn wrapped(value: Value) -> Self {
        Value::Wrapped(Box::new(value))
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Primitive scalars take the generic conversion stage
    pub fn is_scalar(&self) -> bool {
        matches!(
            self,
            Value::Bool(_)
                | Value::Int(_)
                | Value::Float(_)
                | Value::Char(_)
                | Value::Text(_)
                | Value::Enum(_)
        )
    }

    /// Strip host holders; non-holder values pass through unchanged
    pub fn unwrap_host(self) -> Value {
        match self {
            Value::Wrapped(inner) => inner.unwrap_host(),
            other => other,
        }
    }

    pub fn as_object(&self) -> Option<&Base> {
        match self {
            Value::Object(base) => Some(base),
            _ => None,
        }
    }

    /// Textual form used for enumerated-choice parsing and text conversion
    pub fn to_text(&self) -> Option<String> {
        match self {
            Value::Null => None,
            Value::Bool(v) => Some(v.to_string()),
            Value::Int(v) => Some(v.to_string()),
            Value::Float(v) => Some(v.to_string()),
            Value::Char(v) => Some(v.to_string()),
            Value::Text(v) => Some(v.clone()),
            Value::Enum(v) => Some(v.member.clone()),
            Value::Wrapped(inner) => inner.to_text(),
            Value::List(_) | Value::Map(_) | Value::Object(_) | Value::Host(_) => None,
        }
    }

    /// Runtime type name used in error messages
    pub fn type_name(&self) -> String {
        match self {
            Value::Null => "Null".to_string(),
            Value::Bool(_) => TypeTag::Bool.to_string(),
            Value::Int(_) => TypeTag::Int.to_string(),
            Value::Float(_) => TypeTag::Float.to_string(),
            Value::Char(_) => TypeTag::Char.to_string(),
            Value::Text(_) => TypeTag::Text.to_string(),
            Value::Enum(v) => v.type_name.clone(),
            Value::List(_) => "List".to_string(),
            Value::Map(_) => TypeTag::Dictionary.to_string(),
            Value::Object(base) => base.type_name().to_string(),
            Value::Host(host) => host.type_name.clone(),
            Value::Wrapped(inner) => format!("Wrapped<{}>", inner.type_name()),
        }
    }

    /// Whether the value can be passed for `target` without any conversion
    pub fn is_assignable_to(&self, target: &TypeTag) -> bool {
        match (self, target.resolved()) {
            (Value::Null, _) => false,
            (_, TypeTag::Any) => true,
            (Value::Bool(_), TypeTag::Bool)
            | (Value::Int(_), TypeTag::Int)
            | (Value::Float(_), TypeTag::Float)
            | (Value::Char(_), TypeTag::Char)
            | (Value::Text(_), TypeTag::Text)
            | (Value::Map(_), TypeTag::Dictionary) => true,
            (Value::Enum(v), TypeTag::Enum(enum_type)) => v.type_name == enum_type.full_name,
            (Value::Object(base), TypeTag::Object(name)) => base.is_a(name),
            (Value::Host(host), TypeTag::Host(name)) => &host.type_name == name,
            (Value::List(items), TypeTag::List(element)) => {
                items.iter().all(|item| item.is_null() || item.is_assignable_to(element))
            }
            _ => false,
        }
    }
}

impl From<Base> for Value {
    fn from(base: Base) -> Self {
        Value::Object(base)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.to_string())
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::List(items) => write!(f, "[{} items]", items.len()),
            Value::Map(entries) => write!(f, "{{{} entries}}", entries.len()),
            Value::Object(base) => write!(f, "{}", base.type_name()),
            Value::Host(host) => write!(f, "{}", host.type_name),
            other => write!(f, "{}", other.to_text().unwrap_or_default()),
        }
    }
}

/// Last segment of a dotted full name
pub fn simple_name(full_name: &str) -> &str {
    full_name.rsplit('.').next().unwrap_or(full_name)
}

/// Everything before the last segment of a dotted full name
pub fn namespace_of(full_name: &str) -> &str {
    match full_name.rfind('.') {
        Some(index) => &full_name[..index],
        None => "",
    }
}
