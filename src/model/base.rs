//! Interchange object with identity, units and dynamic members

use super::value::{simple_name, Value};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Root of every interchange type chain
pub const BASE_TYPE: &str = "Base";

/// A constructed interchange object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Base {
    /// Most-derived type first, followed by the interfaces and ancestors it satisfies
    type_chain: Vec<String>,
    pub application_id: Option<String>,
    pub units: Option<String>,
    members: BTreeMap<String, Value>,
}

impl Base {
    /// Creates an empty object of the given full type name
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_chain: vec![type_name.into()],
            application_id: None,
            units: None,
            members: BTreeMap::new(),
        }
    }

    /// Creates an empty object that also satisfies each of `ancestors`
    pub fn with_ancestors(type_name: impl Into<String>, ancestors: &[&str]) -> Self {
        let mut base = Self::new(type_name);
        base.type_chain
            .extend(ancestors.iter().map(|ancestor| ancestor.to_string()));
        base
    }

    /// Builder-style member assignment
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(key, value.into());
        self
    }

    pub fn type_name(&self) -> &str {
        self.type_chain.first().map(String::as_str).unwrap_or(BASE_TYPE)
    }

    pub fn simple_type_name(&self) -> &str {
        simple_name(self.type_name())
    }

    pub fn type_chain(&self) -> &[String] {
        &self.type_chain
    }

    /// Whether this object satisfies the named type
    pub fn is_a(&self, type_name: &str) -> bool {
        type_name == BASE_TYPE || self.type_chain.iter().any(|t| t == type_name)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.members.get(key)
    }

    pub fn set(&mut self, key: impl Into<String>, value: Value) {
        self.members.insert(key.into(), value);
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.members.remove(key)
    }

    pub fn members(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.members.iter()
    }

    pub fn get_f64(&self, key: &str) -> Option<f64> {
        match self.get(key)? {
            Value::Float(v) => Some(*v),
            Value::Int(v) => Some(*v as f64),
            _ => None,
        }
    }

    pub fn get_text(&self, key: &str) -> Option<&str> {
        match self.get(key)? {
            Value::Text(v) => Some(v),
            _ => None,
        }
    }

    pub fn get_object(&self, key: &str) -> Option<&Base> {
        self.get(key).and_then(Value::as_object)
    }

    /// Whether the units field is missing or blank
    pub fn units_missing(&self) -> bool {
        self.units.as_deref().map_or(true, str::is_empty)
    }

    /// Copy with the same members; nested objects are shared by value, never re-constructed
    pub fn shallow_copy(&self) -> Base {
        self.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_chain_membership() {
        let line = Base::with_ancestors("Objects.Geometry.Line", &["Objects.ICurve"]);
        assert_eq!(line.type_name(), "Objects.Geometry.Line");
        assert_eq!(line.simple_type_name(), "Line");
        assert!(line.is_a("Objects.ICurve"));
        assert!(line.is_a(BASE_TYPE));
        assert!(!line.is_a("Objects.Geometry.Point"));
    }

    #[test]
    fn test_members_and_units() {
        let mut base = Base::new("Objects.BuiltElements.Level").with("elevation", 3.0);
        assert_eq!(base.get_f64("elevation"), Some(3.0));
        assert!(base.units_missing());

        base.units = Some(String::new());
        assert!(base.units_missing());
        base.units = Some("mm".into());
        assert!(!base.units_missing());

        base.set("name", Value::text("L1"));
        assert_eq!(base.get_text("name"), Some("L1"));
        assert_eq!(base.remove("name"), Some(Value::text("L1")));
    }

    #[test]
    fn test_shallow_copy_is_independent() {
        let original = Base::new("Objects.Geometry.Point").with("x", 1.0);
        let mut copy = original.shallow_copy();
        copy.set("x", Value::Float(5.0));
        assert_eq!(original.get_f64("x"), Some(1.0));
        assert_eq!(copy.get_f64("x"), Some(5.0));
    }
}
