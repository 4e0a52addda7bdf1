//! Registered explicit casts between interchange object types

use super::base::Base;
use super::value::{TypeTag, Value};
use std::collections::HashMap;

/// Cast function from one object type to another; `None` when the source cannot be cast
pub type CastFn = fn(&Base) -> Option<Base>;

/// Table of user-defined object casts, keyed by (source type, target type)
#[derive(Default, Clone)]
pub struct CastTable {
    casts: HashMap<(String, String), CastFn>,
}

impl CastTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a cast from `from` to `to`
    pub fn register(&mut self, from: impl Into<String>, to: impl Into<String>, cast: CastFn) {
        self.casts.insert((from.into(), to.into()), cast);
    }

    pub fn len(&self) -> usize {
        self.casts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.casts.is_empty()
    }

    /// Attempts a registered cast of `value` to `target`.
    ///
    /// Every type in the value's chain is tried as the source, most-derived first.
    pub fn cast(&self, value: &Value, target: &TypeTag) -> Option<Value> {
        let (base, target_name) = match (value, target.resolved()) {
            (Value::Object(base), TypeTag::Object(name)) => (base, name),
            _ => return None,
        };

        base.type_chain().iter().find_map(|source| {
            self.casts
                .get(&(source.clone(), target_name.clone()))
                .and_then(|cast| cast(base))
                .map(Value::Object)
        })
    }
}

impl std::fmt::Debug for CastTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut keys: Vec<_> = self.casts.keys().collect();
        keys.sort();
        f.debug_struct("CastTable").field("casts", &keys).finish()
    }
}
