//! Schema templates: constructor descriptors with a narrow construction boundary

use crate::error::ConstructError;
use crate::model::{namespace_of, simple_name, Base, EnumValue, TypeTag, Value};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Stable constructor identity, e.g. `Objects.BuiltElements.Wall.ctor(Float,Objects.ICurve)`
pub type TemplateId = String;

/// Construction boundary of a template
pub type ConstructorFn =
    Arc<dyn Fn(&ConstructorArgs<'_>) -> Result<Base, ConstructError> + Send + Sync>;

/// Display metadata attached to a constructor; constructors without it are not templates
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateInfo {
    pub name: String,
    pub description: String,
    pub category: String,
    pub subcategory: String,
}

impl TemplateInfo {
    pub fn new(name: &str, description: &str, category: &str, subcategory: &str) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            category: category.to_string(),
            subcategory: subcategory.to_string(),
        }
    }
}

/// Input-slot access mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Access {
    Item,
    List,
}

/// One parameter of a template
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateParameter {
    pub name: String,
    pub type_tag: TypeTag,
    pub optional: bool,
    pub default: Option<Value>,
    pub description: Option<String>,
    /// Host geometry the constructed object can be attached to
    pub carrier: bool,
}

impl TemplateParameter {
    /// Create a required parameter
    pub fn required(name: &str, type_tag: TypeTag) -> Self {
        Self {
            name: name.to_string(),
            type_tag,
            optional: false,
            default: None,
            description: None,
            carrier: false,
        }
    }

    /// Create an optional parameter with a default value (`Value::Null` for "no value")
    pub fn optional(name: &str, type_tag: TypeTag, default: Value) -> Self {
        Self {
            optional: true,
            default: Some(default),
            ..Self::required(name, type_tag)
        }
    }

    pub fn with_description(mut self, description: &str) -> Self {
        self.description = Some(description.to_string());
        self
    }

    /// Mark this parameter as the carrier for attach mode
    pub fn as_carrier(mut self) -> Self {
        self.carrier = true;
        self
    }

    /// List access for collections other than text and dictionaries, item access otherwise
    pub fn access(&self) -> Access {
        if self.type_tag.is_collection() {
            Access::List
        } else {
            Access::Item
        }
    }

    /// Slot description: `(Type) description[, default = x]`
    pub fn slot_description(&self) -> String {
        let mut parts: Vec<String> = self
            .description
            .iter()
            .filter(|d| !d.is_empty())
            .cloned()
            .collect();
        if self.optional {
            parts.push(format!("default = {}", self.default_text()));
        }
        let mut text = format!("({})", self.type_tag.short_name());
        if !parts.is_empty() {
            text.push(' ');
            text.push_str(&parts.join(", "));
        }
        text
    }

    /// Textual form of the default value, `null` when absent
    pub fn default_text(&self) -> String {
        match &self.default {
            None | Some(Value::Null) => "null".to_string(),
            Some(value) => value.to_string(),
        }
    }
}

/// One constructor of a registered schema type
#[derive(Clone)]
pub struct ConstructorSpec {
    pub info: Option<TemplateInfo>,
    pub parameters: Vec<TemplateParameter>,
    pub constructor: ConstructorFn,
}

impl ConstructorSpec {
    /// A constructor carrying template metadata
    pub fn new<F>(info: TemplateInfo, constructor: F) -> Self
    where
        F: Fn(&ConstructorArgs<'_>) -> Result<Base, ConstructError> + Send + Sync + 'static,
    {
        Self {
            info: Some(info),
            parameters: Vec::new(),
            constructor: Arc::new(constructor),
        }
    }

    /// A constructor without template metadata; never offered by the catalog
    pub fn untagged<F>(constructor: F) -> Self
    where
        F: Fn(&ConstructorArgs<'_>) -> Result<Base, ConstructError> + Send + Sync + 'static,
    {
        Self {
            info: None,
            parameters: Vec::new(),
            constructor: Arc::new(constructor),
        }
    }

    pub fn with_parameters(mut self, parameters: Vec<TemplateParameter>) -> Self {
        self.parameters = parameters;
        self
    }
}

impl fmt::Debug for ConstructorSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConstructorSpec")
            .field("info", &self.info)
            .field("parameters", &self.parameters)
            .finish_non_exhaustive()
    }
}

/// A constructible interchange type and its constructors
#[derive(Debug, Clone)]
pub struct SchemaType {
    pub full_name: String,
    pub constructors: Vec<ConstructorSpec>,
}

impl SchemaType {
    pub fn new(full_name: &str) -> Self {
        Self {
            full_name: full_name.to_string(),
            constructors: Vec::new(),
        }
    }

    pub fn with_constructor(mut self, constructor: ConstructorSpec) -> Self {
        self.constructors.push(constructor);
        self
    }

    pub fn simple_name(&self) -> &str {
        simple_name(&self.full_name)
    }

    pub fn namespace(&self) -> &str {
        namespace_of(&self.full_name)
    }
}

/// Serializable part of a template
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateDescriptor {
    pub id: TemplateId,
    pub declaring_type: String,
    pub info: TemplateInfo,
    pub parameters: Vec<TemplateParameter>,
}

/// An immutable, selectable template
#[derive(Clone)]
pub struct Template {
    descriptor: TemplateDescriptor,
    constructor: ConstructorFn,
}

impl Template {
    pub fn new(descriptor: TemplateDescriptor, constructor: ConstructorFn) -> Self {
        Self {
            descriptor,
            constructor,
        }
    }

    /// Constructor identity string: `{DeclaringType}.ctor({ParamType},...)`
    pub fn identity(declaring_type: &str, parameters: &[TemplateParameter]) -> TemplateId {
        let types: Vec<String> = parameters.iter().map(|p| p.type_tag.to_string()).collect();
        format!("{}.ctor({})", declaring_type, types.join(","))
    }

    pub fn id(&self) -> &str {
        &self.descriptor.id
    }

    pub fn descriptor(&self) -> &TemplateDescriptor {
        &self.descriptor
    }

    pub fn name(&self) -> &str {
        &self.descriptor.info.name
    }

    pub fn description(&self) -> &str {
        &self.descriptor.info.description
    }

    pub fn info(&self) -> &TemplateInfo {
        &self.descriptor.info
    }

    pub fn declaring_type(&self) -> &str {
        &self.descriptor.declaring_type
    }

    /// Simple name of the constructed type, used as the output label
    pub fn declaring_type_name(&self) -> &str {
        simple_name(&self.descriptor.declaring_type)
    }

    /// First namespace segment of the constructed type
    pub fn root_namespace(&self) -> &str {
        self.descriptor
            .declaring_type
            .split('.')
            .next()
            .unwrap_or_default()
    }

    pub fn parameters(&self) -> &[TemplateParameter] {
        &self.descriptor.parameters
    }

    pub fn parameter_count(&self) -> usize {
        self.descriptor.parameters.len()
    }

    pub fn carrier_index(&self) -> Option<usize> {
        self.descriptor.parameters.iter().position(|p| p.carrier)
    }

    pub fn carrier(&self) -> Option<&TemplateParameter> {
        self.carrier_index().map(|i| &self.descriptor.parameters[i])
    }

    /// Invoke the constructor with already-coerced arguments
    pub fn construct(&self, args: &[Value]) -> Result<Base, ConstructError> {
        let args = ConstructorArgs::new(self.parameters(), args);
        (self.constructor)(&args)
    }
}

impl fmt::Debug for Template {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Template")
            .field("descriptor", &self.descriptor)
            .finish_non_exhaustive()
    }
}

/// Coerced constructor arguments with typed accessors
pub struct ConstructorArgs<'a> {
    parameters: &'a [TemplateParameter],
    values: &'a [Value],
}

impl<'a> ConstructorArgs<'a> {
    pub fn new(parameters: &'a [TemplateParameter], values: &'a [Value]) -> Self {
        Self { parameters, values }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Raw argument; missing trailing arguments read as `Null`
    pub fn value(&self, index: usize) -> &Value {
        self.values.get(index).unwrap_or(&Value::Null)
    }

    fn parameter_name(&self, index: usize) -> &str {
        self.parameters
            .get(index)
            .map(|p| p.name.as_str())
            .unwrap_or("?")
    }

    fn mismatch(&self, index: usize, expected: &str) -> ConstructError {
        ConstructError::wrong_type(index, expected, &self.value(index).type_name())
    }

    pub fn float(&self, index: usize) -> Result<Option<f64>, ConstructError> {
        match self.value(index) {
            Value::Null => Ok(None),
            Value::Float(v) => Ok(Some(*v)),
            Value::Int(v) => Ok(Some(*v as f64)),
            _ => Err(self.mismatch(index, "Float")),
        }
    }

    pub fn int(&self, index: usize) -> Result<Option<i64>, ConstructError> {
        match self.value(index) {
            Value::Null => Ok(None),
            Value::Int(v) => Ok(Some(*v)),
            _ => Err(self.mismatch(index, "Int")),
        }
    }

    pub fn bool(&self, index: usize) -> Result<Option<bool>, ConstructError> {
        match self.value(index) {
            Value::Null => Ok(None),
            Value::Bool(v) => Ok(Some(*v)),
            _ => Err(self.mismatch(index, "Bool")),
        }
    }

    pub fn text(&self, index: usize) -> Result<Option<String>, ConstructError> {
        match self.value(index) {
            Value::Null => Ok(None),
            Value::Text(v) => Ok(Some(v.clone())),
            _ => Err(self.mismatch(index, "Text")),
        }
    }

    pub fn enum_value(&self, index: usize) -> Result<Option<EnumValue>, ConstructError> {
        match self.value(index) {
            Value::Null => Ok(None),
            Value::Enum(v) => Ok(Some(v.clone())),
            _ => Err(self.mismatch(index, "enumerated choice")),
        }
    }

    pub fn object(&self, index: usize) -> Result<Option<Base>, ConstructError> {
        match self.value(index) {
            Value::Null => Ok(None),
            Value::Object(base) => Ok(Some(base.clone())),
            _ => Err(self.mismatch(index, "object")),
        }
    }

    /// List of objects; `Null` reads as an empty list, null elements are skipped
    pub fn objects(&self, index: usize) -> Result<Vec<Base>, ConstructError> {
        match self.value(index) {
            Value::Null => Ok(Vec::new()),
            Value::List(items) => items
                .iter()
                .filter(|item| !item.is_null())
                .map(|item| {
                    item.as_object()
                        .cloned()
                        .ok_or_else(|| self.mismatch(index, "list of objects"))
                })
                .collect(),
            _ => Err(self.mismatch(index, "list of objects")),
        }
    }

    pub fn require_float(&self, index: usize) -> Result<f64, ConstructError> {
        self.float(index)?
            .ok_or_else(|| ConstructError::missing(self.parameter_name(index)))
    }

    pub fn require_text(&self, index: usize) -> Result<String, ConstructError> {
        self.text(index)?
            .ok_or_else(|| ConstructError::missing(self.parameter_name(index)))
    }

    pub fn require_object(&self, index: usize) -> Result<Base, ConstructError> {
        self.object(index)?
            .ok_or_else(|| ConstructError::missing(self.parameter_name(index)))
    }
}
