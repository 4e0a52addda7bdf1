//! Error types for template extraction, coercion, construction and persistence

use crate::constants::messages;
use thiserror::Error;

/// A runtime value could not be coerced to a template parameter type
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConversionError {
    /// Generic scalar conversion failed (unparseable text, out of range, unsupported pair)
    #[error("Cannot convert {from} to {to} for `{slot}`: {reason}")]
    Incompatible {
        from: String,
        to: String,
        slot: String,
        reason: String,
    },

    /// The domain converter accepted the value but failed, or produced an unusable result
    #[error("Domain conversion of {from} to {to} for `{slot}` failed: {message}")]
    Delegate {
        from: String,
        to: String,
        slot: String,
        message: String,
    },

    /// Every coercion stage declined the value
    #[error("Unable to set {slot}: no conversion from {from} to {to}")]
    Unconvertible { from: String, to: String, slot: String },
}

impl ConversionError {
    /// Name of the slot whose value failed to convert
    pub fn slot(&self) -> &str {
        match self {
            ConversionError::Incompatible { slot, .. }
            | ConversionError::Delegate { slot, .. }
            | ConversionError::Unconvertible { slot, .. } => slot,
        }
    }

    /// The offending (source, target) type pair
    pub fn type_pair(&self) -> (&str, &str) {
        match self {
            ConversionError::Incompatible { from, to, .. }
            | ConversionError::Delegate { from, to, .. }
            | ConversionError::Unconvertible { from, to, .. } => (from, to),
        }
    }
}

/// Failure raised from inside a template constructor
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{0}")]
pub struct ConstructError(pub String);

impl ConstructError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }

    /// A required argument was missing
    pub fn missing(parameter: &str) -> Self {
        Self(format!("Missing required argument `{}`", parameter))
    }

    /// An argument arrived with the wrong shape
    pub fn wrong_type(index: usize, expected: &str, actual: &str) -> Self {
        Self(format!(
            "Argument {} expected {}, got {}",
            index, expected, actual
        ))
    }
}

/// Per-evaluation failure; always converted to a runtime message at the solve boundary
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EvaluationError {
    #[error("{}", messages::TEMPLATE_UNRESOLVED)]
    TemplateUnresolved,

    #[error("{}", messages::NO_TEMPLATE)]
    NoTemplate,

    #[error("Input list `{slot}` is empty.")]
    EmptyInput { slot: String },

    #[error(transparent)]
    Conversion(#[from] ConversionError),

    #[error("Failed to construct {type_name}: {source}")]
    Construction {
        type_name: String,
        source: ConstructError,
    },
}

/// Template metadata could not be extracted from a schema type
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CatalogError {
    #[error("Type {type_name} declares more than one template named `{name}`")]
    DuplicateTemplateName { type_name: String, name: String },

    #[error("Template `{template}` declares parameter `{parameter}` more than once")]
    DuplicateParameter { template: String, parameter: String },

    #[error("Template `{template}` has a parameter with an empty name")]
    EmptyParameterName { template: String },

    #[error("Template `{template}` gives a default to required parameter `{parameter}`")]
    DefaultOnRequired { template: String, parameter: String },

    #[error("Template `{template}` marks more than one parameter as carrier")]
    MultipleCarriers { template: String },

    #[error("Template `{0}` not found")]
    TemplateNotFound(String),
}

/// Structural edits on a document or node that were refused
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DocumentError {
    #[error("Node {0} not found")]
    NodeNotFound(usize),

    #[error("Node {0} is not a schema node")]
    NotSchemaNode(usize),

    #[error("Object id {0} is already in use")]
    DuplicateId(usize),

    #[error("Slot {index} is out of range for node {node}")]
    SlotOutOfRange { node: usize, index: usize },

    #[error("Slot {index} is governed by the selected template")]
    SlotGoverned { index: usize },

    #[error("Slot {index} cannot be renamed")]
    SlotNotRenamable { index: usize },

    #[error("Attach mode requires a template with a carrier parameter")]
    AttachModeUnavailable,

    #[error("Cannot connect node {0} to itself")]
    SelfConnection(usize),
}

/// Saving or loading node state failed
#[derive(Error, Debug)]
pub enum PersistenceError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Unsupported save format version: {0}")]
    UnsupportedVersion(String),

    #[error("Document error: {0}")]
    Document(#[from] DocumentError),
}

/// Settings file could not be read or written
#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed settings: {0}")]
    Json(#[from] serde_json::Error),
}
