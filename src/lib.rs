//! Schema builder core library
//!
//! Schema-driven object construction nodes: a catalog of constructor templates, nodes whose
//! inputs follow the selected template, and a coercion pipeline from loosely typed host
//! values to strongly typed constructor arguments.

pub mod catalog;
pub mod constants;
pub mod error;
pub mod kit;
pub mod model;
pub mod nodes;
pub mod settings;

// Re-export commonly used types
pub use catalog::{Template, TemplateCatalog, TemplatePicker};
pub use error::{EvaluationError, PersistenceError};
pub use model::{Base, TypeTag, Value};
pub use nodes::{Document, EvaluationContext, SchemaNode, SolveInputs};
pub use settings::BuilderSettings;
