//! Node system - Schema nodes, their dynamic interfaces and the document that holds them

// Core node modules
pub mod schema_node;
pub mod slot;
pub mod binder;
pub mod debounce;
pub mod uniqueness;

// Evaluation
pub mod coercion;
pub mod evaluation;

// Document and persistence
pub mod document;
pub mod persistence;

// Re-export core types
pub use schema_node::{NodeKind, RuntimeMessage, RuntimeMessageLevel, SchemaNode};
pub use slot::{InputSlot, NodeId, SlotKind};
pub use binder::{bind, choice_items, ChoiceItem, ChoiceListRequest};
pub use debounce::{Debouncer, NameEdit};
pub use uniqueness::{ensure_unique, Seed, SiblingSeedLookup};

// Re-export evaluation types
pub use coercion::{convert_primitive, Coercer};
pub use evaluation::{DataAccess, EvaluationContext, SlotData, SolveInputs};

// Re-export document types
pub use document::{ChoiceList, Document, DocumentObject, Wire};
pub use persistence::{
    document_from_json, document_to_json, load_from_file, save_to_file, SaveData, SaveMetadata,
    SchemaNodeState,
};
