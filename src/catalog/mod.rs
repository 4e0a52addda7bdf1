//! Template catalog, namespace tree and picker contract

pub mod picker;
pub mod registry;
pub mod template;
pub mod tree;

pub use picker::{describe, PickerSession, ScriptedPicker, TemplatePicker};
pub use registry::{NodeCategory, PreboundFactory, TemplateCatalog};
pub use template::{
    Access, ConstructorArgs, ConstructorFn, ConstructorSpec, SchemaType, Template,
    TemplateDescriptor, TemplateId, TemplateInfo, TemplateParameter,
};
pub use tree::TemplateTreeNode;
