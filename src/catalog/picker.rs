//! Template picker contract and the headless session it drives

use super::registry::TemplateCatalog;
use super::template::{Template, TemplateId};
use super::tree::TemplateTreeNode;
use log::debug;
use std::sync::Arc;

/// Modal template selection, implemented by each host's picker UI.
///
/// Returns the chosen template id, or `None` when the user cancels.
pub trait TemplatePicker {
    fn pick(&mut self, session: &mut PickerSession<'_>) -> Option<TemplateId>;
}

/// View-model behind a picker: search filter, tree, selection and description pane
pub struct PickerSession<'a> {
    catalog: &'a TemplateCatalog,
    filter: String,
    tree: TemplateTreeNode,
    selected: Option<Arc<Template>>,
}

impl<'a> PickerSession<'a> {
    pub fn new(catalog: &'a TemplateCatalog) -> Self {
        Self {
            catalog,
            filter: String::new(),
            tree: catalog.build_tree(None),
            selected: None,
        }
    }

    pub fn catalog(&self) -> &TemplateCatalog {
        self.catalog
    }

    pub fn filter(&self) -> &str {
        &self.filter
    }

    /// Change the search text; the tree is rebuilt in full
    pub fn set_filter(&mut self, filter: &str) {
        self.filter = filter.to_string();
        self.tree = self.catalog.build_tree(Some(filter));
        debug!("Picker filter '{}' shows {} template(s)", filter, self.tree.leaf_ids().len());
    }

    pub fn tree(&self) -> &TemplateTreeNode {
        &self.tree
    }

    /// Select a leaf of the current tree; branches and unknown ids clear the selection
    pub fn select(&mut self, id: &str) -> bool {
        self.selected = if self.tree.contains(id) {
            self.catalog.get(id)
        } else {
            None
        };
        self.selected.is_some()
    }

    /// Select the first leaf labelled `label` in the current tree
    pub fn select_by_label(&mut self, label: &str) -> bool {
        let id = find_leaf(&self.tree, label);
        match id {
            Some(id) => self.select(&id),
            None => {
                self.selected = None;
                false
            }
        }
    }

    pub fn selected(&self) -> Option<&Arc<Template>> {
        self.selected.as_ref()
    }

    /// Whether the "create" action is enabled
    pub fn has_result(&self) -> bool {
        self.selected.is_some()
    }

    /// Description pane text for the current selection
    pub fn description(&self) -> String {
        self.selected
            .as_deref()
            .map(describe)
            .unwrap_or_default()
    }

    /// Id of the accepted selection
    pub fn accept(&self) -> Option<TemplateId> {
        self.selected.as_ref().map(|t| t.id().to_string())
    }
}

fn find_leaf(node: &TemplateTreeNode, label: &str) -> Option<TemplateId> {
    match node {
        TemplateTreeNode::Leaf {
            label: leaf_label,
            template,
        } if leaf_label == label => Some(template.clone()),
        TemplateTreeNode::Leaf { .. } => None,
        TemplateTreeNode::Branch { children, .. } => {
            children.iter().find_map(|child| find_leaf(child, label))
        }
    }
}

/// Description of a template followed by its inputs
pub fn describe(template: &Template) -> String {
    let mut text = format!("{}\n\nInputs:", template.description());
    for parameter in template.parameters() {
        text.push_str(&format!("\n- {} ({})", parameter.name, parameter.type_tag.short_name()));
        if let Some(description) = parameter.description.as_deref().filter(|d| !d.is_empty()) {
            text.push_str(&format!(": {}", description));
        }
        if parameter.optional {
            text.push_str(&format!(", default = {}", parameter.default_text()));
        }
    }
    text
}

/// Picker that filters and selects by label without user interaction
#[derive(Debug, Clone, Default)]
pub struct ScriptedPicker {
    pub filter: String,
    pub label: String,
}

impl ScriptedPicker {
    pub fn new(filter: &str, label: &str) -> Self {
        Self {
            filter: filter.to_string(),
            label: label.to_string(),
        }
    }

    /// Picker that always cancels
    pub fn cancelling() -> Self {
        Self::default()
    }
}

impl TemplatePicker for ScriptedPicker {
    fn pick(&mut self, session: &mut PickerSession<'_>) -> Option<TemplateId> {
        if self.label.is_empty() {
            return None;
        }
        session.set_filter(&self.filter);
        session.select_by_label(&self.label);
        session.accept()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::template::{ConstructorSpec, SchemaType, TemplateInfo, TemplateParameter};
    use crate::model::{Base, TypeTag, Value};

    fn catalog() -> TemplateCatalog {
        let mut catalog = TemplateCatalog::new();
        catalog.register_type(
            SchemaType::new("Objects.Other.Tag").with_constructor(
                ConstructorSpec::new(TemplateInfo::new("Tag", "Creates a tag", "Other", "Tags"), |_| {
                    Ok(Base::new("Objects.Other.Tag"))
                })
                .with_parameters(vec![
                    TemplateParameter::required("name", TypeTag::Text).with_description("Tag text"),
                    TemplateParameter::optional("count", TypeTag::Int, Value::Int(3)),
                ]),
            ),
        );
        catalog.register_type(SchemaType::new("Objects.Other.Marker").with_constructor(
            ConstructorSpec::new(TemplateInfo::new("Marker", "", "Other", "Tags"), |_| {
                Ok(Base::new("Objects.Other.Marker"))
            }),
        ));
        catalog
    }

    #[test]
    fn test_describe_lists_inputs() {
        let catalog = catalog();
        let template = catalog.get("Objects.Other.Tag.ctor(Text,Int)").unwrap();
        assert_eq!(
            describe(&template),
            "Creates a tag\n\nInputs:\n- name (Text): Tag text\n- count (Int), default = 3"
        );
    }

    #[test]
    fn test_selection_follows_filter() {
        let catalog = catalog();
        let mut session = PickerSession::new(&catalog);
        assert!(!session.has_result());

        assert!(session.select_by_label("Marker"));
        assert!(session.has_result());

        session.set_filter("tag");
        assert!(!session.select("Objects.Other.Marker.ctor()"));
        assert!(!session.has_result());
        assert!(session.select_by_label("Tag"));
        assert!(session.description().starts_with("Creates a tag"));
        assert_eq!(session.accept().as_deref(), Some("Objects.Other.Tag.ctor(Text,Int)"));
    }

    #[test]
    fn test_scripted_picker() {
        let catalog = catalog();
        let mut session = PickerSession::new(&catalog);
        assert_eq!(
            ScriptedPicker::new("mark", "Marker").pick(&mut session).as_deref(),
            Some("Objects.Other.Marker.ctor()")
        );
        assert!(ScriptedPicker::cancelling().pick(&mut session).is_none());
        assert!(ScriptedPicker::new("mark", "Tag").pick(&mut session).is_none());
    }
}
