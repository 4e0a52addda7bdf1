//! Filterable namespace tree of templates shown by the picker

use super::registry::TemplateCatalog;
use super::template::{Template, TemplateId};
use log::warn;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

/// Node of the template tree
#[derive(Debug, Clone, PartialEq)]
pub enum TemplateTreeNode {
    Branch {
        /// `"{segment} ({count})"`
        label: String,
        /// Dotted path of this branch, e.g. `Objects.BuiltElements`. A type branch and a
        /// namespace of the same full name share a key but are counted apart.
        key: String,
        count: usize,
        expanded: bool,
        children: Vec<TemplateTreeNode>,
    },
    Leaf {
        label: String,
        template: TemplateId,
    },
}

impl TemplateTreeNode {
    pub fn label(&self) -> &str {
        match self {
            TemplateTreeNode::Branch { label, .. } | TemplateTreeNode::Leaf { label, .. } => label,
        }
    }

    pub fn children(&self) -> &[TemplateTreeNode] {
        match self {
            TemplateTreeNode::Branch { children, .. } => children,
            TemplateTreeNode::Leaf { .. } => &[],
        }
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self, TemplateTreeNode::Leaf { .. })
    }

    /// Child with the given label
    pub fn child(&self, label: &str) -> Option<&TemplateTreeNode> {
        self.children().iter().find(|child| child.label() == label)
    }

    /// Every leaf template id beneath this node, depth first
    pub fn leaf_ids(&self) -> Vec<&TemplateId> {
        match self {
            TemplateTreeNode::Leaf { template, .. } => vec![template],
            TemplateTreeNode::Branch { children, .. } => {
                children.iter().flat_map(TemplateTreeNode::leaf_ids).collect()
            }
        }
    }

    /// Whether a leaf for `id` exists beneath this node
    pub fn contains(&self, id: &str) -> bool {
        self.leaf_ids().iter().any(|leaf| leaf.as_str() == id)
    }

    /// Indented text rendering, one line per node
    pub fn render(&self) -> String {
        let mut out = String::new();
        self.render_into(&mut out, 0);
        out
    }

    fn render_into(&self, out: &mut String, depth: usize) {
        out.push_str(&"  ".repeat(depth));
        out.push_str(self.label());
        out.push('\n');
        for child in self.children() {
            child.render_into(out, depth + 1);
        }
    }
}

/// Intermediate namespace level
#[derive(Default)]
struct NamespaceEntry {
    namespaces: BTreeMap<String, NamespaceEntry>,
    types: BTreeMap<String, TypeEntry>,
}

enum TypeEntry {
    Single(Arc<Template>),
    Constructors(BTreeMap<String, Arc<Template>>),
}

impl TemplateCatalog {
    /// Build the template tree, keeping types whose simple name contains `filter`
    /// (case-insensitive). Branches are expanded while a filter is active.
    pub fn build_tree(&self, filter: Option<&str>) -> TemplateTreeNode {
        let filter = filter.map(str::trim).unwrap_or_default().to_lowercase();
        let expanded = !filter.is_empty();

        for (name, err) in self.extraction_failures() {
            warn!("Skipping {} in template tree: {}", name, err);
        }

        let mut root = NamespaceEntry::default();
        let mut counts: HashMap<String, usize> = HashMap::new();

        for (schema_type, templates) in self.usable_types() {
            if templates.is_empty() {
                continue;
            }
            if !schema_type.simple_name().to_lowercase().contains(&filter) {
                continue;
            }

            let segments: Vec<&str> = schema_type
                .namespace()
                .split('.')
                .filter(|s| !s.is_empty())
                .collect();

            let mut level = &mut root;
            for segment in &segments {
                level = level.namespaces.entry(segment.to_string()).or_default();
            }

            let entry = if templates.len() == 1 {
                TypeEntry::Single(templates[0].clone())
            } else {
                TypeEntry::Constructors(
                    templates
                        .iter()
                        .map(|template| (template.name().to_string(), template.clone()))
                        .collect(),
                )
            };
            level
                .types
                .insert(schema_type.simple_name().to_string(), entry);

            // Every namespace prefix counts this type's templates
            let mut prefix = String::new();
            for segment in &segments {
                if !prefix.is_empty() {
                    prefix.push('.');
                }
                prefix.push_str(segment);
                *counts.entry(prefix.clone()).or_insert(0) += templates.len();
            }
        }

        let children = Self::namespace_children(root, "", &counts, expanded);
        let total = children.iter().map(Self::node_count).sum();
        TemplateTreeNode::Branch {
            label: format!("Templates ({})", total),
            key: String::new(),
            count: total,
            expanded: true,
            children,
        }
    }

    fn node_count(node: &TemplateTreeNode) -> usize {
        match node {
            TemplateTreeNode::Branch { count, .. } => *count,
            TemplateTreeNode::Leaf { .. } => 1,
        }
    }

    fn namespace_children(
        level: NamespaceEntry,
        parent_key: &str,
        counts: &HashMap<String, usize>,
        expanded: bool,
    ) -> Vec<TemplateTreeNode> {
        let child_key = |segment: &str| {
            if parent_key.is_empty() {
                segment.to_string()
            } else {
                format!("{}.{}", parent_key, segment)
            }
        };

        let mut children: Vec<(String, TemplateTreeNode)> = Vec::new();

        for (segment, namespace) in level.namespaces {
            let key = child_key(&segment);
            let count = counts.get(&key).copied().unwrap_or(0);
            let grandchildren = Self::namespace_children(namespace, &key, counts, expanded);
            children.push((
                segment.clone(),
                TemplateTreeNode::Branch {
                    label: format!("{} ({})", segment, count),
                    key,
                    count,
                    expanded,
                    children: grandchildren,
                },
            ));
        }

        for (type_name, entry) in level.types {
            let node = match entry {
                TypeEntry::Single(template) => TemplateTreeNode::Leaf {
                    label: template.name().to_string(),
                    template: template.id().to_string(),
                },
                TypeEntry::Constructors(constructors) => {
                    let key = child_key(&type_name);
                    let count = constructors.len();
                    TemplateTreeNode::Branch {
                        label: format!("{} ({})", type_name, count),
                        key,
                        count,
                        expanded,
                        children: constructors
                            .into_iter()
                            .map(|(name, template)| TemplateTreeNode::Leaf {
                                label: name,
                                template: template.id().to_string(),
                            })
                            .collect(),
                    }
                }
            };
            children.push((type_name, node));
        }

        children.sort_by(|a, b| a.0.cmp(&b.0));
        children.into_iter().map(|(_, node)| node).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::template::{ConstructorSpec, SchemaType, TemplateInfo, TemplateParameter};
    use crate::model::{Base, TypeTag};

    fn ctor(name: &str, parameters: Vec<TemplateParameter>) -> ConstructorSpec {
        ConstructorSpec::new(TemplateInfo::new(name, "", "BIM", "Test"), |_| {
            Ok(Base::new("Test"))
        })
        .with_parameters(parameters)
    }

    fn catalog() -> TemplateCatalog {
        let mut catalog = TemplateCatalog::new();
        catalog.register_type(
            SchemaType::new("A.Foo")
                .with_constructor(ctor("Foo basic", vec![]))
                .with_constructor(ctor(
                    "Foo detailed",
                    vec![TemplateParameter::required("size", TypeTag::Float)],
                )),
        );
        catalog.register_type(SchemaType::new("A.B.Bar").with_constructor(ctor("Bar", vec![])));
        catalog
    }

    #[test]
    fn test_tree_shape_and_counts() {
        let tree = catalog().build_tree(None);
        let a = tree.child("A (3)").expect("namespace A");
        assert!(matches!(a, TemplateTreeNode::Branch { expanded: false, .. }));

        let b = a.child("B (1)").expect("namespace B");
        let bar = b.child("Bar").expect("single constructor is a leaf");
        assert!(bar.is_leaf());

        let foo = a.child("Foo (2)").expect("multi-constructor type branch");
        let labels: Vec<&str> = foo.children().iter().map(|c| c.label()).collect();
        assert_eq!(labels, vec!["Foo basic", "Foo detailed"]);
        assert_eq!(tree.leaf_ids().len(), 3);
    }

    #[test]
    fn test_filter_is_case_insensitive_substring_on_simple_name() {
        let tree = catalog().build_tree(Some("BA"));
        let a = tree.child("A (1)").expect("A keeps only Bar");
        assert!(matches!(a, TemplateTreeNode::Branch { expanded: true, .. }));
        assert!(a.child("Foo (2)").is_none());
        assert_eq!(tree.leaf_ids(), vec!["A.B.Bar.ctor()"]);

        // Namespace segments are not matched
        let tree = catalog().build_tree(Some("A."));
        assert!(tree.children().is_empty());
    }

    #[test]
    fn test_types_without_templates_are_omitted() {
        let mut catalog = catalog();
        catalog.register_type(
            SchemaType::new("C.Hidden").with_constructor(ConstructorSpec::untagged(|_| Ok(Base::new("C.Hidden")))),
        );
        let tree = catalog.build_tree(None);
        assert!(tree.children().iter().all(|c| !c.label().starts_with("C ")));
    }

    #[test]
    fn test_type_and_namespace_with_same_name_count_apart() {
        let mut catalog = catalog();
        catalog.register_type(SchemaType::new("A.Foo.Baz").with_constructor(ctor("Baz", vec![])));
        let tree = catalog.build_tree(None);

        let a = tree.child("A (4)").expect("namespace A");
        let namespace = a.child("Foo (1)").expect("namespace Foo");
        assert!(namespace.child("Baz").is_some_and(TemplateTreeNode::is_leaf));
        let foo = a.child("Foo (2)").expect("type Foo");
        assert_eq!(foo.children().len(), 2);
    }

    #[test]
    fn test_render_indents_children() {
        let rendered = catalog().build_tree(Some("bar")).render();
        assert_eq!(rendered, "Templates (1)\n  A (1)\n    B (1)\n      Bar\n");
    }
}
