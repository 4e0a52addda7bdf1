//! Template catalog: registered schema types and the templates extracted from them

use super::template::{SchemaType, Template, TemplateDescriptor, TemplateId};
use crate::error::CatalogError;
use log::{debug, info, warn};
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

/// Hierarchical category used to group pre-bound node factories
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeCategory {
    path: Vec<String>,
}

impl NodeCategory {
    /// Create a new category from path components
    pub fn new(path: &[&str]) -> Self {
        Self {
            path: path
                .iter()
                .filter(|segment| !segment.is_empty())
                .map(|s| s.to_string())
                .collect(),
        }
    }

    pub fn path(&self) -> &[String] {
        &self.path
    }

    /// Get display string for UI
    pub fn display_string(&self) -> String {
        self.path.join(" > ")
    }
}

/// Entry used to create a node pre-bound to one template
#[derive(Debug, Clone)]
pub struct PreboundFactory {
    /// Declared node type; equals the template display name
    pub node_type: String,
    pub display_name: String,
    pub description: String,
    pub category: NodeCategory,
    pub template: Arc<Template>,
}

/// Catalog of constructible schema types
#[derive(Debug, Default)]
pub struct TemplateCatalog {
    types: BTreeMap<String, SchemaType>,
    extracted: BTreeMap<String, Result<Vec<Arc<Template>>, CatalogError>>,
}

impl TemplateCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a schema type; its templates are extracted immediately
    pub fn register_type(&mut self, schema_type: SchemaType) {
        let name = schema_type.full_name.clone();
        let extracted = Self::extract_templates(&schema_type).map(|templates| {
            templates.into_iter().map(Arc::new).collect::<Vec<_>>()
        });
        match &extracted {
            Ok(templates) => debug!("Registered {} with {} template(s)", name, templates.len()),
            Err(err) => warn!("Registered {} but its templates are unusable: {}", name, err),
        }
        self.extracted.insert(name.clone(), extracted);
        self.types.insert(name, schema_type);
    }

    /// Extract templates from every constructor carrying template metadata
    pub fn extract_templates(schema_type: &SchemaType) -> Result<Vec<Template>, CatalogError> {
        let mut names = HashSet::new();
        let mut templates = Vec::new();

        for spec in &schema_type.constructors {
            let Some(info) = &spec.info else {
                continue;
            };
            if !names.insert(info.name.clone()) {
                return Err(CatalogError::DuplicateTemplateName {
                    type_name: schema_type.full_name.clone(),
                    name: info.name.clone(),
                });
            }

            let mut parameter_names = HashSet::new();
            for parameter in &spec.parameters {
                if parameter.name.is_empty() {
                    return Err(CatalogError::EmptyParameterName {
                        template: info.name.clone(),
                    });
                }
                if !parameter_names.insert(parameter.name.as_str()) {
                    return Err(CatalogError::DuplicateParameter {
                        template: info.name.clone(),
                        parameter: parameter.name.clone(),
                    });
                }
                if !parameter.optional && parameter.default.is_some() {
                    return Err(CatalogError::DefaultOnRequired {
                        template: info.name.clone(),
                        parameter: parameter.name.clone(),
                    });
                }
            }
            if spec.parameters.iter().filter(|p| p.carrier).count() > 1 {
                return Err(CatalogError::MultipleCarriers {
                    template: info.name.clone(),
                });
            }

            let descriptor = TemplateDescriptor {
                id: Template::identity(&schema_type.full_name, &spec.parameters),
                declaring_type: schema_type.full_name.clone(),
                info: info.clone(),
                parameters: spec.parameters.clone(),
            };
            templates.push(Template::new(descriptor, spec.constructor.clone()));
        }

        Ok(templates)
    }

    pub fn type_count(&self) -> usize {
        self.types.len()
    }

    pub fn schema_type(&self, full_name: &str) -> Option<&SchemaType> {
        self.types.get(full_name)
    }

    /// Types whose templates extracted cleanly, in full-name order
    pub fn usable_types(&self) -> impl Iterator<Item = (&SchemaType, &[Arc<Template>])> {
        self.types.values().filter_map(move |schema_type| {
            match self.extracted.get(&schema_type.full_name) {
                Some(Ok(templates)) => Some((schema_type, templates.as_slice())),
                _ => None,
            }
        })
    }

    /// Types whose template metadata could not be extracted
    pub fn extraction_failures(&self) -> impl Iterator<Item = (&str, &CatalogError)> {
        self.extracted.iter().filter_map(|(name, extracted)| match extracted {
            Err(err) => Some((name.as_str(), err)),
            Ok(_) => None,
        })
    }

    /// Every usable template
    pub fn templates(&self) -> impl Iterator<Item = &Arc<Template>> {
        self.usable_types()
            .flat_map(|(_, templates)| templates.iter())
    }

    pub fn template_count(&self) -> usize {
        self.templates().count()
    }

    pub fn get(&self, id: &str) -> Option<Arc<Template>> {
        self.templates().find(|t| t.id() == id).cloned()
    }

    /// Resolve a persisted constructor identity back to a live template
    pub fn find_template(&self, constructor_id: &str, type_name: &str) -> Option<Arc<Template>> {
        let found = match self.extracted.get(type_name) {
            Some(Ok(templates)) => templates.iter().find(|t| t.id() == constructor_id).cloned(),
            _ => None,
        };
        if found.is_none() {
            info!("Template {} on {} could not be resolved", constructor_id, type_name);
        }
        found
    }

    /// Like [`TemplateCatalog::get`] but reports a missing template as an error
    pub fn require(&self, id: &TemplateId) -> Result<Arc<Template>, CatalogError> {
        self.get(id)
            .ok_or_else(|| CatalogError::TemplateNotFound(id.clone()))
    }

    /// One factory per usable template, for creating pre-bound nodes
    pub fn prebound_factories(&self) -> Vec<PreboundFactory> {
        self.templates()
            .map(|template| {
                let info = template.info();
                PreboundFactory {
                    node_type: info.name.clone(),
                    display_name: info.name.clone(),
                    description: info.description.clone(),
                    category: NodeCategory::new(&[&info.category, &info.subcategory]),
                    template: template.clone(),
                }
            })
            .collect()
    }

    /// Factories grouped by category, as a node menu would list them
    pub fn factories_by_category(&self) -> BTreeMap<NodeCategory, Vec<PreboundFactory>> {
        let mut grouped: BTreeMap<NodeCategory, Vec<PreboundFactory>> = BTreeMap::new();
        for factory in self.prebound_factories() {
            grouped
                .entry(factory.category.clone())
                .or_default()
                .push(factory);
        }
        grouped
    }
}
