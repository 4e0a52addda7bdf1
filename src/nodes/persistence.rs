//! Saving and loading schema node state and whole documents
//!
//! Nodes persist the identity of their selected template rather than the template itself;
//! on load the identity is resolved against the live catalog.

use super::binder::bind;
use super::document::{ChoiceList, Document, DocumentObject};
use super::schema_node::{NodeKind, SchemaNode};
use super::slot::{InputSlot, NodeId};
use super::uniqueness::Seed;
use crate::catalog::{TemplateCatalog, TemplateId};
use crate::constants::document::SAVE_FORMAT_VERSION;
use crate::error::PersistenceError;
use crate::model::Value;
use crate::settings::BuilderSettings;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Persisted state of one schema node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaNodeState {
    pub id: NodeId,
    pub kind: NodeKind,
    pub selected_constructor: Option<TemplateId>,
    pub selected_type: Option<String>,
    pub attach_mode: bool,
    pub user_set_attach_mode: bool,
    pub seed: Seed,
    /// Upstream objects wired into template-governed slots, by slot index
    #[serde(default)]
    pub template_sources: BTreeMap<usize, NodeId>,
    /// Values stored on template-governed slots, by slot index
    #[serde(default)]
    pub template_data: BTreeMap<usize, Vec<Value>>,
    #[serde(default)]
    pub free_slots: Vec<InputSlot>,
}

impl SchemaNode {
    pub fn write_state(&self) -> SchemaNodeState {
        let template_count = self.template_parameter_count();
        SchemaNodeState {
            id: self.id,
            kind: self.kind().clone(),
            selected_constructor: self.template().map(|t| t.id().to_string()),
            selected_type: self.template().map(|t| t.declaring_type().to_string()),
            attach_mode: self.attach_mode(),
            user_set_attach_mode: self.user_set_attach_mode(),
            seed: self.seed().clone(),
            template_sources: self
                .inputs()
                .iter()
                .take(template_count)
                .enumerate()
                .filter_map(|(index, slot)| slot.source.map(|source| (index, source)))
                .collect(),
            template_data: self
                .inputs()
                .iter()
                .take(template_count)
                .enumerate()
                .map(|(index, slot)| (index, slot.persistent_data.clone()))
                .collect(),
            free_slots: self
                .inputs()
                .iter()
                .filter(|slot| slot.is_free_form())
                .cloned()
                .collect(),
        }
    }

    /// Rebuild a node from persisted state.
    ///
    /// A template that no longer resolves leaves the node in the read-failed state.
    pub fn read_state(
        state: &SchemaNodeState,
        catalog: &TemplateCatalog,
        settings: &BuilderSettings,
    ) -> SchemaNode {
        let mut node = SchemaNode::new(settings);
        node.id = state.id;
        node.restore_kind(state.kind.clone(), settings);
        node.set_seed(state.seed.clone());

        if let (Some(constructor), Some(type_name)) = (&state.selected_constructor, &state.selected_type) {
            match catalog.find_template(constructor, type_name) {
                Some(template) => {
                    let order = node.choice_order();
                    // Choice lists are restored with the document, not regenerated
                    bind(&mut node, template, order);
                    for (index, source) in &state.template_sources {
                        if let Some(slot) = node.input_mut(*index) {
                            slot.source = Some(*source);
                        }
                    }
                    for (index, data) in &state.template_data {
                        if let Some(slot) = node.input_mut(*index) {
                            slot.persistent_data = data.clone();
                        }
                    }
                }
                None => {
                    warn!(
                        "Node {}: template {} on {} is no longer available",
                        state.id, constructor, type_name
                    );
                    node.mark_read_failed();
                }
            }
        }

        node.restore_attach_mode(state.attach_mode, state.user_set_attach_mode);
        node.inputs.extend(state.free_slots.iter().cloned());
        node
    }
}

/// Save file data structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaveData {
    pub version: String,
    pub metadata: SaveMetadata,
    pub nodes: Vec<SchemaNodeState>,
    pub choice_lists: Vec<ChoiceList>,
}

/// Metadata for save files
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaveMetadata {
    pub created: String,  // RFC 3339 timestamp
    pub modified: String, // RFC 3339 timestamp
    pub creator: String,
    pub description: String,
}

impl SaveData {
    pub fn from_document(document: &Document) -> Self {
        let now = chrono::Utc::now().to_rfc3339();
        Self {
            version: SAVE_FORMAT_VERSION.to_string(),
            metadata: SaveMetadata {
                created: now.clone(),
                modified: now,
                creator: format!("schema-builder {}", env!("CARGO_PKG_VERSION")),
                description: "Schema node document".to_string(),
            },
            nodes: document.schema_nodes().map(SchemaNode::write_state).collect(),
            choice_lists: document.choice_lists().cloned().collect(),
        }
    }

    /// Rebuild a document; nodes are inserted in id order and run the seed uniqueness check
    pub fn into_document(
        self,
        catalog: &TemplateCatalog,
        settings: BuilderSettings,
    ) -> Result<Document, PersistenceError> {
        if self.version != SAVE_FORMAT_VERSION {
            return Err(PersistenceError::UnsupportedVersion(self.version));
        }

        let mut document = Document::new(settings);
        for list in self.choice_lists {
            let id = list.id;
            document.insert_with_id(id, DocumentObject::ChoiceList(list))?;
        }

        let mut states = self.nodes;
        states.sort_by_key(|state| state.id);
        for state in &states {
            let node = SchemaNode::read_state(state, catalog, document.settings());
            document.insert_with_id(state.id, DocumentObject::Schema(node))?;
            document.settle_loaded(state.id)?;
        }
        Ok(document)
    }
}

pub fn document_to_json(document: &Document) -> Result<String, PersistenceError> {
    Ok(serde_json::to_string_pretty(&SaveData::from_document(document))?)
}

pub fn document_from_json(
    json: &str,
    catalog: &TemplateCatalog,
    settings: BuilderSettings,
) -> Result<Document, PersistenceError> {
    let save_data: SaveData = serde_json::from_str(json)?;
    save_data.into_document(catalog, settings)
}

/// Save a document to a file
pub fn save_to_file(path: &Path, document: &Document) -> Result<(), PersistenceError> {
    let json = document_to_json(document)?;
    std::fs::write(path, json)?;
    info!("Saved {} object(s) to {}", document.len(), path.display());
    Ok(())
}

/// Load a document from a file
pub fn load_from_file(
    path: &Path,
    catalog: &TemplateCatalog,
    settings: BuilderSettings,
) -> Result<Document, PersistenceError> {
    let json = std::fs::read_to_string(path)?;
    let document = document_from_json(&json, catalog, settings)?;
    info!("Loaded {} object(s) from {}", document.len(), path.display());
    Ok(document)
}
