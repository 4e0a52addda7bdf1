//! Document holding schema nodes, their choice-list helpers and the wiring between them

use super::binder::{ChoiceItem, ChoiceListRequest};
use super::debounce::NameEdit;
use super::evaluation::{EvaluationContext, SlotData, SolveInputs};
use super::schema_node::{NodeKind, SchemaNode};
use super::slot::NodeId;
use super::uniqueness::{ensure_unique, Seed, SiblingSeedLookup};
use crate::catalog::{PickerSession, PreboundFactory, Template, TemplateCatalog, TemplatePicker};
use crate::constants::slot::CHOICE_LIST_DESCRIPTION;
use crate::error::DocumentError;
use crate::model::{Base, Value};
use crate::settings::BuilderSettings;
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;

/// Helper node offering the members of an enumerated-choice type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChoiceList {
    pub id: NodeId,
    pub name: String,
    pub nickname: String,
    pub description: String,
    pub items: Vec<ChoiceItem>,
    pub selected: usize,
}

impl ChoiceList {
    pub fn from_request(request: &ChoiceListRequest) -> Self {
        Self {
            id: 0,
            name: request.parameter_name.clone(),
            nickname: format!("{}:", request.parameter_name),
            description: CHOICE_LIST_DESCRIPTION.to_string(),
            items: request.items.clone(),
            selected: 0,
        }
    }

    /// Value of the selected item
    pub fn output(&self) -> Value {
        self.items
            .get(self.selected)
            .map(|item| item.value.clone())
            .unwrap_or(Value::Null)
    }

    /// Select the item named `name`
    pub fn select(&mut self, name: &str) -> bool {
        match self.items.iter().position(|item| item.name == name) {
            Some(index) => {
                self.selected = index;
                true
            }
            None => false,
        }
    }
}

/// Any object placed in a document
#[derive(Debug, Clone)]
pub enum DocumentObject {
    Schema(SchemaNode),
    ChoiceList(ChoiceList),
}

/// Represents a connection from an upstream object into a schema node slot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Wire {
    pub from: NodeId,
    pub to_node: NodeId,
    pub to_slot: usize,
}

/// A document of schema nodes
#[derive(Debug)]
pub struct Document {
    settings: BuilderSettings,
    objects: BTreeMap<NodeId, DocumentObject>,
    next_id: NodeId,
    expired: Vec<NodeId>,
}

impl Document {
    pub fn new(settings: BuilderSettings) -> Self {
        Self {
            settings,
            objects: BTreeMap::new(),
            next_id: 0,
            expired: Vec::new(),
        }
    }

    pub fn settings(&self) -> &BuilderSettings {
        &self.settings
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    fn insert_object(&mut self, mut object: DocumentObject) -> NodeId {
        let id = self.next_id;
        match &mut object {
            DocumentObject::Schema(node) => node.id = id,
            DocumentObject::ChoiceList(list) => list.id = id,
        }
        self.objects.insert(id, object);
        self.next_id += 1;
        id
    }

    /// Insert an object under a fixed id (used when loading)
    pub(crate) fn insert_with_id(&mut self, id: NodeId, object: DocumentObject) -> Result<(), DocumentError> {
        if self.objects.contains_key(&id) {
            return Err(DocumentError::DuplicateId(id));
        }
        self.objects.insert(id, object);
        if id >= self.next_id {
            self.next_id = id + 1;
        }
        Ok(())
    }

    /// Add a schema node and run its insertion logic.
    ///
    /// Returns `None` when the node was removed again because the picker was cancelled.
    pub fn add_node(
        &mut self,
        node: SchemaNode,
        catalog: &TemplateCatalog,
        picker: Option<&mut dyn TemplatePicker>,
    ) -> Result<Option<NodeId>, DocumentError> {
        let id = self.insert_object(DocumentObject::Schema(node));
        self.on_added(id, catalog, picker)
    }

    /// Create and add a node pre-bound to the factory's template
    pub fn add_prebound(
        &mut self,
        factory: &PreboundFactory,
        catalog: &TemplateCatalog,
    ) -> Result<NodeId, DocumentError> {
        let node = SchemaNode::prebound(factory.template.clone(), &self.settings);
        let id = self.insert_object(DocumentObject::Schema(node));
        self.on_added(id, catalog, None)?;
        Ok(id)
    }

    fn on_added(
        &mut self,
        id: NodeId,
        catalog: &TemplateCatalog,
        picker: Option<&mut dyn TemplatePicker>,
    ) -> Result<Option<NodeId>, DocumentError> {
        if !self.settle_loaded(id)? {
            return Ok(Some(id));
        }

        let node = self.node(id)?;
        let template = node.template().cloned();
        let needs_slots = node.inputs().is_empty();
        let is_picker = matches!(node.kind(), NodeKind::Picker);

        match template {
            Some(template) if needs_slots => self.bind_template(id, template)?,
            Some(_) => {}
            None if is_picker => {
                let Some(picker) = picker else {
                    debug!("Node {} added without a picker; left unbound", id);
                    return Ok(Some(id));
                };
                let chosen = {
                    let mut session = PickerSession::new(catalog);
                    picker.pick(&mut session)
                };
                match chosen.and_then(|template_id| catalog.get(&template_id)) {
                    Some(template) => self.bind_template(id, template)?,
                    None => {
                        info!("Template selection cancelled; removing node {}", id);
                        self.remove_object(id);
                        return Ok(None);
                    }
                }
            }
            None => {}
        }
        Ok(Some(id))
    }

    /// Apply the default attach mode and the seed uniqueness check.
    ///
    /// Returns `false` for nodes whose template failed to resolve, which are left untouched.
    pub(crate) fn settle_loaded(&mut self, id: NodeId) -> Result<bool, DocumentError> {
        let default_attach_mode = self.settings.default_attach_mode;
        let node = self.node_mut(id)?;
        if node.read_failed() {
            return Ok(false);
        }
        node.apply_default_attach_mode(default_attach_mode);
        self.check_unique(id)?;
        Ok(true)
    }

    /// Regenerate the node's seed if a sibling of the same declared type shares it
    fn check_unique(&mut self, id: NodeId) -> Result<bool, DocumentError> {
        let Some(DocumentObject::Schema(mut node)) = self.objects.remove(&id) else {
            return Err(DocumentError::NotSchemaNode(id));
        };
        let regenerated = ensure_unique(&mut node, &*self);
        self.objects.insert(id, DocumentObject::Schema(node));
        Ok(regenerated)
    }

    /// Bind a template to a node, creating and wiring choice lists for its enumerated parameters
    pub fn bind_template(&mut self, id: NodeId, template: Arc<Template>) -> Result<(), DocumentError> {
        let requests = self.node_mut(id)?.bind_template(template);
        for request in requests {
            let list_id = self.insert_object(DocumentObject::ChoiceList(ChoiceList::from_request(&request)));
            self.connect(list_id, id, request.slot_index)?;
        }
        Ok(())
    }

    /// Remove an object and every wire it feeds
    pub fn remove_object(&mut self, id: NodeId) -> Option<DocumentObject> {
        let removed = self.objects.remove(&id)?;
        for object in self.objects.values_mut() {
            if let DocumentObject::Schema(node) = object {
                for slot in node.inputs.iter_mut().filter(|slot| slot.source == Some(id)) {
                    slot.source = None;
                }
            }
        }
        self.expired.retain(|expired| *expired != id);
        Some(removed)
    }

    pub fn object(&self, id: NodeId) -> Option<&DocumentObject> {
        self.objects.get(&id)
    }

    pub fn node(&self, id: NodeId) -> Result<&SchemaNode, DocumentError> {
        match self.objects.get(&id) {
            Some(DocumentObject::Schema(node)) => Ok(node),
            Some(_) => Err(DocumentError::NotSchemaNode(id)),
            None => Err(DocumentError::NodeNotFound(id)),
        }
    }

    pub fn node_mut(&mut self, id: NodeId) -> Result<&mut SchemaNode, DocumentError> {
        match self.objects.get_mut(&id) {
            Some(DocumentObject::Schema(node)) => Ok(node),
            Some(_) => Err(DocumentError::NotSchemaNode(id)),
            None => Err(DocumentError::NodeNotFound(id)),
        }
    }

    pub fn schema_nodes(&self) -> impl Iterator<Item = &SchemaNode> {
        self.objects.values().filter_map(|object| match object {
            DocumentObject::Schema(node) => Some(node),
            DocumentObject::ChoiceList(_) => None,
        })
    }

    pub fn choice_lists(&self) -> impl Iterator<Item = &ChoiceList> {
        self.objects.values().filter_map(|object| match object {
            DocumentObject::ChoiceList(list) => Some(list),
            DocumentObject::Schema(_) => None,
        })
    }

    pub fn choice_list_mut(&mut self, id: NodeId) -> Option<&mut ChoiceList> {
        match self.objects.get_mut(&id) {
            Some(DocumentObject::ChoiceList(list)) => Some(list),
            _ => None,
        }
    }

    /// Choice list wired into a node's slot, if any
    pub fn choice_list_for(&self, node: NodeId, slot: usize) -> Option<&ChoiceList> {
        let source = self.node(node).ok()?.input(slot)?.source?;
        match self.objects.get(&source) {
            Some(DocumentObject::ChoiceList(list)) => Some(list),
            _ => None,
        }
    }

    /// Wire `from` into slot `to_slot` of `to_node`, replacing any existing wire
    pub fn connect(&mut self, from: NodeId, to_node: NodeId, to_slot: usize) -> Result<(), DocumentError> {
        if from == to_node {
            return Err(DocumentError::SelfConnection(from));
        }
        if !self.objects.contains_key(&from) {
            return Err(DocumentError::NodeNotFound(from));
        }
        let node = self.node_mut(to_node)?;
        let slot = node
            .input_mut(to_slot)
            .ok_or(DocumentError::SlotOutOfRange {
                node: to_node,
                index: to_slot,
            })?;
        slot.source = Some(from);
        node.request_expire();
        Ok(())
    }

    /// Every wire in the document, derived from slot sources
    pub fn wires(&self) -> Vec<Wire> {
        self.schema_nodes()
            .flat_map(|node| {
                node.inputs()
                    .iter()
                    .enumerate()
                    .filter_map(move |(index, slot)| {
                        slot.source.map(|from| Wire {
                            from,
                            to_node: node.id,
                            to_slot: index,
                        })
                    })
            })
            .collect()
    }

    /// Fill slots fed by choice lists that `inputs` leaves unset
    pub fn gather_inputs(&self, id: NodeId, mut inputs: SolveInputs) -> Result<SolveInputs, DocumentError> {
        let node = self.node(id)?;
        for (index, slot) in node.inputs().iter().enumerate() {
            if inputs.has(index) {
                continue;
            }
            if let Some(DocumentObject::ChoiceList(list)) = slot.source.and_then(|s| self.objects.get(&s)) {
                inputs.set(index, SlotData::Item(list.output()));
            }
        }
        Ok(inputs)
    }

    /// Solve one iteration of a node with wired choice lists applied
    pub fn solve(
        &mut self,
        id: NodeId,
        inputs: SolveInputs,
        ctx: &EvaluationContext<'_>,
    ) -> Result<Option<Base>, DocumentError> {
        let inputs = self.gather_inputs(id, inputs)?;
        let node = self.node_mut(id)?;
        node.clear_messages();
        Ok(node.solve(&inputs, ctx))
    }

    pub fn rename_slot(
        &mut self,
        id: NodeId,
        index: usize,
        name: &str,
        edit: NameEdit,
        now: Instant,
    ) -> Result<(), DocumentError> {
        self.node_mut(id)?.rename_slot(index, name, edit, now)
    }

    /// Poll debounces and collect nodes that requested re-evaluation since the last pump
    pub fn pump(&mut self, now: Instant) -> Vec<NodeId> {
        let mut fired = Vec::new();
        for (id, object) in self.objects.iter_mut() {
            if let DocumentObject::Schema(node) = object {
                node.poll_debounce(now);
                if node.take_expire_request() {
                    fired.push(*id);
                }
            }
        }
        for id in &fired {
            if !self.expired.contains(id) {
                self.expired.push(*id);
            }
        }
        fired
    }

    /// Drain the queue of nodes awaiting re-evaluation
    pub fn take_expired(&mut self) -> Vec<NodeId> {
        std::mem::take(&mut self.expired)
    }
}

impl SiblingSeedLookup for Document {
    fn find_collision(&self, declared_type: &str, seed: &Seed, exclude: NodeId) -> Option<NodeId> {
        self.schema_nodes()
            .filter(|node| node.declared_type() == declared_type)
            .take(self.settings.sibling_scan_cap)
            .find(|node| node.id != exclude && node.seed() == seed)
            .map(|node| node.id)
    }
}
