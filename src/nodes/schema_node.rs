//! The owning node: selected template, input slots, seed and attach mode

use super::debounce::{Debouncer, NameEdit};
use super::slot::{invent_nickname, InputSlot, NodeId};
use super::uniqueness::Seed;
use crate::catalog::{Access, Template};
use crate::constants::node;
use crate::error::DocumentError;
use crate::settings::{BuilderSettings, ChoiceOrder};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;

/// Severity of a message shown on a node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RuntimeMessageLevel {
    Error,
    Warning,
    Remark,
}

/// User-visible message raised during evaluation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuntimeMessage {
    pub level: RuntimeMessageLevel,
    pub text: String,
}

/// How the node obtained its template
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeKind {
    /// Template chosen through the picker after insertion
    Picker,
    /// Template fixed when the node was created; declared type is the template name
    Prebound { node_type: String },
}

/// A schema-driven construction node
#[derive(Debug, Clone)]
pub struct SchemaNode {
    pub id: NodeId,
    kind: NodeKind,
    pub name: String,
    pub description: String,
    /// Short text shown under the node, the template's root namespace once bound
    pub message: Option<String>,
    pub output_label: String,
    pub(crate) template: Option<Arc<Template>>,
    pub(crate) inputs: Vec<InputSlot>,
    seed: Seed,
    attach_mode: bool,
    user_set_attach_mode: bool,
    read_failed: bool,
    choice_order: ChoiceOrder,
    messages: Vec<RuntimeMessage>,
    debounce: Debouncer,
    expire_requested: bool,
}

impl SchemaNode {
    /// Creates an unbound picker node
    pub fn new(settings: &BuilderSettings) -> Self {
        Self {
            id: 0,
            kind: NodeKind::Picker,
            name: node::PICKER_NODE_NAME.to_string(),
            description: node::PICKER_NODE_DESCRIPTION.to_string(),
            message: None,
            output_label: node::DEFAULT_OUTPUT_LABEL.to_string(),
            template: None,
            inputs: Vec::new(),
            seed: Seed::generate(),
            attach_mode: false,
            user_set_attach_mode: false,
            read_failed: false,
            choice_order: settings.picker_choice_order,
            messages: Vec::new(),
            debounce: Debouncer::new(settings.debounce()),
            expire_requested: false,
        }
    }

    /// Creates a node fixed to `template`; slots are generated when it is added to a document
    pub fn prebound(template: Arc<Template>, settings: &BuilderSettings) -> Self {
        let mut node = Self::new(settings);
        node.kind = NodeKind::Prebound {
            node_type: template.name().to_string(),
        };
        node.name = template.name().to_string();
        node.description = template.description().to_string();
        node.choice_order = settings.prebound_choice_order;
        node.template = Some(template);
        node
    }

    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    pub(crate) fn restore_kind(&mut self, kind: NodeKind, settings: &BuilderSettings) {
        self.choice_order = match kind {
            NodeKind::Picker => settings.picker_choice_order,
            NodeKind::Prebound { .. } => settings.prebound_choice_order,
        };
        self.kind = kind;
    }

    /// Declared node type used to scope seed uniqueness
    pub fn declared_type(&self) -> &str {
        match &self.kind {
            NodeKind::Picker => node::PICKER_NODE_TYPE,
            NodeKind::Prebound { node_type } => node_type,
        }
    }

    pub fn template(&self) -> Option<&Arc<Template>> {
        self.template.as_ref()
    }

    /// Number of leading template-governed slots
    pub fn template_parameter_count(&self) -> usize {
        self.template.as_ref().map_or(0, |t| t.parameter_count())
    }

    pub fn inputs(&self) -> &[InputSlot] {
        &self.inputs
    }

    pub fn input(&self, index: usize) -> Option<&InputSlot> {
        self.inputs.get(index)
    }

    pub fn input_mut(&mut self, index: usize) -> Option<&mut InputSlot> {
        self.inputs.get_mut(index)
    }

    pub fn seed(&self) -> &Seed {
        &self.seed
    }

    pub fn set_seed(&mut self, seed: Seed) {
        self.seed = seed;
    }

    pub fn choice_order(&self) -> ChoiceOrder {
        self.choice_order
    }

    pub fn read_failed(&self) -> bool {
        self.read_failed
    }

    pub(crate) fn mark_read_failed(&mut self) {
        self.read_failed = true;
        self.template = None;
    }

    pub(crate) fn clear_read_failed(&mut self) {
        self.read_failed = false;
    }

    // Attach mode

    pub fn attach_mode(&self) -> bool {
        self.attach_mode
    }

    pub fn user_set_attach_mode(&self) -> bool {
        self.user_set_attach_mode
    }

    /// Attach mode can only be offered for templates with a carrier parameter
    pub fn attach_mode_available(&self) -> bool {
        self.template.as_ref().is_some_and(|t| t.carrier().is_some())
    }

    /// Menu text for the attach-mode toggle, when available
    pub fn attach_mode_label(&self) -> Option<String> {
        let template = self.template.as_ref()?;
        let carrier = template.carrier()?;
        Some(format!(
            "Convert as {} with {} attached",
            carrier.name,
            template.name()
        ))
    }

    /// Explicit user choice; enabling is refused without a carrier parameter
    pub fn set_attach_mode(&mut self, enabled: bool) -> Result<(), DocumentError> {
        if enabled && !self.attach_mode_available() {
            return Err(DocumentError::AttachModeUnavailable);
        }
        self.attach_mode = enabled;
        self.user_set_attach_mode = true;
        self.request_expire();
        Ok(())
    }

    /// Apply the document-wide default unless the user already chose
    pub fn apply_default_attach_mode(&mut self, default: bool) {
        if !self.user_set_attach_mode {
            self.attach_mode = default;
        }
    }

    pub(crate) fn restore_attach_mode(&mut self, attach_mode: bool, user_set: bool) {
        self.attach_mode = attach_mode;
        self.user_set_attach_mode = user_set;
    }

    pub(crate) fn force_attach_mode_off(&mut self) {
        self.attach_mode = false;
    }

    // Runtime messages

    pub fn messages(&self) -> &[RuntimeMessage] {
        &self.messages
    }

    pub fn add_message(&mut self, level: RuntimeMessageLevel, text: impl Into<String>) {
        self.messages.push(RuntimeMessage {
            level,
            text: text.into(),
        });
    }

    pub fn clear_messages(&mut self) {
        self.messages.clear();
    }

    pub fn has_errors(&self) -> bool {
        self.messages
            .iter()
            .any(|m| m.level == RuntimeMessageLevel::Error)
    }

    // Slot editing

    pub fn can_insert_slot(&self, index: usize) -> bool {
        index >= self.template_parameter_count() && index <= self.inputs.len()
    }

    pub fn can_remove_slot(&self, index: usize) -> bool {
        index >= self.template_parameter_count() && index < self.inputs.len()
    }

    /// Insert a free-form slot at `index` with an invented nickname
    pub fn insert_slot(&mut self, index: usize) -> Result<&InputSlot, DocumentError> {
        if index < self.template_parameter_count() {
            return Err(DocumentError::SlotGoverned { index });
        }
        if index > self.inputs.len() {
            return Err(DocumentError::SlotOutOfRange {
                node: self.id,
                index,
            });
        }
        let slot = InputSlot::free_form(invent_nickname(&self.inputs));
        self.inputs.insert(index, slot);
        self.request_expire();
        Ok(&self.inputs[index])
    }

    pub fn remove_slot(&mut self, index: usize) -> Result<InputSlot, DocumentError> {
        if index < self.template_parameter_count() {
            return Err(DocumentError::SlotGoverned { index });
        }
        if index >= self.inputs.len() {
            return Err(DocumentError::SlotOutOfRange {
                node: self.id,
                index,
            });
        }
        let removed = self.inputs.remove(index);
        self.request_expire();
        Ok(removed)
    }

    /// Toggle item/list access of a free-form slot
    pub fn set_slot_access(&mut self, index: usize, access: Access) -> Result<(), DocumentError> {
        let id = self.id;
        let slot = self
            .inputs
            .get_mut(index)
            .ok_or(DocumentError::SlotOutOfRange { node: id, index })?;
        if !slot.is_free_form() {
            return Err(DocumentError::SlotGoverned { index });
        }
        if slot.access != access {
            slot.access = access;
            self.request_expire();
        }
        Ok(())
    }

    /// Rename a free-form slot. Typing waits out the debounce; accepting re-evaluates now.
    pub fn rename_slot(
        &mut self,
        index: usize,
        name: &str,
        edit: NameEdit,
        now: Instant,
    ) -> Result<(), DocumentError> {
        let id = self.id;
        let slot = self
            .inputs
            .get_mut(index)
            .ok_or(DocumentError::SlotOutOfRange { node: id, index })?;
        if !slot.mutable_name {
            return Err(DocumentError::SlotNotRenamable { index });
        }
        slot.name = name.to_string();
        slot.nickname = name.to_string();

        match edit {
            NameEdit::Typing => {
                self.debounce.trigger(now);
            }
            NameEdit::Accepted => {
                self.debounce.cancel();
                self.request_expire();
            }
        }
        Ok(())
    }

    // Re-evaluation requests

    /// Check the rename debounce; an expired quiet period requests re-evaluation
    pub fn poll_debounce(&mut self, now: Instant) -> bool {
        if self.debounce.poll(now) {
            self.request_expire();
            true
        } else {
            false
        }
    }

    pub fn rename_pending(&self) -> bool {
        self.debounce.is_pending()
    }

    pub fn request_expire(&mut self) {
        self.expire_requested = true;
    }

    /// Take (and clear) the pending re-evaluation request
    pub fn take_expire_request(&mut self) -> bool {
        std::mem::take(&mut self.expire_requested)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kit;
    use std::time::Duration;

    fn bound_wall() -> SchemaNode {
        let catalog = kit::catalog();
        let template = catalog.get(kit::elements::WALL_ID).unwrap();
        let mut node = SchemaNode::new(&BuilderSettings::default());
        node.bind_template(template);
        node
    }

    #[test]
    fn test_picker_node_defaults() {
        let node = SchemaNode::new(&BuilderSettings::default());
        assert_eq!(node.declared_type(), "CreateSchemaObject");
        assert!(node.template().is_none());
        assert!(!node.attach_mode_available());
        assert_eq!(node.choice_order(), ChoiceOrder::Alphabetical);
    }

    #[test]
    fn test_insert_and_remove_respect_template_prefix() {
        let mut node = bound_wall();
        let n = node.template_parameter_count();
        assert!(!node.can_insert_slot(n - 1));
        assert!(node.can_insert_slot(n));
        assert!(matches!(node.insert_slot(0), Err(DocumentError::SlotGoverned { .. })));

        let slot = node.insert_slot(n).unwrap();
        assert_eq!(slot.nickname, "A");
        assert!(slot.mutable_name);
        assert!(!slot.optional);
        assert_eq!(node.insert_slot(n + 1).unwrap().nickname, "B");

        assert!(!node.can_remove_slot(n - 1));
        assert_eq!(node.remove_slot(n).unwrap().nickname, "A");
        assert!(matches!(node.remove_slot(n + 5), Err(DocumentError::SlotOutOfRange { .. })));
        assert!(matches!(node.remove_slot(0), Err(DocumentError::SlotGoverned { .. })));
    }

    #[test]
    fn test_template_slots_cannot_be_renamed() {
        let mut node = bound_wall();
        let now = Instant::now();
        assert!(matches!(
            node.rename_slot(0, "x", NameEdit::Accepted, now),
            Err(DocumentError::SlotNotRenamable { index: 0 })
        ));
        assert!(matches!(
            node.set_slot_access(0, Access::List),
            Err(DocumentError::SlotGoverned { index: 0 })
        ));
    }

    #[test]
    fn test_rename_debounce() {
        let mut node = bound_wall();
        let n = node.template_parameter_count();
        node.insert_slot(n).unwrap();
        node.take_expire_request();

        let start = Instant::now();
        node.rename_slot(n, "m", NameEdit::Typing, start).unwrap();
        node.rename_slot(n, "ma", NameEdit::Typing, start + Duration::from_millis(100)).unwrap();
        node.rename_slot(n, "mark", NameEdit::Typing, start + Duration::from_millis(200)).unwrap();
        assert!(!node.take_expire_request());
        assert!(!node.poll_debounce(start + Duration::from_millis(550)));
        assert!(node.poll_debounce(start + Duration::from_millis(600)));
        assert!(node.take_expire_request());
        assert!(!node.poll_debounce(start + Duration::from_secs(5)));
        assert_eq!(node.inputs()[n].name, "mark");

        node.rename_slot(n, "label", NameEdit::Accepted, start).unwrap();
        assert!(node.take_expire_request());
        assert!(!node.rename_pending());
    }

    #[test]
    fn test_attach_mode_requires_carrier() {
        let mut node = bound_wall();
        assert!(node.attach_mode_available());
        assert_eq!(
            node.attach_mode_label().as_deref(),
            Some("Convert as baseLine with Wall attached")
        );
        node.set_attach_mode(true).unwrap();
        assert!(node.user_set_attach_mode());
        node.apply_default_attach_mode(false);
        assert!(node.attach_mode());

        let catalog = kit::catalog();
        let mut level = SchemaNode::new(&BuilderSettings::default());
        level.bind_template(catalog.get(kit::elements::LEVEL_ID).unwrap());
        assert!(matches!(
            level.set_attach_mode(true),
            Err(DocumentError::AttachModeUnavailable)
        ));
        level.apply_default_attach_mode(true);
        assert!(level.attach_mode());
    }
}
