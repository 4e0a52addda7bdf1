//! Input slots of a schema node

use crate::catalog::{Access, TemplateParameter};
use crate::constants::slot::NICKNAME_ALPHABET;
use crate::model::Value;
use serde::{Deserialize, Serialize};

/// Unique identifier for a node in a document
pub type NodeId = usize;

/// Whether a slot is governed by the selected template or added by the user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SlotKind {
    Template,
    FreeForm,
}

/// Represents one input on a schema node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputSlot {
    pub name: String,
    pub nickname: String,
    pub description: String,
    pub access: Access,
    pub optional: bool,
    pub kind: SlotKind,
    /// Whether the user may rename this slot
    pub mutable_name: bool,
    /// Values used when nothing is wired in
    pub persistent_data: Vec<Value>,
    /// Upstream node wired into this slot
    pub source: Option<NodeId>,
}

impl InputSlot {
    /// Creates a template-governed slot for `parameter`
    pub fn from_parameter(parameter: &TemplateParameter) -> Self {
        let persistent_data = match (&parameter.default, parameter.optional) {
            (Some(default), true) if !default.is_null() => vec![default.clone()],
            _ => Vec::new(),
        };
        Self {
            name: parameter.name.clone(),
            nickname: parameter.name.clone(),
            description: parameter.slot_description(),
            access: parameter.access(),
            optional: parameter.optional,
            kind: SlotKind::Template,
            mutable_name: false,
            persistent_data,
            source: None,
        }
    }

    /// Creates a user-added slot
    pub fn free_form(nickname: impl Into<String>) -> Self {
        let nickname = nickname.into();
        Self {
            name: nickname.clone(),
            nickname,
            description: String::new(),
            access: Access::Item,
            optional: false,
            kind: SlotKind::FreeForm,
            mutable_name: true,
            persistent_data: Vec::new(),
            source: None,
        }
    }

    pub fn is_template(&self) -> bool {
        self.kind == SlotKind::Template
    }

    pub fn is_free_form(&self) -> bool {
        self.kind == SlotKind::FreeForm
    }

    /// Replace the persistent data with a single value
    pub fn set_persistent(&mut self, value: Value) {
        self.persistent_data = vec![value];
    }
}

/// First nickname from `A`, `B`, `C`, `D`, then `A1`, `B1`, ... not already used by `slots`
pub fn invent_nickname(slots: &[InputSlot]) -> String {
    let taken = |candidate: &str| slots.iter().any(|slot| slot.nickname == candidate);
    let mut round = 0usize;
    loop {
        for letter in NICKNAME_ALPHABET.chars() {
            let candidate = if round == 0 {
                letter.to_string()
            } else {
                format!("{}{}", letter, round)
            };
            if !taken(&candidate) {
                return candidate;
            }
        }
        round += 1;
    }
}
