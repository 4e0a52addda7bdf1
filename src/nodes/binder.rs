//! Generates a node's input interface from its selected template

use super::schema_node::SchemaNode;
use super::slot::InputSlot;
use crate::catalog::{Template, TemplateParameter};
use crate::model::{EnumType, Value};
use crate::settings::ChoiceOrder;
use log::debug;
use std::sync::Arc;

/// One entry of a generated choice list
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ChoiceItem {
    pub name: String,
    pub value: Value,
}

/// Request for a choice-list helper wired into an enumerated-choice slot
#[derive(Debug, Clone, PartialEq)]
pub struct ChoiceListRequest {
    pub slot_index: usize,
    pub parameter_name: String,
    pub items: Vec<ChoiceItem>,
}

/// Items for an enumerated-choice type in the requested order
pub fn choice_items(enum_type: &EnumType, order: ChoiceOrder) -> Vec<ChoiceItem> {
    match order {
        ChoiceOrder::Alphabetical => {
            let mut members = enum_type.members.clone();
            members.sort_by(|a, b| a.0.cmp(&b.0));
            members
                .into_iter()
                .map(|(name, value)| ChoiceItem {
                    name,
                    value: Value::Int(value),
                })
                .collect()
        }
        ChoiceOrder::Declaration => enum_type
            .members
            .iter()
            .enumerate()
            .map(|(index, (name, _))| ChoiceItem {
                name: name.clone(),
                value: Value::Int(index as i64),
            })
            .collect(),
    }
}

/// Whether a reused slot may keep its stored values
fn same_contract(old: &TemplateParameter, new: &TemplateParameter) -> bool {
    old.type_tag == new.type_tag && old.optional == new.optional && old.default == new.default
}

fn refresh_slot(slot: &mut InputSlot, previous: Option<&TemplateParameter>, parameter: &TemplateParameter) {
    let fresh = InputSlot::from_parameter(parameter);
    slot.description = fresh.description;
    slot.access = fresh.access;
    slot.optional = fresh.optional;
    if !previous.is_some_and(|old| same_contract(old, parameter)) {
        slot.persistent_data = fresh.persistent_data;
    }
}

/// Replace the node's template-governed slots with slots for `template`.
///
/// Slots at the same position with the same name keep their wiring. Their stored data is
/// kept only when the parameter's type, optionality and default are unchanged, and is
/// reset to the new default otherwise. Free-form slots keep their order after the new prefix.
pub fn bind(node: &mut SchemaNode, template: Arc<Template>, order: ChoiceOrder) -> Vec<ChoiceListRequest> {
    let governed = node.inputs.iter().take_while(|slot| slot.is_template()).count();
    let free_tail = node.inputs.split_off(governed);
    let mut old_prefix: Vec<Option<InputSlot>> = node.inputs.drain(..).map(Some).collect();
    let previous = node.template.clone();

    let mut requests = Vec::new();
    let mut prefix = Vec::with_capacity(template.parameter_count());

    for (index, parameter) in template.parameters().iter().enumerate() {
        let reused = match old_prefix.get_mut(index) {
            Some(old) if old.as_ref().is_some_and(|slot| slot.name == parameter.name) => old.take(),
            _ => None,
        };

        let slot = match reused {
            Some(mut slot) => {
                let old_parameter = previous.as_ref().and_then(|t| t.parameters().get(index));
                refresh_slot(&mut slot, old_parameter, parameter);
                slot
            }
            None => InputSlot::from_parameter(parameter),
        };

        if let Some(enum_type) = parameter.type_tag.as_enum() {
            if slot.source.is_none() {
                requests.push(ChoiceListRequest {
                    slot_index: index,
                    parameter_name: parameter.name.clone(),
                    items: choice_items(enum_type, order),
                });
            }
        }
        prefix.push(slot);
    }

    debug!(
        "Bound '{}' to node {}: {} template slot(s), {} free-form slot(s) kept",
        template.name(),
        node.id,
        prefix.len(),
        free_tail.len()
    );

    prefix.extend(free_tail);
    node.inputs = prefix;
    node.name = template.name().to_string();
    node.description = template.description().to_string();
    node.message = Some(template.root_namespace().to_string());
    node.output_label = template.declaring_type_name().to_string();
    node.template = Some(template);
    node.clear_read_failed();
    node.request_expire();

    requests
}

impl SchemaNode {
    /// Bind `template` using this node's configured choice-list order
    pub fn bind_template(&mut self, template: Arc<Template>) -> Vec<ChoiceListRequest> {
        let order = self.choice_order();
        bind(self, template, order)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{ConstructorSpec, SchemaType, TemplateCatalog, TemplateInfo};
    use crate::kit;
    use crate::model::{Base, TypeTag};
    use crate::settings::BuilderSettings;

    fn marker_catalog() -> TemplateCatalog {
        let mut catalog = TemplateCatalog::new();
        catalog.register_type(
            SchemaType::new("Test.Marker")
                .with_constructor(
                    ConstructorSpec::new(TemplateInfo::new("Counted", "", "Test", "Markers"), |_| {
                        Ok(Base::new("Test.Marker"))
                    })
                    .with_parameters(vec![TemplateParameter::optional(
                        "count",
                        TypeTag::Int,
                        Value::Int(3),
                    )]),
                )
                .with_constructor(
                    ConstructorSpec::new(TemplateInfo::new("Labelled", "", "Test", "Markers"), |_| {
                        Ok(Base::new("Test.Marker"))
                    })
                    .with_parameters(vec![TemplateParameter::required("count", TypeTag::Text)]),
                )
                .with_constructor(
                    ConstructorSpec::new(TemplateInfo::new("Scaled", "", "Test", "Markers"), |_| {
                        Ok(Base::new("Test.Marker"))
                    })
                    .with_parameters(vec![
                        TemplateParameter::optional("count", TypeTag::Int, Value::Int(3)),
                        TemplateParameter::required("scale", TypeTag::Float),
                    ]),
                ),
        );
        catalog
    }

    #[test]
    fn test_optional_slots_get_defaults() {
        // Tag(name: Text, count: Int = 3)
        let catalog = kit::catalog();
        let mut node = SchemaNode::new(&BuilderSettings::default());
        let requests = node.bind_template(catalog.get(kit::other::TAG_ID).unwrap());

        assert!(requests.is_empty());
        let inputs = node.inputs();
        assert_eq!(inputs.len(), 2);
        assert_eq!(inputs[0].nickname, "name");
        assert!(!inputs[0].optional);
        assert!(inputs[1].optional);
        assert_eq!(inputs[1].persistent_data, vec![Value::Int(3)]);
        assert_eq!(node.name, "Tag");
        assert_eq!(node.message.as_deref(), Some("Objects"));
        assert_eq!(node.output_label, "Tag");
    }

    #[test]
    fn test_rebinding_keeps_free_form_tail() {
        let catalog = kit::catalog();
        let mut node = SchemaNode::new(&BuilderSettings::default());
        node.bind_template(catalog.get(kit::other::TAG_ID).unwrap());
        node.insert_slot(2).unwrap();
        node.insert_slot(3).unwrap();
        node.inputs[2].source = Some(42);

        node.bind_template(catalog.get(kit::elements::LEVEL_ID).unwrap());
        let names: Vec<&str> = node.inputs().iter().map(|s| s.nickname.as_str()).collect();
        assert_eq!(names, vec!["name", "elevation", "A", "B"]);
        assert_eq!(node.inputs()[2].source, Some(42));
        assert!(node.inputs()[2].is_free_form());
        assert_eq!(node.output_label, "Level");
    }

    #[test]
    fn test_same_name_slot_keeps_wiring() {
        let catalog = kit::catalog();
        let mut node = SchemaNode::new(&BuilderSettings::default());
        node.bind_template(catalog.get(kit::other::TAG_ID).unwrap());
        node.inputs[0].source = Some(9);
        node.inputs[1].source = Some(10);

        // Level's first parameter is also `name`; its second differs from `count`
        node.bind_template(catalog.get(kit::elements::LEVEL_ID).unwrap());
        assert_eq!(node.inputs()[0].source, Some(9));
        assert_eq!(node.inputs()[1].source, None);
        assert_eq!(node.inputs()[1].description, "(Float) Level elevation, default = 0");
    }

    #[test]
    fn test_enum_parameters_request_choice_lists() {
        let catalog = kit::catalog();
        let template = catalog.get(kit::elements::WALL_BY_TYPE_ID).unwrap();
        let location = template
            .parameters()
            .iter()
            .position(|p| p.type_tag.as_enum().is_some())
            .unwrap();

        let mut node = SchemaNode::new(&BuilderSettings::default());
        let requests = node.bind_template(template.clone());
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].slot_index, location);
        let names: Vec<&str> = requests[0].items.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, vec!["Centerline", "CoreCenterline", "Exterior", "Interior"]);
        assert_eq!(requests[0].items[1].value, Value::Int(3));

        let mut prebound = SchemaNode::prebound(template.clone(), &BuilderSettings::default());
        let requests = prebound.bind_template(template);
        let names: Vec<&str> = requests[0].items.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, vec!["Centerline", "Exterior", "Interior", "CoreCenterline"]);
        assert_eq!(requests[0].items[3].value, Value::Int(3));
    }

    #[test]
    fn test_same_name_slot_resets_data_when_type_changes() {
        let catalog = marker_catalog();
        let mut node = SchemaNode::new(&BuilderSettings::default());
        node.bind_template(catalog.get("Test.Marker.ctor(Int)").unwrap());
        node.inputs[0].source = Some(5);
        node.inputs[0].persistent_data = vec![Value::Int(8)];

        node.bind_template(catalog.get("Test.Marker.ctor(Text)").unwrap());
        let slot = &node.inputs()[0];
        assert_eq!(slot.source, Some(5));
        assert!(slot.persistent_data.is_empty());
        assert!(!slot.optional);
        assert_eq!(slot.description, "(Text)");
    }

    #[test]
    fn test_same_name_slot_keeps_data_when_contract_matches() {
        let catalog = marker_catalog();
        let mut node = SchemaNode::new(&BuilderSettings::default());
        node.bind_template(catalog.get("Test.Marker.ctor(Int)").unwrap());
        node.inputs[0].persistent_data = vec![Value::Int(8)];

        node.bind_template(catalog.get("Test.Marker.ctor(Int,Float)").unwrap());
        assert_eq!(node.inputs()[0].persistent_data, vec![Value::Int(8)]);
        assert!(node.inputs()[1].persistent_data.is_empty());
    }
}
