//! Construction and attachment engine
//!
//! Evaluates a bound schema node for one iteration:
//! - Reads and coerces the template-governed inputs
//! - Invokes the template constructor
//! - Stamps the application id and units
//! - Attaches the result to its carrier object when attach mode is on
//! - Copies free-form inputs onto the output as named members

use super::coercion::Coercer;
use super::schema_node::{RuntimeMessageLevel, SchemaNode};
use crate::catalog::Access;
use crate::constants::{messages, ATTACHED_SCHEMA_KEY};
use crate::error::{ConversionError, EvaluationError};
use crate::model::{try_convert_item, Base, CastTable, DomainConverter, Value};
use log::{debug, error};
use std::collections::BTreeMap;

/// Per-iteration access to the values wired into a node's slots
pub trait DataAccess {
    /// Index of the current iteration within the solve batch
    fn iteration(&self) -> usize;

    /// Single value for an item-access slot; `None` when nothing is wired in
    fn item(&self, slot: usize) -> Option<Value>;

    /// All values for a list-access slot; `None` when nothing is wired in
    fn list(&self, slot: usize) -> Option<Vec<Value>>;
}

/// Data supplied to one slot for one iteration
#[derive(Debug, Clone, PartialEq)]
pub enum SlotData {
    Item(Value),
    List(Vec<Value>),
}

/// In-memory [`DataAccess`] for one iteration
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SolveInputs {
    iteration: usize,
    slots: BTreeMap<usize, SlotData>,
}

impl SolveInputs {
    pub fn new(iteration: usize) -> Self {
        Self {
            iteration,
            slots: BTreeMap::new(),
        }
    }

    pub fn with_item(mut self, slot: usize, value: impl Into<Value>) -> Self {
        self.slots.insert(slot, SlotData::Item(value.into()));
        self
    }

    pub fn with_list(mut self, slot: usize, values: Vec<Value>) -> Self {
        self.slots.insert(slot, SlotData::List(values));
        self
    }

    pub fn set(&mut self, slot: usize, data: SlotData) {
        self.slots.insert(slot, data);
    }

    pub fn has(&self, slot: usize) -> bool {
        self.slots.contains_key(&slot)
    }
}

impl DataAccess for SolveInputs {
    fn iteration(&self) -> usize {
        self.iteration
    }

    fn item(&self, slot: usize) -> Option<Value> {
        match self.slots.get(&slot)? {
            SlotData::Item(value) => Some(value.clone()),
            SlotData::List(values) => values.first().cloned(),
        }
    }

    fn list(&self, slot: usize) -> Option<Vec<Value>> {
        match self.slots.get(&slot)? {
            SlotData::Item(value) => Some(vec![value.clone()]),
            SlotData::List(values) => Some(values.clone()),
        }
    }
}

/// Host collaborators used while evaluating
pub struct EvaluationContext<'a> {
    pub converter: &'a dyn DomainConverter,
    pub casts: &'a CastTable,
    /// Document units stamped on objects that carry none
    pub units: &'a str,
}

impl<'a> EvaluationContext<'a> {
    pub fn new(converter: &'a dyn DomainConverter, casts: &'a CastTable, units: &'a str) -> Self {
        Self {
            converter,
            casts,
            units,
        }
    }
}

impl SchemaNode {
    /// Evaluate one iteration, returning the output object
    pub fn evaluate(
        &mut self,
        inputs: &dyn DataAccess,
        ctx: &EvaluationContext<'_>,
    ) -> Result<Base, EvaluationError> {
        if self.read_failed() {
            return Err(EvaluationError::TemplateUnresolved);
        }
        let template = self.template().cloned().ok_or(EvaluationError::NoTemplate)?;
        let coercer = Coercer::new(ctx.converter, ctx.casts);

        let mut args = Vec::with_capacity(template.parameter_count());
        let mut carrier = None;

        for (index, parameter) in template.parameters().iter().enumerate() {
            let persistent = self
                .input(index)
                .map(|slot| slot.persistent_data.clone())
                .unwrap_or_default();

            let coerced = match parameter.access() {
                Access::List => {
                    let items = inputs.list(index).unwrap_or(persistent);
                    if items.is_empty() {
                        if !parameter.optional {
                            return Err(EvaluationError::EmptyInput {
                                slot: parameter.name.clone(),
                            });
                        }
                        Ok(Value::Null)
                    } else {
                        coercer.coerce_list(items, &parameter.type_tag, &parameter.name)
                    }
                }
                Access::Item => {
                    let raw = inputs
                        .item(index)
                        .or_else(|| persistent.into_iter().next())
                        .unwrap_or(Value::Null)
                        .unwrap_host();
                    coercer.coerce(&raw, &parameter.type_tag, &parameter.name)
                }
            };

            let value = match coerced {
                Ok(value) => value,
                Err(err) => {
                    if matches!(err, ConversionError::Unconvertible { .. }) {
                        self.add_message(
                            RuntimeMessageLevel::Error,
                            format!("Unable to set {}.", parameter.name),
                        );
                    }
                    return Err(err.into());
                }
            };

            if parameter.carrier {
                carrier = Some(value.clone());
            }
            args.push(value);
        }

        let mut schema = template.construct(&args).map_err(|source| {
            error!("Constructing {} failed: {}", template.declaring_type(), source);
            EvaluationError::Construction {
                type_name: template.declaring_type().to_string(),
                source,
            }
        })?;

        schema.application_id = Some(format!(
            "{}-{}-{}",
            self.seed(),
            template.declaring_type(),
            inputs.iteration()
        ));
        if schema.units_missing() {
            schema.units = Some(ctx.units.to_string());
        }

        let mut output = if self.attach_mode() {
            match carrier {
                Some(Value::Object(host_object)) => {
                    let mut attached = host_object.shallow_copy();
                    attached.units = schema.units.clone();
                    attached.set(ATTACHED_SCHEMA_KEY, Value::Object(schema));
                    attached
                }
                _ => {
                    self.force_attach_mode_off();
                    self.add_message(RuntimeMessageLevel::Remark, messages::ATTACH_UNSUPPORTED);
                    schema
                }
            }
        } else {
            schema
        };

        for (index, slot) in self
            .inputs()
            .iter()
            .enumerate()
            .skip(template.parameter_count())
        {
            let value = match slot.access {
                Access::Item => {
                    let raw = inputs
                        .item(index)
                        .or_else(|| slot.persistent_data.first().cloned())
                        .unwrap_or(Value::Null);
                    try_convert_item(raw, ctx.converter)
                }
                Access::List => {
                    let items = inputs
                        .list(index)
                        .unwrap_or_else(|| slot.persistent_data.clone());
                    Value::List(
                        items
                            .into_iter()
                            .map(|item| try_convert_item(item, ctx.converter))
                            .collect(),
                    )
                }
            };
            output.set(slot.name.clone(), value);
        }

        debug!(
            "Node {} produced {} for iteration {}",
            self.id,
            output.type_name(),
            inputs.iteration()
        );
        Ok(output)
    }

    /// Evaluation boundary: failures become runtime messages on the node
    pub fn solve(&mut self, inputs: &dyn DataAccess, ctx: &EvaluationContext<'_>) -> Option<Base> {
        match self.evaluate(inputs, ctx) {
            Ok(output) => Some(output),
            Err(err) => {
                self.add_message(RuntimeMessageLevel::Error, err.to_string());
                None
            }
        }
    }

    /// Solve every iteration of a batch; one failing iteration does not stop the others
    pub fn solve_all(&mut self, batch: &[SolveInputs], ctx: &EvaluationContext<'_>) -> Vec<Option<Base>> {
        self.clear_messages();
        batch.iter().map(|inputs| self.solve(inputs, ctx)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kit::{self, elements, geometry, host, other};
    use crate::model::NoopConverter;
    use crate::settings::BuilderSettings;

    fn bound(id: &str) -> SchemaNode {
        let catalog = kit::catalog();
        let mut node = SchemaNode::new(&BuilderSettings::default());
        node.bind_template(catalog.get(id).unwrap());
        node
    }

    fn run(node: &mut SchemaNode, inputs: &SolveInputs) -> Result<Base, EvaluationError> {
        let converter = host::HostConverter;
        let casts = kit::casts();
        let ctx = EvaluationContext::new(&converter, &casts, "m");
        node.evaluate(inputs, &ctx)
    }

    fn base_line() -> Value {
        Value::Object(geometry::line(geometry::point(0.0, 0.0, 0.0), geometry::point(4.0, 0.0, 0.0)))
    }

    #[test]
    fn test_defaults_fill_unset_optional_slots() {
        // Tag(name: Text, count: Int = 3)
        let mut node = bound(other::TAG_ID);
        let tag = run(&mut node, &SolveInputs::new(0).with_item(0, "a")).unwrap();
        assert_eq!(tag.get_text("name"), Some("a"));
        assert_eq!(tag.get("count"), Some(&Value::Int(3)));
    }

    #[test]
    fn test_application_id_and_units() {
        let mut node = bound(other::TAG_ID);
        let tag = run(&mut node, &SolveInputs::new(4).with_item(0, "a")).unwrap();
        let expected = format!("{}-Objects.Other.Tag-4", node.seed());
        assert_eq!(tag.application_id.as_deref(), Some(expected.as_str()));
        assert_eq!(tag.units.as_deref(), Some("m"));
    }

    #[test]
    fn test_attach_to_carrier() {
        // Wall(height: Float, baseLine: ICurve [carrier], elements: List<Base> = null)
        let mut node = bound(elements::WALL_ID);
        node.set_attach_mode(true).unwrap();
        let line = base_line();
        let inputs = SolveInputs::new(0).with_item(0, 3.0).with_item(1, line.clone());

        let output = run(&mut node, &inputs).unwrap();
        assert_eq!(output.type_name(), geometry::LINE_TYPE);
        assert_eq!(output.get("start"), line.as_object().and_then(|l| l.get("start")));
        let wall = output.get_object(ATTACHED_SCHEMA_KEY).expect("wall attached");
        assert_eq!(wall.type_name(), elements::WALL_TYPE);
        assert_eq!(wall.get_f64("height"), Some(3.0));
        assert_eq!(output.units.as_deref(), Some("m"));
        assert!(node.attach_mode());
    }

    #[test]
    fn test_attached_carrier_takes_document_units() {
        let mut node = bound(elements::WALL_ID);
        node.set_attach_mode(true).unwrap();
        let mut line = geometry::line(geometry::point(0.0, 0.0, 0.0), geometry::point(4.0, 0.0, 0.0));
        line.units = Some("ft".into());
        let inputs = SolveInputs::new(0).with_item(0, 3.0).with_item(1, Value::Object(line));

        let output = run(&mut node, &inputs).unwrap();
        assert_eq!(output.units.as_deref(), Some("m"));
        let wall = output.get_object(ATTACHED_SCHEMA_KEY).expect("wall attached");
        assert_eq!(wall.units.as_deref(), Some("m"));
    }

    #[test]
    fn test_attach_without_carrier_falls_back() {
        let mut node = bound(elements::LEVEL_ID);
        node.apply_default_attach_mode(true);
        assert!(node.attach_mode());

        let output = run(&mut node, &SolveInputs::new(0).with_item(0, "L1")).unwrap();
        assert_eq!(output.type_name(), elements::LEVEL_TYPE);
        assert!(!node.attach_mode());
        assert_eq!(node.messages()[0].level, RuntimeMessageLevel::Remark);
        assert_eq!(node.messages()[0].text, messages::ATTACH_UNSUPPORTED);
    }

    #[test]
    fn test_enum_from_member_name() {
        let mut node = bound(elements::WALL_BY_TYPE_ID);
        let location = node
            .template()
            .and_then(|t| t.parameters().iter().position(|p| p.name == "location"))
            .unwrap();
        let inputs = SolveInputs::new(0)
            .with_item(0, "Basic Wall")
            .with_item(1, "Generic 200")
            .with_item(2, base_line())
            .with_item(location, "Interior");

        let wall = run(&mut node, &inputs).unwrap();
        assert_eq!(wall.get_text("location"), Some("Interior"));
    }

    #[test]
    fn test_empty_required_list_fails_before_coercion() {
        // Polyline(points: List<Point>)
        let mut node = bound(geometry::POLYLINE_ID);
        let err = run(&mut node, &SolveInputs::new(0).with_list(0, vec![])).unwrap_err();
        assert_eq!(err, EvaluationError::EmptyInput { slot: "points".into() });

        let err = run(&mut node, &SolveInputs::new(0)).unwrap_err();
        assert_eq!(err.to_string(), "Input list `points` is empty.");
    }

    #[test]
    fn test_host_values_in_lists_are_converted() {
        let mut node = bound(geometry::POLYLINE_ID);
        let points = vec![
            Value::wrapped(host::host_point(0.0, 0.0, 0.0)),
            host::host_point(3.0, 4.0, 0.0),
        ];
        let polyline = run(&mut node, &SolveInputs::new(0).with_list(0, points)).unwrap();
        assert_eq!(polyline.get_f64("length"), Some(5.0));
    }

    #[test]
    fn test_free_form_slots_become_members() {
        let mut node = bound(other::TAG_ID);
        node.insert_slot(2).unwrap();
        node.insert_slot(3).unwrap();
        node.set_slot_access(3, Access::List).unwrap();

        let inputs = SolveInputs::new(0)
            .with_item(0, "a")
            .with_item(2, host::host_point(1.0, 1.0, 1.0))
            .with_list(3, vec![Value::Int(1), Value::Host(crate::model::HostObject::new("Host.Mesh"))]);
        let tag = run(&mut node, &inputs).unwrap();

        assert_eq!(tag.get_object("A").map(|p| p.type_name()), Some(geometry::POINT_TYPE));
        assert_eq!(tag.get("B"), Some(&Value::List(vec![Value::Int(1), Value::Null])));
    }

    #[test]
    fn test_unconvertible_input_records_message() {
        let mut node = bound(elements::WALL_ID);
        let mesh = Value::Host(crate::model::HostObject::new("Host.Mesh"));
        let inputs = SolveInputs::new(0).with_item(0, 3.0).with_item(1, mesh);

        let converter = NoopConverter;
        let casts = kit::casts();
        let ctx = EvaluationContext::new(&converter, &casts, "m");
        assert!(node.solve(&inputs, &ctx).is_none());
        let texts: Vec<&str> = node.messages().iter().map(|m| m.text.as_str()).collect();
        assert_eq!(texts[0], "Unable to set baseLine.");
        assert!(node.has_errors());
    }

    #[test]
    fn test_solve_all_isolates_iterations() {
        let mut node = bound(other::TAG_ID);
        let batch = vec![
            SolveInputs::new(0).with_item(0, "a"),
            SolveInputs::new(1).with_item(0, "b").with_item(1, "many"),
            SolveInputs::new(2).with_item(0, "c").with_item(1, 2.5),
        ];
        let converter = NoopConverter;
        let casts = CastTable::new();
        let ctx = EvaluationContext::new(&converter, &casts, "m");

        let outputs = node.solve_all(&batch, &ctx);
        assert!(outputs[0].is_some());
        assert!(outputs[1].is_none());
        assert_eq!(outputs[2].as_ref().and_then(|t| t.get("count")), Some(&Value::Int(2)));
        assert_eq!(node.messages().len(), 1);

        node.solve_all(&batch[..1], &ctx);
        assert!(node.messages().is_empty());
    }

    #[test]
    fn test_unbound_and_unresolved_nodes() {
        let mut node = SchemaNode::new(&BuilderSettings::default());
        assert_eq!(
            run(&mut node, &SolveInputs::new(0)).unwrap_err(),
            EvaluationError::NoTemplate
        );

        let mut node = bound(other::TAG_ID);
        node.mark_read_failed();
        assert_eq!(
            run(&mut node, &SolveInputs::new(0)).unwrap_err(),
            EvaluationError::TemplateUnresolved
        );
    }

    #[test]
    fn test_constructor_failure_is_reported() {
        let mut node = bound(other::TAG_ID);
        let err = run(&mut node, &SolveInputs::new(0)).unwrap_err();
        assert!(matches!(err, EvaluationError::Construction { .. }));
        assert!(err.to_string().contains("name"));
    }
}
