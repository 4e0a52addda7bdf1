//! Schema builder - command-line demo of the schema node engine
//!
//! Prints the template tree (optionally filtered), places a picker node and a pre-bound node
//! in a document, solves them with host inputs and prints the results as JSON.
//!
//! Usage: `schema-builder [filter] [--save <path>]`

use schema_builder::catalog::ScriptedPicker;
use schema_builder::kit::{self, elements, host};
use schema_builder::nodes::{persistence, Document, EvaluationContext, NodeId, SchemaNode, SolveInputs};
use schema_builder::settings::BuilderSettings;
use std::path::PathBuf;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let mut filter = None;
    let mut save_path = None;
    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--save" => save_path = args.next().map(PathBuf::from),
            _ => filter = Some(arg),
        }
    }

    let settings = BuilderSettings::load_default()?;
    let catalog = kit::catalog();
    let casts = kit::casts();
    let converter = host::HostConverter;

    println!("{}", catalog.build_tree(filter.as_deref()).render());
    for (category, factories) in catalog.factories_by_category() {
        let names: Vec<&str> = factories.iter().map(|f| f.display_name.as_str()).collect();
        println!("{}: {}", category.display_string(), names.join(", "));
    }

    let units = settings.units.clone();
    let ctx = EvaluationContext::new(&converter, &casts, &units);
    let mut document = Document::new(settings);

    // Picker node: choose "Wall by type" through a scripted picker session
    let mut picker = ScriptedPicker::new("wall", "Wall by type");
    let node = SchemaNode::new(document.settings());
    if let Some(id) = document.add_node(node, &catalog, Some(&mut picker))? {
        let inputs = SolveInputs::new(0)
            .with_item(0, "Basic Wall")
            .with_item(1, "Generic 200")
            .with_item(2, host::host_line((0.0, 0.0, 0.0), (6.0, 0.0, 0.0)));
        report(&mut document, id, inputs, &ctx)?;
    }

    // Pre-bound node: a wall attached to its base line
    if let Some(factory) = catalog
        .prebound_factories()
        .into_iter()
        .find(|f| f.template.id() == elements::WALL_ID)
    {
        let id = document.add_prebound(&factory, &catalog)?;
        document.node_mut(id)?.set_attach_mode(true)?;
        let inputs = SolveInputs::new(0)
            .with_item(0, 3.0)
            .with_item(1, host::host_polyline(&[(0.0, 0.0, 0.0), (4.0, 0.0, 0.0), (4.0, 3.0, 0.0)]));
        report(&mut document, id, inputs, &ctx)?;
    }

    if let Some(path) = save_path {
        persistence::save_to_file(&path, &document)?;
        println!("Saved document to {}", path.display());
    }
    Ok(())
}

fn report(
    document: &mut Document,
    id: NodeId,
    inputs: SolveInputs,
    ctx: &EvaluationContext<'_>,
) -> Result<(), Box<dyn std::error::Error>> {
    let output = document.solve(id, inputs, ctx)?;
    let node = document.node(id)?;
    println!("\n{} [{}]", node.name, node.seed());
    for message in node.messages() {
        println!("  {:?}: {}", message.level, message.text);
    }
    if let Some(output) = output {
        println!("{}", serde_json::to_string_pretty(&output)?);
    }
    Ok(())
}
