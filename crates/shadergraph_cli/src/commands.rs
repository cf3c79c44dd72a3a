// SPDX-License-Identifier: MIT OR Apache-2.0
//! Subcommand implementations.

use shadergraph::persistence::{load_graph, save_graph};
use shadergraph::properties::collect_graph_properties;
use shadergraph::{
    create_shader_registry, Graph, GraphError, GraphSettings, NodeId, NodeRegistry,
    PersistenceError, PreviewMode, SettingsError, SlotId, SlotReference, ValidationIssue,
    ValidationReport,
};
use std::fmt::Write as _;
use std::path::Path;
use std::process::ExitCode;

/// Error from a subcommand
#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    /// Graph file could not be loaded or saved
    #[error("{0}")]
    Persistence(#[from] PersistenceError),

    /// Settings file could not be loaded
    #[error("{0}")]
    Settings(#[from] SettingsError),

    /// Graph edit failed
    #[error("{0}")]
    Graph(#[from] GraphError),

    /// Output could not be encoded
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Unknown node category
    #[error("Unknown category: {0}")]
    UnknownCategory(String),

    /// Node type missing from the registry
    #[error("Unknown node type: {0}")]
    UnknownNodeType(String),
}

/// Load settings from `path`, or use defaults
pub fn load_settings(path: Option<&Path>) -> Result<GraphSettings, CommandError> {
    match path {
        Some(path) => Ok(GraphSettings::load(path)?),
        None => Ok(GraphSettings::default()),
    }
}

fn load_validated(
    path: &Path,
    registry: &NodeRegistry,
) -> Result<(Graph, ValidationReport), CommandError> {
    let mut graph = load_graph(path)?;
    registry.attach_error_checks(&mut graph);
    let report = graph.validate_all();
    Ok((graph, report))
}

/// Validate a graph file and print the report
pub fn validate(path: &Path, json: bool) -> Result<ExitCode, CommandError> {
    let registry = create_shader_registry();
    let (graph, report) = load_validated(path, &registry)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print!("{}", format_report(&graph, &report));
    }

    Ok(if report.is_ok() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

/// List the built-in node types
pub fn list_nodes(category: Option<&str>) -> Result<ExitCode, CommandError> {
    let registry = create_shader_registry();

    let mut found = false;
    for node_type in registry.types() {
        let name = node_type.category.display_name();
        if let Some(filter) = category {
            if !name.eq_ignore_ascii_case(filter) {
                continue;
            }
        }
        found = true;
        let caps = node_type.capabilities;
        let preview = match (caps.has_preview, caps.preview_mode) {
            (false, _) => "-",
            (true, PreviewMode::Preview2D) => "2D",
            (true, PreviewMode::Preview3D) => "3D",
        };
        println!(
            "{:<20} {:<10} {:<3} {}",
            node_type.id, name, preview, node_type.description
        );
    }

    match category {
        Some(filter) if !found => Err(CommandError::UnknownCategory(filter.to_string())),
        _ => Ok(ExitCode::SUCCESS),
    }
}

/// Print the properties a preview of the graph would expose
pub fn properties(path: &Path, settings: &GraphSettings) -> Result<ExitCode, CommandError> {
    let registry = create_shader_registry();
    let (graph, report) = load_validated(path, &registry)?;
    if !report.is_ok() {
        tracing::warn!(errors = report.errors.len(), "graph has validation errors");
    }

    let collector = collect_graph_properties(&graph, settings.generation_mode);
    println!("{}", serde_json::to_string_pretty(collector.properties())?);
    Ok(ExitCode::SUCCESS)
}

/// Write the example graph to `path`
pub fn demo(path: &Path) -> Result<ExitCode, CommandError> {
    let registry = create_shader_registry();
    let graph = demo_graph(&registry)?;
    save_graph(&graph, path)?;
    println!("Wrote {} nodes to {}", graph.node_count(), path.display());
    Ok(ExitCode::SUCCESS)
}

/// Textured, tinted unlit material
pub fn demo_graph(registry: &NodeRegistry) -> Result<Graph, CommandError> {
    let mut graph = Graph::new("Demo");

    let spawn = |graph: &mut Graph, type_id: &str, name: &str, x: f32, y: f32| {
        registry
            .create_node(type_id)
            .map(|node| graph.add_node(node.with_name(name).with_position(x, y)))
            .ok_or_else(|| CommandError::UnknownNodeType(type_id.to_string()))
    };

    let texture = spawn(&mut graph, "texture_2d_asset", "Albedo Map", 0.0, 0.0)?;
    let uv = spawn(&mut graph, "uv", "UV", 0.0, 120.0)?;
    let sample = spawn(&mut graph, "sample_texture_2d", "Albedo", 220.0, 40.0)?;
    let tint = spawn(&mut graph, "color", "Tint", 220.0, 240.0)?;
    let multiply = spawn(&mut graph, "multiply", "Tinted Albedo", 440.0, 120.0)?;
    let master = spawn(&mut graph, "unlit_master", "Unlit Master", 660.0, 120.0)?;

    let edges: [(NodeId, i32, NodeId, i32); 6] = [
        (texture, 0, sample, 0),
        (uv, 0, sample, 1),
        (sample, 3, multiply, 0),
        (tint, 0, multiply, 1),
        (multiply, 2, master, 0),
        (sample, 7, master, 1),
    ];
    for (from, out, to, input) in edges {
        graph.connect(
            SlotReference::new(from, SlotId(out)),
            SlotReference::new(to, SlotId(input)),
        )?;
    }

    Ok(graph)
}

/// Human readable validation report
pub fn format_report(graph: &Graph, report: &ValidationReport) -> String {
    let node_name = |id: NodeId| {
        graph
            .node(id)
            .map_or_else(|| id.to_string(), |n| format!("{} ({})", n.name, id))
    };

    let mut out = String::new();
    let _ = writeln!(
        out,
        "{}: {} nodes validated, {} in error",
        graph.name,
        report.validated.len(),
        report.errors.len()
    );

    for issue in &report.issues {
        let line = match issue {
            ValidationIssue::IncompatibleConnection { input, from, to } => format!(
                "incompatible connection into {} slot {}: {from} cannot become {to}",
                node_name(input.node_id()),
                input.slot_id()
            ),
            ValidationIssue::UpstreamError { node, upstream } => format!(
                "{} depends on {} which is in error",
                node_name(*node),
                node_name(*upstream)
            ),
            ValidationIssue::DanglingEdge { edge } => {
                format!("edge {} -> {} points at a missing slot", edge.output_slot, edge.input_slot)
            }
            ValidationIssue::Cycle { node, upstream } => format!(
                "cycle: {} feeds back into {}",
                node_name(*node),
                node_name(*upstream)
            ),
            ValidationIssue::NodeCheckFailed { node } => {
                format!("{} is not fully configured", node_name(*node))
            }
        };
        let _ = writeln!(out, "  - {line}");
    }

    out
}
