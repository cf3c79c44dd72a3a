// SPDX-License-Identifier: MIT OR Apache-2.0
//! End-to-end checks on graphs built from the node library.

use shadergraph::codegen::{slot_value, variable_name_for_node};
use shadergraph::persistence::{load_graph, save_graph};
use shadergraph::properties::collect_preview_properties;
use shadergraph::{
    create_shader_registry, ConcreteValueType, GenerationContext, GenerationMode, Graph,
    NodeId, NodeRegistry, OutputPrecision, SlotId, SlotReference, ValidationIssue,
};

fn spawn(graph: &mut Graph, registry: &NodeRegistry, type_id: &str) -> NodeId {
    let node = registry
        .create_node(type_id)
        .unwrap_or_else(|| panic!("unknown node type {type_id}"));
    graph.add_node(node)
}

fn link(graph: &mut Graph, from: NodeId, out: i32, to: NodeId, input: i32) {
    graph
        .connect(SlotReference::new(from, SlotId(out)), SlotReference::new(to, SlotId(input)))
        .unwrap();
}

fn concrete(graph: &Graph, node: NodeId, slot: i32) -> ConcreteValueType {
    graph.slot(SlotReference::new(node, SlotId(slot))).unwrap().concrete_type
}

#[test]
fn test_pbr_graph_survives_save_and_load() {
    let registry = create_shader_registry();
    let mut graph = Graph::new("Rock");

    let texture = spawn(&mut graph, &registry, "texture_2d_asset");
    let uv = spawn(&mut graph, &registry, "uv");
    let sample = spawn(&mut graph, &registry, "sample_texture_2d");
    let roughness = spawn(&mut graph, &registry, "vector1");
    let one_minus = spawn(&mut graph, &registry, "one_minus");
    let master = spawn(&mut graph, &registry, "pbr_master");

    link(&mut graph, texture, 0, sample, 0);
    link(&mut graph, uv, 0, sample, 1);
    link(&mut graph, sample, 3, master, 0);
    link(&mut graph, roughness, 0, one_minus, 0);
    link(&mut graph, one_minus, 1, master, 4);

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("rock.shadergraph");
    save_graph(&graph, &path).unwrap();

    let mut loaded = load_graph(&path).unwrap();
    registry.attach_error_checks(&mut loaded);

    let report = loaded.validate_all();
    assert!(report.is_ok(), "{:?}", report.issues);
    assert_eq!(report.validated.len(), 6);
    assert_eq!(concrete(&loaded, master, 0), ConcreteValueType::Vector3);
    assert_eq!(concrete(&loaded, one_minus, 1), ConcreteValueType::Vector1);

    let ctx = GenerationContext {
        precision: OutputPrecision::Half,
        mode: GenerationMode::Final,
    };
    let sample_name = variable_name_for_node(loaded.node(sample).unwrap());
    assert_eq!(
        slot_value(&loaded, master, SlotId(0), &ctx),
        format!("{sample_name}_RGBA.xyz")
    );
    assert_eq!(slot_value(&loaded, master, SlotId(5), &ctx), "1.0");
    assert_eq!(slot_value(&loaded, master, SlotId(1), &ctx), "half3(0.0, 0.0, 1.0)");
}

#[test]
fn test_incompatible_connection_poisons_downstream() {
    let registry = create_shader_registry();
    let mut graph = Graph::new("Broken");

    let uv = spawn(&mut graph, &registry, "uv");
    let cross = spawn(&mut graph, &registry, "cross_product");
    let normalize = spawn(&mut graph, &registry, "normalize");
    let master = spawn(&mut graph, &registry, "unlit_master");

    // A 2D vector cannot widen into a 3D input
    link(&mut graph, uv, 0, cross, 0);
    link(&mut graph, cross, 2, normalize, 0);
    link(&mut graph, normalize, 1, master, 0);

    let report = graph.validate_node(master).unwrap();
    assert_eq!(report.errors, vec![cross, normalize, master]);
    assert!(report.issues.contains(&ValidationIssue::IncompatibleConnection {
        input: SlotReference::new(cross, SlotId(0)),
        from: ConcreteValueType::Vector2,
        to: ConcreteValueType::Vector3,
    }));
    assert_eq!(graph.node(uv).unwrap().version(), 1);
    for node in [cross, normalize, master] {
        assert_eq!(graph.node(node).unwrap().version(), 0);
    }

    // Fixing the edge clears the errors on the next pass
    let bad = *graph.edges_on(SlotReference::new(cross, SlotId(0))).first().unwrap();
    graph.disconnect(&bad);
    let color = spawn(&mut graph, &registry, "color");
    link(&mut graph, color, 0, cross, 0);

    let report = graph.validate_node(master).unwrap();
    assert!(report.is_ok());
    assert_eq!(graph.node(master).unwrap().version(), 1);
}

#[test]
fn test_preview_properties_follow_validation() {
    let registry = create_shader_registry();
    let mut graph = Graph::new("Preview");
    let lerp = spawn(&mut graph, &registry, "lerp");
    let color = spawn(&mut graph, &registry, "vector3");
    link(&mut graph, color, 0, lerp, 0);

    graph.validate_node(lerp).unwrap();

    let properties = collect_preview_properties(&graph, lerp).unwrap();
    let names: Vec<_> = properties.iter().map(|p| p.name.rsplit('_').next().unwrap().to_string()).collect();
    assert_eq!(names, vec!["B", "T"]);
    assert!(properties
        .iter()
        .all(|p| p.property_type == shadergraph::PropertyType::Vector3));
    assert_eq!(properties[1].float, 0.5);
}
