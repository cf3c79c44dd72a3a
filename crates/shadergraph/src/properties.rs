// SPDX-License-Identifier: MIT OR Apache-2.0
//! Material properties for unconnected input slots.
//!
//! Inputs without an incoming edge carry a user value. Preview shaders
//! expose those values as properties so the editor can tweak them without
//! recompiling, and preview materials need a snapshot of them.

use crate::codegen::{variable_name_for_slot, GenerationMode};
use crate::graph::{Graph, GraphError};
use crate::node::NodeId;
use crate::value_type::ConcreteValueType;
use serde::{Deserialize, Serialize};

/// Property category understood by materials
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PropertyType {
    /// Scalar
    Float,
    /// 2 component vector
    Vector2,
    /// 3 component vector
    Vector3,
    /// 4 component vector
    Vector4,
    /// Texture
    Texture,
    /// 2x2 matrix
    Matrix2,
    /// 3x3 matrix
    Matrix3,
    /// 4x4 matrix
    Matrix4,
    /// Sampler state
    SamplerState,
}

impl From<ConcreteValueType> for PropertyType {
    fn from(ty: ConcreteValueType) -> Self {
        match ty {
            ConcreteValueType::Vector1 => Self::Float,
            ConcreteValueType::Vector2 => Self::Vector2,
            ConcreteValueType::Vector3 => Self::Vector3,
            ConcreteValueType::Texture2D => Self::Texture,
            ConcreteValueType::Matrix2 => Self::Matrix2,
            ConcreteValueType::Matrix3 => Self::Matrix3,
            ConcreteValueType::Matrix4 => Self::Matrix4,
            ConcreteValueType::SamplerState => Self::SamplerState,
            ConcreteValueType::Vector4 | ConcreteValueType::Error => Self::Vector4,
        }
    }
}

/// Value held by a shader property
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PropertyValue {
    /// Scalar value
    Float(f32),
    /// Vector value, unused channels are carried along
    Vector([f32; 4]),
    /// Texture slot, bound by the material
    Texture,
    /// Sampler state, bound by the material
    SamplerState,
}

/// A property exposed by a generated shader
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShaderProperty {
    /// Name used in shader code
    pub reference_name: String,
    /// Name shown to the user
    pub display_name: String,
    /// Current value
    pub value: PropertyValue,
}

/// Collects shader properties, one per reference name
#[derive(Debug, Clone, Default)]
pub struct PropertyCollector {
    properties: Vec<ShaderProperty>,
}

impl PropertyCollector {
    /// Create an empty collector
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a property. A property with the same reference name is replaced.
    pub fn add(&mut self, property: ShaderProperty) {
        match self
            .properties
            .iter_mut()
            .find(|p| p.reference_name == property.reference_name)
        {
            Some(existing) => *existing = property,
            None => self.properties.push(property),
        }
    }

    /// All collected properties, in insertion order
    pub fn properties(&self) -> &[ShaderProperty] {
        &self.properties
    }

    /// Number of collected properties
    pub fn len(&self) -> usize {
        self.properties.len()
    }

    /// Whether nothing was collected
    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }
}

/// Snapshot of an unconnected input for preview materials
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PreviewProperty {
    /// Variable name of the slot
    pub name: String,
    /// Category inferred from the slot's concrete type
    pub property_type: PropertyType,
    /// Current value as a vector
    pub vector4: [f32; 4],
    /// First channel of the current value
    pub float: f32,
    /// Current value as a color
    pub color: [f32; 4],
}

/// Register the unconnected inputs of a node as shader properties.
///
/// Does nothing outside preview generation.
pub fn collect_shader_properties(
    graph: &Graph,
    node_id: NodeId,
    collector: &mut PropertyCollector,
    mode: GenerationMode,
) -> Result<(), GraphError> {
    let node = graph.node(node_id).ok_or(GraphError::NodeNotFound(node_id))?;
    if !mode.is_preview() {
        return Ok(());
    }

    for slot in node.input_slots() {
        if graph.is_connected(slot.reference(node_id)) {
            continue;
        }
        let name = variable_name_for_slot(node, slot.id)?;
        slot.add_default_property(collector, mode, &name);
    }
    Ok(())
}

/// Register the unconnected inputs of every node in the graph
pub fn collect_graph_properties(graph: &Graph, mode: GenerationMode) -> PropertyCollector {
    let mut collector = PropertyCollector::new();
    for node_id in graph.node_ids() {
        if let Err(e) = collect_shader_properties(graph, node_id, &mut collector, mode) {
            tracing::warn!(node = %node_id, "skipping properties: {e}");
        }
    }
    collector
}

/// Snapshot the unconnected inputs of a node
pub fn collect_preview_properties(
    graph: &Graph,
    node_id: NodeId,
) -> Result<Vec<PreviewProperty>, GraphError> {
    let node = graph.node(node_id).ok_or(GraphError::NodeNotFound(node_id))?;

    let mut properties = Vec::new();
    for slot in node.input_slots() {
        if graph.is_connected(slot.reference(node_id)) {
            continue;
        }
        properties.push(PreviewProperty {
            name: variable_name_for_slot(node, slot.id)?,
            property_type: slot.concrete_type.into(),
            vector4: slot.current_value,
            float: slot.current_value[0],
            color: slot.current_value,
        });
    }
    Ok(properties)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::Node;
    use crate::slot::{Slot, SlotId, SlotReference};
    use crate::value_type::ValueType;

    fn graph_with_inputs() -> (Graph, NodeId) {
        let mut graph = Graph::new("Test");

        let mut source = Node::empty("source", "Source");
        source.add_slot(Slot::output(0, "Out", ValueType::Vector3)).unwrap();
        let source = graph.add_node(source);

        let mut node = Node::empty("blend", "Blend");
        node.add_slot(Slot::input(0, "Base", ValueType::Vector3)).unwrap();
        node.add_slot(Slot::input(1, "Amount", ValueType::Vector1).with_default([0.3, 0.0, 0.0, 0.0]))
            .unwrap();
        node.add_slot(Slot::input(2, "Tint", ValueType::Vector4).with_default([1.0, 0.0, 0.0, 1.0]))
            .unwrap();
        node.add_slot(Slot::input(3, "Mask", ValueType::Texture2D)).unwrap();
        node.add_slot(Slot::output(4, "Out", ValueType::Vector3)).unwrap();
        let node = graph.add_node(node);

        graph
            .connect(SlotReference::new(source, SlotId(0)), SlotReference::new(node, SlotId(0)))
            .unwrap();
        graph.validate_node(node).unwrap();
        (graph, node)
    }

    #[test]
    fn test_property_type_mapping() {
        assert_eq!(PropertyType::from(ConcreteValueType::Vector1), PropertyType::Float);
        assert_eq!(PropertyType::from(ConcreteValueType::Texture2D), PropertyType::Texture);
        assert_eq!(PropertyType::from(ConcreteValueType::Error), PropertyType::Vector4);
    }

    #[test]
    fn test_collect_shader_properties() {
        let (graph, node) = graph_with_inputs();

        let mut collector = PropertyCollector::new();
        collect_shader_properties(&graph, node, &mut collector, GenerationMode::Final).unwrap();
        assert!(collector.is_empty());

        collect_shader_properties(&graph, node, &mut collector, GenerationMode::Preview).unwrap();
        let values: Vec<_> = collector.properties().iter().map(|p| p.value.clone()).collect();
        assert_eq!(
            values,
            vec![
                PropertyValue::Float(0.3),
                PropertyValue::Vector([1.0, 0.0, 0.0, 1.0]),
                PropertyValue::Texture,
            ]
        );

        // Collecting twice does not duplicate
        collect_shader_properties(&graph, node, &mut collector, GenerationMode::Preview).unwrap();
        assert_eq!(collector.len(), 3);
    }

    #[test]
    fn test_collect_preview_properties() {
        let (graph, node) = graph_with_inputs();
        let properties = collect_preview_properties(&graph, node).unwrap();

        assert_eq!(properties.len(), 3);
        assert_eq!(properties[0].property_type, PropertyType::Float);
        assert_eq!(properties[0].float, 0.3);
        assert!(properties[0].name.ends_with("_Amount"));
        assert_eq!(properties[1].property_type, PropertyType::Vector4);
        assert_eq!(properties[1].color, [1.0, 0.0, 0.0, 1.0]);
        assert_eq!(properties[2].property_type, PropertyType::Texture);
    }

    #[test]
    fn test_collect_graph_properties() {
        let (graph, _) = graph_with_inputs();
        assert_eq!(collect_graph_properties(&graph, GenerationMode::Preview).len(), 3);
    }

    #[test]
    fn test_unknown_node() {
        let graph = Graph::new("Test");
        assert!(matches!(
            collect_preview_properties(&graph, NodeId::new()),
            Err(GraphError::NodeNotFound(_))
        ));
    }
}
