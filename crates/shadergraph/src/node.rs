// SPDX-License-Identifier: MIT OR Apache-2.0
//! Node definitions for the shader graph.

use crate::graph::{Graph, GraphError};
use crate::slot::{Slot, SlotId};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Unique identifier for a node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeId(pub Uuid);

impl NodeId {
    /// Create a new random node ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for NodeId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Extra error condition supplied by a node type.
///
/// Evaluated at the end of validation, after every slot of the node has a
/// concrete type. Returning `true` puts the node in error.
pub type NodeErrorCheck = fn(&Node, &Graph) -> bool;

/// Node type category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeCategory {
    /// Constants and parameters
    Input,
    /// Master nodes
    Output,
    /// Math operations
    Math,
    /// Vector construction and swizzling
    Vector,
    /// Matrix operations
    Matrix,
    /// Texture operations
    Texture,
    /// Utility nodes
    Utility,
}

impl NodeCategory {
    /// Display name for this category
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Input => "Input",
            Self::Output => "Output",
            Self::Math => "Math",
            Self::Vector => "Vector",
            Self::Matrix => "Matrix",
            Self::Texture => "Texture",
            Self::Utility => "Utility",
        }
    }
}

/// How a node's preview is drawn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PreviewMode {
    /// Flat quad
    #[default]
    Preview2D,
    /// Lit sphere
    Preview3D,
}

/// Kind of graph a node is placed in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GraphKind {
    /// Top level material graph
    Material,
    /// Reusable graph embedded in other graphs
    SubGraph,
    /// Graph remapping the inputs of a master node
    RemapGraph,
}

/// What a node type supports, independent of any instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeCapabilities {
    /// Whether the node has a preview area
    pub has_preview: bool,
    /// How the preview is drawn
    pub preview_mode: PreviewMode,
    /// Whether the node may appear in a sub graph
    pub allowed_in_sub_graph: bool,
    /// Whether the node may appear in a remap graph
    pub allowed_in_remap_graph: bool,
}

impl Default for NodeCapabilities {
    fn default() -> Self {
        Self {
            has_preview: false,
            preview_mode: PreviewMode::Preview2D,
            allowed_in_sub_graph: true,
            allowed_in_remap_graph: true,
        }
    }
}

impl NodeCapabilities {
    /// Show a preview drawn in `mode`
    pub fn with_preview(mut self, mode: PreviewMode) -> Self {
        self.has_preview = true;
        self.preview_mode = mode;
        self
    }

    /// Only allow the node in top level material graphs
    pub fn material_only(mut self) -> Self {
        self.allowed_in_sub_graph = false;
        self.allowed_in_remap_graph = false;
        self
    }

    /// Whether the node may be placed in a graph of the given kind
    pub fn allowed_in(&self, kind: GraphKind) -> bool {
        match kind {
            GraphKind::Material => true,
            GraphKind::SubGraph => self.allowed_in_sub_graph,
            GraphKind::RemapGraph => self.allowed_in_remap_graph,
        }
    }
}

/// Node type definition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeType {
    /// Unique type identifier
    pub id: String,
    /// Display name
    pub name: String,
    /// Category
    pub category: NodeCategory,
    /// Description
    pub description: String,
    /// Input slots
    pub inputs: Vec<Slot>,
    /// Output slots
    pub outputs: Vec<Slot>,
    /// Node-specific error condition
    #[serde(skip)]
    pub error_check: Option<NodeErrorCheck>,
    /// Preview and placement rules
    #[serde(default)]
    pub capabilities: NodeCapabilities,
}

/// A node instance in the graph
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    /// Unique instance ID
    pub id: NodeId,
    /// Node type ID
    pub node_type: String,
    /// Display name, also the prefix of generated variable names
    pub name: String,
    /// Position in the graph UI
    pub position: [f32; 2],
    /// Slots keyed by ID
    slots: IndexMap<SlotId, Slot>,
    /// Whether the preview area is shown in the UI
    preview_expanded: bool,
    #[serde(skip)]
    has_error: bool,
    #[serde(skip)]
    version: u64,
    #[serde(skip)]
    error_check: Option<NodeErrorCheck>,
}

impl Node {
    /// Create a new node from a type definition
    pub fn new(node_type: &NodeType) -> Self {
        let slots = node_type
            .inputs
            .iter()
            .chain(node_type.outputs.iter())
            .map(|slot| (slot.id, slot.clone()))
            .collect();

        Self {
            id: NodeId::new(),
            node_type: node_type.id.clone(),
            name: node_type.name.clone(),
            position: [0.0, 0.0],
            slots,
            preview_expanded: true,
            has_error: false,
            version: 0,
            error_check: node_type.error_check,
        }
    }

    /// Create an empty node with no slots
    pub fn empty(node_type: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: NodeId::new(),
            node_type: node_type.into(),
            name: name.into(),
            position: [0.0, 0.0],
            slots: IndexMap::new(),
            preview_expanded: true,
            has_error: false,
            version: 0,
            error_check: None,
        }
    }

    /// Set the position
    pub fn with_position(mut self, x: f32, y: f32) -> Self {
        self.position = [x, y];
        self
    }

    /// Set the display name
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Set the node-specific error condition
    pub fn with_error_check(mut self, check: NodeErrorCheck) -> Self {
        self.error_check = Some(check);
        self
    }

    /// Whether the last validation left this node in error
    pub fn has_error(&self) -> bool {
        self.has_error
    }

    /// Number of error-free validations of this node
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Whether the preview area is shown
    pub fn preview_expanded(&self) -> bool {
        self.preview_expanded
    }

    /// Node-specific error condition, if any
    pub fn error_check(&self) -> Option<NodeErrorCheck> {
        self.error_check
    }

    /// Replace the node-specific error condition
    pub fn set_error_check(&mut self, check: Option<NodeErrorCheck>) {
        self.error_check = check;
    }

    /// Get a slot by ID
    pub fn slot(&self, slot_id: SlotId) -> Option<&Slot> {
        self.slots.get(&slot_id)
    }

    /// Get a mutable slot by ID
    pub fn slot_mut(&mut self, slot_id: SlotId) -> Option<&mut Slot> {
        self.slots.get_mut(&slot_id)
    }

    /// Get an input slot by ID
    pub fn find_input_slot(&self, slot_id: SlotId) -> Option<&Slot> {
        self.slot(slot_id).filter(|s| s.is_input())
    }

    /// Get an output slot by ID
    pub fn find_output_slot(&self, slot_id: SlotId) -> Option<&Slot> {
        self.slot(slot_id).filter(|s| s.is_output())
    }

    /// Get all slots
    pub fn slots(&self) -> impl Iterator<Item = &Slot> {
        self.slots.values()
    }

    /// Get all input slots
    pub fn input_slots(&self) -> impl Iterator<Item = &Slot> + Clone {
        self.slots.values().filter(|s| s.is_input())
    }

    /// Get all output slots
    pub fn output_slots(&self) -> impl Iterator<Item = &Slot> + Clone {
        self.slots.values().filter(|s| s.is_output())
    }

    /// Add a slot, replacing any slot with the same ID.
    ///
    /// A replaced slot hands its current value over to the new slot, so user
    /// entered values survive a change of declared type or direction. The
    /// only rejected slots are those without a usable shader output name.
    pub fn add_slot(&mut self, mut slot: Slot) -> Result<(), GraphError> {
        if !slot.has_valid_shader_output_name() {
            return Err(GraphError::InvalidSlot {
                slot: slot.id,
                reason: format!("'{}' is not a valid shader output name", slot.shader_output_name),
            });
        }

        if let Some(existing) = self.slots.get(&slot.id) {
            slot.current_value = existing.current_value;
        }

        self.slots.insert(slot.id, slot);
        Ok(())
    }

    /// Remove a slot. Edges touching it are left to the graph.
    pub(crate) fn remove_slot(&mut self, slot_id: SlotId) -> Option<Slot> {
        self.slots.shift_remove(&slot_id)
    }

    pub(crate) fn set_preview_expanded(&mut self, expanded: bool) -> bool {
        if self.preview_expanded == expanded {
            return false;
        }
        self.preview_expanded = expanded;
        true
    }

    /// Record the outcome of a validation pass
    pub(crate) fn finish_validation(&mut self, has_error: bool) {
        self.has_error = has_error;
        if !has_error {
            self.version += 1;
        }
    }

    /// Reset derived state after loading
    pub(crate) fn reset_derived_state(&mut self) {
        self.has_error = false;
        self.version = 0;
        for slot in self.slots.values_mut() {
            slot.reset_concrete_type();
        }
    }
}

/// Registry of available node types
pub struct NodeRegistry {
    /// Registered node types by ID
    types: IndexMap<String, NodeType>,
}

impl NodeRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self {
            types: IndexMap::new(),
        }
    }

    /// Register a node type
    pub fn register(&mut self, node_type: NodeType) {
        self.types.insert(node_type.id.clone(), node_type);
    }

    /// Get a node type by ID
    pub fn get(&self, id: &str) -> Option<&NodeType> {
        self.types.get(id)
    }

    /// Get all registered types
    pub fn types(&self) -> impl Iterator<Item = &NodeType> {
        self.types.values()
    }

    /// Get types by category
    pub fn types_in_category(&self, category: NodeCategory) -> impl Iterator<Item = &NodeType> {
        self.types.values().filter(move |t| t.category == category)
    }

    /// Create a node from a type ID
    pub fn create_node(&self, type_id: &str) -> Option<Node> {
        self.get(type_id).map(Node::new)
    }

    /// Capabilities of a node type; defaults for unknown types
    pub fn capabilities(&self, type_id: &str) -> NodeCapabilities {
        self.get(type_id)
            .map(|t| t.capabilities)
            .unwrap_or_default()
    }

    /// Nodes of `graph` that may not be placed in a graph of `kind`
    pub fn disallowed_nodes(&self, graph: &Graph, kind: GraphKind) -> Vec<NodeId> {
        graph
            .nodes()
            .filter(|node| !self.capabilities(&node.node_type).allowed_in(kind))
            .map(|node| node.id)
            .collect()
    }

    /// Restore node-specific error checks on a loaded graph.
    ///
    /// Error checks are code, not data, so they are lost on serialization.
    pub fn attach_error_checks(&self, graph: &mut Graph) {
        for node in graph.nodes_mut() {
            let check = self.get(&node.node_type).and_then(|t| t.error_check);
            node.set_error_check(check);
        }
    }
}

impl Default for NodeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value_type::ValueType;

    fn add_type() -> NodeType {
        NodeType {
            id: "add".to_string(),
            name: "Add".to_string(),
            category: NodeCategory::Math,
            description: "A + B".to_string(),
            inputs: vec![
                Slot::input(0, "A", ValueType::Dynamic),
                Slot::input(1, "B", ValueType::Dynamic),
            ],
            outputs: vec![Slot::output(2, "Out", ValueType::Dynamic)],
            error_check: None,
            capabilities: NodeCapabilities::default().with_preview(PreviewMode::Preview2D),
        }
    }

    #[test]
    fn test_node_from_type() {
        let node = Node::new(&add_type());
        assert_eq!(node.name, "Add");
        assert_eq!(node.input_slots().count(), 2);
        assert_eq!(node.output_slots().count(), 1);
        assert!(node.find_input_slot(SlotId(2)).is_none());
        assert!(node.find_output_slot(SlotId(2)).is_some());
        assert_eq!(node.version(), 0);
        assert!(!node.has_error());
    }

    #[test]
    fn test_slot_iterators_restart() {
        let node = Node::new(&add_type());
        let inputs = node.input_slots();
        assert_eq!(inputs.clone().count(), 2);
        assert_eq!(inputs.count(), 2);
    }

    #[test]
    fn test_add_slot_replace_preserves_value() {
        let mut node = Node::empty("test", "Test");
        node.add_slot(Slot::input(0, "In", ValueType::Vector4).with_default([1.0, 2.0, 3.0, 4.0]))
            .unwrap();
        node.slot_mut(SlotId(0)).unwrap().current_value = [5.0, 6.0, 7.0, 8.0];

        node.add_slot(Slot::input(0, "In", ValueType::Vector2)).unwrap();

        let slot = node.slot(SlotId(0)).unwrap();
        assert_eq!(slot.declared_type, ValueType::Vector2);
        assert_eq!(slot.current_value, [5.0, 6.0, 7.0, 8.0]);
        assert_eq!(slot.default_value, [0.0; 4]);
        assert_eq!(node.slots().count(), 1);
    }

    #[test]
    fn test_add_slot_rejects_invalid_slots() {
        let mut node = Node::empty("test", "Test");
        node.add_slot(Slot::input(0, "In", ValueType::Vector1)).unwrap();

        let unnamed = node.add_slot(Slot::input(1, "!!", ValueType::Vector1));
        assert!(matches!(unnamed, Err(GraphError::InvalidSlot { .. })));
        assert_eq!(node.slots().count(), 1);
    }

    #[test]
    fn test_add_slot_can_flip_direction() {
        let mut node = Node::empty("test", "Test");
        node.add_slot(Slot::input(0, "Value", ValueType::Vector1).with_default([0.3, 0.0, 0.0, 0.0]))
            .unwrap();

        node.add_slot(Slot::output(0, "Value", ValueType::Vector2)).unwrap();
        let slot = node.slot(SlotId(0)).unwrap();
        assert!(slot.is_output());
        assert_eq!(slot.current_value, [0.3, 0.0, 0.0, 0.0]);
        assert_eq!(node.input_slots().count(), 0);
        assert_eq!(node.output_slots().count(), 1);
    }

    #[test]
    fn test_capabilities() {
        let mut registry = NodeRegistry::new();
        registry.register(add_type());
        registry.register(NodeType {
            id: "master".to_string(),
            capabilities: NodeCapabilities::default()
                .with_preview(PreviewMode::Preview3D)
                .material_only(),
            ..add_type()
        });

        let add = registry.capabilities("add");
        assert!(add.has_preview);
        assert_eq!(add.preview_mode, PreviewMode::Preview2D);
        assert!(add.allowed_in(GraphKind::SubGraph));
        assert_eq!(registry.capabilities("missing"), NodeCapabilities::default());

        let mut graph = Graph::new("Test");
        graph.add_node(registry.create_node("add").unwrap());
        let master = graph.add_node(registry.create_node("master").unwrap());
        assert!(registry.disallowed_nodes(&graph, GraphKind::Material).is_empty());
        assert_eq!(registry.disallowed_nodes(&graph, GraphKind::SubGraph), vec![master]);
        assert_eq!(registry.disallowed_nodes(&graph, GraphKind::RemapGraph), vec![master]);
    }

    #[test]
    fn test_finish_validation_bumps_version_only_without_error() {
        let mut node = Node::new(&add_type());
        node.finish_validation(false);
        node.finish_validation(false);
        assert_eq!(node.version(), 2);
        node.finish_validation(true);
        assert_eq!(node.version(), 2);
        assert!(node.has_error());
    }

    #[test]
    fn test_registry() {
        let mut registry = NodeRegistry::new();
        registry.register(add_type());
        assert!(registry.get("add").is_some());
        assert_eq!(registry.types_in_category(NodeCategory::Math).count(), 1);
        assert_eq!(registry.types_in_category(NodeCategory::Texture).count(), 0);
        assert!(registry.create_node("missing").is_none());
    }
}
