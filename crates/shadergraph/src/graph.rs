// SPDX-License-Identifier: MIT OR Apache-2.0
//! Graph data structure containing nodes and edges.
//!
//! The graph is the only place where nodes meet. Nodes and slots never hold
//! references to each other; edges name their endpoints by [`SlotReference`]
//! and are resolved through the graph when needed.

use crate::edge::Edge;
use crate::node::{Node, NodeId};
use crate::slot::{Slot, SlotDirection, SlotId, SlotReference};
use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Extent of a modification, from the observer's point of view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModificationScope {
    /// Only the node's own presentation changed
    Node,
    /// Something that affects generated shaders changed
    Graph,
    /// The node's slots changed, taking edges with them
    Topological,
}

/// Notification for the editor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GraphEvent {
    /// A node's user visible state changed
    NodeModified {
        /// The modified node
        node: NodeId,
        /// How far the change reaches
        scope: ModificationScope,
    },
    /// Nodes or edges were added or removed
    TopologyChanged,
}

/// A shader graph
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(from = "GraphData", into = "GraphData")]
pub struct Graph {
    /// Graph name
    pub name: String,
    /// Nodes in the graph
    nodes: IndexMap<NodeId, Node>,
    /// Edges in insertion order
    edges: IndexSet<Edge>,
    /// Edges keyed by each of their two endpoints
    edge_index: HashMap<SlotReference, Vec<Edge>>,
    /// Pending notifications
    events: Vec<GraphEvent>,
}

/// Persisted form of a graph; derived state is rebuilt on load
#[derive(Serialize, Deserialize)]
struct GraphData {
    name: String,
    nodes: Vec<Node>,
    edges: Vec<Edge>,
}

impl From<GraphData> for Graph {
    fn from(data: GraphData) -> Self {
        let mut graph = Graph::new(data.name);
        for mut node in data.nodes {
            node.reset_derived_state();
            graph.nodes.insert(node.id, node);
        }
        for edge in data.edges {
            graph.add_edge(edge);
        }
        graph
    }
}

impl From<Graph> for GraphData {
    fn from(graph: Graph) -> Self {
        Self {
            name: graph.name,
            nodes: graph.nodes.into_values().collect(),
            edges: graph.edges.into_iter().collect(),
        }
    }
}

impl Graph {
    /// Create a new empty graph
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            nodes: IndexMap::new(),
            edges: IndexSet::new(),
            edge_index: HashMap::new(),
            events: Vec::new(),
        }
    }

    /// Add a node to the graph
    pub fn add_node(&mut self, node: Node) -> NodeId {
        let id = node.id;
        self.nodes.insert(id, node);
        self.events.push(GraphEvent::TopologyChanged);
        id
    }

    /// Remove a node and its edges
    pub fn remove_node(&mut self, node_id: NodeId) -> Option<Node> {
        let node = self.nodes.shift_remove(&node_id)?;
        let incident: Vec<Edge> = self
            .edges
            .iter()
            .filter(|e| e.involves_node(node_id))
            .copied()
            .collect();
        for edge in incident {
            self.remove_edge(&edge);
        }
        self.events.push(GraphEvent::TopologyChanged);
        Some(node)
    }

    /// Get a node by ID
    pub fn node(&self, node_id: NodeId) -> Option<&Node> {
        self.nodes.get(&node_id)
    }

    /// Get a mutable node by ID
    pub fn node_mut(&mut self, node_id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(&node_id)
    }

    /// Get all nodes
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    pub(crate) fn nodes_mut(&mut self) -> impl Iterator<Item = &mut Node> {
        self.nodes.values_mut()
    }

    /// Get all node IDs
    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes.keys().copied()
    }

    /// Get the number of nodes
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Resolve a slot reference
    pub fn slot(&self, slot: SlotReference) -> Option<&Slot> {
        self.node(slot.node_id())?.slot(slot.slot_id())
    }

    /// Add or replace a slot on a node.
    ///
    /// Replacing a slot with one of the opposite direction drops the edges
    /// that touched it, since they no longer run from an output to an input.
    pub fn add_slot(&mut self, node_id: NodeId, slot: Slot) -> Result<(), GraphError> {
        let node = self
            .nodes
            .get_mut(&node_id)
            .ok_or(GraphError::NodeNotFound(node_id))?;
        let flipped = node
            .slot(slot.id)
            .is_some_and(|existing| existing.direction != slot.direction);
        let reference = SlotReference::new(node_id, slot.id);
        node.add_slot(slot)?;

        let scope = if flipped {
            for edge in self.edges_on(reference).to_vec() {
                self.remove_edge(&edge);
            }
            ModificationScope::Topological
        } else {
            ModificationScope::Graph
        };
        self.events.push(GraphEvent::NodeModified { node: node_id, scope });
        Ok(())
    }

    /// Remove a slot from a node, together with the edges touching it
    pub fn remove_slot(&mut self, node_id: NodeId, slot_id: SlotId) -> Result<Slot, GraphError> {
        let node = self
            .nodes
            .get_mut(&node_id)
            .ok_or(GraphError::NodeNotFound(node_id))?;
        let slot = node
            .remove_slot(slot_id)
            .ok_or(GraphError::SlotNotFound(SlotReference::new(node_id, slot_id)))?;

        let reference = SlotReference::new(node_id, slot_id);
        for edge in self.edges_on(reference).to_vec() {
            self.remove_edge(&edge);
        }
        self.events.push(GraphEvent::NodeModified {
            node: node_id,
            scope: ModificationScope::Topological,
        });
        Ok(slot)
    }

    /// Connect an output slot to an input slot.
    ///
    /// Rejects unknown endpoints, wrong directions, self loops, inputs that
    /// already have an incoming edge, and edges that would close a cycle.
    /// Type compatibility is not checked here; incompatible connections are
    /// allowed and surface as errors during validation.
    pub fn connect(
        &mut self,
        output: SlotReference,
        input: SlotReference,
    ) -> Result<Edge, GraphError> {
        let output_slot = self.slot_checked(output)?;
        if output_slot.direction != SlotDirection::Output {
            return Err(GraphError::WrongDirection {
                slot: output,
                expected: SlotDirection::Output,
            });
        }
        let input_slot = self.slot_checked(input)?;
        if input_slot.direction != SlotDirection::Input {
            return Err(GraphError::WrongDirection {
                slot: input,
                expected: SlotDirection::Input,
            });
        }

        if output.node_id() == input.node_id() {
            return Err(GraphError::SelfLoop);
        }

        if self.edges_on(input).iter().any(|e| e.input_slot == input) {
            return Err(GraphError::InputAlreadyConnected(input));
        }

        if self.is_downstream(input.node_id(), output.node_id()) {
            return Err(GraphError::WouldCreateCycle);
        }

        let edge = Edge::new(output, input);
        self.add_edge(edge);
        Ok(edge)
    }

    /// Insert an edge without any checks.
    ///
    /// Used when loading graphs. Returns `false` if the edge already existed.
    pub fn add_edge(&mut self, edge: Edge) -> bool {
        if !self.edges.insert(edge) {
            return false;
        }
        self.edge_index.entry(edge.output_slot).or_default().push(edge);
        self.edge_index.entry(edge.input_slot).or_default().push(edge);
        self.events.push(GraphEvent::TopologyChanged);
        true
    }

    /// Remove an edge
    pub fn disconnect(&mut self, edge: &Edge) -> bool {
        let removed = self.remove_edge(edge);
        if removed {
            self.events.push(GraphEvent::TopologyChanged);
        }
        removed
    }

    fn remove_edge(&mut self, edge: &Edge) -> bool {
        if !self.edges.shift_remove(edge) {
            return false;
        }
        for endpoint in [edge.output_slot, edge.input_slot] {
            if let Some(list) = self.edge_index.get_mut(&endpoint) {
                list.retain(|e| e != edge);
                if list.is_empty() {
                    self.edge_index.remove(&endpoint);
                }
            }
        }
        true
    }

    /// All edges whose output or input endpoint is `slot`, in insertion order
    pub fn edges_on(&self, slot: SlotReference) -> &[Edge] {
        self.edge_index.get(&slot).map_or(&[], Vec::as_slice)
    }

    /// Whether any edge touches `slot`
    pub fn is_connected(&self, slot: SlotReference) -> bool {
        !self.edges_on(slot).is_empty()
    }

    /// Get all edges
    pub fn edges(&self) -> impl Iterator<Item = &Edge> {
        self.edges.iter()
    }

    /// Get the number of edges
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Show or hide a node's preview, notifying observers on change
    pub fn set_preview_expanded(
        &mut self,
        node_id: NodeId,
        expanded: bool,
    ) -> Result<(), GraphError> {
        let node = self
            .nodes
            .get_mut(&node_id)
            .ok_or(GraphError::NodeNotFound(node_id))?;
        if node.set_preview_expanded(expanded) {
            self.events.push(GraphEvent::NodeModified {
                node: node_id,
                scope: ModificationScope::Node,
            });
        }
        Ok(())
    }

    /// Take all pending notifications
    pub fn drain_events(&mut self) -> Vec<GraphEvent> {
        std::mem::take(&mut self.events)
    }

    /// All nodes in dependency order.
    ///
    /// Every node comes after the nodes feeding its inputs. A cycle is broken
    /// at the first of its nodes reached in insertion order, which then comes
    /// after the rest of the cycle.
    pub fn dependency_order(&self) -> Vec<NodeId> {
        self.order_from(self.nodes.keys().copied())
    }

    /// `node_id` and everything upstream of it, in dependency order.
    ///
    /// Empty if the node does not exist.
    pub fn upstream_order(&self, node_id: NodeId) -> Vec<NodeId> {
        if !self.nodes.contains_key(&node_id) {
            return Vec::new();
        }
        self.order_from([node_id])
    }

    /// Post-order walk against edge direction, with an explicit stack so that
    /// long chains cannot exhaust the call stack
    fn order_from(&self, roots: impl IntoIterator<Item = NodeId>) -> Vec<NodeId> {
        let mut visited = HashSet::new();
        let mut order = Vec::new();
        let mut stack: Vec<(NodeId, bool)> = Vec::new();

        for root in roots {
            stack.push((root, false));
            while let Some((node_id, expanded)) = stack.pop() {
                if expanded {
                    order.push(node_id);
                    continue;
                }
                if !visited.insert(node_id) {
                    continue;
                }
                stack.push((node_id, true));

                let upstream: Vec<NodeId> = self.upstream_nodes(node_id).collect();
                for upstream_id in upstream.into_iter().rev() {
                    if !visited.contains(&upstream_id) {
                        stack.push((upstream_id, false));
                    }
                }
            }
        }

        order
    }

    /// Existing nodes feeding the inputs of `node_id`, in slot and edge order
    fn upstream_nodes(&self, node_id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.node(node_id)
            .into_iter()
            .flat_map(move |node| node.input_slots().map(move |slot| slot.reference(node_id)))
            .flat_map(move |input| {
                self.edges_on(input)
                    .iter()
                    .filter(move |e| e.input_slot == input)
                    .map(|e| e.output_slot.node_id())
            })
            .filter(move |id| self.nodes.contains_key(id))
    }

    fn slot_checked(&self, slot: SlotReference) -> Result<&Slot, GraphError> {
        let node = self
            .node(slot.node_id())
            .ok_or(GraphError::NodeNotFound(slot.node_id()))?;
        node.slot(slot.slot_id()).ok_or(GraphError::SlotNotFound(slot))
    }

    /// Whether `target` can be reached from `start` by following edges forward
    fn is_downstream(&self, start: NodeId, target: NodeId) -> bool {
        let mut visited = HashSet::new();
        let mut stack = vec![start];

        while let Some(node_id) = stack.pop() {
            if node_id == target {
                return true;
            }
            if !visited.insert(node_id) {
                continue;
            }
            let Some(node) = self.node(node_id) else {
                continue;
            };
            for slot in node.output_slots() {
                for edge in self.edges_on(slot.reference(node_id)) {
                    if edge.output_slot.node_id() == node_id {
                        stack.push(edge.input_slot.node_id());
                    }
                }
            }
        }

        false
    }
}

impl Default for Graph {
    fn default() -> Self {
        Self::new("Untitled")
    }
}

/// Error when editing a graph
#[derive(Debug, thiserror::Error)]
pub enum GraphError {
    /// Node not found
    #[error("Node not found: {0}")]
    NodeNotFound(NodeId),

    /// Slot not found
    #[error("Slot not found: {0}")]
    SlotNotFound(SlotReference),

    /// Slot cannot be added to the node
    #[error("Invalid slot {slot}: {reason}")]
    InvalidSlot {
        /// Offending slot ID
        slot: SlotId,
        /// What is wrong with it
        reason: String,
    },

    /// Edge endpoint has the wrong direction
    #[error("Slot {slot} is not an {expected:?} slot")]
    WrongDirection {
        /// Offending endpoint
        slot: SlotReference,
        /// Direction the endpoint needs
        expected: SlotDirection,
    },

    /// Self-loop not allowed
    #[error("Self-loop not allowed")]
    SelfLoop,

    /// Input slot already has an incoming edge
    #[error("Input already connected: {0}")]
    InputAlreadyConnected(SlotReference),

    /// Edge would close a cycle
    #[error("Edge would create a cycle")]
    WouldCreateCycle,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value_type::ValueType;

    fn passthrough(name: &str) -> Node {
        let mut node = Node::empty("passthrough", name);
        node.add_slot(Slot::input(0, "In", ValueType::Vector4)).unwrap();
        node.add_slot(Slot::output(1, "Out", ValueType::Vector4)).unwrap();
        node
    }

    fn out_ref(node: NodeId) -> SlotReference {
        SlotReference::new(node, SlotId(1))
    }

    fn in_ref(node: NodeId) -> SlotReference {
        SlotReference::new(node, SlotId(0))
    }

    #[test]
    fn test_connect_and_lookup() {
        let mut graph = Graph::new("Test");
        let a = graph.add_node(passthrough("A"));
        let b = graph.add_node(passthrough("B"));
        let c = graph.add_node(passthrough("C"));

        let ab = graph.connect(out_ref(a), in_ref(b)).unwrap();
        let ac = graph.connect(out_ref(a), in_ref(c)).unwrap();

        assert_eq!(graph.edge_count(), 2);
        assert_eq!(graph.edges_on(out_ref(a)), &[ab, ac]);
        assert_eq!(graph.edges_on(in_ref(b)), &[ab]);
        assert!(graph.edges_on(in_ref(a)).is_empty());
        assert!(graph.is_connected(in_ref(c)));
    }

    #[test]
    fn test_connect_rejects_bad_edges() {
        let mut graph = Graph::new("Test");
        let a = graph.add_node(passthrough("A"));
        let b = graph.add_node(passthrough("B"));
        let c = graph.add_node(passthrough("C"));

        assert!(matches!(
            graph.connect(in_ref(a), in_ref(b)),
            Err(GraphError::WrongDirection { .. })
        ));
        assert!(matches!(
            graph.connect(out_ref(a), out_ref(b)),
            Err(GraphError::WrongDirection { .. })
        ));
        assert!(matches!(graph.connect(out_ref(a), in_ref(a)), Err(GraphError::SelfLoop)));
        assert!(matches!(
            graph.connect(out_ref(a), SlotReference::new(b, SlotId(9))),
            Err(GraphError::SlotNotFound(_))
        ));
        assert!(matches!(
            graph.connect(out_ref(NodeId::new()), in_ref(b)),
            Err(GraphError::NodeNotFound(_))
        ));

        graph.connect(out_ref(a), in_ref(b)).unwrap();
        assert!(matches!(
            graph.connect(out_ref(c), in_ref(b)),
            Err(GraphError::InputAlreadyConnected(_))
        ));
    }

    #[test]
    fn test_connect_rejects_cycles() {
        let mut graph = Graph::new("Test");
        let a = graph.add_node(passthrough("A"));
        let b = graph.add_node(passthrough("B"));
        let c = graph.add_node(passthrough("C"));

        graph.connect(out_ref(a), in_ref(b)).unwrap();
        graph.connect(out_ref(b), in_ref(c)).unwrap();
        assert!(matches!(
            graph.connect(out_ref(c), in_ref(a)),
            Err(GraphError::WouldCreateCycle)
        ));
    }

    #[test]
    fn test_remove_node_drops_edges() {
        let mut graph = Graph::new("Test");
        let a = graph.add_node(passthrough("A"));
        let b = graph.add_node(passthrough("B"));
        graph.connect(out_ref(a), in_ref(b)).unwrap();

        assert!(graph.remove_node(a).is_some());
        assert_eq!(graph.edge_count(), 0);
        assert!(graph.edges_on(in_ref(b)).is_empty());
        assert!(graph.remove_node(a).is_none());
    }

    #[test]
    fn test_remove_slot_drops_edges() {
        let mut graph = Graph::new("Test");
        let a = graph.add_node(passthrough("A"));
        let b = graph.add_node(passthrough("B"));
        graph.connect(out_ref(a), in_ref(b)).unwrap();

        graph.drain_events();

        let slot = graph.remove_slot(b, SlotId(0)).unwrap();
        assert!(slot.is_input());
        assert_eq!(
            graph.drain_events(),
            vec![GraphEvent::NodeModified {
                node: b,
                scope: ModificationScope::Topological,
            }]
        );
        assert_eq!(graph.edge_count(), 0);
        assert!(graph.edges_on(out_ref(a)).is_empty());
        assert!(matches!(
            graph.remove_slot(b, SlotId(0)),
            Err(GraphError::SlotNotFound(_))
        ));
    }

    #[test]
    fn test_dependency_order_ignores_insertion_order() {
        let mut graph = Graph::new("Test");
        let sink = graph.add_node(passthrough("Sink"));
        let mid = graph.add_node(passthrough("Mid"));
        let head = graph.add_node(passthrough("Head"));
        let lone = graph.add_node(passthrough("Lone"));
        graph.connect(out_ref(head), in_ref(mid)).unwrap();
        graph.connect(out_ref(mid), in_ref(sink)).unwrap();

        assert_eq!(graph.dependency_order(), vec![head, mid, sink, lone]);
        assert_eq!(graph.upstream_order(mid), vec![head, mid]);
        assert!(graph.upstream_order(NodeId::new()).is_empty());
    }

    #[test]
    fn test_dependency_order_with_cycle_and_dangling_edge() {
        let mut graph = Graph::new("Test");
        let a = graph.add_node(passthrough("A"));
        let b = graph.add_node(passthrough("B"));
        graph.add_edge(Edge::new(out_ref(a), in_ref(b)));
        graph.add_edge(Edge::new(out_ref(b), in_ref(a)));
        let c = graph.add_node(passthrough("C"));
        graph.add_edge(Edge::new(out_ref(NodeId::new()), in_ref(c)));

        assert_eq!(graph.dependency_order(), vec![b, a, c]);
    }

    #[test]
    fn test_long_chain_order() {
        let mut graph = Graph::new("Test");
        let ids: Vec<NodeId> = (0..2000).map(|i| graph.add_node(passthrough(&format!("N{i}")))).collect();
        for pair in ids.windows(2) {
            graph.add_edge(Edge::new(out_ref(pair[0]), in_ref(pair[1])));
        }

        let last = *ids.last().unwrap();
        assert_eq!(graph.upstream_order(last), ids);
    }

    #[test]
    fn test_add_slot_with_flipped_direction_drops_edges() {
        let mut graph = Graph::new("Test");
        let a = graph.add_node(passthrough("A"));
        let b = graph.add_node(passthrough("B"));
        graph.connect(out_ref(a), in_ref(b)).unwrap();
        graph.drain_events();

        graph
            .add_slot(b, Slot::input(0, "In", ValueType::Vector2))
            .unwrap();
        assert_eq!(graph.edge_count(), 1);

        graph
            .add_slot(b, Slot::output(0, "In", ValueType::Vector2))
            .unwrap();
        assert_eq!(graph.edge_count(), 0);
        assert!(graph.edges_on(out_ref(a)).is_empty());
        assert_eq!(
            graph.drain_events(),
            vec![
                GraphEvent::NodeModified {
                    node: b,
                    scope: ModificationScope::Graph,
                },
                GraphEvent::NodeModified {
                    node: b,
                    scope: ModificationScope::Topological,
                },
            ]
        );
    }

    #[test]
    fn test_add_edge_is_unchecked_and_deduplicated() {
        let mut graph = Graph::new("Test");
        let a = graph.add_node(passthrough("A"));
        let ghost = NodeId::new();
        let edge = Edge::new(out_ref(ghost), in_ref(a));

        assert!(graph.add_edge(edge));
        assert!(!graph.add_edge(edge));
        assert_eq!(graph.edge_count(), 1);
        assert!(graph.disconnect(&edge));
        assert!(!graph.disconnect(&edge));
    }

    #[test]
    fn test_preview_expanded_notifies_on_change() {
        let mut graph = Graph::new("Test");
        let a = graph.add_node(passthrough("A"));
        graph.drain_events();

        graph.set_preview_expanded(a, true).unwrap();
        assert!(graph.drain_events().is_empty());

        graph.set_preview_expanded(a, false).unwrap();
        assert_eq!(
            graph.drain_events(),
            vec![GraphEvent::NodeModified {
                node: a,
                scope: ModificationScope::Node,
            }]
        );
        assert!(!graph.node(a).unwrap().preview_expanded());
    }
}
