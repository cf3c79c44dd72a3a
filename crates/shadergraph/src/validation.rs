// SPDX-License-Identifier: MIT OR Apache-2.0
//! Slot type resolution.
//!
//! Validating a node first validates every node feeding its inputs, then
//! resolves a concrete type for each of its slots:
//!
//! 1. Unconnected inputs take their declared type. Unconnected dynamic
//!    inputs wait for the shared dynamic type.
//! 2. Connected inputs look at the first incident edge only. Fixed inputs
//!    check the upstream type against their own with
//!    [`common_channel_type`]; dynamic inputs record the upstream type.
//! 3. All dynamic slots of the node share one type computed by
//!    [`resolve_dynamic_type`].
//! 4. Outputs are `Error` if any input is, otherwise the dynamic type or
//!    their declared type.
//!
//! Errors never abort a pass. Every reachable slot gets a best-effort type
//! and errors propagate downstream through `Error` slots and the node's
//! error flag. A node's version only advances on an error-free pass.

use crate::edge::Edge;
use crate::graph::{Graph, GraphError};
use crate::node::{Node, NodeId};
use crate::slot::{SlotId, SlotReference};
use crate::value_type::{common_channel_type, resolve_dynamic_type, ConcreteValueType};
use serde::Serialize;
use std::collections::HashSet;

/// Problem found during a validation pass
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ValidationIssue {
    /// Upstream type cannot feed the input slot
    IncompatibleConnection {
        /// Input slot that received the value
        input: SlotReference,
        /// Upstream concrete type
        from: ConcreteValueType,
        /// Type the input slot expects
        to: ConcreteValueType,
    },
    /// An upstream node was left in error
    UpstreamError {
        /// Node consuming the errored value
        node: NodeId,
        /// Node in error
        upstream: NodeId,
    },
    /// Edge endpoint names a node or slot that does not exist
    DanglingEdge {
        /// The edge
        edge: Edge,
    },
    /// Upstream node sits on a cycle and was not validated yet
    Cycle {
        /// Node closing the cycle
        node: NodeId,
        /// Node already on the stack
        upstream: NodeId,
    },
    /// Node-specific error condition returned true
    NodeCheckFailed {
        /// The node
        node: NodeId,
    },
}

/// Outcome of a validation pass
#[derive(Debug, Clone, Default, Serialize)]
pub struct ValidationReport {
    /// Nodes validated, in completion order (dependencies first)
    pub validated: Vec<NodeId>,
    /// Nodes left in error
    pub errors: Vec<NodeId>,
    /// Problems found
    pub issues: Vec<ValidationIssue>,
}

impl ValidationReport {
    /// Whether every validated node is free of errors
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }

    /// Whether the given node ended the pass in error
    pub fn has_error(&self, node_id: NodeId) -> bool {
        self.errors.contains(&node_id)
    }
}

/// A single validation pass over a graph.
///
/// Nodes are validated in dependency order, so every upstream node is
/// finished before its consumers and no call recurses. Each node is validated
/// at most once per pass and shared ancestors are reused by every consumer.
pub struct Validator<'g> {
    graph: &'g mut Graph,
    finished: HashSet<NodeId>,
    report: ValidationReport,
}

impl<'g> Validator<'g> {
    /// Start a pass over `graph`
    pub fn new(graph: &'g mut Graph) -> Self {
        Self {
            graph,
            finished: HashSet::new(),
            report: ValidationReport::default(),
        }
    }

    /// Validate a node and everything upstream of it.
    ///
    /// Returns the node's error state, or `None` if the node does not exist.
    pub fn validate(&mut self, node_id: NodeId) -> Option<bool> {
        for id in self.graph.upstream_order(node_id) {
            self.visit(id);
        }
        self.graph.node(node_id).map(Node::has_error)
    }

    /// Validate every node in the graph
    pub fn validate_all(&mut self) {
        for id in self.graph.dependency_order() {
            self.visit(id);
        }
    }

    /// Finish the pass
    pub fn finish(self) -> ValidationReport {
        self.report
    }

    fn visit(&mut self, node_id: NodeId) {
        if self.finished.contains(&node_id) {
            return;
        }
        let upstream_error = self.check_dependencies(node_id);

        let (assignments, dynamic_type) = {
            let graph = &*self.graph;
            let Some(node) = graph.node(node_id) else {
                return;
            };
            resolve_inputs(graph, node, &mut self.report.issues)
        };

        let Some(node) = self.graph.node_mut(node_id) else {
            return;
        };
        for (slot_id, ty) in assignments {
            if let Some(slot) = node.slot_mut(slot_id) {
                slot.concrete_type = ty;
            }
        }

        let input_error = node.input_slots().any(|s| s.concrete_type.is_error());

        let outputs: Vec<_> = node.output_slots().map(|s| (s.id, s.declared_type)).collect();
        for (slot_id, declared) in outputs {
            let ty = if input_error {
                ConcreteValueType::Error
            } else if declared.is_dynamic() {
                dynamic_type
            } else {
                declared.to_concrete()
            };
            if let Some(slot) = node.slot_mut(slot_id) {
                slot.concrete_type = ty;
            }
        }

        let output_error = node.output_slots().any(|s| s.concrete_type.is_error());

        let check_failed = {
            let graph = &*self.graph;
            graph.node(node_id).is_some_and(|node| {
                node.error_check().is_some_and(|check| check(node, graph))
            })
        };
        if check_failed {
            self.report.issues.push(ValidationIssue::NodeCheckFailed { node: node_id });
        }

        let has_error = upstream_error || input_error || output_error || check_failed;
        let Some(node) = self.graph.node_mut(node_id) else {
            return;
        };
        node.finish_validation(has_error);

        tracing::debug!(
            node = %node_id,
            name = %node.name,
            has_error,
            version = node.version(),
            "validated node"
        );

        self.finished.insert(node_id);
        self.report.validated.push(node_id);
        if has_error {
            self.report.errors.push(node_id);
        }
    }

    /// Look at every node feeding an input of `node_id`.
    ///
    /// Dependencies come first in the visiting order, so an upstream node
    /// that is not finished yet closes a cycle through `node_id`. Returns
    /// whether any upstream node is in error or on such a cycle.
    fn check_dependencies(&mut self, node_id: NodeId) -> bool {
        let graph = &*self.graph;
        let upstream: Vec<NodeId> = match graph.node(node_id) {
            Some(node) => node
                .input_slots()
                .flat_map(|slot| incoming_edges(graph, slot.reference(node_id)))
                .map(|edge| edge.output_slot.node_id())
                .collect(),
            None => return false,
        };

        let mut any_error = false;
        for upstream_id in upstream {
            // Missing upstream nodes are reported when the slot is resolved
            let Some(upstream_node) = self.graph.node(upstream_id) else {
                continue;
            };

            if !self.finished.contains(&upstream_id) {
                tracing::warn!(node = %node_id, upstream = %upstream_id, "cycle in graph");
                self.report.issues.push(ValidationIssue::Cycle {
                    node: node_id,
                    upstream: upstream_id,
                });
                any_error = true;
            } else if upstream_node.has_error() {
                self.report.issues.push(ValidationIssue::UpstreamError {
                    node: node_id,
                    upstream: upstream_id,
                });
                any_error = true;
            }
        }

        any_error
    }
}

/// Edges ending at the given input slot, in insertion order
fn incoming_edges(graph: &Graph, input: SlotReference) -> impl Iterator<Item = &Edge> + '_ {
    graph.edges_on(input).iter().filter(move |e| e.input_slot == input)
}

/// Resolve the input slots of a node.
///
/// Returns the new concrete type of every input that could be resolved and
/// the node's shared dynamic type. Inputs whose first edge dangles are left
/// out and keep their previous type.
fn resolve_inputs(
    graph: &Graph,
    node: &Node,
    issues: &mut Vec<ValidationIssue>,
) -> (Vec<(SlotId, ConcreteValueType)>, ConcreteValueType) {
    let mut assignments = Vec::new();
    let mut dynamic_with_upstream: Vec<(SlotId, ConcreteValueType)> = Vec::new();
    let mut dynamic_unconnected: Vec<SlotId> = Vec::new();

    for slot in node.input_slots() {
        let reference = slot.reference(node.id);
        let declared = slot.declared_type;

        let Some(edge) = incoming_edges(graph, reference).next() else {
            if declared.is_dynamic() {
                dynamic_unconnected.push(slot.id);
            } else {
                assignments.push((slot.id, declared.to_concrete()));
            }
            continue;
        };

        let Some(upstream_slot) = graph
            .node(edge.output_slot.node_id())
            .and_then(|n| n.find_output_slot(edge.output_slot.slot_id()))
        else {
            tracing::warn!(edge = ?edge, "edge references a missing node or slot");
            issues.push(ValidationIssue::DanglingEdge { edge: *edge });
            continue;
        };
        let from = upstream_slot.concrete_type;

        if declared.is_dynamic() {
            dynamic_with_upstream.push((slot.id, from));
            continue;
        }

        let to = declared.to_concrete();
        let resolved = common_channel_type(from, to);
        tracing::trace!(slot = %reference, ?from, ?to, ?resolved, "resolved input");
        if resolved.is_error() && !from.is_error() {
            issues.push(ValidationIssue::IncompatibleConnection {
                input: reference,
                from,
                to,
            });
        }
        assignments.push((slot.id, resolved));
    }

    let dynamic_type = resolve_dynamic_type(dynamic_with_upstream.iter().map(|(_, ty)| *ty));
    if !dynamic_with_upstream.is_empty() || !dynamic_unconnected.is_empty() {
        tracing::trace!(node = %node.id, ?dynamic_type, "resolved dynamic type");
    }

    assignments.extend(dynamic_with_upstream.into_iter().map(|(id, _)| (id, dynamic_type)));
    assignments.extend(dynamic_unconnected.into_iter().map(|id| (id, dynamic_type)));

    (assignments, dynamic_type)
}

impl Graph {
    /// Validate a node and its upstream chain
    pub fn validate_node(&mut self, node_id: NodeId) -> Result<ValidationReport, GraphError> {
        let mut validator = Validator::new(self);
        validator
            .validate(node_id)
            .ok_or(GraphError::NodeNotFound(node_id))?;
        Ok(validator.finish())
    }

    /// Validate every node in the graph in a single pass.
    ///
    /// The outcome does not depend on the order nodes were added in.
    pub fn validate_all(&mut self) -> ValidationReport {
        let mut validator = Validator::new(self);
        validator.validate_all();
        let report = validator.finish();
        tracing::debug!(
            nodes = report.validated.len(),
            errors = report.errors.len(),
            "validated graph"
        );
        report
    }
}
