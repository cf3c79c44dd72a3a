// SPDX-License-Identifier: MIT OR Apache-2.0
//! Edge definitions for the graph.

use crate::node::NodeId;
use crate::slot::SlotReference;
use serde::{Deserialize, Serialize};

/// A connection from an output slot to an input slot.
///
/// Edges have no identity of their own: two edges with the same endpoints
/// are the same edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Edge {
    /// Source (output) slot
    pub output_slot: SlotReference,
    /// Target (input) slot
    pub input_slot: SlotReference,
}

impl Edge {
    /// Create a new edge
    pub fn new(output_slot: SlotReference, input_slot: SlotReference) -> Self {
        Self {
            output_slot,
            input_slot,
        }
    }

    /// Check if this edge involves a specific node
    pub fn involves_node(&self, node_id: NodeId) -> bool {
        self.output_slot.node_id() == node_id || self.input_slot.node_id() == node_id
    }
}
