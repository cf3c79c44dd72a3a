// SPDX-License-Identifier: MIT OR Apache-2.0
//! Queries used by shader source generation.
//!
//! Generating full shader text is left to the caller. This module answers
//! the per-slot questions it needs: what a slot's variable is called, and
//! which expression feeds an input slot once its type has been resolved.

use crate::graph::{Graph, GraphError};
use crate::node::{Node, NodeId};
use crate::settings::GraphSettings;
use crate::slot::{SlotId, SlotReference};
use crate::value_type::ConcreteValueType;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Scalar precision of generated code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum OutputPrecision {
    /// Low precision fixed point
    Fixed,
    /// Half precision float
    Half,
    /// Full precision float
    #[default]
    Float,
}

impl fmt::Display for OutputPrecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Fixed => "fixed",
            Self::Half => "half",
            Self::Float => "float",
        })
    }
}

/// What the generated shader is for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum GenerationMode {
    /// Editor preview; unconnected inputs are exposed as properties
    #[default]
    Preview,
    /// Final shader; unconnected inputs are inlined
    Final,
}

impl GenerationMode {
    /// Whether this is preview generation
    pub fn is_preview(self) -> bool {
        matches!(self, Self::Preview)
    }
}

/// Parameters shared by all generation queries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GenerationContext {
    /// Scalar precision
    pub precision: OutputPrecision,
    /// Generation mode
    pub mode: GenerationMode,
}

impl From<&GraphSettings> for GenerationContext {
    fn from(settings: &GraphSettings) -> Self {
        Self {
            precision: settings.precision,
            mode: settings.generation_mode,
        }
    }
}

/// Format a float literal, always keeping a decimal point
pub fn format_float(value: f32) -> String {
    if value.is_finite() && value.fract() == 0.0 {
        format!("{value:.1}")
    } else {
        format!("{value}")
    }
}

/// Shader type name for a concrete type
pub fn concrete_type_to_string(precision: OutputPrecision, ty: ConcreteValueType) -> String {
    match ty {
        ConcreteValueType::Vector1 => precision.to_string(),
        ConcreteValueType::Vector2 => format!("{precision}2"),
        ConcreteValueType::Vector3 => format!("{precision}3"),
        ConcreteValueType::Vector4 => format!("{precision}4"),
        ConcreteValueType::Texture2D => "Texture2D".to_string(),
        ConcreteValueType::Matrix2 => "Matrix2x2".to_string(),
        ConcreteValueType::Matrix3 => "Matrix3x3".to_string(),
        ConcreteValueType::Matrix4 => "Matrix4x4".to_string(),
        ConcreteValueType::SamplerState => "SamplerState".to_string(),
        ConcreteValueType::Error => "Error".to_string(),
    }
}

/// Short, stable hash of a node ID (8 uppercase hex digits)
pub fn short_id_hash(id: NodeId) -> String {
    let hash = blake3::hash(id.0.as_bytes());
    hash.as_bytes()[..4].iter().map(|b| format!("{b:02X}")).collect()
}

/// Variable name prefix shared by all slots of a node
pub fn variable_name_for_node(node: &Node) -> String {
    let mut name: String = node
        .name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    if !name.starts_with(|c: char| c.is_ascii_alphabetic() || c == '_') {
        name.insert(0, '_');
    }
    format!("{name}_{}", short_id_hash(node.id))
}

/// Variable name of a slot
pub fn variable_name_for_slot(node: &Node, slot_id: SlotId) -> Result<String, GraphError> {
    let slot = node
        .slot(slot_id)
        .ok_or(GraphError::SlotNotFound(SlotReference::new(node.id, slot_id)))?;
    Ok(format!("{}_{}", variable_name_for_node(node), slot.shader_output_name))
}

/// Expression reading an output slot of `node` as type `to`
pub fn adapt_node_output(
    node: &Node,
    slot_id: SlotId,
    to: ConcreteValueType,
) -> Result<String, GraphError> {
    let raw = variable_name_for_slot(node, slot_id)?;
    let from = node
        .slot(slot_id)
        .map_or(ConcreteValueType::Error, |s| s.concrete_type);

    if from == to || !from.is_vector() || !to.is_vector() {
        return Ok(raw);
    }

    let to_count = to.channel_count();
    if from == ConcreteValueType::Vector1 {
        return Ok(format!("({raw}).{}", "x".repeat(to_count)));
    }
    if to_count < from.channel_count() {
        return Ok(format!("{raw}.{}", &"xyzw"[..to_count]));
    }
    Ok(raw)
}

/// Expression feeding an input slot.
///
/// Connected inputs read the upstream output adapted to this slot's concrete
/// type (first edge only). Unconnected inputs use their own value. Returns
/// an empty string when the slot or the upstream endpoint does not exist.
pub fn slot_value(
    graph: &Graph,
    node_id: NodeId,
    slot_id: SlotId,
    ctx: &GenerationContext,
) -> String {
    let Some(node) = graph.node(node_id) else {
        return String::new();
    };
    let Some(input) = node.find_input_slot(slot_id) else {
        return String::new();
    };

    let reference = input.reference(node_id);
    let first_edge = graph
        .edges_on(reference)
        .iter()
        .find(|e| e.input_slot == reference);

    if let Some(edge) = first_edge {
        let upstream_slot = edge.output_slot;
        let Some(upstream) = graph.node(upstream_slot.node_id()) else {
            return String::new();
        };
        if upstream.find_output_slot(upstream_slot.slot_id()).is_none() {
            return String::new();
        }
        return adapt_node_output(upstream, upstream_slot.slot_id(), input.concrete_type)
            .unwrap_or_default();
    }

    match variable_name_for_slot(node, slot_id) {
        Ok(name) => input.default_value_expression(ctx.precision, ctx.mode, &name),
        Err(_) => String::new(),
    }
}
