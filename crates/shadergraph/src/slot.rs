// SPDX-License-Identifier: MIT OR Apache-2.0
//! Slot definitions for node inputs/outputs.

use crate::codegen::{format_float, GenerationMode, OutputPrecision};
use crate::node::NodeId;
use crate::properties::{PropertyCollector, PropertyValue, ShaderProperty};
use crate::value_type::{ConcreteValueType, ValueType};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a slot, unique within its node
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SlotId(pub i32);

impl fmt::Display for SlotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Slot direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SlotDirection {
    /// Input slot
    Input,
    /// Output slot
    Output,
}

/// Identifies a slot by value, without borrowing the node that owns it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SlotReference {
    node_id: NodeId,
    slot_id: SlotId,
}

impl SlotReference {
    /// Create a new slot reference
    pub fn new(node_id: NodeId, slot_id: SlotId) -> Self {
        Self { node_id, slot_id }
    }

    /// Node owning the slot
    pub fn node_id(&self) -> NodeId {
        self.node_id
    }

    /// Slot within the node
    pub fn slot_id(&self) -> SlotId {
        self.slot_id
    }
}

impl fmt::Display for SlotReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.node_id, self.slot_id)
    }
}

/// A typed port on a node
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Slot {
    /// Slot ID, unique within the node
    pub id: SlotId,
    /// Display name
    pub name: String,
    /// Symbol used when building shader variable names
    pub shader_output_name: String,
    /// Slot direction
    pub direction: SlotDirection,
    /// Type declared by the node author
    pub declared_type: ValueType,
    /// Type resolved by the last validation pass
    #[serde(skip)]
    pub concrete_type: ConcreteValueType,
    /// Value the slot starts with
    pub default_value: [f32; 4],
    /// Value currently entered by the user
    pub current_value: [f32; 4],
}

impl Slot {
    /// Create a new slot
    pub fn new(
        id: SlotId,
        name: impl Into<String>,
        direction: SlotDirection,
        declared_type: ValueType,
    ) -> Self {
        let name = name.into();
        let shader_output_name = name.chars().filter(char::is_ascii_alphanumeric).collect();
        Self {
            id,
            name,
            shader_output_name,
            direction,
            declared_type,
            concrete_type: declared_type.to_concrete(),
            default_value: [0.0; 4],
            current_value: [0.0; 4],
        }
    }

    /// Create a new input slot
    pub fn input(id: i32, name: impl Into<String>, declared_type: ValueType) -> Self {
        Self::new(SlotId(id), name, SlotDirection::Input, declared_type)
    }

    /// Create a new output slot
    pub fn output(id: i32, name: impl Into<String>, declared_type: ValueType) -> Self {
        Self::new(SlotId(id), name, SlotDirection::Output, declared_type)
    }

    /// Set the default value (also becomes the current value)
    pub fn with_default(mut self, value: [f32; 4]) -> Self {
        self.default_value = value;
        self.current_value = value;
        self
    }

    /// Override the shader output name
    pub fn with_shader_output_name(mut self, name: impl Into<String>) -> Self {
        self.shader_output_name = name.into();
        self
    }

    /// Whether this is an input slot
    pub fn is_input(&self) -> bool {
        self.direction == SlotDirection::Input
    }

    /// Whether this is an output slot
    pub fn is_output(&self) -> bool {
        self.direction == SlotDirection::Output
    }

    /// Reference to this slot on the given node
    pub fn reference(&self, node_id: NodeId) -> SlotReference {
        SlotReference::new(node_id, self.id)
    }

    /// Reset the concrete type to the direct mapping of the declared type
    pub fn reset_concrete_type(&mut self) {
        self.concrete_type = self.declared_type.to_concrete();
    }

    /// Whether the shader output name can be used inside an identifier
    pub fn has_valid_shader_output_name(&self) -> bool {
        let mut chars = self.shader_output_name.chars();
        match chars.next() {
            Some(first) if first.is_ascii_alphabetic() || first == '_' => {
                chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
            }
            _ => false,
        }
    }

    /// Register this slot's value as a shader property.
    ///
    /// Only meaningful for unconnected inputs. Outside preview generation, and
    /// for types without a property representation, this is a no-op.
    pub fn add_default_property(
        &self,
        collector: &mut PropertyCollector,
        mode: GenerationMode,
        reference_name: &str,
    ) {
        if !mode.is_preview() {
            return;
        }

        let value = match self.concrete_type {
            ConcreteValueType::Vector1 => PropertyValue::Float(self.current_value[0]),
            ConcreteValueType::Vector2
            | ConcreteValueType::Vector3
            | ConcreteValueType::Vector4 => PropertyValue::Vector(self.current_value),
            ConcreteValueType::Texture2D => PropertyValue::Texture,
            ConcreteValueType::SamplerState => PropertyValue::SamplerState,
            _ => return,
        };

        collector.add(ShaderProperty {
            reference_name: reference_name.to_string(),
            display_name: self.name.clone(),
            value,
        });
    }

    /// Shader expression for this slot's own value.
    ///
    /// Textures and samplers, and in preview mode vectors, are read from the
    /// property named `variable_name`; otherwise the current value is inlined
    /// as a literal.
    pub fn default_value_expression(
        &self,
        precision: OutputPrecision,
        mode: GenerationMode,
        variable_name: &str,
    ) -> String {
        let ty = self.concrete_type;
        if ty == ConcreteValueType::Texture2D
            || ty == ConcreteValueType::SamplerState
            || (mode.is_preview() && ty.is_vector())
        {
            return variable_name.to_string();
        }

        let v = self.current_value;
        match ty {
            ConcreteValueType::Vector1 => format_float(v[0]),
            ConcreteValueType::Vector2
            | ConcreteValueType::Vector3
            | ConcreteValueType::Vector4 => {
                let count = ty.channel_count();
                let parts: Vec<String> = v[..count].iter().copied().map(format_float).collect();
                format!("{}{}({})", precision, count, parts.join(", "))
            }
            ConcreteValueType::Matrix2 => identity_matrix(precision, 2),
            ConcreteValueType::Matrix3 => identity_matrix(precision, 3),
            ConcreteValueType::Matrix4 => identity_matrix(precision, 4),
            _ => "error".to_string(),
        }
    }
}

fn identity_matrix(precision: OutputPrecision, size: usize) -> String {
    let mut parts = Vec::with_capacity(size * size);
    for row in 0..size {
        for col in 0..size {
            parts.push(if row == col { "1" } else { "0" });
        }
    }
    format!("{precision}{size}x{size}({})", parts.join(", "))
}
