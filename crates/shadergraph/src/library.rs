// SPDX-License-Identifier: MIT OR Apache-2.0
//! Built-in shader node types.
//!
//! Math nodes declare dynamic slots so a single node type works for every
//! vector width. Texture and master nodes use fixed types.

use crate::graph::Graph;
use crate::node::{Node, NodeCapabilities, NodeCategory, NodeRegistry, NodeType, PreviewMode};
use crate::slot::{Slot, SlotId, SlotReference};
use crate::value_type::{ConcreteValueType, ValueType};

/// Texture input of the `sample_texture_2d` node
pub const SAMPLE_TEXTURE_INPUT: SlotId = SlotId(0);

/// Create the registry with all built-in node types
pub fn create_shader_registry() -> NodeRegistry {
    let mut registry = NodeRegistry::new();

    // ========================================================================
    // Master Nodes
    // ========================================================================

    registry.register(NodeType {
        id: "pbr_master".to_string(),
        name: "PBR Master".to_string(),
        category: NodeCategory::Output,
        description: "Physically based surface output".to_string(),
        inputs: vec![
            Slot::input(0, "Albedo", ValueType::Vector3).with_default([0.8, 0.8, 0.8, 0.0]),
            Slot::input(1, "Normal", ValueType::Vector3).with_default([0.0, 0.0, 1.0, 0.0]),
            Slot::input(2, "Emission", ValueType::Vector3),
            Slot::input(3, "Metallic", ValueType::Vector1),
            Slot::input(4, "Smoothness", ValueType::Vector1).with_default([0.5, 0.0, 0.0, 0.0]),
            Slot::input(5, "Occlusion", ValueType::Vector1).with_default([1.0, 0.0, 0.0, 0.0]),
            Slot::input(6, "Alpha", ValueType::Vector1).with_default([1.0, 0.0, 0.0, 0.0]),
        ],
        outputs: vec![],
        error_check: None,
        capabilities: NodeCapabilities::default()
            .with_preview(PreviewMode::Preview3D)
            .material_only(),
    });

    registry.register(NodeType {
        id: "unlit_master".to_string(),
        name: "Unlit Master".to_string(),
        category: NodeCategory::Output,
        description: "Unlit surface output".to_string(),
        inputs: vec![
            Slot::input(0, "Color", ValueType::Vector3).with_default([1.0, 1.0, 1.0, 0.0]),
            Slot::input(1, "Alpha", ValueType::Vector1).with_default([1.0, 0.0, 0.0, 0.0]),
        ],
        outputs: vec![],
        error_check: None,
        capabilities: NodeCapabilities::default()
            .with_preview(PreviewMode::Preview3D)
            .material_only(),
    });

    // ========================================================================
    // Input Nodes
    // ========================================================================

    for (id, name, ty) in [
        ("vector1", "Vector 1", ValueType::Vector1),
        ("vector2", "Vector 2", ValueType::Vector2),
        ("vector3", "Vector 3", ValueType::Vector3),
        ("vector4", "Vector 4", ValueType::Vector4),
        ("color", "Color", ValueType::Vector4),
    ] {
        registry.register(NodeType {
            id: id.to_string(),
            name: name.to_string(),
            category: NodeCategory::Input,
            description: format!("Constant {} value", name.to_lowercase()),
            inputs: vec![],
            outputs: vec![Slot::output(0, "Out", ty)],
            error_check: None,
            capabilities: NodeCapabilities::default().with_preview(PreviewMode::Preview2D),
        });
    }

    registry.register(NodeType {
        id: "texture_2d_asset".to_string(),
        name: "Texture 2D Asset".to_string(),
        category: NodeCategory::Input,
        description: "Reference to a texture asset".to_string(),
        inputs: vec![],
        outputs: vec![Slot::output(0, "Texture", ValueType::Texture2D)],
        error_check: None,
        capabilities: NodeCapabilities::default(),
    });

    registry.register(NodeType {
        id: "sampler_state".to_string(),
        name: "Sampler State".to_string(),
        category: NodeCategory::Input,
        description: "Texture filtering and wrapping state".to_string(),
        inputs: vec![],
        outputs: vec![Slot::output(0, "Sampler", ValueType::SamplerState)],
        error_check: None,
        capabilities: NodeCapabilities::default(),
    });

    registry.register(NodeType {
        id: "uv".to_string(),
        name: "UV".to_string(),
        category: NodeCategory::Input,
        description: "Mesh texture coordinates".to_string(),
        inputs: vec![],
        outputs: vec![Slot::output(0, "UV", ValueType::Vector2)],
        error_check: None,
        capabilities: NodeCapabilities::default().with_preview(PreviewMode::Preview2D),
    });

    registry.register(NodeType {
        id: "time".to_string(),
        name: "Time".to_string(),
        category: NodeCategory::Input,
        description: "Shader time values".to_string(),
        inputs: vec![],
        outputs: vec![
            Slot::output(0, "Time", ValueType::Vector1),
            Slot::output(1, "Sine Time", ValueType::Vector1),
            Slot::output(2, "Cosine Time", ValueType::Vector1),
            Slot::output(3, "Delta Time", ValueType::Vector1),
        ],
        error_check: None,
        capabilities: NodeCapabilities::default().with_preview(PreviewMode::Preview2D),
    });

    registry.register(NodeType {
        id: "object_matrix".to_string(),
        name: "Object To World".to_string(),
        category: NodeCategory::Input,
        description: "Model matrix of the rendered object".to_string(),
        inputs: vec![],
        outputs: vec![Slot::output(0, "Matrix", ValueType::Matrix4)],
        error_check: None,
        capabilities: NodeCapabilities::default(),
    });

    // ========================================================================
    // Math Nodes
    // ========================================================================

    for (id, name, description) in [
        ("add", "Add", "A + B"),
        ("subtract", "Subtract", "A - B"),
        ("multiply", "Multiply", "A * B, component-wise"),
        ("divide", "Divide", "A / B"),
        ("minimum", "Minimum", "Smaller of A and B"),
        ("maximum", "Maximum", "Larger of A and B"),
        ("power", "Power", "A raised to B"),
        ("step", "Step", "1 where B >= A, else 0"),
    ] {
        registry.register(NodeType {
            id: id.to_string(),
            name: name.to_string(),
            category: NodeCategory::Math,
            description: description.to_string(),
            inputs: vec![
                Slot::input(0, "A", ValueType::Dynamic),
                Slot::input(1, "B", ValueType::Dynamic),
            ],
            outputs: vec![Slot::output(2, "Out", ValueType::Dynamic)],
            error_check: None,
            capabilities: NodeCapabilities::default().with_preview(PreviewMode::Preview2D),
        });
    }

    for (id, name, description) in [
        ("absolute", "Absolute", "Absolute value"),
        ("negate", "Negate", "-In"),
        ("one_minus", "One Minus", "1 - In"),
        ("saturate", "Saturate", "Clamp to [0, 1]"),
        ("fraction", "Fraction", "Fractional part"),
        ("normalize", "Normalize", "Unit length vector"),
    ] {
        registry.register(NodeType {
            id: id.to_string(),
            name: name.to_string(),
            category: NodeCategory::Math,
            description: description.to_string(),
            inputs: vec![Slot::input(0, "In", ValueType::Dynamic)],
            outputs: vec![Slot::output(1, "Out", ValueType::Dynamic)],
            error_check: None,
            capabilities: NodeCapabilities::default().with_preview(PreviewMode::Preview2D),
        });
    }

    registry.register(NodeType {
        id: "lerp".to_string(),
        name: "Lerp".to_string(),
        category: NodeCategory::Math,
        description: "Linear interpolation between A and B by T".to_string(),
        inputs: vec![
            Slot::input(0, "A", ValueType::Dynamic),
            Slot::input(1, "B", ValueType::Dynamic).with_default([1.0; 4]),
            Slot::input(2, "T", ValueType::Dynamic).with_default([0.5; 4]),
        ],
        outputs: vec![Slot::output(3, "Out", ValueType::Dynamic)],
        error_check: None,
        capabilities: NodeCapabilities::default().with_preview(PreviewMode::Preview2D),
    });

    registry.register(NodeType {
        id: "clamp".to_string(),
        name: "Clamp".to_string(),
        category: NodeCategory::Math,
        description: "Clamp In between Min and Max".to_string(),
        inputs: vec![
            Slot::input(0, "In", ValueType::Dynamic),
            Slot::input(1, "Min", ValueType::Dynamic),
            Slot::input(2, "Max", ValueType::Dynamic).with_default([1.0; 4]),
        ],
        outputs: vec![Slot::output(3, "Out", ValueType::Dynamic)],
        error_check: None,
        capabilities: NodeCapabilities::default().with_preview(PreviewMode::Preview2D),
    });

    registry.register(NodeType {
        id: "dot_product".to_string(),
        name: "Dot Product".to_string(),
        category: NodeCategory::Math,
        description: "Dot product of A and B".to_string(),
        inputs: vec![
            Slot::input(0, "A", ValueType::Dynamic),
            Slot::input(1, "B", ValueType::Dynamic),
        ],
        outputs: vec![Slot::output(2, "Out", ValueType::Vector1)],
        error_check: None,
        capabilities: NodeCapabilities::default().with_preview(PreviewMode::Preview2D),
    });

    registry.register(NodeType {
        id: "length".to_string(),
        name: "Length".to_string(),
        category: NodeCategory::Math,
        description: "Length of a vector".to_string(),
        inputs: vec![Slot::input(0, "In", ValueType::Dynamic)],
        outputs: vec![Slot::output(1, "Out", ValueType::Vector1)],
        error_check: None,
        capabilities: NodeCapabilities::default().with_preview(PreviewMode::Preview2D),
    });

    // ========================================================================
    // Vector Nodes
    // ========================================================================

    registry.register(NodeType {
        id: "cross_product".to_string(),
        name: "Cross Product".to_string(),
        category: NodeCategory::Vector,
        description: "Cross product of two 3D vectors".to_string(),
        inputs: vec![
            Slot::input(0, "A", ValueType::Vector3),
            Slot::input(1, "B", ValueType::Vector3),
        ],
        outputs: vec![Slot::output(2, "Out", ValueType::Vector3)],
        error_check: None,
        capabilities: NodeCapabilities::default().with_preview(PreviewMode::Preview2D),
    });

    registry.register(NodeType {
        id: "split".to_string(),
        name: "Split".to_string(),
        category: NodeCategory::Vector,
        description: "Split a vector into its channels".to_string(),
        inputs: vec![Slot::input(0, "In", ValueType::Dynamic)],
        outputs: vec![
            Slot::output(1, "R", ValueType::Vector1),
            Slot::output(2, "G", ValueType::Vector1),
            Slot::output(3, "B", ValueType::Vector1),
            Slot::output(4, "A", ValueType::Vector1),
        ],
        error_check: None,
        capabilities: NodeCapabilities::default().with_preview(PreviewMode::Preview2D),
    });

    registry.register(NodeType {
        id: "combine".to_string(),
        name: "Combine".to_string(),
        category: NodeCategory::Vector,
        description: "Build vectors from channels".to_string(),
        inputs: vec![
            Slot::input(0, "R", ValueType::Vector1),
            Slot::input(1, "G", ValueType::Vector1),
            Slot::input(2, "B", ValueType::Vector1),
            Slot::input(3, "A", ValueType::Vector1),
        ],
        outputs: vec![
            Slot::output(4, "RGBA", ValueType::Vector4),
            Slot::output(5, "RGB", ValueType::Vector3),
            Slot::output(6, "RG", ValueType::Vector2),
        ],
        error_check: None,
        capabilities: NodeCapabilities::default().with_preview(PreviewMode::Preview2D),
    });

    // ========================================================================
    // Matrix Nodes
    // ========================================================================

    registry.register(NodeType {
        id: "transform_vector".to_string(),
        name: "Transform Vector".to_string(),
        category: NodeCategory::Matrix,
        description: "Multiply a vector by a 4x4 matrix".to_string(),
        inputs: vec![
            Slot::input(0, "Matrix", ValueType::Matrix4),
            Slot::input(1, "Vector", ValueType::Vector4).with_default([0.0, 0.0, 0.0, 1.0]),
        ],
        outputs: vec![Slot::output(2, "Out", ValueType::Vector4)],
        error_check: None,
        capabilities: NodeCapabilities::default(),
    });

    registry.register(NodeType {
        id: "transpose".to_string(),
        name: "Transpose".to_string(),
        category: NodeCategory::Matrix,
        description: "Transpose a matrix".to_string(),
        inputs: vec![Slot::input(0, "In", ValueType::Dynamic)],
        outputs: vec![Slot::output(1, "Out", ValueType::Dynamic)],
        error_check: Some(transpose_needs_matrix),
        capabilities: NodeCapabilities::default(),
    });

    // ========================================================================
    // Texture Nodes
    // ========================================================================

    registry.register(NodeType {
        id: "sample_texture_2d".to_string(),
        name: "Sample Texture 2D".to_string(),
        category: NodeCategory::Texture,
        description: "Sample a 2D texture".to_string(),
        inputs: vec![
            Slot::input(SAMPLE_TEXTURE_INPUT.0, "Texture", ValueType::Texture2D),
            Slot::input(1, "UV", ValueType::Vector2),
            Slot::input(2, "Sampler", ValueType::SamplerState),
        ],
        outputs: vec![
            Slot::output(3, "RGBA", ValueType::Vector4),
            Slot::output(4, "R", ValueType::Vector1),
            Slot::output(5, "G", ValueType::Vector1),
            Slot::output(6, "B", ValueType::Vector1),
            Slot::output(7, "A", ValueType::Vector1),
        ],
        error_check: Some(texture_unconnected),
        capabilities: NodeCapabilities::default().with_preview(PreviewMode::Preview2D),
    });

    // ========================================================================
    // Utility Nodes
    // ========================================================================

    registry.register(NodeType {
        id: "preview".to_string(),
        name: "Preview".to_string(),
        category: NodeCategory::Utility,
        description: "Preview any value".to_string(),
        inputs: vec![Slot::input(0, "In", ValueType::Dynamic)],
        outputs: vec![Slot::output(1, "Out", ValueType::Dynamic)],
        error_check: None,
        capabilities: NodeCapabilities::default().with_preview(PreviewMode::Preview2D),
    });

    registry
}

/// A texture sample needs a texture to read from
fn texture_unconnected(node: &Node, graph: &Graph) -> bool {
    !graph.is_connected(SlotReference::new(node.id, SAMPLE_TEXTURE_INPUT))
}

/// Transpose only applies to matrices
fn transpose_needs_matrix(node: &Node, _graph: &Graph) -> bool {
    node.input_slots().any(|slot| {
        !matches!(
            slot.concrete_type,
            ConcreteValueType::Matrix2 | ConcreteValueType::Matrix3 | ConcreteValueType::Matrix4
        )
    })
}
