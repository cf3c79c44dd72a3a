// SPDX-License-Identifier: MIT OR Apache-2.0
//! Shader node graph with slot type resolution.
//!
//! Nodes are shader operations, slots are their typed inputs and outputs,
//! and edges connect an output slot to an input slot. Slots may declare a
//! fixed type or a dynamic one that is inferred from what is connected.
//!
//! ## Architecture
//!
//! - [`Graph`] owns every node and edge and indexes edges by slot
//! - [`Node`] owns its slots and never refers to other nodes directly
//! - [`validation`] resolves concrete slot types bottom-up and flags errors
//! - [`codegen`] and [`properties`] answer the questions shader generation
//!   and material previews ask about a validated graph
//! - [`persistence`] and [`settings`] handle RON files

pub mod value_type;
pub mod slot;
pub mod edge;
pub mod node;
pub mod graph;
pub mod validation;
pub mod codegen;
pub mod properties;
pub mod settings;
pub mod persistence;
pub mod library;

pub use value_type::{ConcreteValueType, ValueType};
pub use slot::{Slot, SlotDirection, SlotId, SlotReference};
pub use edge::Edge;
pub use node::{
    GraphKind, Node, NodeCapabilities, NodeCategory, NodeErrorCheck, NodeId, NodeRegistry,
    NodeType, PreviewMode,
};
pub use graph::{Graph, GraphError, GraphEvent, ModificationScope};
pub use validation::{ValidationIssue, ValidationReport, Validator};
pub use codegen::{GenerationContext, GenerationMode, OutputPrecision};
pub use properties::{PreviewProperty, PropertyCollector, PropertyType, ShaderProperty};
pub use settings::{GraphSettings, SettingsError};
pub use persistence::PersistenceError;
pub use library::create_shader_registry;
