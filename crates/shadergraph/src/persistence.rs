// SPDX-License-Identifier: MIT OR Apache-2.0
//! Saving and loading graphs as RON.
//!
//! Only authored data is stored: node IDs, slots with their declared types
//! and values, and edge endpoints. Concrete types, error flags and versions
//! are derived and come back on the next validation pass.

use crate::graph::Graph;
use std::path::Path;

/// File extension for graph files
pub const GRAPH_FILE_EXTENSION: &str = "shadergraph";

/// Serialize a graph to pretty RON text
pub fn to_ron_string(graph: &Graph) -> Result<String, PersistenceError> {
    Ok(ron::ser::to_string_pretty(graph, ron::ser::PrettyConfig::default())?)
}

/// Parse a graph from RON text
pub fn from_ron_str(text: &str) -> Result<Graph, PersistenceError> {
    Ok(ron::from_str(text)?)
}

/// Save a graph to a file
pub fn save_graph(graph: &Graph, path: &Path) -> Result<(), PersistenceError> {
    std::fs::write(path, to_ron_string(graph)?)?;
    tracing::info!(
        path = %path.display(),
        nodes = graph.node_count(),
        edges = graph.edge_count(),
        "saved graph"
    );
    Ok(())
}

/// Load a graph from a file.
///
/// Node-specific error checks are not stored; reattach them with
/// [`NodeRegistry::attach_error_checks`](crate::node::NodeRegistry::attach_error_checks).
pub fn load_graph(path: &Path) -> Result<Graph, PersistenceError> {
    let text = std::fs::read_to_string(path)?;
    let graph = from_ron_str(&text)?;
    tracing::info!(
        path = %path.display(),
        nodes = graph.node_count(),
        edges = graph.edge_count(),
        "loaded graph"
    );
    Ok(graph)
}

/// Error when saving or loading a graph
#[derive(Debug, thiserror::Error)]
pub enum PersistenceError {
    /// File could not be read or written
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// File is not a valid graph
    #[error("Parse error: {0}")]
    Parse(#[from] ron::error::SpannedError),

    /// Graph could not be serialized
    #[error("Serialization error: {0}")]
    Serialize(#[from] ron::Error),
}
