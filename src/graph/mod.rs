// src/graph/mod.rs
// =============================================================================
// Graph assembly and export.
//
// Submodules:
// - builder: folds discovery events into a filtered, labelled graph
// - render: writes that graph as Graphviz DOT or JSON
// =============================================================================

mod builder;
mod render;

pub use builder::{build_graph, Graph, GraphBuilder, GraphNode};
pub use render::{to_dot, to_json};
