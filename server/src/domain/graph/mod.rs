//! Dataflow graph construction
//!
//! Merges the open-family records of a project's filtered logs into one
//! bipartite program/file graph.

mod builder;
mod types;

pub use builder::{EDGE_ID_PREFIX, GraphBuilder, GraphError, build_graph, program_key};
pub use types::{Graph, GraphEdge, GraphNode, NodeType};
