//! Graph builder
//!
//! One pass over each log, logs taken in the order given. All identity maps
//! and id counters live in [`GraphBuilder`], so independent builds never
//! share state.
//!
//! Identity rules:
//! - program nodes are scoped per log: `log-<index>##<program>`
//! - file nodes are global: the bare path, shared by every log
//!
//! Only the first read edge and the first write edge of each file are kept.
//! Later accesses with the same mode add no edge, whichever program makes
//! them. `unknown` accesses create nodes but no edge.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use rustc_hash::FxHashMap;
use thiserror::Error;

use super::types::{Graph, GraphEdge, GraphNode, NodeType};
use crate::domain::trace::{AccessMode, TraceError, TraceRecordParser, TraceSchema};

/// Prefix distinguishing edge ids from node ids
pub const EDGE_ID_PREFIX: &str = "e";

#[derive(Error, Debug)]
pub enum GraphError {
    #[error("Failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed record in {} at line {line}: {source}", .path.display())]
    MalformedRecord {
        path: PathBuf,
        line: u64,
        #[source]
        source: TraceError,
    },
}

/// Per-log program identity
pub fn program_key(log_index: usize, program: &str) -> String {
    format!("log-{}##{}", log_index, program)
}

/// Accumulates nodes and edges across logs
#[derive(Debug, Default)]
pub struct GraphBuilder {
    parser: TraceRecordParser,
    program_nodes: FxHashMap<String, String>,
    file_nodes: FxHashMap<String, String>,
    first_read: FxHashMap<String, String>,
    first_write: FxHashMap<String, String>,
    node_count: u64,
    edge_count: u64,
    graph: Graph,
}

impl GraphBuilder {
    pub fn new(schema: TraceSchema) -> Self {
        Self {
            parser: TraceRecordParser::new(schema),
            ..Self::default()
        }
    }

    /// Add one record from the log at `log_index`
    pub fn add_record(&mut self, log_index: usize, record: &str) -> Result<(), TraceError> {
        let Some(event) = self.parser.parse(record)? else {
            return Ok(());
        };

        let program_id = {
            let key = program_key(log_index, event.program);
            match self.program_nodes.get(&key) {
                Some(id) => id.clone(),
                None => {
                    let id = self.push_node(key.clone(), NodeType::Program);
                    self.program_nodes.insert(key, id.clone());
                    id
                }
            }
        };

        let file_id = match self.file_nodes.get(event.path) {
            Some(id) => id.clone(),
            None => {
                let id = self.push_node(event.path.to_string(), NodeType::File);
                self.file_nodes.insert(event.path.to_string(), id.clone());
                id
            }
        };

        match event.mode {
            AccessMode::Read if !self.first_read.contains_key(event.path) => {
                let edge_id = self.push_edge(file_id, program_id);
                self.first_read.insert(event.path.to_string(), edge_id);
            }
            AccessMode::Write if !self.first_write.contains_key(event.path) => {
                let edge_id = self.push_edge(program_id, file_id);
                self.first_write.insert(event.path.to_string(), edge_id);
            }
            _ => {}
        }

        Ok(())
    }

    /// Stream every record of `reader`; `path` only labels errors
    pub fn add_reader<R: BufRead>(
        &mut self,
        log_index: usize,
        path: &Path,
        mut reader: R,
    ) -> Result<(), GraphError> {
        let mut buf = Vec::new();
        let mut line = 0u64;
        loop {
            buf.clear();
            let n = reader
                .read_until(b'\n', &mut buf)
                .map_err(|source| GraphError::Io {
                    path: path.to_path_buf(),
                    source,
                })?;
            if n == 0 {
                return Ok(());
            }
            line += 1;
            self.add_record(log_index, &String::from_utf8_lossy(&buf))
                .map_err(|source| GraphError::MalformedRecord {
                    path: path.to_path_buf(),
                    line,
                    source,
                })?;
        }
    }

    /// Open and stream the filtered log at `path`
    pub fn add_log(&mut self, log_index: usize, path: &Path) -> Result<(), GraphError> {
        let file = File::open(path).map_err(|source| GraphError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        self.add_reader(log_index, path, BufReader::new(file))
    }

    /// Nodes and edges in insertion order
    pub fn finish(self) -> Graph {
        self.graph
    }

    fn push_node(&mut self, label: String, node_type: NodeType) -> String {
        self.node_count += 1;
        let id = self.node_count.to_string();
        self.graph.nodes.push(GraphNode {
            id: id.clone(),
            label,
            node_type,
        });
        id
    }

    fn push_edge(&mut self, source: String, target: String) -> String {
        self.edge_count += 1;
        let id = format!("{}{}", EDGE_ID_PREFIX, self.edge_count);
        self.graph.edges.push(GraphEdge {
            id: id.clone(),
            source,
            target,
        });
        id
    }
}

/// Build the merged graph of `logs`; any unreadable or malformed log fails the whole build
pub fn build_graph(logs: &[PathBuf], schema: TraceSchema) -> Result<Graph, GraphError> {
    let mut builder = GraphBuilder::new(schema);
    for (index, path) in logs.iter().enumerate() {
        builder.add_log(index, path)?;
    }
    let graph = builder.finish();
    tracing::debug!(
        logs = logs.len(),
        nodes = graph.nodes.len(),
        edges = graph.edges.len(),
        "Dataflow graph built"
    );
    Ok(graph)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::trace::trace_line;

    fn builder() -> GraphBuilder {
        GraphBuilder::new(TraceSchema::default())
    }

    fn labels(graph: &Graph, node_type: NodeType) -> Vec<&str> {
        graph
            .nodes
            .iter()
            .filter(|n| n.node_type == node_type)
            .map(|n| n.label.as_str())
            .collect()
    }

    fn node_id<'a>(graph: &'a Graph, label: &str) -> &'a str {
        &graph.nodes.iter().find(|n| n.label == label).unwrap().id
    }

    #[test]
    fn test_read_edge_points_file_to_program() {
        let mut b = builder();
        b.add_record(0, &trace_line("open", "cat", "/etc/hosts", "O_RDONLY"))
            .unwrap();
        let graph = b.finish();

        assert_eq!(graph.nodes.len(), 2);
        assert_eq!(graph.nodes[0].id, "1");
        assert_eq!(graph.nodes[0].label, "log-0##cat");
        assert_eq!(graph.nodes[0].node_type, NodeType::Program);
        assert_eq!(graph.nodes[1].id, "2");
        assert_eq!(graph.nodes[1].label, "/etc/hosts");

        assert_eq!(
            graph.edges,
            vec![GraphEdge {
                id: "e1".to_string(),
                source: "2".to_string(),
                target: "1".to_string(),
            }]
        );
    }

    #[test]
    fn test_write_edge_points_program_to_file() {
        let mut b = builder();
        b.add_record(0, &trace_line("fopen", "gcc", "/tmp/a.o", "w"))
            .unwrap();
        let graph = b.finish();

        assert_eq!(graph.edges[0].source, node_id(&graph, "log-0##gcc"));
        assert_eq!(graph.edges[0].target, node_id(&graph, "/tmp/a.o"));
    }

    #[test]
    fn test_read_then_write_then_read_again() {
        let mut b = builder();
        b.add_record(0, &trace_line("open", "prog", "/a", "O_RDONLY"))
            .unwrap();
        b.add_record(0, &trace_line("open", "prog", "/a", "O_RDWR"))
            .unwrap();
        b.add_record(0, &trace_line("open", "prog", "/a", "O_RDONLY"))
            .unwrap();
        let graph = b.finish();

        assert_eq!(graph.nodes.len(), 2);
        assert_eq!(graph.edges.len(), 2);
        assert_eq!(graph.edges[0].id, "e1");
        assert_eq!(graph.edges[1].id, "e2");
    }

    #[test]
    fn test_only_first_read_per_file_survives() {
        // Lossy by design of the model: the second reader gets no edge
        let mut b = builder();
        b.add_record(0, &trace_line("open", "first", "/shared", "O_RDONLY"))
            .unwrap();
        b.add_record(0, &trace_line("open", "second", "/shared", "O_RDONLY"))
            .unwrap();
        let graph = b.finish();

        assert_eq!(labels(&graph, NodeType::Program).len(), 2);
        assert_eq!(graph.edges.len(), 1);
        assert_eq!(graph.edges[0].target, node_id(&graph, "log-0##first"));
    }

    #[test]
    fn test_unknown_mode_creates_nodes_without_edges() {
        let mut b = builder();
        b.add_record(0, &trace_line("open", "prog", "/w", "O_WRONLY"))
            .unwrap();
        let graph = b.finish();

        assert_eq!(graph.nodes.len(), 2);
        assert!(graph.edges.is_empty());
    }

    #[test]
    fn test_non_open_and_blank_records_ignored() {
        let mut b = builder();
        b.add_record(0, &trace_line("stat", "prog", "/x", "O_RDONLY"))
            .unwrap();
        b.add_record(0, "\n").unwrap();
        assert!(b.finish().is_empty());
    }

    #[test]
    fn test_file_identity_is_global_program_identity_is_per_log() {
        let mut b = builder();
        b.add_record(0, &trace_line("open", "prog", "/data/x", "O_RDWR"))
            .unwrap();
        b.add_record(1, &trace_line("openat", "prog", "/data/x", "O_RDONLY"))
            .unwrap();
        let graph = b.finish();

        assert_eq!(labels(&graph, NodeType::File), vec!["/data/x"]);
        assert_eq!(
            labels(&graph, NodeType::Program),
            vec!["log-0##prog", "log-1##prog"]
        );
        // write from log 0, read into log 1 through the shared file node
        assert_eq!(graph.edges.len(), 2);
        assert_eq!(graph.edges[1].source, node_id(&graph, "/data/x"));
        assert_eq!(graph.edges[1].target, node_id(&graph, "log-1##prog"));
    }

    #[test]
    fn test_malformed_record_reports_line() {
        let mut b = builder();
        let log = format!(
            "{}\nshort line\n",
            trace_line("open", "prog", "/a", "O_RDONLY")
        );
        let err = b
            .add_reader(0, Path::new("run.log"), log.as_bytes())
            .unwrap_err();
        assert!(matches!(err, GraphError::MalformedRecord { line: 2, .. }));
    }

    #[test]
    fn test_build_graph_empty_project() {
        let graph = build_graph(&[], TraceSchema::default()).unwrap();
        assert_eq!(graph, Graph::default());
    }

    #[test]
    fn test_build_graph_missing_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let err = build_graph(&[dir.path().join("gone.log")], TraceSchema::default()).unwrap_err();
        assert!(matches!(err, GraphError::Io { .. }));
    }

    #[test]
    fn test_build_graph_uses_log_position() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a.log");
        let b = dir.path().join("b.log");
        std::fs::write(&a, trace_line("open", "make", "/src/main.c", "O_RDONLY")).unwrap();
        std::fs::write(&b, trace_line("open", "make", "/src/main.c", "O_RDONLY")).unwrap();

        let graph = build_graph(&[b, a], TraceSchema::default()).unwrap();
        assert_eq!(
            labels(&graph, NodeType::Program),
            vec!["log-0##make", "log-1##make"]
        );
        assert_eq!(labels(&graph, NodeType::File), vec!["/src/main.c"]);
        assert_eq!(graph.edges.len(), 1);
    }

    #[test]
    fn test_independent_builders_restart_ids() {
        let line = trace_line("open", "p", "/f", "O_RDONLY");
        let mut first = builder();
        let mut second = builder();
        first.add_record(0, &line).unwrap();
        second.add_record(0, &line).unwrap();
        assert_eq!(first.finish(), second.finish());
    }
}
