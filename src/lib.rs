//! Dial Trace - instrumented Dial's algorithm for single-source shortest paths
//!
//! This library computes shortest paths on directed graphs with non-negative integer
//! edge weights using a bucket queue indexed by tentative distance ("Dial's algorithm").
//!
//! Besides the final distances, every run produces a deterministic sequence of
//! immutable [`StepSnapshot`]s (node dequeue, edge examination, edge relaxation and
//! completion) that a front end can replay step by step.

pub mod algorithm;
pub mod data_structures;
pub mod graph;
pub mod web;

pub use algorithm::{
    dial::Dial,
    dijkstra::Dijkstra,
    trace::{compute_trace, DialTrace, StepKind, StepSnapshot},
    Distance, ShortestPathAlgorithm, ShortestPathResult,
};
/// Re-export main types for convenient use
pub use graph::directed::DirectedGraph;

/// Error types for the library
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("Negative edge weight: {0}")]
    InvalidWeight(i64),

    #[error("Node not found in graph: {0}")]
    NodeNotFound(String),

    #[error("Bucket index {index} outside of queue capacity {capacity}")]
    InvariantViolation { index: u64, capacity: usize },

    #[error("Bucket capacity overflows for {nodes} nodes with max weight {max_weight}")]
    CapacityOverflow { nodes: usize, max_weight: u64 },
}

/// Result type for the library
pub type Result<T> = std::result::Result<T, Error>;
