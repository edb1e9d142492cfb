use std::fmt::Debug;

use crate::Result;

/// Trait representing a directed graph with string-labelled nodes and integer weights
pub trait Graph: Debug {
    /// Returns the number of nodes in the graph
    fn node_count(&self) -> usize;

    /// Returns the number of edges in the graph, parallel edges included
    fn edge_count(&self) -> usize;

    /// Returns all nodes in lexicographic order
    fn nodes(&self) -> Vec<String>;

    /// Returns an iterator over the outgoing edges of a node, in insertion order
    fn outgoing_edges(&self, node: &str) -> Box<dyn Iterator<Item = (&str, u64)> + '_>;

    /// Returns true if the node exists in the graph
    fn contains_node(&self, node: &str) -> bool;

    /// Returns the largest edge weight seen so far, or 0 without edges
    fn max_weight(&self) -> u64;
}

/// Trait for append-only graph construction
pub trait MutableGraph: Graph {
    /// Adds a node. Duplicates and empty names are ignored.
    fn add_node(&mut self, name: &str);

    /// Adds a directed edge, inserting both endpoints if needed.
    ///
    /// Fails with [`crate::Error::InvalidWeight`] when `weight` is negative.
    fn add_edge(&mut self, from: &str, to: &str, weight: i64) -> Result<()>;
}
