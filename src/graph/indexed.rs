use std::collections::HashMap;

use crate::graph::Graph;
use crate::{Error, Result};

/// Immutable, index-based copy of a graph taken at the start of a run.
///
/// Nodes are numbered in lexicographic order, and adjacency keeps insertion
/// order. Later changes to the source graph are not visible here.
#[derive(Debug, Clone)]
pub struct IndexedGraph {
    names: Vec<String>,
    index: HashMap<String, usize>,
    adjacency: Vec<Vec<(usize, u64)>>,
    max_weight: u64,
}

impl IndexedGraph {
    pub fn from_graph<G: Graph>(graph: &G) -> Self {
        let names = graph.nodes();
        let index: HashMap<String, usize> = names
            .iter()
            .enumerate()
            .map(|(i, name)| (name.clone(), i))
            .collect();

        // Edge targets are always graph nodes, the filter only guards foreign Graph impls
        let adjacency = names
            .iter()
            .map(|name| {
                graph
                    .outgoing_edges(name)
                    .filter_map(|(target, weight)| index.get(target).map(|&t| (t, weight)))
                    .collect()
            })
            .collect();

        IndexedGraph {
            names,
            index,
            adjacency,
            max_weight: graph.max_weight(),
        }
    }

    pub fn node_count(&self) -> usize {
        self.names.len()
    }

    pub fn max_weight(&self) -> u64 {
        self.max_weight
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn name(&self, node: usize) -> &str {
        &self.names[node]
    }

    /// Looks up a node's index, failing with [`Error::NodeNotFound`]
    pub fn index_of(&self, name: &str) -> Result<usize> {
        self.index
            .get(name)
            .copied()
            .ok_or_else(|| Error::NodeNotFound(name.to_string()))
    }

    pub fn neighbors(&self, node: usize) -> &[(usize, u64)] {
        &self.adjacency[node]
    }
}
