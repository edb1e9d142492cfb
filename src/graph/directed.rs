use crate::graph::traits::{Graph, MutableGraph};
use crate::{Error, Result};
use std::collections::{BTreeSet, HashMap};

/// A directed multigraph implementation using adjacency lists keyed by node name
#[derive(Debug, Clone, Default)]
pub struct DirectedGraph {
    /// All known nodes, kept sorted so iteration order is reproducible
    nodes: BTreeSet<String>,

    /// Outgoing edges for each node: node -> [(target, weight)] in insertion order
    outgoing_edges: HashMap<String, Vec<(String, u64)>>,

    /// Largest weight added so far
    max_weight: u64,

    /// Total number of edges, parallel edges counted separately
    edge_count: usize,
}

impl DirectedGraph {
    /// Creates a new empty directed graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a graph from a list of `(from, to, weight)` triples
    pub fn with_edges<'a, I>(edges: I) -> Result<Self>
    where
        I: IntoIterator<Item = (&'a str, &'a str, i64)>,
    {
        let mut graph = DirectedGraph::new();
        for (from, to, weight) in edges {
            graph.add_edge(from, to, weight)?;
        }
        Ok(graph)
    }

    /// Returns every edge as `(from, to, weight)`, sources in node order
    pub fn edges(&self) -> Vec<(String, String, u64)> {
        self.nodes
            .iter()
            .flat_map(|from| {
                self.outgoing_edges(from)
                    .map(move |(to, weight)| (from.clone(), to.to_string(), weight))
            })
            .collect()
    }
}

impl Graph for DirectedGraph {
    fn node_count(&self) -> usize {
        self.nodes.len()
    }

    fn edge_count(&self) -> usize {
        self.edge_count
    }

    fn nodes(&self) -> Vec<String> {
        self.nodes.iter().cloned().collect()
    }

    fn outgoing_edges(&self, node: &str) -> Box<dyn Iterator<Item = (&str, u64)> + '_> {
        if let Some(edges) = self.outgoing_edges.get(node) {
            Box::new(edges.iter().map(|(target, weight)| (target.as_str(), *weight)))
        } else {
            Box::new(std::iter::empty())
        }
    }

    fn contains_node(&self, node: &str) -> bool {
        self.nodes.contains(node)
    }

    fn max_weight(&self) -> u64 {
        self.max_weight
    }
}

impl MutableGraph for DirectedGraph {
    fn add_node(&mut self, name: &str) {
        if name.is_empty() {
            return;
        }
        if !self.nodes.contains(name) {
            self.nodes.insert(name.to_string());
        }
    }

    fn add_edge(&mut self, from: &str, to: &str, weight: i64) -> Result<()> {
        if weight < 0 {
            return Err(Error::InvalidWeight(weight));
        }
        if from.is_empty() || to.is_empty() {
            return Ok(());
        }

        self.add_node(from);
        self.add_node(to);

        let weight = weight as u64;
        self.outgoing_edges
            .entry(from.to_string())
            .or_default()
            .push((to.to_string(), weight));
        self.edge_count += 1;

        if weight > self.max_weight {
            self.max_weight = weight;
        }

        Ok(())
    }
}
