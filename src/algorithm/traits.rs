use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fmt;

use crate::graph::Graph;
use crate::Result;

/// Tentative or final distance of a node from the source.
///
/// `Finite` values always order before `Infinite`. Serialised as a JSON number,
/// or `null` for unreachable nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Distance {
    Finite(u64),
    Infinite,
}

impl Distance {
    pub fn is_finite(&self) -> bool {
        matches!(self, Distance::Finite(_))
    }

    /// Returns the finite value, if any
    pub fn value(&self) -> Option<u64> {
        match self {
            Distance::Finite(d) => Some(*d),
            Distance::Infinite => None,
        }
    }
}

impl Default for Distance {
    fn default() -> Self {
        Distance::Infinite
    }
}

impl From<u64> for Distance {
    fn from(value: u64) -> Self {
        Distance::Finite(value)
    }
}

impl fmt::Display for Distance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Distance::Finite(d) => write!(f, "{}", d),
            Distance::Infinite => write!(f, "∞"),
        }
    }
}

/// Result of a shortest path algorithm execution
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShortestPathResult {
    /// Distances from source to each node
    pub distances: BTreeMap<String, Distance>,

    /// Predecessor of each node in the shortest path tree
    pub predecessors: BTreeMap<String, Option<String>>,

    /// Source node
    pub source: String,
}

impl ShortestPathResult {
    /// Distance of `node`, `Infinite` for unknown nodes
    pub fn distance(&self, node: &str) -> Distance {
        self.distances.get(node).copied().unwrap_or_default()
    }

    /// Get the shortest path from source to target as a sequence of nodes
    pub fn path_to(&self, target: &str) -> Option<Vec<String>> {
        if !self.distance(target).is_finite() {
            return None;
        }

        let mut path = Vec::new();
        let mut current = target.to_string();
        let mut visited = HashSet::new();

        // Build path in reverse order
        while current != self.source {
            if !visited.insert(current.clone()) {
                log::warn!("Cycle detected in path reconstruction at node {}", current);
                return None;
            }

            let predecessor = self.predecessors.get(&current).cloned().flatten()?;
            path.push(current);
            current = predecessor;
        }

        path.push(self.source.clone());
        path.reverse();

        Some(path)
    }
}

/// Trait for shortest path algorithms
pub trait ShortestPathAlgorithm<G>
where
    G: Graph,
{
    /// Compute shortest paths from a source node to all other nodes
    fn compute_shortest_paths(&self, graph: &G, source: &str) -> Result<ShortestPathResult>;

    /// Get the name of the algorithm
    fn name(&self) -> &'static str;
}
