use std::collections::BTreeMap;

use crate::algorithm::{Distance, ShortestPathAlgorithm, ShortestPathResult};
use crate::data_structures::BinaryHeapWrapper;
use crate::graph::{Graph, IndexedGraph};
use crate::Result;

/// Classic Dijkstra's algorithm on a binary heap.
///
/// Serves as the independent reference for checking Dial's algorithm.
#[derive(Debug, Default)]
pub struct Dijkstra;

impl Dijkstra {
    /// Creates a new Dijkstra algorithm instance
    pub fn new() -> Self {
        Dijkstra
    }
}

impl<G> ShortestPathAlgorithm<G> for Dijkstra
where
    G: Graph,
{
    fn name(&self) -> &'static str {
        "Dijkstra"
    }

    fn compute_shortest_paths(&self, graph: &G, source: &str) -> Result<ShortestPathResult> {
        let graph = IndexedGraph::from_graph(graph);
        let source_idx = graph.index_of(source)?;
        let n = graph.node_count();

        let mut distances = vec![Distance::Infinite; n];
        let mut predecessors: Vec<Option<usize>> = vec![None; n];
        distances[source_idx] = Distance::Finite(0);

        let mut queue = BinaryHeapWrapper::new();
        queue.push(source_idx, 0u64);

        while let Some((u, dist_u)) = queue.pop() {
            // If we've already found a shorter path to u, skip
            if distances[u] < Distance::Finite(dist_u) {
                continue;
            }

            for &(v, weight) in graph.neighbors(u) {
                let new_dist = dist_u.saturating_add(weight);
                if Distance::Finite(new_dist) < distances[v] {
                    distances[v] = Distance::Finite(new_dist);
                    predecessors[v] = Some(u);
                    queue.push(v, new_dist);
                }
            }
        }

        Ok(build_result(&graph, source, &distances, &predecessors))
    }
}

/// Converts index-based tables into a name-keyed result
pub(crate) fn build_result(
    graph: &IndexedGraph,
    source: &str,
    distances: &[Distance],
    predecessors: &[Option<usize>],
) -> ShortestPathResult {
    let names = graph.names();
    ShortestPathResult {
        distances: names.iter().cloned().zip(distances.iter().copied()).collect::<BTreeMap<_, _>>(),
        predecessors: names
            .iter()
            .cloned()
            .zip(predecessors.iter().map(|p| p.map(|i| names[i].clone())))
            .collect(),
        source: source.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::DirectedGraph;
    use crate::Error;

    #[test]
    fn test_dijkstra_small_graph() {
        let graph = DirectedGraph::with_edges([
            ("A", "B", 2),
            ("A", "C", 4),
            ("B", "C", 1),
            ("B", "D", 7),
            ("C", "D", 3),
        ])
        .unwrap();

        let dijkstra = Dijkstra::new();
        let result = dijkstra.compute_shortest_paths(&graph, "A").unwrap();

        assert_eq!(result.distance("D"), Distance::Finite(6));
        assert_eq!(
            result.path_to("D").unwrap(),
            vec!["A", "B", "C", "D"]
        );
    }

    #[test]
    fn test_dijkstra_unknown_source() {
        let graph = DirectedGraph::with_edges([("A", "B", 1)]).unwrap();
        let err = Dijkstra::new().compute_shortest_paths(&graph, "Q").unwrap_err();
        assert_eq!(err, Error::NodeNotFound("Q".to_string()));
    }
}
