use crate::algorithm::dijkstra::build_result;
use crate::algorithm::{Distance, ShortestPathAlgorithm, ShortestPathResult};
use crate::data_structures::BucketQueue;
use crate::graph::{Graph, IndexedGraph};
use crate::Result;

/// One observable action of the engine. Node ids index into [`DialEngine::graph`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    /// Start node placed in bucket 0
    Init { start: usize },
    /// Node taken from a bucket with a current (non-stale) distance
    Process { node: usize, bucket: usize },
    /// Outgoing edge about to be relaxed
    Examine { node: usize, neighbor: usize, weight: u64 },
    /// Neighbor's distance improved from `old` to `new`
    Relax {
        node: usize,
        neighbor: usize,
        old: Distance,
        new: u64,
    },
    /// All buckets exhausted
    Done,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Init,
    Scanning,
    Relaxing { node: usize, edge: usize, examined: bool },
    Done,
    Finished,
}

/// Step-wise Dial's algorithm over a private copy of the graph.
///
/// Each call to [`DialEngine::advance`] runs until the next observable action
/// and reports it as an [`Event`]. Buckets are kept exact: when a node's
/// distance improves, its old entry is removed before the new one is queued.
/// Stale pops are still checked for and skipped without an event.
#[derive(Debug, Clone)]
pub struct DialEngine {
    graph: IndexedGraph,
    start: usize,
    distances: Vec<Distance>,
    predecessors: Vec<Option<usize>>,
    buckets: BucketQueue<usize>,
    phase: Phase,
}

impl DialEngine {
    /// Prepares a run from `start`.
    ///
    /// Node order, adjacency and bucket capacity are fixed here; later changes
    /// to `graph` do not affect this run.
    pub fn new<G: Graph>(graph: &G, start: &str) -> Result<Self> {
        let graph = IndexedGraph::from_graph(graph);
        let start = graph.index_of(start)?;
        let buckets = BucketQueue::for_graph(graph.node_count(), graph.max_weight())?;
        let n = graph.node_count();

        log::debug!(
            "Dial run from '{}': {} nodes, max weight {}, {} buckets",
            graph.name(start),
            n,
            graph.max_weight(),
            buckets.capacity()
        );

        Ok(DialEngine {
            graph,
            start,
            distances: vec![Distance::Infinite; n],
            predecessors: vec![None; n],
            buckets,
            phase: Phase::Init,
        })
    }

    pub fn graph(&self) -> &IndexedGraph {
        &self.graph
    }

    pub fn start(&self) -> usize {
        self.start
    }

    pub fn distances(&self) -> &[Distance] {
        &self.distances
    }

    pub fn predecessors(&self) -> &[Option<usize>] {
        &self.predecessors
    }

    pub fn buckets(&self) -> &BucketQueue<usize> {
        &self.buckets
    }

    pub fn is_finished(&self) -> bool {
        self.phase == Phase::Finished
    }

    /// Runs to the next observable action.
    ///
    /// Returns `Ok(None)` after the `Done` event has been reported. An error
    /// ends the run: every later call returns `Ok(None)`.
    pub fn advance(&mut self) -> Result<Option<Event>> {
        let result = self.step();
        if result.is_err() {
            self.phase = Phase::Finished;
        }
        result
    }

    /// Runs every remaining step and returns the final distances
    pub fn run_to_completion(mut self) -> Result<ShortestPathResult> {
        while self.advance()?.is_some() {}
        Ok(self.result())
    }

    /// Current distances and predecessors keyed by node name
    pub fn result(&self) -> ShortestPathResult {
        build_result(
            &self.graph,
            self.graph.name(self.start),
            &self.distances,
            &self.predecessors,
        )
    }

    fn step(&mut self) -> Result<Option<Event>> {
        loop {
            match self.phase {
                Phase::Init => {
                    self.distances[self.start] = Distance::Finite(0);
                    self.buckets.insert(self.start, 0)?;
                    self.phase = Phase::Scanning;
                    return Ok(Some(Event::Init { start: self.start }));
                }
                Phase::Scanning => match self.buckets.pop_next_ready() {
                    None => self.phase = Phase::Done,
                    Some((node, bucket)) => {
                        if self.distances[node] < Distance::Finite(bucket as u64) {
                            log::trace!(
                                "Discarding stale entry '{}' in bucket {}",
                                self.graph.name(node),
                                bucket
                            );
                            continue;
                        }
                        self.phase = Phase::Relaxing {
                            node,
                            edge: 0,
                            examined: false,
                        };
                        return Ok(Some(Event::Process { node, bucket }));
                    }
                },
                Phase::Relaxing { node, edge, examined } => {
                    let Some(&(neighbor, weight)) = self.graph.neighbors(node).get(edge) else {
                        self.phase = Phase::Scanning;
                        continue;
                    };

                    if !examined {
                        self.phase = Phase::Relaxing {
                            node,
                            edge,
                            examined: true,
                        };
                        return Ok(Some(Event::Examine {
                            node,
                            neighbor,
                            weight,
                        }));
                    }

                    self.phase = Phase::Relaxing {
                        node,
                        edge: edge + 1,
                        examined: false,
                    };
                    if let Some(event) = self.relax(node, neighbor, weight)? {
                        return Ok(Some(event));
                    }
                }
                Phase::Done => {
                    self.phase = Phase::Finished;
                    log::debug!(
                        "Dial run from '{}' finished, {} nodes reached",
                        self.graph.name(self.start),
                        self.distances.iter().filter(|d| d.is_finite()).count()
                    );
                    return Ok(Some(Event::Done));
                }
                Phase::Finished => return Ok(None),
            }
        }
    }

    fn relax(&mut self, node: usize, neighbor: usize, weight: u64) -> Result<Option<Event>> {
        let Distance::Finite(base) = self.distances[node] else {
            return Ok(None);
        };

        let candidate = base.saturating_add(weight);
        let old = self.distances[neighbor];
        if Distance::Finite(candidate) >= old {
            return Ok(None);
        }

        if let Distance::Finite(previous) = old {
            self.buckets.remove(&neighbor, previous);
        }
        self.buckets.insert(neighbor, candidate)?;
        self.distances[neighbor] = Distance::Finite(candidate);
        self.predecessors[neighbor] = Some(node);

        Ok(Some(Event::Relax {
            node,
            neighbor,
            old,
            new: candidate,
        }))
    }
}

/// Dial's algorithm behind the common [`ShortestPathAlgorithm`] interface
#[derive(Debug, Default)]
pub struct Dial;

impl Dial {
    /// Creates a new Dial algorithm instance
    pub fn new() -> Self {
        Dial
    }
}

impl<G> ShortestPathAlgorithm<G> for Dial
where
    G: Graph,
{
    fn name(&self) -> &'static str {
        "Dial"
    }

    fn compute_shortest_paths(&self, graph: &G, source: &str) -> Result<ShortestPathResult> {
        DialEngine::new(graph, source)?.run_to_completion()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::DirectedGraph;
    use crate::Error;

    fn collect_events(engine: &mut DialEngine) -> Vec<Event> {
        let mut events = Vec::new();
        while let Some(event) = engine.advance().unwrap() {
            events.push(event);
        }
        events
    }

    #[test]
    fn test_event_sequence_for_two_edges() {
        // A=0, B=1, C=2
        let graph = DirectedGraph::with_edges([("A", "B", 3), ("A", "C", 1), ("C", "B", 1)]).unwrap();
        let mut engine = DialEngine::new(&graph, "A").unwrap();

        let events = collect_events(&mut engine);
        assert_eq!(
            events,
            vec![
                Event::Init { start: 0 },
                Event::Process { node: 0, bucket: 0 },
                Event::Examine { node: 0, neighbor: 1, weight: 3 },
                Event::Relax { node: 0, neighbor: 1, old: Distance::Infinite, new: 3 },
                Event::Examine { node: 0, neighbor: 2, weight: 1 },
                Event::Relax { node: 0, neighbor: 2, old: Distance::Infinite, new: 1 },
                Event::Process { node: 2, bucket: 1 },
                Event::Examine { node: 2, neighbor: 1, weight: 1 },
                Event::Relax { node: 2, neighbor: 1, old: Distance::Finite(3), new: 2 },
                Event::Process { node: 1, bucket: 2 },
                Event::Done,
            ]
        );
        assert!(engine.is_finished());
        assert!(engine.buckets().is_empty());
        assert_eq!(engine.advance().unwrap(), None);
    }

    #[test]
    fn test_improved_node_leaves_old_bucket() {
        let graph = DirectedGraph::with_edges([("A", "B", 3), ("A", "C", 1), ("C", "B", 1)]).unwrap();
        let mut engine = DialEngine::new(&graph, "A").unwrap();

        // Run up to and including the B: 3 -> 2 relaxation
        for _ in 0..9 {
            engine.advance().unwrap();
        }
        assert!(engine.buckets().bucket(3).unwrap().is_empty());
        assert_eq!(engine.buckets().bucket(2).unwrap().iter().copied().collect::<Vec<_>>(), vec![1]);
    }

    #[test]
    fn test_dial_solver_and_predecessors() {
        let graph = DirectedGraph::with_edges([
            ("A", "B", 2),
            ("A", "C", 4),
            ("B", "C", 1),
            ("B", "D", 7),
            ("C", "D", 3),
        ])
        .unwrap();

        let result = Dial::new().compute_shortest_paths(&graph, "A").unwrap();
        assert_eq!(result.distance("C"), Distance::Finite(3));
        assert_eq!(result.distance("D"), Distance::Finite(6));
        assert_eq!(result.path_to("D").unwrap(), vec!["A", "B", "C", "D"]);
        assert_eq!(result.path_to("A").unwrap(), vec!["A"]);
    }

    #[test]
    fn test_self_loop_and_zero_weight_graph() {
        let graph = DirectedGraph::with_edges([("A", "A", 0), ("A", "B", 0)]).unwrap();
        let result = Dial::new().compute_shortest_paths(&graph, "A").unwrap();

        assert_eq!(result.distance("A"), Distance::Finite(0));
        assert_eq!(result.distance("B"), Distance::Finite(0));
    }

    #[test]
    fn test_unknown_start() {
        let graph = DirectedGraph::with_edges([("A", "B", 1)]).unwrap();
        let err = DialEngine::new(&graph, "nope").unwrap_err();
        assert_eq!(err, Error::NodeNotFound("nope".to_string()));
    }
}
