//! Replayable step snapshots of a Dial's algorithm run.
//!
//! [`compute_trace`] materialises the whole sequence, which is what a step-by-step
//! viewer needs for back/forward navigation. [`DialTrace`] yields the same
//! snapshots lazily; dropping it part-way simply abandons the run.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::iter::FusedIterator;

use crate::algorithm::dial::{DialEngine, Event};
use crate::algorithm::Distance;
use crate::graph::Graph;
use crate::Result;

/// Kind of action a snapshot records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepKind {
    Init,
    Process,
    Examine,
    Relax,
    Done,
}

/// Immutable record of the algorithm state after one observable action
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepSnapshot {
    /// Position in the trace, starting at 0
    pub step: usize,
    pub kind: StepKind,
    /// Human-readable explanation of the action
    pub description: String,
    /// Full distance table
    pub distances: BTreeMap<String, Distance>,
    /// Full bucket array, `buckets[d]` holding the nodes queued at distance `d`
    pub buckets: Vec<Vec<String>>,
    /// Node being processed
    pub current_node: Option<String>,
    /// Neighbor being examined or relaxed
    pub neighbor: Option<String>,
    #[serde(rename = "final")]
    pub is_final: bool,
    /// All nodes, set on the terminal snapshot only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visited_nodes: Option<Vec<String>>,
}

impl StepSnapshot {
    /// Distance of `node` at this step, `Infinite` for unknown nodes
    pub fn distance(&self, node: &str) -> Distance {
        self.distances.get(node).copied().unwrap_or_default()
    }

    /// Bucket indexes holding `node`, in ascending order
    pub fn buckets_of(&self, node: &str) -> Vec<usize> {
        self.buckets
            .iter()
            .enumerate()
            .flat_map(|(i, bucket)| bucket.iter().filter(|n| *n == node).map(move |_| i))
            .collect()
    }
}

/// Lazy, forward-only stream of [`StepSnapshot`]s.
///
/// Yields `Err` at most once, if a bucket index falls outside the queue
/// capacity; the stream ends after that.
#[derive(Debug, Clone)]
pub struct DialTrace {
    engine: DialEngine,
    emitted: usize,
}

impl DialTrace {
    /// Starts a trace from `start`, failing with `NodeNotFound` if it is not in `graph`
    pub fn new<G: Graph>(graph: &G, start: &str) -> Result<Self> {
        Ok(DialTrace {
            engine: DialEngine::new(graph, start)?,
            emitted: 0,
        })
    }

    /// The underlying engine, e.g. to read final predecessors
    pub fn engine(&self) -> &DialEngine {
        &self.engine
    }

    fn snapshot(&self, event: Event) -> StepSnapshot {
        let graph = self.engine.graph();
        let name = |i: usize| graph.name(i).to_string();
        let distances = self.engine.distances();

        let (kind, description, current_node, neighbor) = match event {
            Event::Init { start } => (
                StepKind::Init,
                format!(
                    "Initialize: distance of '{}' set to 0, all others ∞. '{}' inserted into bucket 0.",
                    name(start),
                    name(start)
                ),
                Some(start),
                None,
            ),
            Event::Process { node, bucket } => (
                StepKind::Process,
                format!(
                    "Take node '{}' from bucket {}. Current distance: {}.",
                    name(node),
                    bucket,
                    distances[node]
                ),
                Some(node),
                None,
            ),
            Event::Examine {
                node,
                neighbor,
                weight,
            } => (
                StepKind::Examine,
                format!(
                    "Examine neighbor '{}' of '{}' with weight {}.",
                    name(neighbor),
                    name(node),
                    weight
                ),
                Some(node),
                Some(neighbor),
            ),
            Event::Relax {
                node,
                neighbor,
                old,
                new,
            } => {
                let movement = match old {
                    Distance::Finite(previous) => {
                        format!("'{}' moved from bucket {} to bucket {}.", name(neighbor), previous, new)
                    }
                    Distance::Infinite => format!("'{}' inserted into bucket {}.", name(neighbor), new),
                };
                (
                    StepKind::Relax,
                    format!(
                        "Relax edge ({} -> {}): distance of '{}' updated from {} to {}. {}",
                        name(node),
                        name(neighbor),
                        name(neighbor),
                        old,
                        new,
                        movement
                    ),
                    Some(node),
                    Some(neighbor),
                )
            }
            Event::Done => (
                StepKind::Done,
                format!(
                    "Algorithm finished. Shortest distances from '{}' have been found.",
                    name(self.engine.start())
                ),
                None,
                None,
            ),
        };

        let is_final = kind == StepKind::Done;
        StepSnapshot {
            step: self.emitted,
            kind,
            description,
            distances: graph
                .names()
                .iter()
                .cloned()
                .zip(distances.iter().copied())
                .collect(),
            buckets: self.engine.buckets().snapshot_with(|&i| name(i)),
            current_node: current_node.map(name),
            neighbor: neighbor.map(name),
            is_final,
            visited_nodes: is_final.then(|| graph.names().to_vec()),
        }
    }
}

impl Iterator for DialTrace {
    type Item = Result<StepSnapshot>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.engine.advance() {
            Ok(Some(event)) => {
                let snapshot = self.snapshot(event);
                self.emitted += 1;
                Some(Ok(snapshot))
            }
            Ok(None) => None,
            Err(e) => Some(Err(e)),
        }
    }
}

impl FusedIterator for DialTrace {}

/// Computes the complete snapshot sequence of a run from `start`
pub fn compute_trace<G: Graph>(graph: &G, start: &str) -> Result<Vec<StepSnapshot>> {
    DialTrace::new(graph, start)?.collect()
}
