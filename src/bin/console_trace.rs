//! Prints a textual Dial's algorithm trace for a fixed sample graph.
//!
//! Usage: `console_trace [source]`, where `source` is a node index (default 0).

use dial_trace::graph::{DirectedGraph, MutableGraph};
use dial_trace::{DialTrace, Distance, StepKind, StepSnapshot};
use std::env;
use std::error::Error;
use std::io::{self, Write};

/// Undirected sample network stored as `adjacency[u] = [(v, weight), ...]`
const ADJACENCY: [&[(usize, i64)]; 6] = [
    &[(1, 2), (2, 4)],
    &[(0, 2), (2, 1), (3, 7)],
    &[(0, 4), (1, 1), (3, 3), (4, 1)],
    &[(1, 7), (2, 3), (4, 2), (5, 5)],
    &[(2, 1), (3, 2), (5, 1)],
    &[(3, 5), (4, 1)],
];

fn build_graph() -> dial_trace::Result<DirectedGraph> {
    let mut graph = DirectedGraph::new();
    for (u, edges) in ADJACENCY.iter().enumerate() {
        graph.add_node(&u.to_string());
        for &(v, weight) in edges.iter() {
            graph.add_edge(&u.to_string(), &v.to_string(), weight)?;
        }
    }
    Ok(graph)
}

fn write_buckets<W: Write>(out: &mut W, snapshot: &StepSnapshot) -> io::Result<()> {
    writeln!(out, "\n== Current bucket state ==")?;
    for (i, bucket) in snapshot.buckets.iter().enumerate() {
        if !bucket.is_empty() {
            writeln!(out, "Bucket[{}]: {:?}", i, bucket)?;
        }
    }
    writeln!(out)
}

/// Writes the trace of a run from `source` in the console format
fn write_trace<W: Write>(out: &mut W, graph: &DirectedGraph, source: &str) -> Result<(), Box<dyn Error>> {
    let mut step = 1;
    let mut previous: Option<StepSnapshot> = None;
    let mut last: Option<StepSnapshot> = None;

    for snapshot in DialTrace::new(graph, source)? {
        let snapshot = snapshot?;
        match snapshot.kind {
            StepKind::Process => {
                let node = snapshot.current_node.as_deref().unwrap_or_default();
                // A processed node's distance is the index of the bucket it came from
                let distance = snapshot.distance(node);
                writeln!(out, "Step {}:", step)?;
                writeln!(
                    out,
                    "  - Processing node {} from bucket[{}] with current distance {}",
                    node, distance, distance
                )?;
                write_buckets(out, &snapshot)?;
                step += 1;
            }
            StepKind::Relax => {
                let neighbor = snapshot.neighbor.as_deref().unwrap_or_default();
                let old = previous
                    .as_ref()
                    .map(|p| p.distance(neighbor))
                    .unwrap_or(Distance::Infinite);
                if let Distance::Finite(old) = old {
                    writeln!(out, "    > Removing node {} from bucket[{}]", neighbor, old)?;
                }
                let new = snapshot.distance(neighbor);
                writeln!(
                    out,
                    "    > Adding node {} to bucket[{}], new distance = {}",
                    neighbor, new, new
                )?;
            }
            _ => {}
        }
        if snapshot.is_final {
            last = Some(snapshot.clone());
        }
        previous = Some(snapshot);
    }

    writeln!(out, "\n== Final minimum distances from source ==")?;
    if let Some(last) = last {
        let mut nodes: Vec<(usize, Distance)> = last
            .distances
            .iter()
            .filter_map(|(name, d)| name.parse().ok().map(|i| (i, *d)))
            .collect();
        nodes.sort();
        for (node, distance) in nodes {
            match distance {
                Distance::Finite(d) => writeln!(out, "Node {}: {}", node, d)?,
                Distance::Infinite => writeln!(out, "Node {}: INF", node)?,
            }
        }
    }

    Ok(())
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();

    let source = match env::args().nth(1) {
        Some(arg) => arg.parse::<usize>()?,
        None => 0,
    };

    let graph = build_graph()?;
    let stdout = io::stdout();
    write_trace(&mut stdout.lock(), &graph, &source.to_string())
}
