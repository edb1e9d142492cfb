use crate::graph::{DirectedGraph, MutableGraph};
use crate::Result;
use rand::prelude::*;
use rand::rngs::StdRng;

/// Name used for the `i`-th generated node
pub fn node_name(i: usize) -> String {
    format!("v{}", i)
}

/// Generates a random directed graph with `n` nodes and `m` edges.
///
/// Weights are drawn uniformly from `0..=max_weight`. Every node is added even
/// when no edge touches it, so isolated nodes are possible. The same seed
/// always yields the same graph.
pub fn generate_random_graph(n: usize, m: usize, max_weight: u32, seed: u64) -> Result<DirectedGraph> {
    assert!(n > 0, "n must be positive");

    let mut graph = DirectedGraph::new();
    let mut rng = StdRng::seed_from_u64(seed);

    for i in 0..n {
        graph.add_node(&node_name(i));
    }

    for _ in 0..m {
        let u = rng.gen_range(0..n);
        let v = rng.gen_range(0..n);
        let weight = rng.gen_range(0..=max_weight);
        graph.add_edge(&node_name(u), &node_name(v), i64::from(weight))?;
    }

    Ok(graph)
}

/// Generates a `width` x `height` grid with 4-connectivity in both directions.
///
/// Each directed edge gets its own random weight from `0..=max_weight`.
pub fn generate_grid(width: usize, height: usize, max_weight: u32, seed: u64) -> Result<DirectedGraph> {
    let mut graph = DirectedGraph::new();
    let mut rng = StdRng::seed_from_u64(seed);

    let get_index = |x: usize, y: usize| -> usize { y * width + x };

    for y in 0..height {
        for x in 0..width {
            let current = node_name(get_index(x, y));
            graph.add_node(&current);

            let mut neighbors = Vec::with_capacity(4);
            if x > 0 {
                neighbors.push(get_index(x - 1, y));
            }
            if x + 1 < width {
                neighbors.push(get_index(x + 1, y));
            }
            if y > 0 {
                neighbors.push(get_index(x, y - 1));
            }
            if y + 1 < height {
                neighbors.push(get_index(x, y + 1));
            }

            for neighbor in neighbors {
                let weight = rng.gen_range(0..=max_weight);
                graph.add_edge(&current, &node_name(neighbor), i64::from(weight))?;
            }
        }
    }

    Ok(graph)
}
