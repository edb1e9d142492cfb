use dial_trace::algorithm::{dial::Dial, dijkstra::Dijkstra, ShortestPathAlgorithm};
use dial_trace::graph::generators::{generate_random_graph, node_name};
use dial_trace::graph::{DirectedGraph, Graph};
use std::time::{Duration, Instant};

// Function to benchmark an algorithm on a graph
fn benchmark_algorithm<A>(algorithm: &A, graph: &DirectedGraph, source: &str) -> dial_trace::Result<Duration>
where
    A: ShortestPathAlgorithm<DirectedGraph>,
{
    println!("Running {} on graph with {} nodes...", algorithm.name(), graph.node_count());

    let start = Instant::now();
    let result = algorithm.compute_shortest_paths(graph, source)?;
    let duration = start.elapsed();

    let reachable = result.distances.values().filter(|d| d.is_finite()).count();
    println!("  - Found {} reachable nodes in {:?}", reachable, duration);

    Ok(duration)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let graph_sizes = [1_000, 10_000, 50_000];
    // Dial's algorithm favours small weight ranges
    let max_weights = [1, 10, 100];
    let edge_factor = 4;

    println!("=====================================================");
    println!("Benchmark: Dial vs Dijkstra");
    println!("Edge factor: {} edges per node", edge_factor);
    println!("=====================================================");

    let dial = Dial::new();
    let dijkstra = Dijkstra::new();
    let mut results = Vec::new();

    for &size in &graph_sizes {
        for &max_weight in &max_weights {
            println!("\nGenerating random graph with {} nodes, weights 0..={}...", size, max_weight);
            let graph = generate_random_graph(size, size * edge_factor, max_weight, 7)?;
            let source = node_name(0);

            let dial_time = benchmark_algorithm(&dial, &graph, &source)?;
            let dijkstra_time = benchmark_algorithm(&dijkstra, &graph, &source)?;

            results.push((size, max_weight, dial_time, dijkstra_time));
        }
    }

    println!("\n=====================================================");
    println!("Summary of Results");
    println!("=====================================================");
    println!(
        "{:<10} | {:<10} | {:<12} | {:<15} | {:<10}",
        "Nodes", "MaxWeight", "Dial (ms)", "Dijkstra (ms)", "Speedup"
    );
    println!("-----------------------------------------------------");

    for (size, max_weight, dial_time, dijkstra_time) in &results {
        let speedup = dijkstra_time.as_secs_f64() / dial_time.as_secs_f64().max(f64::EPSILON);
        println!(
            "{:<10} | {:<10} | {:<12} | {:<15} | {:<10.2}",
            size,
            max_weight,
            dial_time.as_millis(),
            dijkstra_time.as_millis(),
            speedup
        );
    }

    Ok(())
}
