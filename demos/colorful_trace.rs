use colored::*;
use dial_trace::graph::DirectedGraph;
use dial_trace::{compute_trace, Distance, StepKind, StepSnapshot};

fn kind_label(kind: StepKind) -> ColoredString {
    match kind {
        StepKind::Init => "INIT   ".bright_blue().bold(),
        StepKind::Process => "PROCESS".bright_yellow().bold(),
        StepKind::Examine => "EXAMINE".white(),
        StepKind::Relax => "RELAX  ".bright_green().bold(),
        StepKind::Done => "DONE   ".bright_cyan().bold(),
    }
}

fn distance_row(snapshot: &StepSnapshot) -> String {
    snapshot
        .distances
        .iter()
        .map(|(node, distance)| {
            let value = match distance {
                Distance::Finite(d) => d.to_string().bright_white(),
                Distance::Infinite => "∞".dimmed(),
            };
            let is_active = snapshot.current_node.as_ref() == Some(node) || snapshot.neighbor.as_ref() == Some(node);
            let label = if is_active { node.bright_magenta().bold() } else { node.normal() };
            format!("{}={}", label, value)
        })
        .collect::<Vec<_>>()
        .join("  ")
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let graph = DirectedGraph::with_edges([
        ("A", "B", 2),
        ("A", "C", 4),
        ("B", "C", 1),
        ("B", "D", 7),
        ("C", "D", 3),
    ])?;

    println!("{}", "Dial's algorithm step by step".bright_cyan().bold());
    println!();

    for snapshot in compute_trace(&graph, "A")? {
        println!("{:>3} {} {}", snapshot.step, kind_label(snapshot.kind), snapshot.description);
        println!("    {}", distance_row(&snapshot));

        let queued: Vec<String> = snapshot
            .buckets
            .iter()
            .enumerate()
            .filter(|(_, bucket)| !bucket.is_empty())
            .map(|(i, bucket)| format!("[{}] {}", i, bucket.join(",")))
            .collect();
        if !queued.is_empty() {
            println!("    {} {}", "buckets:".dimmed(), queued.join("  "));
        }
    }

    Ok(())
}
