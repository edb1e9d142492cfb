pub mod traits;
pub mod dijkstra;
pub mod dial;
pub mod trace;

pub use traits::{Distance, ShortestPathAlgorithm, ShortestPathResult};
