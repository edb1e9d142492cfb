pub mod traits;
pub mod directed;
pub mod generators;
pub mod indexed;

pub use traits::{Graph, MutableGraph};
pub use directed::DirectedGraph;
pub use indexed::IndexedGraph;
