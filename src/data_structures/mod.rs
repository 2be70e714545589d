//! Data structures of the placement engine.
//!
//! - [`placement_graph`]: slot graph, bounded breadth-first path search,
//!   move lists and transactional backup of one exact-match table.
//! - [`table_registry`]: owner of the per-table graphs.

pub mod placement_graph;
pub mod table_registry;

// Re-export common data structures
pub use placement_graph::{MoveList, PlacementError, PlacementGraph, PlacementGraphConfig};
pub use table_registry::{GraphHandle, TableId, TableRegistry};
