// Copyright (c) 2025 EM Placement Authors
//
// Licensed under dual license:
// - MIT License (LICENSE-MIT or https://opensource.org/licenses/MIT)
// - Apache License, Version 2.0 (LICENSE-APACHE or https://www.apache.org/licenses/LICENSE-2.0)

//! Placement graph for multi-way exact-match tables.
//!
//! Each key stored in a hardware exact-match table may live in one of a few
//! candidate slots. When all candidates of a new key are taken, some stored
//! entries have to be relocated to one of their own alternates first. This
//! module keeps a software mirror of which slots are taken and where each
//! stored entry could move, and searches it for the shortest such eviction
//! chain.
//!
//! # Features
//!
//! - Bounded breadth-first search with a hard cap on the number of moves
//! - Fixed-capacity frontier queues that degrade gracefully when full
//! - Row-aware expansion for tables that pack several entries per memory word
//! - Write-once undo log so a plan can be applied, mirrored to hardware, and
//!   rolled back if the hardware update fails
//!
//! # Example
//!
//! ```
//! use em_placement_lib::data_structures::placement_graph::{
//!     MoveRecord, PlacementGraph, PlacementGraphConfig,
//! };
//!
//! let config = PlacementGraphConfig::new()
//!     .with_num_slots(8)
//!     .with_entries_per_row(1)
//!     .with_max_moves(2);
//! let mut graph = PlacementGraph::new(config).unwrap();
//!
//! // Slot 0 holds an entry that may also live in slot 1,
//! // slot 1 holds an entry that may also live in slot 7.
//! graph.insert(0, &[0, 1]).unwrap();
//! graph.insert(1, &[1, 7]).unwrap();
//!
//! // A new key that can only go into slot 0
//! let plan = graph.find_path(&[0]).unwrap();
//! assert_eq!(
//!     plan.execution_order().copied().collect::<Vec<_>>(),
//!     vec![
//!         MoveRecord::relocate(1, 7),
//!         MoveRecord::relocate(0, 1),
//!         MoveRecord::insert(0),
//!     ]
//! );
//! ```
//!
//! # Applying a plan transactionally
//!
//! ```
//! use em_placement_lib::data_structures::placement_graph::{PlacementGraph, PlacementGraphConfig};
//!
//! let mut graph = PlacementGraph::new(PlacementGraphConfig::new()).unwrap();
//! graph.insert(0, &[0, 1]).unwrap();
//!
//! let plan = graph.find_path(&[0, 5]).unwrap();
//! graph.begin_transaction().unwrap();
//! graph.execute_moves(&plan, &[0, 5], true).unwrap();
//!
//! // The hardware update failed: put everything back
//! graph.abort().unwrap();
//! assert!(!graph.is_occupied(5));
//! ```

mod config;
mod error;
mod graph;
mod moves;
mod path;
mod queue;
mod slot;
mod transaction;

#[cfg(test)]
mod tests;

// Re-exports
pub use config::{PlacementGraphConfig, MAX_MOVES_LIMIT};
pub use error::{PlacementError, Result};
pub use graph::PlacementGraph;
pub use moves::{execute_moves, MoveList, MoveRecord};
pub use path::{find_path, PathFinder, SearchStats};
pub use queue::{BfsNode, BoundedQueue, VisitedSet};
pub use slot::{SlotIndex, SlotState};
pub use transaction::{TransactionManager, TransactionState};
