// Copyright (c) 2025 EM Placement Authors
//
// Licensed under dual license:
// - MIT License (LICENSE-MIT or https://opensource.org/licenses/MIT)
// - Apache License, Version 2.0 (LICENSE-APACHE or https://www.apache.org/licenses/LICENSE-2.0)

//! Construction-time configuration for the placement graph.

use serde::{Deserialize, Serialize};

use crate::data_structures::placement_graph::error::{PlacementError, Result};

/// Upper bound on the move budget. Longer eviction chains are never useful for
/// hardware insertion latency and would make the BFS arena unreasonably large.
pub const MAX_MOVES_LIMIT: u32 = 64;

/// Configuration for a placement graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlacementGraphConfig {
    /// Number of slots in the table.
    pub num_slots: usize,

    /// Number of consecutive slots sharing one physical memory word.
    /// BFS expansion always covers a whole row.
    pub entries_per_row: usize,

    /// Maximum number of relocations a single insertion may trigger.
    pub max_moves: u32,

    /// Capacity of the primary BFS frontier queue and of the cache queue.
    pub queue_capacity: usize,
}

impl PlacementGraphConfig {
    /// Creates a new configuration with default values.
    ///
    /// # Returns
    ///
    /// A new `PlacementGraphConfig` instance with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the number of slots in the table.
    pub fn with_num_slots(mut self, num_slots: usize) -> Self {
        self.num_slots = num_slots;
        self
    }

    /// Sets the number of entries packed into one row.
    pub fn with_entries_per_row(mut self, entries_per_row: usize) -> Self {
        self.entries_per_row = entries_per_row;
        self
    }

    /// Sets the maximum number of moves per insertion.
    pub fn with_max_moves(mut self, max_moves: u32) -> Self {
        self.max_moves = max_moves;
        self
    }

    /// Sets the capacity of the BFS queues.
    ///
    /// # Arguments
    ///
    /// * `queue_capacity` - Capacity of both the frontier and cache queues.
    ///
    /// # Returns
    ///
    /// Self with the updated configuration.
    pub fn with_queue_capacity(mut self, queue_capacity: usize) -> Self {
        self.queue_capacity = queue_capacity;
        self
    }

    /// Number of rows in the table, counting a trailing partial row.
    pub fn num_rows(&self) -> usize {
        self.num_slots.div_ceil(self.entries_per_row.max(1))
    }

    /// Checks that the configuration can back a placement graph.
    ///
    /// # Returns
    ///
    /// * `Ok(())` if the configuration is usable
    /// * `Err(PlacementError::InvalidArgument)` naming the offending field otherwise
    pub fn validate(&self) -> Result<()> {
        if self.num_slots == 0 {
            return Err(PlacementError::InvalidArgument(
                "num_slots must be greater than 0".to_string(),
            ));
        }

        if self.entries_per_row == 0 || self.entries_per_row > self.num_slots {
            return Err(PlacementError::InvalidArgument(format!(
                "entries_per_row must be between 1 and num_slots ({}), got {}",
                self.num_slots, self.entries_per_row
            )));
        }

        if self.queue_capacity == 0 {
            return Err(PlacementError::InvalidArgument(
                "queue_capacity must be greater than 0".to_string(),
            ));
        }

        if self.max_moves > MAX_MOVES_LIMIT {
            return Err(PlacementError::InvalidArgument(format!(
                "max_moves must not exceed {MAX_MOVES_LIMIT}, got {}",
                self.max_moves
            )));
        }

        Ok(())
    }
}

impl Default for PlacementGraphConfig {
    fn default() -> Self {
        Self {
            num_slots: 4_096,
            entries_per_row: 4,
            max_moves: 5,
            queue_capacity: 512,
        }
    }
}
