// Copyright (c) 2025 EM Placement Authors
//
// Licensed under dual license:
// - MIT License (LICENSE-MIT or https://opensource.org/licenses/MIT)
// - Apache License, Version 2.0 (LICENSE-APACHE or https://www.apache.org/licenses/LICENSE-2.0)

//! Error types for the placement graph.

/// Error types for placement graph operations
#[derive(Debug, thiserror::Error, PartialEq, Eq, Clone)]
pub enum PlacementError {
    /// Out-of-range slot index, empty required input or wrong transaction state
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Storage for an alternates list or a backup record could not be reserved
    #[error("Out of memory: {0}")]
    OutOfMemory(String),

    /// No free slot is reachable within the move budget
    #[error("No free slot reachable within {max_moves} moves")]
    NoSpace {
        /// The move budget that was exhausted
        max_moves: u32,
    },

    /// Internal invariant violation
    #[error("Unexpected internal state: {0}")]
    Unexpected(String),
}

impl PlacementError {
    /// Returns `true` for outcomes a caller is expected to handle in normal
    /// operation, such as a full table, rather than treat as a defect.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, PlacementError::NoSpace { .. })
    }

    pub(crate) fn slot_out_of_range(slot: usize, num_slots: usize) -> Self {
        PlacementError::InvalidArgument(format!(
            "slot {slot} is out of range for a table of {num_slots} slots"
        ))
    }
}

/// Result type for placement graph operations
pub type Result<T> = std::result::Result<T, PlacementError>;
