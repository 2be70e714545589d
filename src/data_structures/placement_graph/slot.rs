// Copyright (c) 2025 EM Placement Authors
//
// Licensed under dual license:
// - MIT License (LICENSE-MIT or https://opensource.org/licenses/MIT)
// - Apache License, Version 2.0 (LICENSE-APACHE or https://www.apache.org/licenses/LICENSE-2.0)

//! Per-slot state stored in the placement graph arena.

use crate::data_structures::placement_graph::error::{PlacementError, Result};

/// Index of a slot in the table.
pub type SlotIndex = usize;

/// State of one slot: whether it holds content, and where that content could
/// legally be relocated to.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SlotState {
    /// Whether the slot currently holds an entry
    pub occupied: bool,

    /// Slots the stored entry may move to. This belongs to the stored key, not
    /// to the slot, and travels with the content on every move.
    pub alternates: Vec<SlotIndex>,
}

impl SlotState {
    /// Returns `true` if the slot holds no entry.
    pub fn is_free(&self) -> bool {
        !self.occupied
    }

    /// Clones this state, reporting allocation failure instead of aborting.
    pub(crate) fn try_clone(&self) -> Result<Self> {
        Ok(Self {
            occupied: self.occupied,
            alternates: try_copy_slots(&self.alternates)?,
        })
    }

    /// Overwrites this slot with fresh content.
    pub(crate) fn fill(&mut self, alternates: Vec<SlotIndex>) {
        self.occupied = true;
        self.alternates = alternates;
    }

    /// Empties the slot.
    pub(crate) fn clear(&mut self) {
        self.occupied = false;
        self.alternates.clear();
    }
}

/// Copies a slot list into freshly reserved storage.
pub(crate) fn try_copy_slots(slots: &[SlotIndex]) -> Result<Vec<SlotIndex>> {
    let mut copy = Vec::new();
    copy.try_reserve_exact(slots.len()).map_err(|e| {
        PlacementError::OutOfMemory(format!(
            "reserving {} alternates failed: {e}",
            slots.len()
        ))
    })?;
    copy.extend_from_slice(slots);
    Ok(copy)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fill_and_clear() {
        let mut slot = SlotState::default();
        assert!(slot.is_free());

        slot.fill(vec![3, 5]);
        assert!(!slot.is_free());
        assert_eq!(slot.alternates, vec![3, 5]);

        slot.clear();
        assert!(slot.is_free());
        assert!(slot.alternates.is_empty());
    }

    #[test]
    fn test_try_clone_matches() {
        let slot = SlotState {
            occupied: true,
            alternates: vec![1, 2, 3],
        };
        assert_eq!(slot.try_clone().unwrap(), slot);
    }
}
