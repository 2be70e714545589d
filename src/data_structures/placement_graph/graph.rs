// Copyright (c) 2025 EM Placement Authors
//
// Licensed under dual license:
// - MIT License (LICENSE-MIT or https://opensource.org/licenses/MIT)
// - Apache License, Version 2.0 (LICENSE-APACHE or https://www.apache.org/licenses/LICENSE-2.0)

//! Software mirror of table occupancy and entry mobility.
//!
//! Slots live in a flat arena addressed by index. Every slot records whether
//! it is occupied and the alternates of whatever it stores; that single flag is
//! the only occupancy bookkeeping, and it is what the transaction manager
//! snapshots.

use std::ops::Range;

use tracing::{debug, warn};

use crate::data_structures::placement_graph::config::PlacementGraphConfig;
use crate::data_structures::placement_graph::error::{PlacementError, Result};
use crate::data_structures::placement_graph::moves::{self, MoveList};
use crate::data_structures::placement_graph::path;
use crate::data_structures::placement_graph::slot::{try_copy_slots, SlotIndex, SlotState};
use crate::data_structures::placement_graph::transaction::{TransactionManager, TransactionState};

/// Placement graph for one exact-match table.
///
/// The graph is not internally synchronized. Concurrent users must serialize
/// access externally, for example through
/// [`TableRegistry`](crate::data_structures::table_registry::TableRegistry).
#[derive(Debug)]
pub struct PlacementGraph {
    config: PlacementGraphConfig,
    slots: Vec<SlotState>,
    occupied: usize,
    txn: TransactionManager,
}

impl PlacementGraph {
    /// Creates an empty graph.
    ///
    /// # Arguments
    ///
    /// * `config` - Table geometry and search budget.
    ///
    /// # Returns
    ///
    /// The graph, or `InvalidArgument` if the configuration is unusable.
    pub fn new(config: PlacementGraphConfig) -> Result<Self> {
        config.validate()?;
        let mut slots = Vec::new();
        slots.try_reserve_exact(config.num_slots).map_err(|e| {
            PlacementError::OutOfMemory(format!(
                "reserving {} slots failed: {e}",
                config.num_slots
            ))
        })?;
        slots.resize_with(config.num_slots, SlotState::default);

        debug!(
            num_slots = config.num_slots,
            entries_per_row = config.entries_per_row,
            max_moves = config.max_moves,
            "placement graph created"
        );

        Ok(Self {
            config,
            slots,
            occupied: 0,
            txn: TransactionManager::new(),
        })
    }

    /// Configuration the graph was built with.
    pub fn config(&self) -> &PlacementGraphConfig {
        &self.config
    }

    /// Number of slots in the table.
    pub fn num_slots(&self) -> usize {
        self.slots.len()
    }

    /// Number of slots per row.
    pub fn entries_per_row(&self) -> usize {
        self.config.entries_per_row
    }

    /// Move budget per insertion.
    pub fn max_moves(&self) -> u32 {
        self.config.max_moves
    }

    /// Number of occupied slots.
    pub fn occupied_count(&self) -> usize {
        self.occupied
    }

    /// Fraction of slots currently occupied.
    pub fn load_factor(&self) -> f64 {
        self.occupied as f64 / self.slots.len() as f64
    }

    /// Slot indices of the row containing `slot`. The final row may be shorter
    /// than `entries_per_row`.
    pub fn row_of(&self, slot: SlotIndex) -> Range<SlotIndex> {
        let width = self.config.entries_per_row;
        let start = (slot / width) * width;
        start..(start + width).min(self.slots.len())
    }

    /// Returns the state of `slot`, or `None` if it is out of range.
    pub fn get(&self, slot: SlotIndex) -> Option<&SlotState> {
        let state = self.slots.get(slot);
        if state.is_none() {
            warn!(slot, num_slots = self.slots.len(), "slot lookup out of range");
        }
        state
    }

    /// Returns whether `slot` holds an entry. Out-of-range slots read as free
    /// of content and therefore `false`.
    pub fn is_occupied(&self, slot: SlotIndex) -> bool {
        self.slots.get(slot).is_some_and(|s| s.occupied)
    }

    /// Iterates over every slot with its index.
    pub fn iter(&self) -> impl Iterator<Item = (SlotIndex, &SlotState)> {
        self.slots.iter().enumerate()
    }

    /// Stores fresh content in `slot`, replacing its alternates.
    pub fn insert(&mut self, slot: SlotIndex, alternates: &[SlotIndex]) -> Result<()> {
        self.check_slot(slot)?;
        if let Some(&bad) = alternates.iter().find(|&&a| a >= self.slots.len()) {
            return Err(PlacementError::InvalidArgument(format!(
                "alternate {bad} for slot {slot} is out of range for a table of {} slots",
                self.slots.len()
            )));
        }
        let alternates = try_copy_slots(alternates)?;
        self.write_slot(slot, |state| state.fill(alternates));
        Ok(())
    }

    /// Copies the content of `src` into `dst`. `src` keeps its content until
    /// it is explicitly deleted or overwritten.
    pub fn move_content(&mut self, src: SlotIndex, dst: SlotIndex) -> Result<()> {
        self.check_slot(src)?;
        self.check_slot(dst)?;
        if !self.slots[src].occupied {
            return Err(PlacementError::InvalidArgument(format!(
                "cannot move from empty slot {src}"
            )));
        }
        let alternates = try_copy_slots(&self.slots[src].alternates)?;
        self.write_slot(dst, |state| state.fill(alternates));
        Ok(())
    }

    /// Empties `slot`.
    pub fn delete(&mut self, slot: SlotIndex) -> Result<()> {
        self.check_slot(slot)?;
        self.write_slot(slot, SlotState::clear);
        Ok(())
    }

    /// [`insert`](Self::insert) inside the open transaction.
    pub fn insert_tx(&mut self, slot: SlotIndex, alternates: &[SlotIndex]) -> Result<()> {
        self.backup_if_absent(slot)?;
        self.insert(slot, alternates)
    }

    /// [`move_content`](Self::move_content) inside the open transaction.
    pub fn move_content_tx(&mut self, src: SlotIndex, dst: SlotIndex) -> Result<()> {
        self.backup_if_absent(dst)?;
        self.move_content(src, dst)
    }

    /// [`delete`](Self::delete) inside the open transaction.
    pub fn delete_tx(&mut self, slot: SlotIndex) -> Result<()> {
        self.backup_if_absent(slot)?;
        self.delete(slot)
    }

    /// Opens a transaction on this graph.
    pub fn begin_transaction(&mut self) -> Result<()> {
        self.txn.begin()
    }

    /// Snapshots `slot` unless the open transaction already holds a snapshot of it.
    pub fn backup_if_absent(&mut self, slot: SlotIndex) -> Result<bool> {
        self.check_slot(slot)?;
        self.txn.backup_if_absent(slot, &self.slots[slot])
    }

    /// Keeps every change made in the open transaction.
    pub fn commit(&mut self) -> Result<()> {
        self.txn.commit().map(|_| ())
    }

    /// Reverts every slot touched in the open transaction to its state at the
    /// time of first touch.
    pub fn abort(&mut self) -> Result<()> {
        for (slot, backup) in self.txn.abort()? {
            let Some(live) = self.slots.get_mut(slot) else {
                return Err(PlacementError::Unexpected(format!(
                    "backup references slot {slot} outside the table"
                )));
            };
            match (live.occupied, backup.occupied) {
                (true, false) => self.occupied -= 1,
                (false, true) => self.occupied += 1,
                _ => {}
            }
            *live = backup;
        }
        Ok(())
    }

    /// Current transaction state.
    pub fn transaction_state(&self) -> TransactionState {
        self.txn.state()
    }

    /// Returns whether a transaction is open.
    pub fn in_transaction(&self) -> bool {
        self.txn.is_open()
    }

    /// Number of slots backed up in the open transaction.
    pub fn transaction_size(&self) -> usize {
        self.txn.size()
    }

    /// Finds a relocation plan that frees one of `candidates`.
    pub fn find_path(&self, candidates: &[SlotIndex]) -> Result<MoveList> {
        path::find_path(self, candidates)
    }

    /// Applies `plan`, inserting `fresh_content` as the alternates of the new entry.
    pub fn execute_moves(
        &mut self,
        plan: &MoveList,
        fresh_content: &[SlotIndex],
        in_transaction: bool,
    ) -> Result<()> {
        moves::execute_moves(self, plan, fresh_content, in_transaction)
    }

    /// Releases transaction bookkeeping ahead of dropping the graph.
    ///
    /// # Returns
    ///
    /// The number of residual backups that were discarded.
    pub fn teardown(&mut self) -> usize {
        let residual = self.txn.discard();
        if residual > 0 {
            warn!(residual, "placement graph torn down with an open transaction");
        }
        residual
    }

    fn check_slot(&self, slot: SlotIndex) -> Result<()> {
        if slot < self.slots.len() {
            Ok(())
        } else {
            Err(PlacementError::slot_out_of_range(slot, self.slots.len()))
        }
    }

    fn write_slot(&mut self, slot: SlotIndex, f: impl FnOnce(&mut SlotState)) {
        let state = &mut self.slots[slot];
        let was_occupied = state.occupied;
        f(state);
        match (was_occupied, state.occupied) {
            (false, true) => self.occupied += 1,
            (true, false) => self.occupied -= 1,
            _ => {}
        }
    }
}

impl Clone for PlacementGraph {
    /// Clones live slot state only; the clone starts with no open transaction.
    fn clone(&self) -> Self {
        Self {
            config: self.config.clone(),
            slots: self.slots.clone(),
            occupied: self.occupied,
            txn: TransactionManager::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn graph(num_slots: usize, entries_per_row: usize) -> PlacementGraph {
        PlacementGraph::new(
            PlacementGraphConfig::new()
                .with_num_slots(num_slots)
                .with_entries_per_row(entries_per_row)
                .with_max_moves(3),
        )
        .unwrap()
    }

    #[test]
    fn test_insert_and_get() {
        let mut g = graph(8, 1);
        g.insert(2, &[5, 6]).unwrap();

        let slot = g.get(2).unwrap();
        assert!(slot.occupied);
        assert_eq!(slot.alternates, vec![5, 6]);
        assert!(g.is_occupied(2));
        assert_eq!(g.occupied_count(), 1);
    }

    #[test]
    fn test_out_of_range_is_defensive() {
        let mut g = graph(8, 1);
        assert!(g.get(8).is_none());
        assert!(!g.is_occupied(8));
        assert!(!g.is_occupied(usize::MAX));

        assert!(matches!(g.insert(8, &[]), Err(PlacementError::InvalidArgument(_))));
        assert!(matches!(g.insert(0, &[9]), Err(PlacementError::InvalidArgument(_))));
        assert!(matches!(g.delete(100), Err(PlacementError::InvalidArgument(_))));
        assert!(!g.is_occupied(0), "rejected insert must not mutate");
    }

    #[test]
    fn test_move_does_not_clear_source() {
        let mut g = graph(8, 1);
        g.insert(1, &[3]).unwrap();
        g.move_content(1, 4).unwrap();

        assert!(g.is_occupied(1));
        assert!(g.is_occupied(4));
        assert_eq!(g.get(4).unwrap().alternates, vec![3]);
        assert_eq!(g.occupied_count(), 2);

        g.delete(1).unwrap();
        assert!(!g.is_occupied(1));
        assert!(g.get(1).unwrap().alternates.is_empty());
        assert_eq!(g.occupied_count(), 1);
    }

    #[test]
    fn test_move_from_empty_slot_is_rejected() {
        let mut g = graph(8, 1);
        assert!(matches!(
            g.move_content(0, 1),
            Err(PlacementError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_rows() {
        let g = graph(10, 4);
        assert_eq!(g.row_of(0), 0..4);
        assert_eq!(g.row_of(5), 4..8);
        assert_eq!(g.row_of(9), 8..10);
    }

    #[test]
    fn test_abort_restores_touched_slots() {
        let mut g = graph(8, 1);
        g.insert(0, &[1]).unwrap();
        g.insert(3, &[4]).unwrap();

        g.begin_transaction().unwrap();
        g.insert_tx(0, &[7]).unwrap();
        g.move_content_tx(3, 5).unwrap();
        g.delete_tx(3).unwrap();
        assert_eq!(g.transaction_size(), 3);
        assert_eq!(g.occupied_count(), 2);

        g.abort().unwrap();
        assert_eq!(g.get(0).unwrap().alternates, vec![1]);
        assert!(g.is_occupied(3));
        assert_eq!(g.get(3).unwrap().alternates, vec![4]);
        assert!(!g.is_occupied(5));
        assert_eq!(g.occupied_count(), 2);
        assert_eq!(g.transaction_state(), TransactionState::Aborted);
    }

    #[test]
    fn test_commit_keeps_live_state() {
        let mut g = graph(8, 1);
        g.begin_transaction().unwrap();
        g.insert_tx(6, &[2]).unwrap();
        g.commit().unwrap();

        assert!(g.is_occupied(6));
        assert_eq!(g.transaction_size(), 0);
        assert!(g.abort().is_err(), "nothing left to abort after commit");
        assert!(g.is_occupied(6));
    }

    #[test]
    fn test_tx_variants_need_open_transaction() {
        let mut g = graph(8, 1);
        assert!(matches!(
            g.insert_tx(0, &[]),
            Err(PlacementError::InvalidArgument(_))
        ));
        assert!(!g.is_occupied(0));
    }

    #[test]
    fn test_teardown_discards_open_transaction() {
        let mut g = graph(8, 1);
        g.begin_transaction().unwrap();
        g.insert_tx(1, &[]).unwrap();
        assert_eq!(g.teardown(), 1);
        assert!(!g.in_transaction());
    }
}
