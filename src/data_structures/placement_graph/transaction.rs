// Copyright (c) 2025 EM Placement Authors
//
// Licensed under dual license:
// - MIT License (LICENSE-MIT or https://opensource.org/licenses/MIT)
// - Apache License, Version 2.0 (LICENSE-APACHE or https://www.apache.org/licenses/LICENSE-2.0)

//! Write-once undo log for placement graph mutations.
//!
//! The first time a slot is touched inside an open transaction its full state
//! is captured. Commit throws the captures away; abort writes them back. The
//! live slots are always mutated in place, so readers see uncommitted state
//! until an abort reverts it.

use fnv::FnvBuildHasher;
use hashbrown::HashMap;
use tracing::debug;

use crate::data_structures::placement_graph::error::{PlacementError, Result};
use crate::data_structures::placement_graph::slot::{SlotIndex, SlotState};

/// Lifecycle of a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionState {
    /// No transaction has been opened since the last commit or abort
    Idle,
    /// Backups are being collected
    Open,
    /// The last transaction was committed
    Committed,
    /// The last transaction was aborted
    Aborted,
}

/// Tracks backups for the currently open transaction of one graph.
#[derive(Debug)]
pub struct TransactionManager {
    state: TransactionState,
    backups: HashMap<SlotIndex, SlotState, FnvBuildHasher>,
}

impl TransactionManager {
    /// Creates an idle manager with no backups.
    pub fn new() -> Self {
        Self {
            state: TransactionState::Idle,
            backups: HashMap::default(),
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> TransactionState {
        self.state
    }

    /// Returns whether a transaction is open.
    pub fn is_open(&self) -> bool {
        self.state == TransactionState::Open
    }

    /// Number of slots backed up in the open transaction.
    pub fn size(&self) -> usize {
        self.backups.len()
    }

    /// Returns whether `slot` already has a backup.
    pub fn has_backup(&self, slot: SlotIndex) -> bool {
        self.backups.contains_key(&slot)
    }

    /// Opens a new transaction.
    pub fn begin(&mut self) -> Result<()> {
        if self.is_open() {
            return Err(PlacementError::InvalidArgument(
                "a transaction is already open".to_string(),
            ));
        }
        debug_assert!(self.backups.is_empty(), "stale backups outside a transaction");
        self.state = TransactionState::Open;
        debug!("placement transaction opened");
        Ok(())
    }

    /// Captures `current` as the backup for `slot` unless one already exists.
    ///
    /// # Returns
    ///
    /// * `Ok(true)` if a new backup was stored
    /// * `Ok(false)` if the slot was already backed up
    pub fn backup_if_absent(&mut self, slot: SlotIndex, current: &SlotState) -> Result<bool> {
        self.ensure_open("backup")?;
        if self.backups.contains_key(&slot) {
            return Ok(false);
        }
        self.backups.try_reserve(1).map_err(|e| {
            PlacementError::OutOfMemory(format!("reserving a backup for slot {slot} failed: {e:?}"))
        })?;
        self.backups.insert(slot, current.try_clone()?);
        Ok(true)
    }

    /// Discards every backup. Live state already holds the committed values.
    pub fn commit(&mut self) -> Result<usize> {
        self.ensure_open("commit")?;
        let discarded = self.backups.len();
        self.backups.clear();
        self.state = TransactionState::Committed;
        debug!(slots = discarded, "placement transaction committed");
        Ok(discarded)
    }

    /// Ends the transaction and hands back every backup for restoration.
    pub fn abort(&mut self) -> Result<Vec<(SlotIndex, SlotState)>> {
        self.ensure_open("abort")?;
        let restored: Vec<_> = self.backups.drain().collect();
        self.state = TransactionState::Aborted;
        debug!(slots = restored.len(), "placement transaction aborted");
        Ok(restored)
    }

    /// Drops any residual backups regardless of state. Used at teardown.
    pub fn discard(&mut self) -> usize {
        let residual = self.backups.len();
        self.backups.clear();
        self.state = TransactionState::Idle;
        residual
    }

    fn ensure_open(&self, operation: &str) -> Result<()> {
        if self.is_open() {
            Ok(())
        } else {
            Err(PlacementError::InvalidArgument(format!(
                "cannot {operation}: no transaction is open (state {:?})",
                self.state
            )))
        }
    }
}

impl Default for TransactionManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn occupied(alternates: &[SlotIndex]) -> SlotState {
        SlotState {
            occupied: true,
            alternates: alternates.to_vec(),
        }
    }

    #[test]
    fn test_state_machine() {
        let mut txn = TransactionManager::new();
        assert_eq!(txn.state(), TransactionState::Idle);

        txn.begin().unwrap();
        assert_eq!(txn.state(), TransactionState::Open);
        assert!(txn.begin().is_err(), "nested begin must be rejected");

        txn.commit().unwrap();
        assert_eq!(txn.state(), TransactionState::Committed);
        assert!(txn.commit().is_err());
        assert!(txn.abort().is_err());

        txn.begin().unwrap();
        txn.abort().unwrap();
        assert_eq!(txn.state(), TransactionState::Aborted);
    }

    #[test]
    fn test_backup_is_write_once() {
        let mut txn = TransactionManager::new();
        txn.begin().unwrap();

        assert!(txn.backup_if_absent(4, &occupied(&[1])).unwrap());
        assert!(!txn.backup_if_absent(4, &occupied(&[2, 3])).unwrap());
        assert_eq!(txn.size(), 1);

        let restored = txn.abort().unwrap();
        assert_eq!(restored, vec![(4, occupied(&[1]))]);
        assert_eq!(txn.size(), 0);
    }

    #[test]
    fn test_backup_requires_open_transaction() {
        let mut txn = TransactionManager::new();
        let err = txn.backup_if_absent(0, &SlotState::default()).unwrap_err();
        assert!(matches!(err, PlacementError::InvalidArgument(_)));
    }

    #[test]
    fn test_discard_drops_residual_backups() {
        let mut txn = TransactionManager::new();
        txn.begin().unwrap();
        txn.backup_if_absent(0, &SlotState::default()).unwrap();
        txn.backup_if_absent(1, &SlotState::default()).unwrap();

        assert_eq!(txn.discard(), 2);
        assert_eq!(txn.state(), TransactionState::Idle);
        assert!(txn.begin().is_ok());
    }
}
