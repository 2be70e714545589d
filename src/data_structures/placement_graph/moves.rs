// Copyright (c) 2025 EM Placement Authors
//
// Licensed under dual license:
// - MIT License (LICENSE-MIT or https://opensource.org/licenses/MIT)
// - Apache License, Version 2.0 (LICENSE-APACHE or https://www.apache.org/licenses/LICENSE-2.0)

//! Relocation plans and their execution against the placement graph.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{instrument, trace};

use crate::data_structures::placement_graph::error::{PlacementError, Result};
use crate::data_structures::placement_graph::graph::PlacementGraph;
use crate::data_structures::placement_graph::slot::SlotIndex;

/// One step of a relocation plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MoveRecord {
    /// Slot whose content moves; `None` means the new entry is written here
    pub source: Option<SlotIndex>,

    /// Slot receiving the content
    pub destination: SlotIndex,
}

impl MoveRecord {
    /// A step writing the new entry into `destination`.
    pub fn insert(destination: SlotIndex) -> Self {
        Self {
            source: None,
            destination,
        }
    }

    /// A step relocating the content of `source` into `destination`.
    pub fn relocate(source: SlotIndex, destination: SlotIndex) -> Self {
        Self {
            source: Some(source),
            destination,
        }
    }
}

impl fmt::Display for MoveRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.source {
            Some(src) => write!(f, "{src} -> {}", self.destination),
            None => write!(f, "new -> {}", self.destination),
        }
    }
}

/// An ordered relocation plan.
///
/// Records are stored root first, in the order the search discovered them.
/// They must be applied leaf first so that every destination has been
/// vacated before it is written; [`execution_order`](Self::execution_order)
/// yields them that way.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveList {
    moves: Vec<MoveRecord>,
}

impl MoveList {
    /// A plan consisting of a single direct insertion.
    pub fn direct(destination: SlotIndex) -> Self {
        Self {
            moves: vec![MoveRecord::insert(destination)],
        }
    }

    /// Builds a plan from a reconstructed path `[terminal, ..., root]`.
    ///
    /// The root receives the new entry; every other element receives the
    /// content of the element after it.
    pub fn from_path(path: &[SlotIndex]) -> Self {
        let moves = (0..path.len())
            .rev()
            .map(|j| match path.get(j + 1) {
                Some(&source) => MoveRecord::relocate(source, path[j]),
                None => MoveRecord::insert(path[j]),
            })
            .collect();
        Self { moves }
    }

    /// Number of records in the plan.
    pub fn len(&self) -> usize {
        self.moves.len()
    }

    /// Returns whether the plan is empty.
    pub fn is_empty(&self) -> bool {
        self.moves.is_empty()
    }

    /// Records root first.
    pub fn iter(&self) -> std::slice::Iter<'_, MoveRecord> {
        self.moves.iter()
    }

    /// Records in the order they must be applied: leaf first.
    pub fn execution_order(&self) -> std::iter::Rev<std::slice::Iter<'_, MoveRecord>> {
        self.moves.iter().rev()
    }

    /// Slot that receives the new entry.
    pub fn root(&self) -> Option<SlotIndex> {
        self.moves.first().map(|m| m.destination)
    }

    /// Free slot at the end of the eviction chain.
    pub fn terminal(&self) -> Option<SlotIndex> {
        self.moves.last().map(|m| m.destination)
    }

    /// Number of existing entries that have to move.
    pub fn relocations(&self) -> usize {
        self.moves.iter().filter(|m| m.source.is_some()).count()
    }

    /// Every slot read or written by the plan, in first-seen order.
    pub fn touched_slots(&self) -> Vec<SlotIndex> {
        let mut touched = Vec::with_capacity(self.moves.len() * 2);
        for record in &self.moves {
            for slot in record.source.into_iter().chain([record.destination]) {
                if !touched.contains(&slot) {
                    touched.push(slot);
                }
            }
        }
        touched
    }

    /// Records root first, as a slice.
    pub fn as_slice(&self) -> &[MoveRecord] {
        &self.moves
    }
}

impl<'a> IntoIterator for &'a MoveList {
    type Item = &'a MoveRecord;
    type IntoIter = std::slice::Iter<'a, MoveRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl fmt::Display for MoveList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, record) in self.moves.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{record}")?;
        }
        write!(f, "]")
    }
}

/// Applies `plan` to `graph`, leaf first.
///
/// With `in_transaction` set, every touched slot is backed up in the open
/// transaction before the first mutation. A failure part way through leaves
/// the already-applied steps in place; the caller is expected to abort.
#[instrument(level = "debug", skip(graph, plan, fresh_content), fields(plan = %plan))]
pub fn execute_moves(
    graph: &mut PlacementGraph,
    plan: &MoveList,
    fresh_content: &[SlotIndex],
    in_transaction: bool,
) -> Result<()> {
    if plan.is_empty() {
        return Err(PlacementError::InvalidArgument(
            "move list is empty".to_string(),
        ));
    }

    if in_transaction {
        if !graph.in_transaction() {
            return Err(PlacementError::InvalidArgument(
                "execution requested inside a transaction but none is open".to_string(),
            ));
        }
        for slot in plan.touched_slots() {
            graph.backup_if_absent(slot)?;
        }
    }

    for record in plan.execution_order() {
        trace!(%record, "applying move");
        match record.source {
            Some(src) => graph.move_content(src, record.destination)?,
            None => graph.insert(record.destination, fresh_content)?,
        }
    }
    Ok(())
}
