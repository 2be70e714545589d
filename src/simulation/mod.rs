// Copyright (c) 2025 EM Placement Authors
//
// Licensed under dual license:
// - MIT License (LICENSE-MIT or https://opensource.org/licenses/MIT)
// - Apache License, Version 2.0 (LICENSE-APACHE or https://www.apache.org/licenses/LICENSE-2.0)

//! Load simulation for the placement engine.
//!
//! The simulator plays the part of a table driver. It keeps an authoritative
//! key table standing in for hardware, and for every synthetic key it
//! searches the placement graph, applies the plan inside a transaction,
//! replays it on the key table and commits. Injected write faults exercise
//! the abort path.

mod hash;

pub use hash::{candidate_rows, candidate_slots, hash_with_seed, MAX_WAYS};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::data_structures::placement_graph::{
    MoveList, PlacementError, PlacementGraph, PlacementGraphConfig, Result, SlotIndex,
};

/// Parameters of a simulation run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Number of synthetic keys to insert
    pub keys: u64,

    /// Number of hash ways (candidate rows) per key
    pub ways: usize,

    /// Fail every Nth table write; 0 disables fault injection
    pub fault_every: u64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            keys: 3_000,
            ways: 2,
            fault_every: 0,
        }
    }
}

/// Outcome of inserting one key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    /// A candidate was free
    Direct,
    /// Existing entries were relocated; carries the number of moves
    Displaced(usize),
    /// No free slot within the move budget
    NoSpace,
    /// The table write failed and the graph was rolled back
    Aborted,
}

/// Aggregate results of a run.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SimulationReport {
    /// Keys offered to the table
    pub attempted: u64,
    /// Keys stored
    pub inserted: u64,
    /// Keys stored without relocating anything
    pub direct_hits: u64,
    /// Keys stored after relocating at least one entry
    pub displaced: u64,
    /// Total relocations performed
    pub relocations: u64,
    /// Longest eviction chain used
    pub longest_chain: usize,
    /// Keys rejected for lack of space
    pub no_space: u64,
    /// Keys rolled back after an injected write fault
    pub aborted: u64,
    /// Occupied fraction of the table at the end of the run
    pub load_factor: f64,
}

/// Drives a placement graph against a mirrored key table.
#[derive(Debug)]
pub struct Simulator {
    graph: PlacementGraph,
    table: Vec<Option<u64>>,
    settings: SimulationConfig,
    report: SimulationReport,
}

impl Simulator {
    /// Creates a simulator over an empty table.
    pub fn new(placement: PlacementGraphConfig, settings: SimulationConfig) -> Result<Self> {
        let graph = PlacementGraph::new(placement)?;
        let table = vec![None; graph.num_slots()];
        Ok(Self {
            graph,
            table,
            settings,
            report: SimulationReport::default(),
        })
    }

    /// The placement graph being driven.
    pub fn graph(&self) -> &PlacementGraph {
        &self.graph
    }

    /// Key stored in `slot` according to the authoritative table.
    pub fn key_at(&self, slot: SlotIndex) -> Option<u64> {
        self.table.get(slot).copied().flatten()
    }

    /// Results so far.
    pub fn report(&self) -> &SimulationReport {
        &self.report
    }

    /// Inserts keys `0..keys` and returns the final report.
    pub fn run(mut self) -> Result<SimulationReport> {
        for key in 0..self.settings.keys {
            self.insert_key(key)?;
        }
        self.verify()?;
        info!(
            inserted = self.report.inserted,
            no_space = self.report.no_space,
            load_factor = self.report.load_factor,
            "simulation finished"
        );
        Ok(self.report)
    }

    /// Places one key.
    pub fn insert_key(&mut self, key: u64) -> Result<InsertOutcome> {
        let candidates = candidate_slots(&key, self.settings.ways, self.graph.config());
        self.report.attempted += 1;

        let plan = match self.graph.find_path(&candidates) {
            Ok(plan) => plan,
            Err(err) if err.is_recoverable() => {
                self.report.no_space += 1;
                return Ok(InsertOutcome::NoSpace);
            }
            Err(err) => return Err(err),
        };

        self.graph.begin_transaction()?;
        if let Err(err) = self.graph.execute_moves(&plan, &candidates, true) {
            self.graph.abort()?;
            return Err(err);
        }

        if self.write_fails() {
            debug!(key, "injected table write fault, rolling back");
            self.graph.abort()?;
            self.report.aborted += 1;
            return Ok(InsertOutcome::Aborted);
        }
        if let Err(err) = self.replay(&plan, key) {
            self.graph.abort()?;
            return Err(err);
        }
        self.graph.commit()?;

        let moves = plan.relocations();
        self.report.inserted += 1;
        self.report.relocations += moves as u64;
        self.report.longest_chain = self.report.longest_chain.max(moves);
        self.report.load_factor = self.graph.load_factor();
        if moves == 0 {
            self.report.direct_hits += 1;
            Ok(InsertOutcome::Direct)
        } else {
            self.report.displaced += 1;
            Ok(InsertOutcome::Displaced(moves))
        }
    }

    /// Checks that the graph and the key table agree on every slot.
    ///
    /// Entries may be carried along the mobility edges of their row, so a key
    /// is not required to sit in one of its own candidates; its alternates
    /// must still be its candidates wherever it lands.
    pub fn verify(&self) -> Result<()> {
        for (slot, state) in self.graph.iter() {
            match self.table[slot] {
                Some(key) => {
                    let candidates =
                        candidate_slots(&key, self.settings.ways, self.graph.config());
                    if !state.occupied || state.alternates != candidates {
                        return Err(PlacementError::Unexpected(format!(
                            "slot {slot} holds key {key} but the graph disagrees"
                        )));
                    }
                }
                None if state.occupied => {
                    return Err(PlacementError::Unexpected(format!(
                        "slot {slot} is empty in the table but occupied in the graph"
                    )));
                }
                None => {}
            }
        }
        Ok(())
    }

    fn write_fails(&self) -> bool {
        self.settings.fault_every > 0 && self.report.attempted % self.settings.fault_every == 0
    }

    /// Applies `plan` to the key table, leaf first.
    fn replay(&mut self, plan: &MoveList, key: u64) -> Result<()> {
        for record in plan.execution_order() {
            let value = match record.source {
                Some(src) => Some(self.table[src].ok_or_else(|| {
                    PlacementError::Unexpected(format!("plan moves from empty table slot {src}"))
                })?),
                None => Some(key),
            };
            self.table[record.destination] = value;
        }
        Ok(())
    }
}
