// Copyright (c) 2025 EM Placement Authors
//
// Licensed under dual license:
// - MIT License (LICENSE-MIT or https://opensource.org/licenses/MIT)
// - Apache License, Version 2.0 (LICENSE-APACHE or https://www.apache.org/licenses/LICENSE-2.0)

//! Property-based tests for the placement graph.

use proptest::prelude::*;
use std::collections::{BTreeSet, HashMap, VecDeque};

use crate::data_structures::placement_graph::{
    PlacementError, PlacementGraph, PlacementGraphConfig, SlotIndex,
};

/// A randomly populated table plus a candidate set for a new key.
#[derive(Debug, Clone)]
struct Scenario {
    config: PlacementGraphConfig,
    contents: Vec<Option<Vec<SlotIndex>>>,
    candidates: Vec<SlotIndex>,
}

impl Scenario {
    fn build(&self) -> PlacementGraph {
        let mut graph = PlacementGraph::new(self.config.clone()).unwrap();
        for (slot, content) in self.contents.iter().enumerate() {
            if let Some(alternates) = content {
                graph.insert(slot, alternates).unwrap();
            }
        }
        graph
    }
}

#[derive(Debug, Clone)]
enum Op {
    Insert(SlotIndex, Vec<SlotIndex>),
    Move(SlotIndex, SlotIndex),
    Delete(SlotIndex),
}

// Strategy for a table of 2..32 slots, mostly full so that searches have to
// displace entries
fn scenario_strategy() -> impl Strategy<Value = Scenario> {
    (2usize..32, 1usize..4, 0u32..5, 1usize..6).prop_flat_map(
        |(num_slots, entries_per_row, max_moves, queue_capacity)| {
            let entries_per_row = entries_per_row.min(num_slots);
            let content = prop::option::weighted(
                0.85,
                prop::collection::vec(0..num_slots, 0..4),
            );
            (
                prop::collection::vec(content, num_slots),
                prop::collection::vec(0..num_slots, 1..4),
            )
                .prop_map(move |(contents, candidates)| Scenario {
                    config: PlacementGraphConfig::new()
                        .with_num_slots(num_slots)
                        .with_entries_per_row(entries_per_row)
                        .with_max_moves(max_moves)
                        .with_queue_capacity(queue_capacity),
                    contents,
                    candidates,
                })
        },
    )
}

// Strategy for a scenario together with a sequence of in-range mutations
fn ops_strategy() -> impl Strategy<Value = (Scenario, Vec<Op>)> {
    scenario_strategy().prop_flat_map(|scenario| {
        let n = scenario.config.num_slots;
        let op = prop_oneof![
            (0..n, prop::collection::vec(0..n, 0..4)).prop_map(|(s, a)| Op::Insert(s, a)),
            (0..n, 0..n).prop_map(|(s, d)| Op::Move(s, d)),
            (0..n).prop_map(Op::Delete),
        ];
        (Just(scenario), prop::collection::vec(op, 0..16))
    })
}

/// Alternates of every stored entry in the row of `slot`.
fn row_edges(graph: &PlacementGraph, slot: SlotIndex) -> Vec<SlotIndex> {
    graph
        .row_of(slot)
        .filter_map(|s| graph.get(s))
        .filter(|state| state.occupied)
        .flat_map(|state| state.alternates.iter().copied())
        .collect()
}

/// Unbounded-queue reference search: is a free slot reachable from
/// `candidates` in at most `max_moves` relocations?
fn free_slot_within(graph: &PlacementGraph, candidates: &[SlotIndex], max_moves: u32) -> bool {
    if candidates.iter().any(|&c| !graph.is_occupied(c)) {
        return true;
    }
    let mut depth: HashMap<SlotIndex, u32> = candidates.iter().map(|&c| (c, 0)).collect();
    let mut frontier: VecDeque<SlotIndex> = candidates.iter().copied().collect();
    while let Some(slot) = frontier.pop_front() {
        let d = depth[&slot];
        if d == max_moves {
            continue;
        }
        for next in row_edges(graph, slot) {
            if depth.contains_key(&next) {
                continue;
            }
            if !graph.is_occupied(next) {
                return true;
            }
            depth.insert(next, d + 1);
            frontier.push_back(next);
        }
    }
    false
}

fn apply_in_transaction(graph: &mut PlacementGraph, ops: &[Op]) -> BTreeSet<SlotIndex> {
    let mut touched = BTreeSet::new();
    for op in ops {
        // Errors such as moving from an empty slot are part of the input space
        let _ = match op {
            Op::Insert(slot, alternates) => {
                touched.insert(*slot);
                graph.insert_tx(*slot, alternates)
            }
            Op::Move(src, dst) => {
                touched.insert(*dst);
                graph.move_content_tx(*src, *dst)
            }
            Op::Delete(slot) => {
                touched.insert(*slot);
                graph.delete_tx(*slot)
            }
        };
    }
    touched
}

proptest! {
    // Property: a free candidate is always used directly, without searching
    #[test]
    fn prop_direct_hit(scenario in scenario_strategy()) {
        let graph = scenario.build();
        let first_free = scenario.candidates.iter().copied().find(|&c| !graph.is_occupied(c));

        if let Some(free) = first_free {
            let plan = graph.find_path(&scenario.candidates).unwrap();
            prop_assert_eq!(plan.len(), 1);
            prop_assert_eq!(plan.as_slice()[0].source, None);
            prop_assert_eq!(plan.as_slice()[0].destination, free);
        }
    }

    // Property: plans never exceed the move budget
    #[test]
    fn prop_bounded_depth(scenario in scenario_strategy()) {
        let graph = scenario.build();
        match graph.find_path(&scenario.candidates) {
            Ok(plan) => prop_assert!(plan.len() <= graph.max_moves() as usize + 1),
            Err(err) => prop_assert_eq!(err, PlacementError::NoSpace { max_moves: graph.max_moves() }),
        }
    }

    // Property: executing a plan only fills its terminal and shifts content along the chain
    #[test]
    fn prop_path_validity(scenario in scenario_strategy()) {
        let graph = scenario.build();
        let Ok(plan) = graph.find_path(&scenario.candidates) else {
            return Ok(());
        };

        let terminal = plan.terminal().unwrap();
        let root = plan.root().unwrap();
        prop_assert!(!graph.is_occupied(terminal));
        prop_assert!(scenario.candidates.contains(&root));

        // Every relocation follows a mobility edge of the source's row
        for record in plan.iter() {
            if let Some(src) = record.source {
                prop_assert!(row_edges(&graph, src).contains(&record.destination));
            }
        }

        let fresh = vec![root];
        let mut applied = graph.clone();
        applied.execute_moves(&plan, &fresh, false).unwrap();

        let touched: BTreeSet<_> = plan.touched_slots().into_iter().collect();
        for (slot, before) in graph.iter() {
            let after = applied.get(slot).unwrap();
            if slot == terminal {
                prop_assert!(after.occupied);
            } else {
                prop_assert_eq!(after.occupied, before.occupied);
            }
            if !touched.contains(&slot) {
                prop_assert_eq!(after, before);
            }
        }
        for record in plan.iter() {
            let after = &applied.get(record.destination).unwrap().alternates;
            match record.source {
                Some(src) => prop_assert_eq!(after, &graph.get(src).unwrap().alternates),
                None => prop_assert_eq!(after, &fresh),
            }
        }
        prop_assert_eq!(applied.occupied_count(), graph.occupied_count() + 1);
    }

    // Property: with queues large enough to never drop, the search finds a
    // plan whenever a free slot is reachable within the budget, and that
    // plan starts at one of the candidates
    #[test]
    fn prop_reachable_free_slot_is_found(scenario in scenario_strategy()) {
        let mut scenario = scenario;
        scenario.config.queue_capacity = scenario.config.num_slots + 1;
        let graph = scenario.build();

        let reachable = free_slot_within(&graph, &scenario.candidates, graph.max_moves());
        match graph.find_path(&scenario.candidates) {
            Ok(plan) => {
                prop_assert!(reachable);
                prop_assert!(scenario.candidates.contains(&plan.root().unwrap()));
                prop_assert!(plan.len() <= graph.max_moves() as usize + 1);
            }
            Err(err) => {
                prop_assert!(!reachable, "missed a reachable free slot");
                prop_assert_eq!(err, PlacementError::NoSpace { max_moves: graph.max_moves() });
            }
        }
    }

    // Property: the search never mutates the graph
    #[test]
    fn prop_search_is_read_only(scenario in scenario_strategy()) {
        let graph = scenario.build();
        let before = graph.clone();
        let _ = graph.find_path(&scenario.candidates);
        for (slot, state) in before.iter() {
            prop_assert_eq!(graph.get(slot), Some(state));
        }
    }

    // Property: abort restores every slot exactly, whatever happened in between
    #[test]
    fn prop_abort_restores((scenario, ops) in ops_strategy()) {
        let mut graph = scenario.build();
        let before = graph.clone();

        graph.begin_transaction().unwrap();
        let touched = apply_in_transaction(&mut graph, &ops);
        prop_assert_eq!(graph.transaction_size(), touched.len());
        graph.abort().unwrap();

        prop_assert_eq!(graph.occupied_count(), before.occupied_count());
        for (slot, state) in before.iter() {
            prop_assert_eq!(graph.get(slot), Some(state));
        }
    }

    // Property: commit leaves live state exactly as the mutations left it
    #[test]
    fn prop_commit_is_noop_on_live_state((scenario, ops) in ops_strategy()) {
        let mut graph = scenario.build();

        graph.begin_transaction().unwrap();
        apply_in_transaction(&mut graph, &ops);
        let applied = graph.clone();
        graph.commit().unwrap();

        prop_assert_eq!(graph.transaction_size(), 0);
        for (slot, state) in applied.iter() {
            prop_assert_eq!(graph.get(slot), Some(state));
        }
    }
}
