// Copyright (c) 2025 EM Placement Authors
//
// Licensed under dual license:
// - MIT License (LICENSE-MIT or https://opensource.org/licenses/MIT)
// - Apache License, Version 2.0 (LICENSE-APACHE or https://www.apache.org/licenses/LICENSE-2.0)

//! Bounded breadth-first search for a cuckoo path.
//!
//! # Algorithm
//!
//! 1. If any candidate is free, insert there directly.
//! 2. Otherwise every candidate becomes a depth-zero root in the frontier queue.
//! 3. Records are moved from the frontier into the cache queue until the cache
//!    fills or the frontier drains. A free record ends the search.
//! 4. The cached records are expanded together. For each one, every slot of its
//!    row is considered, and the alternates of those slots are first scanned for
//!    one that is already free; only when none is found are the alternates
//!    enqueued as depth + 1 records whose parent is the cached record's slot.
//! 5. A successful search walks the parent links back to a root and turns the
//!    slot sequence into a [`MoveList`].
//!
//! Queue space is a soft limit: records that do not fit are dropped, which
//! narrows the search instead of failing it. Expanding through the cache in
//! batches means a frontier that fills up mid-level keeps making progress,
//! at the cost of not being an exact BFS.
//!
//! The alternates of every stored entry in a row are mobility edges of the
//! whole row, so the entry in a queued slot may follow an edge contributed by
//! one of its row siblings. Only queued slots are marked visited, which keeps
//! every slot in a returned path distinct and every plan rooted at one of the
//! caller's candidates. A row is expanded at most once per search.

use tracing::{debug, error, instrument};

use crate::data_structures::placement_graph::error::{PlacementError, Result};
use crate::data_structures::placement_graph::graph::PlacementGraph;
use crate::data_structures::placement_graph::moves::MoveList;
use crate::data_structures::placement_graph::queue::{BfsNode, BoundedQueue, VisitedSet};
use crate::data_structures::placement_graph::slot::SlotIndex;

/// Counters describing one search.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct SearchStats {
    /// BFS records created, roots included
    pub nodes_created: usize,
    /// Rows whose mobility edges were traversed
    pub rows_expanded: usize,
    /// Records dropped because the frontier queue was full
    pub dropped: usize,
    /// Whether the search ended on a direct hit
    pub direct_hit: bool,
}

/// Finds relocation plans over a borrowed graph. Search state is owned by the
/// finder and released when it is dropped.
#[derive(Debug)]
pub struct PathFinder<'g> {
    graph: &'g PlacementGraph,
    arena: Vec<BfsNode>,
    primary: BoundedQueue<u32>,
    cache: BoundedQueue<u32>,
    visited: VisitedSet,
    expanded_rows: VisitedSet,
    stats: SearchStats,
}

impl<'g> PathFinder<'g> {
    /// Creates a finder with queues sized from the graph's configuration.
    pub fn new(graph: &'g PlacementGraph) -> Self {
        let capacity = graph.config().queue_capacity;
        Self {
            graph,
            arena: Vec::new(),
            primary: BoundedQueue::with_capacity(capacity),
            cache: BoundedQueue::with_capacity(capacity),
            visited: VisitedSet::new(),
            expanded_rows: VisitedSet::new(),
            stats: SearchStats::default(),
        }
    }

    /// Counters for the most recent search.
    pub fn stats(&self) -> SearchStats {
        self.stats
    }

    /// Searches for a plan that frees one of `candidates`.
    ///
    /// # Returns
    ///
    /// * `Ok(MoveList)` - a plan of at most `max_moves + 1` records
    /// * `Err(PlacementError::NoSpace)` - no free slot within the move budget
    /// * `Err(PlacementError::InvalidArgument)` - empty or out-of-range candidates
    pub fn search(&mut self, candidates: &[SlotIndex]) -> Result<MoveList> {
        self.reset();
        self.check_candidates(candidates)?;

        if let Some(&free) = candidates.iter().find(|&&c| !self.graph.is_occupied(c)) {
            self.stats.direct_hit = true;
            return Ok(MoveList::direct(free));
        }

        for &candidate in candidates {
            if self.visited.insert(candidate) {
                self.enqueue(BfsNode::root(candidate))?;
            }
        }

        while !self.primary.is_empty() {
            while !self.cache.is_full() {
                let Some(pos) = self.primary.pop() else {
                    break;
                };
                if !self.graph.is_occupied(self.node(pos)?.slot) {
                    return self.reconstruct(pos);
                }
                self.cache.push(pos);
            }

            match self.expand_cached()? {
                Expansion::Found(pos) => return self.reconstruct(pos),
                Expansion::DepthExhausted => break,
                Expansion::Continue => {}
            }
        }

        self.stats.dropped = self.primary.dropped();
        Err(PlacementError::NoSpace {
            max_moves: self.graph.max_moves(),
        })
    }

    fn reset(&mut self) {
        self.arena.clear();
        self.primary = BoundedQueue::with_capacity(self.primary.capacity());
        self.cache = BoundedQueue::with_capacity(self.cache.capacity());
        self.visited.clear();
        self.expanded_rows.clear();
        self.stats = SearchStats::default();
    }

    fn check_candidates(&self, candidates: &[SlotIndex]) -> Result<()> {
        if candidates.is_empty() {
            return Err(PlacementError::InvalidArgument(
                "candidate list is empty".to_string(),
            ));
        }
        match candidates.iter().find(|&&c| c >= self.graph.num_slots()) {
            Some(&bad) => Err(PlacementError::slot_out_of_range(bad, self.graph.num_slots())),
            None => Ok(()),
        }
    }

    /// Drains the cache and expands every record in it.
    fn expand_cached(&mut self) -> Result<Expansion> {
        let max_moves = self.graph.max_moves();
        let width = self.graph.entries_per_row();
        let cached: Vec<u32> = self.cache.drain().collect();

        let mut expandable = Vec::with_capacity(cached.len());
        for pos in cached {
            let node = self.node(pos)?;
            if node.depth + 1 > max_moves {
                continue;
            }
            if !self.expanded_rows.insert(node.slot / width) {
                continue;
            }
            expandable.push((pos, node));
        }

        if expandable.is_empty() {
            // Nothing left to grow once every queued record sits at the bound.
            if self.primary.iter().all(|&pos| {
                self.arena
                    .get(pos as usize)
                    .map_or(true, |n| n.depth + 1 > max_moves)
            }) {
                return Ok(Expansion::DepthExhausted);
            }
            return Ok(Expansion::Continue);
        }
        self.stats.rows_expanded += expandable.len();

        // Cheap pass: an alternate that is already free ends the search
        // without touching the frontier.
        let num_slots = self.graph.num_slots();
        for &(pos, node) in &expandable {
            for sibling in self.graph.row_of(node.slot) {
                let alternates = self.occupied_alternates(sibling)?;
                if let Some(&free) = alternates
                    .iter()
                    .find(|&&a| {
                        a < num_slots && !self.visited.contains(a) && !self.graph.is_occupied(a)
                    })
                {
                    let terminal = BfsNode {
                        slot: free,
                        depth: node.depth + 1,
                        parent: Some(node.slot),
                        parent_queue_position: pos,
                    };
                    return self.push_node(terminal).map(Expansion::Found);
                }
            }
        }

        for (pos, node) in expandable {
            for sibling in self.graph.row_of(node.slot) {
                for &alternate in self.occupied_alternates(sibling)? {
                    if alternate >= num_slots || !self.visited.insert(alternate) {
                        continue;
                    }
                    self.enqueue(BfsNode {
                        slot: alternate,
                        depth: node.depth + 1,
                        parent: Some(node.slot),
                        parent_queue_position: pos,
                    })?;
                }
            }
        }
        Ok(Expansion::Continue)
    }

    /// Alternates of the content stored in `slot`; empty slots have none.
    fn occupied_alternates(&self, slot: SlotIndex) -> Result<&'g [SlotIndex]> {
        let graph = self.graph;
        match graph.get(slot) {
            Some(state) if state.occupied => Ok(&state.alternates),
            Some(_) => Ok(&[]),
            None => {
                error!(slot, "BFS expanded a slot with no graph entry");
                Err(PlacementError::Unexpected(format!(
                    "slot {slot} has no graph entry"
                )))
            }
        }
    }

    /// Queues a record in the frontier, subject to its capacity.
    fn enqueue(&mut self, node: BfsNode) -> Result<bool> {
        let pos = self.next_position()?;
        if !self.primary.push(pos) {
            return Ok(false);
        }
        self.arena.push(node);
        self.stats.nodes_created += 1;
        Ok(true)
    }

    /// Stores a record in the arena without queueing it.
    fn push_node(&mut self, node: BfsNode) -> Result<u32> {
        let pos = self.next_position()?;
        self.arena.push(node);
        self.stats.nodes_created += 1;
        Ok(pos)
    }

    fn next_position(&self) -> Result<u32> {
        u32::try_from(self.arena.len()).map_err(|_| {
            PlacementError::Unexpected("BFS arena exceeded u32 positions".to_string())
        })
    }

    fn node(&self, pos: u32) -> Result<BfsNode> {
        self.arena.get(pos as usize).copied().ok_or_else(|| {
            error!(pos, arena = self.arena.len(), "BFS record position out of bounds");
            PlacementError::Unexpected(format!("no BFS record at queue position {pos}"))
        })
    }

    /// Walks parent links from `terminal` back to a root and builds the plan.
    fn reconstruct(&mut self, terminal: u32) -> Result<MoveList> {
        self.stats.dropped = self.primary.dropped();
        let bound = self.graph.max_moves() as usize + 1;

        let mut node = self.node(terminal)?;
        let mut path = Vec::with_capacity(node.depth as usize + 1);
        path.push(node.slot);
        while let Some(parent) = node.parent {
            path.push(parent);
            if path.len() > bound {
                error!(?path, "parent chain longer than the move budget");
                return Err(PlacementError::Unexpected(
                    "BFS parent chain exceeds the move budget".to_string(),
                ));
            }
            node = self.node(node.parent_queue_position)?;
        }
        debug_assert!(node.is_root());

        Ok(MoveList::from_path(&path))
    }
}

enum Expansion {
    Found(u32),
    DepthExhausted,
    Continue,
}

/// Finds a relocation plan that frees one of `candidates` in `graph`.
///
/// The graph is only read. See [`PathFinder::search`] for the result contract.
#[instrument(level = "debug", skip(graph), fields(max_moves = graph.max_moves()))]
pub fn find_path(graph: &PlacementGraph, candidates: &[SlotIndex]) -> Result<MoveList> {
    let mut finder = PathFinder::new(graph);
    let result = finder.search(candidates);
    let stats = finder.stats();
    match &result {
        Ok(plan) => debug!(
            moves = plan.relocations(),
            direct_hit = stats.direct_hit,
            nodes = stats.nodes_created,
            "cuckoo path found"
        ),
        Err(PlacementError::NoSpace { .. }) => debug!(
            nodes = stats.nodes_created,
            rows = stats.rows_expanded,
            dropped = stats.dropped,
            "no cuckoo path within budget"
        ),
        Err(_) => {}
    }
    result
}
