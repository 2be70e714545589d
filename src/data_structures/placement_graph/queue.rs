// Copyright (c) 2025 EM Placement Authors
//
// Licensed under dual license:
// - MIT License (LICENSE-MIT or https://opensource.org/licenses/MIT)
// - Apache License, Version 2.0 (LICENSE-APACHE or https://www.apache.org/licenses/LICENSE-2.0)

//! Bounded BFS queues and the visited set used by the path finder.
//!
//! Both queues are soft-limited: once full they silently drop further
//! insertions. Running out of queue space narrows the search, it never fails it.

use std::collections::VecDeque;

use fnv::FnvBuildHasher;
use hashbrown::HashSet;

use crate::data_structures::placement_graph::slot::SlotIndex;

/// One BFS record. Records are kept in a per-search arena so that parent
/// links survive after the record has been dequeued.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BfsNode {
    /// Slot this record refers to
    pub slot: SlotIndex,

    /// Number of moves needed to vacate this slot's predecessor chain
    pub depth: u32,

    /// Slot whose content would move into `slot`; `None` for a root
    pub parent: Option<SlotIndex>,

    /// Arena position of the record that expanded into this one
    pub parent_queue_position: u32,
}

impl BfsNode {
    /// Creates a depth-zero record for a candidate slot.
    pub fn root(slot: SlotIndex) -> Self {
        Self {
            slot,
            depth: 0,
            parent: None,
            parent_queue_position: 0,
        }
    }

    /// Returns `true` if this record is a BFS root.
    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }
}

/// A fixed-capacity FIFO ring buffer.
#[derive(Debug, Clone)]
pub struct BoundedQueue<T> {
    items: VecDeque<T>,
    capacity: usize,
    dropped: usize,
}

impl<T> BoundedQueue<T> {
    /// Creates an empty queue holding at most `capacity` items.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            items: VecDeque::with_capacity(capacity),
            capacity,
            dropped: 0,
        }
    }

    /// Appends an item.
    ///
    /// # Returns
    ///
    /// * `true` if the item was queued
    /// * `false` if the queue is full and the item was dropped
    pub fn push(&mut self, item: T) -> bool {
        if self.is_full() {
            self.dropped += 1;
            return false;
        }
        self.items.push_back(item);
        true
    }

    /// Removes the oldest item.
    pub fn pop(&mut self) -> Option<T> {
        self.items.pop_front()
    }

    /// Returns the number of queued items.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns whether the queue is empty.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Returns whether the queue is at capacity.
    pub fn is_full(&self) -> bool {
        self.items.len() >= self.capacity
    }

    /// Maximum number of items the queue holds.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of insertions rejected because the queue was full.
    pub fn dropped(&self) -> usize {
        self.dropped
    }

    /// Iterates over queued items from oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.items.iter()
    }

    /// Removes every item, oldest first.
    pub fn drain(&mut self) -> impl Iterator<Item = T> + '_ {
        self.items.drain(..)
    }

    /// Removes every item without yielding them.
    pub fn clear(&mut self) {
        self.items.clear();
    }
}

/// Sparse set of slot indices seen during one search.
#[derive(Debug, Clone, Default)]
pub struct VisitedSet {
    seen: HashSet<SlotIndex, FnvBuildHasher>,
}

impl VisitedSet {
    /// Creates an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks a slot as seen.
    ///
    /// # Returns
    ///
    /// `true` if the slot had not been seen before.
    pub fn insert(&mut self, slot: SlotIndex) -> bool {
        self.seen.insert(slot)
    }

    /// Returns whether the slot has been seen.
    pub fn contains(&self, slot: SlotIndex) -> bool {
        self.seen.contains(&slot)
    }

    /// Number of distinct slots seen.
    pub fn len(&self) -> usize {
        self.seen.len()
    }

    /// Returns whether no slot has been seen.
    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }

    /// Releases every entry at once.
    pub fn clear(&mut self) {
        self.seen.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_queue_is_fifo() {
        let mut queue = BoundedQueue::with_capacity(4);
        for i in 0..3 {
            assert!(queue.push(i));
        }
        assert_eq!(queue.pop(), Some(0));
        assert_eq!(queue.pop(), Some(1));
        assert_eq!(queue.pop(), Some(2));
        assert_eq!(queue.pop(), None);
    }

    #[test]
    fn test_queue_drops_when_full() {
        let mut queue = BoundedQueue::with_capacity(2);
        assert!(queue.push("a"));
        assert!(queue.push("b"));
        assert!(queue.is_full());

        // Soft limit: the item is dropped and counted, nothing else changes
        assert!(!queue.push("c"));
        assert_eq!(queue.len(), 2);
        assert_eq!(queue.dropped(), 1);

        // Room again after a pop
        queue.pop();
        assert!(queue.push("d"));
        assert_eq!(queue.iter().copied().collect::<Vec<_>>(), vec!["b", "d"]);
    }

    #[test]
    fn test_queue_drain_empties() {
        let mut queue = BoundedQueue::with_capacity(3);
        queue.push(1);
        queue.push(2);
        assert_eq!(queue.drain().collect::<Vec<_>>(), vec![1, 2]);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_visited_set() {
        let mut visited = VisitedSet::new();
        assert!(visited.insert(1_000_000));
        assert!(!visited.insert(1_000_000));
        assert!(visited.contains(1_000_000));
        assert!(!visited.contains(7));
        assert_eq!(visited.len(), 1);

        visited.clear();
        assert!(visited.is_empty());
    }

    #[test]
    fn test_root_node() {
        let node = BfsNode::root(3);
        assert!(node.is_root());
        assert_eq!(node.depth, 0);
    }
}
