// Copyright (c) 2025 EM Placement Authors
//
// Licensed under dual license:
// - MIT License (LICENSE-MIT or https://opensource.org/licenses/MIT)
// - Apache License, Version 2.0 (LICENSE-APACHE or https://www.apache.org/licenses/LICENSE-2.0)

//! Deterministic candidate generation for synthetic keys.
//!
//! Real tables get candidate locations from their hardware hash units. The
//! simulator only needs something stable and reasonably spread, so each way is
//! an FNV-1a hash of the key salted with a per-way seed.

use std::hash::{Hash, Hasher};

use fnv::FnvHasher;

use crate::data_structures::placement_graph::{PlacementGraphConfig, SlotIndex};

/// Maximum number of hash ways the generator supports.
pub const MAX_WAYS: usize = 8;

/// Per-way salts.
#[allow(clippy::unreadable_literal)]
const WAY_SEEDS: [u64; MAX_WAYS] = [
    0x9e3779b97f4a7c15, 0xbf58476d1ce4e5b9, 0x94d049bb133111eb, 0xd6e8feb86659fd93,
    0xa0761d6478bd642f, 0xe7037ed1a0b428db, 0x8ebc6af09c88c6e3, 0x589965cc75374cc3,
];

/// Hashes `key` salted with `seed`.
pub fn hash_with_seed<K: Hash + ?Sized>(key: &K, seed: u64) -> u64 {
    let mut hasher = FnvHasher::default();
    seed.hash(&mut hasher);
    key.hash(&mut hasher);
    hasher.finish()
}

/// Candidate rows for `key`, one per way, duplicates removed.
pub fn candidate_rows<K: Hash + ?Sized>(key: &K, ways: usize, num_rows: usize) -> Vec<usize> {
    let mut rows = Vec::with_capacity(ways);
    for seed in WAY_SEEDS.iter().take(ways.clamp(1, MAX_WAYS)) {
        let row = (hash_with_seed(key, *seed) % num_rows as u64) as usize;
        if !rows.contains(&row) {
            rows.push(row);
        }
    }
    rows
}

/// Candidate slots for `key`: every slot of every candidate row.
pub fn candidate_slots<K: Hash + ?Sized>(
    key: &K,
    ways: usize,
    config: &PlacementGraphConfig,
) -> Vec<SlotIndex> {
    let width = config.entries_per_row;
    candidate_rows(key, ways, config.num_rows())
        .into_iter()
        .flat_map(|row| {
            let start = row * width;
            start..(start + width).min(config.num_slots)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_is_stable_and_seeded() {
        assert_eq!(hash_with_seed(&42u64, 1), hash_with_seed(&42u64, 1));
        assert_ne!(hash_with_seed(&42u64, 1), hash_with_seed(&42u64, 2));
    }

    #[test]
    fn test_rows_are_in_range_and_distinct() {
        for key in 0u64..200 {
            let rows = candidate_rows(&key, 4, 10);
            assert!(!rows.is_empty() && rows.len() <= 4);
            assert!(rows.iter().all(|&r| r < 10));
            let mut sorted = rows.clone();
            sorted.sort_unstable();
            sorted.dedup();
            assert_eq!(sorted.len(), rows.len());
        }
    }

    #[test]
    fn test_ways_are_clamped() {
        assert_eq!(candidate_rows(&7u64, 0, 1_000).len(), 1);
        assert!(candidate_rows(&7u64, 100, 1_000).len() <= MAX_WAYS);
    }

    #[test]
    fn test_slots_cover_whole_rows() {
        let config = PlacementGraphConfig::new()
            .with_num_slots(10)
            .with_entries_per_row(4);
        for key in 0u64..50 {
            let slots = candidate_slots(&key, 2, &config);
            assert!(slots.iter().all(|&s| s < 10));
            for &slot in &slots {
                let row_start = slot / 4 * 4;
                for sibling in row_start..(row_start + 4).min(10) {
                    assert!(slots.contains(&sibling));
                }
            }
        }
    }
}
