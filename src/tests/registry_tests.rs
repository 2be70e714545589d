//! Tests for the table registry with several sessions sharing it.

use std::sync::Arc;
use std::thread;

use crate::data_structures::placement_graph::PlacementError;
use crate::data_structures::table_registry::TableRegistry;
use crate::simulation::candidate_slots;
use crate::tests::small_placement_config;

#[test]
fn test_tables_are_independent() {
    let registry = TableRegistry::new();
    let a = registry.create(0, small_placement_config()).unwrap();
    let b = registry.create(1, small_placement_config()).unwrap();

    a.lock().insert(5, &[6]).unwrap();
    assert!(a.lock().is_occupied(5));
    assert!(!b.lock().is_occupied(5));

    let mut ids = registry.ids();
    ids.sort_unstable();
    assert_eq!(ids, vec![0, 1]);
}

#[test]
fn test_concurrent_sessions_serialize_on_the_table_lock() {
    let registry = Arc::new(TableRegistry::new());
    let config = small_placement_config();
    registry.create(7, config.clone()).unwrap();

    let workers: Vec<_> = (0..4u64)
        .map(|worker| {
            let registry = Arc::clone(&registry);
            let config = config.clone();
            thread::spawn(move || {
                let mut stored = 0;
                for key in (worker * 100)..(worker * 100 + 10) {
                    let candidates = candidate_slots(&key, 2, &config);
                    let handle = registry.get(7).unwrap();
                    let mut graph = handle.lock();
                    match graph.find_path(&candidates) {
                        Ok(plan) => {
                            graph.begin_transaction().unwrap();
                            graph.execute_moves(&plan, &candidates, true).unwrap();
                            graph.commit().unwrap();
                            stored += 1;
                        }
                        Err(PlacementError::NoSpace { .. }) => {}
                        Err(e) => panic!("unexpected error: {e}"),
                    }
                }
                stored
            })
        })
        .collect();

    let stored: usize = workers.into_iter().map(|w| w.join().unwrap()).sum();
    let handle = registry.get(7).unwrap();
    let graph = handle.lock();
    assert_eq!(graph.occupied_count(), stored);
    assert!(!graph.in_transaction());
}

#[test]
fn test_id_can_be_reused_after_destroy() {
    let registry = TableRegistry::new();
    registry.create(2, small_placement_config()).unwrap();
    registry.get(2).unwrap().lock().insert(0, &[]).unwrap();
    registry.destroy(2).unwrap();

    let fresh = registry.create(2, small_placement_config()).unwrap();
    assert_eq!(fresh.lock().occupied_count(), 0);
}
