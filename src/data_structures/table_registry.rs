// Copyright (c) 2025 EM Placement Authors
//
// Licensed under dual license:
// - MIT License (LICENSE-MIT or https://opensource.org/licenses/MIT)
// - Apache License, Version 2.0 (LICENSE-APACHE or https://www.apache.org/licenses/LICENSE-2.0)

//! Registry of placement graphs, one per exact-match table.
//!
//! Graphs are created and destroyed explicitly and handed out behind a mutex.
//! Holding the lock is the single-writer discipline the graph relies on: a
//! session keeps it for the whole search, execute, and commit or abort
//! sequence of one insertion.

use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use parking_lot::Mutex;
use tracing::{debug, info};

use crate::data_structures::placement_graph::{
    PlacementError, PlacementGraph, PlacementGraphConfig, Result,
};

/// Identifier of one table, for example a device and table number pair
/// flattened by the caller.
pub type TableId = u32;

/// Shared handle to a registered graph.
pub type GraphHandle = Arc<Mutex<PlacementGraph>>;

/// Owns the placement graph of every live table.
#[derive(Debug, Default)]
pub struct TableRegistry {
    tables: DashMap<TableId, GraphHandle>,
}

impl TableRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds and registers a graph for `id`.
    ///
    /// # Returns
    ///
    /// The new handle, or `InvalidArgument` if `id` is already registered or
    /// the configuration is unusable.
    pub fn create(&self, id: TableId, config: PlacementGraphConfig) -> Result<GraphHandle> {
        match self.tables.entry(id) {
            Entry::Occupied(_) => Err(PlacementError::InvalidArgument(format!(
                "table {id} is already registered"
            ))),
            Entry::Vacant(entry) => {
                let handle = Arc::new(Mutex::new(PlacementGraph::new(config)?));
                entry.insert(Arc::clone(&handle));
                info!(table = id, "placement table registered");
                Ok(handle)
            }
        }
    }

    /// Returns the handle for `id`, if registered.
    pub fn get(&self, id: TableId) -> Option<GraphHandle> {
        self.tables.get(&id).map(|entry| Arc::clone(entry.value()))
    }

    /// Unregisters `id` and releases its transaction bookkeeping.
    ///
    /// Outstanding handles keep the slot storage alive until they are dropped,
    /// but any open transaction is discarded here.
    pub fn destroy(&self, id: TableId) -> Result<()> {
        let (_, handle) = self.tables.remove(&id).ok_or_else(|| {
            PlacementError::InvalidArgument(format!("table {id} is not registered"))
        })?;
        let residual = handle.lock().teardown();
        debug!(table = id, residual, "placement table destroyed");
        Ok(())
    }

    /// Number of registered tables.
    pub fn len(&self) -> usize {
        self.tables.len()
    }

    /// Returns whether no table is registered.
    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// Identifiers of every registered table, in no particular order.
    pub fn ids(&self) -> Vec<TableId> {
        self.tables.iter().map(|entry| *entry.key()).collect()
    }
}
