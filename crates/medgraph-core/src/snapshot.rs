//! # Snapshot Publication
//!
//! A [`SnapshotCell`] hands out the current graph to concurrent readers and
//! lets a rebuild replace it in one step.
//!
//! Readers clone an `Arc<Graph>` and keep it for as long as they need; a
//! publish never changes a graph a reader already holds. The lock guards
//! only the pointer swap, never a build.

use crate::Graph;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

/// Shared holder of the current graph snapshot.
#[derive(Debug)]
pub struct SnapshotCell {
    current: RwLock<Arc<Graph>>,
    revision: AtomicU64,
}

impl SnapshotCell {
    /// Create a cell holding `graph` as revision 1.
    #[must_use]
    pub fn new(graph: Graph) -> Self {
        Self {
            current: RwLock::new(Arc::new(graph)),
            revision: AtomicU64::new(1),
        }
    }

    /// The current snapshot.
    #[must_use]
    pub fn load(&self) -> Arc<Graph> {
        // The guarded value is a pointer; a panicking writer cannot leave it
        // half-written, so a poisoned lock is still safe to read.
        let guard = self.current.read().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&guard)
    }

    /// Replace the current snapshot and return the new revision.
    pub fn publish(&self, graph: Graph) -> u64 {
        let next = Arc::new(graph);
        let (nodes, edges) = (next.node_count(), next.edge_count());

        let mut guard = self.current.write().unwrap_or_else(PoisonError::into_inner);
        *guard = next;
        let revision = self.revision.fetch_add(1, Ordering::AcqRel) + 1;
        drop(guard);

        tracing::info!(revision, nodes, edges, "published graph snapshot");
        revision
    }

    /// Revision of the current snapshot, starting at 1.
    #[must_use]
    pub fn revision(&self) -> u64 {
        self.revision.load(Ordering::Acquire)
    }
}

impl Default for SnapshotCell {
    fn default() -> Self {
        Self::new(Graph::new())
    }
}

// =============================================================================
// TESTS
// =============================================================================
