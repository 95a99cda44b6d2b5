//! Short-lived reuse of built graphs.
//!
//! Building a graph from the live network takes a round trip per command plus one per unknown
//! server, so queries arriving in quick succession share the last snapshot for a while.

use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use parking_lot::Mutex;
use tracing::trace;

use crate::graph::Graph;

/// Holds the most recent graph until it is older than the configured time-to-live.
#[derive(Debug)]
pub struct GraphCache {
    ttl: Duration,
    slot: Mutex<Option<(Instant, Arc<Graph>)>>,
}

impl GraphCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            slot: Mutex::new(None),
        }
    }

    /// Returns the cached graph if it is still fresh.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::time::Duration;
    ///
    /// use hopgraph::cache::GraphCache;
    /// use hopgraph::graph::GraphBuilder;
    ///
    /// let cache = GraphCache::new(Duration::from_secs(30));
    /// assert!(cache.get().is_none());
    ///
    /// let graph = cache.store(GraphBuilder::new().build());
    /// assert!(std::sync::Arc::ptr_eq(&graph, &cache.get().unwrap()));
    /// ```
    pub fn get(&self) -> Option<Arc<Graph>> {
        let mut slot = self.slot.lock();

        match slot.as_ref() {
            Some((built, graph)) if built.elapsed() < self.ttl => Some(graph.clone()),
            Some(_) => {
                trace!("cached graph expired");
                *slot = None;
                None
            }
            None => None,
        }
    }

    /// Replaces the cached graph, returning it shared.
    pub fn store(&self, graph: Graph) -> Arc<Graph> {
        let graph = Arc::new(graph);
        *self.slot.lock() = Some((Instant::now(), graph.clone()));

        graph
    }

    /// Drops the cached graph.
    pub fn invalidate(&self) {
        *self.slot.lock() = None;
    }
}
