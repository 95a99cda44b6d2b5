//! Collection of `MAP` and `LINKS` snapshots from the live network.
//!
//! Whatever drives the IRC connection pushes the reply lines into a [`SnapshotSink`] as they
//! arrive, the matching [`Collection`] gathers them and completes once both listings have been
//! terminated by their end numeric. Only one collection may run at a time, a second attempt is
//! rejected outright rather than being interleaved with the first.

use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::Duration,
};

use tokio::{sync::mpsc, time::Instant};
use tracing::{debug, info};

use crate::{
    error::{AcquireError, Result},
    graph::Graph,
    resolver::Resolve,
    text::{graph_from_text_sources, LinkRecord},
};

const MAP: &str = "MAP";
const LINKS: &str = "LINKS";

/// A complete pair of `MAP` and `LINKS` listings.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Snapshot {
    pub map: Vec<String>,
    pub links: Vec<LinkRecord>,
}

impl Snapshot {
    /// Builds a graph from the snapshot, see [`graph_from_text_sources`].
    pub async fn build<R>(&self, resolver: &R, max_in_flight: usize) -> Result<Graph>
    where
        R: Resolve + ?Sized,
    {
        graph_from_text_sources(&self.map, &self.links, resolver, max_in_flight).await
    }
}

#[derive(Debug)]
enum Phase<T> {
    Item(T),
    End,
}

/// Allows a single snapshot collection at a time.
#[derive(Clone, Debug, Default)]
pub struct SnapshotGate {
    busy: Arc<AtomicBool>,
}

impl SnapshotGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a collection. The caller should send `MAP` and `LINKS` once the sink is wired to
    /// the connection.
    ///
    /// # Errors
    ///
    /// [`AcquireError::InProgress`] if another collection hasn't finished or been dropped yet.
    ///
    /// # Examples
    ///
    /// ```
    /// use hopgraph::acquire::SnapshotGate;
    /// use hopgraph::error::AcquireError;
    ///
    /// let gate = SnapshotGate::new();
    ///
    /// let first = gate.begin().unwrap();
    /// assert_eq!(gate.begin().err(), Some(AcquireError::InProgress));
    ///
    /// drop(first);
    /// assert!(gate.begin().is_ok());
    /// ```
    pub fn begin(&self) -> std::result::Result<(Collection, SnapshotSink), AcquireError> {
        self.busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| AcquireError::InProgress)?;

        let token = GateToken {
            busy: self.busy.clone(),
        };

        let (map_tx, map_rx) = mpsc::unbounded_channel();
        let (links_tx, links_rx) = mpsc::unbounded_channel();

        debug!("snapshot collection started");

        Ok((
            Collection {
                map_rx,
                links_rx,
                _token: token,
            },
            SnapshotSink { map_tx, links_tx },
        ))
    }

    /// Returns whether a collection is running.
    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }
}

/// Releases the gate when dropped.
#[derive(Debug)]
struct GateToken {
    busy: Arc<AtomicBool>,
}

impl Drop for GateToken {
    fn drop(&mut self) {
        self.busy.store(false, Ordering::Release);
    }
}

/// The receiving end of a collection.
#[derive(Debug)]
pub struct Collection {
    map_rx: mpsc::UnboundedReceiver<Phase<String>>,
    links_rx: mpsc::UnboundedReceiver<Phase<LinkRecord>>,
    _token: GateToken,
}

impl Collection {
    /// Waits for both listings to be complete, for at most `timeout`.
    ///
    /// # Errors
    ///
    /// [`AcquireError::Timeout`] if an end marker doesn't arrive in time,
    /// [`AcquireError::Interrupted`] if the sink is dropped before sending it.
    pub async fn collect(
        mut self,
        timeout: Duration,
    ) -> std::result::Result<Snapshot, AcquireError> {
        // Both listings buffer while the other one is drained, so a single deadline covers them.
        let deadline = Instant::now() + timeout;

        let map = tokio::time::timeout_at(deadline, drain(&mut self.map_rx, MAP))
            .await
            .map_err(|_| AcquireError::Timeout(MAP))??;

        let links = tokio::time::timeout_at(deadline, drain(&mut self.links_rx, LINKS))
            .await
            .map_err(|_| AcquireError::Timeout(LINKS))??;

        info!(
            map = map.len(),
            links = links.len(),
            "snapshot collection complete"
        );

        Ok(Snapshot { map, links })
    }
}

async fn drain<T>(
    rx: &mut mpsc::UnboundedReceiver<Phase<T>>,
    stream: &'static str,
) -> std::result::Result<Vec<T>, AcquireError> {
    let mut items = Vec::new();

    loop {
        match rx.recv().await {
            Some(Phase::Item(item)) => items.push(item),
            Some(Phase::End) => return Ok(items),
            None => return Err(AcquireError::Interrupted(stream)),
        }
    }
}

/// The sending end of a collection, fed by the connection handler.
///
/// Sends after the collection has given up are ignored.
#[derive(Clone, Debug)]
pub struct SnapshotSink {
    map_tx: mpsc::UnboundedSender<Phase<String>>,
    links_tx: mpsc::UnboundedSender<Phase<LinkRecord>>,
}

impl SnapshotSink {
    /// Records an `RPL_MAP` (006) line.
    pub fn map_line(&self, line: impl Into<String>) {
        let _ = self.map_tx.send(Phase::Item(line.into()));
    }

    /// Records `RPL_MAPEND` (007).
    pub fn end_of_map(&self) {
        let _ = self.map_tx.send(Phase::End);
    }

    /// Records an `RPL_LINKS` (364) reply.
    pub fn link(&self, record: LinkRecord) {
        let _ = self.links_tx.send(Phase::Item(record));
    }

    /// Records `RPL_ENDOFLINKS` (365).
    pub fn end_of_links(&self) {
        let _ = self.links_tx.send(Phase::End);
    }
}
