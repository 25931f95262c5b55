//! Change bus for live queries
//!
//! Every mutation publishes a `ChangeEvent` on a broadcast channel.
//! Subscribers hold a `LiveQuery` scoped to the collections their query
//! reads and re-run the query whenever a relevant event arrives. A lagged
//! receiver (ring buffer overrun) is treated as "something changed": the
//! subscriber re-runs unconditionally rather than replaying the backlog.

use tokio::sync::broadcast;
use tracing::trace;

/// Capacity of the broadcast ring buffer per bus
const CHANGE_BUS_CAPACITY: usize = 256;

/// What happened to a record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Added,
    Updated,
    Deleted,
    /// The whole collection was cleared
    Cleared,
}

/// One mutation, as seen by subscribers
#[derive(Debug, Clone, PartialEq)]
pub struct ChangeEvent {
    pub collection: &'static str,
    pub kind: ChangeKind,
    /// Key of the affected record; `None` for collection-wide events
    pub key: Option<String>,
}

/// Result of polling a subscription
#[derive(Debug, Clone, PartialEq)]
pub enum FeedPoll {
    Event(ChangeEvent),
    /// The receiver fell behind and `n` events were dropped
    Lagged(u64),
    Empty,
    Closed,
}

/// Publish side of the change bus; owned by the database handle
#[derive(Debug)]
pub struct ChangeBus {
    tx: broadcast::Sender<ChangeEvent>,
}

impl ChangeBus {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(CHANGE_BUS_CAPACITY);
        Self { tx }
    }

    /// Publish an event. Dropped silently when nobody is subscribed.
    pub fn publish(&self, event: ChangeEvent) {
        trace!(collection = event.collection, kind = ?event.kind, "change published");
        let _ = self.tx.send(event);
    }

    pub fn subscribe(&self, collections: Vec<&'static str>) -> LiveQuery {
        LiveQuery {
            rx: self.tx.subscribe(),
            collections,
        }
    }
}

impl Default for ChangeBus {
    fn default() -> Self {
        Self::new()
    }
}

/// A subscription filtered to the collections a query reads
#[derive(Debug)]
pub struct LiveQuery {
    rx: broadcast::Receiver<ChangeEvent>,
    collections: Vec<&'static str>,
}

impl LiveQuery {
    fn is_relevant(&self, event: &ChangeEvent) -> bool {
        self.collections.is_empty() || self.collections.contains(&event.collection)
    }

    /// Non-blocking poll for the next relevant event; events on other
    /// collections are skipped.
    pub fn poll(&mut self) -> FeedPoll {
        loop {
            match self.rx.try_recv() {
                Ok(event) => {
                    if self.is_relevant(&event) {
                        return FeedPoll::Event(event);
                    }
                }
                Err(broadcast::error::TryRecvError::Lagged(n)) => return FeedPoll::Lagged(n),
                Err(broadcast::error::TryRecvError::Empty) => return FeedPoll::Empty,
                Err(broadcast::error::TryRecvError::Closed) => return FeedPoll::Closed,
            }
        }
    }

    /// Drain everything pending and report whether the query must re-run.
    ///
    /// True when any relevant event arrived, or when the subscription
    /// lagged (dropped events might have been relevant).
    pub fn needs_rerun(&mut self) -> bool {
        let mut rerun = false;
        loop {
            match self.poll() {
                FeedPoll::Event(_) | FeedPoll::Lagged(_) => rerun = true,
                FeedPoll::Empty | FeedPoll::Closed => return rerun,
            }
        }
    }

    /// Wait for the next relevant event. Returns `false` once the bus is
    /// gone (the database handle was dropped).
    pub async fn changed(&mut self) -> bool {
        loop {
            match self.rx.recv().await {
                Ok(event) => {
                    if self.is_relevant(&event) {
                        return true;
                    }
                }
                Err(broadcast::error::RecvError::Lagged(_)) => return true,
                Err(broadcast::error::RecvError::Closed) => return false,
            }
        }
    }
}
