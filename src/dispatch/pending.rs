//! Pending-request table owned by the dispatcher's control task.
//!
//! Each entry holds a single-assignment reply channel. An entry leaves the
//! table exactly once, by reply, cancellation or shutdown, and the caller's
//! channel is settled in the same step. Replies for ids no longer in the
//! table are dropped.

use std::collections::HashMap;

use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use crate::error::DecodeError;

use super::protocol::{DecodedSlice, RequestId, WorkerReply};

pub(crate) type DecodeOutcome = Result<DecodedSlice, DecodeError>;
pub(crate) type ReplySender = oneshot::Sender<DecodeOutcome>;

/// A dispatched request awaiting its reply.
pub(crate) struct PendingRequest {
    pub id: RequestId,
    pub cache_key: String,
    pub worker: usize,
    reply: ReplySender,
    /// Task forwarding the caller's cancel signal, aborted once settled
    watcher: Option<JoinHandle<()>>,
}

impl PendingRequest {
    pub fn new(
        id: RequestId,
        cache_key: String,
        worker: usize,
        reply: ReplySender,
        watcher: Option<JoinHandle<()>>,
    ) -> Self {
        Self {
            id,
            cache_key,
            worker,
            reply,
            watcher,
        }
    }

    fn settle(self, outcome: DecodeOutcome) {
        if let Some(watcher) = self.watcher {
            watcher.abort();
        }
        // The caller may have dropped its handle; nothing to deliver then.
        let _ = self.reply.send(outcome);
    }
}

#[derive(Default)]
pub(crate) struct PendingTable {
    entries: HashMap<RequestId, PendingRequest>,
}

impl PendingTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[cfg(test)]
    pub fn contains(&self, id: RequestId) -> bool {
        self.entries.contains_key(&id)
    }

    pub fn insert(&mut self, request: PendingRequest) {
        self.entries.insert(request.id, request);
    }

    /// Route a worker reply to its pending entry.
    ///
    /// Returns the settled entry's cache key, or `None` when no entry with
    /// the reply's id is pending.
    pub fn fulfill(&mut self, reply: WorkerReply) -> Option<String> {
        let entry = self.entries.remove(&reply.id())?;
        let cache_key = entry.cache_key.clone();
        let outcome = match reply {
            WorkerReply::SliceResult { shape, data, .. } => Ok(DecodedSlice { shape, data }),
            WorkerReply::SliceError { id, reason } => Err(DecodeError::Failed { id, reason }),
        };
        entry.settle(outcome);
        Some(cache_key)
    }

    /// Settle an entry as cancelled. Returns the worker it was assigned to.
    pub fn abandon(&mut self, id: RequestId) -> Option<usize> {
        let entry = self.entries.remove(&id)?;
        let worker = entry.worker;
        entry.settle(Err(DecodeError::Cancelled { id }));
        Some(worker)
    }

    /// Settle an entry with an arbitrary error.
    pub fn fail(&mut self, id: RequestId, error: DecodeError) -> bool {
        match self.entries.remove(&id) {
            Some(entry) => {
                entry.settle(Err(error));
                true
            }
            None => false,
        }
    }

    /// Settle every outstanding entry with `error`.
    pub fn fail_all(&mut self, error: DecodeError) {
        for (_, entry) in self.entries.drain() {
            entry.settle(Err(error.clone()));
        }
    }
}
