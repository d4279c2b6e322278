//! Round-robin decode dispatcher.
//!
//! ```text
//!  submit() ──Command──▶ ┌──────────────┐ ──WorkerMessage──▶ worker 0
//!                        │ control task │ ──WorkerMessage──▶ worker 1
//!  CancelSignal ─watch─▶ │ PendingTable │ ──WorkerMessage──▶ ...
//!                        │  RoundRobin  │ ◀──WorkerReply──── (all workers)
//!                        └──────┬───────┘
//!                               └──oneshot──▶ DecodeHandle
//! ```
//!
//! The control task is the only owner of the pending table and the
//! scheduler cursor, so no locking is involved. `submit` never blocks and
//! never fails; every outcome arrives through the returned [`DecodeHandle`].

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::error::DecodeError;
use crate::multiscale::AxisSlice;

use super::cancel::CancelSignal;
use super::decoder::SliceDecoder;
use super::pending::{DecodeOutcome, PendingRequest, PendingTable, ReplySender};
use super::protocol::{DecodeRequest, DecodedSlice, RequestId, WorkerMessage, WorkerReply};
use super::scheduler::RoundRobin;
use super::worker::WorkerHandle;

// =============================================================================
// Chunk descriptor
// =============================================================================

/// An addressable slice of a multiscale dataset, ready to decode.
#[derive(Debug, Clone, PartialEq)]
pub struct SliceChunk {
    /// Key the caller's cache stores the decoded result under
    pub cache_key: String,
    pub dataset_handle: String,
    pub level_index: usize,
    pub query: Vec<AxisSlice>,
}

impl SliceChunk {
    /// Build a chunk with a cache key derived from its address,
    /// e.g. `volume@2:5,0..128,64..192`.
    pub fn new(
        dataset_handle: impl Into<String>,
        level_index: usize,
        query: Vec<AxisSlice>,
    ) -> Self {
        let dataset_handle = dataset_handle.into();
        let terms: Vec<String> = query
            .iter()
            .map(|term| match term {
                AxisSlice::Index(i) => i.to_string(),
                AxisSlice::Range { start, end } => format!("{}..{}", start, end),
            })
            .collect();
        let cache_key = format!("{}@{}:{}", dataset_handle, level_index, terms.join(","));

        Self {
            cache_key,
            dataset_handle,
            level_index,
            query,
        }
    }

    pub fn with_cache_key(mut self, cache_key: impl Into<String>) -> Self {
        self.cache_key = cache_key.into();
        self
    }
}

// =============================================================================
// Public handle
// =============================================================================

enum Command {
    Submit {
        request: DecodeRequest,
        cache_key: String,
        reply: ReplySender,
        cancel: Option<CancelSignal>,
    },
    Cancel(RequestId),
    PendingCount(oneshot::Sender<usize>),
    Shutdown,
}

/// Owns a fixed pool of decode workers.
///
/// Must be created inside a Tokio runtime. Dropping the dispatcher without
/// calling [`shutdown`](Self::shutdown) stops the pool in the background;
/// outstanding handles resolve with [`DecodeError::Shutdown`].
pub struct DecodeDispatcher {
    commands: mpsc::UnboundedSender<Command>,
    control: JoinHandle<()>,
    workers: usize,
}

impl DecodeDispatcher {
    /// Start `workers` decode workers (at least one) sharing `decoder`.
    pub fn new<D: SliceDecoder>(decoder: D, workers: usize) -> Self {
        Self::with_shared_decoder(Arc::new(decoder), workers)
    }

    pub fn with_shared_decoder(decoder: Arc<dyn SliceDecoder>, workers: usize) -> Self {
        let workers = workers.max(1);
        let (replies_tx, replies_rx) = mpsc::unbounded_channel();
        let handles = (0..workers)
            .map(|index| WorkerHandle::spawn(index, Arc::clone(&decoder), replies_tx.clone()))
            .collect();
        drop(replies_tx);

        let (commands, commands_rx) = mpsc::unbounded_channel();
        let control = ControlLoop {
            pending: PendingTable::new(),
            scheduler: RoundRobin::new(workers),
            workers: handles,
            commands: commands.downgrade(),
        };
        let control = tokio::spawn(control.run(commands_rx, replies_rx));

        info!(workers, "Decode dispatcher started");
        Self {
            commands,
            control,
            workers,
        }
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Queue a chunk for decoding.
    ///
    /// Returns immediately. If `cancel` fires before a reply arrives the
    /// handle resolves with [`DecodeError::Cancelled`] and the worker is told
    /// to drop the request.
    pub fn submit(&self, chunk: SliceChunk, cancel: Option<CancelSignal>) -> DecodeHandle {
        let id = RequestId::next();
        let (reply, rx) = oneshot::channel();
        let request = DecodeRequest {
            id,
            dataset_handle: chunk.dataset_handle,
            query: chunk.query,
            level_index: chunk.level_index,
        };

        // A closed control task drops `reply`, which the handle reports as Shutdown.
        let _ = self.commands.send(Command::Submit {
            request,
            cache_key: chunk.cache_key.clone(),
            reply,
            cancel,
        });

        DecodeHandle {
            id,
            cache_key: chunk.cache_key,
            rx,
        }
    }

    /// Number of dispatched requests still awaiting a reply.
    pub async fn pending_count(&self) -> usize {
        let (tx, rx) = oneshot::channel();
        if self.commands.send(Command::PendingCount(tx)).is_err() {
            return 0;
        }
        rx.await.unwrap_or(0)
    }

    /// Fail outstanding requests with [`DecodeError::Shutdown`] and stop every worker.
    pub async fn shutdown(self) {
        let _ = self.commands.send(Command::Shutdown);
        if let Err(e) = self.control.await {
            warn!("Dispatcher control task ended abnormally: {}", e);
        }
    }
}

/// Resolves once with the decoded slice or the request's terminal error.
#[derive(Debug)]
pub struct DecodeHandle {
    id: RequestId,
    cache_key: String,
    rx: oneshot::Receiver<DecodeOutcome>,
}

impl DecodeHandle {
    pub fn id(&self) -> RequestId {
        self.id
    }

    pub fn cache_key(&self) -> &str {
        &self.cache_key
    }
}

impl Future for DecodeHandle {
    type Output = Result<DecodedSlice, DecodeError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.rx)
            .poll(cx)
            .map(|received| received.unwrap_or(Err(DecodeError::Shutdown)))
    }
}

// =============================================================================
// Control task
// =============================================================================

struct ControlLoop {
    pending: PendingTable,
    scheduler: RoundRobin,
    workers: Vec<WorkerHandle>,
    /// Used by cancel watchers; weak so it never keeps the loop alive
    commands: mpsc::WeakUnboundedSender<Command>,
}

impl ControlLoop {
    async fn run(
        mut self,
        mut commands: mpsc::UnboundedReceiver<Command>,
        mut replies: mpsc::UnboundedReceiver<WorkerReply>,
    ) {
        loop {
            tokio::select! {
                command = commands.recv() => match command {
                    Some(Command::Submit { request, cache_key, reply, cancel }) => {
                        self.dispatch(request, cache_key, reply, cancel);
                    }
                    Some(Command::Cancel(id)) => self.cancel(id),
                    Some(Command::PendingCount(tx)) => {
                        let _ = tx.send(self.pending.len());
                    }
                    Some(Command::Shutdown) | None => break,
                },
                Some(reply) = replies.recv() => self.on_reply(reply),
            }
        }

        let outstanding = self.pending.len();
        self.pending.fail_all(DecodeError::Shutdown);
        for worker in self.workers {
            worker.join().await;
        }
        info!(outstanding, "Decode dispatcher stopped");
    }

    fn dispatch(
        &mut self,
        request: DecodeRequest,
        cache_key: String,
        reply: ReplySender,
        cancel: Option<CancelSignal>,
    ) {
        let id = request.id;
        if cancel.as_ref().is_some_and(CancelSignal::is_cancelled) {
            debug!(%id, cache_key = %cache_key, "Request cancelled before dispatch");
            let _ = reply.send(Err(DecodeError::Cancelled { id }));
            return;
        }

        let worker = self.scheduler.next_slot();
        let watcher = cancel.map(|signal| {
            let commands = self.commands.clone();
            tokio::spawn(async move {
                signal.cancelled().await;
                if let Some(commands) = commands.upgrade() {
                    let _ = commands.send(Command::Cancel(id));
                }
            })
        });
        let entry = PendingRequest::new(id, cache_key, worker, reply, watcher);
        self.pending.insert(entry);

        if !self.workers[worker].send(WorkerMessage::DecodeSlice(request)) {
            warn!(worker, %id, "Worker inbox closed, failing request");
            self.pending.fail(id, DecodeError::WorkerUnavailable { worker });
            return;
        }
        debug!(%id, worker, "Dispatched decode request");
    }

    fn cancel(&mut self, id: RequestId) {
        match self.pending.abandon(id) {
            Some(worker) => {
                // Best effort: the worker may already be replying.
                self.workers[worker].send(WorkerMessage::Cancel { id });
                debug!(%id, worker, "Request abandoned");
            }
            None => debug!(%id, "Cancel for settled request ignored"),
        }
    }

    fn on_reply(&mut self, reply: WorkerReply) {
        let id = reply.id();
        match self.pending.fulfill(reply) {
            Some(cache_key) => debug!(%id, cache_key = %cache_key, "Request settled"),
            None => debug!(%id, "Discarding reply for unknown request"),
        }
    }
}
