//! Decode worker tasks.
//!
//! Each worker owns an inbox and runs one decode at a time. Between decodes
//! it drains the inbox into a local backlog so that cancel notices can drop
//! requests that have not started yet. While a decode runs, the inbox is
//! still watched: a cancel for the running request aborts the decode task.
//! Decodes run on their own task, so a panicking decoder fails its request
//! and leaves the worker serving.

use std::collections::VecDeque;
use std::sync::Arc;

use tokio::sync::mpsc::{self, error::TryRecvError};
use tokio::task::{JoinError, JoinHandle};
use tracing::{debug, warn};

use crate::error::SliceError;

use super::decoder::SliceDecoder;
use super::protocol::{DecodeRequest, DecodedSlice, RequestId, WorkerMessage, WorkerReply};

pub(crate) struct WorkerHandle {
    index: usize,
    inbox: mpsc::UnboundedSender<WorkerMessage>,
    task: JoinHandle<()>,
}

impl WorkerHandle {
    pub fn spawn(
        index: usize,
        decoder: Arc<dyn SliceDecoder>,
        replies: mpsc::UnboundedSender<WorkerReply>,
    ) -> Self {
        let (inbox, rx) = mpsc::unbounded_channel();
        let task = tokio::spawn(run(index, decoder, rx, replies));
        Self { index, inbox, task }
    }

    /// Post a message. Returns `false` if the worker has exited.
    pub fn send(&self, message: WorkerMessage) -> bool {
        self.inbox.send(message).is_ok()
    }

    /// Close the inbox and wait for the task to finish.
    pub async fn join(self) {
        drop(self.inbox);
        if let Err(e) = self.task.await {
            warn!(worker = self.index, "Worker task ended abnormally: {}", e);
        }
    }
}

/// Apply a message that arrived while the worker was not decoding it.
fn absorb(backlog: &mut VecDeque<DecodeRequest>, message: WorkerMessage) {
    match message {
        WorkerMessage::DecodeSlice(request) => backlog.push_back(request),
        WorkerMessage::Cancel { id } => backlog.retain(|queued| queued.id != id),
    }
}

/// Turn a finished decode task into the reply for `id`. A panicking decoder
/// fails only its own request.
fn into_reply(
    index: usize,
    id: RequestId,
    joined: Result<Result<DecodedSlice, SliceError>, JoinError>,
) -> WorkerReply {
    let failure = match joined {
        Ok(Ok(slice)) => {
            return WorkerReply::SliceResult {
                id,
                shape: slice.shape,
                data: slice.data,
            };
        }
        Ok(Err(e)) => e.to_string(),
        Err(e) => format!("Decoder task failed: {}", e),
    };
    warn!(worker = index, %id, "Slice decode failed: {}", failure);
    WorkerReply::SliceError {
        id,
        reason: failure,
    }
}

enum Step {
    Finished(WorkerReply),
    Cancelled,
    Closed,
}

async fn run(
    index: usize,
    decoder: Arc<dyn SliceDecoder>,
    mut inbox: mpsc::UnboundedReceiver<WorkerMessage>,
    replies: mpsc::UnboundedSender<WorkerReply>,
) {
    let mut backlog = VecDeque::new();

    loop {
        loop {
            match inbox.try_recv() {
                Ok(message) => absorb(&mut backlog, message),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => return,
            }
        }

        let Some(request) = backlog.pop_front() else {
            match inbox.recv().await {
                Some(message) => {
                    absorb(&mut backlog, message);
                    continue;
                }
                None => return,
            }
        };

        let id = request.id;
        let step = {
            let mut decode = tokio::spawn({
                let decoder = Arc::clone(&decoder);
                async move { decoder.decode(&request).await }
            });
            loop {
                tokio::select! {
                    joined = &mut decode => {
                        break Step::Finished(into_reply(index, id, joined));
                    }
                    message = inbox.recv() => match message {
                        Some(WorkerMessage::Cancel { id: cancelled }) if cancelled == id => {
                            decode.abort();
                            break Step::Cancelled;
                        }
                        Some(other) => absorb(&mut backlog, other),
                        None => {
                            decode.abort();
                            break Step::Closed;
                        }
                    },
                }
            }
        };

        match step {
            Step::Finished(reply) => {
                if replies.send(reply).is_err() {
                    return;
                }
            }
            Step::Cancelled => debug!(worker = index, %id, "Dropped in-flight decode"),
            Step::Closed => return,
        }
    }
}
