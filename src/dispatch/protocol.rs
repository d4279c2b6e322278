//! Messages exchanged between the dispatcher and its decode workers.
//!
//! All messages are one-way. Correlation is entirely by [`RequestId`]:
//!
//! ```text
//! dispatcher -> worker   {"kind": "decode-slice", "id": "7", "datasetHandle": ..., "query": [...], "levelIndex": 2}
//! dispatcher -> worker   {"kind": "cancel", "id": "7"}
//! worker -> dispatcher   {"kind": "slice-result", "id": "7", "shape": [256, 256], "data": [...]}
//! worker -> dispatcher   {"kind": "slice-error", "id": "7", "reason": "..."}
//! ```

use std::fmt;
use std::num::ParseIntError;
use std::sync::atomic::{AtomicU64, Ordering};

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::multiscale::AxisSlice;

/// Process-unique correlation id. Serialized as a decimal string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct RequestId(u64);

static NEXT_REQUEST_ID: AtomicU64 = AtomicU64::new(1);

impl RequestId {
    /// Allocate a fresh id, unique for the lifetime of the process.
    pub fn next() -> Self {
        Self(NEXT_REQUEST_ID.fetch_add(1, Ordering::Relaxed))
    }

    #[cfg(test)]
    pub(crate) fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<RequestId> for String {
    fn from(id: RequestId) -> Self {
        id.to_string()
    }
}

impl TryFrom<String> for RequestId {
    type Error = ParseIntError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse().map(RequestId)
    }
}

/// Work order sent to a decode worker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DecodeRequest {
    pub id: RequestId,
    pub dataset_handle: String,
    pub query: Vec<AxisSlice>,
    pub level_index: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum WorkerMessage {
    DecodeSlice(DecodeRequest),
    Cancel { id: RequestId },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum WorkerReply {
    SliceResult {
        id: RequestId,
        shape: Vec<u64>,
        data: Bytes,
    },
    SliceError {
        id: RequestId,
        reason: String,
    },
}

impl WorkerReply {
    pub fn id(&self) -> RequestId {
        match self {
            WorkerReply::SliceResult { id, .. } | WorkerReply::SliceError { id, .. } => *id,
        }
    }
}

/// A decoded slice handed back to the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecodedSlice {
    /// Extent of each non-fixed query axis, in dataset axis order
    pub shape: Vec<u64>,
    pub data: Bytes,
}
