//! Asynchronous slice decoding on a pool of workers.
//!
//! [`DecodeDispatcher`] assigns each submitted [`SliceChunk`] to the next
//! worker in round-robin order and correlates replies by [`RequestId`].
//! Every request ends in exactly one of three states:
//!
//! - fulfilled: the worker replied with a [`DecodedSlice`]
//! - failed: the worker reported an error ([`DecodeError::Failed`](crate::error::DecodeError::Failed))
//! - abandoned: the caller's [`CancelSignal`] fired first
//!   ([`DecodeError::Cancelled`](crate::error::DecodeError::Cancelled))
//!
//! Replies that arrive after a request left the pending table are dropped.
//! Replies from one worker arrive in submission order; no order holds across
//! workers.

mod cancel;
mod decoder;
mod dispatcher;
mod pending;
mod protocol;
mod scheduler;
#[cfg(test)]
mod stub;
mod worker;

pub use cancel::{CancelSignal, CancelSource};
pub use decoder::{ShapeFramingDecoder, SliceDecoder, SliceSource};
pub use dispatcher::{DecodeDispatcher, DecodeHandle, SliceChunk};
pub use protocol::{DecodeRequest, DecodedSlice, RequestId, WorkerMessage, WorkerReply};
pub use scheduler::RoundRobin;
