//! Scripted decoder for dispatcher and worker tests.
//!
//! Behaviour is chosen by the request's dataset handle:
//! `"stall"` never completes, `"fail"` returns a decode error, `"panic"` panics,
//! `"slow:<ms>"` sleeps first, anything else succeeds at once.
//! Successful slices carry the request id as their payload.

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::SliceError;
use crate::multiscale::query_shape;

use super::decoder::SliceDecoder;
use super::protocol::{DecodeRequest, DecodedSlice};

pub(crate) struct StubDecoder;

#[async_trait]
impl SliceDecoder for StubDecoder {
    async fn decode(&self, request: &DecodeRequest) -> Result<DecodedSlice, SliceError> {
        let handle = request.dataset_handle.as_str();
        if handle == "stall" {
            std::future::pending::<()>().await;
        }
        if handle == "fail" {
            return Err(SliceError::Decode("scripted failure".to_string()));
        }
        if handle == "panic" {
            panic!("scripted decoder panic");
        }
        if let Some(ms) = handle.strip_prefix("slow:") {
            let ms = ms.parse().unwrap_or(10);
            tokio::time::sleep(Duration::from_millis(ms)).await;
        }
        Ok(DecodedSlice {
            shape: query_shape(&request.query),
            data: Bytes::from(request.id.to_string()),
        })
    }
}
