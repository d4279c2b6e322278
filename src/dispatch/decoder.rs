//! Decode backends run by the workers.
//!
//! A worker hands each [`DecodeRequest`] to a [`SliceDecoder`]. The crate
//! ships [`ShapeFramingDecoder`], which pulls raw element bytes for a query
//! from a [`SliceSource`] and frames them with the query's shape. Codec
//! specific decoders plug in through the same trait.

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::SliceError;
use crate::multiscale::{query_shape, AxisSlice};

use super::protocol::{DecodeRequest, DecodedSlice};

/// Turns a decode request into a shaped buffer.
///
/// Implementations must be stateless with respect to requests: workers share
/// one decoder and call it concurrently from different tasks.
#[async_trait]
pub trait SliceDecoder: Send + Sync + 'static {
    async fn decode(&self, request: &DecodeRequest) -> Result<DecodedSlice, SliceError>;
}

/// Storage backend producing raw, row-major element bytes for a query.
#[async_trait]
pub trait SliceSource: Send + Sync + 'static {
    async fn read_slice(
        &self,
        dataset: &str,
        level: usize,
        query: &[AxisSlice],
    ) -> Result<Bytes, SliceError>;
}

/// Frames raw bytes from a [`SliceSource`] into the query's shape.
pub struct ShapeFramingDecoder<S> {
    source: S,
    bytes_per_element: u64,
}

impl<S: SliceSource> ShapeFramingDecoder<S> {
    pub fn new(source: S, bytes_per_element: u64) -> Self {
        Self {
            source,
            bytes_per_element,
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }
}

#[async_trait]
impl<S: SliceSource> SliceDecoder for ShapeFramingDecoder<S> {
    async fn decode(&self, request: &DecodeRequest) -> Result<DecodedSlice, SliceError> {
        let shape = query_shape(&request.query);
        let data = self
            .source
            .read_slice(&request.dataset_handle, request.level_index, &request.query)
            .await?;

        let expected = shape.iter().product::<u64>() * self.bytes_per_element;
        if data.len() as u64 != expected {
            return Err(SliceError::LengthMismatch {
                shape,
                expected,
                actual: data.len() as u64,
            });
        }

        Ok(DecodedSlice { shape, data })
    }
}
