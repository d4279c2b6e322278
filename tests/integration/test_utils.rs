//! Test utilities for integration tests.
//!
//! Provides an in-memory slice source with read tracking, plus fixtures for
//! the reference pyramid, a multiscale dataset and a quadtree.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;

use lod_streamer::error::SliceError;
use lod_streamer::geometry::Aabb2;
use lod_streamer::multiscale::{AxisSlice, MultiscaleMetadata};
use lod_streamer::pyramid::{ImageSize, PyramidDescriptor};
use lod_streamer::spatial::SpatialTreeNode;
use lod_streamer::SliceSource;

// =============================================================================
// In-memory Slice Source
// =============================================================================

/// A dense, row-major volume with one byte per element.
#[derive(Clone)]
pub struct MemoryVolume {
    pub shape: Vec<u64>,
    pub data: Vec<u8>,
}

impl MemoryVolume {
    /// Volume whose element at flat offset `i` holds `i % 251`.
    pub fn patterned(shape: Vec<u64>) -> Self {
        let len: u64 = shape.iter().product();
        let data = (0..len).map(|i| (i % 251) as u8).collect();
        Self { shape, data }
    }

    /// Gather the elements selected by `query`, row-major.
    pub fn gather(&self, query: &[AxisSlice]) -> Vec<u8> {
        let mut strides = vec![1u64; self.shape.len()];
        for axis in (0..self.shape.len().saturating_sub(1)).rev() {
            strides[axis] = strides[axis + 1] * self.shape[axis + 1];
        }

        let ranges: Vec<(u64, u64)> = query
            .iter()
            .map(|term| match term {
                AxisSlice::Index(i) => (*i, *i + 1),
                AxisSlice::Range { start, end } => (*start, *end),
            })
            .collect();

        let mut out = Vec::new();
        if ranges.iter().any(|(start, end)| start >= end) {
            return out;
        }

        let mut index: Vec<u64> = ranges.iter().map(|r| r.0).collect();
        loop {
            let offset: u64 = index.iter().zip(&strides).map(|(i, s)| i * s).sum();
            out.push(self.data[offset as usize]);

            let mut axis = ranges.len();
            loop {
                if axis == 0 {
                    return out;
                }
                axis -= 1;
                index[axis] += 1;
                if index[axis] < ranges[axis].1 {
                    break;
                }
                index[axis] = ranges[axis].0;
            }
        }
    }
}

/// A slice source backed by in-memory volumes, keyed by dataset and level.
///
/// Tracks how many reads were served, optionally delaying each one.
#[derive(Clone, Default)]
pub struct MemorySource {
    volumes: HashMap<(String, usize), MemoryVolume>,
    delay: Option<Duration>,
    reads: Arc<AtomicUsize>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_volume(mut self, dataset: &str, level: usize, volume: MemoryVolume) -> Self {
        self.volumes.insert((dataset.to_string(), level), volume);
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn read_count(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    pub fn volume(&self, dataset: &str, level: usize) -> Option<&MemoryVolume> {
        self.volumes.get(&(dataset.to_string(), level))
    }
}

#[async_trait]
impl SliceSource for MemorySource {
    async fn read_slice(
        &self,
        dataset: &str,
        level: usize,
        query: &[AxisSlice],
    ) -> Result<Bytes, SliceError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let volume = self
            .volumes
            .get(&(dataset.to_string(), level))
            .ok_or_else(|| SliceError::Source(format!("no level {} in {}", level, dataset)))?;
        self.reads.fetch_add(1, Ordering::SeqCst);
        Ok(Bytes::from(volume.gather(query)))
    }
}

// =============================================================================
// Fixtures
// =============================================================================

/// The 7026x9221 reference pyramid with 256px tiles and 2px overlap.
pub fn reference_pyramid() -> PyramidDescriptor {
    PyramidDescriptor::new(
        "https://tiles.example.com/slide_files/",
        "jpeg",
        2,
        256,
        ImageSize::new(7026, 9221),
    )
}

/// Three-level z/y/x dataset: 16x256x256, 8x128x128, 4x64x64, each level
/// twice as coarse as the previous on every axis.
pub fn volume_metadata() -> MultiscaleMetadata {
    serde_json::from_value(serde_json::json!({
        "axes": [
            {"name": "z", "type": "space", "unit": "micrometer"},
            {"name": "y", "type": "space", "unit": "micrometer"},
            {"name": "x", "type": "space", "unit": "micrometer"}
        ],
        "datasets": [
            {
                "path": "0",
                "coordinateTransformations": [{"type": "scale", "scale": [1.0, 1.0, 1.0]}],
                "shape": [16, 256, 256]
            },
            {
                "path": "1",
                "coordinateTransformations": [
                    {"type": "scale", "scale": [2.0, 2.0, 2.0]},
                    {"type": "translation", "translation": [0.5, 0.5, 0.5]}
                ],
                "shape": [8, 128, 128]
            },
            {
                "path": "2",
                "coordinateTransformations": [{"type": "scale", "scale": [4.0, 4.0, 4.0]}],
                "shape": [4, 64, 64]
            }
        ]
    }))
    .expect("fixture metadata parses")
}

/// Full quadtree over `bounds` down to `max_depth`. Payload is the node path.
pub fn quadtree(
    bounds: Aabb2,
    depth: u32,
    max_depth: u32,
    path: String,
) -> SpatialTreeNode<String> {
    let node = SpatialTreeNode::new(bounds, depth, path.clone(), u64::from(max_depth - depth) + 1);
    if depth == max_depth {
        return node;
    }
    let mid = [
        (bounds.min[0] + bounds.max[0]) / 2.0,
        (bounds.min[1] + bounds.max[1]) / 2.0,
    ];
    let quads = [
        Aabb2::new(bounds.min, mid),
        Aabb2::new([mid[0], bounds.min[1]], [bounds.max[0], mid[1]]),
        Aabb2::new([bounds.min[0], mid[1]], [mid[0], bounds.max[1]]),
        Aabb2::new(mid, bounds.max),
    ];
    let children = quads
        .iter()
        .enumerate()
        .map(|(i, quad)| quadtree(*quad, depth + 1, max_depth, format!("{}{}", path, i)))
        .collect();
    node.with_children(children)
}
