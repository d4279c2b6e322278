//! Deep Zoom pyramid descriptors and layer arithmetic.
//!
//! Deep Zoom numbers layers from coarse to fine:
//! - layer 0 = 1x1 pixel
//! - layer `L` = the full image halved (rounding up) until its larger
//!   dimension fits in `2^L` pixels
//!
//! Real pyramids have irregular sizes near the top because each halving
//! rounds up, so layer sizes are always derived by repeated ceiling division
//! rather than by dividing by a power of two once.

use std::ops::Range;

use serde::{Deserialize, Serialize};

use crate::error::PyramidError;

/// Pixel dimensions of an image or pyramid layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageSize {
    pub width: u32,
    pub height: u32,
}

impl ImageSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn max_dimension(&self) -> u32 {
        self.width.max(self.height)
    }
}

/// Immutable description of a tiled deep-zoom pyramid.
///
/// Loaded once from dataset metadata and read-only thereafter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PyramidDescriptor {
    /// Prefix of every tile URL, usually ending in `_files/`
    pub tile_base_url: String,

    /// Tile file extension (e.g. "jpeg", "png")
    pub format: String,

    /// Pixels each tile extends into its neighbours on every shared edge
    pub overlap_px: u32,

    /// Nominal tile edge length in pixels, excluding overlap
    pub tile_size_px: u32,

    /// Dimensions of the full-resolution image
    pub full_image_size: ImageSize,
}

impl PyramidDescriptor {
    pub fn new(
        tile_base_url: impl Into<String>,
        format: impl Into<String>,
        overlap_px: u32,
        tile_size_px: u32,
        full_image_size: ImageSize,
    ) -> Self {
        Self {
            tile_base_url: tile_base_url.into(),
            format: format.into(),
            overlap_px,
            tile_size_px,
            full_image_size,
        }
    }

    /// Reject descriptors the tiling arithmetic cannot handle.
    pub fn validate(&self) -> Result<(), PyramidError> {
        if self.tile_size_px == 0 {
            return Err(PyramidError::InvalidTileSize(self.tile_size_px));
        }
        if self.overlap_px >= self.tile_size_px {
            return Err(PyramidError::InvalidOverlap {
                overlap: self.overlap_px,
                tile_size: self.tile_size_px,
            });
        }
        let ImageSize { width, height } = self.full_image_size;
        if width == 0 || height == 0 {
            return Err(PyramidError::InvalidImageSize { width, height });
        }
        Ok(())
    }

    /// Finest layer, derived from the full image width.
    pub fn max_layer(&self) -> u32 {
        max_layer(self.full_image_size.width)
    }

    /// Effective image size at `layer`.
    pub fn layer_dimensions(&self, layer: u32) -> ImageSize {
        layer_dimensions(self.full_image_size, layer)
    }

    /// Number of tile columns and rows at `layer`.
    pub fn tile_count(&self, layer: u32) -> (u32, u32) {
        let size = self.layer_dimensions(layer);
        (
            size.width.div_ceil(self.tile_size_px),
            size.height.div_ceil(self.tile_size_px),
        )
    }

    /// Finest layer at which the whole image fits in a single tile.
    pub fn base_layer(&self) -> u32 {
        (0..=self.max_layer())
            .rev()
            .find(|&layer| self.layer_dimensions(layer).max_dimension() <= self.tile_size_px)
            .unwrap_or(0)
    }

    /// Address of a tile: `{tile_base_url}{layer}/{col}_{row}.{format}`.
    pub fn tile_url(&self, layer: u32, col: u32, row: u32) -> String {
        format!(
            "{}{}/{}_{}.{}",
            self.tile_base_url, layer, col, row, self.format
        )
    }
}

/// `ceil(log2(width))`, with widths of 0 and 1 mapping to layer 0.
pub fn max_layer(width: u32) -> u32 {
    if width <= 1 {
        return 0;
    }
    u32::BITS - (width - 1).leading_zeros()
}

/// Halve `full` (rounding up) until its larger dimension is at most `2^layer`.
pub fn layer_dimensions(full: ImageSize, layer: u32) -> ImageSize {
    let limit = 1u64 << layer.min(63);
    let (mut width, mut height) = (full.width, full.height);
    while u64::from(width.max(height)) > limit {
        width = width.div_ceil(2);
        height = height.div_ceil(2);
    }
    ImageSize { width, height }
}

/// Lowest layer whose nominal resolution meets `pixel_density`.
///
/// `pixel_density` is screen pixels per full image width. The result is
/// `ceil(log2(pixel_density))` clamped to `[0, max_layer(image_width)]`.
pub fn first_suitable_layer(image_width: u32, pixel_density: f64) -> u32 {
    let max = max_layer(image_width);
    if pixel_density.is_nan() || pixel_density <= 1.0 {
        return 0;
    }
    let desired = pixel_density.log2().ceil();
    if desired >= f64::from(max) {
        max
    } else {
        desired as u32
    }
}

/// Partition `[0, total)` into tiles of `step` pixels overlapping by `overlap`.
///
/// Every tile after the first starts `overlap` pixels before its nominal
/// origin, every tile ends `overlap` pixels past its nominal end, and all
/// tiles are clipped to `[0, total)`.
pub fn tile_with_overlap(total: u32, step: u32, overlap: u32) -> Vec<Range<u32>> {
    if step == 0 {
        return Vec::new();
    }
    (0..total.div_ceil(step))
        .map(|i| {
            let origin = u64::from(i) * u64::from(step);
            let start = origin.saturating_sub(u64::from(overlap));
            let end = (origin + u64::from(step) + u64::from(overlap)).min(u64::from(total));
            start as u32..end as u32
        })
        .collect()
}
