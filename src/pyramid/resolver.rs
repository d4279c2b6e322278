//! View-driven tile resolution.
//!
//! [`resolve_tiles`] turns a viewport over the parametric `[0,1]²` image
//! space into the tiles needed to draw it:
//!
//! 1. pick the layer whose resolution meets the screen density
//! 2. partition that layer into overlapping tile spans along each axis
//! 3. keep the columns and rows whose parametric span overlaps the view, and
//!    build tiles only for those
//! 4. prepend the single base tile as a fallback while finer tiles load

use std::ops::Range;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::PyramidError;
use crate::geometry::{Aabb2, Viewport};

use super::descriptor::{first_suitable_layer, tile_with_overlap, PyramidDescriptor};

/// Grid coordinates of a tile, unique within a layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TileIndex {
    pub row: u32,
    pub col: u32,
}

/// A tile needed for the current view. Recomputed per query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tile {
    pub url: String,
    pub index: TileIndex,
    /// Tile extent in `[0,1]²` image space, overlap included
    pub relative_box: Aabb2,
    pub layer: u32,
    /// Tile size in pixels at its layer, overlap included
    pub size_px: [u32; 2],
}

/// Pixel spans of a layer's tile columns and rows.
struct LayerGrid<'a> {
    pyramid: &'a PyramidDescriptor,
    layer: u32,
    size: [f64; 2],
    /// Column spans, then row spans
    spans: [Vec<Range<u32>>; 2],
}

impl<'a> LayerGrid<'a> {
    fn new(pyramid: &'a PyramidDescriptor, layer: u32) -> Self {
        let size = pyramid.layer_dimensions(layer);
        let spans = [size.width, size.height]
            .map(|total| tile_with_overlap(total, pyramid.tile_size_px, pyramid.overlap_px));
        Self {
            pyramid,
            layer,
            size: [f64::from(size.width), f64::from(size.height)],
            spans,
        }
    }

    /// Indices along `axis` whose parametric span overlaps the view on that
    /// axis. Same test as [`Aabb2::intersects`], one axis at a time.
    fn overlapping(&self, axis: usize, view: &Aabb2) -> Vec<u32> {
        let extent = self.size[axis];
        self.spans[axis]
            .iter()
            .enumerate()
            .filter(|(_, span)| {
                let lo = (f64::from(span.start) / extent).max(view.min[axis]);
                let hi = (f64::from(span.end) / extent).min(view.max[axis]);
                lo < hi
            })
            .map(|(i, _)| i as u32)
            .collect()
    }

    fn tile(&self, col: u32, row: u32) -> Tile {
        let xs = &self.spans[0][col as usize];
        let ys = &self.spans[1][row as usize];
        let [width, height] = self.size;
        Tile {
            url: self.pyramid.tile_url(self.layer, col, row),
            index: TileIndex { row, col },
            relative_box: Aabb2::new(
                [f64::from(xs.start) / width, f64::from(ys.start) / height],
                [f64::from(xs.end) / width, f64::from(ys.end) / height],
            ),
            layer: self.layer,
            size_px: [xs.end - xs.start, ys.end - ys.start],
        }
    }

    /// Tiles for every (row, col) pair, row-major.
    fn tiles(&self, cols: &[u32], rows: &[u32]) -> Vec<Tile> {
        let mut tiles = Vec::with_capacity(cols.len() * rows.len());
        for &row in rows {
            for &col in cols {
                tiles.push(self.tile(col, row));
            }
        }
        tiles
    }
}

/// Every tile of `layer`, in row-major order.
pub fn tiles_at_layer(pyramid: &PyramidDescriptor, layer: u32) -> Vec<Tile> {
    let grid = LayerGrid::new(pyramid, layer);
    let all = |axis: usize| (0..grid.spans[axis].len() as u32).collect::<Vec<_>>();
    grid.tiles(&all(0), &all(1))
}

/// Tiles of `layer` whose parametric box intersects `view`, row-major.
///
/// Only the visible columns and rows are turned into tiles, so the cost
/// follows the view rather than the layer size.
pub fn tiles_in_view(pyramid: &PyramidDescriptor, layer: u32, view: &Aabb2) -> Vec<Tile> {
    let grid = LayerGrid::new(pyramid, layer);
    let cols = grid.overlapping(0, view);
    let rows = grid.overlapping(1, view);
    grid.tiles(&cols, &rows)
}

/// Layer selected for a viewport.
///
/// The view box is parametric, so screen width over view width is the
/// number of screen pixels spanned by the full image width.
pub fn layer_for_viewport(pyramid: &PyramidDescriptor, viewport: &Viewport) -> u32 {
    let density = viewport.screen.width / viewport.view.width();
    first_suitable_layer(pyramid.full_image_size.width, density)
}

/// Resolve the tiles needed to draw `viewport`.
///
/// The base tile comes first whenever the selected layer is finer than the
/// base layer; the remaining tiles follow in row-major order. An empty result
/// is valid when the view misses the image.
///
/// # Errors
///
/// Returns an error for a malformed descriptor or viewport. Resolution itself
/// does no I/O and cannot fail otherwise.
pub fn resolve_tiles(
    pyramid: &PyramidDescriptor,
    viewport: &Viewport,
) -> Result<Vec<Tile>, PyramidError> {
    pyramid.validate()?;
    viewport.validate()?;

    let layer = layer_for_viewport(pyramid, viewport);
    let base_layer = pyramid.base_layer();

    let mut tiles = Vec::new();
    if layer > base_layer {
        tiles.push(LayerGrid::new(pyramid, base_layer).tile(0, 0));
    }
    tiles.extend(tiles_in_view(pyramid, layer, &viewport.view));

    debug!(
        layer,
        base_layer,
        tiles = tiles.len(),
        "Resolved pyramid tiles for view"
    );
    Ok(tiles)
}
