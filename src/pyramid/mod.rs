//! Deep-zoom pyramid tile resolution.
//!
//! # Layer numbering
//!
//! ```text
//!   layer 0          1x1
//!   layer 1          2x2 (or smaller)
//!   ...
//!   base layer       whole image in a single tile
//!   ...
//!   max layer        ceil(log2(full width))
//! ```
//!
//! # Components
//!
//! - [`PyramidDescriptor`]: immutable dataset description and layer arithmetic
//! - [`tile_with_overlap`]: 1D partition of a layer into overlapping tiles
//! - [`resolve_tiles`]: viewport to tile set, base tile first

mod descriptor;
mod resolver;

pub use descriptor::{
    first_suitable_layer, layer_dimensions, max_layer, tile_with_overlap, ImageSize,
    PyramidDescriptor,
};
pub use resolver::{
    layer_for_viewport, resolve_tiles, tiles_at_layer, tiles_in_view, Tile, TileIndex,
};
