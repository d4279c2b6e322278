//! # LOD Streamer
//!
//! Level-of-detail resolution for large tiled, multiscale and spatial-tree
//! datasets, plus an asynchronous decode dispatcher that feeds the chunks it
//! selects to a pool of workers.
//!
//! Given what the user is looking at (a view box and a screen size), the
//! resolvers answer what has to be fetched:
//!
//! - [`pyramid`] - deep-zoom tile pyramids: layer selection and visible tiles
//! - [`multiscale`] - multiscale arrays: level selection and slice queries
//! - [`spatial`] - octree/quadtree culling with a size cutoff
//! - [`dispatch`] - round-robin decode workers with id correlation and cancellation
//! - [`server`] - Axum-based HTTP resolve service
//! - [`config`] - CLI and configuration types
//!
//! Resolvers are pure and synchronous. Only [`dispatch`] suspends.
//!
//! ## Example
//!
//! ```rust
//! use lod_streamer::geometry::{Aabb2, ScreenSize, Viewport};
//! use lod_streamer::pyramid::{resolve_tiles, ImageSize, PyramidDescriptor};
//!
//! let pyramid = PyramidDescriptor::new(
//!     "https://example.com/slide_files/",
//!     "jpeg",
//!     2,
//!     256,
//!     ImageSize::new(7026, 9221),
//! );
//! let viewport = Viewport::new(Aabb2::unit(), ScreenSize::new(512.0, 512.0)).unwrap();
//!
//! let tiles = resolve_tiles(&pyramid, &viewport).unwrap();
//! assert_eq!(tiles[0].url, "https://example.com/slide_files/8/0_0.jpeg");
//! ```

pub mod config;
pub mod dispatch;
pub mod error;
pub mod geometry;
pub mod multiscale;
pub mod pyramid;
pub mod server;
pub mod spatial;

// Re-export commonly used types
pub use config::{Cli, Command, ServeConfig, TilesConfig};
pub use dispatch::{
    CancelSignal, CancelSource, DecodeDispatcher, DecodeHandle, DecodedSlice, RequestId,
    ShapeFramingDecoder, SliceChunk, SliceDecoder, SliceSource,
};
pub use error::{DecodeError, MultiscaleError, PyramidError, SliceError, TreeError, ViewError};
pub use geometry::{Aabb2, ScreenSize, Viewport};
pub use multiscale::{
    build_query, select_level, AxisRequest, AxisSlice, LevelSelection, MultiscaleDescriptor,
    SliceRequest,
};
pub use pyramid::{resolve_tiles, PyramidDescriptor, Tile};
pub use server::{create_router, RouterConfig};
pub use spatial::{visible_nodes, SpatialTreeNode};
