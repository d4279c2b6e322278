//! Multiscale array level selection and slice queries.
//!
//! # Components
//!
//! - [`MultiscaleDescriptor`]: axes plus resolution levels, parsed from
//!   multiscales metadata
//! - [`select_level`]: pick the level whose voxel pitch matches the screen
//! - [`build_query`]: turn an axis-keyed [`SliceRequest`] into clamped,
//!   native-order [`AxisSlice`] terms
//!
//! # Example
//!
//! ```
//! use lod_streamer::geometry::{Aabb2, ScreenSize, Viewport};
//! use lod_streamer::multiscale::{
//!     build_query, select_level, Axis, AxisRequest, Level, MultiscaleDescriptor, SliceRequest,
//! };
//!
//! let dataset = MultiscaleDescriptor::new(
//!     vec![Axis::new("y"), Axis::new("x")],
//!     vec![
//!         Level::unscaled("0", vec![1024, 1024]),
//!         Level::unscaled("1", vec![512, 512]),
//!     ],
//! )
//! .unwrap();
//!
//! let viewport = Viewport::new(
//!     Aabb2::new([0.0, 0.0], [1024.0, 1024.0]),
//!     ScreenSize::new(512.0, 512.0),
//! )
//! .unwrap();
//!
//! let selection = select_level(&dataset, ["x", "y"], &viewport).unwrap().unwrap();
//! assert_eq!(selection.level, 1);
//!
//! let request = SliceRequest::new()
//!     .with("y", AxisRequest::Interval { start: 0, end: 256 })
//!     .with("x", AxisRequest::All);
//! let level = dataset.level(selection.level).unwrap();
//! let query = build_query(level, dataset.axes(), &request).unwrap();
//! assert_eq!(query.len(), 2);
//! ```

mod descriptor;
mod query;
mod selector;

pub use descriptor::{
    Axis, CoordinateTransformation, DatasetMetadata, Level, MultiscaleDescriptor,
    MultiscaleMetadata,
};
pub use query::{build_query, query_shape, AxisRequest, AxisSlice, SliceRequest};
pub use selector::{pitch_score, select_level, LevelSelection, COARSER_PENALTY};
