use thiserror::Error;

use crate::dispatch::RequestId;

/// Errors for structurally invalid views and screen sizes
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ViewError {
    /// A coordinate of the view box is NaN or infinite
    #[error("View box is not finite: min={min:?}, max={max:?}")]
    NonFinite { min: [f64; 2], max: [f64; 2] },

    /// min > max along an axis (callers must normalize boxes)
    #[error("View box is inverted along axis {axis}: min {min} > max {max}")]
    Inverted { axis: usize, min: f64, max: f64 },

    /// The view box has zero extent along an axis
    #[error("View box is degenerate along axis {axis}")]
    Degenerate { axis: usize },

    /// Screen size components must be finite and strictly positive
    #[error("Invalid screen size: {width}x{height}")]
    InvalidScreenSize { width: f64, height: f64 },
}

/// Errors from deep-zoom pyramid descriptors
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PyramidError {
    /// Tile size must be at least one pixel
    #[error("Invalid tile size: {0} (must be greater than 0)")]
    InvalidTileSize(u32),

    /// Overlap must leave room for the tile interior
    #[error("Invalid overlap: {overlap} pixels for tile size {tile_size}")]
    InvalidOverlap { overlap: u32, tile_size: u32 },

    /// Full image must have a non-zero extent
    #[error("Invalid image size: {width}x{height}")]
    InvalidImageSize { width: u32, height: u32 },

    /// The view or screen size was rejected
    #[error("Invalid view: {0}")]
    View(#[from] ViewError),
}

/// Errors from multiscale descriptors, level selection and query building
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MultiscaleError {
    /// The request has no entry for an axis the dataset declares
    #[error("Missing axis in slice request: {axis}")]
    MissingAxis { axis: String },

    /// A plane axis is not declared by the dataset
    #[error("Unknown plane axis: {axis}")]
    UnknownPlaneAxis { axis: String },

    /// Axis names must be unique
    #[error("Duplicate axis name: {axis}")]
    DuplicateAxis { axis: String },

    /// A level's shape or scale does not match the number of axes
    #[error("Level {level} has rank {actual}, dataset declares {expected} axes")]
    RankMismatch {
        level: usize,
        expected: usize,
        actual: usize,
    },

    /// A query's axes do not match the rank of the level it targets
    #[error("Level '{path}' has rank {actual}, query covers {expected} axes")]
    QueryRankMismatch {
        path: String,
        expected: usize,
        actual: usize,
    },

    /// Level index outside the descriptor
    #[error("Invalid level: {level} (dataset has {levels} levels)")]
    InvalidLevel { level: usize, levels: usize },

    /// Metadata JSON could not be parsed
    #[error("Invalid multiscale metadata: {0}")]
    Metadata(String),

    /// The view or screen size was rejected
    #[error("Invalid view: {0}")]
    View(#[from] ViewError),
}

/// Errors from spatial tree validation
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TreeError {
    /// A child's bounds escape its parent's bounds
    #[error("Child at depth {depth} is not contained in its parent bounds")]
    ChildOutsideParent { depth: u32 },

    /// A child's depth is not its parent's depth plus one
    #[error("Depth mismatch: expected {expected}, got {actual}")]
    DepthMismatch { expected: u32, actual: u32 },

    /// Bounds contain NaN or infinite coordinates
    #[error("Node at depth {depth} has non-finite bounds")]
    NonFiniteBounds { depth: u32 },
}

/// Errors reported by a slice decoder on a worker
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SliceError {
    /// The backing source failed to produce bytes
    #[error("Source error: {0}")]
    Source(String),

    /// The source returned a buffer whose length does not match the shape
    #[error("Buffer length mismatch: shape {shape:?} needs {expected} bytes, got {actual}")]
    LengthMismatch {
        shape: Vec<u64>,
        expected: u64,
        actual: u64,
    },

    /// Decoding the payload failed
    #[error("Decode error: {0}")]
    Decode(String),
}

/// Terminal outcomes of a dispatched decode request other than success
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DecodeError {
    /// The worker reported a decode failure
    #[error("Decode of request {id} failed: {reason}")]
    Failed { id: RequestId, reason: String },

    /// The caller's cancel signal fired before a reply arrived
    #[error("Request {id} was cancelled")]
    Cancelled { id: RequestId },

    /// The assigned worker is no longer accepting work
    #[error("Worker {worker} is unavailable")]
    WorkerUnavailable { worker: usize },

    /// The dispatcher shut down before the request completed
    #[error("Dispatcher shut down")]
    Shutdown,
}

impl DecodeError {
    /// Whether this outcome is a caller-driven cancellation rather than a failure.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, DecodeError::Cancelled { .. })
    }
}
