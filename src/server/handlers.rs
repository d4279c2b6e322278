//! HTTP request handlers for the LOD resolve API.
//!
//! Every resolve endpoint is a pure function of its JSON body: the caller
//! posts the dataset description together with the view, and receives what
//! must be drawn.
//!
//! # Endpoints
//!
//! - `GET /health` - Health check endpoint
//! - `POST /resolve/tiles` - Visible tiles of a deep-zoom pyramid
//! - `POST /resolve/level` - Best multiscale level for a view
//! - `POST /resolve/query` - Native-order slice query for a level
//! - `POST /resolve/nodes` - Visible spatial tree nodes

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{MultiscaleError, PyramidError, TreeError, ViewError};
use crate::geometry::{Aabb2, Viewport};
use crate::multiscale::{
    build_query, query_shape, select_level, AxisSlice, LevelSelection, MultiscaleDescriptor,
    MultiscaleMetadata, SliceRequest,
};
use crate::pyramid::{layer_for_viewport, resolve_tiles, PyramidDescriptor, Tile};
use crate::spatial::{visible_nodes, NodeContent, SpatialTreeNode};

// =============================================================================
// Request Types
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct TilesRequest {
    pub pyramid: PyramidDescriptor,
    pub viewport: Viewport,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LevelRequest {
    pub metadata: MultiscaleMetadata,

    /// Names of the two axes spanning the view plane, horizontal first
    pub plane_axes: [String; 2],

    pub viewport: Viewport,
}

#[derive(Debug, Deserialize)]
pub struct QueryRequest {
    pub metadata: MultiscaleMetadata,
    pub level: usize,
    pub request: SliceRequest,
}

/// Spatial tree with arbitrary JSON payloads.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodesRequest {
    pub root: SpatialTreeNode<serde_json::Value>,
    pub view: Aabb2,
    pub size_threshold: f64,
}

// =============================================================================
// Response Types
// =============================================================================

/// JSON error response returned for all error conditions.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error type identifier (e.g., "invalid_view", "missing_axis")
    pub error: String,

    /// Human-readable error message
    pub message: String,

    /// HTTP status code (included for convenience)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
            status: None,
        }
    }

    pub fn with_status(
        error: impl Into<String>,
        message: impl Into<String>,
        status: StatusCode,
    ) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
            status: Some(status.as_u16()),
        }
    }
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TilesResponse {
    /// Layer chosen for the view
    pub layer: u32,

    /// Single-tile fallback layer
    pub base_layer: u32,

    /// Base tile first (when below `layer`), then visible tiles row-major
    pub tiles: Vec<Tile>,
}

#[derive(Debug, Serialize)]
pub struct LevelResponse {
    /// `None` when the dataset has no usable level
    pub selection: Option<LevelSelection>,

    /// Storage path of the selected level
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct QueryResponse {
    pub path: String,
    pub query: Vec<AxisSlice>,

    /// Extent of each non-fixed axis of the resulting slice
    pub shape: Vec<u64>,
}

/// A visible node without its subtree.
#[derive(Debug, Serialize, Deserialize)]
pub struct VisibleNode {
    pub bounds: Aabb2,
    pub depth: u32,
    pub content: NodeContent<serde_json::Value>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct NodesResponse {
    /// Breadth-first discovery order, coarse to fine
    pub nodes: Vec<VisibleNode>,
}

// =============================================================================
// Error Mapping
// =============================================================================

/// Every resolver error is an invalid-input error: resolution does no I/O.
fn bad_request(error_type: &str, message: String) -> Response {
    warn!(error = error_type, "Rejected resolve request: {}", message);
    let status = StatusCode::BAD_REQUEST;
    (
        status,
        Json(ErrorResponse::with_status(error_type, message, status)),
    )
        .into_response()
}

impl IntoResponse for ViewError {
    fn into_response(self) -> Response {
        let error_type = match &self {
            ViewError::InvalidScreenSize { .. } => "invalid_screen_size",
            ViewError::NonFinite { .. }
            | ViewError::Inverted { .. }
            | ViewError::Degenerate { .. } => "invalid_view",
        };
        bad_request(error_type, self.to_string())
    }
}

impl IntoResponse for PyramidError {
    fn into_response(self) -> Response {
        match self {
            PyramidError::View(e) => e.into_response(),
            other => bad_request("invalid_pyramid", other.to_string()),
        }
    }
}

impl IntoResponse for MultiscaleError {
    fn into_response(self) -> Response {
        let error_type = match &self {
            MultiscaleError::View(e) => return e.clone().into_response(),
            MultiscaleError::MissingAxis { .. } => "missing_axis",
            MultiscaleError::UnknownPlaneAxis { .. } => "unknown_axis",
            MultiscaleError::InvalidLevel { .. } => "invalid_level",
            MultiscaleError::DuplicateAxis { .. }
            | MultiscaleError::RankMismatch { .. }
            | MultiscaleError::QueryRankMismatch { .. }
            | MultiscaleError::Metadata(_) => "invalid_metadata",
        };
        bad_request(error_type, self.to_string())
    }
}

impl IntoResponse for TreeError {
    fn into_response(self) -> Response {
        bad_request("invalid_tree", self.to_string())
    }
}

/// Errors from the node endpoint, which checks both the view and the tree.
#[derive(Debug)]
pub enum NodesError {
    View(ViewError),
    Tree(TreeError),
}

impl IntoResponse for NodesError {
    fn into_response(self) -> Response {
        match self {
            NodesError::View(e) => e.into_response(),
            NodesError::Tree(e) => e.into_response(),
        }
    }
}

impl From<ViewError> for NodesError {
    fn from(err: ViewError) -> Self {
        NodesError::View(err)
    }
}

impl From<TreeError> for NodesError {
    fn from(err: TreeError) -> Self {
        NodesError::Tree(err)
    }
}

// =============================================================================
// Handlers
// =============================================================================

/// Handle health check requests.
///
/// # Endpoint
///
/// `GET /health`
///
/// # Response
///
/// `200 OK` with JSON body:
/// ```json
/// {
///   "status": "healthy",
///   "version": "0.1.0"
/// }
/// ```
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Resolve the tiles of a pyramid visible in a viewport.
///
/// # Endpoint
///
/// `POST /resolve/tiles`
///
/// # Request
///
/// ```json
/// {
///   "pyramid": {
///     "tileBaseUrl": "https://example.com/slide_files/",
///     "format": "jpeg",
///     "overlapPx": 2,
///     "tileSizePx": 256,
///     "fullImageSize": { "width": 7026, "height": 9221 }
///   },
///   "viewport": {
///     "view": { "min": [0.0, 0.0], "max": [1.0, 1.0] },
///     "screen": { "width": 512.0, "height": 512.0 }
///   }
/// }
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: Malformed descriptor or invalid view
pub async fn tiles_handler(
    Json(body): Json<TilesRequest>,
) -> Result<Json<TilesResponse>, PyramidError> {
    let tiles = resolve_tiles(&body.pyramid, &body.viewport)?;
    Ok(Json(TilesResponse {
        layer: layer_for_viewport(&body.pyramid, &body.viewport),
        base_layer: body.pyramid.base_layer(),
        tiles,
    }))
}

/// Select the multiscale level matching a viewport.
///
/// # Endpoint
///
/// `POST /resolve/level`
///
/// # Errors
///
/// - `400 Bad Request`: Invalid metadata, unknown plane axis or invalid view
pub async fn level_handler(
    Json(body): Json<LevelRequest>,
) -> Result<Json<LevelResponse>, MultiscaleError> {
    let dataset = MultiscaleDescriptor::from_metadata(&body.metadata)?;
    let [horizontal, vertical] = &body.plane_axes;
    let plane_axes = [horizontal.as_str(), vertical.as_str()];
    let selection = select_level(&dataset, plane_axes, &body.viewport)?;

    let path = match &selection {
        Some(s) => Some(dataset.level(s.level)?.path.clone()),
        None => None,
    };
    Ok(Json(LevelResponse { selection, path }))
}

/// Build the native-order query for one level.
///
/// # Endpoint
///
/// `POST /resolve/query`
///
/// # Errors
///
/// - `400 Bad Request`: Invalid metadata, unknown level or a missing axis
pub async fn query_handler(
    Json(body): Json<QueryRequest>,
) -> Result<Json<QueryResponse>, MultiscaleError> {
    let dataset = MultiscaleDescriptor::from_metadata(&body.metadata)?;
    let level = dataset.level(body.level)?;
    let query = build_query(level, dataset.axes(), &body.request)?;
    let shape = query_shape(&query);

    debug!(level = body.level, ?shape, "Built slice query");
    Ok(Json(QueryResponse {
        path: level.path.clone(),
        query,
        shape,
    }))
}

/// Resolve the visible nodes of a spatial tree.
///
/// # Endpoint
///
/// `POST /resolve/nodes`
///
/// # Errors
///
/// - `400 Bad Request`: Invalid view or a tree violating containment/depth rules
pub async fn nodes_handler(
    Json(body): Json<NodesRequest>,
) -> Result<Json<NodesResponse>, NodesError> {
    body.root.validate()?;

    let nodes = visible_nodes(&body.root, &body.view, body.size_threshold)?
        .into_iter()
        .map(|node| VisibleNode {
            bounds: node.bounds,
            depth: node.depth,
            content: node.content.clone(),
        })
        .collect();
    Ok(Json(NodesResponse { nodes }))
}

// =============================================================================
// Tests
// =============================================================================
