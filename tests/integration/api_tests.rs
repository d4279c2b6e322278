//! API integration tests for the resolve endpoints.
//!
//! Tests verify:
//! - Health check
//! - Tile, level, query and node resolution over HTTP
//! - Invalid input maps to 400 with a typed error body
//! - Request body limit

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use lod_streamer::{create_router, RouterConfig};

use super::test_utils::{quadtree, reference_pyramid, volume_metadata};

fn router() -> Router {
    create_router(RouterConfig::new().with_tracing(false))
}

fn post_json(uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(serde_json::to_vec(body).unwrap()))
        .unwrap()
}

async fn send(router: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = router.oneshot(request).await.unwrap();
    let status = response.status();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let json = serde_json::from_slice(&body).unwrap_or(Value::Null);
    (status, json)
}

fn viewport(min: [f64; 2], max: [f64; 2], screen: [f64; 2]) -> Value {
    json!({
        "view": {"min": min, "max": max},
        "screen": {"width": screen[0], "height": screen[1]}
    })
}

// =============================================================================
// Health
// =============================================================================

#[tokio::test]
async fn test_health_check() {
    let request = Request::builder()
        .uri("/health")
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(router(), request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
}

// =============================================================================
// Tiles
// =============================================================================

#[tokio::test]
async fn test_resolve_tiles_reference_pyramid() {
    let body = json!({
        "pyramid": serde_json::to_value(reference_pyramid()).unwrap(),
        "viewport": viewport([0.0, 0.0], [1.0, 1.0], [512.0, 512.0]),
    });
    let (status, body) = send(router(), post_json("/resolve/tiles", &body)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["layer"], 9);
    assert_eq!(body["baseLayer"], 8);

    let tiles = body["tiles"].as_array().unwrap();
    let urls: Vec<&str> = tiles.iter().map(|t| t["url"].as_str().unwrap()).collect();
    assert_eq!(
        urls,
        vec![
            "https://tiles.example.com/slide_files/8/0_0.jpeg",
            "https://tiles.example.com/slide_files/9/0_0.jpeg",
            "https://tiles.example.com/slide_files/9/0_1.jpeg",
        ]
    );
    assert_eq!(tiles[1]["sizePx"], json!([220, 258]));
    assert_eq!(tiles[2]["sizePx"], json!([220, 35]));
}

#[tokio::test]
async fn test_resolve_tiles_partial_view() {
    // Bottom strip of layer 9 only.
    let body = json!({
        "pyramid": serde_json::to_value(reference_pyramid()).unwrap(),
        "viewport": viewport([0.0, 0.95], [1.0, 1.0], [512.0, 26.0]),
    });
    let (status, body) = send(router(), post_json("/resolve/tiles", &body)).await;

    assert_eq!(status, StatusCode::OK);
    let tiles = body["tiles"].as_array().unwrap();
    assert_eq!(tiles.len(), 2);
    assert_eq!(tiles[0]["layer"], 8);
    assert_eq!(tiles[1]["index"], json!({"row": 1, "col": 0}));
}

#[tokio::test]
async fn test_resolve_tiles_degenerate_view() {
    let body = json!({
        "pyramid": serde_json::to_value(reference_pyramid()).unwrap(),
        "viewport": viewport([0.5, 0.0], [0.5, 1.0], [512.0, 512.0]),
    });
    let (status, body) = send(router(), post_json("/resolve/tiles", &body)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "invalid_view");
    assert_eq!(body["status"], 400);
}

#[tokio::test]
async fn test_resolve_tiles_bad_screen() {
    let body = json!({
        "pyramid": serde_json::to_value(reference_pyramid()).unwrap(),
        "viewport": viewport([0.0, 0.0], [1.0, 1.0], [0.0, 512.0]),
    });
    let (status, body) = send(router(), post_json("/resolve/tiles", &body)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "invalid_screen_size");
}

#[tokio::test]
async fn test_resolve_tiles_zero_tile_size() {
    let mut pyramid = serde_json::to_value(reference_pyramid()).unwrap();
    pyramid["tileSizePx"] = json!(0);
    let body = json!({
        "pyramid": pyramid,
        "viewport": viewport([0.0, 0.0], [1.0, 1.0], [512.0, 512.0]),
    });
    let (status, body) = send(router(), post_json("/resolve/tiles", &body)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "invalid_pyramid");
}

// =============================================================================
// Multiscale
// =============================================================================

#[tokio::test]
async fn test_resolve_level() {
    let body = json!({
        "metadata": serde_json::to_value(volume_metadata()).unwrap(),
        "planeAxes": ["x", "y"],
        "viewport": viewport([0.0, 0.0], [256.0, 256.0], [128.0, 128.0]),
    });
    let (status, body) = send(router(), post_json("/resolve/level", &body)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["selection"]["level"], 1);
    assert_eq!(body["path"], "1");
}

#[tokio::test]
async fn test_resolve_level_unknown_axis() {
    let body = json!({
        "metadata": serde_json::to_value(volume_metadata()).unwrap(),
        "planeAxes": ["x", "t"],
        "viewport": viewport([0.0, 0.0], [256.0, 256.0], [128.0, 128.0]),
    });
    let (status, body) = send(router(), post_json("/resolve/level", &body)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "unknown_axis");
}

#[tokio::test]
async fn test_resolve_query_clamps_to_level() {
    let body = json!({
        "metadata": serde_json::to_value(volume_metadata()).unwrap(),
        "level": 2,
        "request": {
            "z": {"index": 10},
            "y": {"interval": {"start": -5, "end": 32}},
            "x": "all"
        }
    });
    let (status, body) = send(router(), post_json("/resolve/query", &body)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["path"], "2");
    assert_eq!(
        body["query"],
        json!([
            {"index": 3},
            {"range": {"start": 0, "end": 32}},
            {"range": {"start": 0, "end": 64}}
        ])
    );
    assert_eq!(body["shape"], json!([32, 64]));
}

#[tokio::test]
async fn test_resolve_query_missing_axis() {
    let body = json!({
        "metadata": serde_json::to_value(volume_metadata()).unwrap(),
        "level": 0,
        "request": {"y": "all", "x": "all"}
    });
    let (status, body) = send(router(), post_json("/resolve/query", &body)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "missing_axis");
    assert!(body["message"].as_str().unwrap().contains('z'));
}

#[tokio::test]
async fn test_resolve_query_invalid_level() {
    let body = json!({
        "metadata": serde_json::to_value(volume_metadata()).unwrap(),
        "level": 7,
        "request": {"z": "all", "y": "all", "x": "all"}
    });
    let (status, body) = send(router(), post_json("/resolve/query", &body)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "invalid_level");
}

// =============================================================================
// Spatial tree
// =============================================================================

#[tokio::test]
async fn test_resolve_nodes_breadth_first() {
    let tree = quadtree(
        lod_streamer::Aabb2::new([0.0, 0.0], [16.0, 16.0]),
        0,
        3,
        "r".to_string(),
    );
    let body = json!({
        "root": serde_json::to_value(&tree).unwrap(),
        "view": {"min": [0.0, 0.0], "max": [7.0, 7.0]},
        "sizeThreshold": 3.0
    });
    let (status, body) = send(router(), post_json("/resolve/nodes", &body)).await;

    assert_eq!(status, StatusCode::OK);
    let paths: Vec<&str> = body["nodes"]
        .as_array()
        .unwrap()
        .iter()
        .map(|n| n["content"]["payload"].as_str().unwrap())
        .collect();
    // Depth 3 nodes are 2 wide, under the threshold.
    assert_eq!(paths, vec!["r", "r0", "r00", "r01", "r02", "r03"]);
    assert!(body["nodes"][0].get("children").is_none());
}

#[tokio::test]
async fn test_resolve_nodes_rejects_inconsistent_tree() {
    let body = json!({
        "root": {
            "bounds": {"min": [0.0, 0.0], "max": [4.0, 4.0]},
            "depth": 0,
            "content": {"payload": null, "count": 1},
            "children": [{
                "bounds": {"min": [2.0, 2.0], "max": [8.0, 8.0]},
                "depth": 1,
                "content": {"payload": null, "count": 1}
            }]
        },
        "view": {"min": [0.0, 0.0], "max": [4.0, 4.0]},
        "sizeThreshold": 0.5
    });
    let (status, body) = send(router(), post_json("/resolve/nodes", &body)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "invalid_tree");
}

// =============================================================================
// Limits
// =============================================================================

#[tokio::test]
async fn test_body_limit() {
    let router = create_router(
        RouterConfig::new()
            .with_tracing(false)
            .with_max_body_bytes(1024),
    );
    let payload = vec![b' '; 4096];
    let request = Request::builder()
        .method("POST")
        .uri("/resolve/tiles")
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::CONTENT_LENGTH, payload.len())
        .body(Body::from(payload))
        .unwrap();

    let response = router.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
}

#[tokio::test]
async fn test_unknown_route() {
    let request = Request::builder()
        .uri("/resolve/unknown")
        .body(Body::empty())
        .unwrap();
    let response = router().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
