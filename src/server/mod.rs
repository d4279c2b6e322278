//! HTTP server layer for LOD Streamer.
//!
//! Exposes the resolvers as stateless JSON endpoints.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                         HTTP Layer                              │
//! │        POST /resolve/{tiles,level,query,nodes}                  │
//! │                                                                 │
//! │  ┌──────────────────────────┐  ┌─────────────────────────────┐  │
//! │  │        handlers          │  │           routes            │  │
//! │  │ (JSON in, resolver out)  │  │ (CORS, trace, body limit)   │  │
//! │  └──────────────────────────┘  └─────────────────────────────┘  │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

pub mod handlers;
pub mod routes;

pub use handlers::{
    health_handler, level_handler, nodes_handler, query_handler, tiles_handler, ErrorResponse,
    HealthResponse, LevelRequest, LevelResponse, NodesError, NodesRequest, NodesResponse,
    QueryRequest, QueryResponse, TilesRequest, TilesResponse, VisibleNode,
};
pub use routes::{create_router, RouterConfig};
