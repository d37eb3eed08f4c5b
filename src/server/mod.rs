//! HTTP server layer for the terrain server.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                         HTTP Layer                              │
//! │          GET {base}/{tileset}/{z}/{x}/{y}.terrain               │
//! │                                                                 │
//! │  ┌─────────────┐  ┌─────────────┐  ┌─────────────────────────┐  │
//! │  │  handlers   │  │   routes    │  │         serve           │  │
//! │  │ (requests)  │  │(middleware) │  │  (graceful shutdown)    │  │
//! │  └─────────────┘  └─────────────┘  └─────────────────────────┘  │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

pub mod handlers;
pub mod routes;
pub mod serve;

pub use handlers::{
    health_handler, layer_handler, metadata_handler, terrain_handler, AppState, ErrorResponse,
    HealthResponse, TerrainPathParams, TilesetPathParams, DEFAULT_LAYER_JSON,
};
pub use routes::{
    create_router, create_router_with_cache, RouterConfig, DEFAULT_BASE_URL,
    DEFAULT_REQUEST_TIMEOUT,
};
pub use serve::{serve, DEFAULT_DRAIN_TIMEOUT};
