//! # Cesium Terrain Server
//!
//! An HTTP server distributing Cesium heightmap terrain tilesets from a local
//! directory, with an optional in-memory cache of full responses.
//!
//! ## Features
//!
//! - **Tileset serving**: `layer.json` manifests, `metadata.json` documents and
//!   pre-gzipped `{z}/{x}/{y}.terrain` tiles
//! - **Root fallbacks**: a default manifest for tilesets without `layer.json`
//!   and a blank tile for missing zoom-0 tiles
//! - **Response cache**: byte-budgeted LRU cache of `200 OK` responses,
//!   keyed by request URI or `X-Memcache-Key`
//! - **Graceful shutdown**: in-flight requests drain for a bounded window
//!
//! ## Architecture
//!
//! - [`tile`] - Tile coordinates and terrain payloads
//! - [`store`] - Tileset storage trait and filesystem backend
//! - [`cache`] - Response cache and its axum middleware
//! - [`server`] - Axum handlers, router and serve loop
//! - [`config`] - CLI and configuration types
//! - [`bytesize`] - Human-readable byte sizes for cache budgets
//!
//! ## Example
//!
//! ```rust,no_run
//! use cesium_terrain_server::{create_router, serve, CacheConfig, FsStore, RouterConfig};
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = FsStore::new("./tilesets")?;
//!     let config = RouterConfig::new("/tilesets").with_cache(CacheConfig::default());
//!     let router = create_router(store, config);
//!
//!     let listener = tokio::net::TcpListener::bind("0.0.0.0:8000").await?;
//!     let shutdown = async {
//!         let _ = tokio::signal::ctrl_c().await;
//!     };
//!     serve(listener, router, shutdown, Duration::from_secs(5)).await?;
//!     Ok(())
//! }
//! ```

pub mod bytesize;
pub mod cache;
pub mod config;
pub mod error;
pub mod server;
pub mod store;
pub mod tile;

// Re-export commonly used types
pub use bytesize::ByteSize;
pub use cache::{Admission, CacheConfig, CachedResponse, ResponseCache};
pub use config::Config;
pub use error::{ByteSizeError, CoordError, StoreError, TerrainError};
pub use server::{
    create_router, create_router_with_cache, serve, AppState, ErrorResponse, HealthResponse,
    RouterConfig,
};
pub use store::{FsStore, TilesetStatus, TilesetStore};
pub use tile::{Terrain, TileCoord, BLANK_ROOT_TILE};
