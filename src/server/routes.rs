//! Router configuration for the terrain server.
//!
//! This module defines the HTTP routes and applies middleware for caching,
//! CORS, request timeouts and tracing.
//!
//! # Route Structure
//!
//! ```text
//! /health                                      - Health check
//! {base}/{tileset}/layer.json                  - Layer manifest
//! {base}/{tileset}/metadata.json               - Tileset metadata
//! {base}/{tileset}/{z}/{x}/{y}.terrain         - Terrain tile
//! ```
//!
//! # Example
//!
//! ```no_run
//! use cesium_terrain_server::cache::CacheConfig;
//! use cesium_terrain_server::server::{create_router, RouterConfig};
//! use cesium_terrain_server::store::FsStore;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let store = FsStore::new("/data/tilesets")?;
//! let config = RouterConfig::new("/tilesets").with_cache(CacheConfig::default());
//! let router = create_router(store, config);
//!
//! let listener = tokio::net::TcpListener::bind("0.0.0.0:8000").await?;
//! axum::serve(listener, router).await?;
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;
use std::time::Duration;

use axum::{middleware, routing::get, Router};
use http::header::CONTENT_TYPE;
use http::{Method, StatusCode};
use tower_http::cors::{Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use super::handlers::{
    health_handler, layer_handler, metadata_handler, terrain_handler, AppState,
};
use crate::cache::{response_cache_middleware, CacheConfig, ResponseCache};
use crate::store::TilesetStore;

/// Default URL prefix tilesets are served under.
pub const DEFAULT_BASE_URL: &str = "/tilesets";

/// Default per-request timeout.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

// =============================================================================
// Router Configuration
// =============================================================================

/// Configuration for the HTTP router.
#[derive(Debug, Clone)]
pub struct RouterConfig {
    /// URL prefix for the tileset routes
    pub base_url: String,

    /// Response cache budgets (None = caching disabled)
    pub cache: Option<CacheConfig>,

    /// Whether to enable request tracing
    pub enable_tracing: bool,

    /// Upper bound on the time to produce a response
    pub request_timeout: Duration,
}

impl RouterConfig {
    /// Create a new router configuration serving tilesets under `base_url`.
    ///
    /// By default:
    /// - Caching is disabled
    /// - Tracing is enabled
    /// - Requests time out after 30 seconds
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            cache: None,
            enable_tracing: true,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    /// Enable the response cache with the given budgets.
    pub fn with_cache(mut self, cache: CacheConfig) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Enable or disable request tracing.
    pub fn with_tracing(mut self, enabled: bool) -> Self {
        self.enable_tracing = enabled;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// The base URL without trailing slashes; empty means the root.
    fn normalized_base_url(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}

// =============================================================================
// Router Builder
// =============================================================================

/// Create the main application router.
///
/// This function builds the complete Axum router with:
/// - Tileset routes under the configured base URL
/// - The response cache in front of the tileset routes (optional)
/// - CORS allowing any origin
/// - Request timeout
/// - Request tracing (optional)
pub fn create_router<S>(store: S, config: RouterConfig) -> Router
where
    S: TilesetStore + 'static,
{
    create_router_with_cache(store, config).0
}

/// Create the application router and return the response cache it uses,
/// if caching is enabled.
pub fn create_router_with_cache<S>(
    store: S,
    config: RouterConfig,
) -> (Router, Option<Arc<ResponseCache>>)
where
    S: TilesetStore + 'static,
{
    let app_state = AppState::new(store);

    let mut tileset_routes = build_tileset_routes(app_state);

    let cache = config.cache.map(|cache_config| Arc::new(ResponseCache::new(cache_config)));
    if let Some(cache) = &cache {
        tileset_routes = tileset_routes.layer(middleware::from_fn_with_state(
            Arc::clone(cache),
            response_cache_middleware,
        ));
    }

    let base_url = config.normalized_base_url();
    let router = if base_url.is_empty() {
        Router::new().merge(tileset_routes)
    } else {
        Router::new().nest(base_url, tileset_routes)
    };

    let router = router
        .route("/health", get(health_handler))
        .layer(build_cors_layer())
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            config.request_timeout,
        ));

    // Add tracing if enabled
    let router = if config.enable_tracing {
        router.layer(TraceLayer::new_for_http())
    } else {
        router
    };

    (router, cache)
}

/// Tileset routes, relative to the base URL.
fn build_tileset_routes<S>(app_state: AppState<S>) -> Router
where
    S: TilesetStore + 'static,
{
    // Uses {filename} so the `.terrain` suffix is checked by the handler
    Router::new()
        .route("/{tileset}/layer.json", get(layer_handler::<S>))
        .route("/{tileset}/metadata.json", get(metadata_handler::<S>))
        .route(
            "/{tileset}/{z}/{x}/{filename}",
            get(terrain_handler::<S>),
        )
        .with_state(app_state)
}

/// Build the CORS layer. Every response carries `Access-Control-Allow-Origin: *`.
fn build_cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::HEAD, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE])
        .max_age(Duration::from_secs(86400)) // 24 hours
}

// =============================================================================
// Tests
// =============================================================================
