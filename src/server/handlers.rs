//! HTTP request handlers for the terrain tileset API.
//!
//! # Endpoints
//!
//! - `GET {base}/{tileset}/layer.json` - Layer manifest
//! - `GET {base}/{tileset}/metadata.json` - Tileset metadata
//! - `GET {base}/{tileset}/{z}/{x}/{y}.terrain` - Terrain tile
//! - `GET /health` - Health check endpoint

use std::sync::Arc;

use axum::{
    body::Body,
    extract::{Path, State},
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, warn};

use crate::error::{CoordError, StoreError, TerrainError};
use crate::store::{TilesetStatus, TilesetStore};
use crate::tile::{Terrain, TileCoord};

// =============================================================================
// Application State
// =============================================================================

/// Shared application state containing the tileset store.
///
/// This is passed to all handlers via Axum's State extractor.
pub struct AppState<S: TilesetStore> {
    pub store: Arc<S>,
}

impl<S: TilesetStore> AppState<S> {
    pub fn new(store: S) -> Self {
        Self {
            store: Arc::new(store),
        }
    }
}

impl<S: TilesetStore> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

// =============================================================================
// Request Parameters
// =============================================================================

/// Path parameters for tileset document requests.
#[derive(Debug, Deserialize)]
pub struct TilesetPathParams {
    pub tileset: String,
}

/// Path parameters for terrain tile requests.
///
/// Extracted from: `{base}/{tileset}/{z}/{x}/{filename}`
/// where filename is `{y}.terrain`
#[derive(Debug, Deserialize)]
pub struct TerrainPathParams {
    pub tileset: String,
    pub z: String,
    pub x: String,
    pub filename: String,
}

impl TerrainPathParams {
    pub fn coord(&self) -> Result<TileCoord, CoordError> {
        TileCoord::from_path(&self.z, &self.x, &self.filename)
    }
}

// =============================================================================
// Response Types
// =============================================================================

/// JSON error response returned for all error conditions.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error type identifier (e.g., "not_found", "invalid_coordinate")
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

/// Manifest served when a tileset directory has no `layer.json`.
pub const DEFAULT_LAYER_JSON: &str = r#"{
  "tilejson": "2.1.0",
  "format": "heightmap-1.0",
  "version": "1.0.0",
  "scheme": "tms",
  "tiles": ["{z}/{x}/{y}.terrain"]
}"#;

// =============================================================================
// Error Mapping
// =============================================================================

/// Convert TerrainError to HTTP response.
///
/// Errors are logged by severity: 5xx at ERROR, 404 at DEBUG (Cesium probes
/// for tiles that do not exist all the time), other 4xx at WARN.
impl IntoResponse for TerrainError {
    fn into_response(self) -> Response {
        let (status, error_type) = match &self {
            TerrainError::InvalidCoord(_) => (StatusCode::BAD_REQUEST, "invalid_coordinate"),
            TerrainError::PathTraversal(_) => (StatusCode::BAD_REQUEST, "invalid_path"),
            TerrainError::TilesetNotFound { .. }
            | TerrainError::TileNotFound
            | TerrainError::MetadataNotFound { .. } => (StatusCode::NOT_FOUND, "not_found"),
            TerrainError::Io(_) => (StatusCode::INTERNAL_SERVER_ERROR, "io_error"),
        };
        let message = self.to_string();

        if status.is_server_error() {
            error!(
                error_type = error_type,
                status = status.as_u16(),
                "Server error: {}",
                message
            );
        } else if status == StatusCode::NOT_FOUND {
            debug!(
                error_type = error_type,
                status = status.as_u16(),
                "Resource not found: {}",
                message
            );
        } else {
            warn!(
                error_type = error_type,
                status = status.as_u16(),
                "Client error: {}",
                message
            );
        }

        let error_response = ErrorResponse::with_status(error_type, message, status);

        (status, Json(error_response)).into_response()
    }
}

/// Resolve a store miss: 404 naming the tileset when it is absent,
/// otherwise hand back the status so the caller can pick a fallback.
async fn probe_tileset<S: TilesetStore>(
    store: &S,
    tileset: &str,
) -> Result<TilesetStatus, TerrainError> {
    match store.status(tileset).await? {
        TilesetStatus::NotFound => Err(TerrainError::TilesetNotFound {
            tileset: tileset.to_string(),
        }),
        status => Ok(status),
    }
}

fn json_response(body: Bytes) -> Response {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, HeaderValue::from_static("application/json"))],
        body,
    )
        .into_response()
}

// =============================================================================
// Handlers
// =============================================================================

/// Handle layer manifest requests.
///
/// # Endpoint
///
/// `GET {base}/{tileset}/layer.json`
///
/// # Response
///
/// - `200 OK`: the tileset's `layer.json`, or [`DEFAULT_LAYER_JSON`] when the
///   tileset exists without one
/// - `400 Bad Request`: tileset name escapes the root
/// - `404 Not Found`: tileset does not exist
/// - `500 Internal Server Error`: I/O error
pub async fn layer_handler<S: TilesetStore>(
    State(state): State<AppState<S>>,
    Path(params): Path<TilesetPathParams>,
) -> Result<Response, TerrainError> {
    let tileset = params.tileset;

    match state.store.layer(&tileset).await {
        Ok(body) => Ok(json_response(body)),
        Err(StoreError::NoItem) => {
            probe_tileset(state.store.as_ref(), &tileset).await?;
            debug!(tileset = %tileset, "Serving default layer manifest");
            Ok(json_response(Bytes::from_static(DEFAULT_LAYER_JSON.as_bytes())))
        }
        Err(err) => Err(err.into()),
    }
}

/// Handle tileset metadata requests.
///
/// # Endpoint
///
/// `GET {base}/{tileset}/metadata.json`
///
/// # Response
///
/// - `200 OK`: the tileset's `metadata.json`
/// - `404 Not Found`: tileset or metadata file does not exist
/// - `500 Internal Server Error`: I/O error
pub async fn metadata_handler<S: TilesetStore>(
    State(state): State<AppState<S>>,
    Path(params): Path<TilesetPathParams>,
) -> Result<Response, TerrainError> {
    let tileset = params.tileset;

    match state.store.metadata(&tileset).await {
        Ok(body) => Ok(json_response(body)),
        Err(StoreError::NoItem) => {
            probe_tileset(state.store.as_ref(), &tileset).await?;
            Err(TerrainError::MetadataNotFound { tileset })
        }
        Err(err) => Err(err.into()),
    }
}

/// Handle terrain tile requests.
///
/// # Endpoint
///
/// `GET {base}/{tileset}/{z}/{x}/{y}.terrain`
///
/// # Query Parameters
///
/// - `v`: version hint, ignored along with any other query string
///
/// # Response
///
/// - `200 OK`: gzipped heightmap tile; a missing root tile is replaced by
///   the embedded blank tile
/// - `400 Bad Request`: unparsable coordinates or tileset name escapes the root
/// - `404 Not Found`: tileset does not exist, or non-root tile is absent
/// - `500 Internal Server Error`: I/O error
///
/// # Headers
///
/// - `Content-Type: application/octet-stream`
/// - `Content-Encoding: gzip`
/// - `Content-Disposition: attachment; filename={y}.terrain`
pub async fn terrain_handler<S: TilesetStore>(
    State(state): State<AppState<S>>,
    Path(params): Path<TerrainPathParams>,
) -> Result<Response, TerrainError> {
    let coord = params.coord()?;
    let tileset = params.tileset;

    let terrain = match state.store.tile(&tileset, coord).await {
        Ok(terrain) => terrain,
        Err(StoreError::NoItem) => {
            probe_tileset(state.store.as_ref(), &tileset).await?;
            if !coord.is_root() {
                return Err(TerrainError::TileNotFound);
            }
            debug!(tileset = %tileset, coord = %coord, "Serving blank root tile");
            Terrain::blank_root(coord)
        }
        Err(err) => return Err(err.into()),
    };

    terrain_response(terrain)
}

fn terrain_response(terrain: Terrain) -> Result<Response, TerrainError> {
    let disposition = HeaderValue::from_str(&format!(
        "attachment; filename={}",
        terrain.coord().filename()
    ))
    .map_err(|err| TerrainError::Io(err.to_string()))?;

    let mut response = Response::new(Body::from(terrain.into_bytes()));
    let headers = response.headers_mut();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/octet-stream"),
    );
    headers.insert(header::CONTENT_ENCODING, HeaderValue::from_static("gzip"));
    headers.insert(header::CONTENT_DISPOSITION, disposition);

    Ok(response)
}

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

// =============================================================================
// Tests
// =============================================================================
