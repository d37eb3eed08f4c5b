//! Tileset storage layer.
//!
//! A tileset is a directory holding an optional `layer.json` manifest and a
//! `{z}/{x}/{y}.terrain` tree of gzipped heightmap tiles:
//!
//! ```text
//! {root}/{tileset}/layer.json
//! {root}/{tileset}/metadata.json
//! {root}/{tileset}/{z}/{x}/{y}.terrain
//! ```
//!
//! The [`TilesetStore`] trait lets the handlers work against any backend;
//! [`FsStore`] is the filesystem implementation used by the server. Stores
//! are read-only and do not cache file contents; that is the job of the
//! response cache sitting in front of the handlers.

mod fs;

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::StoreError;
use crate::tile::{Terrain, TileCoord};

pub use fs::{FsStore, LAYER_FILE, METADATA_FILE};

/// Whether a tileset exists and can be served to Cesium.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TilesetStatus {
    /// The tileset directory does not exist
    NotFound,

    /// The directory exists but has no `layer.json`
    NotSupported,

    /// Directory and `layer.json` both exist
    Found,
}

impl TilesetStatus {
    /// Whether the tileset directory exists, with or without a manifest.
    pub fn exists(self) -> bool {
        !matches!(self, TilesetStatus::NotFound)
    }
}

/// Read access to a collection of tilesets.
///
/// Missing files are reported as [`StoreError::NoItem`] so callers can tell
/// them apart from real I/O failures.
#[async_trait]
pub trait TilesetStore: Send + Sync {
    /// Read the tileset's `layer.json`.
    async fn layer(&self, tileset: &str) -> Result<Bytes, StoreError>;

    /// Read a terrain tile.
    async fn tile(&self, tileset: &str, coord: TileCoord) -> Result<Terrain, StoreError>;

    /// Read the tileset's `metadata.json`.
    async fn metadata(&self, tileset: &str) -> Result<Bytes, StoreError>;

    /// Probe whether the tileset exists and carries a manifest.
    ///
    /// I/O errors other than not-exists are returned as [`StoreError::Io`]
    /// rather than folded into [`TilesetStatus::NotFound`].
    async fn status(&self, tileset: &str) -> Result<TilesetStatus, StoreError>;
}
