//! Filesystem-backed tileset store.

use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;
use tracing::{debug, warn};

use crate::error::StoreError;
use crate::tile::{Terrain, TileCoord};

use super::{TilesetStatus, TilesetStore};

/// Name of the tileset manifest file.
pub const LAYER_FILE: &str = "layer.json";

/// Name of the optional tileset metadata file.
pub const METADATA_FILE: &str = "metadata.json";

/// Serves tilesets from directories under a root path.
///
/// Every path is built from request-supplied names, so each lookup checks
/// that the result stays under the root, both lexically and after resolving
/// symlinks.
#[derive(Debug, Clone)]
pub struct FsStore {
    /// Canonical tileset root
    root: PathBuf,
}

impl FsStore {
    /// Create a store rooted at `root`.
    ///
    /// Fails if the root cannot be resolved.
    pub fn new(root: impl AsRef<Path>) -> Result<Self, StoreError> {
        let root = root.as_ref();
        let root = std::fs::canonicalize(root)
            .map_err(|e| StoreError::Io(format!("tileset root {}: {}", root.display(), e)))?;
        Ok(Self { root })
    }

    /// The canonical tileset root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn tileset_dir(&self, tileset: &str) -> Result<PathBuf, StoreError> {
        let mut components = Path::new(tileset).components();
        match (components.next(), components.next()) {
            (Some(Component::Normal(_)), None) => Ok(self.root.join(tileset)),
            _ => {
                warn!(tileset = tileset, "Rejected tileset name outside root");
                Err(StoreError::PathTraversal(tileset.to_string()))
            }
        }
    }

    /// Resolve symlinks in `path` and make sure it is still under the root.
    ///
    /// Paths that do not exist are returned unchanged; the read that follows
    /// reports them as missing.
    async fn contained(&self, path: PathBuf) -> Result<PathBuf, StoreError> {
        match tokio::fs::canonicalize(&path).await {
            Ok(resolved) if resolved.starts_with(&self.root) => Ok(resolved),
            Ok(resolved) => {
                warn!(
                    path = %path.display(),
                    resolved = %resolved.display(),
                    "Rejected path resolving outside tileset root"
                );
                Err(StoreError::PathTraversal(path.display().to_string()))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(path),
            Err(e) => Err(StoreError::Io(format!("{}: {}", path.display(), e))),
        }
    }

    async fn read_file(&self, path: PathBuf) -> Result<Bytes, StoreError> {
        let path = self.contained(path).await?;
        match tokio::fs::read(&path).await {
            Ok(body) => {
                debug!(path = %path.display(), bytes = body.len(), "Loaded file");
                Ok(Bytes::from(body))
            }
            Err(e) => match StoreError::from_io(e) {
                StoreError::NoItem => {
                    debug!(path = %path.display(), "File not found");
                    Err(StoreError::NoItem)
                }
                StoreError::Io(message) => {
                    Err(StoreError::Io(format!("{}: {}", path.display(), message)))
                }
                other => Err(other),
            },
        }
    }
}

#[async_trait]
impl TilesetStore for FsStore {
    async fn layer(&self, tileset: &str) -> Result<Bytes, StoreError> {
        let path = self.tileset_dir(tileset)?.join(LAYER_FILE);
        self.read_file(path).await
    }

    async fn tile(&self, tileset: &str, coord: TileCoord) -> Result<Terrain, StoreError> {
        let path = self
            .tileset_dir(tileset)?
            .join(coord.z.to_string())
            .join(coord.x.to_string())
            .join(coord.filename());
        let body = self.read_file(path).await?;
        Ok(Terrain::new(coord, body))
    }

    async fn metadata(&self, tileset: &str) -> Result<Bytes, StoreError> {
        let path = self.tileset_dir(tileset)?.join(METADATA_FILE);
        self.read_file(path).await
    }

    async fn status(&self, tileset: &str) -> Result<TilesetStatus, StoreError> {
        let dir = self.contained(self.tileset_dir(tileset)?).await?;

        match tokio::fs::metadata(&dir).await {
            Ok(meta) if meta.is_dir() => {}
            Ok(_) => return Ok(TilesetStatus::NotFound),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(TilesetStatus::NotFound)
            }
            Err(e) => return Err(StoreError::Io(format!("{}: {}", dir.display(), e))),
        }

        let layer = dir.join(LAYER_FILE);
        match tokio::fs::metadata(&layer).await {
            Ok(_) => Ok(TilesetStatus::Found),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(TilesetStatus::NotSupported),
            Err(e) => Err(StoreError::Io(format!("{}: {}", layer.display(), e))),
        }
    }
}
