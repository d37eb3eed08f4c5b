//! Terrain tile payloads.

use bytes::Bytes;

use super::coord::TileCoord;

/// Blank heightmap tile served when a tileset has no root tile on disk.
///
/// Already gzip-encoded, like every tile the server forwards.
pub const BLANK_ROOT_TILE: &[u8] = include_bytes!("../../assets/smallterrain-blank.terrain");

/// A terrain tile and the coordinate it was loaded for.
///
/// The payload is opaque: it is read from disk gzipped and forwarded as-is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Terrain {
    coord: TileCoord,
    data: Bytes,
}

impl Terrain {
    pub fn new(coord: TileCoord, data: impl Into<Bytes>) -> Self {
        Self {
            coord,
            data: data.into(),
        }
    }

    /// The embedded blank tile, addressed at `coord`.
    pub fn blank_root(coord: TileCoord) -> Self {
        Self {
            coord,
            data: Bytes::from_static(BLANK_ROOT_TILE),
        }
    }

    pub fn coord(&self) -> TileCoord {
        self.coord
    }

    pub fn is_root(&self) -> bool {
        self.coord.is_root()
    }

    pub fn data(&self) -> &Bytes {
        &self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn into_bytes(self) -> Bytes {
        self.data
    }
}
