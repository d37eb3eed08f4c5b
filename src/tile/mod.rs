//! Terrain tile primitives.
//!
//! Tiles are addressed by a [`TileCoord`] in the TMS scheme and carried as
//! opaque gzipped blobs in [`Terrain`]. The server never decodes them.
//!
//! # Root tiles
//!
//! Cesium requests both zoom-0 tiles eagerly when it loads a tileset. A
//! tileset that lacks them on disk is still usable, so the handlers answer
//! with [`BLANK_ROOT_TILE`] instead of a 404.
//!
//! # Example
//!
//! ```
//! use cesium_terrain_server::tile::{Terrain, TileCoord};
//!
//! let coord = TileCoord::parse("1", "0", "0").unwrap();
//! assert!(coord.is_root());
//!
//! let tile = Terrain::blank_root(coord);
//! assert!(!tile.is_empty());
//! ```

mod coord;
mod terrain;

pub use coord::{TileCoord, TERRAIN_EXTENSION};
pub use terrain::{Terrain, BLANK_ROOT_TILE};
