//! Tile coordinates in the TMS scheme used by Cesium heightmap tilesets.

use std::fmt;

use crate::error::CoordError;

/// File extension of terrain tiles on disk and in request paths.
pub const TERRAIN_EXTENSION: &str = ".terrain";

/// A `(z, x, y)` tile address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TileCoord {
    /// Zoom level (0 = root)
    pub z: u64,

    /// Column, increasing eastwards
    pub x: u64,

    /// Row, increasing northwards (TMS)
    pub y: u64,
}

impl TileCoord {
    pub const fn new(z: u64, x: u64, y: u64) -> Self {
        Self { z, x, y }
    }

    /// Parse a coordinate from its decimal path components.
    ///
    /// Each component must be an unsigned 64-bit decimal integer; signs,
    /// whitespace and overflowing values are rejected.
    pub fn parse(x: &str, y: &str, z: &str) -> Result<Self, CoordError> {
        Ok(Self {
            z: parse_component("z", z)?,
            x: parse_component("x", x)?,
            y: parse_component("y", y)?,
        })
    }

    /// Parse a coordinate from the `{z}/{x}/{y}.terrain` request path segments.
    pub fn from_path(z: &str, x: &str, filename: &str) -> Result<Self, CoordError> {
        let y = filename
            .strip_suffix(TERRAIN_EXTENSION)
            .ok_or_else(|| CoordError::UnknownResource(filename.to_string()))?;
        Self::parse(x, y, z)
    }

    /// Whether this is one of the two zoom-0 tiles (both hemispheres) of the
    /// geographic TMS scheme.
    pub fn is_root(&self) -> bool {
        self.z == 0 && self.y == 0 && (self.x == 0 || self.x == 1)
    }

    /// The on-disk filename of this tile, `{y}.terrain`.
    pub fn filename(&self) -> String {
        format!("{}{}", self.y, TERRAIN_EXTENSION)
    }
}

impl fmt::Display for TileCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.z, self.x, self.y)
    }
}

fn parse_component(axis: &'static str, value: &str) -> Result<u64, CoordError> {
    // u64::from_str accepts a leading '+', which is not a valid path coordinate
    if !value.bytes().all(|b| b.is_ascii_digit()) {
        return Err(CoordError::InvalidComponent {
            axis,
            value: value.to_string(),
        });
    }
    value.parse().map_err(|_| CoordError::InvalidComponent {
        axis,
        value: value.to_string(),
    })
}
